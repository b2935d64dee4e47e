//! Attestation-reward fetcher (spec.md §4.4, "Attestation rewards").
//! One epoch's rewards are staged, merged additively into
//! `hourly_validator_stats`, and flagged in a single transaction, so a
//! crash mid-fetch never leaves a half-merged epoch for the next tick
//! to double-count (spec.md §9).
use crate::{
    beacon_client::{types::RewardComponents, BeaconClient},
    chain::{time, CHAIN_PROFILE},
    store::{self, epoch_rewards_temp::StagedReward},
};
use sqlx::PgPool;
use std::collections::HashMap;
use tracing::{info, warn};

pub async fn run(pool: &PgPool, beacon: &dyn BeaconClient) -> anyhow::Result<()> {
    let max_epoch_to_fetch = super::max_epoch_to_fetch();

    let epoch = {
        let mut conn = pool.acquire().await?;
        store::epochs::next_epoch_needing_rewards(&mut *conn, max_epoch_to_fetch).await?
    };
    let Some(epoch) = epoch else {
        info!(%max_epoch_to_fetch, "skipping attestation rewards fetch, no epoch due");
        return Ok(());
    };

    let ids = {
        let mut conn = pool.acquire().await?;
        store::validators::non_terminal_indices(&mut *conn).await?
    };
    if ids.is_empty() {
        info!(%epoch, "skipping attestation rewards fetch, no validators known yet");
        return Ok(());
    }

    let rewards = beacon.attestation_rewards(epoch, &ids).await?;

    let ideal_by_balance: HashMap<i128, RewardComponents> = rewards
        .ideal_rewards
        .into_iter()
        .map(|ideal| (ideal.effective_balance.0, ideal.reward))
        .collect();

    let slot_of_epoch = crate::beacon_client::types::epoch_last_slot(epoch, &CHAIN_PROFILE);
    let (date, hour) = time::date_hour_bucket(time::time_of(slot_of_epoch, &CHAIN_PROFILE));

    let mut staged = Vec::with_capacity(rewards.total_rewards.len());
    let mut tx = pool.begin().await?;
    for total in rewards.total_rewards {
        let Some(effective_balance) =
            store::validators::effective_balance(&mut *tx, total.validator_index).await?
        else {
            warn!(validator_index = total.validator_index, %epoch, "skipping reward for unknown validator");
            continue;
        };
        let rounded = effective_balance.round_down_to_effective_balance_increment();
        let ideal = ideal_by_balance.get(&rounded.0).cloned().unwrap_or_default();

        staged.push(StagedReward {
            validator_index: total.validator_index,
            head: total.reward.head,
            target: total.reward.target,
            source: total.reward.source,
            inactivity: total.reward.inactivity,
            missed_head: ideal.head.saturating_sub_floor_zero(total.reward.head),
            missed_target: ideal.target.saturating_sub_floor_zero(total.reward.target),
            missed_source: ideal.source.saturating_sub_floor_zero(total.reward.source),
            missed_inactivity: ideal.inactivity.saturating_sub_floor_zero(total.reward.inactivity),
        });
    }

    store::epoch_rewards_temp::truncate(&mut *tx).await?;
    store::epoch_rewards_temp::stage(&mut *tx, date, hour, &staged).await?;
    store::epoch_rewards_temp::merge_into_hourly_validator_stats(&mut *tx).await?;
    store::epochs::set_rewards_fetched(&mut *tx, epoch).await?;
    tx.commit().await?;

    info!(%epoch, validators = staged.len(), "fetched attestation rewards");
    Ok(())
}
