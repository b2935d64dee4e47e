//! Block-proposal and sync-committee reward fetcher (spec.md §4.4,
//! "Block and sync rewards"). Both feeds are addressed by the same
//! slot and flip their flags together even when the slot was missed
//! entirely — a missed slot earns nobody a reward, which is exactly
//! what "zero rows written, flags set" represents.
use crate::{
    beacon_client::{BeaconClient, SlotAddressed},
    chain::{time, CHAIN_PROFILE},
    store,
};
use sqlx::PgPool;
use tracing::info;

pub async fn run(pool: &PgPool, beacon: &dyn BeaconClient) -> anyhow::Result<()> {
    let max_slot_to_fetch = super::max_slot_to_fetch();

    let slot = {
        let mut conn = pool.acquire().await?;
        store::slots::next_slot_needing_rewards(&mut *conn, max_slot_to_fetch).await?
    };
    let Some(slot) = slot else {
        info!(%max_slot_to_fetch, "skipping block/sync rewards fetch, no slot due");
        return Ok(());
    };

    let epoch = slot.epoch(&CHAIN_PROFILE);
    let members = {
        let mut conn = pool.acquire().await?;
        store::sync_committees::members_covering_epoch(&mut *conn, epoch).await?
    };
    if members.is_empty() {
        info!(%slot, %epoch, "skipping block/sync rewards fetch, sync committee not yet resolved");
        return Ok(());
    }

    let block_rewards = beacon.block_rewards(slot).await?;
    let sync_rewards = beacon.sync_committee_rewards(slot, &members).await?;

    let (date, hour) = time::date_hour_bucket(time::time_of(slot, &CHAIN_PROFILE));

    let mut tx = pool.begin().await?;
    if let SlotAddressed::Found(reward) = block_rewards {
        store::hourly_stats::add_block_reward(&mut *tx, reward.proposer_index, date, hour, reward.total)
            .await?;
    }
    if let SlotAddressed::Found(rewards) = sync_rewards {
        for reward in rewards {
            store::hourly_stats::add_sync_reward(
                &mut *tx,
                reward.validator_index,
                date,
                hour,
                reward.reward,
            )
            .await?;
        }
    }
    store::slots::set_consensus_and_sync_rewards_fetched(&mut *tx, slot).await?;
    tx.commit().await?;

    info!(%slot, "fetched block and sync rewards");
    Ok(())
}
