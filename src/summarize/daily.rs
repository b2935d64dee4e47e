//! Daily summary (spec.md §4.5, "Daily"): rolls up a full UTC day of
//! `HourlyValidatorStats` and `HourlyBlockAndSyncRewards` once the hour
//! containing the day's last slot has fully settled.
use crate::{
    chain::{time, CHAIN_PROFILE},
    store,
};
use chrono::{Timelike, Utc};
use sqlx::PgPool;
use tracing::info;

pub async fn run(pool: &PgPool) -> anyhow::Result<()> {
    let day_start = {
        let mut conn = pool.acquire().await?;
        store::watermark::daily_watermark(&mut *conn)
            .await?
            .unwrap_or_else(|| truncate_to_day(CHAIN_PROFILE.genesis_timestamp))
    };
    let day_end = time::day_window_end(day_start);
    if day_end > Utc::now() {
        info!(%day_start, %day_end, "skipping daily summary, day not yet elapsed");
        return Ok(());
    }

    let last_slot_of_day = time::slot_of(day_end, &CHAIN_PROFILE) - 1;
    let epoch = last_slot_of_day.epoch(&CHAIN_PROFILE);

    let mut conn = pool.acquire().await?;
    let (watermark_date, watermark_hour) = time::date_hour_bucket(day_start);
    let rows_after_watermark =
        store::hourly_stats::count_rows_after(&mut *conn, watermark_date, watermark_hour).await?;
    let rewards_fetched = store::epochs::is_rewards_fetched(&mut *conn, epoch).await?;
    let last_slot_rewards_fetched =
        store::slots::is_consensus_and_sync_rewards_fetched(&mut *conn, last_slot_of_day).await?;
    drop(conn);

    if rows_after_watermark < 24 || !rewards_fetched || !last_slot_rewards_fetched {
        info!(
            %day_start, %day_end, rows_after_watermark, rewards_fetched, last_slot_rewards_fetched,
            "skipping daily summary, precondition not met"
        );
        return Ok(());
    }

    let day = day_start.date_naive();
    let validator_rollups = {
        let mut conn = pool.acquire().await?;
        store::hourly_stats::sum_validator_stats_for_day(&mut *conn, day).await?
    };
    let block_and_sync_rollups = {
        let mut conn = pool.acquire().await?;
        store::hourly_stats::sum_block_and_sync_rewards_for_day(&mut *conn, day).await?
    };

    if validator_rollups.is_empty() {
        info!(%day_start, %day_end, "daily summary found no rows, not advancing watermark");
        return Ok(());
    }

    let block_and_sync_by_validator: std::collections::HashMap<i32, _> =
        block_and_sync_rollups.into_iter().collect();

    let mut tx = pool.begin().await?;
    let mut validators_seen = std::collections::HashSet::new();
    for (validator_index, rollup) in &validator_rollups {
        let block_and_sync = block_and_sync_by_validator.get(validator_index);
        store::daily_stats::upsert_day(&mut *tx, *validator_index, day, rollup, block_and_sync).await?;
        validators_seen.insert(*validator_index);
    }
    // Validators with block/sync rewards but no attestation activity
    // this day still need a row, with zeroed reward/miss columns.
    for (validator_index, rollup) in &block_and_sync_by_validator {
        if !validators_seen.contains(validator_index) {
            store::daily_stats::upsert_day(
                &mut *tx,
                *validator_index,
                day,
                &store::hourly_stats::HourlyRollup {
                    head: crate::units::GweiNewtype::ZERO,
                    target: crate::units::GweiNewtype::ZERO,
                    source: crate::units::GweiNewtype::ZERO,
                    inactivity: crate::units::GweiNewtype::ZERO,
                    missed_head: crate::units::GweiNewtype::ZERO,
                    missed_target: crate::units::GweiNewtype::ZERO,
                    missed_source: crate::units::GweiNewtype::ZERO,
                    missed_inactivity: crate::units::GweiNewtype::ZERO,
                    attestations_missed: 0,
                },
                Some(rollup),
            )
            .await?;
        }
    }
    store::watermark::advance_daily_watermark(&mut *tx, day_end).await?;
    tx.commit().await?;

    info!(%day_start, %day_end, validators = validator_rollups.len(), "completed daily summary");
    Ok(())
}

fn truncate_to_day(timestamp: chrono::DateTime<Utc>) -> chrono::DateTime<Utc> {
    timestamp
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .expect("midnight is always a valid time")
        .and_utc()
}
