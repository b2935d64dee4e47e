//! Hourly missed-attestation summary (spec.md §4.5, "Hourly").
use crate::{
    chain::{time, CHAIN_PROFILE},
    store,
};
use chrono::{Timelike, Utc};
use sqlx::PgPool;
use tracing::info;

pub async fn run(pool: &PgPool) -> anyhow::Result<()> {
    let start_time = {
        let mut conn = pool.acquire().await?;
        store::watermark::hourly_watermark(&mut *conn)
            .await?
            .unwrap_or_else(|| truncate_to_hour(CHAIN_PROFILE.genesis_timestamp))
    };
    let end_time = time::hour_window_end(start_time);
    if end_time > Utc::now() {
        info!(%start_time, %end_time, "skipping hourly summary, window not yet elapsed");
        return Ok(());
    }

    let start_slot = time::slot_of(start_time, &CHAIN_PROFILE);
    let end_slot = time::slot_of(end_time, &CHAIN_PROFILE) - 1;

    let mut conn = pool.acquire().await?;
    let per_slot_flags_set = store::slots::all_flags_set_in_range(&mut *conn, start_slot, end_slot).await?;
    let end_epoch = end_slot.epoch(&CHAIN_PROFILE);
    let rewards_advanced_past_window =
        store::epochs::exists_rewards_fetched_epoch_after(&mut *conn, end_epoch).await?;
    drop(conn);

    if !per_slot_flags_set || !rewards_advanced_past_window {
        info!(
            %start_time, %end_time, per_slot_flags_set, rewards_advanced_past_window,
            "skipping hourly summary, precondition not met"
        );
        return Ok(());
    }

    let missed = {
        let mut conn = pool.acquire().await?;
        store::committees::count_missed_attestations_by_validator(
            &mut *conn,
            start_slot,
            end_slot,
            CHAIN_PROFILE.max_attestation_delay,
        )
        .await?
    };

    if missed.is_empty() {
        info!(%start_time, %end_time, "hourly summary found no rows, not advancing watermark");
        return Ok(());
    }

    let (date, hour) = time::date_hour_bucket(start_time);

    let mut tx = pool.begin().await?;
    for (validator_index, count) in &missed {
        store::hourly_stats::overwrite_attestations_missed(
            &mut *tx,
            *validator_index,
            date,
            hour,
            *count as i32,
        )
        .await?;
    }
    store::watermark::advance_hourly_watermark(&mut *tx, end_time).await?;
    tx.commit().await?;

    info!(%start_time, %end_time, validators = missed.len(), "completed hourly summary");
    Ok(())
}

fn truncate_to_hour(timestamp: chrono::DateTime<Utc>) -> chrono::DateTime<Utc> {
    timestamp
        .date_naive()
        .and_hms_opt(timestamp.hour(), 0, 0)
        .expect("hour/minute/second 0 is always a valid time")
        .and_utc()
}
