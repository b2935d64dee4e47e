//! The `daily_validator_stats` table (spec.md §3, "DailyValidatorStats
//! implied by §4.5's daily summary"): one row per `(validatorIndex,
//! date)`, the sum of that day's hourly rows.
use crate::store::hourly_stats::{BlockAndSyncRollup, HourlyRollup};
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use sqlx::PgExecutor;

pub async fn upsert_day(
    executor: impl PgExecutor<'_>,
    validator_index: i32,
    date: NaiveDate,
    stats: &HourlyRollup,
    block_and_sync: Option<&BlockAndSyncRollup>,
) -> anyhow::Result<()> {
    let (block_rewards, sync_rewards) = match block_and_sync {
        Some(r) => (
            BigDecimal::from(r.block_rewards),
            BigDecimal::from(r.sync_rewards),
        ),
        None => (BigDecimal::from(0), BigDecimal::from(0)),
    };

    sqlx::query!(
        "
        INSERT INTO daily_validator_stats (
            validator_index, date, head, target, source, inactivity,
            missed_head, missed_target, missed_source, missed_inactivity,
            attestations_missed, block_rewards, sync_rewards
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        ON CONFLICT (validator_index, date) DO UPDATE SET
            head = excluded.head,
            target = excluded.target,
            source = excluded.source,
            inactivity = excluded.inactivity,
            missed_head = excluded.missed_head,
            missed_target = excluded.missed_target,
            missed_source = excluded.missed_source,
            missed_inactivity = excluded.missed_inactivity,
            attestations_missed = excluded.attestations_missed,
            block_rewards = excluded.block_rewards,
            sync_rewards = excluded.sync_rewards
        ",
        validator_index,
        date,
        BigDecimal::from(stats.head),
        BigDecimal::from(stats.target),
        BigDecimal::from(stats.source),
        BigDecimal::from(stats.inactivity),
        BigDecimal::from(stats.missed_head),
        BigDecimal::from(stats.missed_target),
        BigDecimal::from(stats.missed_source),
        BigDecimal::from(stats.missed_inactivity),
        stats.attestations_missed,
        block_rewards,
        sync_rewards,
    )
    .execute(executor)
    .await?;
    Ok(())
}
