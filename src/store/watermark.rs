//! The `last_summary_update` singleton row (spec.md §3,
//! "LastSummaryUpdate"). Advancing a watermark here must happen inside
//! the same transaction that writes the rolled-up rows it gates
//! (invariant I5) — callers pass a transaction-backed executor.
use chrono::{DateTime, Utc};
use sqlx::PgExecutor;

pub async fn hourly_watermark(executor: impl PgExecutor<'_>) -> anyhow::Result<Option<DateTime<Utc>>> {
    let row = sqlx::query!("SELECT hourly_validator_stats FROM last_summary_update WHERE id = true")
        .fetch_optional(executor)
        .await?;
    Ok(row.and_then(|r| r.hourly_validator_stats))
}

pub async fn daily_watermark(executor: impl PgExecutor<'_>) -> anyhow::Result<Option<DateTime<Utc>>> {
    let row = sqlx::query!("SELECT daily_validator_stats FROM last_summary_update WHERE id = true")
        .fetch_optional(executor)
        .await?;
    Ok(row.and_then(|r| r.daily_validator_stats))
}

pub async fn advance_hourly_watermark(
    executor: impl PgExecutor<'_>,
    end_time: DateTime<Utc>,
) -> anyhow::Result<()> {
    sqlx::query!(
        "
        INSERT INTO last_summary_update (id, hourly_validator_stats)
        VALUES (true, $1)
        ON CONFLICT (id) DO UPDATE SET hourly_validator_stats = excluded.hourly_validator_stats
        ",
        end_time,
    )
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn advance_daily_watermark(
    executor: impl PgExecutor<'_>,
    end_time: DateTime<Utc>,
) -> anyhow::Result<()> {
    sqlx::query!(
        "
        INSERT INTO last_summary_update (id, daily_validator_stats)
        VALUES (true, $1)
        ON CONFLICT (id) DO UPDATE SET daily_validator_stats = excluded.daily_validator_stats
        ",
        end_time,
    )
    .execute(executor)
    .await?;
    Ok(())
}
