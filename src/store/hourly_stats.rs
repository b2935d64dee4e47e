//! The `hourly_validator_stats` and `hourly_block_and_sync_rewards`
//! tables (spec.md §3). The former is written by two independent
//! feeds — the attestation-reward fetch and the hourly missed-
//! attestation summary — which must converge idempotently: the reward
//! columns are additive merges, `attestations_missed` is an
//! overwrite (spec.md §4.5).
use crate::units::GweiNewtype;
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use sqlx::PgExecutor;

pub async fn overwrite_attestations_missed(
    executor: impl PgExecutor<'_>,
    validator_index: i32,
    date: NaiveDate,
    hour: i16,
    attestations_missed: i32,
) -> anyhow::Result<()> {
    sqlx::query!(
        "
        INSERT INTO hourly_validator_stats (validator_index, date, hour, attestations_missed)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (validator_index, date, hour) DO UPDATE SET
            attestations_missed = excluded.attestations_missed
        ",
        validator_index,
        date,
        hour,
        attestations_missed,
    )
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn add_block_reward(
    executor: impl PgExecutor<'_>,
    validator_index: i32,
    date: NaiveDate,
    hour: i16,
    amount: GweiNewtype,
) -> anyhow::Result<()> {
    let amount: BigDecimal = amount.into();
    sqlx::query!(
        "
        INSERT INTO hourly_block_and_sync_rewards (validator_index, date, hour, block_rewards, sync_rewards)
        VALUES ($1, $2, $3, $4, 0)
        ON CONFLICT (validator_index, date, hour) DO UPDATE SET
            block_rewards = hourly_block_and_sync_rewards.block_rewards + excluded.block_rewards
        ",
        validator_index,
        date,
        hour,
        amount,
    )
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn add_sync_reward(
    executor: impl PgExecutor<'_>,
    validator_index: i32,
    date: NaiveDate,
    hour: i16,
    amount: GweiNewtype,
) -> anyhow::Result<()> {
    let amount: BigDecimal = amount.into();
    sqlx::query!(
        "
        INSERT INTO hourly_block_and_sync_rewards (validator_index, date, hour, block_rewards, sync_rewards)
        VALUES ($1, $2, $3, 0, $4)
        ON CONFLICT (validator_index, date, hour) DO UPDATE SET
            sync_rewards = hourly_block_and_sync_rewards.sync_rewards + excluded.sync_rewards
        ",
        validator_index,
        date,
        hour,
        amount,
    )
    .execute(executor)
    .await?;
    Ok(())
}

/// Whether `hourly_validator_stats` has at least one row strictly
/// after `watermark` (spec.md §4.5's daily precondition's "at least 24
/// rows" is a row-count check layered on top of this by the caller).
pub async fn count_rows_after(
    executor: impl PgExecutor<'_>,
    date: NaiveDate,
    hour: i16,
) -> anyhow::Result<i64> {
    let row = sqlx::query!(
        r#"
        SELECT count(*) AS "count!"
        FROM hourly_validator_stats
        WHERE (date, hour) > ($1, $2)
        "#,
        date,
        hour,
    )
    .fetch_one(executor)
    .await?;
    Ok(row.count)
}

pub struct HourlyRollup {
    pub head: GweiNewtype,
    pub target: GweiNewtype,
    pub source: GweiNewtype,
    pub inactivity: GweiNewtype,
    pub missed_head: GweiNewtype,
    pub missed_target: GweiNewtype,
    pub missed_source: GweiNewtype,
    pub missed_inactivity: GweiNewtype,
    pub attestations_missed: i32,
}

pub struct BlockAndSyncRollup {
    pub block_rewards: GweiNewtype,
    pub sync_rewards: GweiNewtype,
}

pub async fn sum_validator_stats_for_day(
    executor: impl PgExecutor<'_>,
    date: NaiveDate,
) -> anyhow::Result<Vec<(i32, HourlyRollup)>> {
    let rows = sqlx::query!(
        r#"
        SELECT
            validator_index AS "validator_index!",
            coalesce(sum(head), 0) AS "head!",
            coalesce(sum(target), 0) AS "target!",
            coalesce(sum(source), 0) AS "source!",
            coalesce(sum(inactivity), 0) AS "inactivity!",
            coalesce(sum(missed_head), 0) AS "missed_head!",
            coalesce(sum(missed_target), 0) AS "missed_target!",
            coalesce(sum(missed_source), 0) AS "missed_source!",
            coalesce(sum(missed_inactivity), 0) AS "missed_inactivity!",
            coalesce(sum(attestations_missed), 0) AS "attestations_missed!"
        FROM hourly_validator_stats
        WHERE date = $1
        GROUP BY validator_index
        "#,
        date,
    )
    .fetch_all(executor)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| {
            (
                r.validator_index,
                HourlyRollup {
                    head: r.head.into(),
                    target: r.target.into(),
                    source: r.source.into(),
                    inactivity: r.inactivity.into(),
                    missed_head: r.missed_head.into(),
                    missed_target: r.missed_target.into(),
                    missed_source: r.missed_source.into(),
                    missed_inactivity: r.missed_inactivity.into(),
                    attestations_missed: r.attestations_missed as i32,
                },
            )
        })
        .collect())
}

pub async fn sum_block_and_sync_rewards_for_day(
    executor: impl PgExecutor<'_>,
    date: NaiveDate,
) -> anyhow::Result<Vec<(i32, BlockAndSyncRollup)>> {
    let rows = sqlx::query!(
        r#"
        SELECT
            validator_index AS "validator_index!",
            coalesce(sum(block_rewards), 0) AS "block_rewards!",
            coalesce(sum(sync_rewards), 0) AS "sync_rewards!"
        FROM hourly_block_and_sync_rewards
        WHERE date = $1
        GROUP BY validator_index
        "#,
        date,
    )
    .fetch_all(executor)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| {
            (
                r.validator_index,
                BlockAndSyncRollup {
                    block_rewards: r.block_rewards.into(),
                    sync_rewards: r.sync_rewards.into(),
                },
            )
        })
        .collect())
}
