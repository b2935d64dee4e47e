//! The `epoch_rewards_temp` staging table (spec.md §3,
//! "EpochRewardsTemp"): a landing pad for one epoch's worth of
//! attestation-reward rows, truncated and re-filled inside the same
//! transaction as the merge into `hourly_validator_stats` and the
//! `Epoch.rewardsFetched` flip — spec.md §9's open question resolves
//! in favor of this all-or-nothing shape rather than truncating
//! outside the transaction, so a crash mid-fetch can never leave
//! stale rows for the next attempt to double-merge.
use crate::units::GweiNewtype;
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use sqlx::PgExecutor;

pub struct StagedReward {
    pub validator_index: i32,
    pub head: GweiNewtype,
    pub target: GweiNewtype,
    pub source: GweiNewtype,
    pub inactivity: GweiNewtype,
    pub missed_head: GweiNewtype,
    pub missed_target: GweiNewtype,
    pub missed_source: GweiNewtype,
    pub missed_inactivity: GweiNewtype,
}

pub async fn truncate(executor: impl PgExecutor<'_>) -> anyhow::Result<()> {
    sqlx::query!("TRUNCATE TABLE epoch_rewards_temp")
        .execute(executor)
        .await?;
    Ok(())
}

pub async fn stage(
    executor: impl PgExecutor<'_>,
    date: NaiveDate,
    hour: i16,
    rewards: &[StagedReward],
) -> anyhow::Result<()> {
    if rewards.is_empty() {
        return Ok(());
    }

    let indices: Vec<i32> = rewards.iter().map(|r| r.validator_index).collect();
    let dates: Vec<NaiveDate> = rewards.iter().map(|_| date).collect();
    let hours: Vec<i16> = rewards.iter().map(|_| hour).collect();
    let head: Vec<BigDecimal> = rewards.iter().map(|r| r.head.into()).collect();
    let target: Vec<BigDecimal> = rewards.iter().map(|r| r.target.into()).collect();
    let source: Vec<BigDecimal> = rewards.iter().map(|r| r.source.into()).collect();
    let inactivity: Vec<BigDecimal> = rewards.iter().map(|r| r.inactivity.into()).collect();
    let missed_head: Vec<BigDecimal> = rewards.iter().map(|r| r.missed_head.into()).collect();
    let missed_target: Vec<BigDecimal> = rewards.iter().map(|r| r.missed_target.into()).collect();
    let missed_source: Vec<BigDecimal> = rewards.iter().map(|r| r.missed_source.into()).collect();
    let missed_inactivity: Vec<BigDecimal> =
        rewards.iter().map(|r| r.missed_inactivity.into()).collect();

    sqlx::query!(
        "
        INSERT INTO epoch_rewards_temp (
            validator_index, date, hour, head, target, source, inactivity,
            missed_head, missed_target, missed_source, missed_inactivity
        )
        SELECT * FROM UNNEST(
            $1::int4[], $2::date[], $3::int2[], $4::numeric[], $5::numeric[], $6::numeric[], $7::numeric[],
            $8::numeric[], $9::numeric[], $10::numeric[], $11::numeric[]
        )
        ",
        &indices,
        &dates,
        &hours,
        &head,
        &target,
        &source,
        &inactivity,
        &missed_head,
        &missed_target,
        &missed_source,
        &missed_inactivity,
    )
    .execute(executor)
    .await?;

    Ok(())
}

/// Sums every staged row into `hourly_validator_stats`, additively —
/// same-hour double-fetches must not double-count, which is exactly
/// what the epoch-level truncate-then-merge transaction guarantees
/// (spec.md §4.4).
pub async fn merge_into_hourly_validator_stats(executor: impl PgExecutor<'_>) -> anyhow::Result<()> {
    sqlx::query!(
        "
        INSERT INTO hourly_validator_stats (
            validator_index, date, hour, head, target, source, inactivity,
            missed_head, missed_target, missed_source, missed_inactivity
        )
        SELECT
            validator_index, date, hour, head, target, source, inactivity,
            missed_head, missed_target, missed_source, missed_inactivity
        FROM epoch_rewards_temp
        ON CONFLICT (validator_index, date, hour) DO UPDATE SET
            head = hourly_validator_stats.head + excluded.head,
            target = hourly_validator_stats.target + excluded.target,
            source = hourly_validator_stats.source + excluded.source,
            inactivity = hourly_validator_stats.inactivity + excluded.inactivity,
            missed_head = hourly_validator_stats.missed_head + excluded.missed_head,
            missed_target = hourly_validator_stats.missed_target + excluded.missed_target,
            missed_source = hourly_validator_stats.missed_source + excluded.missed_source,
            missed_inactivity = hourly_validator_stats.missed_inactivity + excluded.missed_inactivity
        ",
    )
    .execute(executor)
    .await?;
    Ok(())
}
