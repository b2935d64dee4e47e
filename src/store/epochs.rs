//! The `epochs` table (spec.md §3, "Epoch"). All five flags are
//! monotonically true once set during normal operation (invariant
//! I4); the `reset_*` functions at the bottom of this module are the
//! one sanctioned exception, used by the `heal_committees` and
//! `backfill_*` operator tools to force a specific epoch range back
//! through the ordinary fetchers.
use crate::chain::epoch::Epoch;
use sqlx::PgExecutor;

pub async fn insert_epoch_if_missing(executor: impl PgExecutor<'_>, epoch: Epoch) -> anyhow::Result<()> {
    sqlx::query!(
        "
        INSERT INTO epochs (epoch, committees_fetched, sync_committees_fetched, validators_info_fetched, validators_balances_fetched, rewards_fetched)
        VALUES ($1, false, false, false, false, false)
        ON CONFLICT (epoch) DO NOTHING
        ",
        epoch.0,
    )
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn max_epoch(executor: impl PgExecutor<'_>) -> anyhow::Result<Option<Epoch>> {
    let row = sqlx::query!(r#"SELECT max(epoch) AS "epoch" FROM epochs"#)
        .fetch_one(executor)
        .await?;
    Ok(row.epoch.map(Epoch))
}

pub async fn next_epoch_needing_committees(
    executor: impl PgExecutor<'_>,
    max_epoch_to_fetch: Epoch,
) -> anyhow::Result<Option<Epoch>> {
    let row = sqlx::query!(
        r#"SELECT epoch AS "epoch!" FROM epochs WHERE committees_fetched = false AND epoch <= $1 ORDER BY epoch ASC LIMIT 1"#,
        max_epoch_to_fetch.0
    )
    .fetch_optional(executor)
    .await?;
    Ok(row.map(|r| Epoch(r.epoch)))
}

pub async fn next_epoch_needing_sync_committees(
    executor: impl PgExecutor<'_>,
    max_epoch_to_fetch: Epoch,
) -> anyhow::Result<Option<Epoch>> {
    let row = sqlx::query!(
        r#"SELECT epoch AS "epoch!" FROM epochs WHERE sync_committees_fetched = false AND epoch <= $1 ORDER BY epoch ASC LIMIT 1"#,
        max_epoch_to_fetch.0
    )
    .fetch_optional(executor)
    .await?;
    Ok(row.map(|r| Epoch(r.epoch)))
}

pub async fn next_epoch_needing_rewards(
    executor: impl PgExecutor<'_>,
    max_epoch_to_fetch: Epoch,
) -> anyhow::Result<Option<Epoch>> {
    let row = sqlx::query!(
        r#"SELECT epoch AS "epoch!" FROM epochs WHERE rewards_fetched = false AND epoch <= $1 ORDER BY epoch ASC LIMIT 1"#,
        max_epoch_to_fetch.0
    )
    .fetch_optional(executor)
    .await?;
    Ok(row.map(|r| Epoch(r.epoch)))
}

pub async fn next_epoch_needing_validators_balances(
    executor: impl PgExecutor<'_>,
    max_epoch_to_fetch: Epoch,
) -> anyhow::Result<Option<Epoch>> {
    let row = sqlx::query!(
        r#"SELECT epoch AS "epoch!" FROM epochs WHERE validators_balances_fetched = false AND epoch <= $1 ORDER BY epoch ASC LIMIT 1"#,
        max_epoch_to_fetch.0
    )
    .fetch_optional(executor)
    .await?;
    Ok(row.map(|r| Epoch(r.epoch)))
}

pub async fn set_committees_fetched(executor: impl PgExecutor<'_>, epoch: Epoch) -> anyhow::Result<()> {
    sqlx::query!(
        "UPDATE epochs SET committees_fetched = true WHERE epoch = $1",
        epoch.0
    )
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn set_sync_committees_fetched(executor: impl PgExecutor<'_>, epoch: Epoch) -> anyhow::Result<()> {
    sqlx::query!(
        "UPDATE epochs SET sync_committees_fetched = true WHERE epoch = $1",
        epoch.0
    )
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn set_rewards_fetched(executor: impl PgExecutor<'_>, epoch: Epoch) -> anyhow::Result<()> {
    sqlx::query!(
        "UPDATE epochs SET rewards_fetched = true WHERE epoch = $1",
        epoch.0
    )
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn set_validators_info_and_balances_fetched(
    executor: impl PgExecutor<'_>,
    epoch: Epoch,
) -> anyhow::Result<()> {
    sqlx::query!(
        "UPDATE epochs SET validators_info_fetched = true, validators_balances_fetched = true WHERE epoch = $1",
        epoch.0
    )
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn is_committees_fetched(executor: impl PgExecutor<'_>, epoch: Epoch) -> anyhow::Result<bool> {
    let row = sqlx::query!(
        "SELECT committees_fetched AS \"fetched!\" FROM epochs WHERE epoch = $1",
        epoch.0
    )
    .fetch_optional(executor)
    .await?;
    Ok(row.map(|r| r.fetched).unwrap_or(false))
}

pub async fn is_rewards_fetched(executor: impl PgExecutor<'_>, epoch: Epoch) -> anyhow::Result<bool> {
    let row = sqlx::query!(
        "SELECT rewards_fetched AS \"fetched!\" FROM epochs WHERE epoch = $1",
        epoch.0
    )
    .fetch_optional(executor)
    .await?;
    Ok(row.map(|r| r.fetched).unwrap_or(false))
}

/// True once some epoch strictly after `epoch` has `rewardsFetched`
/// (spec.md §4.5's hourly precondition: the attestation-reward feed
/// must have advanced past the window being summarized before the
/// "on-time" committee pruning it depends on is safe to read from).
pub async fn exists_rewards_fetched_epoch_after(
    executor: impl PgExecutor<'_>,
    epoch: Epoch,
) -> anyhow::Result<bool> {
    let row = sqlx::query!(
        r#"SELECT count(*) AS "count!" FROM epochs WHERE epoch > $1 AND rewards_fetched = true"#,
        epoch.0
    )
    .fetch_one(executor)
    .await?;
    Ok(row.count > 0)
}

/// Forces `committeesFetched` back to false for `[from, to]` so
/// `fetch-committees` redoes the range on its next tick.
pub async fn reset_committees_fetched_range(
    executor: impl PgExecutor<'_>,
    from: Epoch,
    to: Epoch,
) -> anyhow::Result<u64> {
    let result = sqlx::query!(
        "UPDATE epochs SET committees_fetched = false WHERE epoch BETWEEN $1 AND $2",
        from.0,
        to.0
    )
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

/// Forces `rewardsFetched` back to false for `[from, to]` so
/// `fetch-attestation-rewards` redoes the range on its next tick.
pub async fn reset_rewards_fetched_range(
    executor: impl PgExecutor<'_>,
    from: Epoch,
    to: Epoch,
) -> anyhow::Result<u64> {
    let result = sqlx::query!(
        "UPDATE epochs SET rewards_fetched = false WHERE epoch BETWEEN $1 AND $2",
        from.0,
        to.0
    )
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

/// Forces both validator-info and validator-balance flags back to
/// false for `[from, to]` so `fetch-validator-balances` redoes the
/// range on its next tick.
pub async fn reset_validators_info_and_balances_fetched_range(
    executor: impl PgExecutor<'_>,
    from: Epoch,
    to: Epoch,
) -> anyhow::Result<u64> {
    let result = sqlx::query!(
        "UPDATE epochs SET validators_info_fetched = false, validators_balances_fetched = false WHERE epoch BETWEEN $1 AND $2",
        from.0,
        to.0
    )
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}
