//! The `sync_committees` table (spec.md §3, "SyncCommittee"): one row
//! per sync-committee period, keyed by the epoch range it spans.
use crate::chain::epoch::Epoch;
use sqlx::PgExecutor;

pub async fn upsert_sync_committee(
    executor: impl PgExecutor<'_>,
    from_epoch: Epoch,
    to_epoch: Epoch,
    validators: &[i32],
) -> anyhow::Result<()> {
    sqlx::query!(
        "
        INSERT INTO sync_committees (from_epoch, to_epoch, validators)
        VALUES ($1, $2, $3)
        ON CONFLICT (from_epoch, to_epoch) DO NOTHING
        ",
        from_epoch.0,
        to_epoch.0,
        validators,
    )
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn exists_for_period(
    executor: impl PgExecutor<'_>,
    from_epoch: Epoch,
    to_epoch: Epoch,
) -> anyhow::Result<bool> {
    let row = sqlx::query!(
        r#"SELECT count(*) AS "count!" FROM sync_committees WHERE from_epoch = $1 AND to_epoch = $2"#,
        from_epoch.0,
        to_epoch.0,
    )
    .fetch_one(executor)
    .await?;
    Ok(row.count > 0)
}

/// The validator indices belonging to the sync committee covering
/// `epoch`, used by the block/sync-rewards fetcher to know which
/// validators to ask `sync_committee_rewards` about (spec.md §4.4).
pub async fn members_covering_epoch(
    executor: impl PgExecutor<'_>,
    epoch: Epoch,
) -> anyhow::Result<Vec<i32>> {
    let row = sqlx::query!(
        r#"
        SELECT validators AS "validators!"
        FROM sync_committees
        WHERE from_epoch <= $1 AND to_epoch >= $1
        LIMIT 1
        "#,
        epoch.0,
    )
    .fetch_optional(executor)
    .await?;
    Ok(row.map(|r| r.validators).unwrap_or_default())
}
