//! The `slots` table (spec.md §3, "Slot"). A row exists only once its
//! epoch's committees have been resolved (invariant I1 combined with
//! "a slot row exists only after its epoch's committees have been
//! resolved"), so the only insert path is
//! [`crate::fetchers::committees::run`].
use crate::chain::slot::Slot;
use sqlx::PgExecutor;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotRow {
    pub slot: Slot,
    pub attestations_fetched: bool,
    pub consensus_rewards_fetched: bool,
    pub sync_rewards_fetched: bool,
    pub committees_count_in_slot: Vec<i32>,
}

/// Inserts one row per slot in `epoch`'s range with its committee-size
/// vector, or leaves an existing row untouched (a slot's
/// `committees_count_in_slot` never changes once written).
pub async fn upsert_slot(
    executor: impl PgExecutor<'_>,
    slot: Slot,
    committees_count_in_slot: &[i32],
) -> anyhow::Result<()> {
    sqlx::query!(
        "
        INSERT INTO slots (slot, committees_count_in_slot, attestations_fetched, consensus_rewards_fetched, sync_rewards_fetched)
        VALUES ($1, $2, false, false, false)
        ON CONFLICT (slot) DO NOTHING
        ",
        slot.0,
        committees_count_in_slot,
    )
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn set_attestations_fetched(executor: impl PgExecutor<'_>, slot: Slot) -> anyhow::Result<()> {
    sqlx::query!(
        "UPDATE slots SET attestations_fetched = true WHERE slot = $1",
        slot.0
    )
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn set_consensus_and_sync_rewards_fetched(
    executor: impl PgExecutor<'_>,
    slot: Slot,
) -> anyhow::Result<()> {
    sqlx::query!(
        "UPDATE slots SET consensus_rewards_fetched = true, sync_rewards_fetched = true WHERE slot = $1",
        slot.0
    )
    .execute(executor)
    .await?;
    Ok(())
}

/// The oldest slot that still needs its attestations fetched, bounded
/// above by `max_slot_to_fetch` (spec.md §4.1's head buffer).
pub async fn next_slot_needing_attestations(
    executor: impl PgExecutor<'_>,
    max_slot_to_fetch: Slot,
) -> anyhow::Result<Option<Slot>> {
    let row = sqlx::query!(
        r#"
        SELECT slot AS "slot!"
        FROM slots
        WHERE attestations_fetched = false AND slot <= $1
        ORDER BY slot ASC
        LIMIT 1
        "#,
        max_slot_to_fetch.0
    )
    .fetch_optional(executor)
    .await?;
    Ok(row.map(|r| Slot(r.slot)))
}

pub async fn next_slot_needing_rewards(
    executor: impl PgExecutor<'_>,
    max_slot_to_fetch: Slot,
) -> anyhow::Result<Option<Slot>> {
    let row = sqlx::query!(
        r#"
        SELECT slot AS "slot!"
        FROM slots
        WHERE (consensus_rewards_fetched = false OR sync_rewards_fetched = false) AND slot <= $1
        ORDER BY slot ASC
        LIMIT 1
        "#,
        max_slot_to_fetch.0
    )
    .fetch_optional(executor)
    .await?;
    Ok(row.map(|r| Slot(r.slot)))
}

pub async fn max_slot(executor: impl PgExecutor<'_>) -> anyhow::Result<Option<Slot>> {
    let row = sqlx::query!(r#"SELECT max(slot) AS "slot" FROM slots"#)
        .fetch_one(executor)
        .await?;
    Ok(row.slot.map(Slot))
}

/// Whether `slot`'s block and sync rewards have both landed (spec.md
/// §4.5's daily precondition, which — unlike the hourly one — does not
/// also require `attestations_fetched`).
pub async fn is_consensus_and_sync_rewards_fetched(
    executor: impl PgExecutor<'_>,
    slot: Slot,
) -> anyhow::Result<bool> {
    let row = sqlx::query!(
        r#"
        SELECT (consensus_rewards_fetched AND sync_rewards_fetched) AS "fetched!"
        FROM slots
        WHERE slot = $1
        "#,
        slot.0
    )
    .fetch_optional(executor)
    .await?;
    Ok(row.map(|r| r.fetched).unwrap_or(false))
}

/// Every slot whose `hourOf(slot) = hour_start..hour_end` has all
/// three per-slot flags true (spec.md invariant I2 / §4.5's hourly
/// precondition).
pub async fn all_flags_set_in_range(
    executor: impl PgExecutor<'_>,
    start_slot: Slot,
    end_slot: Slot,
) -> anyhow::Result<bool> {
    let row = sqlx::query!(
        r#"
        SELECT
            count(*) AS "present!",
            count(*) FILTER (
                WHERE attestations_fetched AND consensus_rewards_fetched AND sync_rewards_fetched
            ) AS "complete!"
        FROM slots
        WHERE slot BETWEEN $1 AND $2
        "#,
        start_slot.0,
        end_slot.0
    )
    .fetch_one(executor)
    .await?;

    let expected_count = (end_slot.0 - start_slot.0 + 1) as i64;
    Ok(row.present == expected_count && row.complete == expected_count)
}
