//! The `committees` table (spec.md §3, "Committee"): one row per
//! `(slot, index, aggregationBitsIndex)`. `attestation_delay IS NULL`
//! means "not yet attested, or missed"; once a slot older than the
//! eviction window still has a null, that null is a verified miss
//! (spec.md §3, §4.4).
use crate::chain::slot::Slot;
use sqlx::PgExecutor;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitteeRow {
    pub slot: Slot,
    pub index: i32,
    pub aggregation_bits_index: i32,
    pub validator_index: i32,
    pub attestation_delay: Option<i32>,
}

pub struct CommitteeMember {
    pub index: i32,
    pub aggregation_bits_index: i32,
    pub validator_index: i32,
}

/// Bulk-inserts one row per validator position in every committee of
/// `slot`, called once per slot while fetching an epoch's committees
/// (spec.md §4.4, "Committees"). Uses `UNNEST` rather than one insert
/// per row, matching the store gateway's "batched bulk inserts" role
/// (spec.md §2 component table).
pub async fn insert_committee_members(
    executor: impl PgExecutor<'_>,
    slot: Slot,
    members: &[CommitteeMember],
) -> anyhow::Result<()> {
    if members.is_empty() {
        return Ok(());
    }

    let slots: Vec<i32> = members.iter().map(|_| slot.0).collect();
    let indices: Vec<i32> = members.iter().map(|m| m.index).collect();
    let bit_indices: Vec<i32> = members.iter().map(|m| m.aggregation_bits_index).collect();
    let validator_indices: Vec<i32> = members.iter().map(|m| m.validator_index).collect();

    sqlx::query!(
        "
        INSERT INTO committees (slot, index, aggregation_bits_index, validator_index, attestation_delay)
        SELECT slot, index, aggregation_bits_index, validator_index, NULL::int4
        FROM UNNEST($1::int4[], $2::int4[], $3::int4[], $4::int4[]) AS t(slot, index, aggregation_bits_index, validator_index)
        ON CONFLICT (slot, index, aggregation_bits_index) DO NOTHING
        ",
        &slots,
        &indices,
        &bit_indices,
        &validator_indices,
    )
    .execute(executor)
    .await?;

    Ok(())
}

/// First-inclusion-wins delay update (spec.md §4.4): a committee
/// position's delay only ever shrinks, and only a `NULL` or a larger
/// value is overwritten.
pub async fn record_attestation_delay(
    executor: impl PgExecutor<'_>,
    attested_slot: Slot,
    committee_index: i32,
    aggregation_bits_index: i32,
    delay: i32,
) -> anyhow::Result<()> {
    sqlx::query!(
        "
        UPDATE committees
        SET attestation_delay = LEAST(COALESCE(attestation_delay, $4), $4)
        WHERE slot = $1 AND index = $2 AND aggregation_bits_index = $3
        ",
        attested_slot.0,
        committee_index,
        aggregation_bits_index,
        delay,
    )
    .execute(executor)
    .await?;
    Ok(())
}

/// Prunes on-time evidence older than the eviction window (spec.md
/// §3, §4.4): rows whose delay is definitively within tolerance no
/// longer need to be kept once 3 epochs have elapsed. Rows that are
/// still `NULL` past that window are verified misses and are never
/// touched here.
pub async fn prune_on_time_committees(
    executor: impl PgExecutor<'_>,
    older_than_slot: Slot,
    max_attestation_delay: i32,
) -> anyhow::Result<u64> {
    let result = sqlx::query!(
        "
        DELETE FROM committees
        WHERE slot < $1 AND attestation_delay IS NOT NULL AND attestation_delay <= $2
        ",
        older_than_slot.0,
        max_attestation_delay,
    )
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

/// Committee positions assigned to slots in `[start_slot, end_slot]`
/// whose attestation was missed — null and past the late window, or
/// present but later than `max_attestation_delay` — grouped by
/// validator (spec.md §4.5's hourly aggregation).
pub async fn count_missed_attestations_by_validator(
    executor: impl PgExecutor<'_>,
    start_slot: Slot,
    end_slot: Slot,
    max_attestation_delay: i32,
) -> anyhow::Result<Vec<(i32, i64)>> {
    let rows = sqlx::query!(
        r#"
        SELECT validator_index AS "validator_index!", count(*) AS "missed!"
        FROM committees
        WHERE slot BETWEEN $1 AND $2
          AND (attestation_delay IS NULL OR attestation_delay > $3)
        GROUP BY validator_index
        "#,
        start_slot.0,
        end_slot.0,
        max_attestation_delay,
    )
    .fetch_all(executor)
    .await?;

    Ok(rows.into_iter().map(|r| (r.validator_index, r.missed)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn committee_member_shape_test() {
        let member = CommitteeMember {
            index: 3,
            aggregation_bits_index: 7,
            validator_index: 42,
        };
        assert_eq!(member.validator_index, 42);
    }
}
