//! The `validators` table (spec.md §3, "Validator"). Terminal-state
//! validators (`exited_*`, `withdrawal_done`) are excluded from
//! balance-refresh batches and from attestation-reward lookups.
use crate::units::GweiNewtype;
use bigdecimal::BigDecimal;
use sqlx::PgExecutor;

const TERMINAL_STATUSES: &[&str] = &[
    "exited_unslashed",
    "exited_slashed",
    "withdrawal_possible",
    "withdrawal_done",
];

pub fn is_terminal_status(status: &str) -> bool {
    TERMINAL_STATUSES.contains(&status)
}

pub struct ValidatorUpsert {
    pub index: i32,
    pub status: String,
    pub effective_balance: GweiNewtype,
    pub withdrawal_address: Option<String>,
}

/// Bulk-upserts validator info (status, effective balance, withdrawal
/// address) learned from a `validators()` call, leaving `balance`
/// untouched — that field is only ever written by
/// [`upsert_balances`].
pub async fn upsert_info(
    executor: impl PgExecutor<'_>,
    validators: &[ValidatorUpsert],
) -> anyhow::Result<()> {
    if validators.is_empty() {
        return Ok(());
    }

    let indices: Vec<i32> = validators.iter().map(|v| v.index).collect();
    let statuses: Vec<String> = validators.iter().map(|v| v.status.clone()).collect();
    let effective_balances: Vec<BigDecimal> = validators
        .iter()
        .map(|v| BigDecimal::from(v.effective_balance))
        .collect();
    let withdrawal_addresses: Vec<Option<String>> =
        validators.iter().map(|v| v.withdrawal_address.clone()).collect();

    sqlx::query!(
        "
        INSERT INTO validators (validator_index, status, effective_balance, balance, withdrawal_address)
        SELECT * FROM UNNEST($1::int4[], $2::text[], $3::numeric[], $4::text[])
        ON CONFLICT (validator_index) DO UPDATE SET
            status = excluded.status,
            effective_balance = excluded.effective_balance,
            withdrawal_address = excluded.withdrawal_address
        ",
        &indices,
        &statuses,
        &effective_balances,
        &withdrawal_addresses as &[Option<String>],
    )
    .execute(executor)
    .await?;

    Ok(())
}

pub async fn upsert_balances(
    executor: impl PgExecutor<'_>,
    indices: &[i32],
    balances: &[GweiNewtype],
) -> anyhow::Result<()> {
    if indices.is_empty() {
        return Ok(());
    }

    let balances: Vec<BigDecimal> = balances.iter().map(|b| BigDecimal::from(*b)).collect();

    sqlx::query!(
        "
        UPDATE validators
        SET balance = data.balance
        FROM (SELECT * FROM UNNEST($1::int4[], $2::numeric[]) AS t(validator_index, balance)) AS data
        WHERE validators.validator_index = data.validator_index
        ",
        indices,
        &balances,
    )
    .execute(executor)
    .await?;

    Ok(())
}

/// All validator indices not in a terminal lifecycle state, the set
/// attestation-rewards and balance-refresh fetchers both operate over
/// (spec.md §4.4).
pub async fn non_terminal_indices(executor: impl PgExecutor<'_>) -> anyhow::Result<Vec<i32>> {
    let rows = sqlx::query!(
        r#"
        SELECT validator_index AS "validator_index!"
        FROM validators
        WHERE status <> ALL($1)
        ORDER BY validator_index ASC
        "#,
        TERMINAL_STATUSES as &[&str],
    )
    .fetch_all(executor)
    .await?;
    Ok(rows.into_iter().map(|r| r.validator_index).collect())
}

pub async fn effective_balance(
    executor: impl PgExecutor<'_>,
    validator_index: i32,
) -> anyhow::Result<Option<GweiNewtype>> {
    let row = sqlx::query!(
        "SELECT effective_balance FROM validators WHERE validator_index = $1",
        validator_index,
    )
    .fetch_optional(executor)
    .await?;
    Ok(row.map(|r| GweiNewtype::from(r.effective_balance)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_status_test() {
        assert!(is_terminal_status("exited_unslashed"));
        assert!(is_terminal_status("withdrawal_done"));
        assert!(!is_terminal_status("active_ongoing"));
    }
}
