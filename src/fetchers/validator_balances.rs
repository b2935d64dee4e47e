//! Validator info and balance fetcher (spec.md §4.4, "Validator
//! balances"). Runs in two phases against the same epoch's state: full
//! validator info first (so lifecycle state and effective balance are
//! current for the reward fetcher), then balances for every
//! non-terminal validator, batched so a single request body never
//! grows unbounded as the validator set grows.
use crate::{
    beacon_client::BeaconClient,
    chain::CHAIN_PROFILE,
    store::{self, validators::ValidatorUpsert},
};
use sqlx::PgPool;
use tracing::info;

/// Validator IDs per `validator_balances` request. The beacon REST API
/// has no hard limit here, but a request this size keeps both the
/// upstream node and this process's memory use predictable.
const BALANCE_BATCH_SIZE: usize = 1_000_000;

pub async fn run(pool: &PgPool, beacon: &dyn BeaconClient) -> anyhow::Result<()> {
    let max_epoch_to_fetch = super::max_epoch_to_fetch();

    let epoch = {
        let mut conn = pool.acquire().await?;
        store::epochs::next_epoch_needing_validators_balances(&mut *conn, max_epoch_to_fetch).await?
    };
    let Some(epoch) = epoch else {
        info!(%max_epoch_to_fetch, "skipping validator balances fetch, no epoch due");
        return Ok(());
    };

    let state_id = crate::beacon_client::types::epoch_last_slot(epoch, &CHAIN_PROFILE)
        .0
        .to_string();

    let infos = beacon.validators(&state_id, None, None).await?;
    let upserts: Vec<ValidatorUpsert> = infos
        .iter()
        .map(|info| ValidatorUpsert {
            index: info.index,
            status: info.status.clone(),
            effective_balance: info.validator.effective_balance,
            withdrawal_address: withdrawal_address(&info.validator.withdrawal_credentials),
        })
        .collect();

    let mut tx = pool.begin().await?;
    store::validators::upsert_info(&mut *tx, &upserts).await?;
    let ids = store::validators::non_terminal_indices(&mut *tx).await?;
    tx.commit().await?;

    for batch in ids.chunks(BALANCE_BATCH_SIZE) {
        let balances = beacon.validator_balances(&state_id, batch).await?;
        let indices: Vec<i32> = balances.iter().map(|b| b.index).collect();
        let amounts: Vec<_> = balances.iter().map(|b| b.balance).collect();

        let mut tx = pool.begin().await?;
        store::validators::upsert_balances(&mut *tx, &indices, &amounts).await?;
        tx.commit().await?;
    }

    let mut conn = pool.acquire().await?;
    store::epochs::set_validators_info_and_balances_fetched(&mut *conn, epoch).await?;

    info!(%epoch, validators = upserts.len(), "fetched validator balances");
    Ok(())
}

/// Withdrawal credentials carry an execution-layer address only under
/// the 0x01 (and 0x02, compounding) prefixes; BLS credentials (0x00)
/// have none yet.
fn withdrawal_address(credentials: &str) -> Option<String> {
    let hex = credentials.strip_prefix("0x")?;
    if hex.len() != 64 {
        return None;
    }
    match &hex[0..2] {
        "01" | "02" => Some(format!("0x{}", &hex[24..])),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn withdrawal_address_bls_credentials_test() {
        let bls = format!("0x00{}", "aa".repeat(31));
        assert_eq!(withdrawal_address(&bls), None);
    }

    #[test]
    fn withdrawal_address_eth1_credentials_test() {
        let eth1 = format!("0x01{}{}", "00".repeat(11), "ab".repeat(20));
        assert_eq!(
            withdrawal_address(&eth1),
            Some(format!("0x{}", "ab".repeat(20)))
        );
    }
}
