//! Forces a closed epoch range back through `fetch-validator-balances`
//! on the next scheduler tick. Usage: `backfill_validator_balances
//! <from_epoch> <to_epoch>`.
use tracing::info;
use validator_duty_indexer::{chain::epoch::Epoch, db::db, logging, store};

#[tokio::main]
pub async fn main() -> anyhow::Result<()> {
    logging::init();

    let mut args = std::env::args().skip(1);
    let from: i32 = args
        .next()
        .expect("usage: backfill_validator_balances <from_epoch> <to_epoch>")
        .parse()
        .expect("from_epoch must be an integer");
    let to: i32 = args
        .next()
        .expect("usage: backfill_validator_balances <from_epoch> <to_epoch>")
        .parse()
        .expect("to_epoch must be an integer");

    let pool = db::get_db_pool("backfill_validator_balances", 3).await;
    let reset =
        store::epochs::reset_validators_info_and_balances_fetched_range(&pool, Epoch(from), Epoch(to)).await?;

    info!(reset, from_epoch = from, to_epoch = to, "reset validator balance flags for range");
    Ok(())
}
