//! Forces a closed epoch range back through `fetch-attestation-rewards`
//! on the next scheduler tick. Usage: `backfill_attestation_rewards
//! <from_epoch> <to_epoch>`.
use tracing::info;
use validator_duty_indexer::{chain::epoch::Epoch, db::db, logging, store};

#[tokio::main]
pub async fn main() -> anyhow::Result<()> {
    logging::init();

    let mut args = std::env::args().skip(1);
    let from: i32 = args
        .next()
        .expect("usage: backfill_attestation_rewards <from_epoch> <to_epoch>")
        .parse()
        .expect("from_epoch must be an integer");
    let to: i32 = args
        .next()
        .expect("usage: backfill_attestation_rewards <from_epoch> <to_epoch>")
        .parse()
        .expect("to_epoch must be an integer");

    let pool = db::get_db_pool("backfill_attestation_rewards", 3).await;
    let reset = store::epochs::reset_rewards_fetched_range(&pool, Epoch(from), Epoch(to)).await?;

    info!(reset, from_epoch = from, to_epoch = to, "reset attestation-reward flags for range");
    Ok(())
}
