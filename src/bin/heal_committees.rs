//! Forces a closed epoch range back through `fetch-committees` on the
//! next scheduler tick, for recovering from a bad committee fetch
//! (spec.md §9's committee-eviction window can otherwise retire the
//! bad data before anyone notices). Usage: `heal_committees
//! <from_epoch> <to_epoch>`.
use tracing::info;
use validator_duty_indexer::{chain::epoch::Epoch, db::db, logging, store};

#[tokio::main]
pub async fn main() -> anyhow::Result<()> {
    logging::init();

    let mut args = std::env::args().skip(1);
    let from: i32 = args
        .next()
        .expect("usage: heal_committees <from_epoch> <to_epoch>")
        .parse()
        .expect("from_epoch must be an integer");
    let to: i32 = args
        .next()
        .expect("usage: heal_committees <from_epoch> <to_epoch>")
        .parse()
        .expect("to_epoch must be an integer");

    let pool = db::get_db_pool("heal_committees", 3).await;
    let reset = store::epochs::reset_committees_fetched_range(&pool, Epoch(from), Epoch(to)).await?;

    info!(reset, from_epoch = from, to_epoch = to, "reset committee flags for range");
    Ok(())
}
