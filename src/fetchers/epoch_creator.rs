//! The forward-scanning creator task (spec.md §3, "Lifecycles"):
//! inserts `Epoch` rows from `oldestLookbackSlot`'s epoch towards
//! `maxEpochToFetch`, one batch at a time so a single tick can never
//! try to create years of backlog at once.
use crate::{
    chain::{epoch::Epoch, time, CHAIN_PROFILE},
    store,
};
use chrono::Utc;
use pit_wall::Progress;
use sqlx::PgPool;
use tracing::{debug, info};

/// Epochs created per tick. Large enough that a fresh deployment
/// catches up in a reasonable number of ticks, small enough that one
/// tick's transaction never holds the connection for long (spec.md
/// §5's suspension-point bound).
const MAX_EPOCHS_PER_TICK: i32 = 256;

pub async fn run(pool: &PgPool) -> anyhow::Result<()> {
    let now = Utc::now();
    let oldest_lookback_epoch = time::oldest_lookback_slot(now, &CHAIN_PROFILE).epoch(&CHAIN_PROFILE);
    let max_epoch_to_fetch = super::max_epoch_to_fetch();

    let mut tx = pool.begin().await?;
    let start_epoch = match store::epochs::max_epoch(&mut *tx).await? {
        Some(last) => last + 1,
        None => oldest_lookback_epoch,
    };

    if start_epoch > max_epoch_to_fetch {
        info!(%start_epoch, %max_epoch_to_fetch, "skipping epoch creation, caught up to head buffer");
        return Ok(());
    }

    let end_epoch = Epoch(std::cmp::min(
        start_epoch.0 + MAX_EPOCHS_PER_TICK - 1,
        max_epoch_to_fetch.0,
    ));

    let epochs_behind_head = (max_epoch_to_fetch.0 - start_epoch.0).max(0);
    let mut progress = Progress::new("create-epochs", epochs_behind_head as u64);

    for epoch in start_epoch.0..=end_epoch.0 {
        store::epochs::insert_epoch_if_missing(&mut *tx, Epoch(epoch)).await?;
        progress.inc_work_done();
    }
    tx.commit().await?;

    debug!("{}", progress.get_progress_string());
    info!(%start_epoch, %end_epoch, %epochs_behind_head, "created epochs");
    Ok(())
}
