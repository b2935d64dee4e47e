//! Sync-committee fetcher (spec.md §4.4, "Sync committees"). A single
//! committee row covers a whole sync-committee period, so most epochs
//! in a period only need their flag flipped against a row a previous
//! epoch in the same period already fetched.
use crate::{
    beacon_client::BeaconClient,
    chain::CHAIN_PROFILE,
    store,
};
use sqlx::PgPool;
use tracing::info;

pub async fn run(pool: &PgPool, beacon: &dyn BeaconClient) -> anyhow::Result<()> {
    let max_epoch_to_fetch = super::max_epoch_to_fetch();

    let epoch = {
        let mut conn = pool.acquire().await?;
        store::epochs::next_epoch_needing_sync_committees(&mut *conn, max_epoch_to_fetch).await?
    };
    let Some(epoch) = epoch else {
        info!(%max_epoch_to_fetch, "skipping sync committees fetch, no epoch due");
        return Ok(());
    };

    let from_epoch = epoch.period_start_epoch(&CHAIN_PROFILE);
    let to_epoch = epoch.period_end_epoch(&CHAIN_PROFILE);

    let mut tx = pool.begin().await?;
    let already_fetched = store::sync_committees::exists_for_period(&mut *tx, from_epoch, to_epoch).await?;
    if !already_fetched {
        let assignment = beacon.sync_committee(epoch).await?;
        store::sync_committees::upsert_sync_committee(
            &mut *tx,
            from_epoch,
            to_epoch,
            &assignment.validators,
        )
        .await?;
    }
    store::epochs::set_sync_committees_fetched(&mut *tx, epoch).await?;
    tx.commit().await?;

    info!(%epoch, %from_epoch, %to_epoch, already_fetched, "fetched sync committee");
    Ok(())
}
