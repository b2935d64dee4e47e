//! Attestation-delay fetcher (spec.md §4.4, "Attestations"): walks
//! slots forward, records each committee position's first-inclusion
//! delay, and prunes positions that are definitively on time once
//! they've aged past the eviction window.
use crate::{
    beacon_client::BeaconClient,
    chain::CHAIN_PROFILE,
    store,
};
use sqlx::PgPool;
use tracing::info;

pub async fn run(pool: &PgPool, beacon: &dyn BeaconClient) -> anyhow::Result<()> {
    let max_slot_to_fetch = super::max_slot_to_fetch();

    let slot = {
        let mut conn = pool.acquire().await?;
        store::slots::next_slot_needing_attestations(&mut *conn, max_slot_to_fetch).await?
    };
    let Some(slot) = slot else {
        info!(%max_slot_to_fetch, "skipping attestations fetch, no slot due");
        return Ok(());
    };

    // A slot row only exists once its epoch's committees are resolved
    // (invariant I1), so this precondition holds by construction; it
    // is re-checked here defensively in case a future caller bypasses
    // the committees fetcher.
    let epoch = slot.epoch(&CHAIN_PROFILE);
    {
        let mut conn = pool.acquire().await?;
        if !store::epochs::is_committees_fetched(&mut *conn, epoch).await? {
            info!(%slot, %epoch, "skipping attestations fetch, committees not yet resolved");
            return Ok(());
        }
    }

    let block = beacon.block(slot).await?;

    let mut tx = pool.begin().await?;
    match block {
        crate::beacon_client::SlotAddressed::Found(block) => {
            for attestation in &block.body.attestations {
                let attested_slot = attestation.data.slot;
                if attested_slot > slot {
                    continue;
                }
                let delay = slot - attested_slot;
                for (position, included) in attestation.aggregation_bits.iter().enumerate() {
                    if *included {
                        store::committees::record_attestation_delay(
                            &mut *tx,
                            attested_slot,
                            attestation.data.index,
                            position as i32,
                            delay,
                        )
                        .await?;
                    }
                }
            }
        }
        crate::beacon_client::SlotAddressed::Missed => {}
    }

    let eviction_window = CHAIN_PROFILE.committee_eviction_window_slots();
    let older_than = slot - eviction_window;
    let pruned = store::committees::prune_on_time_committees(
        &mut *tx,
        older_than,
        CHAIN_PROFILE.max_attestation_delay,
    )
    .await?;

    store::slots::set_attestations_fetched(&mut *tx, slot).await?;
    tx.commit().await?;

    info!(%slot, pruned, "fetched attestations");
    Ok(())
}
