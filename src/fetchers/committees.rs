//! Committees fetcher (spec.md §4.4, "Committees").
use crate::{
    beacon_client::BeaconClient,
    store::{
        self,
        committees::CommitteeMember,
    },
};
use sqlx::PgPool;
use std::collections::HashMap;
use tracing::info;

pub async fn run(pool: &PgPool, beacon: &dyn BeaconClient) -> anyhow::Result<()> {
    let max_epoch_to_fetch = super::max_epoch_to_fetch();

    let epoch = {
        let mut conn = pool.acquire().await?;
        store::epochs::next_epoch_needing_committees(&mut *conn, max_epoch_to_fetch).await?
    };
    let Some(epoch) = epoch else {
        info!(%max_epoch_to_fetch, "skipping committees fetch, no epoch due");
        return Ok(());
    };

    let assignments = beacon.committees(epoch).await?;

    // committeesCountInSlot (spec.md §3) is indexed by committee index
    // within the slot; build it alongside the per-committee member
    // rows from the same response.
    let mut counts_by_slot: HashMap<i32, Vec<i32>> = HashMap::new();
    let mut members_by_slot: HashMap<i32, Vec<CommitteeMember>> = HashMap::new();

    for assignment in &assignments {
        let counts = counts_by_slot.entry(assignment.slot.0).or_default();
        if counts.len() <= assignment.index as usize {
            counts.resize(assignment.index as usize + 1, 0);
        }
        counts[assignment.index as usize] = assignment.validators.len() as i32;

        let members = members_by_slot.entry(assignment.slot.0).or_default();
        for (position, validator_index) in assignment.validators.iter().enumerate() {
            members.push(CommitteeMember {
                index: assignment.index,
                aggregation_bits_index: position as i32,
                validator_index: *validator_index,
            });
        }
    }

    let mut tx = pool.begin().await?;
    for (slot, counts) in &counts_by_slot {
        let slot = crate::chain::slot::Slot(*slot);
        store::slots::upsert_slot(&mut *tx, slot, counts).await?;
        if let Some(members) = members_by_slot.get(&slot.0) {
            store::committees::insert_committee_members(&mut *tx, slot, members).await?;
        }
    }
    store::epochs::set_committees_fetched(&mut *tx, epoch).await?;
    tx.commit().await?;

    info!(%epoch, slots = counts_by_slot.len(), "fetched committees");
    Ok(())
}
