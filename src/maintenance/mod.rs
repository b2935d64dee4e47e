//! Maintenance jobs (spec.md §4.6, "cleanup-committee" and "prune"):
//! a wider safety-net sweep of on-time committee rows, and periodic
//! VACUUM/ANALYZE of the hottest tables.
use crate::chain::{time, CHAIN_PROFILE};
use chrono::Utc;
use sqlx::PgPool;
use tracing::info;

/// Tables written on every tick of the fetcher set; the ones worth a
/// scheduled VACUUM/ANALYZE rather than waiting on autovacuum's
/// default thresholds.
const HOT_TABLES: &[&str] = &[
    "slots",
    "epochs",
    "committees",
    "hourly_validator_stats",
    "hourly_block_and_sync_rewards",
    "validators",
];

pub async fn cleanup_committees(pool: &PgPool) -> anyhow::Result<()> {
    let now_slot = time::slot_of(Utc::now(), &CHAIN_PROFILE);
    let older_than = now_slot - CHAIN_PROFILE.committee_eviction_window_slots();

    let pruned = crate::store::committees::prune_on_time_committees(
        pool,
        older_than,
        CHAIN_PROFILE.max_attestation_delay,
    )
    .await?;

    info!(pruned, %older_than, "swept on-time committee rows");
    Ok(())
}

pub async fn vacuum_analyze(pool: &PgPool) -> anyhow::Result<()> {
    for table in HOT_TABLES {
        // table names come from a fixed internal list, never user
        // input, so string interpolation here is not an injection risk
        sqlx::query(&format!("VACUUM ANALYZE {table}"))
            .execute(pool)
            .await?;
    }
    info!(tables = HOT_TABLES.len(), "vacuumed and analyzed hot tables");
    Ok(())
}
