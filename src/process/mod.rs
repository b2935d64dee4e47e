//! Process orchestration (spec.md §5): wires the database pool, the
//! beacon client, the scheduler and the ops server into one `App`
//! rather than reaching through module-level globals, and owns the
//! SIGINT/SIGTERM shutdown sequence.
use crate::{
    beacon_client::{BeaconClient, BeaconClientHttp},
    db::db,
    env::ENV_CONFIG,
    reliable_client::ReliableClient,
    scheduler::{self, Scheduler},
    server::{self, health::IndexerHealth},
};
use chrono::{Duration as ChronoDuration, Utc};
use std::{sync::Arc, time::Duration};
use tracing::info;

/// Concurrency budget per beacon node pool (spec.md §4.2). The full
/// node serves the hot path (committees, attestations, per-slot
/// rewards) so it gets the larger share; the archive node only serves
/// historical validator state lookups.
const FULL_NODE_CONCURRENCY: usize = 10;
const ARCHIVE_NODE_CONCURRENCY: usize = 3;

/// How long the ops server tolerates a silent scheduler before
/// reporting unhealthy.
const HEALTH_STALE_AFTER: ChronoDuration = ChronoDuration::minutes(5);

const OPS_SERVER_PORT: u16 = 3000;

/// How long shutdown waits for in-flight jobs before giving up
/// (spec.md §5, "Cancellation").
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

pub struct App {
    pool: sqlx::PgPool,
    beacon: Arc<dyn BeaconClient>,
    health: Arc<IndexerHealth>,
}

impl App {
    pub async fn build() -> Self {
        let pool = db::get_db_pool("validator-duty-indexer", 10).await;

        let reliable = ReliableClient::new(
            ENV_CONFIG.consensus_full_api_url.clone(),
            ENV_CONFIG.consensus_archive_api_url.clone(),
            FULL_NODE_CONCURRENCY,
            ARCHIVE_NODE_CONCURRENCY,
            ENV_CONFIG.consensus_api_request_per_second,
        );
        let beacon: Arc<dyn BeaconClient> = Arc::new(BeaconClientHttp::new(reliable));

        let health = Arc::new(IndexerHealth::new(Utc::now(), HEALTH_STALE_AFTER));

        Self { pool, beacon, health }
    }

    /// Starts the scheduler and the ops server, and blocks until a
    /// shutdown signal arrives.
    pub async fn run(self) -> anyhow::Result<()> {
        let running_scheduler = scheduler::start(self.pool.clone(), self.beacon.clone(), self.health.clone());

        let server_health = self.health.clone();
        let server_task = tokio::spawn(async move { server::serve(server_health, OPS_SERVER_PORT).await });

        wait_for_shutdown_signal().await;
        info!("shutdown signal received, stopping scheduler");

        shutdown(running_scheduler, self.pool).await;
        server_task.abort();

        Ok(())
    }
}

async fn shutdown(running_scheduler: Scheduler, pool: sqlx::PgPool) {
    running_scheduler.shutdown(SHUTDOWN_TIMEOUT).await;
    pool.close().await;
    info!("db pool closed, exiting");
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
    let mut sigint = signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");

    tokio::select! {
        _ = sigterm.recv() => {}
        _ = sigint.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
