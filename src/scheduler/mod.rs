//! The periodic task scheduler (spec.md §4.6): a fixed set of interval
//! jobs, each running on its own ticker so different jobs proceed
//! concurrently, while `preventOverrun` is enforced for free by never
//! starting a job's next tick until its own previous run has returned
//! — the ticker for job X only ever drives job X.
use crate::{beacon_client::BeaconClient, fetchers, maintenance, server::health::IndexerHealth, summarize};
use sqlx::PgPool;
use std::{sync::Arc, time::Duration};
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{interval, MissedTickBehavior},
};
use tracing::{error, info};

#[derive(Debug, Clone, Copy)]
struct JobSpec {
    id: &'static str,
    interval: Duration,
    run_immediately: bool,
}

fn job_set() -> Vec<JobSpec> {
    let tick = Duration::from_secs(crate::env::ENV_CONFIG.job_tick_interval_seconds);
    vec![
        JobSpec { id: "create-epochs", interval: tick, run_immediately: true },
        JobSpec { id: "fetch-committees", interval: tick, run_immediately: true },
        JobSpec { id: "fetch-sync-committees", interval: tick, run_immediately: true },
        JobSpec { id: "fetch-attestations", interval: tick, run_immediately: true },
        JobSpec { id: "fetch-block-and-sync-rewards", interval: tick, run_immediately: true },
        JobSpec { id: "fetch-attestation-rewards", interval: tick, run_immediately: true },
        JobSpec { id: "fetch-validator-balances", interval: tick, run_immediately: true },
        JobSpec { id: "summarize-hourly", interval: Duration::from_secs(5 * 60), run_immediately: false },
        JobSpec { id: "summarize-daily", interval: Duration::from_secs(60 * 60), run_immediately: false },
        JobSpec { id: "cleanup-committee", interval: Duration::from_secs(60 * 60), run_immediately: false },
        JobSpec { id: "prune", interval: Duration::from_secs(24 * 60 * 60), run_immediately: false },
    ]
}

/// A running scheduler. Dropping this without calling [`Scheduler::shutdown`]
/// leaves the job loops running in the background until the process exits.
pub struct Scheduler {
    shutdown_tx: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

pub fn start(pool: PgPool, beacon: Arc<dyn BeaconClient>, health: Arc<IndexerHealth>) -> Scheduler {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let handles = job_set()
        .into_iter()
        .map(|spec| {
            let pool = pool.clone();
            let beacon = beacon.clone();
            let health = health.clone();
            let shutdown_rx = shutdown_rx.clone();
            tokio::spawn(run_job_loop(pool, beacon, health, spec, shutdown_rx))
        })
        .collect();

    Scheduler { shutdown_tx, handles }
}

impl Scheduler {
    /// Stops all job loops (no new ticks are started) and waits up to
    /// `timeout` for any in-flight jobs to finish (spec.md §5,
    /// "Cancellation").
    pub async fn shutdown(self, timeout: Duration) {
        let _ = self.shutdown_tx.send(true);
        let join_all = futures::future::join_all(self.handles);
        if tokio::time::timeout(timeout, join_all).await.is_err() {
            error!("scheduler shutdown timed out waiting for in-flight jobs");
        }
    }
}

async fn run_job_loop(
    pool: PgPool,
    beacon: Arc<dyn BeaconClient>,
    health: Arc<IndexerHealth>,
    spec: JobSpec,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut ticker = interval(spec.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    if !spec.run_immediately {
        ticker.tick().await;
    }

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    break;
                }
                continue;
            }
        }

        if *shutdown_rx.borrow() {
            break;
        }

        health.mark_tick();
        if let Err(err) = dispatch(spec.id, &pool, beacon.as_ref()).await {
            error!(job = spec.id, error = %err, "job failed");
        }
    }

    info!(job = spec.id, "job loop stopped");
}

async fn dispatch(job: &'static str, pool: &PgPool, beacon: &dyn BeaconClient) -> anyhow::Result<()> {
    match job {
        "create-epochs" => fetchers::epoch_creator::run(pool).await,
        "fetch-committees" => fetchers::committees::run(pool, beacon).await,
        "fetch-sync-committees" => fetchers::sync_committees::run(pool, beacon).await,
        "fetch-attestations" => fetchers::attestations::run(pool, beacon).await,
        "fetch-block-and-sync-rewards" => fetchers::block_and_sync_rewards::run(pool, beacon).await,
        "fetch-attestation-rewards" => fetchers::attestation_rewards::run(pool, beacon).await,
        "fetch-validator-balances" => fetchers::validator_balances::run(pool, beacon).await,
        "summarize-hourly" => summarize::hourly::run(pool).await,
        "summarize-daily" => summarize::daily::run(pool).await,
        "cleanup-committee" => maintenance::cleanup_committees(pool).await,
        "prune" => maintenance::vacuum_analyze(pool).await,
        other => unreachable!("unknown job id {other}"),
    }
}
