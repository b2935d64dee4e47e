use crate::health::{HealthCheckable, HealthStatus};
use chrono::{DateTime, Duration, Utc};
use std::sync::RwLock;

/// Tracks scheduler liveness for the `/healthz` endpoint (spec.md
/// §4.6, §9): healthy as long as some job loop has completed a tick
/// recently, or the process hasn't yet had time to run one.
pub struct IndexerHealth {
    last_tick: RwLock<Option<DateTime<Utc>>>,
    started_on: DateTime<Utc>,
    stale_after: Duration,
}

impl IndexerHealth {
    pub fn new(started_on: DateTime<Utc>, stale_after: Duration) -> Self {
        Self {
            last_tick: RwLock::new(None),
            started_on,
            stale_after,
        }
    }

    pub fn mark_tick(&self) {
        *self.last_tick.write().unwrap() = Some(Utc::now());
    }
}

impl HealthCheckable for IndexerHealth {
    fn health_status(&self) -> HealthStatus {
        let now = Utc::now();
        let last_seen = self
            .last_tick
            .read()
            .unwrap()
            .unwrap_or(self.started_on);
        let time_since_last_tick = now - last_seen;

        if time_since_last_tick < self.stale_after {
            HealthStatus::Healthy(Some("scheduler is ticking".to_string()))
        } else {
            HealthStatus::UnHealthy(Some(format!(
                "no scheduler tick observed in {} seconds",
                time_since_last_tick.num_seconds()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn healthy_immediately_after_start_test() {
        let health = IndexerHealth::new(Utc::now(), Duration::minutes(5));
        match health.health_status() {
            HealthStatus::Healthy(_) => {}
            HealthStatus::UnHealthy(_) => panic!("should be healthy right after start"),
        }
    }

    #[test]
    fn unhealthy_once_started_on_is_stale_test() {
        let stale_start = Utc::now() - Duration::minutes(10);
        let health = IndexerHealth::new(stale_start, Duration::minutes(5));
        match health.health_status() {
            HealthStatus::UnHealthy(_) => {}
            HealthStatus::Healthy(_) => panic!("should be unhealthy, no tick and stale start"),
        }
    }

    #[test]
    fn healthy_after_a_recent_tick_test() {
        let stale_start = Utc::now() - Duration::minutes(10);
        let health = IndexerHealth::new(stale_start, Duration::minutes(5));
        health.mark_tick();
        match health.health_status() {
            HealthStatus::Healthy(_) => {}
            HealthStatus::UnHealthy(_) => panic!("should be healthy right after a tick"),
        }
    }
}
