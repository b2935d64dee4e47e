//! The reliable beacon-request client (spec.md §4.2): dual-URL
//! dispatch, per-pool concurrency gates, exponential-backoff retry,
//! and a pluggable error handler that can turn an exhausted retry
//! into a sentinel value instead of an error.
pub mod pool;

use crate::rate_limiter::RateLimiter;
use anyhow::Result;
use backoff::{future::retry, Error as BackoffError, ExponentialBackoff};
use pool::Pool;
use std::{sync::Arc, time::Duration};
use tokio::sync::Semaphore;
use tracing::warn;

pub struct ReliableClient {
    pub http: reqwest::Client,
    full_base_url: String,
    archive_base_url: String,
    full_node_limit: Arc<Semaphore>,
    archive_node_limit: Arc<Semaphore>,
    rate_limiter: RateLimiter,
    retries: u32,
    base_delay: Duration,
}

impl ReliableClient {
    pub fn new(
        full_base_url: String,
        archive_base_url: String,
        full_node_concurrency: usize,
        archive_node_concurrency: usize,
        requests_per_second: u32,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            full_base_url,
            archive_base_url,
            full_node_limit: Arc::new(Semaphore::new(full_node_concurrency)),
            archive_node_limit: Arc::new(Semaphore::new(archive_node_concurrency)),
            rate_limiter: RateLimiter::new(requests_per_second),
            retries: 5,
            base_delay: Duration::from_millis(250),
        }
    }

    fn base_url(&self, pool: Pool) -> &str {
        match pool {
            Pool::Full => &self.full_base_url,
            Pool::Archive => &self.archive_base_url,
        }
    }

    fn semaphore(&self, pool: Pool) -> &Arc<Semaphore> {
        match pool {
            Pool::Full => &self.full_node_limit,
            Pool::Archive => &self.archive_node_limit,
        }
    }

    /// Dispatches `call` against the given pool, retrying transient
    /// failures with exponential backoff. `call` is handed the
    /// resolved base URL and is expected to issue exactly one HTTP
    /// request (spec.md §4.2's contract is `call: (baseURL) -> T`).
    ///
    /// `error_handler` runs only once every retry is exhausted; if it
    /// returns `Some`, that value is returned instead of the
    /// underlying error (spec.md's `SLOT_MISSED`-as-sentinel pattern
    /// lives one layer up, in [`crate::beacon_client`], which passes
    /// a handler here that recognizes HTTP 404).
    pub async fn reliable_request<T, Call, Fut>(
        &self,
        pool: Pool,
        call: Call,
        error_handler: Option<&(dyn Fn(&anyhow::Error) -> Option<T> + Send + Sync)>,
    ) -> Result<T>
    where
        Call: Fn(String) -> Fut + Clone,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let base_url = self.base_url(pool).to_string();
        let semaphore = self.semaphore(pool).clone();

        let backoff_config = ExponentialBackoff {
            initial_interval: self.base_delay,
            max_interval: Duration::from_secs(30),
            max_elapsed_time: None,
            multiplier: 2.0,
            ..Default::default()
        };

        let mut attempt: u32 = 0;
        let retries = self.retries;

        let result = retry(backoff_config, || {
            let base_url = base_url.clone();
            let semaphore = semaphore.clone();
            let call = call.clone();
            attempt += 1;
            let is_last_attempt = attempt >= retries;

            async move {
                let _permit = semaphore
                    .acquire()
                    .await
                    .expect("pool semaphore is never closed while the process is running");
                self.rate_limiter.acquire().await;

                match call(base_url).await {
                    Ok(value) => Ok(value),
                    Err(err) => {
                        if is_last_attempt {
                            Err(BackoffError::permanent(err))
                        } else {
                            warn!(attempt, %err, "beacon request failed, retrying");
                            Err(BackoffError::transient(err))
                        }
                    }
                }
            }
        })
        .await;

        match result {
            Ok(value) => Ok(value),
            Err(err) => match error_handler.and_then(|handle| handle(&err)) {
                Some(sentinel) => Ok(sentinel),
                None => Err(crate::error::IndexerError::UpstreamUnavailable(err).into()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn succeeds_without_retry_test() {
        let client = ReliableClient::new(
            "http://full".to_string(),
            "http://archive".to_string(),
            2,
            2,
            1000,
        );

        let result: Result<u32> = client
            .reliable_request(
                Pool::Full,
                |_base_url| async { Ok(42u32) },
                None,
            )
            .await;

        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn retries_until_success_test() {
        let client = ReliableClient::new(
            "http://full".to_string(),
            "http://archive".to_string(),
            2,
            2,
            1000,
        );
        let calls = AtomicU32::new(0);

        let result: Result<u32> = client
            .reliable_request(
                Pool::Full,
                |_base_url| {
                    let n = calls.fetch_add(1, Ordering::SeqCst);
                    async move {
                        if n < 2 {
                            Err(anyhow::anyhow!("transient failure"))
                        } else {
                            Ok(7u32)
                        }
                    }
                },
                None,
            )
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn error_handler_converts_exhausted_retry_to_sentinel_test() {
        let client = ReliableClient::new(
            "http://full".to_string(),
            "http://archive".to_string(),
            2,
            2,
            1000,
        );

        let handler = |_err: &anyhow::Error| Some(-1i32);

        let result: Result<i32> = client
            .reliable_request(
                Pool::Full,
                |_base_url| async { Err(anyhow::anyhow!("not found")) },
                Some(&handler),
            )
            .await;

        assert_eq!(result.unwrap(), -1);
    }

    #[tokio::test]
    async fn propagates_error_without_handler_test() {
        let client = ReliableClient::new(
            "http://full".to_string(),
            "http://archive".to_string(),
            1,
            1,
            1000,
        );

        let result: Result<i32> = client
            .reliable_request(
                Pool::Full,
                |_base_url| async { Err(anyhow::anyhow!("boom")) },
                None,
            )
            .await;

        assert!(result.is_err());
    }
}
