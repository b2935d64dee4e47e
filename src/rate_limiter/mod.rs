//! Process-global token bucket (spec.md §4.2, "Rate limiter").
//!
//! Sits inside every reliable-client call, just before the HTTP
//! request goes out, so the cap applies uniformly across the full and
//! archive pools rather than per-pool. A `Mutex`-protected bucket plus
//! `tokio::time::sleep` implements the "sleep `msBeforeNext + 500ms`
//! then retry" rule directly; there is no background refill task to
//! manage shutdown for.
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::trace;

struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

pub struct RateLimiter {
    points_per_second: f64,
    capacity: f64,
    bucket: Mutex<Bucket>,
}

impl RateLimiter {
    pub fn new(points_per_second: u32) -> Self {
        let points_per_second = points_per_second.max(1) as f64;
        Self {
            points_per_second,
            // Allow a small burst up to one second's worth of points so a
            // quiet period doesn't throttle the very next handful of calls.
            capacity: points_per_second,
            bucket: Mutex::new(Bucket {
                tokens: points_per_second,
                last_refill: Instant::now(),
            }),
        }
    }

    /// Blocks the caller until a single point is available, then
    /// spends it. Ordering across competing callers is best-effort
    /// FIFO (the mutex queues waiters) but not guaranteed, matching
    /// spec.md §4.2.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut bucket = self.bucket.lock().await;
                self.refill(&mut bucket);

                if bucket.tokens >= 1.0 {
                    bucket.tokens -= 1.0;
                    trace!(tokens_remaining = bucket.tokens, "rate limiter point spent");
                    return;
                }

                let tokens_needed = 1.0 - bucket.tokens;
                let ms_before_next =
                    (tokens_needed / self.points_per_second * 1000.0).ceil() as u64;
                Duration::from_millis(ms_before_next + 500)
            };

            tokio::time::sleep(wait).await;
        }
    }

    fn refill(&self, bucket: &mut Bucket) {
        let elapsed = bucket.last_refill.elapsed();
        let refilled = elapsed.as_secs_f64() * self.points_per_second;
        if refilled > 0.0 {
            bucket.tokens = (bucket.tokens + refilled).min(self.capacity);
            bucket.last_refill = Instant::now();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::join_all;
    use std::sync::Arc;

    #[tokio::test(flavor = "multi_thread")]
    async fn drains_at_configured_rate_test() {
        let limiter = Arc::new(RateLimiter::new(2));
        let started_at = Instant::now();

        let calls = (0..10).map(|_| {
            let limiter = limiter.clone();
            tokio::spawn(async move { limiter.acquire().await })
        });

        join_all(calls).await;

        // 10 calls at 2/s, starting with a burst of up to 2, should take
        // at least ~4s to drain; spec.md's concrete scenario asserts 4.5s
        // at the same rate with a cold bucket.
        assert!(started_at.elapsed() >= Duration::from_millis(3500));
    }

    #[tokio::test]
    async fn single_call_is_immediate_test() {
        let limiter = RateLimiter::new(5);
        let started_at = Instant::now();
        limiter.acquire().await;
        assert!(started_at.elapsed() < Duration::from_millis(50));
    }
}
