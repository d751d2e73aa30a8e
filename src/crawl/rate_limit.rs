//! Rate limiting for web crawling

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use nonzero_ext::nonzero;
use std::sync::Arc;
use std::time::Duration;

/// Per-host rate limiter backed by a governor quota. Fractional
/// requests-per-second values map to a per-request period.
#[derive(Clone)]
pub struct HostRateLimiter {
    limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl HostRateLimiter {
    /// Create a new rate limiter for the given requests per second
    pub fn new(requests_per_second: f64) -> Self {
        let period = if requests_per_second > 0.0 {
            Duration::from_secs_f64(1.0 / requests_per_second)
        } else {
            Duration::from_secs(1)
        };

        let quota = Quota::with_period(period).unwrap_or_else(|| Quota::per_second(nonzero!(1u32)));

        Self {
            limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }

    /// Wait until the next request is allowed
    pub async fn wait(&self) {
        self.limiter.until_ready().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn test_host_rate_limiter_spacing() {
        let limiter = HostRateLimiter::new(10.0); // 10 req/s = 100ms between requests

        let start = Instant::now();
        limiter.wait().await;
        limiter.wait().await;
        limiter.wait().await;
        let elapsed = start.elapsed();

        // Should take at least 200ms for 3 requests (2 intervals)
        assert!(elapsed >= Duration::from_millis(180));
    }

    #[tokio::test]
    async fn test_fast_limiter_does_not_stall() {
        let limiter = HostRateLimiter::new(1000.0);

        for _ in 0..10 {
            limiter.wait().await;
        }
    }
}
