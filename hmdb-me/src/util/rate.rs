//! Minimum inter-call delay enforcement
//!
//! Every external provider client holds one of these. Rate limiting is a
//! fixed minimum interval between calls, not a token bucket: the batch is
//! sequential, so the only requirement is spacing.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::debug;

/// Tracks the last call instant and sleeps as needed to keep calls at
/// least `min_interval` apart.
pub struct RateLimiter {
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: Mutex::new(None),
        }
    }

    /// Sleep until `min_interval` has elapsed since the previous call,
    /// then record the current instant.
    pub async fn wait(&self) {
        let mut last_call = self.last_call.lock().await;

        if let Some(last) = *last_call {
            let elapsed = last.elapsed();
            if elapsed < self.min_interval {
                let remaining = self.min_interval - elapsed;
                debug!(sleep_ms = remaining.as_millis() as u64, "Rate limiting before next call");
                sleep(remaining).await;
            }
        }

        *last_call = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_call_is_immediate() {
        let limiter = RateLimiter::new(Duration::from_millis(200));
        let start = Instant::now();
        limiter.wait().await;
        assert!(start.elapsed().as_millis() < 50, "first call should not sleep");
    }

    #[tokio::test]
    async fn test_second_call_is_delayed() {
        let limiter = RateLimiter::new(Duration::from_millis(100));
        limiter.wait().await;
        let start = Instant::now();
        limiter.wait().await;
        assert!(
            start.elapsed().as_millis() >= 90,
            "second call should wait for the interval, got {}ms",
            start.elapsed().as_millis()
        );
    }
}
