//! Rate limiter configuration and types.

use std::time::Duration;

/// Configuration for the shared token bucket.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Steady-state request rate.
    pub requests_per_minute: u32,
    /// Bucket capacity. 1 spaces requests evenly; larger values allow bursts.
    pub burst: u32,
    /// Multiplier applied to the penalty on each rate limit response.
    pub backoff_multiplier: f64,
    /// Ceiling for the penalty.
    pub max_backoff: Duration,
    /// Number of consecutive successes before reducing the penalty.
    pub recovery_threshold: u32,
}

impl RateLimitConfig {
    /// Config for a given requests-per-minute, other fields default.
    pub fn per_minute(requests_per_minute: u32) -> Self {
        Self {
            requests_per_minute,
            ..Default::default()
        }
    }

    /// Time between two tokens at the steady rate.
    pub fn interval(&self) -> Duration {
        Duration::from_secs_f64(60.0 / f64::from(self.requests_per_minute.max(1)))
    }

    /// Tokens added per second.
    pub fn tokens_per_second(&self) -> f64 {
        f64::from(self.requests_per_minute.max(1)) / 60.0
    }

    pub fn capacity(&self) -> f64 {
        f64::from(self.burst.max(1))
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: 20,
            burst: 1,
            backoff_multiplier: 2.0,
            max_backoff: Duration::from_secs(300),
            recovery_threshold: 3,
        }
    }
}

/// Snapshot of limiter counters.
#[derive(Debug, Clone, Default)]
pub struct RateLimitStats {
    pub total_requests: u64,
    pub rate_limit_hits: u64,
    /// Extra delay currently applied on top of the steady rate.
    pub current_penalty: Duration,
    pub in_backoff: bool,
}
