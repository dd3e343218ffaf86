//! Shared requests-per-minute limiter.
//!
//! A token bucket refilled continuously at the configured rate. Every worker
//! holds a clone of the same limiter and calls [`RateLimiter::acquire`] before
//! each fetch. 429/503 responses add a penalty that blocks the whole bucket
//! and grows on repeated hits; consecutive successes shrink it again.

mod config;

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

pub use config::{RateLimitConfig, RateLimitStats};

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
    /// No token is handed out before this instant.
    blocked_until: Option<Instant>,
    penalty: Duration,
    consecutive_successes: u32,
    total_requests: u64,
    rate_limit_hits: u64,
}

impl BucketState {
    fn new(capacity: f64) -> Self {
        Self {
            tokens: capacity,
            last_refill: Instant::now(),
            blocked_until: None,
            penalty: Duration::ZERO,
            consecutive_successes: 0,
            total_requests: 0,
            rate_limit_hits: 0,
        }
    }

    fn refill(&mut self, now: Instant, per_second: f64, capacity: f64) {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * per_second).min(capacity);
        self.last_refill = now;
    }

    fn block_for(&mut self, now: Instant, delay: Duration) {
        self.tokens = 0.0;
        self.last_refill = now;
        self.blocked_until = Some(now + delay);
    }
}

/// Token bucket shared by all workers of a crawl.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: Arc<RateLimitConfig>,
    state: Arc<Mutex<BucketState>>,
}

impl RateLimiter {
    /// Create a new rate limiter with default config.
    pub fn new() -> Self {
        Self::with_config(RateLimitConfig::default())
    }

    /// Create a new rate limiter with custom config.
    pub fn with_config(config: RateLimitConfig) -> Self {
        let capacity = config.capacity();
        Self {
            config: Arc::new(config),
            state: Arc::new(Mutex::new(BucketState::new(capacity))),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Wait for a token and take it.
    pub async fn acquire(&self) {
        let per_second = self.config.tokens_per_second();
        let capacity = self.config.capacity();

        loop {
            let wait = {
                let mut state = self.state.lock().await;
                let now = Instant::now();

                let blocked = state
                    .blocked_until
                    .map(|until| until.saturating_duration_since(now))
                    .unwrap_or(Duration::ZERO);

                if blocked.is_zero() {
                    state.blocked_until = None;
                    state.refill(now, per_second, capacity);
                    if state.tokens >= 1.0 {
                        state.tokens -= 1.0;
                        state.total_requests += 1;
                        return;
                    }
                    Duration::from_secs_f64((1.0 - state.tokens) / per_second)
                } else {
                    blocked
                }
            };

            debug!("Rate limiting: waiting {:?}", wait);
            tokio::time::sleep(wait).await;
        }
    }

    /// Report a successful response - may shrink the penalty.
    pub async fn report_success(&self) {
        let mut state = self.state.lock().await;
        if state.penalty.is_zero() {
            return;
        }

        state.consecutive_successes += 1;
        if state.consecutive_successes < self.config.recovery_threshold {
            return;
        }

        state.consecutive_successes = 0;
        let reduced =
            Duration::from_secs_f64(state.penalty.as_secs_f64() / self.config.backoff_multiplier);
        if reduced < self.config.interval() {
            state.penalty = Duration::ZERO;
            info!("Recovered from rate limit backoff");
        } else {
            state.penalty = reduced;
            debug!("Rate limit penalty reduced to {:?}", state.penalty);
        }
    }

    /// Check if a status code is a definite rate limit.
    pub fn is_rate_limit(status_code: u16) -> bool {
        matches!(status_code, 429 | 503)
    }

    /// Report a rate limit response (429 or 503) - blocks the bucket and grows the penalty.
    pub async fn report_rate_limit(&self, status_code: u16) {
        let mut state = self.state.lock().await;
        state.rate_limit_hits += 1;
        state.consecutive_successes = 0;

        let next = if state.penalty.is_zero() {
            self.config.interval()
        } else {
            Duration::from_secs_f64(state.penalty.as_secs_f64() * self.config.backoff_multiplier)
        };
        state.penalty = next.min(self.config.max_backoff);

        let penalty = state.penalty;
        state.block_for(Instant::now(), penalty);

        warn!(
            "Rate limited (HTTP {}), backing off for {:?}",
            status_code, penalty
        );
    }

    /// Report a server error (5xx other than 503) - one mild pause, penalty unchanged.
    pub async fn report_server_error(&self, status_code: u16) {
        let mut state = self.state.lock().await;
        state.consecutive_successes = 0;
        let pause = Duration::from_secs_f64(self.config.interval().as_secs_f64() * 1.5);
        state.block_for(Instant::now(), pause);
        debug!("Server error (HTTP {}), pausing {:?}", status_code, pause);
    }

    /// Report a response status, routing to the matching handler.
    pub async fn report_status(&self, status_code: u16) {
        if Self::is_rate_limit(status_code) {
            self.report_rate_limit(status_code).await;
        } else if status_code >= 500 {
            self.report_server_error(status_code).await;
        } else if (200..400).contains(&status_code) {
            self.report_success().await;
        }
    }

    /// Get limiter statistics.
    pub async fn get_stats(&self) -> RateLimitStats {
        let state = self.state.lock().await;
        RateLimitStats {
            total_requests: state.total_requests,
            rate_limit_hits: state.rate_limit_hits,
            current_penalty: state.penalty,
            in_backoff: !state.penalty.is_zero(),
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
