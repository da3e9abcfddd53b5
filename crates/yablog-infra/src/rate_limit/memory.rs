//! In-memory keyed rate limiter using the governor crate.

use std::num::NonZeroU32;
use std::time::Duration;

use async_trait::async_trait;
use governor::clock::{Clock, DefaultClock};
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{Quota, RateLimiter as GovernorRateLimiter};

use yablog_core::ports::{RateLimitError, RateLimitResult, RateLimiter};

type KeyedRateLimiter = GovernorRateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// Rate limiter configuration.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum requests per window and key.
    pub max_requests: u32,
    /// Window duration.
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window: Duration::from_secs(3600),
        }
    }
}

impl RateLimitConfig {
    /// Read `<prefix>_MAX_REQUESTS` and `<prefix>_WINDOW_SECS`.
    pub fn from_env(prefix: &str) -> Self {
        let defaults = Self::default();
        Self {
            max_requests: std::env::var(format!("{}_MAX_REQUESTS", prefix))
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_requests),
            window: std::env::var(format!("{}_WINDOW_SECS", prefix))
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.window),
        }
    }
}

/// Per-key GCRA rate limiter.
///
/// Limits are per process, not shared across instances.
pub struct InMemoryRateLimiter {
    limiter: KeyedRateLimiter,
    clock: DefaultClock,
}

impl InMemoryRateLimiter {
    pub fn new(config: RateLimitConfig) -> Result<Self, RateLimitError> {
        let burst = NonZeroU32::new(config.max_requests)
            .ok_or_else(|| RateLimitError::Backend("max_requests must be non-zero".into()))?;
        let quota = Quota::with_period(config.window / config.max_requests)
            .ok_or_else(|| RateLimitError::Backend("window must be non-zero".into()))?
            .allow_burst(burst);

        Ok(Self {
            limiter: KeyedRateLimiter::keyed(quota),
            clock: DefaultClock::default(),
        })
    }
}

#[async_trait]
impl RateLimiter for InMemoryRateLimiter {
    async fn check(&self, key: &str) -> Result<RateLimitResult, RateLimitError> {
        match self.limiter.check_key(&key.to_string()) {
            Ok(_) => Ok(RateLimitResult {
                allowed: true,
                reset_after: Duration::ZERO,
            }),
            Err(not_until) => Ok(RateLimitResult {
                allowed: false,
                reset_after: not_until.wait_time_from(self.clock.now()),
            }),
        }
    }
}
