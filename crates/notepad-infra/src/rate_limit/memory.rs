//! In-memory, per-key rate limiter using the governor crate.

use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use governor::clock::{Clock, DefaultClock};
use governor::middleware::StateInformationMiddleware;
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{Quota, RateLimiter as GovernorRateLimiter};

use notepad_core::ports::{RateLimitError, RateLimitResult, RateLimiter};

type KeyedRateLimiter = GovernorRateLimiter<
    String,
    DefaultKeyedStateStore<String>,
    DefaultClock,
    StateInformationMiddleware,
>;

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
            max_requests: 20,
            window: Duration::from_secs(60),
        }
    }
}

impl RateLimitConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_requests: std::env::var("RATE_LIMIT_MAX_REQUESTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.max_requests),
            window: std::env::var("RATE_LIMIT_WINDOW_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n| *n > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.window),
        }
    }
}

/// Checks between two sweeps of idle keys.
const PURGE_EVERY: u64 = 1024;

/// GCRA rate limiter keyed by client (usually the remote IP).
///
/// Limits are per-process, not shared across instances. Keys whose quota has
/// fully replenished are dropped every [`PURGE_EVERY`] checks.
pub struct InMemoryRateLimiter {
    limiter: KeyedRateLimiter,
    clock: DefaultClock,
    config: RateLimitConfig,
    checks: AtomicU64,
}

impl InMemoryRateLimiter {
    pub fn new(config: RateLimitConfig) -> Result<Self, RateLimitError> {
        let burst = NonZeroU32::new(config.max_requests)
            .ok_or_else(|| RateLimitError::Backend("max_requests must be non-zero".to_string()))?;
        let quota = Quota::with_period(config.window / config.max_requests)
            .ok_or_else(|| RateLimitError::Backend("window must be non-zero".to_string()))?
            .allow_burst(burst);

        Ok(Self {
            limiter: GovernorRateLimiter::keyed(quota).with_middleware::<StateInformationMiddleware>(),
            clock: DefaultClock::default(),
            config,
            checks: AtomicU64::new(0),
        })
    }

    /// Number of keys currently tracked.
    pub fn tracked_keys(&self) -> usize {
        self.limiter.len()
    }

    /// Forget keys that are back to a full quota and return how many remain.
    pub fn purge_idle(&self) -> usize {
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
        let remaining = self.limiter.len();
        tracing::debug!(remaining, "Purged idle rate limit keys");
        remaining
    }
}

#[async_trait]
impl RateLimiter for InMemoryRateLimiter {
    async fn check(&self, key: &str) -> Result<RateLimitResult, RateLimitError> {
        if self.checks.fetch_add(1, Ordering::Relaxed) % PURGE_EVERY == PURGE_EVERY - 1 {
            self.purge_idle();
        }

        match self.limiter.check_key(&key.to_string()) {
            Ok(snapshot) => Ok(RateLimitResult {
                allowed: true,
                remaining: snapshot.remaining_burst_capacity(),
                reset_after: self.config.window,
            }),
            Err(not_until) => Ok(RateLimitResult {
                allowed: false,
                remaining: 0,
                reset_after: not_until.wait_time_from(self.clock.now()),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_burst_then_reject() {
        let limiter = InMemoryRateLimiter::new(RateLimitConfig {
            max_requests: 2,
            window: Duration::from_secs(60),
        })
        .unwrap();

        assert!(limiter.check("10.0.0.1").await.unwrap().allowed);
        assert!(limiter.check("10.0.0.1").await.unwrap().allowed);

        let third = limiter.check("10.0.0.1").await.unwrap();
        assert!(!third.allowed);
        assert!(third.reset_after > Duration::ZERO);
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let limiter = InMemoryRateLimiter::new(RateLimitConfig {
            max_requests: 1,
            window: Duration::from_secs(60),
        })
        .unwrap();

        assert!(limiter.check("a").await.unwrap().allowed);
        assert!(!limiter.check("a").await.unwrap().allowed);
        assert!(limiter.check("b").await.unwrap().allowed);
    }

    #[tokio::test]
    async fn test_idle_keys_are_purged() {
        let limiter = InMemoryRateLimiter::new(RateLimitConfig {
            max_requests: 1,
            window: Duration::from_millis(50),
        })
        .unwrap();

        for key in ["10.0.0.1", "10.0.0.2", "10.0.0.3"] {
            assert!(limiter.check(key).await.unwrap().allowed);
        }
        assert_eq!(limiter.tracked_keys(), 3);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(limiter.purge_idle(), 0);
        assert_eq!(limiter.tracked_keys(), 0);
    }

    #[tokio::test]
    async fn test_purge_keeps_limited_keys() {
        let limiter = InMemoryRateLimiter::new(RateLimitConfig {
            max_requests: 1,
            window: Duration::from_secs(60),
        })
        .unwrap();

        assert!(limiter.check("10.0.0.1").await.unwrap().allowed);
        assert_eq!(limiter.purge_idle(), 1);
        assert!(!limiter.check("10.0.0.1").await.unwrap().allowed);
    }

    #[test]
    fn test_zero_quota_rejected() {
        let result = InMemoryRateLimiter::new(RateLimitConfig {
            max_requests: 0,
            window: Duration::from_secs(60),
        });
        assert!(result.is_err());
    }
}
