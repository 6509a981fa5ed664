//! Rate limiting
//!
//! Per-key limits backed by `governor`'s keyed GCRA limiter. Keys are user
//! emails, so each account gets its own budget.

use std::num::NonZeroU32;
use std::sync::Arc;

use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use tracing::{debug, warn};

use crate::utils::errors::{Result, TeachersPetError};

/// Keys tracked before a check prunes refilled ones itself
pub const MAX_TRACKED_KEYS: usize = 10_000;

/// Keyed limiter shared across request handlers
#[derive(Clone)]
pub struct KeyedLimiter {
    name: &'static str,
    limiter: Arc<DefaultKeyedRateLimiter<String>>,
    max_tracked_keys: usize,
}

impl KeyedLimiter {
    /// Allow `per_minute` attempts per key, refilled evenly over the minute
    pub fn per_minute(name: &'static str, per_minute: u32) -> Self {
        let burst = NonZeroU32::new(per_minute).unwrap_or(NonZeroU32::MIN);
        Self {
            name,
            limiter: Arc::new(RateLimiter::keyed(Quota::per_minute(burst))),
            max_tracked_keys: MAX_TRACKED_KEYS,
        }
    }

    pub fn with_max_tracked_keys(mut self, max_tracked_keys: usize) -> Self {
        self.max_tracked_keys = max_tracked_keys;
        self
    }

    /// Consume one attempt for `key`
    pub fn check(&self, key: &str) -> Result<()> {
        let outcome = self.limiter.check_key(&key.to_string());
        if self.limiter.len() > self.max_tracked_keys {
            self.cleanup();
        }
        match outcome {
            Ok(()) => {
                debug!(limiter = self.name, key = %key, "Rate limit check passed");
                Ok(())
            }
            Err(_) => {
                warn!(limiter = self.name, key = %key, "Rate limit exceeded");
                Err(TeachersPetError::RateLimitExceeded)
            }
        }
    }

    /// Forget keys whose budget has fully refilled
    pub fn cleanup(&self) {
        let before = self.limiter.len();
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
        debug!(limiter = self.name, before, after = self.limiter.len(), "Limiter keys pruned");
    }

    pub fn tracked_keys(&self) -> usize {
        self.limiter.len()
    }
}

impl std::fmt::Debug for KeyedLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyedLimiter").field("name", &self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_limits_each_key_separately() {
        let limiter = KeyedLimiter::per_minute("test", 2);

        assert_ok!(limiter.check("a@school.edu"));
        assert_ok!(limiter.check("a@school.edu"));
        assert_matches!(limiter.check("a@school.edu"), Err(TeachersPetError::RateLimitExceeded));

        assert!(limiter.check("b@school.edu").is_ok());
        assert_eq!(limiter.tracked_keys(), 2);
    }

    #[test]
    fn test_check_prunes_refilled_keys_past_threshold() {
        let limiter = KeyedLimiter::per_minute("test", 6000).with_max_tracked_keys(2);

        assert_ok!(limiter.check("a@school.edu"));
        assert_ok!(limiter.check("b@school.edu"));
        assert_eq!(limiter.tracked_keys(), 2);

        // one cell refills every 10ms at this quota
        std::thread::sleep(std::time::Duration::from_millis(50));
        assert_ok!(limiter.check("c@school.edu"));
        assert_eq!(limiter.tracked_keys(), 1);
    }

    #[test]
    fn test_zero_quota_still_allows_one() {
        let limiter = KeyedLimiter::per_minute("test", 0);
        assert_ok!(limiter.check("a@school.edu"));
        assert_err!(limiter.check("a@school.edu"));
    }
}
