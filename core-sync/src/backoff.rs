//! # Retry Backoff Policy
//!
//! Exponential backoff with a hard cap and uniform jitter. The deterministic
//! part of the curve is exposed separately so eligibility arithmetic can be
//! tested without randomness.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

/// Default base delay applied after the first failure
pub const DEFAULT_BASE_DELAY_MS: u64 = 1_000;

/// Default growth factor per failed attempt
pub const DEFAULT_MULTIPLIER: f64 = 2.0;

/// Default ceiling for the deterministic delay component
pub const DEFAULT_MAX_DELAY_MS: u64 = 60_000;

/// Default upper bound of the additive jitter window
pub const DEFAULT_MAX_JITTER_MS: u64 = 500;

/// Exponential backoff policy with jitter
///
/// The deterministic component for retry `n` is
/// `min(max_delay, base * multiplier^n)`; each scheduled delay then adds a
/// uniform random value in `0..=max_jitter_ms` so devices waking up together
/// do not retry in lockstep.
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffPolicy {
    /// Base delay in milliseconds
    pub base_delay_ms: u64,
    /// Exponential growth factor
    pub multiplier: f64,
    /// Cap on the deterministic delay component
    pub max_delay_ms: u64,
    /// Upper bound of the additive jitter window
    pub max_jitter_ms: u64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
            multiplier: DEFAULT_MULTIPLIER,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
            max_jitter_ms: DEFAULT_MAX_JITTER_MS,
        }
    }
}

impl BackoffPolicy {
    /// Deterministic delay component for the given retry count.
    ///
    /// Non-decreasing in `retry_count` and capped at `max_delay_ms`.
    pub fn base_delay_for(&self, retry_count: u32) -> u64 {
        let grown = self.base_delay_ms as f64 * self.multiplier.powi(retry_count as i32);
        if grown.is_finite() {
            (grown as u64).min(self.max_delay_ms)
        } else {
            self.max_delay_ms
        }
    }

    /// Full scheduled delay: deterministic component plus fresh jitter.
    pub fn delay_for(&self, retry_count: u32) -> u64 {
        let jitter = if self.max_jitter_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..=self.max_jitter_ms)
        };
        self.base_delay_for(retry_count) + jitter
    }

    /// Compute the next eligibility instant for a failure observed at `now`.
    ///
    /// Called exactly once per failure with the post-increment retry count;
    /// the result is stored on the item and never recomputed.
    pub fn next_eligible_at(&self, now: DateTime<Utc>, retry_count: u32) -> DateTime<Utc> {
        now + Duration::milliseconds(self.delay_for(retry_count) as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_delay_grows_exponentially() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.base_delay_for(0), 1_000);
        assert_eq!(policy.base_delay_for(1), 2_000);
        assert_eq!(policy.base_delay_for(2), 4_000);
        assert_eq!(policy.base_delay_for(3), 8_000);
    }

    #[test]
    fn test_base_delay_caps_at_max() {
        let policy = BackoffPolicy::default();
        // 1000 * 2^6 = 64000 > cap
        assert_eq!(policy.base_delay_for(6), 60_000);
        assert_eq!(policy.base_delay_for(30), 60_000);
        // Huge exponents must not overflow into nonsense
        assert_eq!(policy.base_delay_for(1_000), 60_000);
    }

    #[test]
    fn test_base_delay_is_non_decreasing() {
        let policy = BackoffPolicy::default();
        let mut previous = 0;
        for n in 0..20 {
            let delay = policy.base_delay_for(n);
            assert!(delay >= previous);
            previous = delay;
        }
    }

    #[test]
    fn test_delay_jitter_stays_in_window() {
        let policy = BackoffPolicy::default();
        for _ in 0..100 {
            let delay = policy.delay_for(1);
            assert!(delay >= 2_000);
            assert!(delay <= 2_000 + policy.max_jitter_ms);
        }
    }

    #[test]
    fn test_zero_jitter_is_deterministic() {
        let policy = BackoffPolicy {
            max_jitter_ms: 0,
            ..BackoffPolicy::default()
        };
        assert_eq!(policy.delay_for(2), 4_000);
    }

    #[test]
    fn test_next_eligible_at_is_in_the_future() {
        let policy = BackoffPolicy::default();
        let now = Utc::now();
        let eligible = policy.next_eligible_at(now, 0);
        assert!(eligible > now);
        assert!(eligible <= now + Duration::milliseconds(1_500));
    }
}
