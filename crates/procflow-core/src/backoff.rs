//! Retry backoff policy.

use rand::Rng;
use std::time::Duration;

/// Capped exponential backoff with optional jitter.
///
/// The deterministic schedule is `min(base * 2^attempt, max)`; [`jittered`]
/// spreads each delay by a bounded random factor so that many workers
/// reconnecting at once do not hit the engine in lockstep.
///
/// [`jittered`]: BackoffPolicy::jittered
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffPolicy {
    base: Duration,
    max: Duration,
    jitter: f64,
}

impl BackoffPolicy {
    /// Create a policy with the given base and cap, and a default jitter
    /// spread of 10%.
    pub fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max,
            jitter: 0.1,
        }
    }

    /// Set the jitter spread as a fraction of the delay, clamped to `[0, 1]`.
    pub fn with_jitter(mut self, fraction: f64) -> Self {
        self.jitter = fraction.clamp(0.0, 1.0);
        self
    }

    /// Deterministic delay for the given attempt, monotonically
    /// non-decreasing and capped at `max`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let mut delay = self.base.min(self.max);
        for _ in 0..attempt {
            if delay >= self.max {
                return self.max;
            }
            delay = delay.saturating_mul(2).min(self.max);
        }
        delay
    }

    /// Delay for the given attempt with jitter applied, never exceeding
    /// `max`.
    pub fn jittered(&self, attempt: u32) -> Duration {
        let delay = self.delay_for(attempt);
        if self.jitter <= 0.0 || delay.is_zero() {
            return delay;
        }
        let factor = rand::thread_rng().gen_range(1.0 - self.jitter..=1.0 + self.jitter);
        delay.mul_f64(factor).min(self.max)
    }

    /// The configured cap.
    pub fn max_delay(&self) -> Duration {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_grows_exponentially_until_cap() {
        let policy = BackoffPolicy::new(Duration::from_millis(100), Duration::from_secs(2));
        assert_eq!(policy.delay_for(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for(2), Duration::from_millis(400));
        assert_eq!(policy.delay_for(4), Duration::from_millis(1600));
        assert_eq!(policy.delay_for(5), Duration::from_secs(2));
        assert_eq!(policy.delay_for(50), Duration::from_secs(2));
    }

    #[test]
    fn test_delay_is_monotonic() {
        let policy = BackoffPolicy::new(Duration::from_millis(50), Duration::from_secs(30));
        for attempt in 0..64 {
            assert!(policy.delay_for(attempt + 1) >= policy.delay_for(attempt));
        }
    }

    #[test]
    fn test_base_above_cap_is_clamped() {
        let policy = BackoffPolicy::new(Duration::from_secs(10), Duration::from_secs(1));
        assert_eq!(policy.delay_for(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for(3), Duration::from_secs(1));
    }

    #[test]
    fn test_jitter_stays_within_spread() {
        let policy =
            BackoffPolicy::new(Duration::from_millis(100), Duration::from_secs(60)).with_jitter(0.5);
        for _ in 0..100 {
            let delay = policy.jittered(1);
            assert!(delay >= Duration::from_millis(100));
            assert!(delay <= Duration::from_millis(300));
        }
    }

    #[test]
    fn test_jitter_never_exceeds_cap() {
        let policy =
            BackoffPolicy::new(Duration::from_secs(1), Duration::from_secs(1)).with_jitter(1.0);
        for _ in 0..100 {
            assert!(policy.jittered(10) <= Duration::from_secs(1));
        }
    }

    #[test]
    fn test_zero_jitter_is_deterministic() {
        let policy =
            BackoffPolicy::new(Duration::from_millis(100), Duration::from_secs(2)).with_jitter(0.0);
        assert_eq!(policy.jittered(3), policy.delay_for(3));
    }
}
