//! Monotonic lease tracking for activated jobs.

use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};

/// Tracks how much of a job's lease is left.
///
/// The engine hands out leases as absolute wall-clock deadlines. The clock
/// translates that deadline into the monotonic domain once, at construction,
/// so later reads are immune to wall-clock adjustments. An extension restarts
/// the lease window from the moment it is granted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaseClock {
    expires_at: Instant,
}

impl LeaseClock {
    /// Anchor a clock from the wall-clock deadline reported by the engine.
    ///
    /// A deadline already in the past yields an expired clock.
    pub fn anchored(deadline: DateTime<Utc>) -> Self {
        let remaining = (deadline - Utc::now()).to_std().unwrap_or(Duration::ZERO);
        Self::starting_in(remaining)
    }

    /// Build a clock expiring after `remaining` from now.
    pub fn starting_in(remaining: Duration) -> Self {
        Self {
            expires_at: Instant::now() + remaining,
        }
    }

    /// Time left on the lease, zero once expired.
    pub fn remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }

    /// Whether the lease window has closed.
    pub fn has_expired(&self) -> bool {
        self.remaining().is_zero()
    }

    /// Restart the lease window: it now closes `timeout` from this instant.
    pub fn extend(&mut self, timeout: Duration) {
        self.expires_at = Instant::now() + timeout;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    #[test]
    fn test_remaining_counts_down_from_deadline() {
        let clock = LeaseClock::anchored(Utc::now() + ChronoDuration::seconds(30));
        let remaining = clock.remaining();
        assert!(remaining > Duration::from_secs(29));
        assert!(remaining <= Duration::from_secs(30));
        assert!(!clock.has_expired());
    }

    #[test]
    fn test_past_deadline_is_expired() {
        let clock = LeaseClock::anchored(Utc::now() - ChronoDuration::seconds(5));
        assert!(clock.has_expired());
        assert_eq!(clock.remaining(), Duration::ZERO);
    }

    #[test]
    fn test_extend_restarts_the_window() {
        let mut clock = LeaseClock::starting_in(Duration::ZERO);
        assert!(clock.has_expired());

        clock.extend(Duration::from_secs(60));
        assert!(!clock.has_expired());
        assert!(clock.remaining() > Duration::from_secs(59));
    }

    #[test]
    fn test_extend_can_shorten_a_long_lease() {
        let mut clock = LeaseClock::starting_in(Duration::from_secs(600));
        clock.extend(Duration::from_secs(1));
        assert!(clock.remaining() <= Duration::from_secs(1));
    }
}
