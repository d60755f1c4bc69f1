//! Venue health freshness guard.
//!
//! Provides [`VenueHealthGuard`]: a [`VenueHealthGate`] implementation that
//! enforces both freshness (a health check ran recently) and cleanliness
//! (the last result was [`VenueStatus::Healthy`]) before a venue is allowed
//! to receive an order.
//!
//! Time is passed explicitly as `now: DateTime<Utc>` rather than read from
//! the system clock, keeping the gate deterministic for tests.

use chrono::{DateTime, Utc};
use gk_schemas::venue::VenueStatus;

/// Evaluated by [`crate::gateway::BrokerGateway`] before every venue op.
pub trait VenueHealthGate {
    fn is_healthy(&self, now: DateTime<Utc>) -> bool;
}

/// Freshness-aware [`VenueHealthGate`] implementation.
///
/// Fails **closed** when:
/// - a health check has never run (fail-closed at boot)
/// - the most recent Healthy check is older than `freshness_bound`
/// - the most recent check reported Degraded or Offline (clears the
///   timestamp so staleness can't mask it)
pub struct VenueHealthGuard {
    freshness_bound: chrono::Duration,
    last_healthy_at: Option<DateTime<Utc>>,
}

impl VenueHealthGuard {
    pub fn new(freshness_bound: chrono::Duration) -> Self {
        Self { freshness_bound, last_healthy_at: None }
    }

    /// Record the result of a venue health check.
    pub fn record_health_check(&mut self, status: VenueStatus, at: DateTime<Utc>) {
        self.last_healthy_at = match status {
            VenueStatus::Healthy => Some(at),
            VenueStatus::Degraded | VenueStatus::Offline => None,
        };
    }

    pub fn last_healthy_at(&self) -> Option<DateTime<Utc>> {
        self.last_healthy_at
    }
}

impl VenueHealthGate for VenueHealthGuard {
    fn is_healthy(&self, now: DateTime<Utc>) -> bool {
        match self.last_healthy_at {
            None => false,
            Some(t) => (now - t) <= self.freshness_bound,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_checked_fails_closed() {
        let guard = VenueHealthGuard::new(chrono::Duration::seconds(30));
        assert!(!guard.is_healthy(Utc::now()));
    }

    #[test]
    fn fresh_healthy_check_passes() {
        let now = Utc::now();
        let mut guard = VenueHealthGuard::new(chrono::Duration::seconds(30));
        guard.record_health_check(VenueStatus::Healthy, now);
        assert!(guard.is_healthy(now + chrono::Duration::seconds(10)));
    }

    #[test]
    fn stale_healthy_check_fails() {
        let now = Utc::now();
        let mut guard = VenueHealthGuard::new(chrono::Duration::seconds(30));
        guard.record_health_check(VenueStatus::Healthy, now);
        assert!(!guard.is_healthy(now + chrono::Duration::seconds(31)));
    }

    #[test]
    fn degraded_check_fails_immediately() {
        let now = Utc::now();
        let mut guard = VenueHealthGuard::new(chrono::Duration::seconds(30));
        guard.record_health_check(VenueStatus::Healthy, now);
        guard.record_health_check(VenueStatus::Degraded, now);
        assert!(!guard.is_healthy(now));
    }
}
