//! Latest-known health per venue, fed by venue adapters' `health_check`
//! results and consulted by the orchestrator/CLI for system status.
//! Order-time gating on freshness lives in `gk-execution`'s
//! `VenueHealthGuard`, which is a stricter, per-venue, time-bounded check;
//! this registry is the simpler "what did we last hear" snapshot store.

use std::collections::HashMap;

use gk_schemas::venue::VenueHealth;

#[derive(Debug, Default)]
pub struct VenueRegistry {
    venues: HashMap<String, VenueHealth>,
}

impl VenueRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, health: VenueHealth) {
        self.venues.insert(health.venue.clone(), health);
    }

    pub fn get(&self, venue: &str) -> Option<&VenueHealth> {
        self.venues.get(venue)
    }

    pub fn all(&self) -> impl Iterator<Item = &VenueHealth> {
        self.venues.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use gk_schemas::venue::VenueStatus;

    #[test]
    fn records_and_overwrites_per_venue() {
        let mut registry = VenueRegistry::new();
        registry.record(VenueHealth { venue: "paper".into(), status: VenueStatus::Healthy, last_heartbeat: Utc::now(), avg_latency_ms: 5.0 });
        assert_eq!(registry.get("paper").unwrap().status, VenueStatus::Healthy);

        registry.record(VenueHealth { venue: "paper".into(), status: VenueStatus::Degraded, last_heartbeat: Utc::now(), avg_latency_ms: 200.0 });
        assert_eq!(registry.get("paper").unwrap().status, VenueStatus::Degraded);
        assert_eq!(registry.all().count(), 1);
    }
}
