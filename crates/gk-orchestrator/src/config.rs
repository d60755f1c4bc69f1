//! Orchestrator-level construction parameters.
//!
//! Stands in for the typed slice of a `gk-config` snapshot this binary will
//! eventually load (spec.md §6 "Persisted state layout"): every field here
//! is read-only input to agent construction, never mutated after boot.

use gk_lifecycle::LifecycleThresholds;
use gk_risk::RiskLimits;

#[derive(Clone, Debug)]
pub struct OrchestratorConfig {
    pub registered_strategies: Vec<String>,
    pub total_capital_usd: f64,
    pub venue_name: String,
    pub risk_limits: RiskLimits,
    pub lifecycle_thresholds: LifecycleThresholds,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            registered_strategies: vec![
                "trend_following".to_string(),
                "mean_reversion".to_string(),
                "funding_arbitrage".to_string(),
            ],
            total_capital_usd: 1_000_000.0,
            venue_name: "paper".to_string(),
            risk_limits: RiskLimits::default(),
            lifecycle_thresholds: LifecycleThresholds::default(),
        }
    }
}
