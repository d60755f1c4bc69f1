//! Signal host: the generalized form of the teacher's `StrategyHost`.
//!
//! The teacher's host enforced exactly one strategy per host and a single
//! matching timeframe. This domain runs several named strategies
//! concurrently against the same stream of snapshots (no bar/timeframe
//! concept — market data arrives as discrete snapshots), so the host here
//! keeps the registration/shadow-mode shape but drops the one-strategy and
//! timeframe-match restrictions.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use gk_schemas::intent::{MarketSnapshot, TradeIntent};

use crate::strategies::Strategy;
use crate::types::ShadowMode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalHostError {
    DuplicateStrategy { name: String },
}

impl std::fmt::Display for SignalHostError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateStrategy { name } => write!(f, "strategy '{name}' is already registered"),
        }
    }
}

impl std::error::Error for SignalHostError {}

/// Hosts any number of [`Strategy`] implementations — the three built-ins
/// or a caller-supplied one — and evaluates all of them per snapshot.
pub struct SignalHost {
    strategies: Vec<Box<dyn Strategy>>,
    shadow: ShadowMode,
}

impl SignalHost {
    pub fn new(shadow: ShadowMode) -> Self {
        Self { strategies: Vec::new(), shadow }
    }

    pub fn shadow_mode(&self) -> ShadowMode {
        self.shadow
    }

    pub fn set_shadow_mode(&mut self, shadow: ShadowMode) {
        self.shadow = shadow;
    }

    pub fn register(&mut self, strategy: Box<dyn Strategy>) -> Result<(), SignalHostError> {
        let name = strategy.name();
        if self.strategies.iter().any(|s| s.name() == name) {
            return Err(SignalHostError::DuplicateStrategy { name: name.to_string() });
        }
        self.strategies.push(strategy);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Run every registered strategy once against a snapshot.
    ///
    /// Under [`ShadowMode::On`] the result is still returned (so a caller
    /// can log/compare it for parity), but `should_execute` on the wrapping
    /// [`SignalEvaluation`] reports `false`.
    pub fn evaluate_all(&self, instrument: &str, snapshot: &MarketSnapshot, now: DateTime<Utc>) -> Vec<SignalEvaluation> {
        self.strategies
            .iter()
            .filter_map(|s| s.evaluate(instrument, snapshot, now))
            .map(|intent| SignalEvaluation { intent, shadow: self.shadow })
            .collect()
    }
}

/// One strategy's output for a single snapshot, tagged with whether it's
/// allowed to actually reach the bus.
#[derive(Debug, Clone)]
pub struct SignalEvaluation {
    pub intent: TradeIntent,
    shadow: ShadowMode,
}

impl SignalEvaluation {
    pub fn should_execute(&self) -> bool {
        self.shadow == ShadowMode::Off
    }
}
