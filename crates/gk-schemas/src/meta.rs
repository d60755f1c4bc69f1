use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GlobalTradingState {
    Halted,
    ReduceOnly,
    Normal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyState {
    Enable,
    Disable,
    ReduceSize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegimeType {
    Trending,
    Ranging,
    Choppy,
    Volatile,
    Crisis,
}

/// The Meta-Decision agent's binding output. Every other agent's behavior
/// is gated on the most recently observed `MetaDecision`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaDecision {
    pub global_state: GlobalTradingState,
    pub strategy_states: HashMap<String, StrategyState>,
    pub size_multipliers: HashMap<String, f64>,
    pub regime: RegimeType,
    pub confidence: f64,
    pub reason_codes: Vec<String>,
    pub decided_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl MetaDecision {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub fn strategy_allowed(&self, strategy: &str) -> bool {
        if self.global_state == GlobalTradingState::Halted {
            return false;
        }
        !matches!(
            self.strategy_states.get(strategy),
            Some(StrategyState::Disable)
        )
    }

    pub fn size_multiplier(&self, strategy: &str) -> f64 {
        self.size_multipliers.get(strategy).copied().unwrap_or(0.0)
    }
}
