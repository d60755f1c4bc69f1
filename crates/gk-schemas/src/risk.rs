use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskAction {
    Approve,
    Reject,
}

/// Output of the Risk agent's ordered check pipeline. Never returned as an
/// `Err` — rejection is a value, not a failure mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskDecision {
    pub action: RiskAction,
    pub adjusted_exposure_usd: f64,
    pub risk_score: u32,
    pub reasons: Vec<String>,
    pub evaluated_at: DateTime<Utc>,
}
