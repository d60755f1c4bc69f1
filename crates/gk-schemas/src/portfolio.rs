use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyAllocation {
    pub strategy_id: String,
    pub weight: f64,
    pub risk_budget_usd: f64,
    pub exposure_cap_usd: f64,
    pub is_quarantined: bool,
    pub quarantine_reason: Option<String>,
    pub performance_score: f64,
    pub correlation_penalty: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioAllocation {
    pub allocations: HashMap<String, StrategyAllocation>,
    pub total_capital_usd: f64,
    pub deployed_capital_usd: f64,
    pub cash_reserve_pct: f64,
    pub regime_multiplier: f64,
    pub decided_at: DateTime<Utc>,
}
