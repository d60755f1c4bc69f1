use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyLifecycleState {
    PaperOnly,
    Active,
    Quarantined,
    Disabled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyStateTransition {
    pub from_state: StrategyLifecycleState,
    pub to_state: StrategyLifecycleState,
    pub reason: String,
    pub triggered_by: String,
    pub timestamp: DateTime<Utc>,
}

/// Complete lifecycle record for one strategy. `transition_history` is
/// append-only; nothing in this crate ever mutates a prior entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyLifecycle {
    pub strategy_id: String,
    pub current_state: StrategyLifecycleState,
    pub state_entered_at: DateTime<Utc>,
    pub transition_history: Vec<StrategyStateTransition>,

    pub edge_decay_pct: f64,
    pub performance_vs_expectation: f64,
    pub current_drawdown_pct: f64,
    pub execution_quality: f64,

    pub quarantine_reason: Option<String>,
    pub quarantine_expires_at: Option<DateTime<Utc>>,
    pub quarantine_count_30d: u32,
}

impl StrategyLifecycle {
    pub fn new(strategy_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            strategy_id: strategy_id.into(),
            current_state: StrategyLifecycleState::PaperOnly,
            state_entered_at: now,
            transition_history: Vec::new(),
            edge_decay_pct: 0.0,
            performance_vs_expectation: 1.0,
            current_drawdown_pct: 0.0,
            execution_quality: 1.0,
            quarantine_reason: None,
            quarantine_expires_at: None,
            quarantine_count_30d: 0,
        }
    }

    pub fn can_trade(&self, is_paper_mode: bool) -> bool {
        match self.current_state {
            StrategyLifecycleState::Active => true,
            StrategyLifecycleState::PaperOnly => is_paper_mode,
            StrategyLifecycleState::Quarantined | StrategyLifecycleState::Disabled => false,
        }
    }
}
