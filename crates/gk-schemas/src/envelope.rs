//! Bus subjects and the message envelope every agent publishes under.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A bus subject. Kept as a closed enum rather than a free-form string so
/// delivery policy (lossy vs. lossless) can be selected by match, not by
/// string comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subject {
    MarketData,
    Signals,
    RiskCheck,
    RiskApproved,
    RiskRejected,
    Execution,
    Fills,
    Heartbeat,
    Control,
    Alerts,
}

impl Subject {
    /// Subjects where a slow subscriber causes the publisher to block
    /// rather than lose messages.
    pub fn is_lossless(self) -> bool {
        matches!(
            self,
            Subject::Control | Subject::RiskCheck | Subject::RiskApproved | Subject::RiskRejected | Subject::Fills
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Subject::MarketData => "market_data",
            Subject::Signals => "signals",
            Subject::RiskCheck => "risk_check",
            Subject::RiskApproved => "risk_approved",
            Subject::RiskRejected => "risk_rejected",
            Subject::Execution => "execution",
            Subject::Fills => "fills",
            Subject::Heartbeat => "heartbeat",
            Subject::Control => "control",
            Subject::Alerts => "alerts",
        }
    }
}

/// Payload carried by a `Message`. One tagged variant per subject family,
/// per the sum-type redesign over the original's dynamically-typed payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Payload {
    MarketSnapshot(crate::intent::MarketSnapshot),
    TradeIntent(crate::intent::TradeIntent),
    RiskApproved {
        intent: crate::intent::TradeIntent,
        adjusted_exposure_usd: f64,
        risk_score: u32,
    },
    RiskRejected {
        intent: crate::intent::TradeIntent,
        reasons: Vec<String>,
    },
    Order(crate::order::Order),
    Fill(crate::order::Fill),
    Heartbeat {
        agent_id: String,
        agent_type: String,
        messages_received: u64,
        messages_sent: u64,
        errors: u64,
    },
    Control(ControlMsg),
    Alert {
        severity: AlertSeverity,
        title: String,
        detail: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Info,
    Warning,
    Critical,
}

/// Control-channel commands. Replaces the original's stringly-typed
/// `{"command": "..."}` payload with a sum type matched exhaustively.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum ControlMsg {
    Pause { reason: Option<String> },
    Resume,
    Shutdown,
    MetaDecision(crate::meta::MetaDecision),
    CapitalAllocation(crate::portfolio::PortfolioAllocation),
    KillSwitchReset,
}

/// The standard envelope every inter-agent message travels in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub source_agent: String,
    pub target_agent: Option<String>,
    pub subject: Subject,
    pub payload: Payload,
    pub correlation_id: Uuid,
}

impl Message {
    pub fn new(source_agent: impl Into<String>, subject: Subject, payload: Payload) -> Self {
        Self::with_correlation(source_agent, subject, payload, Uuid::new_v4())
    }

    pub fn with_correlation(
        source_agent: impl Into<String>,
        subject: Subject,
        payload: Payload,
        correlation_id: Uuid,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            source_agent: source_agent.into(),
            target_agent: None,
            subject,
            payload,
            correlation_id,
        }
    }

    pub fn targeted(mut self, target_agent: impl Into<String>) -> Self {
        self.target_agent = Some(target_agent.into());
        self
    }
}
