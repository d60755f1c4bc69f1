use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookType {
    Hedge,
    Prop,
    /// Highest-risk book. Its exposure/drawdown MUST never be aggregated
    /// into another book's risk budget or exposure cap.
    Meme,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    Conservative,
    Standard,
    Aggressive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookStatus {
    Active,
    Halted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    pub id: String,
    pub book_type: BookType,
    pub capital_allocated_usd: f64,
    pub current_exposure_usd: f64,
    pub max_drawdown_limit_pct: f64,
    pub risk_tier: RiskTier,
    pub status: BookStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VenueStatus {
    Healthy,
    Degraded,
    Offline,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueHealth {
    pub venue: String,
    pub status: VenueStatus,
    pub last_heartbeat: DateTime<Utc>,
    pub avg_latency_ms: f64,
}
