use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::intent::Direction;

pub type Side = Direction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Filled,
    Failed,
    Cancelled,
}

/// An order created by the Execution agent. Only the Execution agent is
/// ever the author of an `Order` — no other component constructs one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub correlation_id: Uuid,
    pub instrument: String,
    pub side: Side,
    pub strategy: String,
    pub size_usd: f64,
    pub limit_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub status: OrderStatus,
    pub venue: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fill {
    pub order_id: Uuid,
    pub correlation_id: Uuid,
    pub instrument: String,
    pub side: Side,
    pub strategy: String,
    pub size_usd: f64,
    pub filled_price: f64,
    pub slippage: f64,
    pub fee: f64,
    pub venue: String,
    pub pnl: f64,
    pub executed_at: DateTime<Utc>,
}
