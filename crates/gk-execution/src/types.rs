use gk_schemas::intent::Direction;
use gk_schemas::order::Order;

/// Broker-agnostic shape the order router actually dispatches, derived from
/// an [`Order`] the instant before it crosses the [`crate::order_router::BrokerAdapter`]
/// boundary. Nothing upstream of this point (risk, allocation, strategy)
/// should ever construct one directly.
#[derive(Debug, Clone)]
pub struct ExecutionIntent {
    pub order_id: String,
    pub instrument: String,
    pub side: Direction,
    pub size_usd: f64,
    pub order_type: String,
    pub limit_price: Option<f64>,
    pub time_in_force: String,
}

impl ExecutionIntent {
    pub fn from_order(order: &Order) -> Self {
        Self {
            order_id: order.id.to_string(),
            instrument: order.instrument.clone(),
            side: order.side,
            size_usd: order.size_usd,
            order_type: "limit".to_string(),
            limit_price: Some(order.limit_price),
            time_in_force: "gtc".to_string(),
        }
    }
}
