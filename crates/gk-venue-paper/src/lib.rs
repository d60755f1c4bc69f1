//! Deterministic in-memory paper venue.
//!
//! Design decisions (kept intentionally simple/deterministic, inherited
//! from the broker this replaces):
//! - `broker_order_id` is exactly `client_order_id`.
//! - No randomness, no wall-clock reads. Fill price comes from an
//!   explicit limit price or a reference price the caller sets ahead of
//!   time (`set_reference_price`) — never conjured.
//! - Submit is idempotent on `client_order_id`: submitting the same id
//!   twice returns the first result without re-mutating state.
//!
//! Implements both the natural venue-adapter shape (`connect`/
//! `disconnect`/`place_order`/`cancel_order`/`get_balance`/
//! `get_positions`/`health_check`) and `gk_execution::BrokerAdapter`, the
//! narrower trait `OrderRouter` actually dispatches through.

mod types;

pub use types::{PaperOrder, PaperOrderStatus, PaperPosition};

use std::collections::BTreeMap;
use std::sync::Mutex;

use gk_execution::{BrokerAdapter, BrokerCancelResponse, BrokerReplaceRequest, BrokerReplaceResponse, BrokerSubmitRequest, BrokerSubmitResponse};
use gk_schemas::intent::Direction;
use gk_schemas::venue::{VenueHealth, VenueStatus};

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

#[derive(Debug)]
struct VenueState {
    connected: bool,
    orders: BTreeMap<String, PaperOrder>,
    positions: BTreeMap<String, f64>,
    balances: BTreeMap<String, f64>,
    reference_prices: BTreeMap<String, f64>,
}

impl VenueState {
    fn new(starting_cash_usd: f64) -> Self {
        Self {
            connected: false,
            orders: BTreeMap::new(),
            positions: BTreeMap::new(),
            balances: BTreeMap::from([("USD".to_string(), starting_cash_usd)]),
            reference_prices: BTreeMap::new(),
        }
    }
}

pub struct PaperVenue {
    name: String,
    state: Mutex<VenueState>,
}

impl PaperVenue {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_starting_cash(name, 1_000_000.0)
    }

    pub fn with_starting_cash(name: impl Into<String>, starting_cash_usd: f64) -> Self {
        Self { name: name.into(), state: Mutex::new(VenueState::new(starting_cash_usd)) }
    }

    /// Test/scenario setup: fixes the fill price a market order at this
    /// instrument will use when no limit price is given.
    pub fn set_reference_price(&self, instrument: impl Into<String>, price: f64) {
        self.state.lock().unwrap().reference_prices.insert(instrument.into(), price);
    }

    pub fn connect(&self) -> bool {
        self.state.lock().unwrap().connected = true;
        true
    }

    pub fn disconnect(&self) {
        self.state.lock().unwrap().connected = false;
    }

    pub fn is_connected(&self) -> bool {
        self.state.lock().unwrap().connected
    }

    /// Place an order. Idempotent on `client_order_id`; fails if no price
    /// can be determined (no limit price and no reference price set for
    /// the instrument) rather than ever returning a zero/unknown price.
    pub fn place_order(
        &self,
        client_order_id: &str,
        instrument: &str,
        side: Direction,
        size_usd: f64,
        limit_price: Option<f64>,
    ) -> Result<PaperOrder> {
        let mut state = self.state.lock().unwrap();
        if let Some(existing) = state.orders.get(client_order_id) {
            return Ok(existing.clone());
        }

        let fill_price = limit_price.or_else(|| state.reference_prices.get(instrument).copied());
        let Some(fill_price) = fill_price else {
            return Err(format!("no price available for {instrument}: set a limit price or a reference price").into());
        };
        if fill_price <= 0.0 {
            return Err(format!("invalid fill price {fill_price} for {instrument}").into());
        }

        let signed_delta = match side {
            Direction::Buy => size_usd,
            Direction::Sell => -size_usd,
        };
        *state.positions.entry(instrument.to_string()).or_insert(0.0) += signed_delta;

        let order = PaperOrder {
            client_order_id: client_order_id.to_string(),
            instrument: instrument.to_string(),
            side,
            size_usd,
            limit_price,
            status: PaperOrderStatus::Filled,
            filled_price: Some(fill_price),
        };
        state.orders.insert(client_order_id.to_string(), order.clone());
        Ok(order)
    }

    pub fn cancel_order(&self, client_order_id: &str) -> bool {
        let mut state = self.state.lock().unwrap();
        match state.orders.get_mut(client_order_id) {
            Some(order) if order.status == PaperOrderStatus::Accepted => {
                order.status = PaperOrderStatus::Cancelled;
                true
            }
            _ => false,
        }
    }

    pub fn get_balance(&self) -> BTreeMap<String, f64> {
        self.state.lock().unwrap().balances.clone()
    }

    pub fn get_positions(&self) -> Vec<PaperPosition> {
        self.state
            .lock()
            .unwrap()
            .positions
            .iter()
            .map(|(instrument, net_exposure_usd)| PaperPosition { instrument: instrument.clone(), net_exposure_usd: *net_exposure_usd })
            .collect()
    }

    pub fn health_check_native(&self) -> VenueHealth {
        let connected = self.is_connected();
        VenueHealth {
            venue: self.name.clone(),
            status: if connected { VenueStatus::Healthy } else { VenueStatus::Offline },
            last_heartbeat: chrono::Utc::now(),
            avg_latency_ms: 0.0,
        }
    }
}

impl BrokerAdapter for PaperVenue {
    fn submit_order(&self, req: BrokerSubmitRequest) -> Result<BrokerSubmitResponse> {
        if !self.is_connected() {
            self.connect();
        }
        let order = self.place_order(&req.order_id, &req.instrument, req.side, req.size_usd, req.limit_price)?;
        Ok(BrokerSubmitResponse {
            broker_order_id: order.client_order_id,
            fill_price: order.filled_price.unwrap_or(0.0),
            status: "filled".to_string(),
        })
    }

    fn cancel_order(&self, order_id: &str) -> Result<BrokerCancelResponse> {
        let cancelled = self.cancel_order(order_id);
        Ok(BrokerCancelResponse {
            broker_order_id: order_id.to_string(),
            status: if cancelled { "cancelled".to_string() } else { "not_found_or_already_filled".to_string() },
        })
    }

    fn replace_order(&self, req: BrokerReplaceRequest) -> Result<BrokerReplaceResponse> {
        let mut state = self.state.lock().unwrap();
        if let Some(order) = state.orders.get_mut(&req.broker_order_id) {
            order.size_usd = req.size_usd;
            order.limit_price = req.limit_price;
        }
        Ok(BrokerReplaceResponse { broker_order_id: req.broker_order_id, status: "replaced".to_string() })
    }

    fn health_check(&self) -> VenueStatus {
        self.health_check_native().status
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submit_is_idempotent_on_client_order_id() {
        let venue = PaperVenue::new("paper");
        venue.set_reference_price("BTC-USD", 60_000.0);

        let first = venue.place_order("order-1", "BTC-USD", Direction::Buy, 1_000.0, None).unwrap();
        let second = venue.place_order("order-1", "BTC-USD", Direction::Buy, 1_000.0, None).unwrap();
        assert_eq!(first, second);
        assert_eq!(venue.get_positions().len(), 1);
        assert_eq!(venue.get_positions()[0].net_exposure_usd, 1_000.0);
    }

    #[test]
    fn missing_price_fails_closed() {
        let venue = PaperVenue::new("paper");
        let result = venue.place_order("order-2", "ETH-USD", Direction::Buy, 500.0, None);
        assert!(result.is_err());
    }

    #[test]
    fn buy_and_sell_net_against_each_other() {
        let venue = PaperVenue::new("paper");
        venue.place_order("order-3", "BTC-USD", Direction::Buy, 1_000.0, Some(60_000.0)).unwrap();
        venue.place_order("order-4", "BTC-USD", Direction::Sell, 400.0, Some(60_100.0)).unwrap();
        assert_eq!(venue.get_positions()[0].net_exposure_usd, 600.0);
    }

    #[test]
    fn cancel_only_affects_accepted_orders() {
        let venue = PaperVenue::new("paper");
        venue.place_order("order-5", "BTC-USD", Direction::Buy, 1_000.0, Some(60_000.0)).unwrap();
        assert!(!venue.cancel_order("order-5")); // already filled, not accepted
        assert!(!venue.cancel_order("unknown-order"));
    }

    #[test]
    fn broker_adapter_submit_connects_lazily_and_reports_fill_price() {
        let venue = PaperVenue::new("paper");
        let response = venue
            .submit_order(BrokerSubmitRequest {
                order_id: "order-6".to_string(),
                instrument: "BTC-USD".to_string(),
                side: Direction::Buy,
                size_usd: 2_000.0,
                order_type: "limit".to_string(),
                limit_price: Some(59_900.0),
                time_in_force: "day".to_string(),
            })
            .unwrap();
        assert_eq!(response.fill_price, 59_900.0);
        assert!(venue.is_connected());
    }

    #[test]
    fn health_check_reflects_connection_state() {
        let venue = PaperVenue::new("paper");
        assert_eq!(venue.health_check(), VenueStatus::Offline);
        venue.connect();
        assert_eq!(venue.health_check(), VenueStatus::Healthy);
    }
}
