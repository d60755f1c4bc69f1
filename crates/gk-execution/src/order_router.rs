//! Order Router: deterministic execution boundary between the execution
//! agent and venue adapters.
//!
//! # Purpose
//! This module defines the thin, immutable boundary through which every
//! order dispatch must pass. It isolates the agent's own bookkeeping (OMS
//! state, venue selection, fill reporting) from venue-specific wire formats.
//!
//! # Why This Boundary Exists
//! - Enforces separation of concerns between order generation (strategy/risk/
//!   allocation) and order delivery (venue)
//! - Provides a single choke-point for logging and pre-flight validation
//! - Enables pluggable venue adapters (paper, live) without touching the
//!   execution agent itself
//!
//! # Why It Must Remain Thin
//! - Preserves deterministic, replayable behavior
//! - Avoids embedding risk or allocation logic that belongs upstream
//! - Keeps the routing layer easy to audit

use gk_schemas::intent::Direction;
use gk_schemas::venue::VenueStatus;

use crate::types::ExecutionIntent;

/// Convenience alias so all public items in this module can use `Result<T>`
/// without spelling out the error type everywhere.
type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// Venue-agnostic order submission request.
#[derive(Debug, Clone)]
pub struct BrokerSubmitRequest {
    /// Internal order identifier
    pub order_id: String,
    /// Instrument identifier
    pub instrument: String,
    /// Trade direction
    pub side: Direction,
    /// Notional size in USD
    pub size_usd: f64,
    /// Order type (market, limit, etc.) - simplified for boundary
    pub order_type: String,
    /// Limit price (if applicable)
    pub limit_price: Option<f64>,
    /// Time in force
    pub time_in_force: String,
}

/// Venue-agnostic order submission response.
#[derive(Debug, Clone)]
pub struct BrokerSubmitResponse {
    /// Venue-assigned order identifier
    pub broker_order_id: String,
    /// Fill price the venue reports
    pub fill_price: f64,
    /// Status of the submission
    pub status: String,
}

/// Venue-agnostic order cancellation response.
#[derive(Debug, Clone)]
pub struct BrokerCancelResponse {
    pub broker_order_id: String,
    pub status: String,
}

/// Venue-agnostic order replacement request.
#[derive(Debug, Clone)]
pub struct BrokerReplaceRequest {
    pub broker_order_id: String,
    pub size_usd: f64,
    pub limit_price: Option<f64>,
    pub time_in_force: String,
}

/// Venue-agnostic order replacement response.
#[derive(Debug, Clone)]
pub struct BrokerReplaceResponse {
    pub broker_order_id: String,
    pub status: String,
}

/// Implemented by every venue adapter (paper, live).
///
/// Deliberately synchronous: venue adapters in this system never perform
/// their own network I/O inside these calls — paper settles in-process,
/// and a live adapter would hand the request to its own connection task and
/// block only on the reply channel.
pub trait BrokerAdapter {
    fn submit_order(&self, req: BrokerSubmitRequest) -> Result<BrokerSubmitResponse>;
    fn cancel_order(&self, order_id: &str) -> Result<BrokerCancelResponse>;
    fn replace_order(&self, req: BrokerReplaceRequest) -> Result<BrokerReplaceResponse>;
    /// Polled once per execution cycle to feed the venue-health gate.
    fn health_check(&self) -> VenueStatus;
}

/// Deterministic order router that delegates to a venue adapter.
///
/// Performs minimal, deterministic transformations and delegates all
/// venue-specific communication to the injected `BrokerAdapter`.
pub struct OrderRouter<B: BrokerAdapter> {
    broker: B,
}

impl<B: BrokerAdapter> OrderRouter<B> {
    pub fn new(broker: B) -> Self {
        Self { broker }
    }

    pub fn route_submit(&self, intent: ExecutionIntent) -> Result<BrokerSubmitResponse> {
        let req = BrokerSubmitRequest {
            order_id: intent.order_id,
            instrument: intent.instrument,
            side: intent.side,
            size_usd: intent.size_usd,
            order_type: intent.order_type,
            limit_price: intent.limit_price,
            time_in_force: intent.time_in_force,
        };
        self.broker.submit_order(req)
    }

    pub fn route_cancel(&self, order_id: &str) -> Result<BrokerCancelResponse> {
        self.broker.cancel_order(order_id)
    }

    pub fn route_replace(&self, intent: ExecutionIntent) -> Result<BrokerReplaceResponse> {
        let req = BrokerReplaceRequest {
            broker_order_id: intent.order_id, // internal ID doubles as client_order_id
            size_usd: intent.size_usd,
            limit_price: intent.limit_price,
            time_in_force: intent.time_in_force,
        };
        self.broker.replace_order(req)
    }

    /// Not gated — a health poll carries no order-specific gate verdicts.
    pub fn route_health_check(&self) -> VenueStatus {
        self.broker.health_check()
    }
}
