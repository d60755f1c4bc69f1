//! Broker Gateway — the SINGLE choke-point for all venue operations.
//!
//! # Invariant
//!
//! `OrderRouter` is `pub(crate)` and never re-exported from `lib.rs`. The
//! only public API that reaches a [`BrokerAdapter`] is `BrokerGateway`.
//!
//! Every call to `submit`/`cancel`/`replace` evaluates three gate verdicts in
//! order and refuses with [`GateRefusal`] if any fails:
//!
//! 1. `meta_armed`    — the latest Meta-Decision is not `Halted`
//! 2. `risk_allowed`  — the Risk agent already approved this intent
//! 3. `venue_healthy` — the target venue's health check is fresh and clean
//!
//! The execution agent evaluates each verdict before calling in; the gateway
//! is the final policy enforcer, not the source of truth for any of them.

use crate::order_router::{
    BrokerAdapter, BrokerCancelResponse, BrokerReplaceRequest, BrokerReplaceResponse,
    BrokerSubmitRequest, BrokerSubmitResponse, OrderRouter,
};
use crate::types::ExecutionIntent;
use gk_schemas::venue::VenueStatus;

/// Pre-evaluated gate verdicts the caller must supply before every venue op.
#[derive(Debug, Clone, Copy)]
pub struct GateVerdicts {
    pub meta_armed: bool,
    pub risk_allowed: bool,
    pub venue_healthy: bool,
}

impl GateVerdicts {
    /// All gates clear — convenience helper for paper/test mode.
    pub fn all_clear() -> Self {
        Self {
            meta_armed: true,
            risk_allowed: true,
            venue_healthy: true,
        }
    }
}

/// The reason a venue operation was refused at the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateRefusal {
    MetaHalted,
    RiskBlocked,
    VenueUnhealthy,
}

impl std::fmt::Display for GateRefusal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GateRefusal::MetaHalted => write!(f, "GATE_REFUSED: meta-decision has halted trading"),
            GateRefusal::RiskBlocked => write!(f, "GATE_REFUSED: risk engine did not approve"),
            GateRefusal::VenueUnhealthy => write!(f, "GATE_REFUSED: venue is not healthy"),
        }
    }
}

impl std::error::Error for GateRefusal {}

/// The SINGLE choke-point through which ALL venue operations must flow.
pub struct BrokerGateway<B: BrokerAdapter> {
    router: OrderRouter<B>,
}

impl<B: BrokerAdapter> BrokerGateway<B> {
    pub fn new(broker: B) -> Self {
        Self { router: OrderRouter::new(broker) }
    }

    fn enforce_gates(verdicts: &GateVerdicts) -> Result<(), GateRefusal> {
        if !verdicts.meta_armed {
            return Err(GateRefusal::MetaHalted);
        }
        if !verdicts.risk_allowed {
            return Err(GateRefusal::RiskBlocked);
        }
        if !verdicts.venue_healthy {
            return Err(GateRefusal::VenueUnhealthy);
        }
        Ok(())
    }

    pub fn submit(
        &self,
        intent: ExecutionIntent,
        verdicts: &GateVerdicts,
    ) -> Result<BrokerSubmitResponse, Box<dyn std::error::Error>> {
        Self::enforce_gates(verdicts)?;
        self.router.route_submit(intent)
    }

    pub fn cancel(
        &self,
        order_id: &str,
        verdicts: &GateVerdicts,
    ) -> Result<BrokerCancelResponse, Box<dyn std::error::Error>> {
        Self::enforce_gates(verdicts)?;
        self.router.route_cancel(order_id)
    }

    pub fn replace(
        &self,
        intent: ExecutionIntent,
        verdicts: &GateVerdicts,
    ) -> Result<BrokerReplaceResponse, Box<dyn std::error::Error>> {
        Self::enforce_gates(verdicts)?;
        self.router.route_replace(intent)
    }

    pub fn health_check(&self) -> VenueStatus {
        self.router.route_health_check()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gk_schemas::intent::Direction;
    use gk_schemas::venue::VenueStatus;

    struct AlwaysOkBroker;

    impl BrokerAdapter for AlwaysOkBroker {
        fn submit_order(
            &self,
            req: BrokerSubmitRequest,
        ) -> Result<BrokerSubmitResponse, Box<dyn std::error::Error>> {
            Ok(BrokerSubmitResponse {
                broker_order_id: format!("b-{}", req.order_id),
                fill_price: req.limit_price.unwrap_or(1.0),
                status: "ok".to_string(),
            })
        }

        fn cancel_order(&self, order_id: &str) -> Result<BrokerCancelResponse, Box<dyn std::error::Error>> {
            Ok(BrokerCancelResponse { broker_order_id: order_id.to_string(), status: "ok".to_string() })
        }

        fn replace_order(
            &self,
            req: BrokerReplaceRequest,
        ) -> Result<BrokerReplaceResponse, Box<dyn std::error::Error>> {
            Ok(BrokerReplaceResponse { broker_order_id: req.broker_order_id, status: "ok".to_string() })
        }

        fn health_check(&self) -> VenueStatus {
            VenueStatus::Healthy
        }
    }

    fn intent() -> ExecutionIntent {
        ExecutionIntent {
            order_id: "ord-1".to_string(),
            instrument: "BTC-USD".to_string(),
            side: Direction::Buy,
            size_usd: 1000.0,
            order_type: "market".to_string(),
            limit_price: None,
            time_in_force: "day".to_string(),
        }
    }

    #[test]
    fn all_clear_submit_succeeds() {
        let gw = BrokerGateway::new(AlwaysOkBroker);
        assert!(gw.submit(intent(), &GateVerdicts::all_clear()).is_ok());
    }

    #[test]
    fn meta_halted_blocks_submit() {
        let gw = BrokerGateway::new(AlwaysOkBroker);
        let verdicts = GateVerdicts { meta_armed: false, risk_allowed: true, venue_healthy: true };
        let err = gw.submit(intent(), &verdicts).unwrap_err();
        assert!(err.to_string().contains("halted"));
    }

    #[test]
    fn risk_blocked_blocks_submit() {
        let gw = BrokerGateway::new(AlwaysOkBroker);
        let verdicts = GateVerdicts { meta_armed: true, risk_allowed: false, venue_healthy: true };
        let err = gw.submit(intent(), &verdicts).unwrap_err();
        assert!(err.to_string().contains("risk engine"));
    }

    #[test]
    fn unhealthy_venue_blocks_submit() {
        let gw = BrokerGateway::new(AlwaysOkBroker);
        let verdicts = GateVerdicts { meta_armed: true, risk_allowed: true, venue_healthy: false };
        let err = gw.submit(intent(), &verdicts).unwrap_err();
        assert!(err.to_string().contains("venue"));
    }

    #[test]
    fn meta_checked_before_risk_and_venue() {
        let gw = BrokerGateway::new(AlwaysOkBroker);
        let verdicts = GateVerdicts { meta_armed: false, risk_allowed: false, venue_healthy: false };
        let err = gw.submit(intent(), &verdicts).unwrap_err();
        assert_eq!(err.to_string(), GateRefusal::MetaHalted.to_string());
    }

    #[test]
    fn all_clear_cancel_succeeds() {
        let gw = BrokerGateway::new(AlwaysOkBroker);
        assert!(gw.cancel("ord-1", &GateVerdicts::all_clear()).is_ok());
    }

    #[test]
    fn all_clear_replace_succeeds() {
        let gw = BrokerGateway::new(AlwaysOkBroker);
        let mut i = intent();
        i.size_usd = 2000.0;
        assert!(gw.replace(i, &GateVerdicts::all_clear()).is_ok());
    }
}
