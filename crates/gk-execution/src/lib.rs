//! The Execution agent: the only component that ever creates an [`Order`] or
//! reports a [`Fill`]. Turns an already-approved [`TradeIntent`] into a venue
//! submission, tracks it through the OMS state machine, and reports the
//! outcome back onto the bus.

mod gateway;
mod id_map;
mod order_router;
mod oms;
mod types;
mod venue_health;

pub use gateway::{BrokerGateway, GateRefusal, GateVerdicts};
pub use id_map::BrokerOrderMap;
pub use oms::state_machine::{OmsEvent, OmsOrder, OrderState, TransitionError};
pub use order_router::{
    BrokerAdapter, BrokerCancelResponse, BrokerReplaceRequest, BrokerReplaceResponse, BrokerSubmitRequest,
    BrokerSubmitResponse, OrderRouter,
};
pub use types::ExecutionIntent;
pub use venue_health::{VenueHealthGate, VenueHealthGuard};

use std::collections::HashMap;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use gk_agent::Agent;
use gk_bus::Bus;
use gk_schemas::envelope::{AlertSeverity, ControlMsg, Message, Payload, Subject};
use gk_schemas::intent::{Direction, TradeIntent};
use gk_schemas::meta::MetaDecision;
use gk_schemas::order::{Fill, Order, OrderStatus};
use gk_schemas::venue::VenueStatus;
use tracing::{info, warn};
use uuid::Uuid;

const VENUE_HEALTH_FRESHNESS: i64 = 30;
const HEALTH_POLL_INTERVAL: StdDuration = StdDuration::from_secs(5);
const TAKER_FEE_BPS: f64 = 5.0;

pub struct ExecutionAgent<B: BrokerAdapter> {
    bus: Bus,
    gateway: BrokerGateway<B>,
    venue_name: String,
    venue_health: VenueHealthGuard,
    last_health_poll: DateTime<Utc>,
    order_map: BrokerOrderMap,
    latest_meta: Option<MetaDecision>,
    paused: bool,
}

impl<B: BrokerAdapter> ExecutionAgent<B> {
    pub fn new(bus: Bus, broker: B, venue_name: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            bus,
            gateway: BrokerGateway::new(broker),
            venue_name: venue_name.into(),
            venue_health: VenueHealthGuard::new(Duration::seconds(VENUE_HEALTH_FRESHNESS)),
            last_health_poll: now - Duration::seconds(VENUE_HEALTH_FRESHNESS + 1),
            order_map: BrokerOrderMap::new(),
            latest_meta: None,
            paused: false,
        }
    }

    fn meta_armed(&self) -> bool {
        match &self.latest_meta {
            None => false,
            Some(decision) => {
                !matches!(decision.global_state, gk_schemas::meta::GlobalTradingState::Halted)
            }
        }
    }

    async fn execute_intent(
        &mut self,
        intent: TradeIntent,
        adjusted_exposure_usd: f64,
        correlation_id: Uuid,
        now: DateTime<Utc>,
    ) {
        if self.paused {
            warn!(instrument = %intent.instrument, "execution agent paused, dropping approved intent");
            return;
        }

        let order = Order {
            id: Uuid::new_v4(),
            correlation_id,
            instrument: intent.instrument.clone(),
            side: intent.direction,
            strategy: intent.strategy.clone(),
            size_usd: adjusted_exposure_usd,
            limit_price: intent.entry_price,
            stop_loss: intent.entry_price * (1.0 - intent.stop_loss_pct),
            take_profit: intent.entry_price * (1.0 + intent.take_profit_pct),
            status: OrderStatus::Pending,
            venue: Some(self.venue_name.clone()),
            created_at: now,
        };

        let verdicts = GateVerdicts {
            meta_armed: self.meta_armed(),
            risk_allowed: true,
            venue_healthy: self.venue_health.is_healthy(now),
        };

        let exec_intent = ExecutionIntent::from_order(&order);
        let total_qty = ((order.size_usd * 100.0).round() as i64).max(1);
        let mut oms_order = OmsOrder::new(order.id.to_string(), order.instrument.clone(), total_qty);

        let submit_result = self.gateway.submit(exec_intent, &verdicts).map_err(|err| err.to_string());
        match submit_result {
            Ok(response) => {
                self.order_map.register(order.id.to_string(), response.broker_order_id.clone());
                if let Err(err) = oms_order.apply(&OmsEvent::Fill { delta_qty: total_qty }, None) {
                    warn!(order_id = %order.id, error = %err, "illegal OMS transition on fill");
                }
                // Paper venue fills synchronously and fully: the order reaches
                // a terminal state in the same call, so the mapping is
                // deregistered immediately rather than held for a later event.
                self.order_map.deregister(&order.id.to_string());

                let mut filled_order = order.clone();
                filled_order.status = OrderStatus::Filled;
                self.publish(Subject::Execution, "execution-agent", Payload::Order(filled_order)).await;

                let fill = self.build_fill(&order, &intent, response.fill_price, now);
                info!(instrument = %order.instrument, filled_price = fill.filled_price, "order filled");
                self.publish_correlated(Subject::Fills, Payload::Fill(fill), correlation_id).await;
            }
            Err(err_detail) => {
                let mut failed_order = order.clone();
                failed_order.status = OrderStatus::Failed;
                self.publish(Subject::Execution, "execution-agent", Payload::Order(failed_order)).await;

                warn!(instrument = %order.instrument, error = %err_detail, "order submission refused");
                self.publish(
                    Subject::Alerts,
                    "execution-agent",
                    Payload::Alert {
                        severity: AlertSeverity::Warning,
                        title: format!("Order Refused: {}", order.instrument),
                        detail: err_detail,
                    },
                )
                .await;
            }
        }
    }

    fn build_fill(&self, order: &Order, intent: &TradeIntent, fill_price: f64, now: DateTime<Utc>) -> Fill {
        let slippage = (fill_price - intent.entry_price).abs() / intent.entry_price.max(1e-9);
        let fee = order.size_usd * TAKER_FEE_BPS / 10_000.0;
        let direction_sign = match intent.direction {
            Direction::Buy => 1.0,
            Direction::Sell => -1.0,
        };
        let pnl = if intent.is_closing {
            (fill_price - intent.entry_price) / intent.entry_price.max(1e-9) * order.size_usd * direction_sign
        } else {
            0.0
        };

        Fill {
            order_id: order.id,
            correlation_id: order.correlation_id,
            instrument: order.instrument.clone(),
            side: order.side,
            strategy: order.strategy.clone(),
            size_usd: order.size_usd,
            filled_price: fill_price,
            slippage,
            fee,
            venue: self.venue_name.clone(),
            pnl,
            executed_at: now,
        }
    }

    async fn poll_venue_health(&mut self, now: DateTime<Utc>) {
        if (now - self.last_health_poll).to_std().unwrap_or_default() < HEALTH_POLL_INTERVAL {
            return;
        }
        self.last_health_poll = now;
        let status = self.gateway_health_check();
        self.venue_health.record_health_check(status, now);
        if status != VenueStatus::Healthy {
            warn!(venue = %self.venue_name, status = ?status, "venue health degraded");
        }
    }

    fn gateway_health_check(&self) -> VenueStatus {
        // Routed through the same broker the gateway wraps; a lightweight
        // escape hatch rather than a fourth gate, since health polling has
        // no order-specific gate verdicts to enforce.
        self.gateway.health_check()
    }

    async fn publish(&self, subject: Subject, source: &str, payload: Payload) {
        let message = Message::new(source, subject, payload);
        self.bus.publish(subject, message).await;
    }

    async fn publish_correlated(&self, subject: Subject, payload: Payload, correlation_id: Uuid) {
        let message = Message::with_correlation("execution-agent", subject, payload, correlation_id);
        self.bus.publish(subject, message).await;
    }
}

#[async_trait::async_trait]
impl<B: BrokerAdapter + Send + Sync> Agent for ExecutionAgent<B> {
    async fn on_start(&mut self) -> anyhow::Result<()> {
        info!(venue = %self.venue_name, "execution agent starting");
        Ok(())
    }

    async fn on_pause(&mut self) -> anyhow::Result<()> {
        self.paused = true;
        warn!("execution agent paused, no orders will be submitted");
        Ok(())
    }

    async fn on_resume(&mut self) -> anyhow::Result<()> {
        self.paused = false;
        info!("execution agent resumed");
        Ok(())
    }

    async fn handle_message(&mut self, message: Message) -> anyhow::Result<()> {
        match message.payload {
            Payload::RiskApproved { intent, adjusted_exposure_usd, .. } => {
                self.execute_intent(intent, adjusted_exposure_usd, message.correlation_id, Utc::now()).await;
            }
            Payload::Control(ControlMsg::MetaDecision(decision)) => {
                self.latest_meta = Some(decision);
            }
            _ => {}
        }
        Ok(())
    }

    async fn cycle(&mut self) -> anyhow::Result<()> {
        self.poll_venue_health(Utc::now()).await;
        Ok(())
    }
}
