//! The Risk agent: pre-trade validation of every [`TradeIntent`] against
//! portfolio limits, gated behind the latest [`MetaDecision`].
//!
//! Consults `control` for the most recent Meta-Decision veto before
//! running its own ordered limit checks, so a stale or absent decision
//! always fails an intent rather than silently approving it.

mod engine;
mod types;

pub use types::{Position, RiskLimits, RiskState};

use chrono::Utc;
use gk_agent::Agent;
use gk_bus::Bus;
use gk_schemas::envelope::{AlertSeverity, ControlMsg, Message, Payload, Subject};
use gk_schemas::meta::MetaDecision;
use gk_schemas::risk::RiskAction;
use tracing::{info, warn};

pub struct RiskAgent {
    bus: Bus,
    limits: RiskLimits,
    state: RiskState,
    latest_meta: Option<MetaDecision>,
}

impl RiskAgent {
    pub fn new(bus: Bus, limits: RiskLimits) -> Self {
        Self {
            bus,
            limits,
            state: RiskState::default(),
            latest_meta: None,
        }
    }

    async fn trigger_kill_switch(&mut self, reason: &str) {
        self.state.kill_switch_triggered = true;
        warn!(reason, "kill switch triggered");

        let pause = Message::new(
            "risk-agent",
            Subject::Control,
            Payload::Control(ControlMsg::Pause {
                reason: Some(format!("kill switch: {reason}")),
            }),
        );
        self.bus.publish(Subject::Control, pause).await;

        let alert = Message::new(
            "risk-agent",
            Subject::Alerts,
            Payload::Alert {
                severity: AlertSeverity::Critical,
                title: "Kill Switch Activated".into(),
                detail: reason.to_string(),
            },
        );
        self.bus.publish(Subject::Alerts, alert).await;
    }
}

#[async_trait::async_trait]
impl Agent for RiskAgent {
    async fn on_start(&mut self) -> anyhow::Result<()> {
        info!(
            max_single_trade_usd = self.limits.max_single_trade_usd,
            max_portfolio_exposure_usd = self.limits.max_portfolio_exposure_usd,
            "risk agent starting"
        );
        Ok(())
    }

    async fn on_pause(&mut self) -> anyhow::Result<()> {
        self.state.paused = true;
        warn!("risk agent paused, no approvals will be granted");
        Ok(())
    }

    async fn on_resume(&mut self) -> anyhow::Result<()> {
        self.state.paused = false;
        info!("risk agent resumed");
        Ok(())
    }

    async fn handle_message(&mut self, message: Message) -> anyhow::Result<()> {
        match message.payload {
            Payload::TradeIntent(intent) => {
                let now = Utc::now();
                let decision = engine::evaluate(&self.limits, &self.state, &intent, self.latest_meta.as_ref(), now);

                match decision.action {
                    RiskAction::Approve => {
                        info!(instrument = %intent.instrument, adjusted = decision.adjusted_exposure_usd, "approved");
                        let approved = Message::with_correlation(
                            "risk-agent",
                            Subject::RiskApproved,
                            Payload::RiskApproved {
                                adjusted_exposure_usd: decision.adjusted_exposure_usd,
                                risk_score: decision.risk_score,
                                intent,
                            },
                            message.correlation_id,
                        );
                        self.bus.publish(Subject::RiskApproved, approved).await;
                    }
                    RiskAction::Reject => {
                        warn!(instrument = %intent.instrument, reasons = ?decision.reasons, "rejected");
                        let rejected = Message::with_correlation(
                            "risk-agent",
                            Subject::RiskRejected,
                            Payload::RiskRejected {
                                reasons: decision.reasons,
                                intent,
                            },
                            message.correlation_id,
                        );
                        self.bus.publish(Subject::RiskRejected, rejected).await;
                    }
                }

                if engine::should_trip_kill_switch(&self.limits, &self.state) {
                    self.trigger_kill_switch("daily loss limit exceeded").await;
                }
            }
            Payload::Fill(fill) => self.state.apply_fill(&fill),
            Payload::Control(ControlMsg::MetaDecision(decision)) => {
                self.latest_meta = Some(decision);
            }
            Payload::Control(ControlMsg::KillSwitchReset) => {
                self.state.kill_switch_triggered = false;
                warn!("kill switch reset");
            }
            _ => {}
        }
        Ok(())
    }

    async fn cycle(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}
