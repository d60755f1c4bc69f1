//! The Meta-Decision agent: the supreme authority for trading permissions.
//!
//! It does not trade and does not predict prices. It decides whether
//! trading is allowed at all, and at what intensity, by aggregating
//! volatility, liquidity, execution quality, correlation, and system
//! stress signals into one binding [`MetaDecision`] broadcast on
//! `control`. Every other agent is gated on the most recent decision.

mod decision;
mod thresholds;

pub use thresholds::Thresholds;

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use gk_agent::Agent;
use gk_bus::Bus;
use gk_schemas::envelope::{AlertSeverity, ControlMsg, Message, Payload, Subject};
use gk_schemas::meta::MetaDecision;
use tracing::{info, warn};

const DECISION_INTERVAL: Duration = Duration::from_secs(5);

/// Agents that must be reporting heartbeats for trading to proceed at all.
const CRITICAL_AGENTS: [&str; 2] = ["risk-agent", "execution-agent"];

pub(crate) struct LiquidityObservation {
    pub spread: f64,
    pub depth: f64,
}

#[derive(Default)]
pub(crate) struct ExecutionQuality {
    pub fills: u64,
    pub total_slippage: f64,
}

impl ExecutionQuality {
    pub fn avg_slippage(&self) -> f64 {
        if self.fills == 0 {
            0.0
        } else {
            self.total_slippage / self.fills as f64
        }
    }
}

#[derive(Default)]
pub(crate) struct SystemStress {
    pub critical_alerts: u32,
    pub warning_alerts: u32,
}

pub struct MetaDecisionAgent {
    bus: Bus,
    registered_strategies: Vec<String>,
    thresholds: Thresholds,

    volatility_data: HashMap<String, f64>,
    liquidity_data: HashMap<String, LiquidityObservation>,
    execution_quality: HashMap<String, ExecutionQuality>,
    correlation_matrix: HashMap<(String, String), f64>,
    system_stress: SystemStress,
    agent_last_seen: HashMap<String, DateTime<Utc>>,

    current_decision: MetaDecision,
    last_decision_time: DateTime<Utc>,
}

impl MetaDecisionAgent {
    pub fn new(bus: Bus, registered_strategies: Vec<String>, now: DateTime<Utc>) -> Self {
        Self {
            bus,
            registered_strategies,
            thresholds: Thresholds::default(),
            volatility_data: HashMap::new(),
            liquidity_data: HashMap::new(),
            execution_quality: HashMap::new(),
            correlation_matrix: HashMap::new(),
            system_stress: SystemStress::default(),
            agent_last_seen: HashMap::new(),
            current_decision: decision::initializing_decision(now),
            last_decision_time: now,
        }
    }

    pub fn current_decision(&self) -> &MetaDecision {
        &self.current_decision
    }

    fn process_market_data(&mut self, snapshot: &gk_schemas::intent::MarketSnapshot) {
        if snapshot.price > 0.0 {
            let volatility = (snapshot.price_change_1m / snapshot.price).abs();
            self.volatility_data
                .insert(snapshot.instrument.clone(), volatility);
        }
        self.liquidity_data.insert(
            snapshot.instrument.clone(),
            LiquidityObservation {
                spread: snapshot.spread,
                depth: snapshot.depth,
            },
        );
    }

    fn process_heartbeat(&mut self, agent_id: &str, now: DateTime<Utc>) {
        self.agent_last_seen.insert(agent_id.to_string(), now);
    }

    fn process_fill(&mut self, fill: &gk_schemas::order::Fill) {
        let eq = self.execution_quality.entry(fill.strategy.clone()).or_default();
        eq.fills += 1;
        eq.total_slippage += fill.slippage.abs();
    }

    fn process_alert(&mut self, severity: AlertSeverity) {
        match severity {
            AlertSeverity::Critical => self.system_stress.critical_alerts += 1,
            AlertSeverity::Warning => self.system_stress.warning_alerts += 1,
            AlertSeverity::Info => {}
        }
    }

    fn agent_missing(&self, agent_id: &str, now: DateTime<Utc>) -> bool {
        match self.agent_last_seen.get(agent_id) {
            None => true,
            Some(last_seen) => (now - *last_seen) > chrono::Duration::seconds(30),
        }
    }

    async fn broadcast_decision(&self, decision: &MetaDecision) {
        let message = Message::new(
            "meta-decision-agent",
            Subject::Control,
            Payload::Control(ControlMsg::MetaDecision(decision.clone())),
        );
        self.bus.publish(Subject::Control, message).await;
        info!(
            state = ?decision.global_state,
            regime = ?decision.regime,
            confidence = decision.confidence,
            reasons = ?decision.reason_codes,
            "meta decision broadcast"
        );
    }

    async fn fail_safe(&mut self, reason: &str, details: &str, now: DateTime<Utc>) {
        let decision = decision::fail_safe_decision(&self.registered_strategies, reason, now);
        self.current_decision = decision.clone();
        self.broadcast_decision(&decision).await;

        let alert = Message::new(
            "meta-decision-agent",
            Subject::Alerts,
            Payload::Alert {
                severity: AlertSeverity::Critical,
                title: format!("Meta-Decision Fail Safe: {reason}"),
                detail: details.to_string(),
            },
        );
        self.bus.publish(Subject::Alerts, alert).await;
        warn!(reason, details, "meta-decision fail safe activated");
    }
}

#[async_trait::async_trait]
impl Agent for MetaDecisionAgent {
    async fn on_start(&mut self) -> anyhow::Result<()> {
        warn!("meta-decision agent starting in HALTED state until data is collected");
        Ok(())
    }

    async fn on_pause(&mut self) -> anyhow::Result<()> {
        self.fail_safe("agent_paused", "meta-decision agent was paused", Utc::now())
            .await;
        Ok(())
    }

    async fn on_resume(&mut self) -> anyhow::Result<()> {
        info!("meta-decision agent resumed, will evaluate on next cycle");
        Ok(())
    }

    async fn handle_message(&mut self, message: Message) -> anyhow::Result<()> {
        let now = message.timestamp;
        match message.payload {
            Payload::MarketSnapshot(snapshot) => self.process_market_data(&snapshot),
            Payload::Heartbeat { agent_id, .. } => self.process_heartbeat(&agent_id, now),
            Payload::Fill(fill) => self.process_fill(&fill),
            Payload::Alert { severity, .. } => self.process_alert(severity),
            _ => {}
        }
        Ok(())
    }

    async fn cycle(&mut self) -> anyhow::Result<()> {
        let now = Utc::now();
        if (now - self.last_decision_time).to_std().unwrap_or_default() < DECISION_INTERVAL {
            return Ok(());
        }
        self.last_decision_time = now;

        let decision = decision::make_decision(
            &self.registered_strategies,
            &self.thresholds,
            &self.volatility_data,
            &self.liquidity_data,
            &self.execution_quality,
            &self.correlation_matrix,
            &self.system_stress,
            |agent_id| self.agent_missing(agent_id, now),
            now,
        );

        if decision.global_state != self.current_decision.global_state {
            warn!(
                from = ?self.current_decision.global_state,
                to = ?decision.global_state,
                "global trading state changed"
            );
        }

        self.current_decision = decision.clone();
        self.broadcast_decision(&decision).await;
        Ok(())
    }
}
