//! The Capital-Allocation agent: decides how much capital each strategy
//! receives, never which direction to trade. Reacts to fills (performance
//! tracking, auto-quarantine) and to the Meta-Decision agent's regime
//! classification, and rebalances on a fixed interval.

mod reallocate;
mod types;

pub use types::{QuarantineThresholds, StrategyMetrics};

use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use gk_agent::Agent;
use gk_bus::Bus;
use gk_schemas::envelope::{AlertSeverity, ControlMsg, Message, Payload, Subject};
use gk_schemas::portfolio::{PortfolioAllocation, StrategyAllocation};
use tracing::{info, warn};

const REALLOCATION_INTERVAL: Duration = Duration::from_secs(60);

pub struct CapitalAllocationAgent {
    bus: Bus,
    total_capital_usd: f64,
    quarantine_thresholds: QuarantineThresholds,

    strategy_metrics: HashMap<String, StrategyMetrics>,
    quarantined: HashMap<String, String>,
    regime_multiplier: f64,

    current_allocation: PortfolioAllocation,
    last_reallocation: chrono::DateTime<Utc>,
}

impl CapitalAllocationAgent {
    pub fn new(bus: Bus, total_capital_usd: f64, now: chrono::DateTime<Utc>) -> Self {
        // Conservative initial allocation: half of target weight, half cash
        // reserve, until the first real reallocation runs.
        let initial = reallocate::reallocate(total_capital_usd, 0.5, &HashMap::new(), &HashMap::new(), &HashMap::new(), now);
        Self {
            bus,
            total_capital_usd,
            quarantine_thresholds: QuarantineThresholds::default(),
            strategy_metrics: HashMap::new(),
            quarantined: HashMap::new(),
            regime_multiplier: 0.5,
            current_allocation: initial,
            last_reallocation: now,
        }
    }

    pub fn current_allocation(&self) -> &PortfolioAllocation {
        &self.current_allocation
    }

    async fn process_fill(&mut self, fill: &gk_schemas::order::Fill) {
        let metrics = self.strategy_metrics.entry(fill.strategy.clone()).or_default();
        metrics.record_fill(fill.pnl, fill.slippage);

        let reasons = metrics.quarantine_reasons(&self.quarantine_thresholds);
        if !reasons.is_empty() && !self.quarantined.contains_key(&fill.strategy) {
            self.quarantine_strategy(fill.strategy.clone(), reasons.join(", ")).await;
        }
    }

    async fn quarantine_strategy(&mut self, strategy_id: String, reason: String) {
        self.quarantined.insert(strategy_id.clone(), reason.clone());
        warn!(strategy = %strategy_id, reason = %reason, "strategy quarantined");

        let alert = Message::new(
            "capital-allocation-agent",
            Subject::Alerts,
            Payload::Alert {
                severity: AlertSeverity::Warning,
                title: format!("Strategy Quarantined: {strategy_id}"),
                detail: reason,
            },
        );
        self.bus.publish(Subject::Alerts, alert).await;
    }

    fn reallocate_now(&mut self, now: chrono::DateTime<Utc>) {
        let allocation = reallocate::reallocate(
            self.total_capital_usd,
            self.regime_multiplier,
            &self.strategy_metrics,
            &self.quarantined,
            &self.current_allocation.allocations,
            now,
        );
        info!(
            deployed = allocation.deployed_capital_usd,
            cash_reserve_pct = allocation.cash_reserve_pct,
            regime_multiplier = allocation.regime_multiplier,
            "reallocated"
        );
        self.current_allocation = allocation;
    }

    async fn broadcast_allocation(&self) {
        let message = Message::new(
            "capital-allocation-agent",
            Subject::Control,
            Payload::Control(ControlMsg::CapitalAllocation(self.current_allocation.clone())),
        );
        self.bus.publish(Subject::Control, message).await;
    }
}

#[async_trait::async_trait]
impl Agent for CapitalAllocationAgent {
    async fn on_start(&mut self) -> anyhow::Result<()> {
        info!(total_capital_usd = self.total_capital_usd, "capital allocation agent starting");
        Ok(())
    }

    async fn on_pause(&mut self) -> anyhow::Result<()> {
        for alloc in self.current_allocation.allocations.values_mut() {
            alloc.weight = 0.0;
            alloc.risk_budget_usd = 0.0;
            alloc.exposure_cap_usd = 0.0;
        }
        self.broadcast_allocation().await;
        warn!("capital allocation agent paused, all allocations zeroed");
        Ok(())
    }

    async fn on_resume(&mut self) -> anyhow::Result<()> {
        self.reallocate_now(Utc::now());
        self.broadcast_allocation().await;
        info!("capital allocation agent resumed, reallocated");
        Ok(())
    }

    async fn handle_message(&mut self, message: Message) -> anyhow::Result<()> {
        match message.payload {
            Payload::Fill(fill) => self.process_fill(&fill).await,
            Payload::Control(ControlMsg::MetaDecision(decision)) => {
                self.regime_multiplier = types::regime_multiplier(decision.regime);
                info!(regime = ?decision.regime, multiplier = self.regime_multiplier, "regime update");
            }
            _ => {}
        }
        Ok(())
    }

    async fn cycle(&mut self) -> anyhow::Result<()> {
        let now = Utc::now();
        if (now - self.last_reallocation).to_std().unwrap_or_default() < REALLOCATION_INTERVAL {
            return Ok(());
        }
        self.last_reallocation = now;
        self.reallocate_now(now);
        self.broadcast_allocation().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gk_schemas::intent::Direction;

    fn fill(strategy: &str, pnl: f64, slippage: f64) -> gk_schemas::order::Fill {
        gk_schemas::order::Fill {
            order_id: uuid::Uuid::new_v4(),
            correlation_id: uuid::Uuid::new_v4(),
            instrument: "BTC-USD".into(),
            side: Direction::Buy,
            strategy: strategy.into(),
            size_usd: 1000.0,
            filled_price: 60_000.0,
            slippage,
            fee: 1.0,
            venue: "paper".into(),
            pnl,
            executed_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn repeated_losses_trigger_quarantine() {
        let bus = Bus::new();
        let mut agent = CapitalAllocationAgent::new(bus, 100_000.0, Utc::now());
        for _ in 0..5 {
            agent.process_fill(&fill("trend_following", -10.0, 0.0001)).await;
        }
        assert!(agent.quarantined.contains_key("trend_following"));
    }
}
