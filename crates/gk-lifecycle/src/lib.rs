//! The Strategy Lifecycle Manager: tracks each strategy's
//! `PAPER_ONLY -> ACTIVE -> QUARANTINED -> DISABLED` state, derives its
//! inputs from the fill stream, and applies automatic transitions on a
//! timer. Manual overrides (`manually_disable`/`manually_enable`/
//! `promote_to_active`) are exposed for the operator CLI; nothing in this
//! crate reaches them on its own.

mod engine;
mod types;

pub use engine::{evaluate_transitions, execute_transition, manually_disable, manually_enable, promote_to_active};
pub use types::{LifecycleThresholds, StrategyMetricsTracker};

use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use gk_agent::Agent;
use gk_bus::Bus;
use gk_schemas::envelope::{AlertSeverity, Message, Payload, Subject};
use gk_schemas::strategy::{StrategyLifecycle, StrategyLifecycleState};
use tracing::{info, warn};

const EVALUATION_INTERVAL: Duration = Duration::from_secs(30);

pub struct LifecycleAgent {
    bus: Bus,
    thresholds: LifecycleThresholds,
    lifecycles: HashMap<String, StrategyLifecycle>,
    metrics: HashMap<String, StrategyMetricsTracker>,
    last_evaluation: chrono::DateTime<Utc>,
}

impl LifecycleAgent {
    pub fn new(bus: Bus, now: chrono::DateTime<Utc>) -> Self {
        Self {
            bus,
            thresholds: LifecycleThresholds::default(),
            lifecycles: HashMap::new(),
            metrics: HashMap::new(),
            last_evaluation: now,
        }
    }

    pub fn lifecycle(&self, strategy_id: &str) -> Option<&StrategyLifecycle> {
        self.lifecycles.get(strategy_id)
    }

    pub fn can_trade(&self, strategy_id: &str, is_paper_mode: bool) -> bool {
        self.lifecycles.get(strategy_id).is_some_and(|l| l.can_trade(is_paper_mode))
    }

    fn lifecycle_mut(&mut self, strategy_id: &str, now: chrono::DateTime<Utc>) -> &mut StrategyLifecycle {
        self.lifecycles.entry(strategy_id.to_string()).or_insert_with(|| StrategyLifecycle::new(strategy_id, now))
    }

    fn process_fill(&mut self, fill: &gk_schemas::order::Fill, now: chrono::DateTime<Utc>) {
        let tracker = self.metrics.entry(fill.strategy.clone()).or_default();
        tracker.record_fill(fill.pnl, fill.slippage);
        let edge_decay_pct = tracker.edge_decay_pct();
        let performance_vs_expectation = tracker.performance_vs_expectation();
        let current_drawdown_pct = tracker.current_drawdown_pct();
        let execution_quality = tracker.execution_quality();

        let lifecycle = self.lifecycle_mut(&fill.strategy, now);
        lifecycle.edge_decay_pct = edge_decay_pct;
        lifecycle.performance_vs_expectation = performance_vs_expectation;
        lifecycle.current_drawdown_pct = current_drawdown_pct;
        lifecycle.execution_quality = execution_quality;
    }

    async fn evaluate_all(&mut self, now: chrono::DateTime<Utc>) {
        let due: Vec<(String, gk_schemas::strategy::StrategyStateTransition)> = self
            .lifecycles
            .iter()
            .filter_map(|(id, lifecycle)| {
                evaluate_transitions(lifecycle, &self.thresholds, now).map(|t| (id.clone(), t))
            })
            .collect();

        for (strategy_id, transition) in due {
            let Some(lifecycle) = self.lifecycles.get_mut(&strategy_id) else { continue };
            let to_state = transition.to_state;
            let reason = transition.reason.clone();
            execute_transition(lifecycle, transition, &self.thresholds);
            self.announce(&strategy_id, to_state, &reason).await;
        }
    }

    async fn announce(&self, strategy_id: &str, to_state: StrategyLifecycleState, reason: &str) {
        let severity = match to_state {
            StrategyLifecycleState::Disabled => AlertSeverity::Critical,
            StrategyLifecycleState::Quarantined => AlertSeverity::Warning,
            _ => AlertSeverity::Info,
        };
        info!(strategy = strategy_id, to_state = ?to_state, reason, "lifecycle transition");
        let alert = Message::new(
            "lifecycle-manager",
            Subject::Alerts,
            Payload::Alert {
                severity,
                title: format!("Strategy {strategy_id} -> {to_state:?}"),
                detail: reason.to_string(),
            },
        );
        self.bus.publish(Subject::Alerts, alert).await;
    }
}

#[async_trait::async_trait]
impl Agent for LifecycleAgent {
    async fn on_start(&mut self) -> anyhow::Result<()> {
        info!("lifecycle manager starting");
        Ok(())
    }

    async fn handle_message(&mut self, message: Message) -> anyhow::Result<()> {
        if let Payload::Fill(fill) = message.payload {
            self.process_fill(&fill, Utc::now());
        }
        Ok(())
    }

    async fn cycle(&mut self) -> anyhow::Result<()> {
        let now = Utc::now();
        if (now - self.last_evaluation).to_std().unwrap_or_default() < EVALUATION_INTERVAL {
            return Ok(());
        }
        self.last_evaluation = now;
        self.evaluate_all(now).await;
        Ok(())
    }

    async fn on_pause(&mut self) -> anyhow::Result<()> {
        warn!("lifecycle manager paused: automatic transitions suspended");
        Ok(())
    }

    async fn on_resume(&mut self) -> anyhow::Result<()> {
        info!("lifecycle manager resumed");
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
            size_usd: 1_000.0,
            filled_price: 60_000.0,
            slippage,
            fee: 1.0,
            venue: "paper".into(),
            pnl,
            executed_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn unregistered_strategy_cannot_trade() {
        let agent = LifecycleAgent::new(Bus::new(), Utc::now());
        assert!(!agent.can_trade("trend_following", true));
    }

    #[tokio::test]
    async fn first_fill_registers_strategy_as_paper_only() {
        let mut agent = LifecycleAgent::new(Bus::new(), Utc::now());
        let message = Message::new("execution-agent", Subject::Fills, Payload::Fill(fill("trend_following", 10.0, 0.0)));
        agent.handle_message(message).await.unwrap();
        let lifecycle = agent.lifecycle("trend_following").unwrap();
        assert_eq!(lifecycle.current_state, StrategyLifecycleState::PaperOnly);
        assert!(agent.can_trade("trend_following", true));
        assert!(!agent.can_trade("trend_following", false));
    }

    #[tokio::test]
    async fn active_strategy_quarantines_on_heavy_drawdown() {
        let mut agent = LifecycleAgent::new(Bus::new(), Utc::now());
        let mut sub = agent.bus.subscribe(Subject::Alerts);
        agent.lifecycle_mut("trend_following", Utc::now()).current_state = StrategyLifecycleState::Active;
        agent.process_fill(&fill("trend_following", 100.0, 0.0), Utc::now());
        agent.process_fill(&fill("trend_following", -90.0, 0.0), Utc::now());

        agent.evaluate_all(Utc::now()).await;

        assert_eq!(agent.lifecycle("trend_following").unwrap().current_state, StrategyLifecycleState::Quarantined);
        use futures_util::StreamExt;
        let alert = tokio::time::timeout(std::time::Duration::from_millis(100), sub.next()).await.unwrap().unwrap();
        match alert.payload {
            Payload::Alert { severity, .. } => assert_eq!(severity, AlertSeverity::Warning),
            other => panic!("unexpected payload: {other:?}"),
        }
    }
}
