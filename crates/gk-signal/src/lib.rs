//! The Signal agent: turns market snapshots into candidate `TradeIntent`s.
//!
//! Runs every registered strategy against the latest snapshot for each
//! instrument it has seen, suppresses repeat signals in the same direction
//! (so a strategy that keeps re-triggering the same call doesn't spam
//! `risk_check`), and holds its very first publish until both Meta-Decision
//! and Risk have shown signs of life.

mod host;
mod strategies;
mod types;

pub use host::{SignalEvaluation, SignalHost, SignalHostError};
pub use strategies::{FundingArbitrage, MeanReversion, Strategy, TrendFollowing};
pub use types::{FundingArbitrageParams, MeanReversionParams, ReadinessGate, ShadowMode, TrendFollowingParams};

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use gk_agent::Agent;
use gk_bus::Bus;
use gk_schemas::envelope::{Message, Payload, Subject};
use gk_schemas::intent::{Direction, MarketSnapshot};
use tracing::{debug, info};

pub struct SignalAgent {
    agent_id: String,
    bus: Bus,
    host: SignalHost,
    readiness: Arc<ReadinessGate>,
    market_cache: HashMap<String, MarketSnapshot>,
    active_signals: HashMap<(String, String), Direction>,
    paused: bool,
}

impl SignalAgent {
    pub fn new(agent_id: impl Into<String>, bus: Bus, host: SignalHost, readiness: Arc<ReadinessGate>) -> Self {
        Self {
            agent_id: agent_id.into(),
            bus,
            host,
            readiness,
            market_cache: HashMap::new(),
            active_signals: HashMap::new(),
            paused: false,
        }
    }

    /// Convenience constructor wiring up the three built-in strategies.
    pub fn with_builtin_strategies(agent_id: impl Into<String>, bus: Bus, readiness: Arc<ReadinessGate>) -> Self {
        let mut host = SignalHost::new(ShadowMode::Off);
        host.register(Box::new(TrendFollowing { params: TrendFollowingParams::default() })).expect("unique name");
        host.register(Box::new(MeanReversion { params: MeanReversionParams::default() })).expect("unique name");
        host.register(Box::new(FundingArbitrage { params: FundingArbitrageParams::default() })).expect("unique name");
        Self::new(agent_id, bus, host, readiness)
    }

    async fn run_cycle(&mut self) -> anyhow::Result<()> {
        let now = Utc::now();
        let snapshots: Vec<MarketSnapshot> = self.market_cache.values().cloned().collect();

        for snapshot in snapshots {
            for evaluation in self.host.evaluate_all(&snapshot.instrument, &snapshot, now) {
                let key = (evaluation.intent.instrument.clone(), evaluation.intent.strategy.clone());
                if self.active_signals.get(&key) == Some(&evaluation.intent.direction) {
                    continue;
                }
                self.active_signals.insert(key, evaluation.intent.direction);

                if !evaluation.should_execute() {
                    debug!(
                        agent_id = %self.agent_id,
                        strategy = %evaluation.intent.strategy,
                        instrument = %evaluation.intent.instrument,
                        "shadow signal suppressed"
                    );
                    continue;
                }

                info!(
                    agent_id = %self.agent_id,
                    strategy = %evaluation.intent.strategy,
                    instrument = %evaluation.intent.instrument,
                    direction = ?evaluation.intent.direction,
                    confidence = evaluation.intent.confidence,
                    "generated signal"
                );

                let correlation_id = evaluation.intent.id;
                let message = Message::with_correlation(
                    self.agent_id.clone(),
                    Subject::RiskCheck,
                    Payload::TradeIntent(evaluation.intent),
                    correlation_id,
                );
                self.bus.publish(Subject::RiskCheck, message).await;
            }
        }

        Ok(())
    }
}

#[async_trait::async_trait]
impl Agent for SignalAgent {
    async fn on_start(&mut self) -> anyhow::Result<()> {
        info!(agent_id = %self.agent_id, strategies = self.host.len(), "signal agent starting");
        Ok(())
    }

    async fn on_pause(&mut self) -> anyhow::Result<()> {
        self.paused = true;
        info!(agent_id = %self.agent_id, "signal generation paused");
        Ok(())
    }

    async fn on_resume(&mut self) -> anyhow::Result<()> {
        self.paused = false;
        info!(agent_id = %self.agent_id, "signal generation resumed");
        Ok(())
    }

    async fn handle_message(&mut self, message: Message) -> anyhow::Result<()> {
        if let Payload::MarketSnapshot(snapshot) = message.payload {
            self.market_cache.insert(snapshot.instrument.clone(), snapshot);
        }
        Ok(())
    }

    async fn cycle(&mut self) -> anyhow::Result<()> {
        if self.paused {
            return Ok(());
        }
        if !self.readiness.is_ready() {
            debug!(agent_id = %self.agent_id, "holding first publish: meta/risk not ready");
            return Ok(());
        }
        self.run_cycle().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;
    use std::time::Duration;

    fn snapshot(instrument: &str) -> MarketSnapshot {
        MarketSnapshot {
            instrument: instrument.to_string(),
            price: 60_000.0,
            price_change_1m: 0.0,
            price_change_24h: 3_000.0,
            volume_24h: 2_000_000.0,
            vwap: None,
            funding_rate: None,
            spread: 0.0005,
            depth: 1_000_000.0,
        }
    }

    fn ready_gate() -> Arc<ReadinessGate> {
        let gate = Arc::new(ReadinessGate::new());
        gate.mark_meta_ready();
        gate.mark_risk_ready();
        gate
    }

    #[tokio::test]
    async fn holds_first_publish_until_ready() {
        let bus = Bus::new();
        let gate = Arc::new(ReadinessGate::new()); // not marked ready
        let mut agent = SignalAgent::with_builtin_strategies("signal-1", bus.clone(), gate);
        agent.market_cache.insert("BTC-USD".to_string(), snapshot("BTC-USD"));

        let mut sub = bus.subscribe(Subject::RiskCheck);
        agent.cycle().await.unwrap();

        let result = tokio::time::timeout(Duration::from_millis(100), sub.next()).await;
        assert!(result.is_err(), "no intent should have been published while not ready");
    }

    #[tokio::test]
    async fn publishes_trade_intent_once_ready() {
        let bus = Bus::new();
        let mut agent = SignalAgent::with_builtin_strategies("signal-1", bus.clone(), ready_gate());
        agent.market_cache.insert("BTC-USD".to_string(), snapshot("BTC-USD"));

        let mut sub = bus.subscribe(Subject::RiskCheck);
        agent.cycle().await.unwrap();

        let message = tokio::time::timeout(Duration::from_millis(100), sub.next())
            .await
            .expect("timed out waiting for a signal")
            .expect("subscription closed");
        match message.payload {
            Payload::TradeIntent(intent) => {
                assert_eq!(intent.strategy, "trend_following");
                assert_eq!(intent.instrument, "BTC-USD");
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[tokio::test]
    async fn repeat_same_direction_signal_is_suppressed() {
        let bus = Bus::new();
        let mut agent = SignalAgent::with_builtin_strategies("signal-1", bus.clone(), ready_gate());
        agent.market_cache.insert("BTC-USD".to_string(), snapshot("BTC-USD"));

        let mut sub = bus.subscribe(Subject::RiskCheck);
        agent.cycle().await.unwrap();
        tokio::time::timeout(Duration::from_millis(100), sub.next()).await.unwrap().unwrap();

        // Same snapshot again -> same direction -> suppressed.
        agent.cycle().await.unwrap();
        let result = tokio::time::timeout(Duration::from_millis(100), sub.next()).await;
        assert!(result.is_err(), "duplicate same-direction signal should not republish");
    }

    #[tokio::test]
    async fn paused_agent_does_not_publish() {
        let bus = Bus::new();
        let mut agent = SignalAgent::with_builtin_strategies("signal-1", bus.clone(), ready_gate());
        agent.on_pause().await.unwrap();
        agent.market_cache.insert("BTC-USD".to_string(), snapshot("BTC-USD"));

        let mut sub = bus.subscribe(Subject::RiskCheck);
        agent.cycle().await.unwrap();

        let result = tokio::time::timeout(Duration::from_millis(100), sub.next()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn market_snapshot_message_updates_cache() {
        let bus = Bus::new();
        let mut agent = SignalAgent::with_builtin_strategies("signal-1", bus.clone(), ready_gate());

        let message = Message::new("market-feed", Subject::MarketData, Payload::MarketSnapshot(snapshot("ETH-USD")));
        agent.handle_message(message).await.unwrap();

        assert!(agent.market_cache.contains_key("ETH-USD"));
    }
}
