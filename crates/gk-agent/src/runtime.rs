use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures_util::stream::{select_all, SelectAll};
use futures_util::StreamExt;
use gk_bus::{Bus, Subscription};
use gk_schemas::envelope::{ControlMsg, Message, Payload, Subject};
use tracing::{debug, error, info, warn};

use crate::{Agent, AgentMetrics};

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
const CYCLE_INTERVAL: Duration = Duration::from_millis(100);

/// Drives one [`Agent`]: subscribes it to its declared subjects plus the
/// always-on control subject, intercepts control messages before they ever
/// reach the agent, and runs a fixed-cadence heartbeat alongside the
/// agent's own cycle.
pub struct AgentRuntime<A: Agent> {
    agent_id: String,
    agent_type: String,
    bus: Bus,
    agent: A,
    metrics: Arc<AgentMetrics>,
    paused: Arc<AtomicBool>,
}

impl<A: Agent> AgentRuntime<A> {
    pub fn new(agent_id: impl Into<String>, agent_type: impl Into<String>, bus: Bus, agent: A) -> Self {
        Self {
            agent_id: agent_id.into(),
            agent_type: agent_type.into(),
            bus,
            agent,
            metrics: Arc::new(AgentMetrics::new()),
            paused: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn metrics(&self) -> Arc<AgentMetrics> {
        self.metrics.clone()
    }

    /// Run until a shutdown control message arrives or the process is
    /// asked to stop via the returned `CancellationToken`-free `stop`
    /// signal (dropping `self` suffices in tests).
    pub async fn run(mut self, subjects: Vec<Subject>) -> anyhow::Result<()> {
        let mut control = self.bus.subscribe(Subject::Control);
        let domain: SelectAll<Subscription> =
            select_all(subjects.into_iter().map(|s| self.bus.subscribe(s)));
        tokio::pin!(domain);

        self.agent.on_start().await?;
        info!(agent_id = %self.agent_id, "agent started");

        let heartbeat_task = tokio::spawn(spawn_heartbeat(
            self.bus.clone(),
            self.agent_id.clone(),
            self.agent_type.clone(),
            self.metrics.clone(),
        ));

        let mut tick = tokio::time::interval(CYCLE_INTERVAL);

        loop {
            tokio::select! {
                maybe_ctrl = control.next() => {
                    let Some(ctrl) = maybe_ctrl else { break; };
                    self.metrics.record_received();
                    if !self.dispatch_control(ctrl).await? {
                        break;
                    }
                }
                maybe_msg = domain.next() => {
                    let Some(msg) = maybe_msg else { continue; };
                    self.metrics.record_received();
                    if !self.paused.load(Ordering::Relaxed) {
                        if let Err(err) = self.agent.handle_message(msg).await {
                            error!(agent_id = %self.agent_id, %err, "handle_message failed");
                            self.metrics.record_error();
                        }
                    }
                }
                _ = tick.tick() => {
                    if !self.paused.load(Ordering::Relaxed) {
                        if let Err(err) = self.agent.cycle().await {
                            error!(agent_id = %self.agent_id, %err, "cycle failed");
                            self.metrics.record_error();
                        }
                    }
                }
            }
        }

        heartbeat_task.abort();
        self.agent.on_stop().await?;
        info!(agent_id = %self.agent_id, "agent stopped");
        Ok(())
    }

    /// Returns `false` when the agent should shut down.
    async fn dispatch_control(&mut self, message: Message) -> anyhow::Result<bool> {
        let Payload::Control(cmd) = message.payload else {
            // A control-subject message without a Control payload shouldn't
            // happen; drop it rather than mis-route it to handle_message.
            warn!(agent_id = %self.agent_id, "non-control payload on control subject");
            return Ok(true);
        };

        match cmd {
            ControlMsg::Shutdown => {
                info!(agent_id = %self.agent_id, "received shutdown");
                return Ok(false);
            }
            ControlMsg::Pause { reason } => {
                info!(agent_id = %self.agent_id, ?reason, "received pause");
                self.paused.store(true, Ordering::Relaxed);
                self.agent.on_pause().await?;
            }
            ControlMsg::Resume => {
                info!(agent_id = %self.agent_id, "received resume");
                self.paused.store(false, Ordering::Relaxed);
                self.agent.on_resume().await?;
            }
            ControlMsg::KillSwitchReset | ControlMsg::MetaDecision(_) | ControlMsg::CapitalAllocation(_) => {
                // These broadcast system-wide state rather than address this
                // agent's own lifecycle; let the concrete agent decide what
                // to do with them.
                self.agent
                    .handle_message(Message {
                        payload: Payload::Control(cmd),
                        ..message
                    })
                    .await?;
            }
        }
        Ok(true)
    }
}

async fn spawn_heartbeat(bus: Bus, agent_id: String, agent_type: String, metrics: Arc<AgentMetrics>) {
    let mut interval = tokio::time::interval(HEARTBEAT_INTERVAL);
    loop {
        interval.tick().await;
        let snapshot = metrics.snapshot();
        metrics.record_heartbeat(Utc::now());
        let message = Message::new(
            agent_id.clone(),
            Subject::Heartbeat,
            Payload::Heartbeat {
                agent_id: agent_id.clone(),
                agent_type: agent_type.clone(),
                messages_received: snapshot.messages_received,
                messages_sent: snapshot.messages_sent,
                errors: snapshot.errors,
            },
        );
        debug!(agent_id = %agent_id, "sending heartbeat");
        bus.publish(Subject::Heartbeat, message).await;
        metrics.record_sent();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gk_schemas::intent::{Direction, TradeIntent};
    use std::sync::atomic::AtomicUsize;

    struct EchoAgent {
        cycles: Arc<AtomicUsize>,
        messages: Arc<AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl Agent for EchoAgent {
        async fn handle_message(&mut self, _message: Message) -> anyhow::Result<()> {
            self.messages.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }

        async fn cycle(&mut self) -> anyhow::Result<()> {
            self.cycles.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }
    }

    #[tokio::test]
    async fn shutdown_command_stops_the_runtime() {
        let bus = Bus::new();
        let cycles = Arc::new(AtomicUsize::new(0));
        let messages = Arc::new(AtomicUsize::new(0));
        let agent = EchoAgent {
            cycles: cycles.clone(),
            messages: messages.clone(),
        };
        let runtime = AgentRuntime::new("echo-1", "echo", bus.clone(), agent);

        let handle = tokio::spawn(runtime.run(vec![Subject::Signals]));

        let intent = TradeIntent {
            id: uuid::Uuid::new_v4(),
            strategy: "trend_following".into(),
            instrument: "BTC-USD".into(),
            direction: Direction::Buy,
            confidence: 0.8,
            target_exposure_usd: 1000.0,
            entry_price: 60_000.0,
            stop_loss_pct: 0.02,
            take_profit_pct: 0.04,
            horizon_minutes: 60,
            is_closing: false,
        };
        bus.publish(
            Subject::Signals,
            Message::new("test", Subject::Signals, Payload::TradeIntent(intent)),
        )
        .await;

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(messages.load(Ordering::Relaxed) >= 1);
        assert!(cycles.load(Ordering::Relaxed) >= 1);

        bus.publish(
            Subject::Control,
            Message::new("test", Subject::Control, Payload::Control(ControlMsg::Shutdown)),
        )
        .await;

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("runtime did not shut down in time")
            .expect("task panicked")
            .expect("runtime returned an error");
    }
}
