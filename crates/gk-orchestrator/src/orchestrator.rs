//! Wires every agent onto one [`Bus`], starts each as a supervised task, and
//! restarts whatever dies — replacing the Python `agent_orchestrator`'s
//! module-level singleton (spec §9's anti-singleton redesign flag) with an
//! explicit, constructed value passed to the binary entry point.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use gk_agent::AgentRuntime;
use gk_bus::Bus;
use gk_schemas::envelope::{AlertSeverity, ControlMsg, Message, Payload, Subject};
use gk_signal::ReadinessGate;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::config::OrchestratorConfig;

const SUPERVISOR_TICK: Duration = Duration::from_secs(5);
const PER_AGENT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);
const RESTART_BUDGET: u32 = 5;
const RESTART_BUDGET_WINDOW: Duration = Duration::from_secs(60);

type SpawnFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>;
type SpawnFn = Box<dyn Fn() -> SpawnFuture + Send + Sync>;

struct SupervisedTask {
    name: String,
    spawn: SpawnFn,
    handle: Option<JoinHandle<anyhow::Result<()>>>,
    restart_times: VecDeque<chrono::DateTime<Utc>>,
    escalated: bool,
}

impl SupervisedTask {
    fn new(name: impl Into<String>, spawn: SpawnFn) -> Self {
        Self { name: name.into(), spawn, handle: None, restart_times: VecDeque::new(), escalated: false }
    }

    fn start(&mut self) {
        self.handle = Some(tokio::spawn((self.spawn)()));
    }

    /// Records a restart attempt, pruning the 60s window. Returns `false`
    /// once the 5-restarts-per-minute budget (spec §7) is exhausted.
    fn record_restart_and_check_budget(&mut self, now: chrono::DateTime<Utc>) -> bool {
        while let Some(front) = self.restart_times.front() {
            if (now - *front).to_std().unwrap_or_default() > RESTART_BUDGET_WINDOW {
                self.restart_times.pop_front();
            } else {
                break;
            }
        }
        self.restart_times.push_back(now);
        self.restart_times.len() as u32 <= RESTART_BUDGET
    }
}

/// Registers and supervises every agent in the canonical order (spec §4.3):
/// Meta-Decision, Capital-Allocation, Risk, Signal, Execution, Strategy
/// Lifecycle.
pub struct Orchestrator {
    bus: Bus,
    readiness: Arc<ReadinessGate>,
    tasks: Arc<tokio::sync::Mutex<Vec<SupervisedTask>>>,
    readiness_watcher: Option<JoinHandle<()>>,
    supervisor: Option<JoinHandle<()>>,
}

impl Orchestrator {
    pub fn new(config: OrchestratorConfig) -> Self {
        let bus = Bus::new();
        let readiness = Arc::new(ReadinessGate::new());

        let mut tasks = Vec::new();

        {
            let bus = bus.clone();
            let strategies = config.registered_strategies.clone();
            tasks.push(SupervisedTask::new(
                "meta-decision-agent",
                Box::new(move || {
                    let bus = bus.clone();
                    let strategies = strategies.clone();
                    Box::pin(async move {
                        let agent = gk_meta::MetaDecisionAgent::new(bus.clone(), strategies, Utc::now());
                        let runtime = AgentRuntime::new("meta-decision-agent", "meta-decision", bus, agent);
                        runtime
                            .run(vec![Subject::MarketData, Subject::Heartbeat, Subject::Fills, Subject::Alerts])
                            .await
                    })
                }),
            ));
        }

        {
            let bus = bus.clone();
            let total_capital_usd = config.total_capital_usd;
            tasks.push(SupervisedTask::new(
                "capital-allocation-agent",
                Box::new(move || {
                    let bus = bus.clone();
                    Box::pin(async move {
                        let agent = gk_allocation::CapitalAllocationAgent::new(bus.clone(), total_capital_usd, Utc::now());
                        let runtime = AgentRuntime::new("capital-allocation-agent", "capital-allocation", bus, agent);
                        runtime.run(vec![Subject::Fills]).await
                    })
                }),
            ));
        }

        {
            let bus = bus.clone();
            let limits = config.risk_limits.clone();
            tasks.push(SupervisedTask::new(
                "risk-agent",
                Box::new(move || {
                    let bus = bus.clone();
                    let limits = limits.clone();
                    Box::pin(async move {
                        let agent = gk_risk::RiskAgent::new(bus.clone(), limits);
                        let runtime = AgentRuntime::new("risk-agent", "risk", bus, agent);
                        runtime.run(vec![Subject::RiskCheck, Subject::Fills]).await
                    })
                }),
            ));
        }

        {
            let bus = bus.clone();
            let readiness = readiness.clone();
            tasks.push(SupervisedTask::new(
                "signal-agent",
                Box::new(move || {
                    let bus = bus.clone();
                    let readiness = readiness.clone();
                    Box::pin(async move {
                        let agent = gk_signal::SignalAgent::with_builtin_strategies("signal-agent", bus.clone(), readiness);
                        let runtime = AgentRuntime::new("signal-agent", "signal", bus, agent);
                        runtime.run(vec![Subject::MarketData]).await
                    })
                }),
            ));
        }

        {
            let bus = bus.clone();
            let venue_name = config.venue_name.clone();
            tasks.push(SupervisedTask::new(
                "execution-agent",
                Box::new(move || {
                    let bus = bus.clone();
                    let venue_name = venue_name.clone();
                    Box::pin(async move {
                        let venue = gk_venue_paper::PaperVenue::new(venue_name.clone());
                        let agent = gk_execution::ExecutionAgent::new(bus.clone(), venue, venue_name, Utc::now());
                        let runtime = AgentRuntime::new("execution-agent", "execution", bus, agent);
                        runtime.run(vec![Subject::RiskApproved]).await
                    })
                }),
            ));
        }

        {
            let bus = bus.clone();
            tasks.push(SupervisedTask::new(
                "lifecycle-agent",
                Box::new(move || {
                    let bus = bus.clone();
                    Box::pin(async move {
                        let agent = gk_lifecycle::LifecycleAgent::new(bus.clone(), Utc::now());
                        let runtime = AgentRuntime::new("lifecycle-agent", "lifecycle", bus, agent);
                        runtime.run(vec![Subject::Fills]).await
                    })
                }),
            ));
        }

        Self { bus, readiness, tasks: Arc::new(tokio::sync::Mutex::new(tasks)), readiness_watcher: None, supervisor: None }
    }

    pub fn bus(&self) -> Bus {
        self.bus.clone()
    }

    /// Starts every registered agent plus the readiness watcher and the
    /// restart supervisor. Idempotent only in the sense that calling it
    /// twice double-spawns everything; callers should call it once.
    pub async fn start(&mut self) {
        {
            let mut tasks = self.tasks.lock().await;
            for task in tasks.iter_mut() {
                info!(agent = %task.name, "starting agent");
                task.start();
            }
        }

        self.readiness_watcher = Some(tokio::spawn(watch_readiness(self.bus.clone(), self.readiness.clone())));
        self.supervisor = Some(spawn_supervisor(self.tasks.clone(), self.bus.clone()));
    }

    /// Publishes a control command. `target` addresses one agent by the id
    /// it was registered under; `None` reaches every agent.
    pub async fn send_command(&self, command: ControlMsg, target: Option<String>) {
        let message = Message::new("orchestrator", Subject::Control, Payload::Control(command));
        let message = match target {
            Some(target) => message.targeted(target),
            None => message,
        };
        self.bus.publish(Subject::Control, message).await;
    }

    /// Publishes `shutdown`, waits (bounded) for every agent task to exit,
    /// then drops the supervisor/readiness-watcher handles so the bus's
    /// last strong references go away with this orchestrator.
    pub async fn stop(mut self) {
        self.send_command(ControlMsg::Shutdown, None).await;

        if let Some(supervisor) = self.supervisor.take() {
            supervisor.abort();
        }
        if let Some(watcher) = self.readiness_watcher.take() {
            watcher.abort();
        }

        let mut tasks = self.tasks.lock().await;
        for task in tasks.iter_mut() {
            if let Some(handle) = task.handle.take() {
                match tokio::time::timeout(PER_AGENT_SHUTDOWN_TIMEOUT, handle).await {
                    Ok(Ok(Ok(()))) => info!(agent = %task.name, "agent stopped"),
                    Ok(Ok(Err(err))) => warn!(agent = %task.name, %err, "agent stopped with error"),
                    Ok(Err(join_err)) => warn!(agent = %task.name, %join_err, "agent task panicked during shutdown"),
                    Err(_) => warn!(agent = %task.name, "agent did not stop within the shutdown timeout"),
                }
            }
        }
    }
}

/// Runs the 5s supervisor tick: restarts any agent task that has finished,
/// up to [`RESTART_BUDGET`] restarts per [`RESTART_BUDGET_WINDOW`], then
/// leaves it stopped and raises a critical alert (spec §7's escalation
/// path).
fn spawn_supervisor(tasks: Arc<tokio::sync::Mutex<Vec<SupervisedTask>>>, bus: Bus) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(SUPERVISOR_TICK);
        loop {
            tick.tick().await;
            let mut tasks = tasks.lock().await;
            for task in tasks.iter_mut() {
                if task.escalated {
                    continue;
                }
                let finished = match &task.handle {
                    Some(handle) => handle.is_finished(),
                    None => true,
                };
                if !finished {
                    continue;
                }
                if let Some(handle) = task.handle.take() {
                    match handle.await {
                        Ok(Ok(())) => info!(agent = %task.name, "agent exited cleanly"),
                        Ok(Err(err)) => error!(agent = %task.name, %err, "agent returned an error"),
                        Err(join_err) => error!(agent = %task.name, %join_err, "agent task panicked"),
                    }
                }

                let now = Utc::now();
                if task.record_restart_and_check_budget(now) {
                    warn!(agent = %task.name, "restarting agent");
                    task.start();
                } else {
                    task.escalated = true;
                    error!(agent = %task.name, "restart budget exhausted, leaving agent stopped");
                    let alert = Message::new(
                        "orchestrator",
                        Subject::Alerts,
                        Payload::Alert {
                            severity: AlertSeverity::Critical,
                            title: "agent restart budget exhausted".to_string(),
                            detail: format!("{} exceeded {} restarts/minute and was left stopped", task.name, RESTART_BUDGET),
                        },
                    );
                    bus.publish(Subject::Alerts, alert).await;
                }
            }
        }
    })
}

/// Marks the readiness gate as soon as Meta and Risk each emit their first
/// heartbeat, so signal agents stop holding their initial publish (spec
/// §4.3's liveness precondition).
async fn watch_readiness(bus: Bus, gate: Arc<ReadinessGate>) {
    use futures_util::StreamExt;

    let mut heartbeats = bus.subscribe(Subject::Heartbeat);
    let mut meta_seen = false;
    let mut risk_seen = false;

    while let Some(message) = heartbeats.next().await {
        if let Payload::Heartbeat { agent_id, .. } = message.payload {
            if !meta_seen && agent_id == "meta-decision-agent" {
                meta_seen = true;
                gate.mark_meta_ready();
            }
            if !risk_seen && agent_id == "risk-agent" {
                risk_seen = true;
                gate.mark_risk_ready();
            }
        }
        if meta_seen && risk_seen {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop_spawn() -> SpawnFn {
        Box::new(|| Box::pin(async { Ok::<(), anyhow::Error>(()) }))
    }

    #[test]
    fn restart_budget_allows_up_to_five_within_a_minute() {
        let mut task = SupervisedTask::new("test-agent", noop_spawn());
        let base = Utc::now();
        for i in 0..RESTART_BUDGET {
            let now = base + chrono::Duration::seconds(i as i64);
            assert!(task.record_restart_and_check_budget(now), "restart {i} should be within budget");
        }
        let sixth = base + chrono::Duration::seconds(RESTART_BUDGET as i64);
        assert!(!task.record_restart_and_check_budget(sixth), "sixth restart within the window should exceed budget");
    }

    #[test]
    fn restart_budget_window_slides_forward() {
        let mut task = SupervisedTask::new("test-agent", noop_spawn());
        let base = Utc::now();
        for i in 0..RESTART_BUDGET {
            task.record_restart_and_check_budget(base + chrono::Duration::seconds(i as i64));
        }
        // A restart well outside the 60s window should fall off the front
        // and free up budget again.
        let later = base + chrono::Duration::seconds(61);
        assert!(task.record_restart_and_check_budget(later));
    }
}
