//! `status` — print each agent's latest heartbeat metrics.
//!
//! There's no persistent daemon to attach to yet (see `send`'s doc comment),
//! so this boots its own short-lived `Orchestrator`, collects one heartbeat
//! per agent off `gk-bus`, prints what it saw, and shuts the plane back
//! down — a real snapshot of the control plane rather than placeholder
//! output.

use std::collections::HashMap;
use std::time::Duration;

use futures_util::StreamExt;
use gk_orchestrator::{Orchestrator, OrchestratorConfig};
use gk_schemas::envelope::{Payload, Subject};

struct AgentStatus {
    agent_type: String,
    messages_received: u64,
    messages_sent: u64,
    errors: u64,
}

pub async fn run(window: Duration) -> anyhow::Result<()> {
    let mut orchestrator = Orchestrator::new(OrchestratorConfig::default());
    let mut heartbeats = orchestrator.bus().subscribe(Subject::Heartbeat);

    orchestrator.start().await;

    let mut latest: HashMap<String, AgentStatus> = HashMap::new();
    let _ = tokio::time::timeout(window, async {
        while let Some(message) = heartbeats.next().await {
            if let Payload::Heartbeat { agent_id, agent_type, messages_received, messages_sent, errors } = message.payload
            {
                latest.insert(agent_id, AgentStatus { agent_type, messages_received, messages_sent, errors });
            }
        }
    })
    .await;

    orchestrator.stop().await;

    if latest.is_empty() {
        println!("no agent reported a heartbeat within {window:?}");
        return Ok(());
    }

    let mut agent_ids: Vec<&String> = latest.keys().collect();
    agent_ids.sort();

    println!("{:<24} {:<20} {:>10} {:>10} {:>8}", "agent_id", "agent_type", "received", "sent", "errors");
    for agent_id in agent_ids {
        let status = &latest[agent_id];
        println!(
            "{:<24} {:<20} {:>10} {:>10} {:>8}",
            agent_id, status.agent_type, status.messages_received, status.messages_sent, status.errors
        );
    }

    Ok(())
}
