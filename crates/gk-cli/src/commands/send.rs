//! `send` — publish a control command onto a bus.
//!
//! spec.md §4.12 describes this as reaching "a running orchestrator's
//! command socket"; there is no out-of-process transport yet (spec.md §1
//! puts an HTTP/WebSocket surface out of scope), so this is the function
//! over `gk-bus` that transport would eventually sit behind. Run standalone
//! it proves delivery by subscribing to `control` before publishing and
//! reading the message straight back off the bus.

use anyhow::{ensure, Context};
use futures_util::StreamExt;
use gk_bus::Bus;
use gk_schemas::envelope::{ControlMsg, Message, Payload, Subject};

pub async fn run(command: ControlMsg, target: Option<String>) -> anyhow::Result<()> {
    let bus = Bus::new();
    let mut control = bus.subscribe(Subject::Control);

    let message = Message::new("gk-cli", Subject::Control, Payload::Control(command));
    let message = match target {
        Some(target) => message.targeted(target),
        None => message,
    };
    let sent_id = message.id;

    bus.publish(Subject::Control, message).await;

    let delivered = control.next().await.context("control subject closed before the command was delivered")?;
    ensure!(delivered.id == sent_id, "bus delivered a different message than the one sent");

    let target_desc = delivered.target_agent.as_deref().unwrap_or("every agent");
    println!("sent id={sent_id} target={target_desc} payload={:?}", delivered.payload);
    Ok(())
}
