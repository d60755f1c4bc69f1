//! Shared agent runtime: lifecycle hooks, heartbeats, and control-channel
//! interception, generalized from the original `BaseAgent`'s Redis pub/sub
//! loop onto [`gk_bus::Bus`].

pub mod metrics;
pub mod runtime;

pub use metrics::AgentMetrics;
pub use runtime::AgentRuntime;

use gk_schemas::envelope::Message;

/// What a concrete agent (signal generator, risk evaluator, ...) must
/// implement. The runtime owns connection, heartbeats, and control-message
/// interception; an `Agent` only ever sees domain messages and lifecycle
/// hooks.
#[async_trait::async_trait]
pub trait Agent: Send {
    /// Called once before the first cycle.
    async fn on_start(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called once after the runtime is asked to shut down.
    async fn on_stop(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called when a `pause` control message is received. While paused,
    /// the runtime still drains and counts messages but does not call
    /// `handle_message` or `cycle`.
    async fn on_pause(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn on_resume(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Handle one domain message (anything not on the control subject).
    async fn handle_message(&mut self, message: Message) -> anyhow::Result<()>;

    /// Run one agent-specific tick. Called at most once per runtime loop
    /// iteration, after any messages available this iteration have been
    /// drained.
    async fn cycle(&mut self) -> anyhow::Result<()>;
}
