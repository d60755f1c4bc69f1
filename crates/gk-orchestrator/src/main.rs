//! `gk-orchestrator` entry point.
//!
//! Boots every agent onto one in-process bus and runs until the process
//! receives SIGINT, then shuts down gracefully.

use gk_orchestrator::{Orchestrator, OrchestratorConfig};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    // TODO: load this from a `gk-config` layered snapshot once that crate's
    // typed extraction layer lands; defaults match the desk's conservative
    // starting point until then.
    let config = OrchestratorConfig::default();

    let mut orchestrator = Orchestrator::new(config);
    orchestrator.start().await;
    info!("gk-orchestrator running, press ctrl-c to stop");

    tokio::signal::ctrl_c().await?;
    info!("shutdown requested");
    orchestrator.stop().await;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();
}
