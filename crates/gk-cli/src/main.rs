//! `gk-cli` — operator CLI for the trading control plane.
//!
//! Three ops (spec.md §4.12): `config-hash` (canonicalize + hash a layered
//! config), `send` (publish a control command), `status` (print each
//! agent's latest heartbeat metrics).

mod commands;

use std::time::Duration;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use gk_schemas::envelope::ControlMsg;

#[derive(Parser)]
#[command(name = "gk", about = "Operator CLI for the trading control plane", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute a layered config's canonical hash and print its JSON.
    ConfigHash {
        /// Paths in merge order (base -> env -> override ...).
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Publish a control command onto the bus.
    Send {
        /// pause | resume | shutdown | kill-switch-reset
        #[arg(long)]
        command: String,

        /// Reason string, only meaningful for `pause`.
        #[arg(long)]
        reason: Option<String>,

        /// Address one agent by id instead of every agent.
        #[arg(long)]
        target: Option<String>,
    },

    /// Boot the control plane, collect each agent's latest heartbeat, print it.
    Status {
        /// How long to wait for heartbeats before reporting what arrived.
        #[arg(long, default_value_t = 7)]
        timeout_secs: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::ConfigHash { paths } => commands::config_hash::run(&paths)?,
        Commands::Send { command, reason, target } => {
            let control = parse_control_command(&command, reason)?;
            commands::send::run(control, target).await?;
        }
        Commands::Status { timeout_secs } => {
            commands::status::run(Duration::from_secs(timeout_secs)).await?;
        }
    }

    Ok(())
}

fn parse_control_command(command: &str, reason: Option<String>) -> Result<ControlMsg> {
    match command.trim().to_lowercase().as_str() {
        "pause" => Ok(ControlMsg::Pause { reason }),
        "resume" => Ok(ControlMsg::Resume),
        "shutdown" => Ok(ControlMsg::Shutdown),
        "kill-switch-reset" | "kill_switch_reset" => Ok(ControlMsg::KillSwitchReset),
        other => bail!("unknown --command '{other}'. expected one of: pause | resume | shutdown | kill-switch-reset"),
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();
}
