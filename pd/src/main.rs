//! PlanDaemon - dual-agent planning pipeline
//!
//! Entry point: load config, wire the gateway, orchestrator, and session
//! store together, and serve the streaming endpoint.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use eyre::{Context, Result};
use tracing::info;

use plandaemon::agents::HttpAgentGateway;
use plandaemon::cli::{Cli, Command};
use plandaemon::config::Config;
use plandaemon::orchestrator::PlanningOrchestrator;
use plandaemon::server::{run_server, AppState};
use sessionstore::SessionStore;

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Level priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level).map(str::to_uppercase).as_deref() {
        Some("TRACE") => tracing::Level::TRACE,
        Some("DEBUG") => tracing::Level::DEBUG,
        Some("INFO") | None => tracing::Level::INFO,
        Some("WARN") | Some("WARNING") => tracing::Level::WARN,
        Some("ERROR") => tracing::Level::ERROR,
        Some(other) => {
            eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", other);
            tracing::Level::INFO
        }
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_ref())?;
    setup_logging(cli.log_level.as_deref(), config.log_level.as_deref())?;
    config.validate()?;

    let listen = match &cli.command {
        Some(Command::Serve { listen }) => listen.clone(),
        None => None,
    }
    .unwrap_or_else(|| config.server.listen.clone());

    let gateway =
        Arc::new(HttpAgentGateway::from_config(&config.agents).context("Failed to build agent gateway")?);
    let orchestrator = Arc::new(PlanningOrchestrator::new(
        gateway,
        config.planning.orchestrator_config(config.agents.max_tokens),
    ));
    let store = Arc::new(SessionStore::new(chrono::Duration::seconds(
        config.session.ttl_secs,
    )));

    info!(%listen, "pd: starting planning server");
    run_server(
        &listen,
        Duration::from_secs(config.server.sweep_interval_secs),
        AppState { store, orchestrator },
    )
    .await
}
