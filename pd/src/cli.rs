//! Command-line interface for the pd binary

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// PlanDaemon - dual-agent planning pipeline
#[derive(Debug, Parser)]
#[command(name = "pd", version, about = "Dual-agent planning pipeline with streamed progress")]
pub struct Cli {
    /// Path to a config file (defaults to .plandaemon.yml, then the user config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the planning server (default)
    Serve {
        /// Listen address, host:port (overrides config)
        #[arg(long)]
        listen: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_bare_invocation() {
        let cli = Cli::parse_from(["pd"]);
        assert!(cli.command.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_parses_serve_with_listen() {
        let cli = Cli::parse_from(["pd", "serve", "--listen", "0.0.0.0:9100"]);
        match cli.command {
            Some(Command::Serve { listen }) => assert_eq!(listen.as_deref(), Some("0.0.0.0:9100")),
            other => panic!("expected Serve, got {other:?}"),
        }
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::parse_from(["pd", "--log-level", "DEBUG", "serve"]);
        assert_eq!(cli.log_level.as_deref(), Some("DEBUG"));
    }
}
