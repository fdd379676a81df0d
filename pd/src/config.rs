//! PlanDaemon configuration types and loading

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::orchestrator::OrchestratorConfig;

/// Main PlanDaemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Upstream agent service configuration
    pub agents: AgentsConfig,

    /// Pipeline timing and escalation tuning
    pub planning: PlanningConfig,

    /// HTTP server configuration
    pub server: ServerConfig,

    /// Session store configuration
    pub session: SessionConfig,

    /// Log level override (CLI flag wins over this)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,
}

impl Config {
    /// Validate configuration before use
    ///
    /// Call this early in startup to fail fast with clear error messages.
    pub fn validate(&self) -> Result<()> {
        if std::env::var(&self.agents.api_key_env).is_err() {
            return Err(eyre::eyre!(
                "Agent API key not found. Set the {} environment variable.",
                self.agents.api_key_env
            ));
        }
        if self.planning.agent_timeout_secs >= self.planning.run_deadline_secs {
            return Err(eyre::eyre!(
                "agent-timeout-secs ({}) must be smaller than run-deadline-secs ({}), or a wedged agent call leaves no margin for reconciliation",
                self.planning.agent_timeout_secs,
                self.planning.run_deadline_secs
            ));
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path)
                .context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .plandaemon.yml
        let local_config = PathBuf::from(".plandaemon.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/plandaemon/plandaemon.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("plandaemon").join("plandaemon.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Upstream agent service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentsConfig {
    /// Base URL of the reasoning service
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// Model identifier requested for both specialists
    pub model: String,

    /// Maximum tokens per specialist response
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// HTTP client timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8090".to_string(),
            api_key_env: "PLANDAEMON_AGENT_API_KEY".to_string(),
            model: "planner-large".to_string(),
            max_tokens: 8192,
            timeout_ms: 150_000,
        }
    }
}

impl AgentsConfig {
    /// Read the API key from the configured environment variable
    pub fn get_api_key(&self) -> Result<String> {
        std::env::var(&self.api_key_env)
            .context(format!("{} environment variable not set", self.api_key_env))
    }
}

/// Pipeline timing and escalation tuning
///
/// The per-agent timeout must leave margin under the run deadline, which
/// itself sits under the host's wall-clock ceiling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanningConfig {
    #[serde(rename = "agent-timeout-secs")]
    pub agent_timeout_secs: u64,

    #[serde(rename = "run-deadline-secs")]
    pub run_deadline_secs: u64,

    #[serde(rename = "escalation-threshold")]
    pub escalation_threshold: f64,
}

impl Default for PlanningConfig {
    fn default() -> Self {
        Self {
            agent_timeout_secs: 120,
            run_deadline_secs: 480,
            escalation_threshold: crate::orchestrator::reconcile::DEFAULT_ESCALATION_THRESHOLD,
        }
    }
}

impl PlanningConfig {
    /// Build the orchestrator's tuning from this config
    pub fn orchestrator_config(&self, max_tokens: u32) -> OrchestratorConfig {
        OrchestratorConfig {
            agent_timeout: Duration::from_secs(self.agent_timeout_secs),
            run_deadline: Duration::from_secs(self.run_deadline_secs),
            escalation_threshold: self.escalation_threshold,
            max_tokens,
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address, host:port
    pub listen: String,

    /// Interval between expired-session sweeps, in seconds
    #[serde(rename = "sweep-interval-secs")]
    pub sweep_interval_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:8787".to_string(),
            sweep_interval_secs: 300,
        }
    }
}

/// Session store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Time-to-live for unattached sessions, in seconds
    #[serde(rename = "ttl-secs")]
    pub ttl_secs: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: sessionstore::DEFAULT_TTL_SECS,
        }
    }
}
