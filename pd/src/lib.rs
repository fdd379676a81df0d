//! PlanDaemon - dual-agent planning pipeline
//!
//! PlanDaemon runs two independently-specialized reasoning agents over the
//! same architectural problem, reconciles their proposals into one build
//! plan or escalates their disagreement for human adjudication, and
//! streams progress to a long-lived client connection.
//!
//! # Core Concepts
//!
//! - **Single-flight sessions**: one orchestrator run per session, enforced
//!   by an atomic claim in the session store
//! - **Fold, never throw**: expected agent failures become outcomes, so
//!   every attached client receives exactly one terminal event
//! - **Producer/consumer streaming**: the pipeline writes progress into a
//!   bounded channel; a disconnected client never cancels in-flight work
//!
//! # Modules
//!
//! - [`agents`] - gateway trait, normalized proposals, prompt templates
//! - [`orchestrator`] - the dual-agent pipeline and reconciliation
//! - [`progress`] - stage events flowing from pipeline to transport
//! - [`server`] - axum routes, SSE framing, session sweep
//! - [`config`] - configuration types and loading
//! - [`cli`] - command-line interface

pub mod agents;
pub mod cli;
pub mod config;
pub mod orchestrator;
pub mod progress;
pub mod server;

// Re-export commonly used types
pub use agents::{
    AgentError, AgentGateway, AgentKind, AuthSpec, BuildArchitecture, EntitySpec,
    HttpAgentGateway, InvokeBudget, PresentationSpec, PromptLibrary, Proposal, RouteSpec,
};
pub use config::{AgentsConfig, Config, PlanningConfig, ServerConfig, SessionConfig};
pub use orchestrator::{OrchestratorConfig, PlanningOrchestrator, PlanningOutcome};
pub use progress::ProgressEvent;
pub use server::{run_server, AppState, FrameKind, StreamFrame};
