//! Normalized specialist proposal types
//!
//! Both reasoning agents are invoked as opaque request/response services;
//! whatever they return is normalized into [`Proposal`] so the rest of the
//! pipeline compares and merges along fixed axes instead of depending on
//! agent-specific shapes.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Which specialist agent to invoke
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
    /// Tuned for visual/UX interpretation
    Visual,
    /// Tuned for structural/code architecture
    Architecture,
}

impl AgentKind {
    /// Slug used in URLs and log fields
    pub fn as_str(self) -> &'static str {
        match self {
            AgentKind::Visual => "visual",
            AgentKind::Architecture => "architecture",
        }
    }
}

impl std::fmt::Display for AgentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Token/time budget for one specialist invocation
#[derive(Debug, Clone, Copy)]
pub struct InvokeBudget {
    pub max_tokens: u32,
    pub timeout: Duration,
}

/// One entity in a proposed data model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySpec {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<String>,
}

/// Proposed authentication/authorization approach
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSpec {
    /// Strategy slug ("none", "email-password", "oauth", "magic-link", ...)
    pub strategy: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

/// One route in the proposed navigation shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSpec {
    pub path: String,
    pub screen: String,
}

/// Proposed presentational decisions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresentationSpec {
    pub layout_system: String,
    pub theme: String,
    #[serde(default)]
    pub component_style: Option<String>,
}

/// One agent's structural plan, comparable along fixed axes
///
/// The four structural axes (data model, auth, integrations, routes) drive
/// reconciliation; presentation is merged from the visual specialist and
/// never escalates on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    pub summary: String,
    #[serde(default)]
    pub data_model: Vec<EntitySpec>,
    pub auth: AuthSpec,
    #[serde(default)]
    pub integrations: Vec<String>,
    #[serde(default)]
    pub routes: Vec<RouteSpec>,
    pub presentation: PresentationSpec,
}

/// The fully reconciled build plan, consumable by downstream code generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildArchitecture {
    pub app_name: String,
    pub summary: String,
    pub data_model: Vec<EntitySpec>,
    pub auth: AuthSpec,
    pub integrations: Vec<String>,
    pub routes: Vec<RouteSpec>,
    pub presentation: PresentationSpec,
}
