//! Specialist agent gateway module
//!
//! Provides the trait boundary to the two reasoning agents, the normalized
//! proposal types they produce, and the embedded prompt templates.

mod error;
mod gateway;
mod prompts;
mod types;

pub use error::AgentError;
pub use gateway::{AgentGateway, HttpAgentGateway};
#[cfg(test)]
pub use gateway::mock;
pub use prompts::PromptLibrary;
pub use types::{
    AgentKind, AuthSpec, BuildArchitecture, EntitySpec, InvokeBudget, PresentationSpec, Proposal,
    RouteSpec,
};
