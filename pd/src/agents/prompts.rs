//! Specialist prompt templates
//!
//! One Handlebars template per specialist, compiled into the binary. Both
//! templates instruct the agent to answer with a bare JSON object in the
//! normalized proposal shape.

use eyre::{Context, Result};
use handlebars::Handlebars;
use serde::Serialize;
use sessionstore::{AppConcept, LayoutManifest};
use tracing::debug;

use super::types::AgentKind;

/// Visual/UX specialist instructions
const VISUAL: &str = include_str!("../../prompts/visual.pmt");

/// Code architecture specialist instructions
const ARCHITECTURE: &str = include_str!("../../prompts/architecture.pmt");

/// Template input: the planning session's concept and manifest
#[derive(Debug, Serialize)]
struct PromptContext<'a> {
    concept: &'a AppConcept,
    manifest: &'a LayoutManifest,
}

/// Registry of rendered-per-call specialist prompts
pub struct PromptLibrary {
    registry: Handlebars<'static>,
}

impl PromptLibrary {
    /// Compile both embedded templates
    pub fn new() -> Result<Self> {
        debug!("PromptLibrary::new: called");
        let mut registry = Handlebars::new();
        registry
            .register_template_string(AgentKind::Visual.as_str(), VISUAL)
            .context("Failed to compile visual prompt template")?;
        registry
            .register_template_string(AgentKind::Architecture.as_str(), ARCHITECTURE)
            .context("Failed to compile architecture prompt template")?;
        Ok(Self { registry })
    }

    /// Render the prompt for one specialist invocation
    pub fn render(
        &self,
        kind: AgentKind,
        concept: &AppConcept,
        manifest: &LayoutManifest,
    ) -> Result<String> {
        debug!(%kind, "PromptLibrary::render: called");
        let context = PromptContext { concept, manifest };
        self.registry
            .render(kind.as_str(), &context)
            .context("Failed to render specialist prompt")
    }
}
