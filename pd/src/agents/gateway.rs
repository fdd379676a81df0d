//! Agent gateway - uniform interface to both specialist agents
//!
//! The orchestrator only sees this trait and the normalized [`Proposal`];
//! the production implementation talks to the upstream reasoning service
//! over HTTP with a bounded token/time budget per call.

use std::time::Duration;

use async_trait::async_trait;
use eyre::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use sessionstore::{AppConcept, LayoutManifest};
use tracing::{debug, warn};

use crate::config::AgentsConfig;

use super::error::AgentError;
use super::prompts::PromptLibrary;
use super::types::{AgentKind, InvokeBudget, Proposal};

/// Maximum number of attempts for transient errors
const MAX_RETRIES: u32 = 2;

/// Initial backoff delay between retries
const INITIAL_BACKOFF_MS: u64 = 500;

/// Uniform interface to invoke either specialist agent
#[async_trait]
pub trait AgentGateway: Send + Sync {
    /// Run one specialist over the planning input within the given budget
    async fn invoke(
        &self,
        kind: AgentKind,
        concept: &AppConcept,
        manifest: &LayoutManifest,
        budget: InvokeBudget,
    ) -> Result<Proposal, AgentError>;
}

/// Response envelope from the upstream agent service
#[derive(Debug, Deserialize)]
struct AgentReply {
    proposal: Proposal,
}

/// HTTP-backed gateway to the upstream reasoning service
pub struct HttpAgentGateway {
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    http: Client,
    prompts: PromptLibrary,
}

impl HttpAgentGateway {
    /// Create a gateway from configuration
    ///
    /// Reads the API key from the environment variable named in config.
    pub fn from_config(config: &AgentsConfig) -> Result<Self> {
        debug!(base_url = %config.base_url, model = %config.model, "HttpAgentGateway::from_config: called");
        let api_key = config.get_api_key()?;
        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            base_url: config.base_url.clone(),
            api_key,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            http,
            prompts: PromptLibrary::new()?,
        })
    }

    /// Build the request body for one invocation
    fn build_request_body(
        &self,
        prompt: String,
        concept: &AppConcept,
        manifest: &LayoutManifest,
        budget: InvokeBudget,
    ) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "max_tokens": budget.max_tokens.min(self.max_tokens),
            "concept": concept,
            "layout_manifest": manifest,
        })
    }
}

#[async_trait]
impl AgentGateway for HttpAgentGateway {
    async fn invoke(
        &self,
        kind: AgentKind,
        concept: &AppConcept,
        manifest: &LayoutManifest,
        budget: InvokeBudget,
    ) -> Result<Proposal, AgentError> {
        debug!(%kind, max_tokens = budget.max_tokens, "invoke: called");
        let prompt = self
            .prompts
            .render(kind, concept, manifest)
            .map_err(|e| AgentError::InvalidResponse(e.to_string()))?;

        let url = format!("{}/v1/agents/{}/invoke", self.base_url, kind);
        let body = self.build_request_body(prompt, concept, manifest, budget);

        let mut last_error = None;
        for attempt in 0..=MAX_RETRIES {
            if attempt > 0 {
                let backoff = INITIAL_BACKOFF_MS * 2u64.pow(attempt - 1);
                warn!(%kind, attempt, backoff_ms = backoff, "invoke: retrying after transient error");
                tokio::time::sleep(Duration::from_millis(backoff)).await;
            }

            let response = match self
                .http
                .post(&url)
                .header("x-api-key", &self.api_key)
                .timeout(budget.timeout)
                .json(&body)
                .send()
                .await
            {
                Ok(r) => r,
                Err(e) if e.is_timeout() => {
                    debug!(%kind, "invoke: request timed out");
                    return Err(AgentError::Timeout(budget.timeout));
                }
                Err(e) => {
                    debug!(%kind, attempt, error = %e, "invoke: network error");
                    last_error = Some(AgentError::Network(e));
                    continue;
                }
            };

            let status = response.status();
            if !status.is_success() {
                let message = response.text().await.unwrap_or_default();
                let error = AgentError::Api {
                    status: status.as_u16(),
                    message,
                };
                if error.is_retryable() {
                    debug!(%kind, status = status.as_u16(), "invoke: retryable API error");
                    last_error = Some(error);
                    continue;
                }
                return Err(error);
            }

            let reply: AgentReply = response.json().await.map_err(|e| {
                AgentError::InvalidResponse(format!("agent reply did not parse: {e}"))
            })?;
            debug!(%kind, "invoke: proposal received");
            return Ok(reply.proposal);
        }

        Err(last_error.unwrap_or_else(|| {
            AgentError::InvalidResponse("agent invocation failed without a response".to_string())
        }))
    }
}
