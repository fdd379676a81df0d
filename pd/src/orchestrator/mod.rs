//! Planning orchestrator - drives both specialists and resolves one outcome
//!
//! One `execute` call produces exactly one [`PlanningOutcome`]. Expected
//! failures (agent timeouts, agent errors, malformed output) never escape;
//! they fold into the `Error` variant. Progress is reported into a bounded
//! channel at each stage boundary; a receiver that has gone away is
//! ignored, because a disconnected client is not a pipeline error.

pub mod reconcile;

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sessionstore::{AppConcept, CachedIntelligence, LayoutManifest};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::agents::{AgentError, AgentGateway, AgentKind, BuildArchitecture, InvokeBudget, Proposal};
use crate::progress::{stage, ProgressEvent};

/// Terminal result of one planning run
///
/// Produced and owned by the orchestrator, handed to the streaming
/// transport exactly once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PlanningOutcome {
    /// Fully reconciled build plan
    Complete {
        architecture: BuildArchitecture,
        /// Set when exactly one specialist survived; the plan is then
        /// single-sourced rather than cross-verified
        single_source: Option<AgentKind>,
    },
    /// Irreconcilable proposals, surfaced for human selection
    Escalation {
        reason: String,
        visual_proposal: Proposal,
        architecture_proposal: Proposal,
    },
    /// Terminal failure
    Error { error: String },
}

/// Tuning knobs for one orchestrator instance
///
/// The per-agent timeout must stay well under the run deadline, and the
/// run deadline under the host's wall-clock ceiling, or a wedged agent
/// call would starve the run of its terminal event.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Budget for each specialist invocation
    pub agent_timeout: Duration,
    /// Hard ceiling for the whole pipeline; exceeding it forces an Error
    pub run_deadline: Duration,
    /// Disagreement score at or above this escalates
    pub escalation_threshold: f64,
    /// Token budget per specialist invocation
    pub max_tokens: u32,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            agent_timeout: Duration::from_secs(120),
            run_deadline: Duration::from_secs(480),
            escalation_threshold: reconcile::DEFAULT_ESCALATION_THRESHOLD,
            max_tokens: 8192,
        }
    }
}

/// Drives the dual-agent pipeline for one session at a time
pub struct PlanningOrchestrator {
    gateway: Arc<dyn AgentGateway>,
    config: OrchestratorConfig,
}

impl PlanningOrchestrator {
    /// Create an orchestrator over the given gateway
    pub fn new(gateway: Arc<dyn AgentGateway>, config: OrchestratorConfig) -> Self {
        debug!(?config, "PlanningOrchestrator::new: called");
        Self { gateway, config }
    }

    /// Run the full pipeline to one outcome
    ///
    /// Never returns early on expected failures; the caller receives
    /// exactly one outcome, within the run deadline.
    pub async fn execute(
        &self,
        concept: AppConcept,
        manifest: LayoutManifest,
        cached: Option<CachedIntelligence>,
        progress: mpsc::Sender<ProgressEvent>,
    ) -> PlanningOutcome {
        debug!(app = %concept.name, cached = cached.is_some(), "execute: called");
        let deadline = self.config.run_deadline;
        match tokio::time::timeout(deadline, self.run(concept, manifest, cached, &progress)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(deadline_secs = deadline.as_secs(), "execute: run deadline exceeded");
                PlanningOutcome::Error {
                    error: format!(
                        "planning run exceeded its {}s deadline",
                        deadline.as_secs()
                    ),
                }
            }
        }
    }

    async fn run(
        &self,
        concept: AppConcept,
        manifest: LayoutManifest,
        cached: Option<CachedIntelligence>,
        progress: &mpsc::Sender<ProgressEvent>,
    ) -> PlanningOutcome {
        // Stage 1: resume check. Valid cached intelligence skips straight
        // past the specialist calls it already covers.
        let resumed = cached.as_ref().and_then(|c| validate_cached(c, &concept, &manifest));

        let (visual, architecture) = match resumed {
            Some((v, a)) => {
                self.emit(
                    progress,
                    ProgressEvent::new(stage::RESUMING, 0, "Resuming from cached intelligence"),
                )
                .await;
                (Ok(v), Ok(a))
            }
            None => {
                if cached.is_some() {
                    warn!("run: cached intelligence did not match this input; running full analysis");
                }
                // Stage 2: parallel fan-out to both specialists.
                self.emit(
                    progress,
                    ProgressEvent::new(
                        stage::ANALYZING,
                        0,
                        "Running visual and architecture analysis in parallel",
                    ),
                )
                .await;

                let budget = InvokeBudget {
                    max_tokens: self.config.max_tokens,
                    timeout: self.config.agent_timeout,
                };
                tokio::join!(
                    self.invoke_bounded(AgentKind::Visual, &concept, &manifest, budget),
                    self.invoke_bounded(AgentKind::Architecture, &concept, &manifest, budget),
                )
            }
        };

        self.emit(
            progress,
            ProgressEvent::with_details(
                stage::DRAFTING,
                40,
                "Specialist proposals collected",
                serde_json::json!({
                    "visual": if visual.is_ok() { "ok" } else { "failed" },
                    "architecture": if architecture.is_ok() { "ok" } else { "failed" },
                }),
            ),
        )
        .await;

        // Stages 3 and 4: reconcile and decide.
        match (visual, architecture) {
            (Err(v), Err(a)) => {
                warn!(visual_error = %v, architecture_error = %a, "run: both specialists failed");
                PlanningOutcome::Error {
                    error: format!("both specialists failed: visual: {v}; architecture: {a}"),
                }
            }
            (Ok(proposal), Err(e)) => {
                self.single_source_fallback(progress, &concept, proposal, AgentKind::Visual, &e)
                    .await
            }
            (Err(e), Ok(proposal)) => {
                self.single_source_fallback(progress, &concept, proposal, AgentKind::Architecture, &e)
                    .await
            }
            (Ok(visual), Ok(architecture)) => {
                let comparisons = reconcile::compare(&visual, &architecture);
                let score = reconcile::disagreement_score(&comparisons);
                self.emit(
                    progress,
                    ProgressEvent::with_details(
                        stage::RECONCILING,
                        80,
                        "Comparing proposals across structural axes",
                        serde_json::json!({ "score": score }),
                    ),
                )
                .await;

                if score < self.config.escalation_threshold {
                    debug!(score, "run: proposals reconcile, merging");
                    PlanningOutcome::Complete {
                        architecture: reconcile::merge(&concept.name, &visual, &architecture),
                        single_source: None,
                    }
                } else {
                    debug!(score, "run: disagreement above threshold, escalating");
                    PlanningOutcome::Escalation {
                        reason: reconcile::escalation_reason(&comparisons),
                        visual_proposal: visual,
                        architecture_proposal: architecture,
                    }
                }
            }
        }
    }

    /// One specialist failed; complete from the survivor, downgraded to
    /// single-sourced rather than silently presented as reconciled
    async fn single_source_fallback(
        &self,
        progress: &mpsc::Sender<ProgressEvent>,
        concept: &AppConcept,
        proposal: Proposal,
        survivor: AgentKind,
        failure: &AgentError,
    ) -> PlanningOutcome {
        warn!(%survivor, error = %failure, "run: one specialist failed, falling back to survivor");
        self.emit(
            progress,
            ProgressEvent::new(
                stage::RECONCILING,
                80,
                "Only one proposal available; skipping reconciliation",
            ),
        )
        .await;
        PlanningOutcome::Complete {
            architecture: reconcile::from_single(&concept.name, &proposal),
            single_source: Some(survivor),
        }
    }

    /// Invoke one specialist under its own timeout
    async fn invoke_bounded(
        &self,
        kind: AgentKind,
        concept: &AppConcept,
        manifest: &LayoutManifest,
        budget: InvokeBudget,
    ) -> Result<Proposal, AgentError> {
        match tokio::time::timeout(
            budget.timeout,
            self.gateway.invoke(kind, concept, manifest, budget),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => {
                warn!(%kind, timeout_secs = budget.timeout.as_secs(), "invoke_bounded: specialist timed out");
                Err(AgentError::Timeout(budget.timeout))
            }
        }
    }

    /// Send a progress event, ignoring a dropped receiver
    async fn emit(&self, progress: &mpsc::Sender<ProgressEvent>, event: ProgressEvent) {
        debug!(stage = %event.stage, progress = event.progress, "emit: stage boundary");
        if progress.send(event).await.is_err() {
            debug!("emit: progress receiver dropped, continuing");
        }
    }
}

/// Check cached intelligence against this exact input pair
///
/// Valid means the fingerprint matches and both cached proposals still
/// parse as normalized proposals.
fn validate_cached(
    cached: &CachedIntelligence,
    concept: &AppConcept,
    manifest: &LayoutManifest,
) -> Option<(Proposal, Proposal)> {
    if !cached.matches(concept, manifest) {
        return None;
    }
    let visual: Proposal = serde_json::from_value(cached.visual_proposal.clone()).ok()?;
    let architecture: Proposal = serde_json::from_value(cached.architecture_proposal.clone()).ok()?;
    Some((visual, architecture))
}
