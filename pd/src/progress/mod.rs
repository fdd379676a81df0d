//! Progress events for one planning run
//!
//! The orchestrator emits one event per stage boundary into a bounded
//! channel; the streaming transport frames them for the wire. Stage slugs
//! are stable strings - clients and tests match on them, not on the prose
//! messages.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Stable stage slugs
pub mod stage {
    /// Cached intelligence accepted, specialist calls skipped
    pub const RESUMING: &str = "resuming";
    /// Both specialists running in parallel
    pub const ANALYZING: &str = "analyzing";
    /// Specialist proposals collected
    pub const DRAFTING: &str = "drafting";
    /// Weighted axis comparison in progress
    pub const RECONCILING: &str = "reconciling";
    /// Terminal: reconciled build plan ready
    pub const COMPLETE: &str = "complete";
    /// Terminal: irreconcilable disagreement, human choice required
    pub const ESCALATED: &str = "escalated";
    /// Terminal: planning failed
    pub const ERROR: &str = "error";
}

/// One progress report from the pipeline
///
/// Percent is monotonically non-decreasing within a run, except that an
/// error event reports 0 regardless of prior progress - an abort overrides
/// progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// Stage slug (see [`stage`])
    pub stage: String,
    /// Percent complete in [0, 100]
    pub progress: u8,
    /// Human-readable description of the stage
    pub message: String,
    /// Optional structured payload (terminal events carry their result here)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ProgressEvent {
    /// Create an event without details
    pub fn new(stage: &str, progress: u8, message: impl Into<String>) -> Self {
        Self {
            stage: stage.to_string(),
            progress,
            message: message.into(),
            details: None,
        }
    }

    /// Create an event carrying a structured payload
    pub fn with_details(stage: &str, progress: u8, message: impl Into<String>, details: Value) -> Self {
        Self {
            stage: stage.to_string(),
            progress,
            message: message.into(),
            details: Some(details),
        }
    }

    /// Whether this event ends the run
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.stage.as_str(),
            stage::COMPLETE | stage::ESCALATED | stage::ERROR
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_without_details_omits_field() {
        let event = ProgressEvent::new(stage::ANALYZING, 0, "Running analysis");
        let json = serde_json::to_string(&event).unwrap();
        assert!(!json.contains("details"));
        assert!(json.contains("\"stage\":\"analyzing\""));
        assert!(json.contains("\"progress\":0"));
    }

    #[test]
    fn test_event_with_details_roundtrip() {
        let event = ProgressEvent::with_details(
            stage::RECONCILING,
            80,
            "Comparing proposals",
            serde_json::json!({ "score": 0.12 }),
        );
        let json = serde_json::to_string(&event).unwrap();
        let parsed: ProgressEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.stage, "reconciling");
        assert_eq!(parsed.progress, 80);
        assert_eq!(parsed.details.unwrap()["score"], 0.12);
    }

    #[test]
    fn test_terminal_stages() {
        assert!(ProgressEvent::new(stage::COMPLETE, 100, "done").is_terminal());
        assert!(ProgressEvent::new(stage::ESCALATED, 80, "split").is_terminal());
        assert!(ProgressEvent::new(stage::ERROR, 0, "failed").is_terminal());
        assert!(!ProgressEvent::new(stage::ANALYZING, 0, "working").is_terminal());
        assert!(!ProgressEvent::new(stage::RESUMING, 0, "cache hit").is_terminal());
    }
}
