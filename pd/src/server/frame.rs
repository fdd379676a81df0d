//! Wire framing for the event stream
//!
//! Every event crosses the wire as one SSE frame, `data: <JSON>\n\n`. The
//! JSON envelope is `{ "type": ..., "data": { stage, progress, message,
//! ...variant-specific fields } }`; variant-specific fields are flattened
//! into `data` from the event's details.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::progress::{stage, ProgressEvent};

/// The four frame types clients can receive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameKind {
    Progress,
    Complete,
    Escalation,
    Error,
}

impl FrameKind {
    /// Map a stage slug to its frame type; non-terminal stages are progress
    pub fn from_stage(stage_slug: &str) -> Self {
        match stage_slug {
            stage::COMPLETE => FrameKind::Complete,
            stage::ESCALATED => FrameKind::Escalation,
            stage::ERROR => FrameKind::Error,
            _ => FrameKind::Progress,
        }
    }
}

/// One framed event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamFrame {
    #[serde(rename = "type")]
    pub kind: FrameKind,
    pub data: Value,
}

impl StreamFrame {
    /// Frame a progress event for the wire
    ///
    /// Object-shaped details are merged into `data` next to stage,
    /// progress, and message; any other details shape lands under a
    /// `details` key.
    pub fn from_event(event: &ProgressEvent) -> Self {
        let mut data = serde_json::json!({
            "stage": event.stage,
            "progress": event.progress,
            "message": event.message,
        });
        match &event.details {
            Some(Value::Object(map)) => {
                for (key, value) in map {
                    data[key] = value.clone();
                }
            }
            Some(other) => data["details"] = other.clone(),
            None => {}
        }
        Self {
            kind: FrameKind::from_stage(&event.stage),
            data,
        }
    }

    /// The JSON payload (without SSE framing)
    pub fn json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// The full SSE frame, `data: <JSON>\n\n`
    pub fn encode(&self) -> String {
        format!("data: {}\n\n", self.json())
    }
}
