//! Planning session domain types
//!
//! These types carry the input to one planning attempt: the structured app
//! concept, the visual/UX hints gathered earlier in the product flow, and
//! optionally the intelligence computed by a previous attempt so a retried
//! session can skip the specialist calls it already paid for.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Structured description of the application to be planned
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConcept {
    /// Working name of the application
    pub name: String,
    /// One-paragraph description of what the app does
    pub description: String,
    /// Feature list, one entry per user-facing capability
    #[serde(default)]
    pub features: Vec<String>,
    /// Technical needs surfaced during intake (e.g. "file uploads")
    #[serde(default)]
    pub technical_needs: Vec<String>,
}

/// One screen in the desired visual structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenSpec {
    pub name: String,
    pub purpose: String,
    #[serde(default)]
    pub sections: Vec<String>,
}

/// Structured description of the desired visual/UX structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutManifest {
    #[serde(default)]
    pub screens: Vec<ScreenSpec>,
    /// Navigation style hint ("sidebar", "topbar", "tabs", ...)
    pub navigation: String,
    #[serde(default)]
    pub theme_hint: Option<String>,
}

/// Previously computed specialist output, reusable by a retried session
///
/// The proposals are carried as raw JSON because they originate outside the
/// store (the upstream intake flow hands them back verbatim). The pipeline
/// validates them structurally before trusting them; the fingerprint ties
/// them to the exact (concept, manifest) pair they were computed for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedIntelligence {
    /// Fingerprint of the input pair this intelligence was computed for
    pub fingerprint: String,
    /// The visual specialist's proposal, verbatim
    pub visual_proposal: serde_json::Value,
    /// The architecture specialist's proposal, verbatim
    pub architecture_proposal: serde_json::Value,
}

impl CachedIntelligence {
    /// Compute the fingerprint for an input pair
    ///
    /// Stable within one process lifetime, which is all the store promises:
    /// sessions never outlive the process.
    pub fn fingerprint_of(concept: &AppConcept, manifest: &LayoutManifest) -> String {
        let concept_json = serde_json::to_string(concept).unwrap_or_default();
        let manifest_json = serde_json::to_string(manifest).unwrap_or_default();
        let mut hasher = DefaultHasher::new();
        concept_json.hash(&mut hasher);
        manifest_json.hash(&mut hasher);
        format!("{:016x}", hasher.finish())
    }

    /// Check whether this intelligence matches the given input pair
    pub fn matches(&self, concept: &AppConcept, manifest: &LayoutManifest) -> bool {
        self.fingerprint == Self::fingerprint_of(concept, manifest)
    }
}

/// Lifecycle status of a planning session
///
/// `Running` doubles as the single-flight lock: a session can only be
/// claimed while it is not already running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Pending,
    Running,
    Complete,
    Error,
}

impl SessionStatus {
    /// Terminal statuses precede deletion; the session is single-use
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionStatus::Complete | SessionStatus::Error)
    }
}

/// One in-flight planning attempt
///
/// Mutable only through `status`, and only via the store's operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanningSession {
    pub id: String,
    pub concept: AppConcept,
    pub layout_manifest: LayoutManifest,
    pub cached_intelligence: Option<CachedIntelligence>,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
}

impl PlanningSession {
    /// Create a pending session timestamped now
    pub fn new(
        id: impl Into<String>,
        concept: AppConcept,
        layout_manifest: LayoutManifest,
        cached_intelligence: Option<CachedIntelligence>,
    ) -> Self {
        Self {
            id: id.into(),
            concept,
            layout_manifest,
            cached_intelligence,
            status: SessionStatus::Pending,
            created_at: Utc::now(),
        }
    }
}
