//! Concurrent session registry with single-flight claims
//!
//! All mutations go through one mutex so a claim (check status, set
//! Running) is a single atomic step. Two connections racing on the same
//! session id therefore cannot both begin execution. The store is
//! single-process on purpose; multi-instance deployment means swapping
//! this for a shared store with compare-and-set, behind the same API.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

use crate::types::{AppConcept, CachedIntelligence, LayoutManifest, PlanningSession, SessionStatus};

/// Default session time-to-live in seconds (sessions that are never
/// attached get swept after this)
pub const DEFAULT_TTL_SECS: i64 = 3600;

/// Errors surfaced to callers of `create`
///
/// Ids are caller-generated unique tokens, so a duplicate id is a caller
/// bug, not something the store retries around.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("session '{id}' already exists")]
    DuplicateId { id: String },
}

/// Errors surfaced to callers of `claim`
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClaimError {
    #[error("session '{id}' not found")]
    NotFound { id: String },

    #[error("session '{id}' is already running")]
    AlreadyRunning { id: String },
}

/// Keyed registry of in-flight planning sessions
pub struct SessionStore {
    sessions: Mutex<HashMap<String, PlanningSession>>,
    ttl: Duration,
}

impl SessionStore {
    /// Create a store with the given session time-to-live
    pub fn new(ttl: Duration) -> Self {
        debug!(ttl_secs = ttl.num_seconds(), "SessionStore::new: called");
        Self {
            sessions: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Create a store with the default one-hour time-to-live
    pub fn with_default_ttl() -> Self {
        Self::new(Duration::seconds(DEFAULT_TTL_SECS))
    }

    /// Insert a new pending session
    ///
    /// Sweeps expired sessions opportunistically first, so an abandoned id
    /// can be reused after its TTL without waiting for the periodic sweep.
    pub async fn create(
        &self,
        id: impl Into<String>,
        concept: AppConcept,
        layout_manifest: LayoutManifest,
        cached_intelligence: Option<CachedIntelligence>,
    ) -> Result<(), StoreError> {
        let id = id.into();
        debug!(%id, "SessionStore::create: called");

        let mut sessions = self.sessions.lock().await;
        let now = Utc::now();
        sessions.retain(|_, s| now - s.created_at <= self.ttl);

        if sessions.contains_key(&id) {
            debug!(%id, "SessionStore::create: duplicate id");
            return Err(StoreError::DuplicateId { id });
        }

        let session = PlanningSession::new(id.clone(), concept, layout_manifest, cached_intelligence);
        sessions.insert(id, session);
        Ok(())
    }

    /// Fetch a snapshot of a session
    pub async fn get(&self, id: &str) -> Option<PlanningSession> {
        let sessions = self.sessions.lock().await;
        sessions.get(id).cloned()
    }

    /// Update a session's status; no-op if the session was already deleted
    pub async fn set_status(&self, id: &str, status: SessionStatus) {
        debug!(%id, ?status, "SessionStore::set_status: called");
        let mut sessions = self.sessions.lock().await;
        match sessions.get_mut(id) {
            Some(session) => session.status = status,
            None => debug!(%id, "SessionStore::set_status: session gone, ignoring"),
        }
    }

    /// Delete a session; idempotent
    pub async fn delete(&self, id: &str) {
        debug!(%id, "SessionStore::delete: called");
        let mut sessions = self.sessions.lock().await;
        sessions.remove(id);
    }

    /// Atomically claim a session for execution
    ///
    /// This is the single-flight primitive: checking the status and setting
    /// it to Running happen under one lock acquisition, so of two racing
    /// attach attempts exactly one wins. Returns a snapshot taken at claim
    /// time.
    pub async fn claim(&self, id: &str) -> Result<PlanningSession, ClaimError> {
        debug!(%id, "SessionStore::claim: called");
        let mut sessions = self.sessions.lock().await;

        let session = sessions.get_mut(id).ok_or_else(|| ClaimError::NotFound {
            id: id.to_string(),
        })?;

        if session.status == SessionStatus::Running {
            debug!(%id, "SessionStore::claim: already running, rejecting");
            return Err(ClaimError::AlreadyRunning { id: id.to_string() });
        }

        session.status = SessionStatus::Running;
        Ok(session.clone())
    }

    /// Delete every session older than the TTL; returns how many were dropped
    pub async fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, s| now - s.created_at <= self.ttl);
        let dropped = before - sessions.len();
        if dropped > 0 {
            debug!(dropped, "SessionStore::sweep_expired: dropped expired sessions");
        }
        dropped
    }

    /// Number of sessions currently held
    pub async fn count(&self) -> usize {
        self.sessions.lock().await.len()
    }
}
