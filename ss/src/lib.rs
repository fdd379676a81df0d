//! SessionStore - in-process registry of in-flight planning sessions
//!
//! Planning sessions are ephemeral: created by the upstream intake flow,
//! claimed exactly once by a streaming connection, and deleted as soon as
//! they reach a terminal outcome. Nothing here survives a process restart
//! by design; see the plandaemon crate for the pipeline that consumes
//! these sessions.

pub mod store;
pub mod types;

pub use store::{ClaimError, SessionStore, StoreError, DEFAULT_TTL_SECS};
pub use types::{
    AppConcept, CachedIntelligence, LayoutManifest, PlanningSession, ScreenSpec, SessionStatus,
};
