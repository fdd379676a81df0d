//! HTTP surface - session intake and the streaming endpoint
//!
//! The streaming endpoint is the product surface; session creation is a
//! thin ingress for the upstream intake flow and does no planning work of
//! its own. A background sweeper drops sessions that were created but
//! never attached.

mod frame;
mod stream;

pub use frame::{FrameKind, StreamFrame};

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use sessionstore::{AppConcept, CachedIntelligence, LayoutManifest, SessionStore, StoreError};
use tracing::{debug, info};
use uuid::Uuid;

use crate::orchestrator::PlanningOrchestrator;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SessionStore>,
    pub orchestrator: Arc<PlanningOrchestrator>,
}

/// Body for POST /sessions
#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    /// Caller-generated unique token; generated server-side when absent
    pub session_id: Option<String>,
    pub concept: AppConcept,
    pub layout_manifest: LayoutManifest,
    pub cached_intelligence: Option<CachedIntelligence>,
}

/// Response for POST /sessions
#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub session_id: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
}

/// Build the router over the given state
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/sessions", post(create_session))
        .route("/sessions/{id}/stream", get(stream::stream_session))
        .with_state(state)
}

/// Serve until the listener fails; also runs the periodic session sweep
pub async fn run_server(listen: &str, sweep_interval: Duration, state: AppState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .context("Failed to bind server listener")?;
    info!(%listen, "run_server: listening");

    tokio::spawn(sweep_loop(state.store.clone(), sweep_interval));

    axum::serve(listener, router(state))
        .await
        .context("Server terminated with error")
}

/// Periodically drop sessions that outlived the TTL without attaching
async fn sweep_loop(store: Arc<SessionStore>, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        ticker.tick().await;
        let dropped = store.sweep_expired(Utc::now()).await;
        if dropped > 0 {
            info!(dropped, "sweep_loop: dropped expired sessions");
        }
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// POST /sessions - ingress for the upstream intake flow
async fn create_session(
    State(state): State<AppState>,
    Json(request): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<CreateSessionResponse>), (StatusCode, Json<ErrorBody>)> {
    debug!("create_session: called");
    validate_request(&request)?;

    let session_id = request
        .session_id
        .unwrap_or_else(|| Uuid::now_v7().to_string());

    state
        .store
        .create(
            session_id.clone(),
            request.concept,
            request.layout_manifest,
            request.cached_intelligence,
        )
        .await
        .map_err(|e: StoreError| {
            (
                StatusCode::CONFLICT,
                Json(ErrorBody {
                    code: "conflict".to_string(),
                    message: e.to_string(),
                }),
            )
        })?;

    debug!(%session_id, "create_session: session created");
    Ok((StatusCode::CREATED, Json(CreateSessionResponse { session_id })))
}

fn validate_request(request: &CreateSessionRequest) -> Result<(), (StatusCode, Json<ErrorBody>)> {
    let problem = if request.concept.name.trim().is_empty() {
        Some("concept name must not be empty")
    } else if request.concept.description.trim().is_empty() {
        Some("concept description must not be empty")
    } else if request.layout_manifest.navigation.trim().is_empty() {
        Some("layout manifest navigation must not be empty")
    } else {
        None
    };

    match problem {
        Some(message) => Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorBody {
                code: "invalid_argument".to_string(),
                message: message.to_string(),
            }),
        )),
        None => Ok(()),
    }
}
