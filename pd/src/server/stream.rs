//! Streaming endpoint - one orchestrator run per attached connection
//!
//! The handler claims the session (the single-flight step), spawns the
//! orchestrator as a detached producer task, and returns the read side of
//! a bounded channel framed as SSE. The producer owns session cleanup, so
//! a client that disconnects mid-run neither cancels the in-flight agent
//! calls nor leaks the session.

use std::convert::Infallible;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use futures::FutureExt;
use sessionstore::{ClaimError, PlanningSession, SessionStatus, SessionStore};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::orchestrator::{PlanningOrchestrator, PlanningOutcome};
use crate::progress::{stage, ProgressEvent};

use super::frame::StreamFrame;
use super::AppState;

/// Progress events buffered between producer and the network writer
const PROGRESS_CHANNEL_CAPACITY: usize = 32;

/// Idle keep-alive interval for open streams
const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(10);

/// GET /sessions/{id}/stream
pub async fn stream_session(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    debug!(%id, "stream_session: called");
    match state.store.claim(&id).await {
        Err(ClaimError::NotFound { .. }) => {
            debug!(%id, "stream_session: session not found");
            single_frame_response(
                StatusCode::NOT_FOUND,
                &ProgressEvent::new(stage::ERROR, 0, "Planning session not found or expired"),
            )
        }
        Err(ClaimError::AlreadyRunning { .. }) => {
            debug!(%id, "stream_session: session already running");
            single_frame_response(
                StatusCode::CONFLICT,
                &ProgressEvent::new(stage::ERROR, 0, "Planning session is already running"),
            )
        }
        Ok(session) => {
            let (tx, rx) = mpsc::channel(PROGRESS_CHANNEL_CAPACITY);
            tokio::spawn(run_planning(
                state.store.clone(),
                state.orchestrator.clone(),
                session,
                tx,
            ));
            event_stream_response(rx)
        }
    }
}

/// Detached producer: drive the orchestrator, emit the terminal event,
/// and clean up the session no matter what
async fn run_planning(
    store: Arc<SessionStore>,
    orchestrator: Arc<PlanningOrchestrator>,
    session: PlanningSession,
    tx: mpsc::Sender<ProgressEvent>,
) {
    let id = session.id.clone();
    debug!(%id, "run_planning: starting pipeline");

    // A panic inside the pipeline is a programming fault; the client still
    // gets a terminal error event instead of a bare connection drop.
    let outcome = AssertUnwindSafe(orchestrator.execute(
        session.concept,
        session.layout_manifest,
        session.cached_intelligence,
        tx.clone(),
    ))
    .catch_unwind()
    .await
    .unwrap_or_else(|_| {
        warn!(%id, "run_planning: pipeline panicked");
        PlanningOutcome::Error {
            error: "planning pipeline fault".to_string(),
        }
    });

    let (event, status) = terminal_event(&outcome);

    // Release the session before the terminal event goes out: by the time
    // a client observes the final frame, the session is already gone. The
    // session is single-use either way.
    store.set_status(&id, status).await;
    store.delete(&id).await;

    if tx.send(event).await.is_err() {
        // Client disconnected; the outcome is discarded. The session was
        // released above regardless.
        debug!(%id, "run_planning: client gone before terminal event");
    }
    debug!(%id, "run_planning: session released");
}

/// Build the terminal event and final session status for an outcome
fn terminal_event(outcome: &PlanningOutcome) -> (ProgressEvent, SessionStatus) {
    match outcome {
        PlanningOutcome::Complete {
            architecture,
            single_source,
        } => {
            let mut details = serde_json::json!({
                "architecture": architecture,
            });
            if let Some(kind) = single_source {
                details["single_source"] = serde_json::json!(kind);
            }
            (
                ProgressEvent::with_details(stage::COMPLETE, 100, "Planning complete", details),
                SessionStatus::Complete,
            )
        }
        // Escalation is a valid terminal state, not a failure
        PlanningOutcome::Escalation {
            reason,
            visual_proposal,
            architecture_proposal,
        } => (
            ProgressEvent::with_details(
                stage::ESCALATED,
                80,
                "Specialists disagree; manual selection required",
                serde_json::json!({
                    "reason": reason,
                    "visual_proposal": visual_proposal,
                    "architecture_proposal": architecture_proposal,
                }),
            ),
            SessionStatus::Complete,
        ),
        PlanningOutcome::Error { error } => (
            ProgressEvent::new(stage::ERROR, 0, error.clone()),
            SessionStatus::Error,
        ),
    }
}

/// Open SSE response fed from the progress channel
///
/// The stream ends when the producer drops its sender, which only happens
/// after the terminal event was queued. A disconnected client just drops
/// this stream; the producer keeps running.
fn event_stream_response(mut rx: mpsc::Receiver<ProgressEvent>) -> Response {
    let events = async_stream::stream! {
        while let Some(event) = rx.recv().await {
            let frame = StreamFrame::from_event(&event);
            let terminal = event.is_terminal();
            yield Ok::<_, Infallible>(SseEvent::default().data(frame.json()));
            if terminal {
                break;
            }
        }
    };

    Sse::new(events)
        .keep_alive(
            KeepAlive::new()
                .interval(KEEPALIVE_INTERVAL)
                .text("keepalive"),
        )
        .into_response()
}

/// Error response carrying exactly one SSE frame (404 / 409 paths)
fn single_frame_response(status: StatusCode, event: &ProgressEvent) -> Response {
    let body = StreamFrame::from_event(event).encode();
    (
        status,
        [(header::CONTENT_TYPE, "text/event-stream")],
        body,
    )
        .into_response()
}
