//! Integration tests for the streaming transport
//!
//! These drive the real router over a bound listener and assert the wire
//! protocol: status codes, frame shape, terminal events, and session
//! cleanup.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use plandaemon::agents::{
    AgentError, AgentGateway, AgentKind, AuthSpec, EntitySpec, InvokeBudget, PresentationSpec,
    Proposal, RouteSpec,
};
use plandaemon::orchestrator::{OrchestratorConfig, PlanningOrchestrator};
use plandaemon::server::{router, AppState};
use sessionstore::{AppConcept, LayoutManifest, ScreenSpec, SessionStatus, SessionStore};

/// Scripted gateway for driving the server end-to-end
struct StubGateway {
    visual: Result<Proposal, String>,
    architecture: Result<Proposal, String>,
    calls: AtomicUsize,
}

impl StubGateway {
    fn new(visual: Result<Proposal, String>, architecture: Result<Proposal, String>) -> Self {
        Self {
            visual,
            architecture,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl AgentGateway for StubGateway {
    async fn invoke(
        &self,
        kind: AgentKind,
        _concept: &AppConcept,
        _manifest: &LayoutManifest,
        _budget: InvokeBudget,
    ) -> Result<Proposal, AgentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let result = match kind {
            AgentKind::Visual => &self.visual,
            AgentKind::Architecture => &self.architecture,
        };
        result.clone().map_err(AgentError::InvalidResponse)
    }
}

fn visual_proposal() -> Proposal {
    Proposal {
        summary: "Visual plan".to_string(),
        data_model: vec![EntitySpec {
            name: "Board".to_string(),
            fields: vec!["id".to_string()],
        }],
        auth: AuthSpec {
            strategy: "email-password".to_string(),
            roles: vec![],
        },
        integrations: vec![],
        routes: vec![RouteSpec {
            path: "/board".to_string(),
            screen: "Board".to_string(),
        }],
        presentation: PresentationSpec {
            layout_system: "kanban-grid".to_string(),
            theme: "light".to_string(),
            component_style: None,
        },
    }
}

fn architecture_proposal() -> Proposal {
    let mut p = visual_proposal();
    p.summary = "Architecture plan".to_string();
    p.data_model = vec![
        EntitySpec {
            name: "Board".to_string(),
            fields: vec!["id".to_string(), "owner_id".to_string()],
        },
        EntitySpec {
            name: "Card".to_string(),
            fields: vec!["id".to_string(), "board_id".to_string()],
        },
    ];
    p.presentation = PresentationSpec {
        layout_system: "plain".to_string(),
        theme: "default".to_string(),
        component_style: None,
    };
    p
}

fn concept() -> AppConcept {
    AppConcept {
        name: "taskboard".to_string(),
        description: "Kanban board for small teams".to_string(),
        features: vec!["boards".to_string()],
        technical_needs: vec![],
    }
}

fn manifest() -> LayoutManifest {
    LayoutManifest {
        screens: vec![ScreenSpec {
            name: "Board".to_string(),
            purpose: "Drag cards".to_string(),
            sections: vec![],
        }],
        navigation: "sidebar".to_string(),
        theme_hint: None,
    }
}

/// Bind the app on an ephemeral port; returns its base URL and the store
async fn spawn_app(gateway: Arc<StubGateway>) -> (String, Arc<SessionStore>) {
    let store = Arc::new(SessionStore::with_default_ttl());
    let orchestrator = Arc::new(PlanningOrchestrator::new(
        gateway,
        OrchestratorConfig {
            agent_timeout: Duration::from_secs(5),
            run_deadline: Duration::from_secs(10),
            ..OrchestratorConfig::default()
        },
    ));

    let app = router(AppState {
        store: store.clone(),
        orchestrator,
    });
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), store)
}

/// Extract every `data: <JSON>` frame payload from a finished stream body
fn parse_frames(body: &str) -> Vec<serde_json::Value> {
    body.lines()
        .filter_map(|line| line.strip_prefix("data: "))
        .map(|json| serde_json::from_str(json).expect("frame payload must be valid JSON"))
        .collect()
}

const KNOWN_TYPES: [&str; 4] = ["progress", "complete", "escalation", "error"];

#[tokio::test]
async fn test_missing_session_gets_404_and_no_run() {
    let gateway = Arc::new(StubGateway::new(
        Ok(visual_proposal()),
        Ok(architecture_proposal()),
    ));
    let (base, _store) = spawn_app(gateway.clone()).await;

    let response = reqwest::get(format!("{base}/sessions/missing/stream"))
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
    assert_eq!(
        response.headers()["content-type"],
        "text/event-stream"
    );

    let frames = parse_frames(&response.text().await.unwrap());
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0]["type"], "error");
    assert_eq!(frames[0]["data"]["progress"], 0);

    assert_eq!(gateway.calls.load(Ordering::SeqCst), 0, "no orchestrator run may start");
}

#[tokio::test]
async fn test_second_attach_gets_409_and_session_is_unaffected() {
    let gateway = Arc::new(StubGateway::new(
        Ok(visual_proposal()),
        Ok(architecture_proposal()),
    ));
    let (base, store) = spawn_app(gateway).await;

    store.create("s1", concept(), manifest(), None).await.unwrap();
    store.claim("s1").await.unwrap();

    let response = reqwest::get(format!("{base}/sessions/s1/stream")).await.unwrap();
    assert_eq!(response.status(), 409);

    let frames = parse_frames(&response.text().await.unwrap());
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0]["type"], "error");

    let session = store.get("s1").await.expect("session must survive the rejected attach");
    assert_eq!(session.status, SessionStatus::Running);
}

#[tokio::test]
async fn test_happy_path_streams_to_merged_complete() {
    let gateway = Arc::new(StubGateway::new(
        Ok(visual_proposal()),
        Ok(architecture_proposal()),
    ));
    let (base, store) = spawn_app(gateway).await;

    // Create through the ingress route
    let client = reqwest::Client::new();
    let created = client
        .post(format!("{base}/sessions"))
        .json(&serde_json::json!({
            "concept": concept(),
            "layout_manifest": manifest(),
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(created.status(), 201);
    let session_id = created.json::<serde_json::Value>().await.unwrap()["session_id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = client
        .get(format!("{base}/sessions/{session_id}/stream"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body = response.text().await.unwrap();
    let frames = parse_frames(&body);
    assert!(frames.len() >= 2);

    // Every frame carries a known type and a data object
    for frame in &frames {
        let kind = frame["type"].as_str().unwrap();
        assert!(KNOWN_TYPES.contains(&kind), "unknown frame type {kind}");
        assert!(frame["data"].is_object());
    }

    // Progress never regresses
    let mut last = 0i64;
    for frame in &frames {
        let progress = frame["data"]["progress"].as_i64().unwrap();
        assert!(progress >= last, "progress regressed: {body}");
        last = progress;
    }

    let stages: Vec<&str> = frames
        .iter()
        .map(|f| f["data"]["stage"].as_str().unwrap())
        .collect();
    assert_eq!(stages, vec!["analyzing", "drafting", "reconciling", "complete"]);

    // Terminal frame: merged architecture, structural axes from the
    // architecture specialist, presentation from the visual specialist
    let terminal = frames.last().unwrap();
    assert_eq!(terminal["type"], "complete");
    assert_eq!(terminal["data"]["progress"], 100);
    let architecture = &terminal["data"]["architecture"];
    assert_eq!(architecture["app_name"], "taskboard");
    assert_eq!(architecture["data_model"].as_array().unwrap().len(), 2);
    assert_eq!(architecture["presentation"]["layout_system"], "kanban-grid");
    assert!(terminal["data"].get("single_source").is_none());

    // Single-use: the session is gone once the terminal event is out
    assert!(store.get(&session_id).await.is_none());
}

#[tokio::test]
async fn test_auth_disagreement_streams_escalation() {
    let mut disagreeing = architecture_proposal();
    disagreeing.data_model = visual_proposal().data_model;
    disagreeing.auth.strategy = "oauth".to_string();

    let gateway = Arc::new(StubGateway::new(Ok(visual_proposal()), Ok(disagreeing)));
    let (base, store) = spawn_app(gateway).await;

    store.create("esc", concept(), manifest(), None).await.unwrap();

    let response = reqwest::get(format!("{base}/sessions/esc/stream")).await.unwrap();
    assert_eq!(response.status(), 200);

    let frames = parse_frames(&response.text().await.unwrap());
    let terminal = frames.last().unwrap();
    assert_eq!(terminal["type"], "escalation");
    assert_eq!(terminal["data"]["stage"], "escalated");
    assert_eq!(terminal["data"]["progress"], 80);
    assert!(terminal["data"]["reason"]
        .as_str()
        .unwrap()
        .contains("authentication"));
    assert_eq!(
        terminal["data"]["visual_proposal"]["auth"]["strategy"],
        "email-password"
    );
    assert_eq!(
        terminal["data"]["architecture_proposal"]["auth"]["strategy"],
        "oauth"
    );

    assert!(store.get("esc").await.is_none());
}

#[tokio::test]
async fn test_single_specialist_failure_is_flagged() {
    let gateway = Arc::new(StubGateway::new(
        Err("visual specialist unavailable".to_string()),
        Ok(architecture_proposal()),
    ));
    let (base, store) = spawn_app(gateway).await;

    store.create("solo", concept(), manifest(), None).await.unwrap();

    let response = reqwest::get(format!("{base}/sessions/solo/stream")).await.unwrap();
    let frames = parse_frames(&response.text().await.unwrap());

    let terminal = frames.last().unwrap();
    assert_eq!(terminal["type"], "complete");
    assert_eq!(terminal["data"]["single_source"], "architecture");

    assert!(store.get("solo").await.is_none());
}

#[tokio::test]
async fn test_both_failures_stream_error_and_release_session() {
    let gateway = Arc::new(StubGateway::new(
        Err("visual down".to_string()),
        Err("architecture down".to_string()),
    ));
    let (base, store) = spawn_app(gateway).await;

    store.create("bad", concept(), manifest(), None).await.unwrap();

    let response = reqwest::get(format!("{base}/sessions/bad/stream")).await.unwrap();
    assert_eq!(response.status(), 200, "terminal status is carried in-band");

    let frames = parse_frames(&response.text().await.unwrap());
    let terminal = frames.last().unwrap();
    assert_eq!(terminal["type"], "error");
    assert_eq!(terminal["data"]["progress"], 0);

    assert!(store.get("bad").await.is_none());
}

#[tokio::test]
async fn test_create_session_rejects_empty_concept_name() {
    let gateway = Arc::new(StubGateway::new(
        Ok(visual_proposal()),
        Ok(architecture_proposal()),
    ));
    let (base, _store) = spawn_app(gateway).await;

    let mut invalid = concept();
    invalid.name = "  ".to_string();

    let response = reqwest::Client::new()
        .post(format!("{base}/sessions"))
        .json(&serde_json::json!({
            "concept": invalid,
            "layout_manifest": manifest(),
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_create_session_rejects_duplicate_id() {
    let gateway = Arc::new(StubGateway::new(
        Ok(visual_proposal()),
        Ok(architecture_proposal()),
    ));
    let (base, _store) = spawn_app(gateway).await;

    let client = reqwest::Client::new();
    let body = serde_json::json!({
        "session_id": "dup",
        "concept": concept(),
        "layout_manifest": manifest(),
    });

    let first = client.post(format!("{base}/sessions")).json(&body).send().await.unwrap();
    assert_eq!(first.status(), 201);

    let second = client.post(format!("{base}/sessions")).json(&body).send().await.unwrap();
    assert_eq!(second.status(), 409);
}
