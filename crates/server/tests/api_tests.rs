use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum_test::TestServer;
use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use autofix_core::PhaseSpec;
use db::WorkflowRepository;
use engine::{
    AgentClient, EngineError, PhaseContext, PhaseExecutor, Pipeline, StandardDeps, WorkflowEngine,
    WorkspaceManager,
};
use events::EventBus;
use jira::JiraClient;
use server::{create_router, state::AppState};

enum Script {
    Succeed,
    FailThenSucceed,
    Slow(Duration),
}

struct StubExecutor {
    name: &'static str,
    script: Script,
    calls: std::sync::atomic::AtomicUsize,
}

impl StubExecutor {
    fn new(name: &'static str, script: Script) -> Arc<Self> {
        Arc::new(Self {
            name,
            script,
            calls: std::sync::atomic::AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl PhaseExecutor for StubExecutor {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn execute(&self, _ctx: &PhaseContext) -> engine::Result<Value> {
        let call = self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        match &self.script {
            Script::Succeed => Ok(json!({"phase": self.name})),
            Script::FailThenSucceed if call == 0 => {
                Err(EngineError::Agent("transient failure".to_string()))
            }
            Script::FailThenSucceed => Ok(json!({"phase": self.name, "retried": true})),
            Script::Slow(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(json!({"phase": self.name}))
            }
        }
    }
}

fn gated_specs() -> Vec<PhaseSpec> {
    vec![
        PhaseSpec::new("first", "First"),
        PhaseSpec::gated("second", "Second", "Review the output of phase two."),
        PhaseSpec::new("third", "Third"),
    ]
}

fn gated_executors() -> Vec<Arc<dyn PhaseExecutor>> {
    vec![
        StubExecutor::new("first", Script::Succeed),
        StubExecutor::new("second", Script::Succeed),
        StubExecutor::new("third", Script::Succeed),
    ]
}

async fn setup_server_with(
    specs: Vec<PhaseSpec>,
    executors: Vec<Arc<dyn PhaseExecutor>>,
) -> (TestServer, TempDir) {
    let workspace_root = TempDir::new().expect("Failed to create temp dir");

    let pool = db::create_pool("sqlite::memory:")
        .await
        .expect("Failed to create pool");
    db::run_migrations(&pool).await.expect("Failed to run migrations");

    let repository = Arc::new(WorkflowRepository::new(pool));
    let event_bus = EventBus::new();
    let pipeline = Pipeline::new(specs, executors).expect("Failed to build pipeline");
    let engine = Arc::new(WorkflowEngine::new(
        Arc::clone(&repository),
        pipeline,
        event_bus.clone(),
        workspace_root.path(),
    ));

    let state = AppState::new(engine, repository, event_bus);
    let server = TestServer::new(create_router(state)).expect("Failed to create test server");

    (server, workspace_root)
}

async fn setup_gated_server() -> (TestServer, TempDir) {
    setup_server_with(gated_specs(), gated_executors()).await
}

async fn start_session(server: &TestServer) -> String {
    let response = server
        .post("/api/workflows")
        .json(&json!({"issue_key": "SCRUM-1", "repo_url": "https://github.com/acme/app"}))
        .await;

    response.assert_status(axum::http::StatusCode::CREATED);
    let body: Value = response.json();
    body["state"]["id"].as_str().unwrap().to_string()
}

mod health {
    use super::*;

    #[tokio::test]
    async fn test_health_endpoint() {
        let (server, _root) = setup_gated_server().await;

        let response = server.get("/health").await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["status"], "ok");
    }
}

mod start {
    use super::*;

    #[tokio::test]
    async fn test_start_returns_created_state() {
        let (server, _root) = setup_gated_server().await;

        let response = server
            .post("/api/workflows")
            .json(&json!({"issue_key": "SCRUM-9"}))
            .await;

        response.assert_status(axum::http::StatusCode::CREATED);
        let body: Value = response.json();
        assert_eq!(body["status"], "started");
        assert_eq!(body["state"]["status"], "created");
        assert_eq!(body["state"]["current_phase_index"], 0);
        assert_eq!(body["state"]["issue_key"], "SCRUM-9");
        assert_eq!(body["state"]["phases"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_start_with_empty_issue_key_fails() {
        let (server, _root) = setup_gated_server().await;

        let response = server
            .post("/api/workflows")
            .json(&json!({"issue_key": "   "}))
            .await;

        response.assert_status_bad_request();
        let body: Value = response.json();
        assert_eq!(body["error"], "invalid_input");
    }

    #[tokio::test]
    async fn test_start_with_blank_repo_url_fails() {
        let (server, _root) = setup_gated_server().await;

        let response = server
            .post("/api/workflows")
            .json(&json!({"issue_key": "SCRUM-1", "repo_url": ""}))
            .await;

        response.assert_status_bad_request();
    }

    #[tokio::test]
    async fn test_invalid_start_creates_no_session() {
        let (server, _root) = setup_gated_server().await;

        server
            .post("/api/workflows")
            .json(&json!({"issue_key": ""}))
            .await;

        let list: Value = server.get("/api/workflows").await.json();
        assert!(list.as_array().unwrap().is_empty());
    }
}

mod lifecycle {
    use super::*;

    #[tokio::test]
    async fn test_gated_pipeline_end_to_end() {
        let (server, _root) = setup_gated_server().await;
        let id = start_session(&server).await;

        // Phase 1: ungated, advances.
        let response = server.post(&format!("/api/workflows/{}/run", id)).await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["status"], "success");
        assert_eq!(body["state"]["status"], "running");
        assert_eq!(body["state"]["current_phase_index"], 1);

        // Phase 2: gated, holds with the configured message.
        let response = server.post(&format!("/api/workflows/{}/run", id)).await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["status"], "awaiting_approval");
        assert_eq!(body["message"], "Review the output of phase two.");
        assert_eq!(body["state"]["current_phase_index"], 1);
        assert_eq!(body["state"]["pending_approval_index"], 1);
        assert_eq!(body["state"]["phases"][1]["status"], "awaiting_approval");
        assert!(body["state"]["phases"][1]["result"].is_object());

        // A second run while gated is rejected.
        let response = server.post(&format!("/api/workflows/{}/run", id)).await;
        response.assert_status(axum::http::StatusCode::CONFLICT);
        let body: Value = response.json();
        assert_eq!(body["error"], "invalid_transition");

        // Approve closes the gate and advances.
        let response = server.post(&format!("/api/workflows/{}/approve", id)).await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["status"], "success");
        assert_eq!(body["state"]["status"], "running");
        assert_eq!(body["state"]["current_phase_index"], 2);
        assert_eq!(body["state"]["phases"][1]["status"], "approved");

        // Final phase completes the session.
        let response = server.post(&format!("/api/workflows/{}/run", id)).await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["state"]["status"], "completed");
        assert_eq!(body["state"]["current_phase_index"], 3);

        // Completed sessions reject run and approve alike.
        server
            .post(&format!("/api/workflows/{}/run", id))
            .await
            .assert_status(axum::http::StatusCode::CONFLICT);
        server
            .post(&format!("/api/workflows/{}/approve", id))
            .await
            .assert_status(axum::http::StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_approve_without_open_gate_conflicts() {
        let (server, _root) = setup_gated_server().await;
        let id = start_session(&server).await;

        let response = server.post(&format!("/api/workflows/{}/approve", id)).await;

        response.assert_status(axum::http::StatusCode::CONFLICT);
        let body: Value = response.json();
        assert_eq!(body["error"], "invalid_transition");
    }

    #[tokio::test]
    async fn test_get_reflects_server_state() {
        let (server, _root) = setup_gated_server().await;
        let id = start_session(&server).await;

        server.post(&format!("/api/workflows/{}/run", id)).await;

        let response = server.get(&format!("/api/workflows/{}", id)).await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["current_phase_index"], 1);
        assert_eq!(body["phases"][0]["status"], "completed");
    }
}

mod failures {
    use super::*;

    #[tokio::test]
    async fn test_executor_failure_returns_500_with_state() {
        let (server, _root) = setup_server_with(
            gated_specs(),
            vec![
                StubExecutor::new("first", Script::FailThenSucceed),
                StubExecutor::new("second", Script::Succeed),
                StubExecutor::new("third", Script::Succeed),
            ],
        )
        .await;
        let id = start_session(&server).await;

        let response = server.post(&format!("/api/workflows/{}/run", id)).await;
        response.assert_status(axum::http::StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = response.json();
        assert_eq!(body["status"], "error");
        assert!(body["error"].as_str().unwrap().contains("first"));
        assert_eq!(body["state"]["status"], "error");
        assert_eq!(body["state"]["current_phase_index"], 0);

        // The same phase retries in place and succeeds.
        let response = server.post(&format!("/api/workflows/{}/run", id)).await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["status"], "success");
        assert_eq!(body["state"]["current_phase_index"], 1);
        assert_eq!(body["state"]["phases"][0]["result"]["retried"], true);
    }

    #[tokio::test]
    async fn test_unknown_session_is_404() {
        let (server, _root) = setup_gated_server().await;
        let missing = uuid::Uuid::new_v4();

        for path in [
            format!("/api/workflows/{}/run", missing),
            format!("/api/workflows/{}/approve", missing),
        ] {
            let response = server.post(&path).await;
            response.assert_status_not_found();
            let body: Value = response.json();
            assert_eq!(body["error"], "session_not_found");
        }

        server
            .get(&format!("/api/workflows/{}", missing))
            .await
            .assert_status_not_found();
    }

    #[tokio::test]
    async fn test_delete_then_session_unknown() {
        let (server, _root) = setup_gated_server().await;
        let id = start_session(&server).await;

        server
            .delete(&format!("/api/workflows/{}", id))
            .await
            .assert_status(axum::http::StatusCode::NO_CONTENT);

        server
            .get(&format!("/api/workflows/{}", id))
            .await
            .assert_status_not_found();
        server
            .delete(&format!("/api/workflows/{}", id))
            .await
            .assert_status_not_found();
    }
}

mod rejection {
    use super::*;

    #[tokio::test]
    async fn test_reject_is_explicitly_unimplemented() {
        let (server, _root) = setup_gated_server().await;
        let id = start_session(&server).await;

        server.post(&format!("/api/workflows/{}/run", id)).await;
        server.post(&format!("/api/workflows/{}/run", id)).await; // now gated

        let response = server.post(&format!("/api/workflows/{}/reject", id)).await;
        response.assert_status(axum::http::StatusCode::NOT_IMPLEMENTED);
        let body: Value = response.json();
        assert_eq!(body["error"], "not_implemented");

        // The gate stays open; approval still works.
        server
            .post(&format!("/api/workflows/{}/approve", id))
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn test_reject_without_gate_conflicts() {
        let (server, _root) = setup_gated_server().await;
        let id = start_session(&server).await;

        server
            .post(&format!("/api/workflows/{}/reject", id))
            .await
            .assert_status(axum::http::StatusCode::CONFLICT);
    }
}

mod concurrency {
    use super::*;

    #[tokio::test]
    async fn test_simultaneous_runs_yield_one_transition() {
        let (server, _root) = setup_server_with(
            vec![
                PhaseSpec::new("slow", "Slow"),
                PhaseSpec::new("next", "Next"),
            ],
            vec![
                StubExecutor::new("slow", Script::Slow(Duration::from_millis(100))),
                StubExecutor::new("next", Script::Succeed),
            ],
        )
        .await;
        let id = start_session(&server).await;

        let run_path = format!("/api/workflows/{}/run", id);
        let (a, b) = tokio::join!(server.post(&run_path), server.post(&run_path));

        let mut statuses = vec![a.status_code(), b.status_code()];
        statuses.sort();
        assert_eq!(
            statuses,
            vec![
                axum::http::StatusCode::OK,
                axum::http::StatusCode::CONFLICT
            ]
        );

        let busy = if a.status_code() == axum::http::StatusCode::CONFLICT {
            a
        } else {
            b
        };
        let body: Value = busy.json();
        assert_eq!(body["error"], "session_busy");

        // Exactly one phase executed.
        let state: Value = server.get(&format!("/api/workflows/{}", id)).await.json();
        assert_eq!(state["current_phase_index"], 1);
    }
}

mod standard_pipeline {
    use super::*;
    use std::process::Command;

    struct StubAgent;

    #[async_trait]
    impl AgentClient for StubAgent {
        async fn run_prompt(&self, _workdir: &std::path::Path, prompt: &str) -> engine::Result<String> {
            if prompt.contains("Create a detailed fix plan") {
                Ok("# Plan\n1. Patch the null check".to_string())
            } else {
                Ok("Done.".to_string())
            }
        }
    }

    fn create_origin_repo() -> TempDir {
        let dir = TempDir::new().expect("Failed to create temp dir");

        Command::new("git")
            .args(["init", "--initial-branch=main"])
            .current_dir(dir.path())
            .output()
            .expect("Failed to init git repo");
        Command::new("git")
            .args(["config", "user.email", "test@test.com"])
            .current_dir(dir.path())
            .output()
            .expect("Failed to set git email");
        Command::new("git")
            .args(["config", "user.name", "Test User"])
            .current_dir(dir.path())
            .output()
            .expect("Failed to set git name");

        std::fs::write(dir.path().join("README.md"), "# Test\n").expect("Failed to write README");
        Command::new("git")
            .args(["add", "."])
            .current_dir(dir.path())
            .output()
            .expect("Failed to git add");
        Command::new("git")
            .args(["commit", "-m", "Initial commit"])
            .current_dir(dir.path())
            .output()
            .expect("Failed to git commit");

        dir
    }

    async fn setup_standard_server(
        jira_url: &str,
    ) -> (TestServer, TempDir) {
        let workspace_root = TempDir::new().expect("Failed to create temp dir");

        let pool = db::create_pool("sqlite::memory:")
            .await
            .expect("Failed to create pool");
        db::run_migrations(&pool).await.expect("Failed to run migrations");

        let repository = Arc::new(WorkflowRepository::new(pool));
        let event_bus = EventBus::new();

        let pipeline = engine::phases::standard(StandardDeps {
            jira: Arc::new(JiraClient::new(jira_url, "dev@acme.test", "token")),
            agent: Arc::new(StubAgent),
            workspaces: WorkspaceManager::new(workspace_root.path()),
            base_branch: "main".to_string(),
        })
        .expect("Failed to build standard pipeline");

        let engine = Arc::new(WorkflowEngine::new(
            Arc::clone(&repository),
            pipeline,
            event_bus.clone(),
            workspace_root.path(),
        ));

        let state = AppState::new(engine, repository, event_bus);
        let server = TestServer::new(create_router(state)).expect("Failed to create test server");

        (server, workspace_root)
    }

    #[tokio::test]
    async fn test_standard_pipeline_through_plan_gate() {
        let mock_jira = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/2/issue/SCRUM-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "key": "SCRUM-1",
                "fields": {
                    "summary": "App crashes on save",
                    "description": "NPE in the save handler",
                    "status": {"name": "To Do"}
                }
            })))
            .mount(&mock_jira)
            .await;

        let origin = create_origin_repo();
        let (server, _root) = setup_standard_server(&mock_jira.uri()).await;

        let response = server
            .post("/api/workflows")
            .json(&json!({
                "issue_key": "SCRUM-1",
                "repo_url": origin.path().to_str().unwrap()
            }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        let body: Value = response.json();
        let id = body["state"]["id"].as_str().unwrap().to_string();
        assert_eq!(body["state"]["phases"].as_array().unwrap().len(), 7);

        // gather_context fetches the issue from Jira.
        let response = server.post(&format!("/api/workflows/{}/run", id)).await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["status"], "success");
        assert_eq!(
            body["state"]["phases"][0]["result"]["summary"],
            "App crashes on save"
        );

        // setup_repo clones the origin and creates the session branch.
        let response = server.post(&format!("/api/workflows/{}/run", id)).await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(
            body["state"]["phases"][1]["result"]["branch"],
            "autofix/SCRUM-1"
        );

        // plan_fix runs the agent and pauses at the gate.
        let response = server.post(&format!("/api/workflows/{}/run", id)).await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["status"], "awaiting_approval");
        assert!(body["message"]
            .as_str()
            .unwrap()
            .contains("review the proposed fix plan"));
        assert!(body["state"]["phases"][2]["result"]["plan"]
            .as_str()
            .unwrap()
            .contains("Patch the null check"));
    }

    #[tokio::test]
    async fn test_setup_repo_without_repo_url_fails_phase() {
        let mock_jira = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/2/issue/SCRUM-2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "key": "SCRUM-2",
                "fields": {"summary": "No repo attached"}
            })))
            .mount(&mock_jira)
            .await;

        let (server, _root) = setup_standard_server(&mock_jira.uri()).await;

        let response = server
            .post("/api/workflows")
            .json(&json!({"issue_key": "SCRUM-2"}))
            .await;
        let body: Value = response.json();
        let id = body["state"]["id"].as_str().unwrap().to_string();

        server
            .post(&format!("/api/workflows/{}/run", id))
            .await
            .assert_status_ok();

        let response = server.post(&format!("/api/workflows/{}/run", id)).await;
        response.assert_status(axum::http::StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = response.json();
        assert_eq!(body["status"], "error");
        assert!(body["error"].as_str().unwrap().contains("no repository URL"));
        assert_eq!(body["state"]["status"], "error");
    }
}
