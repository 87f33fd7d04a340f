pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use db::WorkflowRepository;
use engine::{AgentClient, HttpAgentClient, StandardDeps, WorkflowEngine, WorkspaceManager};
use events::EventBus;
use jira::JiraClient;

use config::ServerConfig;
use state::AppState;

const SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Autofix Studio API",
        version = "0.1.0",
        description = "Control API for the issue autofix workflow engine"
    ),
    paths(
        routes::health_check,
        routes::start_workflow,
        routes::list_workflows,
        routes::get_workflow,
        routes::run_workflow,
        routes::approve_workflow,
        routes::reject_workflow,
        routes::delete_workflow,
        routes::sse::events_stream,
    ),
    components(schemas(
        routes::HealthResponse,
        routes::StartResponse,
        routes::RunResponse,
        autofix_core::StartWorkflowRequest,
        autofix_core::WorkflowState,
        autofix_core::WorkflowStatus,
        autofix_core::PhaseRecord,
        autofix_core::PhaseStatus,
    )),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "workflows", description = "Workflow session endpoints"),
        (name = "events", description = "Real-time event streaming (SSE)"),
    )
)]
pub struct ApiDoc;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api/openapi.json", ApiDoc::openapi()))
        .route("/health", get(routes::health_check))
        .route(
            "/api/workflows",
            get(routes::list_workflows).post(routes::start_workflow),
        )
        .route(
            "/api/workflows/{id}",
            get(routes::get_workflow).delete(routes::delete_workflow),
        )
        .route("/api/workflows/{id}/run", post(routes::run_workflow))
        .route("/api/workflows/{id}/approve", post(routes::approve_workflow))
        .route("/api/workflows/{id}/reject", post(routes::reject_workflow))
        .route("/api/events", get(routes::sse::events_stream))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Wire the full service from config and serve until shutdown.
pub async fn run(config: ServerConfig) -> anyhow::Result<()> {
    let pool = db::create_pool(&config.database_url)
        .await
        .with_context(|| format!("failed to open database {}", config.database_url))?;
    db::run_migrations(&pool).await.context("migrations failed")?;

    let repository = Arc::new(WorkflowRepository::new(pool));
    let event_bus = EventBus::new();

    let jira = Arc::new(
        JiraClient::from_env()
            .context("JIRA_URL, JIRA_EMAIL and JIRA_API_TOKEN must be set")?,
    );
    let agent: Arc<dyn AgentClient> = Arc::new(
        HttpAgentClient::new(&config.agent_url)
            .with_model(&config.provider_id, &config.model_id),
    );
    let workspaces = WorkspaceManager::new(config.workspace_root.clone());

    let pipeline = engine::phases::standard(StandardDeps {
        jira,
        agent,
        workspaces,
        base_branch: config.base_branch.clone(),
    })?;

    let engine = Arc::new(WorkflowEngine::new(
        Arc::clone(&repository),
        pipeline,
        event_bus.clone(),
        config.workspace_root.clone(),
    ));

    spawn_session_sweeper(Arc::clone(&repository), config.session_ttl_secs);

    let state = AppState::new(engine, repository, event_bus);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    tracing::info!("Autofix Studio listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Hourly cleanup of sessions past their TTL (completed or abandoned).
fn spawn_session_sweeper(repository: Arc<WorkflowRepository>, ttl_secs: u64) {
    let ttl = chrono::Duration::seconds(ttl_secs as i64);

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SWEEP_INTERVAL);
        interval.tick().await;

        loop {
            interval.tick().await;
            match repository.purge_stale(ttl).await {
                Ok(purged) if purged > 0 => {
                    tracing::info!(purged, "Expired workflow sessions purged");
                }
                Ok(_) => {}
                Err(e) => warn!(error = %e, "Session sweep failed"),
            }
        }
    });
}
