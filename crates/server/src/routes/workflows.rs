use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use autofix_core::{StartWorkflowRequest, WorkflowState};
use engine::RunOutcome;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct StartResponse {
    pub status: String,
    pub state: WorkflowState,
}

/// Body of `run`/`approve` responses; the `status` tag tells polling
/// clients what just happened, and `state` refreshes their cached view.
#[derive(Debug, Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunResponse {
    Success {
        state: WorkflowState,
    },
    AwaitingApproval {
        message: String,
        state: WorkflowState,
    },
    Error {
        error: String,
        state: WorkflowState,
    },
}

impl From<RunOutcome> for RunResponse {
    fn from(outcome: RunOutcome) -> Self {
        match outcome {
            RunOutcome::Advanced { state } => Self::Success { state },
            RunOutcome::AwaitingApproval { message, state } => {
                Self::AwaitingApproval { message, state }
            }
            RunOutcome::Failed { error, state } => Self::Error { error, state },
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/workflows",
    request_body = StartWorkflowRequest,
    responses(
        (status = 201, description = "Session started", body = StartResponse),
        (status = 400, description = "Invalid input"),
    ),
    tag = "workflows"
)]
pub async fn start_workflow(
    State(state): State<AppState>,
    Json(payload): Json<StartWorkflowRequest>,
) -> Result<(StatusCode, Json<StartResponse>), AppError> {
    let workflow = state.engine.start(payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(StartResponse {
            status: "started".to_string(),
            state: workflow,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/workflows",
    responses(
        (status = 200, description = "All sessions", body = [WorkflowState]),
    ),
    tag = "workflows"
)]
pub async fn list_workflows(
    State(state): State<AppState>,
) -> Result<Json<Vec<WorkflowState>>, AppError> {
    let workflows = state.repository.find_all().await?;
    Ok(Json(workflows))
}

#[utoipa::path(
    get,
    path = "/api/workflows/{id}",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "Session state", body = WorkflowState),
        (status = 404, description = "Unknown session"),
    ),
    tag = "workflows"
)]
pub async fn get_workflow(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<WorkflowState>, AppError> {
    match state.repository.find_by_id(id).await? {
        Some(workflow) => Ok(Json(workflow)),
        None => Err(AppError::NotFound(format!("Workflow not found: {}", id))),
    }
}

#[utoipa::path(
    post,
    path = "/api/workflows/{id}/run",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "Phase executed", body = RunResponse),
        (status = 404, description = "Unknown session"),
        (status = 409, description = "Gated, busy or completed"),
        (status = 500, description = "Phase executor failed", body = RunResponse),
    ),
    tag = "workflows"
)]
pub async fn run_workflow(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let outcome = state.engine.run(id).await?;

    // Executor failure keeps the session retryable but is still a 500 for
    // the caller; the refreshed state travels with the error payload.
    let status = match &outcome {
        RunOutcome::Failed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::OK,
    };

    Ok((status, Json(RunResponse::from(outcome))).into_response())
}

#[utoipa::path(
    post,
    path = "/api/workflows/{id}/approve",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "Gate approved", body = RunResponse),
        (status = 404, description = "Unknown session"),
        (status = 409, description = "No gate open"),
    ),
    tag = "workflows"
)]
pub async fn approve_workflow(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RunResponse>, AppError> {
    let outcome = state.engine.approve(id).await?;
    Ok(Json(RunResponse::from(outcome)))
}

#[utoipa::path(
    post,
    path = "/api/workflows/{id}/reject",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 501, description = "Rejection has no defined transition"),
        (status = 404, description = "Unknown session"),
        (status = 409, description = "No gate open"),
    ),
    tag = "workflows"
)]
pub async fn reject_workflow(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RunResponse>, AppError> {
    let outcome = state.engine.reject(id).await?;
    Ok(Json(RunResponse::from(outcome)))
}

#[utoipa::path(
    delete,
    path = "/api/workflows/{id}",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 204, description = "Session discarded"),
        (status = 404, description = "Unknown session"),
    ),
    tag = "workflows"
)]
pub async fn delete_workflow(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.engine.discard(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Workflow not found: {}", id)))
    }
}
