use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use engine::EngineError;
use serde::Serialize;

#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    BadRequest(String),
    Internal(String),
    Engine(EngineError),
    Database(db::DbError),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg),
            AppError::Engine(err) => {
                let (status, error_type) = match &err {
                    EngineError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "invalid_input"),
                    EngineError::SessionNotFound(_) => (StatusCode::NOT_FOUND, "session_not_found"),
                    EngineError::InvalidTransition { .. } => {
                        (StatusCode::CONFLICT, "invalid_transition")
                    }
                    EngineError::SessionBusy(_) => (StatusCode::CONFLICT, "session_busy"),
                    EngineError::RejectionUnsupported => {
                        (StatusCode::NOT_IMPLEMENTED, "not_implemented")
                    }
                    EngineError::ExecutorFailure { .. } => {
                        (StatusCode::INTERNAL_SERVER_ERROR, "executor_failure")
                    }
                    _ => {
                        tracing::error!("Engine error: {:?}", err);
                        (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
                    }
                };
                (status, error_type, err.to_string())
            }
            AppError::Database(err) => {
                tracing::error!("Database error: {:?}", err);
                match err {
                    db::DbError::WorkflowNotFound(id) => (
                        StatusCode::NOT_FOUND,
                        "session_not_found",
                        format!("Workflow not found: {}", id),
                    ),
                    _ => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "database_error",
                        "Database error occurred".to_string(),
                    ),
                }
            }
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        AppError::Engine(err)
    }
}

impl From<db::DbError> for AppError {
    fn from(err: db::DbError) -> Self {
        AppError::Database(err)
    }
}
