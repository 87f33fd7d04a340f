use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Session not found: {0}")]
    SessionNotFound(Uuid),

    #[error("Invalid transition: cannot {action} a session in state {status}")]
    InvalidTransition { action: &'static str, status: String },

    #[error("Session {0} already has a phase execution in flight")]
    SessionBusy(Uuid),

    #[error("Phase {phase} failed: {reason}")]
    ExecutorFailure { phase: String, reason: String },

    #[error("Approval rejection has no defined transition yet; amend the session manually or approve")]
    RejectionUnsupported,

    #[error("Invalid pipeline configuration: {0}")]
    Configuration(String),

    #[error("Agent error: {0}")]
    Agent(String),

    #[error("Workspace error: {0}")]
    Workspace(String),

    #[error("Jira error: {0}")]
    Jira(#[from] jira::JiraError),

    #[error("GitHub error: {0}")]
    GitHub(#[from] github::GitHubError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(db::DbError),
}

impl From<db::DbError> for EngineError {
    fn from(err: db::DbError) -> Self {
        match err {
            db::DbError::WorkflowNotFound(id) => EngineError::SessionNotFound(id),
            other => EngineError::Database(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
