use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Workflow not found: {0}")]
    WorkflowNotFound(Uuid),

    #[error("Corrupt workflow record: {0}")]
    Corrupt(String),
}
