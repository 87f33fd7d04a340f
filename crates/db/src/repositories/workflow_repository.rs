use autofix_core::WorkflowState;
use chrono::{Duration, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbError;
use crate::models::WorkflowRow;

/// Durable store of workflow sessions, one row per session.
///
/// `save` rewrites the whole row in a single statement, so concurrent
/// readers of the same session never see a field-by-field partial write.
#[derive(Clone)]
pub struct WorkflowRepository {
    pool: SqlitePool,
}

impl WorkflowRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, state: &WorkflowState) -> Result<(), DbError> {
        let row = WorkflowRow::try_from_domain(state)?;

        sqlx::query(
            r#"
            INSERT INTO workflows
                (id, issue_key, repo_url, current_phase_index, status,
                 pending_approval_index, phases, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&row.id)
        .bind(&row.issue_key)
        .bind(&row.repo_url)
        .bind(row.current_phase_index)
        .bind(&row.status)
        .bind(row.pending_approval_index)
        .bind(&row.phases)
        .bind(row.created_at)
        .bind(row.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Load a session, failing with [`DbError::WorkflowNotFound`] for
    /// unknown or already-purged ids.
    pub async fn load(&self, id: Uuid) -> Result<WorkflowState, DbError> {
        self.find_by_id(id)
            .await?
            .ok_or(DbError::WorkflowNotFound(id))
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<WorkflowState>, DbError> {
        let row: Option<WorkflowRow> = sqlx::query_as(
            r#"
            SELECT id, issue_key, repo_url, current_phase_index, status,
                   pending_approval_index, phases, created_at, updated_at
            FROM workflows
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(WorkflowRow::into_domain).transpose()
    }

    pub async fn find_all(&self) -> Result<Vec<WorkflowState>, DbError> {
        let rows: Vec<WorkflowRow> = sqlx::query_as(
            r#"
            SELECT id, issue_key, repo_url, current_phase_index, status,
                   pending_approval_index, phases, created_at, updated_at
            FROM workflows
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(WorkflowRow::into_domain).collect()
    }

    /// Persist a mutated session. The full row is replaced atomically.
    pub async fn save(&self, state: &WorkflowState) -> Result<(), DbError> {
        let row = WorkflowRow::try_from_domain(state)?;

        let result = sqlx::query(
            r#"
            UPDATE workflows
            SET current_phase_index = ?, status = ?, pending_approval_index = ?,
                phases = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(row.current_phase_index)
        .bind(&row.status)
        .bind(row.pending_approval_index)
        .bind(&row.phases)
        .bind(row.updated_at)
        .bind(&row.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::WorkflowNotFound(state.id));
        }

        Ok(())
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM workflows WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete sessions untouched for longer than `ttl`. Returns how many
    /// were removed. Purged ids behave like unknown ids afterwards.
    pub async fn purge_stale(&self, ttl: Duration) -> Result<u64, DbError> {
        let cutoff = (Utc::now() - ttl).timestamp();

        let result = sqlx::query("DELETE FROM workflows WHERE updated_at < ?")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;

        let purged = result.rows_affected();
        if purged > 0 {
            debug!(purged, "Purged stale workflow sessions");
        }

        Ok(purged)
    }
}
