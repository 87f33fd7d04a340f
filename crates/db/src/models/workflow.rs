use autofix_core::{WorkflowState, WorkflowStatus};
use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use crate::error::DbError;

/// Flat SQLite representation of a [`WorkflowState`]. The phase records are
/// stored as one JSON column; the workflow row is always written whole, so
/// readers never observe a partially updated session.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct WorkflowRow {
    pub id: String,
    pub issue_key: String,
    pub repo_url: Option<String>,
    pub current_phase_index: i64,
    pub status: String,
    pub pending_approval_index: Option<i64>,
    pub phases: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl WorkflowRow {
    pub fn into_domain(self) -> Result<WorkflowState, DbError> {
        let phases = serde_json::from_str(&self.phases)
            .map_err(|e| DbError::Corrupt(format!("phases for {}: {}", self.id, e)))?;

        Ok(WorkflowState {
            id: Uuid::parse_str(&self.id)
                .map_err(|e| DbError::Corrupt(format!("id {}: {}", self.id, e)))?,
            issue_key: self.issue_key,
            repo_url: self.repo_url,
            current_phase_index: self.current_phase_index as usize,
            status: WorkflowStatus::parse(&self.status)
                .ok_or_else(|| DbError::Corrupt(format!("status {:?}", self.status)))?,
            pending_approval_index: self.pending_approval_index.map(|i| i as usize),
            phases,
            created_at: timestamp_to_datetime(self.created_at),
            updated_at: timestamp_to_datetime(self.updated_at),
        })
    }

    pub fn try_from_domain(state: &WorkflowState) -> Result<Self, DbError> {
        let phases = serde_json::to_string(&state.phases)
            .map_err(|e| DbError::Corrupt(format!("phases for {}: {}", state.id, e)))?;

        Ok(Self {
            id: state.id.to_string(),
            issue_key: state.issue_key.clone(),
            repo_url: state.repo_url.clone(),
            current_phase_index: state.current_phase_index as i64,
            status: state.status.as_str().to_string(),
            pending_approval_index: state.pending_approval_index.map(|i| i as i64),
            phases,
            created_at: datetime_to_timestamp(state.created_at),
            updated_at: datetime_to_timestamp(state.updated_at),
        })
    }
}

fn timestamp_to_datetime(ts: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(ts, 0).single().unwrap_or_default()
}

fn datetime_to_timestamp(dt: DateTime<Utc>) -> i64 {
    dt.timestamp()
}
