use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::phase::{standard_pipeline, PhaseRecord, PhaseSpec, PhaseStatus};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    #[default]
    Created,
    Running,
    AwaitingApproval,
    Completed,
    Error,
}

impl WorkflowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Running => "running",
            Self::AwaitingApproval => "awaiting_approval",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "created" => Some(Self::Created),
            "running" => Some(Self::Running),
            "awaiting_approval" => Some(Self::AwaitingApproval),
            "completed" => Some(Self::Completed),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

/// One autofix session: a fixed phase pipeline bound to an issue/repo pair.
///
/// The store owns persisted instances; callers load a copy, mutate it through
/// the methods below, and write it back. `current_phase_index` only ever
/// moves forward, and a phase's `result` is written at most once.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WorkflowState {
    pub id: Uuid,
    pub issue_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo_url: Option<String>,
    /// Index of the next phase to execute; equals `phases.len()` once done.
    pub current_phase_index: usize,
    pub status: WorkflowStatus,
    /// Which phase's gate is open; set iff `status == AwaitingApproval`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_approval_index: Option<usize>,
    pub phases: Vec<PhaseRecord>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkflowState {
    /// New session over the standard pipeline.
    pub fn new(issue_key: impl Into<String>, repo_url: Option<String>) -> Self {
        Self::with_specs(&standard_pipeline(), issue_key, repo_url)
    }

    /// New session over a custom pipeline (embedders and tests).
    pub fn with_specs(
        specs: &[PhaseSpec],
        issue_key: impl Into<String>,
        repo_url: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            issue_key: issue_key.into(),
            repo_url,
            current_phase_index: 0,
            status: WorkflowStatus::default(),
            pending_approval_index: None,
            phases: specs.iter().map(PhaseRecord::from_spec).collect(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn phase_count(&self) -> usize {
        self.phases.len()
    }

    pub fn current_phase(&self) -> Option<&PhaseRecord> {
        self.phases.get(self.current_phase_index)
    }

    pub fn is_awaiting_approval(&self) -> bool {
        self.status == WorkflowStatus::AwaitingApproval
    }

    pub fn is_completed(&self) -> bool {
        self.status == WorkflowStatus::Completed
    }

    /// Look up an earlier phase's result by phase name.
    pub fn phase_result(&self, name: &str) -> Option<&serde_json::Value> {
        self.phases
            .iter()
            .find(|p| p.name == name)
            .and_then(|p| p.result.as_ref())
    }

    /// Record a successful, ungated execution of the current phase and
    /// advance past it.
    pub fn complete_phase(&mut self, result: serde_json::Value) {
        let index = self.current_phase_index;
        if let Some(phase) = self.phases.get_mut(index) {
            phase.result = Some(result);
            phase.executed_at = Some(Utc::now());
            phase.status = PhaseStatus::Completed;
        }
        self.advance();
    }

    /// Record a successful execution of a gated phase and open its gate.
    /// The index stays put until the gate is approved.
    pub fn hold_for_approval(&mut self, result: serde_json::Value) {
        let index = self.current_phase_index;
        if let Some(phase) = self.phases.get_mut(index) {
            phase.result = Some(result);
            phase.executed_at = Some(Utc::now());
            phase.status = PhaseStatus::AwaitingApproval;
        }
        self.status = WorkflowStatus::AwaitingApproval;
        self.pending_approval_index = Some(index);
        self.touch();
    }

    /// Close the open gate and advance past the approved phase.
    pub fn approve_pending(&mut self) {
        if let Some(index) = self.pending_approval_index.take() {
            if let Some(phase) = self.phases.get_mut(index) {
                phase.status = PhaseStatus::Approved;
            }
        }
        self.advance();
    }

    /// Record an executor failure on the current phase. The index and the
    /// phase result are left untouched so a later `run` can retry in place.
    pub fn mark_phase_failed(&mut self) {
        let index = self.current_phase_index;
        if let Some(phase) = self.phases.get_mut(index) {
            phase.status = PhaseStatus::Failed;
        }
        self.status = WorkflowStatus::Error;
        self.touch();
    }

    fn advance(&mut self) {
        self.current_phase_index += 1;
        self.status = if self.current_phase_index >= self.phases.len() {
            WorkflowStatus::Completed
        } else {
            WorkflowStatus::Running
        };
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StartWorkflowRequest {
    pub issue_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_url: Option<String>,
}
