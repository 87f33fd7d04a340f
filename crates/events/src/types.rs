//! Event types for the Autofix Studio event system

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Envelope wrapping all events with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Unique event ID
    pub id: Uuid,
    /// When the event occurred
    pub timestamp: DateTime<Utc>,
    /// The actual event
    pub event: Event,
}

impl EventEnvelope {
    pub fn new(event: Event) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            event,
        }
    }
}

/// All possible events in the system
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A new session was started
    #[serde(rename = "workflow.started")]
    WorkflowStarted { workflow_id: Uuid, issue_key: String },

    /// A phase began executing
    #[serde(rename = "phase.started")]
    PhaseStarted {
        workflow_id: Uuid,
        phase_index: usize,
        phase: String,
    },

    /// A phase executed successfully and the session advanced
    #[serde(rename = "phase.completed")]
    PhaseCompleted {
        workflow_id: Uuid,
        phase_index: usize,
        phase: String,
    },

    /// A phase executor failed; the session is retryable at the same index
    #[serde(rename = "phase.failed")]
    PhaseFailed {
        workflow_id: Uuid,
        phase_index: usize,
        phase: String,
        error: String,
    },

    /// A gated phase finished and is waiting on a human
    #[serde(rename = "approval.requested")]
    ApprovalRequested {
        workflow_id: Uuid,
        phase_index: usize,
        phase: String,
        message: String,
    },

    /// A human approved the open gate
    #[serde(rename = "approval.granted")]
    ApprovalGranted {
        workflow_id: Uuid,
        phase_index: usize,
    },

    /// All phases are done
    #[serde(rename = "workflow.completed")]
    WorkflowCompleted { workflow_id: Uuid },

    /// The session was deleted or expired
    #[serde(rename = "workflow.discarded")]
    WorkflowDiscarded { workflow_id: Uuid },

    /// Generic error event
    #[serde(rename = "error")]
    Error {
        message: String,
        context: Option<String>,
    },
}

impl Event {
    /// Get the session ID associated with this event, if any
    pub fn workflow_id(&self) -> Option<Uuid> {
        match self {
            Event::WorkflowStarted { workflow_id, .. } => Some(*workflow_id),
            Event::PhaseStarted { workflow_id, .. } => Some(*workflow_id),
            Event::PhaseCompleted { workflow_id, .. } => Some(*workflow_id),
            Event::PhaseFailed { workflow_id, .. } => Some(*workflow_id),
            Event::ApprovalRequested { workflow_id, .. } => Some(*workflow_id),
            Event::ApprovalGranted { workflow_id, .. } => Some(*workflow_id),
            Event::WorkflowCompleted { workflow_id } => Some(*workflow_id),
            Event::WorkflowDiscarded { workflow_id } => Some(*workflow_id),
            Event::Error { .. } => None,
        }
    }

    /// Event type string, as used for SSE event names
    pub fn kind(&self) -> &'static str {
        match self {
            Event::WorkflowStarted { .. } => "workflow.started",
            Event::PhaseStarted { .. } => "phase.started",
            Event::PhaseCompleted { .. } => "phase.completed",
            Event::PhaseFailed { .. } => "phase.failed",
            Event::ApprovalRequested { .. } => "approval.requested",
            Event::ApprovalGranted { .. } => "approval.granted",
            Event::WorkflowCompleted { .. } => "workflow.completed",
            Event::WorkflowDiscarded { .. } => "workflow.discarded",
            Event::Error { .. } => "error",
        }
    }
}
