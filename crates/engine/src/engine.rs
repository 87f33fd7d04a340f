use std::path::PathBuf;
use std::sync::Arc;

use autofix_core::{StartWorkflowRequest, WorkflowState};
use db::WorkflowRepository;
use events::{Event, EventBus, EventEnvelope};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::{EngineError, Result};
use crate::executor::{PhaseContext, Pipeline};
use crate::locks::SessionLocks;

/// What one `run`/`approve` call produced.
///
/// Executor failure is an outcome, not an `Err`: the failure is recorded on
/// the session (status `error`, same phase index) and the refreshed state
/// rides along so polling clients stay in sync.
#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// The phase executed and the session advanced (possibly to completion).
    Advanced { state: WorkflowState },
    /// The phase executed but its gate is open; `approve` must be called
    /// before the session moves on.
    AwaitingApproval {
        message: String,
        state: WorkflowState,
    },
    /// The executor failed; the same phase is eligible for a retry `run`.
    Failed { error: String, state: WorkflowState },
}

impl RunOutcome {
    pub fn state(&self) -> &WorkflowState {
        match self {
            Self::Advanced { state }
            | Self::AwaitingApproval { state, .. }
            | Self::Failed { state, .. } => state,
        }
    }
}

/// The state machine driving one phase transition per invocation.
///
/// The store owns all persisted state; every mutation happens on a loaded
/// copy under the session's lock and is written back before the lock drops.
pub struct WorkflowEngine {
    repository: Arc<WorkflowRepository>,
    pipeline: Pipeline,
    locks: SessionLocks,
    event_bus: EventBus,
    workspace_root: PathBuf,
}

impl WorkflowEngine {
    pub fn new(
        repository: Arc<WorkflowRepository>,
        pipeline: Pipeline,
        event_bus: EventBus,
        workspace_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            repository,
            pipeline,
            locks: SessionLocks::new(),
            event_bus,
            workspace_root: workspace_root.into(),
        }
    }

    /// Create and persist a fresh session. Nothing is created when
    /// validation fails.
    pub async fn start(&self, request: StartWorkflowRequest) -> Result<WorkflowState> {
        let issue_key = request.issue_key.trim();
        if issue_key.is_empty() {
            return Err(EngineError::InvalidInput(
                "issue key must not be empty".to_string(),
            ));
        }

        let repo_url = match request.repo_url.as_deref().map(str::trim) {
            Some("") => {
                return Err(EngineError::InvalidInput(
                    "repo_url must not be empty when supplied".to_string(),
                ))
            }
            other => other.map(str::to_string),
        };

        let state = WorkflowState::with_specs(self.pipeline.specs(), issue_key, repo_url);
        self.repository.create(&state).await?;

        info!(
            workflow_id = %state.id,
            issue_key = %state.issue_key,
            "Workflow session started"
        );
        self.publish(Event::WorkflowStarted {
            workflow_id: state.id,
            issue_key: state.issue_key.clone(),
        });

        Ok(state)
    }

    /// Execute the session's next phase. Exactly one transition per call.
    pub async fn run(&self, id: Uuid) -> Result<RunOutcome> {
        let _guard = self.locks.try_acquire(id)?;

        let mut state = self.load_session(id).await?;
        self.ensure_runnable(&state, "run")?;

        let index = state.current_phase_index;
        let executor = self
            .pipeline
            .executor(index)
            .ok_or_else(|| EngineError::Configuration(format!("no executor for phase {}", index)))?;
        let phase_name = executor.name().to_string();

        info!(
            workflow_id = %id,
            phase = %phase_name,
            phase_index = index,
            "Executing phase"
        );
        self.publish(Event::PhaseStarted {
            workflow_id: id,
            phase_index: index,
            phase: phase_name.clone(),
        });

        let ctx = PhaseContext::new(state.clone(), self.workspace_root.join(id.to_string()));

        match executor.execute(&ctx).await {
            Ok(result) => {
                if self.pipeline.requires_approval(index) {
                    state.hold_for_approval(result);
                    self.repository.save(&state).await?;

                    let message = state
                        .current_phase()
                        .and_then(|p| p.approval_message.clone())
                        .unwrap_or_else(|| {
                            format!("Phase {} awaits approval before continuing.", phase_name)
                        });

                    info!(workflow_id = %id, phase = %phase_name, "Phase gated, awaiting approval");
                    self.publish(Event::ApprovalRequested {
                        workflow_id: id,
                        phase_index: index,
                        phase: phase_name,
                        message: message.clone(),
                    });

                    Ok(RunOutcome::AwaitingApproval { message, state })
                } else {
                    state.complete_phase(result);
                    self.repository.save(&state).await?;

                    info!(
                        workflow_id = %id,
                        phase = %phase_name,
                        status = %state.status.as_str(),
                        "Phase completed"
                    );
                    self.publish(Event::PhaseCompleted {
                        workflow_id: id,
                        phase_index: index,
                        phase: phase_name,
                    });
                    if state.is_completed() {
                        self.publish(Event::WorkflowCompleted { workflow_id: id });
                    }

                    Ok(RunOutcome::Advanced { state })
                }
            }
            Err(e) => {
                let failure = EngineError::ExecutorFailure {
                    phase: phase_name.clone(),
                    reason: e.to_string(),
                };
                let message = failure.to_string();

                state.mark_phase_failed();
                self.repository.save(&state).await?;

                error!(workflow_id = %id, phase = %phase_name, error = %message, "Phase failed");
                self.publish(Event::PhaseFailed {
                    workflow_id: id,
                    phase_index: index,
                    phase: phase_name,
                    error: message.clone(),
                });

                Ok(RunOutcome::Failed {
                    error: message,
                    state,
                })
            }
        }
    }

    /// Close the open approval gate and advance past the gated phase.
    pub async fn approve(&self, id: Uuid) -> Result<RunOutcome> {
        let _guard = self.locks.try_acquire(id)?;

        let mut state = self.load_session(id).await?;
        if !state.is_awaiting_approval() {
            return Err(EngineError::InvalidTransition {
                action: "approve",
                status: state.status.as_str().to_string(),
            });
        }

        let index = state.pending_approval_index.unwrap_or(state.current_phase_index);
        state.approve_pending();
        self.repository.save(&state).await?;

        info!(
            workflow_id = %id,
            phase_index = index,
            status = %state.status.as_str(),
            "Approval granted"
        );
        self.publish(Event::ApprovalGranted {
            workflow_id: id,
            phase_index: index,
        });
        if state.is_completed() {
            self.publish(Event::WorkflowCompleted { workflow_id: id });
        }

        Ok(RunOutcome::Advanced { state })
    }

    /// Rejection is a recognized transition with no defined behavior yet, so
    /// it validates the call and then says so instead of faking success.
    pub async fn reject(&self, id: Uuid) -> Result<RunOutcome> {
        let _guard = self.locks.try_acquire(id)?;

        let state = self.load_session(id).await?;
        if !state.is_awaiting_approval() {
            return Err(EngineError::InvalidTransition {
                action: "reject",
                status: state.status.as_str().to_string(),
            });
        }

        warn!(workflow_id = %id, "Rejection requested but unimplemented");
        Err(EngineError::RejectionUnsupported)
    }

    /// Drop a session entirely. The id behaves like an unknown id afterwards.
    pub async fn discard(&self, id: Uuid) -> Result<bool> {
        let deleted = self.repository.delete(id).await?;
        if deleted {
            self.locks.remove(id);
            self.publish(Event::WorkflowDiscarded { workflow_id: id });
        }
        Ok(deleted)
    }

    /// Load under an already-held lock. A failed load frees the lock entry
    /// so probing unknown ids does not grow the lock map.
    async fn load_session(&self, id: Uuid) -> Result<WorkflowState> {
        match self.repository.load(id).await {
            Ok(state) => Ok(state),
            Err(e) => {
                self.locks.remove(id);
                Err(e.into())
            }
        }
    }

    fn ensure_runnable(&self, state: &WorkflowState, action: &'static str) -> Result<()> {
        if state.is_awaiting_approval() || state.is_completed() {
            return Err(EngineError::InvalidTransition {
                action,
                status: state.status.as_str().to_string(),
            });
        }
        // Created, Running and Error may all run: Error retries the same index.
        Ok(())
    }

    fn publish(&self, event: Event) {
        self.event_bus.publish(EventEnvelope::new(event));
    }
}
