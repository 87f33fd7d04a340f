use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use autofix_core::{PhaseSpec, WorkflowState};
use serde_json::Value;

use crate::error::{EngineError, Result};

/// Everything an executor may read: an owned snapshot of the session
/// (including earlier phases' results) and the session working directory.
#[derive(Debug, Clone)]
pub struct PhaseContext {
    pub workflow: WorkflowState,
    pub workdir: PathBuf,
}

impl PhaseContext {
    pub fn new(workflow: WorkflowState, workdir: PathBuf) -> Self {
        Self { workflow, workdir }
    }
}

/// One pipeline step's worker. The engine never looks inside: it hands over
/// a context and records whatever payload (or failure) comes back.
#[async_trait]
pub trait PhaseExecutor: Send + Sync {
    fn name(&self) -> &'static str;

    async fn execute(&self, ctx: &PhaseContext) -> Result<Value>;
}

/// An ordered, fixed set of executors plus the matching phase specs.
/// Assembled once; sessions copy the specs and index into the executors.
pub struct Pipeline {
    specs: Vec<PhaseSpec>,
    executors: Vec<Arc<dyn PhaseExecutor>>,
}

impl Pipeline {
    pub fn new(specs: Vec<PhaseSpec>, executors: Vec<Arc<dyn PhaseExecutor>>) -> Result<Self> {
        if specs.len() != executors.len() {
            return Err(EngineError::Configuration(format!(
                "{} phase specs but {} executors",
                specs.len(),
                executors.len()
            )));
        }

        for (spec, executor) in specs.iter().zip(&executors) {
            if spec.name != executor.name() {
                return Err(EngineError::Configuration(format!(
                    "spec {:?} wired to executor {:?}",
                    spec.name,
                    executor.name()
                )));
            }
        }

        Ok(Self { specs, executors })
    }

    pub fn specs(&self) -> &[PhaseSpec] {
        &self.specs
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// The approval gate: fixed by configuration, consulted right after a
    /// phase executes.
    pub fn requires_approval(&self, phase_index: usize) -> bool {
        self.specs
            .get(phase_index)
            .map(|s| s.requires_approval)
            .unwrap_or(false)
    }

    pub fn executor(&self, phase_index: usize) -> Option<&Arc<dyn PhaseExecutor>> {
        self.executors.get(phase_index)
    }
}
