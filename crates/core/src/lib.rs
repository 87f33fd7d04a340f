pub mod domain;

pub use domain::phase::{standard_pipeline, PhaseRecord, PhaseSpec, PhaseStatus};
pub use domain::workflow::{StartWorkflowRequest, WorkflowState, WorkflowStatus};
