mod workflow;

pub use workflow::WorkflowRow;
