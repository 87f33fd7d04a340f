mod workflow_repository;

pub use workflow_repository::WorkflowRepository;
