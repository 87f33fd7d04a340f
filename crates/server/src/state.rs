use std::sync::Arc;

use db::WorkflowRepository;
use engine::WorkflowEngine;
use events::EventBus;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<WorkflowEngine>,
    pub repository: Arc<WorkflowRepository>,
    pub event_bus: EventBus,
}

impl AppState {
    pub fn new(
        engine: Arc<WorkflowEngine>,
        repository: Arc<WorkflowRepository>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            engine,
            repository,
            event_bus,
        }
    }
}
