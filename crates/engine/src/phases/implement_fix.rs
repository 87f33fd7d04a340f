use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::agent::AgentClient;
use crate::error::Result;
use crate::executor::{PhaseContext, PhaseExecutor};
use crate::prompts::PhasePrompts;

/// Has the agent apply the approved plan in the session checkout.
pub struct ImplementFix {
    agent: Arc<dyn AgentClient>,
}

impl ImplementFix {
    pub fn new(agent: Arc<dyn AgentClient>) -> Self {
        Self { agent }
    }
}

#[async_trait]
impl PhaseExecutor for ImplementFix {
    fn name(&self) -> &'static str {
        "implement_fix"
    }

    async fn execute(&self, ctx: &PhaseContext) -> Result<Value> {
        let plan = ctx
            .workflow
            .phase_result("plan_fix")
            .and_then(|r| r.get("plan"))
            .and_then(Value::as_str)
            .unwrap_or("(no plan recorded; analyze the issue and fix it)");

        let prompt = PhasePrompts::implement(&ctx.workflow.issue_key, plan);
        let report = self.agent.run_prompt(&ctx.workdir, &prompt).await?;

        Ok(json!({ "report": report }))
    }
}
