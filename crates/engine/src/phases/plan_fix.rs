use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::agent::AgentClient;
use crate::error::Result;
use crate::executor::{PhaseContext, PhaseExecutor};
use crate::prompts::PhasePrompts;

/// Asks the agent for a fix plan based on the gathered issue context.
/// Gated: a human reviews the plan before implementation starts.
pub struct PlanFix {
    agent: Arc<dyn AgentClient>,
}

impl PlanFix {
    pub fn new(agent: Arc<dyn AgentClient>) -> Self {
        Self { agent }
    }
}

#[async_trait]
impl PhaseExecutor for PlanFix {
    fn name(&self) -> &'static str {
        "plan_fix"
    }

    async fn execute(&self, ctx: &PhaseContext) -> Result<Value> {
        let issue = ctx.workflow.phase_result("gather_context");
        let summary = issue
            .and_then(|i| i.get("summary"))
            .and_then(Value::as_str)
            .unwrap_or(&ctx.workflow.issue_key);
        let description = issue
            .and_then(|i| i.get("description"))
            .and_then(Value::as_str)
            .unwrap_or("(no description)");

        let prompt = PhasePrompts::plan(&ctx.workflow.issue_key, summary, description);
        let plan = self.agent.run_prompt(&ctx.workdir, &prompt).await?;

        Ok(json!({ "plan": plan }))
    }
}
