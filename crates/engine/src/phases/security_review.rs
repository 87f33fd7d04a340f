use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::agent::AgentClient;
use crate::error::Result;
use crate::executor::{PhaseContext, PhaseExecutor};
use crate::prompts::PhasePrompts;

/// Agent-driven security and code review of the committed changes.
/// Gated: the review report waits for a human before a PR is opened.
pub struct SecurityReview {
    agent: Arc<dyn AgentClient>,
}

impl SecurityReview {
    pub fn new(agent: Arc<dyn AgentClient>) -> Self {
        Self { agent }
    }
}

#[async_trait]
impl PhaseExecutor for SecurityReview {
    fn name(&self) -> &'static str {
        "security_review"
    }

    async fn execute(&self, ctx: &PhaseContext) -> Result<Value> {
        let prompt = PhasePrompts::review(&ctx.workflow.issue_key);
        let report = self.agent.run_prompt(&ctx.workdir, &prompt).await?;

        Ok(json!({
            "verdict": parse_verdict(&report),
            "report": report,
        }))
    }
}

/// Coarse verdict from the agent's free-text report. Anything that is not an
/// unqualified APPROVED counts as findings for the human gate to weigh.
fn parse_verdict(report: &str) -> &'static str {
    let upper = report.to_uppercase();
    if upper.contains("APPROVED") && !upper.contains("NOT APPROVED") && !upper.contains("FINDINGS")
    {
        "approved"
    } else {
        "findings"
    }
}
