use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use jira::JiraClient;

use crate::error::Result;
use crate::executor::{PhaseContext, PhaseExecutor};

/// Fetches the tracked issue; its payload seeds every later phase.
pub struct GatherContext {
    jira: Arc<JiraClient>,
}

impl GatherContext {
    pub fn new(jira: Arc<JiraClient>) -> Self {
        Self { jira }
    }
}

#[async_trait]
impl PhaseExecutor for GatherContext {
    fn name(&self) -> &'static str {
        "gather_context"
    }

    async fn execute(&self, ctx: &PhaseContext) -> Result<Value> {
        let issue = self.jira.get_issue(&ctx.workflow.issue_key).await?;

        info!(
            workflow_id = %ctx.workflow.id,
            issue_key = %issue.key,
            "Issue context gathered"
        );

        Ok(serde_json::to_value(issue)?)
    }
}
