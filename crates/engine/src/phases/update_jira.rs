use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use jira::JiraClient;

use crate::error::{EngineError, Result};
use crate::executor::{PhaseContext, PhaseExecutor};

/// Posts the pull request link back to the tracked issue.
pub struct UpdateJira {
    jira: Arc<JiraClient>,
}

impl UpdateJira {
    pub fn new(jira: Arc<JiraClient>) -> Self {
        Self { jira }
    }
}

#[async_trait]
impl PhaseExecutor for UpdateJira {
    fn name(&self) -> &'static str {
        "update_jira"
    }

    async fn execute(&self, ctx: &PhaseContext) -> Result<Value> {
        let pr_url = ctx
            .workflow
            .phase_result("create_pr")
            .and_then(|r| r.get("url"))
            .and_then(Value::as_str)
            .ok_or_else(|| {
                EngineError::Configuration(
                    "create_pr recorded no pull request URL".to_string(),
                )
            })?;

        let body = format!(
            "Autofix opened a pull request for {}: {}",
            ctx.workflow.issue_key, pr_url
        );
        let comment = self.jira.add_comment(&ctx.workflow.issue_key, &body).await?;

        Ok(json!({
            "comment_id": comment.id,
            "pr_url": pr_url,
        }))
    }
}
