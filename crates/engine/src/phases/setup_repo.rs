use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::{EngineError, Result};
use crate::executor::{PhaseContext, PhaseExecutor};
use crate::phases::session_branch;
use crate::workspace::WorkspaceManager;

/// Clones the repository into the session directory and creates the
/// working branch.
pub struct SetupRepo {
    workspaces: WorkspaceManager,
}

impl SetupRepo {
    pub fn new(workspaces: WorkspaceManager) -> Self {
        Self { workspaces }
    }
}

#[async_trait]
impl PhaseExecutor for SetupRepo {
    fn name(&self) -> &'static str {
        "setup_repo"
    }

    async fn execute(&self, ctx: &PhaseContext) -> Result<Value> {
        let repo_url = ctx.workflow.repo_url.as_deref().ok_or_else(|| {
            EngineError::Workspace(
                "no repository URL on this session; start it with repo_url set".to_string(),
            )
        })?;

        let branch = session_branch(&ctx.workflow.issue_key);
        let directory = self
            .workspaces
            .prepare(ctx.workflow.id, repo_url, &branch)
            .await?;

        Ok(json!({
            "directory": directory.display().to_string(),
            "branch": branch,
        }))
    }
}
