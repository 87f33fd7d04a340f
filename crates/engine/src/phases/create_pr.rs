use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::info;

use github::{CreatePrRequest, GitHubClient, RepoConfig};

use crate::error::{EngineError, Result};
use crate::executor::{PhaseContext, PhaseExecutor};
use crate::phases::session_branch;
use crate::workspace::WorkspaceManager;

/// Pushes the session branch and opens the pull request.
pub struct CreatePr {
    workspaces: WorkspaceManager,
    base_branch: String,
}

impl CreatePr {
    pub fn new(workspaces: WorkspaceManager, base_branch: impl Into<String>) -> Self {
        Self {
            workspaces,
            base_branch: base_branch.into(),
        }
    }
}

#[async_trait]
impl PhaseExecutor for CreatePr {
    fn name(&self) -> &'static str {
        "create_pr"
    }

    async fn execute(&self, ctx: &PhaseContext) -> Result<Value> {
        let workflow = &ctx.workflow;
        let repo_url = workflow.repo_url.as_deref().ok_or_else(|| {
            EngineError::Workspace("no repository URL on this session".to_string())
        })?;
        let repo = RepoConfig::from_git_url(repo_url).ok_or_else(|| {
            github::GitHubError::Config(format!("not a GitHub repository URL: {}", repo_url))
        })?;

        let branch = workflow
            .phase_result("setup_repo")
            .and_then(|r| r.get("branch"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| session_branch(&workflow.issue_key));

        self.workspaces.push(&ctx.workdir, &branch).await?;

        let summary = workflow
            .phase_result("gather_context")
            .and_then(|i| i.get("summary"))
            .and_then(Value::as_str)
            .unwrap_or("Automated fix");
        let plan = workflow
            .phase_result("plan_fix")
            .and_then(|r| r.get("plan"))
            .and_then(Value::as_str)
            .unwrap_or_default();

        let request = CreatePrRequest::new(
            format!("[{}] {}", workflow.issue_key, summary),
            branch.clone(),
            self.base_branch.clone(),
        )
        .with_body(format!(
            "Automated fix for {}.\n\n## Plan\n{}",
            workflow.issue_key, plan
        ));

        let client = GitHubClient::from_env(repo)?;
        let pr = client.create_pull_request(request).await?;

        info!(
            workflow_id = %workflow.id,
            pr_number = pr.number,
            url = %pr.html_url,
            "Pull request created"
        );

        Ok(json!({
            "number": pr.number,
            "url": pr.html_url,
            "branch": branch,
            "base": self.base_branch,
        }))
    }
}
