//! The standard pipeline's phase executors.
//!
//! Each step of the autofix pipeline has one executor here:
//!
//! - [`GatherContext`] - fetch the Jira issue
//! - [`SetupRepo`] - clone the repository and branch
//! - [`PlanFix`] - agent drafts the fix plan (gated)
//! - [`ImplementFix`] - agent applies the approved plan
//! - [`SecurityReview`] - agent reviews the changes (gated)
//! - [`CreatePr`] - open the pull request
//! - [`UpdateJira`] - comment the PR link back on the issue

mod create_pr;
mod gather_context;
mod implement_fix;
mod plan_fix;
mod security_review;
mod setup_repo;
mod update_jira;

pub use create_pr::CreatePr;
pub use gather_context::GatherContext;
pub use implement_fix::ImplementFix;
pub use plan_fix::PlanFix;
pub use security_review::SecurityReview;
pub use setup_repo::SetupRepo;
pub use update_jira::UpdateJira;

use std::sync::Arc;

use autofix_core::standard_pipeline;
use jira::JiraClient;

use crate::agent::AgentClient;
use crate::error::Result;
use crate::executor::{PhaseExecutor, Pipeline};
use crate::workspace::WorkspaceManager;

/// Collaborators the standard pipeline is wired with.
pub struct StandardDeps {
    pub jira: Arc<JiraClient>,
    pub agent: Arc<dyn AgentClient>,
    pub workspaces: WorkspaceManager,
    pub base_branch: String,
}

/// Assemble the standard seven-phase pipeline.
pub fn standard(deps: StandardDeps) -> Result<Pipeline> {
    let executors: Vec<Arc<dyn PhaseExecutor>> = vec![
        Arc::new(GatherContext::new(Arc::clone(&deps.jira))),
        Arc::new(SetupRepo::new(deps.workspaces.clone())),
        Arc::new(PlanFix::new(Arc::clone(&deps.agent))),
        Arc::new(ImplementFix::new(Arc::clone(&deps.agent))),
        Arc::new(SecurityReview::new(Arc::clone(&deps.agent))),
        Arc::new(CreatePr::new(deps.workspaces, deps.base_branch)),
        Arc::new(UpdateJira::new(deps.jira)),
    ];

    Pipeline::new(standard_pipeline(), executors)
}

/// Branch a session works on, derived from the issue key.
pub(crate) fn session_branch(issue_key: &str) -> String {
    format!("autofix/{}", issue_key)
}
