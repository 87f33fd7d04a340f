use octocrab::models::IssueState as OctocrabIssueState;
use octocrab::Octocrab;
use tracing::{debug, info};

use crate::error::{GitHubError, Result};
use crate::types::{CreatePrRequest, PrState, PullRequest, RepoConfig};

pub struct GitHubClient {
    octocrab: Octocrab,
    repo: RepoConfig,
}

impl GitHubClient {
    pub fn new(token: &str, repo: RepoConfig) -> Result<Self> {
        let octocrab = Octocrab::builder()
            .personal_token(token.to_string())
            .build()
            .map_err(|e| GitHubError::Config(e.to_string()))?;

        Ok(Self { octocrab, repo })
    }

    pub fn from_env(repo: RepoConfig) -> Result<Self> {
        let token = std::env::var("GITHUB_TOKEN")
            .map_err(|_| GitHubError::Authentication("GITHUB_TOKEN not set".to_string()))?;
        Self::new(&token, repo)
    }

    pub fn repo(&self) -> &RepoConfig {
        &self.repo
    }

    pub async fn create_pull_request(&self, request: CreatePrRequest) -> Result<PullRequest> {
        info!(
            "Creating PR: {} ({} -> {})",
            request.title, request.head, request.base
        );

        let pr = self
            .octocrab
            .pulls(&self.repo.owner, &self.repo.repo)
            .create(&request.title, &request.head, &request.base)
            .body(&request.body)
            .send()
            .await?;

        Ok(convert_pr(pr))
    }

    pub async fn get_pull_request(&self, number: u64) -> Result<PullRequest> {
        debug!("Getting PR #{}", number);

        let pr = self
            .octocrab
            .pulls(&self.repo.owner, &self.repo.repo)
            .get(number)
            .await?;

        Ok(convert_pr(pr))
    }
}

fn convert_pr(pr: octocrab::models::pulls::PullRequest) -> PullRequest {
    let state = if pr.merged_at.is_some() {
        PrState::Merged
    } else {
        match pr.state {
            Some(OctocrabIssueState::Closed) => PrState::Closed,
            _ => PrState::Open,
        }
    };

    PullRequest {
        number: pr.number,
        title: pr.title.unwrap_or_default(),
        body: pr.body,
        state,
        head_branch: pr.head.ref_field,
        base_branch: pr.base.ref_field,
        html_url: pr
            .html_url
            .map(|u| u.to_string())
            .unwrap_or_default(),
    }
}
