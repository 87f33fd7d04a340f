//! Git working directories for sessions, one per workflow id.

use std::path::{Path, PathBuf};

use tokio::process::Command;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{EngineError, Result};

#[derive(Clone)]
pub struct WorkspaceManager {
    root: PathBuf,
}

impl WorkspaceManager {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, workflow_id: Uuid) -> PathBuf {
        self.root.join(workflow_id.to_string())
    }

    /// Clone the repository fresh into the session's directory and create
    /// the working branch. Re-running the phase replaces any half-finished
    /// checkout from a failed attempt.
    pub async fn prepare(
        &self,
        workflow_id: Uuid,
        repo_url: &str,
        branch: &str,
    ) -> Result<PathBuf> {
        let target = self.path_for(workflow_id);

        if target.exists() {
            tokio::fs::remove_dir_all(&target)
                .await
                .map_err(|e| EngineError::Workspace(format!("failed to reset {}: {}", target.display(), e)))?;
        }
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| EngineError::Workspace(format!("failed to create {}: {}", self.root.display(), e)))?;

        info!(repo_url, directory = %target.display(), "Cloning repository");

        let target_str = target
            .to_str()
            .ok_or_else(|| EngineError::Workspace(format!("invalid path {}", target.display())))?;
        run_git(&["clone", repo_url, target_str], &self.root).await?;
        run_git(&["checkout", "-b", branch], &target).await?;

        Ok(target)
    }

    /// Push the session branch to origin so a pull request can reference it.
    pub async fn push(&self, workdir: &Path, branch: &str) -> Result<()> {
        info!(branch, "Pushing branch to origin");
        run_git(&["push", "-u", "origin", branch], workdir).await?;
        Ok(())
    }
}

async fn run_git(args: &[&str], cwd: &Path) -> Result<String> {
    debug!("Running git {:?} in {:?}", args, cwd);

    let output = Command::new("git")
        .args(args)
        .current_dir(cwd)
        .output()
        .await
        .map_err(|e| EngineError::Workspace(format!("failed to spawn git: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(EngineError::Workspace(format!(
            "git {} failed: {}",
            args.join(" "),
            stderr.trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
