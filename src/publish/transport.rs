//! Git transport for the published artifact tree
//!
//! Pushes the built site to a hosting branch (e.g. `gh-pages`) of a git
//! repository. The branch is materialized in a temporary worktree, so the
//! repository's checked-out branch is never switched and an interrupted
//! deploy cannot strand the user on the publish branch. Authentication is
//! whatever the ambient git configuration provides; no credentials pass
//! through this crate.

use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Git command failed: {0}")]
    CommandFailed(String),
    #[error("Not a git repository: {0}")]
    NotAGitRepo(PathBuf),
    #[error("Artifact directory does not exist: {0}")]
    ArtifactsMissing(PathBuf),
    #[error("No publish repository configured; set [publish] repo_dir in config.toml")]
    NotConfigured,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Outcome of one deploy attempt
#[derive(Debug, Clone)]
pub struct DeployResult {
    /// Whether anything was pushed to the remote
    pub pushed: bool,
    /// Commit SHA of the published tree, when a commit was made
    pub commit_sha: Option<String>,
    /// Human-readable outcome for display
    pub message: String,
}

/// Pushes artifact trees to a hosting branch of a git repository
#[derive(Debug, Clone)]
pub struct GitTransport {
    repo_dir: PathBuf,
    remote: String,
    branch: String,
}

impl GitTransport {
    pub fn new(repo_dir: PathBuf, remote: impl Into<String>, branch: impl Into<String>) -> Self {
        Self {
            repo_dir,
            remote: remote.into(),
            branch: branch.into(),
        }
    }

    /// Replace the publish branch's tree with `artifacts_dir` and push.
    ///
    /// No content change means no commit and no push; that is a successful
    /// no-op, not an error. Failures are retryable: the built artifacts are
    /// never modified by this call.
    pub fn deploy(&self, artifacts_dir: &Path) -> Result<DeployResult, TransportError> {
        if !artifacts_dir.is_dir() {
            return Err(TransportError::ArtifactsMissing(artifacts_dir.to_path_buf()));
        }
        self.validate_git_repo()?;

        // Branch state may have moved on the remote since the last deploy
        let _ = self.git(&self.repo_dir, &["fetch", &self.remote, &self.branch]);

        // Unique per call so concurrent deploys never share a worktree
        let worktree = std::env::temp_dir().join(format!(
            "stride-publish-{}-{}",
            std::process::id(),
            Uuid::new_v4().as_simple()
        ));

        let result = self.deploy_via_worktree(artifacts_dir, &worktree);

        // Always detach the worktree, even when the deploy failed
        let _ = self.git(
            &self.repo_dir,
            &[
                "worktree",
                "remove",
                "--force",
                worktree.to_str().unwrap_or_default(),
            ],
        );
        let _ = self.git(&self.repo_dir, &["worktree", "prune"]);
        if worktree.exists() {
            let _ = fs::remove_dir_all(&worktree);
        }

        result
    }

    fn deploy_via_worktree(
        &self,
        artifacts_dir: &Path,
        worktree: &Path,
    ) -> Result<DeployResult, TransportError> {
        self.checkout_publish_branch(worktree)?;

        replace_dir_contents(worktree, artifacts_dir)?;

        self.git(worktree, &["add", "-A"])?;

        let staged = self.git_stdout(worktree, &["diff", "--cached", "--name-only"])?;
        if staged.trim().is_empty() {
            tracing::info!(branch = %self.branch, "Site unchanged; nothing to push");
            return Ok(DeployResult {
                pushed: false,
                commit_sha: None,
                message: "No changes detected in site output; nothing to commit or push"
                    .to_string(),
            });
        }

        let message = format!("Update site: {}", Local::now().format("%Y-%m-%d %H:%M:%S"));
        self.git(worktree, &["commit", "-m", &message])?;
        let sha = self.git_stdout(worktree, &["rev-parse", "HEAD"])?.trim().to_string();

        self.git(worktree, &["push", &self.remote, &self.branch])?;

        tracing::info!(
            branch = %self.branch,
            remote = %self.remote,
            sha = %sha,
            "Pushed site"
        );

        Ok(DeployResult {
            pushed: true,
            message: format!("Deployed to {}/{} at {}", self.remote, self.branch, sha),
            commit_sha: Some(sha),
        })
    }

    /// Check out the publish branch into the worktree, creating it as an
    /// orphan branch when it exists neither locally nor on the remote.
    fn checkout_publish_branch(&self, worktree: &Path) -> Result<(), TransportError> {
        let worktree_str = worktree.to_str().unwrap_or_default();

        if self.local_branch_exists()? {
            self.git(
                &self.repo_dir,
                &["worktree", "add", worktree_str, &self.branch],
            )?;
            return Ok(());
        }

        let remote_ref = format!("{}/{}", self.remote, self.branch);
        if self.remote_ref_exists(&remote_ref)? {
            self.git(
                &self.repo_dir,
                &["worktree", "add", "-b", &self.branch, worktree_str, &remote_ref],
            )?;
            return Ok(());
        }

        // First publish: branch doesn't exist anywhere yet
        self.git(
            &self.repo_dir,
            &["worktree", "add", "--detach", worktree_str],
        )?;
        self.git(worktree, &["checkout", "--orphan", &self.branch])?;
        let _ = self.git(worktree, &["rm", "-rf", "--cached", "."]);
        Ok(())
    }

    fn local_branch_exists(&self) -> Result<bool, TransportError> {
        let output = Command::new("git")
            .args(["show-ref", "--verify", &format!("refs/heads/{}", self.branch)])
            .current_dir(&self.repo_dir)
            .output()?;
        Ok(output.status.success())
    }

    fn remote_ref_exists(&self, remote_ref: &str) -> Result<bool, TransportError> {
        let output = Command::new("git")
            .args([
                "show-ref",
                "--verify",
                &format!("refs/remotes/{remote_ref}"),
            ])
            .current_dir(&self.repo_dir)
            .output()?;
        Ok(output.status.success())
    }

    fn validate_git_repo(&self) -> Result<(), TransportError> {
        let output = Command::new("git")
            .args(["rev-parse", "--is-inside-work-tree"])
            .current_dir(&self.repo_dir)
            .output()
            .map_err(|_| TransportError::NotAGitRepo(self.repo_dir.clone()))?;

        if !output.status.success() {
            return Err(TransportError::NotAGitRepo(self.repo_dir.clone()));
        }
        Ok(())
    }

    fn git(&self, dir: &Path, args: &[&str]) -> Result<(), TransportError> {
        let output = Command::new("git").args(args).current_dir(dir).output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TransportError::CommandFailed(format!(
                "git {}: {}",
                args.join(" "),
                stderr.trim()
            )));
        }
        Ok(())
    }

    fn git_stdout(&self, dir: &Path, args: &[&str]) -> Result<String, TransportError> {
        let output = Command::new("git").args(args).current_dir(dir).output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TransportError::CommandFailed(format!(
                "git {}: {}",
                args.join(" "),
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

/// Delete everything in `dir` except .git, then copy `src` contents in.
fn replace_dir_contents(dir: &Path, src: &Path) -> std::io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.file_name().is_some_and(|n| n == ".git") {
            continue;
        }
        if path.is_dir() {
            fs::remove_dir_all(&path)?;
        } else {
            fs::remove_file(&path)?;
        }
    }
    copy_dir_contents(src, dir)
}

fn copy_dir_contents(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let target = dst.join(entry.file_name());
        if entry.path().is_dir() {
            fs::create_dir_all(&target)?;
            copy_dir_contents(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}
