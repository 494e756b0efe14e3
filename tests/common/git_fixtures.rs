//! Git repository test fixtures
//!
//! Provides utilities for creating temporary git repositories with a bare
//! "origin" remote, so transport tests can push without touching the
//! network.

use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// A temporary git repository wired to a local bare origin
///
/// Both repositories live inside the same temp directory and are cleaned
/// up when the `TestRepo` is dropped.
pub struct TestRepo {
    /// TempDir handle (keeps directories alive until dropped)
    _dir: TempDir,
    /// Path to the working repository root
    pub path: PathBuf,
    /// Path to the bare origin repository
    pub origin: PathBuf,
}

impl TestRepo {
    /// Create a working repository with an initial commit and a bare
    /// origin it can push to.
    ///
    /// The repository has:
    /// - Git initialized with a `main` default branch
    /// - User configured (test@example.com)
    /// - GPG signing disabled (for CI compatibility)
    /// - A README.md file in one initial commit, pushed to origin
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let origin = dir.path().join("origin.git");
        let path = dir.path().join("work");
        std::fs::create_dir_all(&path).unwrap();

        Self::git(dir.path(), &["init", "--bare", origin.to_str().unwrap()]);

        Self::git(&path, &["init", "-b", "main"]);
        Self::git(&path, &["config", "user.email", "test@example.com"]);
        Self::git(&path, &["config", "user.name", "Test User"]);
        // Disable GPG signing to ensure tests work on machines with global signing enabled
        Self::git(&path, &["config", "commit.gpgsign", "false"]);
        Self::git(&path, &["remote", "add", "origin", origin.to_str().unwrap()]);

        std::fs::write(path.join("README.md"), "# Test Repository\n").unwrap();
        Self::git(&path, &["add", "."]);
        Self::git(&path, &["commit", "-m", "Initial commit"]);
        Self::git(&path, &["push", "-u", "origin", "main"]);

        Self {
            _dir: dir,
            path,
            origin,
        }
    }

    /// List the file paths present on a branch of the origin repository.
    /// Empty when the branch doesn't exist.
    pub fn origin_files(&self, branch: &str) -> Vec<String> {
        let output = Command::new("git")
            .args(["ls-tree", "-r", branch, "--name-only"])
            .current_dir(&self.origin)
            .output()
            .expect("Failed to run git ls-tree");

        if !output.status.success() {
            return Vec::new();
        }

        String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(|l| l.to_string())
            .collect()
    }

    /// Number of commits on a branch of the origin repository.
    pub fn origin_commit_count(&self, branch: &str) -> usize {
        let output = Command::new("git")
            .args(["rev-list", "--count", branch])
            .current_dir(&self.origin)
            .output()
            .expect("Failed to run git rev-list");

        if !output.status.success() {
            return 0;
        }

        String::from_utf8_lossy(&output.stdout)
            .trim()
            .parse()
            .unwrap_or(0)
    }

    /// Current branch of the working repository.
    pub fn current_branch(&self) -> String {
        let output = Command::new("git")
            .args(["rev-parse", "--abbrev-ref", "HEAD"])
            .current_dir(&self.path)
            .output()
            .expect("Failed to run git rev-parse");
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    }

    fn git(dir: &Path, args: &[&str]) {
        let output = Command::new("git")
            .args(args)
            .current_dir(dir)
            .output()
            .unwrap_or_else(|e| panic!("Failed to run git {args:?}: {e}"));
        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }
}

impl Default for TestRepo {
    fn default() -> Self {
        Self::new()
    }
}
