//! # Version-Control Gateway
//!
//! Every operation that touches a repository goes through the
//! [`GitOperations`] trait rather than calling the `git` module directly. The
//! production implementation, [`DefaultGitOperations`], shells out to the
//! system `git` binary; tests substitute [`mock::MockGit`], an in-memory double
//! that can simulate dirty trees, detached heads, missing branches and network
//! failures without spawning a process.
//!
//! The trait is `Send + Sync` so a single gateway can be shared by reference
//! across the sync engine's worker threads.

use std::path::Path;

use crate::error::Result;
pub use crate::git::CloneOptions;

/// The version-control capabilities the workspace engine needs.
pub trait GitOperations: Send + Sync {
    /// True when `dir` is already a git repository.
    fn is_initialized(&self, dir: &Path) -> bool;

    /// Clones `url` into `dir`.
    fn clone_repo(&self, url: &str, dir: &Path, options: &CloneOptions) -> Result<()>;

    /// Creates a remote-less repository with an initial commit.
    fn init_local(&self, dir: &Path) -> Result<()>;

    /// Updates remote-tracking branches from `origin`.
    fn fetch(&self, dir: &Path) -> Result<()>;

    /// Checks out a branch name or commit hash.
    fn checkout(&self, dir: &Path, git_ref: &str) -> Result<()>;

    /// The checked-out branch; empty when HEAD is detached.
    fn current_branch(&self, dir: &Path) -> Result<String>;

    /// Abbreviated HEAD commit.
    fn head_commit(&self, dir: &Path) -> Result<String>;

    /// Full HEAD commit hash.
    fn head_commit_full(&self, dir: &Path) -> Result<String>;

    fn is_dirty(&self, dir: &Path) -> Result<bool>;

    fn local_branch_exists(&self, dir: &Path, branch: &str) -> Result<bool>;

    fn remote_branch_exists(&self, dir: &Path, branch: &str) -> Result<bool>;

    /// Creates `branch` at `from` and checks it out. Must not configure
    /// upstream tracking.
    fn create_branch(&self, dir: &Path, branch: &str, from: &str) -> Result<()>;

    /// Creates `branch` tracking `origin/<branch>` and checks it out.
    fn create_tracking_branch(&self, dir: &Path, branch: &str) -> Result<()>;

    /// Stashes tracked local modifications.
    fn stash(&self, dir: &Path) -> Result<()>;

    /// Discards local modifications by resetting to `git_ref`.
    fn reset_hard(&self, dir: &Path, git_ref: &str) -> Result<()>;

    /// The branch a remote's HEAD points at.
    fn detect_default_branch(&self, url: &str) -> Result<String>;
}

/// The default implementation of `GitOperations`, which uses the system's
/// `git` command to perform real Git operations.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultGitOperations;

impl GitOperations for DefaultGitOperations {
    fn is_initialized(&self, dir: &Path) -> bool {
        crate::git::is_initialized(dir)
    }

    fn clone_repo(&self, url: &str, dir: &Path, options: &CloneOptions) -> Result<()> {
        crate::git::clone_repo(url, dir, options)
    }

    fn init_local(&self, dir: &Path) -> Result<()> {
        crate::git::init_local(dir)
    }

    fn fetch(&self, dir: &Path) -> Result<()> {
        crate::git::fetch(dir)
    }

    fn checkout(&self, dir: &Path, git_ref: &str) -> Result<()> {
        crate::git::checkout(dir, git_ref)
    }

    fn current_branch(&self, dir: &Path) -> Result<String> {
        crate::git::current_branch(dir)
    }

    fn head_commit(&self, dir: &Path) -> Result<String> {
        crate::git::head_commit(dir)
    }

    fn head_commit_full(&self, dir: &Path) -> Result<String> {
        crate::git::head_commit_full(dir)
    }

    fn is_dirty(&self, dir: &Path) -> Result<bool> {
        crate::git::is_dirty(dir)
    }

    fn local_branch_exists(&self, dir: &Path, branch: &str) -> Result<bool> {
        crate::git::local_branch_exists(dir, branch)
    }

    fn remote_branch_exists(&self, dir: &Path, branch: &str) -> Result<bool> {
        crate::git::remote_branch_exists(dir, branch)
    }

    fn create_branch(&self, dir: &Path, branch: &str, from: &str) -> Result<()> {
        crate::git::create_branch(dir, branch, from)
    }

    fn create_tracking_branch(&self, dir: &Path, branch: &str) -> Result<()> {
        crate::git::create_tracking_branch(dir, branch)
    }

    fn stash(&self, dir: &Path) -> Result<()> {
        crate::git::stash(dir)
    }

    fn reset_hard(&self, dir: &Path, git_ref: &str) -> Result<()> {
        crate::git::reset_hard(dir, git_ref)
    }

    fn detect_default_branch(&self, url: &str) -> Result<String> {
        crate::git::default_branch(url)
    }
}
