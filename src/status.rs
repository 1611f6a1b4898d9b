//! Read-only per-repository state for the `status` and `branches` commands.
//!
//! Collection never fails: a gateway error just leaves that field empty (or
//! shows `(error)` for a branch), so one broken repo cannot hide the others.

use serde::Serialize;

use crate::manifest::Repo;
use crate::pin;
use crate::repository::GitOperations;
use crate::workspace::Context;

pub const DETACHED: &str = "(detached)";
pub const NOT_CLONED: &str = "(not cloned)";
pub const BRANCH_ERROR: &str = "(error)";

/// One row of `agentws status`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepoStatus {
    pub id: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub local: bool,
    pub initialized: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub branch: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub head: String,
    pub dirty: bool,
    /// `lock=<short hash>` when HEAD differs from the pinned commit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lock_diff: Option<String>,
}

impl RepoStatus {
    /// Human label for the STATE column.
    pub fn state(&self) -> String {
        let state = if self.initialized { "cloned" } else { "not cloned" };
        if self.local {
            format!("{} (local)", state)
        } else {
            state.to_string()
        }
    }
}

/// One row of `agentws branches`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BranchInfo {
    pub repo: String,
    pub branch: String,
    pub head: String,
    pub dirty: bool,
}

pub fn collect(ctx: &Context, git: &dyn GitOperations, repo: &Repo) -> RepoStatus {
    let dir = ctx.repo_dir(repo);
    let mut status = RepoStatus {
        id: repo.id.clone(),
        local: repo.is_local(),
        ..Default::default()
    };
    if !git.is_initialized(&dir) {
        return status;
    }
    status.initialized = true;

    if let Ok(branch) = git.current_branch(&dir) {
        status.branch = if branch.is_empty() {
            DETACHED.to_string()
        } else {
            branch
        };
    }
    status.head = git.head_commit(&dir).unwrap_or_default();
    status.dirty = git.is_dirty(&dir).unwrap_or(false);

    if ctx.pinned_commit(&repo.id).is_some() {
        let current = git.head_commit_full(&dir).unwrap_or_default();
        status.lock_diff = pin::drift(ctx.lock.as_ref(), &repo.id, &current);
    }
    status
}

pub fn collect_all(ctx: &Context, git: &dyn GitOperations, repos: &[Repo]) -> Vec<RepoStatus> {
    repos.iter().map(|r| collect(ctx, git, r)).collect()
}

pub fn branch_info(ctx: &Context, git: &dyn GitOperations, repo: &Repo) -> BranchInfo {
    let dir = ctx.repo_dir(repo);
    let mut info = BranchInfo {
        repo: repo.id.clone(),
        ..Default::default()
    };
    if !git.is_initialized(&dir) {
        info.branch = NOT_CLONED.to_string();
        return info;
    }

    info.branch = match git.current_branch(&dir) {
        Ok(branch) if branch.is_empty() => DETACHED.to_string(),
        Ok(branch) => branch,
        Err(_) => BRANCH_ERROR.to_string(),
    };
    info.head = git.head_commit(&dir).unwrap_or_default();
    info.dirty = git.is_dirty(&dir).unwrap_or(false);
    info
}

pub fn branch_infos(ctx: &Context, git: &dyn GitOperations, repos: &[Repo]) -> Vec<BranchInfo> {
    repos.iter().map(|r| branch_info(ctx, git, r)).collect()
}
