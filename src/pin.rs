//! Pinning the current commits into `workspace.lock.yaml`, and comparing
//! them against HEAD later.

use std::path::PathBuf;

use log::info;

use crate::error::Result;
use crate::lockfile::{self, LockFile, LockedRepo};
use crate::manifest::Repo;
use crate::repository::GitOperations;
use crate::workspace::Context;

/// Number of hash characters shown to users.
pub const SHORT_HASH_LEN: usize = 7;

/// The lock built by [`pin`], plus which repos were left out.
#[derive(Debug, Clone)]
pub struct PinOutcome {
    pub lock: LockFile,
    /// `(repo id, short commit)` for each pinned repo, in manifest order.
    pub pinned: Vec<(String, String)>,
    /// Repos that are not cloned yet.
    pub skipped: Vec<String>,
}

pub fn short_hash(commit: &str) -> &str {
    match commit.char_indices().nth(SHORT_HASH_LEN) {
        Some((end, _)) => &commit[..end],
        None => commit,
    }
}

/// Records url, effective ref and full HEAD commit for every initialized repo.
pub fn pin(ctx: &Context, git: &dyn GitOperations, repos: &[Repo]) -> Result<PinOutcome> {
    let mut outcome = PinOutcome {
        lock: LockFile::new(&ctx.manifest.name),
        pinned: Vec::new(),
        skipped: Vec::new(),
    };

    for repo in repos {
        let dir = ctx.repo_dir(repo);
        if !git.is_initialized(&dir) {
            info!("not pinning {}: not cloned", repo.id);
            outcome.skipped.push(repo.id.clone());
            continue;
        }
        let commit = git
            .head_commit_full(&dir)
            .map_err(|e| e.in_repo(&repo.id, "read HEAD"))?;

        outcome
            .pinned
            .push((repo.id.clone(), short_hash(&commit).to_string()));
        outcome.lock.repos.insert(
            repo.id.clone(),
            LockedRepo {
                url: repo.url.clone().filter(|u| !u.is_empty()),
                r#ref: repo.effective_ref().to_string(),
                commit,
            },
        );
    }
    Ok(outcome)
}

/// Writes `lock` to the workspace's lock path.
pub fn write(ctx: &Context, lock: &LockFile) -> Result<PathBuf> {
    lockfile::save(&ctx.lock_path, lock)?;
    Ok(ctx.lock_path.clone())
}

/// `lock=<short hash>` when HEAD differs from the pinned commit.
///
/// No lock, no entry for the repo, or an unreadable HEAD (empty string) all
/// mean no drift.
pub fn drift(lock: Option<&LockFile>, repo_id: &str, current_full: &str) -> Option<String> {
    let pinned = lock?.pinned_commit(repo_id)?;
    if current_full.is_empty() || current_full == pinned {
        return None;
    }
    Some(format!("lock={}", short_hash(pinned)))
}
