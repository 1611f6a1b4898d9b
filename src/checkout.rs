//! Switching repositories to a branch, one repository at a time.
//!
//! This drives both `checkout` and `start`. Each repository goes through the
//! same steps: skip it if it has not been cloned, fetch (remote repos only),
//! resolve the starting point, apply the dirty-tree strategy, resolve the
//! action, then execute it. A dry run only inspects the working tree and
//! describes what would happen.

use std::fmt;
use std::path::Path;

use log::{info, warn};

use crate::branch::{self, BranchAction, BranchRequest};
use crate::dirty::{self, DirtyOutcome, Strategy};
use crate::error::{Error, Result};
use crate::manifest::Repo;
use crate::repository::GitOperations;
use crate::workspace::Context;

/// Parameters shared by every repository in one checkout or start run.
#[derive(Debug, Clone, Default)]
pub struct SwitchOptions {
    pub branch: String,
    pub create: bool,
    pub from: Option<String>,
    pub strategy: Strategy,
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchOutcome {
    NotInitialized,
    /// Dry run: the action that would have been taken, and what the
    /// strategy would have done to local changes first.
    Planned {
        action: BranchAction,
        dirty: DirtyOutcome,
    },
    Applied(BranchAction),
    /// A non-required repo failed; the run continued.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchResult {
    pub repo: String,
    pub outcome: SwitchOutcome,
}

impl fmt::Display for SwitchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            SwitchOutcome::NotInitialized => write!(f, "Skipping {} (not cloned)", self.repo),
            SwitchOutcome::Planned { action, dirty } => {
                write!(f, "[dry-run] {}: {}", self.repo, action)?;
                match dirty {
                    DirtyOutcome::Stashed => f.write_str(" (after stashing local changes)"),
                    DirtyOutcome::Reset => f.write_str(" (after discarding local changes)"),
                    DirtyOutcome::Clean | DirtyOutcome::Skipped => Ok(()),
                }
            }
            SwitchOutcome::Applied(action) => write!(f, "{}: {}", self.repo, action),
            SwitchOutcome::Failed(error) => write!(f, "{}: failed: {}", self.repo, error),
        }
    }
}

/// Switches a single repository.
pub fn switch_repo(
    ctx: &Context,
    git: &dyn GitOperations,
    repo: &Repo,
    options: &SwitchOptions,
) -> Result<SwitchOutcome> {
    let dir = ctx.repo_dir(repo);
    if !git.is_initialized(&dir) {
        return Ok(SwitchOutcome::NotInitialized);
    }

    if !repo.is_local() {
        git.fetch(&dir).map_err(|e| e.in_repo(&repo.id, "fetch"))?;
    }

    let request = BranchRequest {
        branch: &options.branch,
        create: options.create,
        from: options.from.as_deref(),
    };
    let start_point = branch::resolve_start_point(git, &dir, &request, repo, ctx.defaults())
        .map_err(|e| e.in_repo(&repo.id, "resolve start point"))?;

    if options.dry_run {
        let tree = dirty::preview(git, &dir, &repo.id, options.strategy)?;
        let action = resolve(git, &dir, &request, repo, start_point.as_deref())?;
        return Ok(SwitchOutcome::Planned { action, dirty: tree });
    }

    dirty::require_clean(git, &dir, &repo.id, options.strategy)?;
    let action = resolve(git, &dir, &request, repo, start_point.as_deref())?;
    action
        .execute(git, &dir)
        .map_err(|e| e.in_repo(&repo.id, "checkout"))?;
    info!("{}: {}", repo.id, action);
    Ok(SwitchOutcome::Applied(action))
}

fn resolve(
    git: &dyn GitOperations,
    dir: &Path,
    request: &BranchRequest<'_>,
    repo: &Repo,
    start_point: Option<&str>,
) -> Result<BranchAction> {
    branch::resolve_action(git, dir, request, repo.is_local(), start_point)
        .map_err(|e| e.in_repo(&repo.id, "resolve branch"))
}

/// Switches `repos` in order, calling `report` after each one.
///
/// Configuration and dirty-tree errors stop the run. Other failures stop it
/// only for required repos; a non-required repo is logged and skipped.
pub fn switch_repos(
    ctx: &Context,
    git: &dyn GitOperations,
    repos: &[Repo],
    options: &SwitchOptions,
    mut report: impl FnMut(&SwitchResult),
) -> Result<Vec<SwitchResult>> {
    let mut results = Vec::with_capacity(repos.len());
    for repo in repos {
        let outcome = match switch_repo(ctx, git, repo, options) {
            Ok(outcome) => outcome,
            Err(e) if is_fatal(&e, repo) => return Err(e),
            Err(e) => {
                warn!("{} (non-required, continuing)", e);
                SwitchOutcome::Failed(e.to_string())
            }
        };
        let result = SwitchResult {
            repo: repo.id.clone(),
            outcome,
        };
        report(&result);
        results.push(result);
    }
    Ok(results)
}

fn is_fatal(error: &Error, repo: &Repo) -> bool {
    repo.is_required() || error.is_config() || matches!(error, Error::DirtyTree { .. })
}
