//! Branch resolution for the checkout and start flows.
//!
//! Resolution is split in two so callers can validate configuration before
//! touching the working tree: [`resolve_start_point`] runs first and may fail
//! with a configuration error, then the dirty-tree strategy is applied, then
//! [`resolve_action`] picks one [`BranchAction`]. An action can be described
//! without being executed, which is all dry-run needs.

use std::fmt;
use std::path::Path;

use crate::error::{Error, Result};
use crate::manifest::{Defaults, Repo};
use crate::repository::GitOperations;

/// Prefix used by `start` when none is given.
pub const DEFAULT_PREFIX: &str = "feature";

/// What switching one repository to a branch will do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchAction {
    CheckoutExisting { branch: String },
    CreateTracking { branch: String },
    CreateNew { branch: String, from: String },
    SkipNotFound { branch: String },
}

impl BranchAction {
    pub fn branch(&self) -> &str {
        match self {
            BranchAction::CheckoutExisting { branch }
            | BranchAction::CreateTracking { branch }
            | BranchAction::CreateNew { branch, .. }
            | BranchAction::SkipNotFound { branch } => branch,
        }
    }

    /// Performs the action. Skipping is a no-op.
    pub fn execute(&self, git: &dyn GitOperations, dir: &Path) -> Result<()> {
        match self {
            BranchAction::CheckoutExisting { branch } => git.checkout(dir, branch),
            BranchAction::CreateTracking { branch } => git.create_tracking_branch(dir, branch),
            BranchAction::CreateNew { branch, from } => git.create_branch(dir, branch, from),
            BranchAction::SkipNotFound { .. } => Ok(()),
        }
    }
}

impl fmt::Display for BranchAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BranchAction::CheckoutExisting { branch } => {
                write!(f, "checkout existing local branch {}", branch)
            }
            BranchAction::CreateTracking { branch } => {
                write!(f, "create tracking branch {} from origin", branch)
            }
            BranchAction::CreateNew { branch, from } => {
                write!(f, "create new branch {} from {}", branch, from)
            }
            BranchAction::SkipNotFound { branch } => {
                write!(f, "skip (branch {} not found)", branch)
            }
        }
    }
}

/// The branch a repository should end up on.
#[derive(Debug, Clone, Copy)]
pub struct BranchRequest<'a> {
    pub branch: &'a str,
    /// Create the branch when neither a local nor a remote one exists.
    pub create: bool,
    /// Explicit starting point, overriding any base ref.
    pub from: Option<&'a str>,
}

/// Builds `<prefix>/<ticket>[-<slug>]`.
pub fn branch_name(prefix: &str, ticket: &str, slug: Option<&str>) -> String {
    match slug.filter(|s| !s.is_empty()) {
        Some(slug) => format!("{}/{}-{}", prefix, ticket, slug),
        None => format!("{}/{}", prefix, ticket),
    }
}

/// Resolves where a new branch would start, if one will be created.
///
/// Returns `None` when no branch needs creating. Fails with a configuration
/// error when creation is needed but neither `--from` nor a base ref is set.
pub fn resolve_start_point(
    git: &dyn GitOperations,
    dir: &Path,
    request: &BranchRequest<'_>,
    repo: &Repo,
    defaults: &Defaults,
) -> Result<Option<String>> {
    if !request.create {
        return Ok(None);
    }
    if git.local_branch_exists(dir, request.branch)? {
        return Ok(None);
    }
    if !repo.is_local() && git.remote_branch_exists(dir, request.branch)? {
        return Ok(None);
    }

    if let Some(from) = request.from {
        return Ok(Some(from.to_string()));
    }
    match repo.effective_base_ref(defaults) {
        Some(base) if repo.is_local() => Ok(Some(base.to_string())),
        Some(base) => Ok(Some(format!("origin/{}", base))),
        None => Err(Error::config(
            "base_ref is not configured (set base_ref in workspace.yaml or use --from)",
        )),
    }
}

/// Picks the action for a repository. First match wins: existing local
/// branch, remote branch (non-local repos only), creation, skip.
pub fn resolve_action(
    git: &dyn GitOperations,
    dir: &Path,
    request: &BranchRequest<'_>,
    is_local: bool,
    start_point: Option<&str>,
) -> Result<BranchAction> {
    let branch = request.branch.to_string();
    if git.local_branch_exists(dir, request.branch)? {
        return Ok(BranchAction::CheckoutExisting { branch });
    }
    if !is_local && git.remote_branch_exists(dir, request.branch)? {
        return Ok(BranchAction::CreateTracking { branch });
    }
    if request.create {
        let from = start_point
            .or(request.from)
            .ok_or_else(|| Error::config(format!("no starting point for branch {}", branch)))?;
        return Ok(BranchAction::CreateNew {
            branch,
            from: from.to_string(),
        });
    }
    Ok(BranchAction::SkipNotFound { branch })
}
