//! Dirty working tree handling.
//!
//! A repository with local modifications is handled according to a
//! [`Strategy`]. The handler itself only reports what happened; whether a
//! skipped repo is an error is decided by the caller (sync skips it, the
//! branch flows fail).

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use log::info;

use crate::error::{Error, Result};
use crate::repository::GitOperations;

/// What to do with local modifications.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Strategy {
    /// Leave the repo untouched.
    #[default]
    Safe,
    /// Stash tracked modifications, then proceed.
    Stash,
    /// Hard-reset to HEAD. Needs explicit confirmation.
    Reset,
}

impl FromStr for Strategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "" | "safe" => Ok(Strategy::Safe),
            "stash" => Ok(Strategy::Stash),
            "reset" => Ok(Strategy::Reset),
            other => Err(Error::config(format!(
                "invalid strategy {:?} (expected safe, stash or reset)",
                other
            ))),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::Safe => "safe",
            Strategy::Stash => "stash",
            Strategy::Reset => "reset",
        };
        f.write_str(name)
    }
}

/// Rejects `reset` unless the caller passed `--force`.
pub fn check_confirmation(strategy: Strategy, force: bool) -> Result<()> {
    if strategy == Strategy::Reset && !force {
        return Err(Error::config("--strategy reset requires --force"));
    }
    Ok(())
}

/// Result of applying a strategy to one repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirtyOutcome {
    Clean,
    /// Dirty under `safe`; nothing was touched.
    Skipped,
    Stashed,
    Reset,
}

/// Applies `strategy` to the working tree in `dir`.
///
/// A clean tree is a no-op for every strategy. `reset` is performed
/// unconditionally here; confirmation must already have been checked.
pub fn apply(
    git: &dyn GitOperations,
    dir: &Path,
    repo_id: &str,
    strategy: Strategy,
) -> Result<DirtyOutcome> {
    let dirty = git
        .is_dirty(dir)
        .map_err(|e| e.in_repo(repo_id, "status"))?;
    if !dirty {
        return Ok(DirtyOutcome::Clean);
    }

    match strategy {
        Strategy::Safe => Ok(DirtyOutcome::Skipped),
        Strategy::Stash => {
            info!("{}: stashing local changes", repo_id);
            git.stash(dir).map_err(|e| e.in_repo(repo_id, "stash"))?;
            Ok(DirtyOutcome::Stashed)
        }
        Strategy::Reset => {
            info!("{}: discarding local changes", repo_id);
            git.reset_hard(dir, "HEAD")
                .map_err(|e| e.in_repo(repo_id, "reset"))?;
            Ok(DirtyOutcome::Reset)
        }
    }
}

/// Like [`apply`], but a skipped repo is a [`Error::DirtyTree`].
pub fn require_clean(
    git: &dyn GitOperations,
    dir: &Path,
    repo_id: &str,
    strategy: Strategy,
) -> Result<DirtyOutcome> {
    match apply(git, dir, repo_id, strategy)? {
        DirtyOutcome::Skipped => Err(Error::DirtyTree {
            repo: repo_id.to_string(),
        }),
        outcome => Ok(outcome),
    }
}

/// Reports what [`require_clean`] would do, without touching the tree.
///
/// `Stashed` and `Reset` here mean the strategy would run; nothing is
/// stashed or discarded.
pub fn preview(
    git: &dyn GitOperations,
    dir: &Path,
    repo_id: &str,
    strategy: Strategy,
) -> Result<DirtyOutcome> {
    let dirty = git
        .is_dirty(dir)
        .map_err(|e| e.in_repo(repo_id, "status"))?;
    match (dirty, strategy) {
        (false, _) => Ok(DirtyOutcome::Clean),
        (true, Strategy::Safe) => Err(Error::DirtyTree {
            repo: repo_id.to_string(),
        }),
        (true, Strategy::Stash) => Ok(DirtyOutcome::Stashed),
        (true, Strategy::Reset) => Ok(DirtyOutcome::Reset),
    }
}
