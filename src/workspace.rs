//! Per-invocation workspace context.
//!
//! A [`Context`] is resolved once at the start of every command: the absolute
//! workspace root, the validated manifest and the lock file when one exists.
//! It is passed by reference into every operation and never mutated, so no
//! command depends on process-wide state.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{Error, Result};
use crate::lockfile::{self, LockFile};
use crate::manifest::{self, Defaults, Repo, Workspace, MANIFEST_VERSION};

/// Manifest file name inside the workspace root.
pub const MANIFEST_FILE: &str = "workspace.yaml";

/// Lock file name inside the workspace root.
pub const LOCK_FILE: &str = "workspace.lock.yaml";

/// Resolved paths plus the loaded manifest and optional lock file.
#[derive(Debug, Clone)]
pub struct Context {
    pub root: PathBuf,
    pub manifest_path: PathBuf,
    pub lock_path: PathBuf,
    pub manifest: Workspace,
    /// `None` when no lock file exists; that is a normal state.
    pub lock: Option<LockFile>,
}

impl Context {
    /// Resolves `root`, then loads the manifest and, if present, the lock file.
    pub fn load(root: &Path) -> Result<Self> {
        let root = std::path::absolute(root)?;
        let manifest_path = root.join(MANIFEST_FILE);
        let lock_path = root.join(LOCK_FILE);

        let manifest = manifest::load(&manifest_path)?;
        let lock = if lock_path.is_file() {
            Some(lockfile::load(&lock_path)?)
        } else {
            None
        };
        debug!(
            "loaded workspace {} ({} repos, lock: {})",
            manifest.name,
            manifest.repos.len(),
            lock.is_some()
        );

        Ok(Self {
            root,
            manifest_path,
            lock_path,
            manifest,
            lock,
        })
    }

    /// Builds a context from already-loaded parts.
    pub fn from_parts(root: PathBuf, manifest: Workspace, lock: Option<LockFile>) -> Self {
        Self {
            manifest_path: root.join(MANIFEST_FILE),
            lock_path: root.join(LOCK_FILE),
            root,
            manifest,
            lock,
        }
    }

    /// Absolute directory of a repo inside the workspace.
    pub fn repo_dir(&self, repo: &Repo) -> PathBuf {
        self.root.join(&repo.path)
    }

    pub fn defaults(&self) -> &Defaults {
        &self.manifest.defaults
    }

    /// The commit pinned for a repo, if a lock file is loaded and lists it.
    pub fn pinned_commit(&self, repo_id: &str) -> Option<&str> {
        self.lock.as_ref().and_then(|l| l.pinned_commit(repo_id))
    }
}

/// Options for creating a new workspace manifest.
#[derive(Debug, Clone, Default)]
pub struct InitOptions {
    pub name: String,
    pub repos_root: Option<String>,
    pub base_ref: Option<String>,
    pub force: bool,
}

/// Creates `root` (if needed) and writes an empty, valid manifest into it.
pub fn init(root: &Path, options: &InitOptions) -> Result<PathBuf> {
    let manifest_path = root.join(MANIFEST_FILE);
    if manifest_path.exists() && !options.force {
        return Err(Error::config(format!(
            "{} already exists (use --force to overwrite)",
            manifest_path.display()
        )));
    }

    let workspace = Workspace {
        version: MANIFEST_VERSION,
        name: options.name.clone(),
        repos_root: options.repos_root.clone().filter(|r| !r.is_empty()),
        defaults: Defaults {
            base_ref: options.base_ref.clone().filter(|b| !b.is_empty()),
            ..Default::default()
        },
        ..Default::default()
    };
    manifest::validate(&workspace)?;

    fs::create_dir_all(root)?;
    manifest::save(&manifest_path, &workspace)?;
    Ok(manifest_path)
}

/// Deletes the whole workspace directory.
///
/// Refuses without `force`, refuses the filesystem root and refuses any
/// directory that does not contain a manifest.
pub fn clean(root: &Path, force: bool) -> Result<PathBuf> {
    if !force {
        return Err(Error::config("clean is destructive; pass --force to confirm"));
    }
    let root = std::path::absolute(root)?;
    if root.parent().is_none() {
        return Err(Error::config(format!(
            "refusing to clean root directory: {}",
            root.display()
        )));
    }
    if !root.join(MANIFEST_FILE).is_file() {
        return Err(Error::config(format!(
            "refusing to clean {}: no {} found (not a workspace directory)",
            root.display(),
            MANIFEST_FILE
        )));
    }
    fs::remove_dir_all(&root)?;
    Ok(root)
}
