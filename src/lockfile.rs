//! Parsing and writing of `workspace.lock.yaml`.
//!
//! A lock file records the exact commit each repository was at when it was
//! pinned. Sync in lock mode checks those commits out instead of the manifest
//! refs. Repos are kept in a `BTreeMap` so the written document has a stable
//! key order.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Schema version written into new lock files.
pub const LOCK_VERSION: u32 = 1;

/// The `workspace.lock.yaml` document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LockFile {
    pub version: u32,
    pub name: String,
    /// RFC 3339 timestamp of the pin.
    pub generated_at: String,
    pub tool_version: String,
    #[serde(default)]
    pub repos: BTreeMap<String, LockedRepo>,
}

/// The pinned state of one repository.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LockedRepo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(rename = "ref")]
    pub r#ref: String,
    /// Full commit hash.
    pub commit: String,
}

impl LockFile {
    /// Starts an empty lock file stamped with the current time and this
    /// build's version.
    pub fn new(name: &str) -> Self {
        Self {
            version: LOCK_VERSION,
            name: name.to_string(),
            generated_at: chrono::Local::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            repos: BTreeMap::new(),
        }
    }

    /// The pinned commit for a repo id, if one was recorded.
    pub fn pinned_commit(&self, repo_id: &str) -> Option<&str> {
        self.repos.get(repo_id).map(|r| r.commit.as_str())
    }
}

/// Reads a lock file from disk.
pub fn load(path: &Path) -> Result<LockFile> {
    let content = fs::read_to_string(path)?;
    parse(&content)
}

/// Parses lock file YAML.
pub fn parse(content: &str) -> Result<LockFile> {
    serde_yaml::from_str(content).map_err(|e| Error::config(format!("parsing lock file: {}", e)))
}

/// Writes a lock file to disk, replacing any previous one.
pub fn save(path: &Path, lock: &LockFile) -> Result<()> {
    let yaml = serde_yaml::to_string(lock)?;
    fs::write(path, yaml)?;
    Ok(())
}
