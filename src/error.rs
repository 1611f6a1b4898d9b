//! # Error Handling
//!
//! This module defines the centralized error type for `agentws`. It uses the
//! `thiserror` library to build a single `Error` enum covering every failure
//! the library can report, with messages that name the repository and the
//! operation involved wherever one exists.
//!
//! ## Taxonomy
//!
//! - **Configuration errors** (`ManifestInvalid`, `Config`, `UnknownProfile`):
//!   raised before any repository is touched and never retried.
//! - **Dirty-tree errors** (`DirtyTree`): a working tree with local
//!   modifications under the `safe` strategy. Only fatal in single-repo flows;
//!   the sync engine turns the same condition into a skip.
//! - **Version-control errors** (`GitCommand`, `PostSync`), usually wrapped in
//!   `RepoOperation` so the message carries the repo id and operation name.
//!
//! `Result<T>` is the crate-wide alias for `std::result::Result<T, Error>`.

use thiserror::Error;

/// Main error type for agentws operations
#[derive(Error, Debug)]
pub enum Error {
    /// The workspace manifest failed schema validation.
    ///
    /// Includes the offending field and optionally a hint about how to fix it.
    #[error("manifest: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    ManifestInvalid {
        message: String,
        /// Optional hint for how to fix the manifest
        hint: Option<String>,
    },

    /// Any other configuration problem: bad flag values, an unresolvable base
    /// ref, a destructive strategy without confirmation.
    #[error("{message}")]
    Config { message: String },

    /// A profile name that the manifest does not define.
    #[error("profile {name:?} not found in manifest")]
    UnknownProfile { name: String },

    /// The working tree has local modifications and the strategy is `safe`.
    #[error("repo {repo} has uncommitted changes (use --strategy stash or reset)")]
    DirtyTree { repo: String },

    /// A `git` subprocess failed or could not be spawned.
    #[error("git {command} failed in {dir}: {stderr}")]
    GitCommand {
        command: String,
        dir: String,
        stderr: String,
    },

    /// A per-repository step failed; wraps the underlying cause.
    #[error("repo {repo}: {operation}: {source}")]
    RepoOperation {
        repo: String,
        operation: String,
        #[source]
        source: Box<Error>,
    },

    /// A post-sync command could not be started or exited unsuccessfully.
    #[error("command `{command}` {status}")]
    PostSync { command: String, status: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML error, wrapped from `serde_yaml::Error`.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A JSON serialization error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A mutex guarding shared state was poisoned by a panicking task.
    #[error("Lock poisoned: {context}")]
    LockPoisoned { context: String },
}

impl Error {
    /// Shorthand for a [`Error::Config`] error.
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
        }
    }

    /// Shorthand for a [`Error::ManifestInvalid`] error without a hint.
    pub fn manifest(message: impl Into<String>) -> Self {
        Error::ManifestInvalid {
            message: message.into(),
            hint: None,
        }
    }

    /// Wraps `self` with the repository id and the operation that failed.
    pub fn in_repo(self, repo: &str, operation: &str) -> Self {
        Error::RepoOperation {
            repo: repo.to_string(),
            operation: operation.to_string(),
            source: Box::new(self),
        }
    }

    /// Returns true for configuration errors, looking through repo wrappers.
    pub fn is_config(&self) -> bool {
        match self {
            Error::ManifestInvalid { .. } | Error::Config { .. } | Error::UnknownProfile { .. } => {
                true
            }
            Error::RepoOperation { source, .. } => source.is_config(),
            _ => false,
        }
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
