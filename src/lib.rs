//! # agentws
//!
//! Library behind the `agentws` command-line tool, which manages a workspace
//! of several git repositories described by a single `workspace.yaml`.
//!
//! ## Quick Example
//!
//! ```
//! use agentws::manifest;
//!
//! let workspace = manifest::parse(r#"
//! version: 1
//! name: demo
//! defaults:
//!   base_ref: main
//! repos:
//!   - id: api
//!     url: https://example.com/api.git
//!     path: repos/api
//!     tags: [backend]
//! profiles:
//!   backend:
//!     include_tags: [backend]
//! "#).unwrap();
//!
//! let repos = manifest::select_repos(&workspace, Some("backend"), &[], &[]).unwrap();
//! assert_eq!(repos[0].id, "api");
//! ```
//!
//! ## Core Concepts
//!
//! - **Manifest (`manifest`)**: the `workspace.yaml` schema, validation and
//!   profile/id selection.
//! - **Lock file (`lockfile`, `pin`)**: exact commits recorded per repo, and
//!   drift against the current HEAD.
//! - **Context (`workspace`)**: root path, manifest and lock loaded once per
//!   invocation and passed to every operation.
//! - **Gateway (`repository`, `git`)**: the `GitOperations` trait and its
//!   implementation on top of the `git` executable.
//! - **Operations**: `sync` (parallel clone/fetch/checkout), `checkout`
//!   (branch switching, also used by `start`), `status`, and `add`.
//! - **Working-tree policy (`dirty`)** and **branch decisions (`branch`)**
//!   shared by the mutating operations.

pub mod add;
pub mod branch;
pub mod checkout;
pub mod dirty;
pub mod error;
pub mod git;
pub mod lockfile;
pub mod manifest;
pub mod output;
pub mod pin;
pub mod progress;
pub mod repository;
pub mod status;
pub mod sync;
pub mod workspace;

#[cfg(test)]
mod manifest_proptest;
