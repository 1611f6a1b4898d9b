//! # Workspace Manifest
//!
//! This module defines the data structures that represent `workspace.yaml`, the
//! declarative descriptor listing every repository in a workspace, together
//! with the logic to parse, validate, save and filter it.
//!
//! ## Key Components
//!
//! - **`Workspace`**: the whole manifest: name, optional repos root, defaults,
//!   named profiles and the ordered list of repositories.
//! - **`Repo`**: a single repository entry. A repo is either remote (has a
//!   `url`) or local (`local: true`, git-initialized instead of cloned).
//! - **`Defaults`**: workspace-wide fallbacks; a repo-level value always wins.
//! - **`Profile`**: a named selection of repos by tag or by id.
//!
//! ## Validation
//!
//! Every manifest is validated on load and again before it is saved, so the
//! rest of the crate can rely on these invariants:
//!
//! - repo ids are non-empty and unique;
//! - local repos carry no `url`, remote repos always do;
//! - repo paths, `repos_root` and post-sync workdirs are relative and contain
//!   no `..` segments;
//! - `base_ref` values are bare branch names (no `origin/` or `refs/` prefix).

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Component, Path};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The only manifest schema version understood by this build.
pub const MANIFEST_VERSION: u32 = 1;

/// Branch tracked by repos that do not set `ref`.
pub const DEFAULT_REF: &str = "main";

/// Top-level `workspace.yaml` document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Workspace {
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Directory prefix new repos are placed under by `add`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repos_root: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub profiles: BTreeMap<String, Profile>,
    #[serde(default, skip_serializing_if = "Defaults::is_empty")]
    pub defaults: Defaults,
    #[serde(default)]
    pub repos: Vec<Repo>,
}

/// Clone and branch defaults applied to every repo that does not override them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Defaults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<u32>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub partial_clone: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_ref: Option<String>,
}

impl Defaults {
    fn is_empty(&self) -> bool {
        self == &Defaults::default()
    }
}

/// Selects a subset of repos by tags or explicit ids.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include_tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include_repo_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude_repo_ids: Vec<String>,
}

/// A single repository entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Repo {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// A local repo has no remote; sync initializes it instead of cloning.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub local: bool,
    #[serde(default)]
    pub path: String,
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub r#ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partial_clone: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sparse: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub post_sync: Vec<PostSync>,
}

/// A command run inside the repo after a successful sync.
///
/// `cmd` is an argv vector executed directly, never through a shell.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostSync {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Working directory relative to the repo directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workdir: Option<String>,
    #[serde(default)]
    pub cmd: Vec<String>,
}

impl PostSync {
    /// Name used in progress output and errors; falls back to the argv.
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => self.cmd.join(" "),
        }
    }
}

impl Repo {
    /// The ref this repo tracks, defaulting to `main`.
    pub fn effective_ref(&self) -> &str {
        match self.r#ref.as_deref() {
            Some(r) if !r.is_empty() => r,
            _ => DEFAULT_REF,
        }
    }

    /// The base ref for new branches: the repo's own value, else the default.
    pub fn effective_base_ref<'a>(&'a self, defaults: &'a Defaults) -> Option<&'a str> {
        self.base_ref
            .as_deref()
            .filter(|b| !b.is_empty())
            .or_else(|| defaults.base_ref.as_deref().filter(|b| !b.is_empty()))
    }

    pub fn effective_depth(&self, defaults: &Defaults) -> Option<u32> {
        self.depth.or(defaults.depth)
    }

    pub fn effective_partial_clone(&self, defaults: &Defaults) -> bool {
        self.partial_clone.unwrap_or(defaults.partial_clone)
    }

    /// Whether a failure on this repo aborts the run (default true).
    pub fn is_required(&self) -> bool {
        self.required.unwrap_or(true)
    }

    pub fn is_local(&self) -> bool {
        self.local
    }

    /// The remote URL, or an empty string for local repos.
    pub fn url_or_empty(&self) -> &str {
        self.url.as_deref().unwrap_or("")
    }
}

/// Reads and validates a `workspace.yaml` file.
pub fn load(path: &Path) -> Result<Workspace> {
    let content = fs::read_to_string(path).map_err(|e| Error::ManifestInvalid {
        message: format!("reading {}: {}", path.display(), e),
        hint: Some("run `agentws init <name>` to create a workspace".to_string()),
    })?;
    parse(&content)
}

/// Parses and validates manifest YAML.
pub fn parse(content: &str) -> Result<Workspace> {
    let workspace: Workspace = serde_yaml::from_str(content).map_err(|e| Error::ManifestInvalid {
        message: format!("parsing manifest YAML: {}", e),
        hint: None,
    })?;
    validate(&workspace)?;
    Ok(workspace)
}

/// Validates and writes a manifest to disk.
pub fn save(path: &Path, workspace: &Workspace) -> Result<()> {
    validate(workspace)?;
    let yaml = serde_yaml::to_string(workspace)?;
    fs::write(path, yaml)?;
    Ok(())
}

/// Checks every manifest invariant, returning the first violation.
pub fn validate(workspace: &Workspace) -> Result<()> {
    if workspace.version != MANIFEST_VERSION {
        return Err(Error::ManifestInvalid {
            message: format!(
                "unsupported manifest version: {} (expected {})",
                workspace.version, MANIFEST_VERSION
            ),
            hint: Some("add `version: 1` at the top of workspace.yaml".to_string()),
        });
    }
    if workspace.name.is_empty() {
        return Err(Error::manifest("name is required"));
    }

    if let Some(base) = &workspace.defaults.base_ref {
        validate_base_ref(base, "defaults.base_ref")?;
    }

    let mut seen = HashSet::with_capacity(workspace.repos.len());
    for (i, repo) in workspace.repos.iter().enumerate() {
        validate_repo(i, repo)?;
        if !seen.insert(repo.id.as_str()) {
            return Err(Error::manifest(format!("duplicate repo id {:?}", repo.id)));
        }
    }

    if let Some(root) = &workspace.repos_root {
        if !root.is_empty() {
            validate_path(root, "repos_root")?;
        }
    }

    Ok(())
}

fn validate_repo(i: usize, repo: &Repo) -> Result<()> {
    if repo.id.is_empty() {
        return Err(Error::manifest(format!("repos[{}].id is required", i)));
    }
    let label = format!("repos[{}] ({})", i, repo.id);

    let has_url = repo.url.as_deref().is_some_and(|u| !u.is_empty());
    if repo.local && has_url {
        return Err(Error::ManifestInvalid {
            message: format!("{}: local repo must not have a url", label),
            hint: Some("remove `url` or drop `local: true`".to_string()),
        });
    }
    if !repo.local && !has_url {
        return Err(Error::ManifestInvalid {
            message: format!("{}.url is required", label),
            hint: Some("set `local: true` for repos without a remote".to_string()),
        });
    }

    if repo.path.is_empty() {
        return Err(Error::manifest(format!("{}.path is required", label)));
    }
    validate_path(&repo.path, &format!("{}.path", label))?;

    if let Some(base) = &repo.base_ref {
        validate_base_ref(base, &format!("{}.base_ref", label))?;
    }

    for (j, post) in repo.post_sync.iter().enumerate() {
        let post_label = format!("{}.post_sync[{}]", label, j);
        if post.cmd.is_empty() || post.cmd[0].is_empty() {
            return Err(Error::manifest(format!("{}.cmd is required", post_label)));
        }
        if let Some(workdir) = &post.workdir {
            if !workdir.is_empty() {
                validate_path(workdir, &format!("{}.workdir", post_label))?;
            }
        }
    }
    Ok(())
}

/// Ensures a base ref is a bare branch name.
pub fn validate_base_ref(value: &str, label: &str) -> Result<()> {
    if value.starts_with("origin/") || value.starts_with("refs/") {
        return Err(Error::ManifestInvalid {
            message: format!(
                "{} must be branch name only (no origin/ or refs/ prefix): {}",
                label, value
            ),
            hint: Some(format!(
                "use `{}`",
                value
                    .trim_start_matches("refs/heads/")
                    .trim_start_matches("refs/remotes/")
                    .trim_start_matches("origin/")
            )),
        });
    }
    Ok(())
}

/// Ensures a path is relative and never steps outside its base directory.
pub fn validate_path(value: &str, label: &str) -> Result<()> {
    let path = Path::new(value);
    if path.is_absolute() || value.starts_with('/') || value.starts_with('\\') {
        return Err(Error::manifest(format!(
            "{}: absolute path is not allowed: {}",
            label, value
        )));
    }
    for component in path.components() {
        match component {
            Component::ParentDir => {
                return Err(Error::manifest(format!(
                    "{}: path must not escape workspace (contains ..): {}",
                    label, value
                )));
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(Error::manifest(format!(
                    "{}: absolute path is not allowed: {}",
                    label, value
                )));
            }
            Component::CurDir | Component::Normal(_) => {}
        }
    }
    Ok(())
}

/// Returns the repos selected by the named profile, in manifest order.
///
/// A repo listed in `exclude_repo_ids` is never selected. Otherwise it is
/// selected when its id is in `include_repo_ids` or any of its tags is in
/// `include_tags`. A profile with neither selects nothing.
pub fn filter_by_profile(workspace: &Workspace, name: &str) -> Result<Vec<Repo>> {
    let profile = workspace
        .profiles
        .get(name)
        .ok_or_else(|| Error::UnknownProfile {
            name: name.to_string(),
        })?;

    let exclude: HashSet<&str> = profile.exclude_repo_ids.iter().map(String::as_str).collect();
    let include: HashSet<&str> = profile.include_repo_ids.iter().map(String::as_str).collect();
    let tags: HashSet<&str> = profile.include_tags.iter().map(String::as_str).collect();

    Ok(workspace
        .repos
        .iter()
        .filter(|r| !exclude.contains(r.id.as_str()))
        .filter(|r| {
            include.contains(r.id.as_str()) || r.tags.iter().any(|t| tags.contains(t.as_str()))
        })
        .cloned()
        .collect())
}

/// Applies `--only` / `--skip` id lists, preserving order.
pub fn filter_by_ids(repos: Vec<Repo>, only: &[String], skip: &[String]) -> Vec<Repo> {
    if only.is_empty() && skip.is_empty() {
        return repos;
    }
    let only: HashSet<&str> = only.iter().map(String::as_str).collect();
    let skip: HashSet<&str> = skip.iter().map(String::as_str).collect();

    repos
        .into_iter()
        .filter(|r| only.is_empty() || only.contains(r.id.as_str()))
        .filter(|r| !skip.contains(r.id.as_str()))
        .collect()
}

/// Resolves the repos a command operates on: profile first, then id filters.
pub fn select_repos(
    workspace: &Workspace,
    profile: Option<&str>,
    only: &[String],
    skip: &[String],
) -> Result<Vec<Repo>> {
    let repos = match profile {
        Some(name) if !name.is_empty() => filter_by_profile(workspace, name)?,
        _ => workspace.repos.clone(),
    };
    Ok(filter_by_ids(repos, only, skip))
}
