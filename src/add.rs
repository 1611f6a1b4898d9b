//! Appending repositories to an existing manifest.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use log::{info, warn};

use crate::error::{Error, Result};
use crate::manifest::{self, Repo, Workspace, DEFAULT_REF};
use crate::repository::GitOperations;
use crate::sync;
use crate::workspace::Context;

/// Arguments of one `add` invocation.
#[derive(Debug, Clone, Default)]
pub struct AddRequest {
    /// URLs, or repo ids when `local` is set.
    pub args: Vec<String>,
    pub local: bool,
    pub id: Option<String>,
    pub path: Option<String>,
    pub r#ref: Option<String>,
    pub tags: Vec<String>,
}

/// Derives a repo id from the last path component of a URL.
///
/// Handles `https://host/org/x.git`, `git@host:org/x.git` and plain paths.
pub fn repo_id_from_url(url: &str) -> String {
    let mut url = url.trim_end_matches('/');
    if !url.contains("://") {
        if let Some(idx) = url.rfind(':') {
            url = &url[idx + 1..];
        }
    }
    let name = url.rsplit('/').next().unwrap_or(url);
    name.strip_suffix(".git").unwrap_or(name).to_string()
}

fn default_path(repos_root: Option<&str>, id: &str) -> String {
    match repos_root.filter(|r| !r.is_empty()) {
        Some(root) => format!("{}/{}", root.trim_end_matches('/'), id),
        None => id.to_string(),
    }
}

/// Builds the new entries for `request` without touching the manifest.
pub fn build_repos(
    workspace: &Workspace,
    git: &dyn GitOperations,
    request: &AddRequest,
) -> Result<Vec<Repo>> {
    if request.local {
        build_local_repos(workspace, request)
    } else {
        build_remote_repos(workspace, git, request)
    }
}

fn build_remote_repos(
    workspace: &Workspace,
    git: &dyn GitOperations,
    request: &AddRequest,
) -> Result<Vec<Repo>> {
    if request.args.is_empty() {
        return Err(Error::config("no URLs provided; pass repository URLs as arguments"));
    }
    if request.args.len() > 1 && request.id.is_some() {
        return Err(Error::config("--id can only be used with a single URL"));
    }
    if request.args.len() > 1 && request.path.is_some() {
        return Err(Error::config("--path can only be used with a single URL"));
    }

    let mut seen = HashSet::new();
    let mut repos = Vec::with_capacity(request.args.len());
    for url in &request.args {
        if url.is_empty() {
            return Err(Error::config("empty URL is not allowed"));
        }
        let id = request.id.clone().unwrap_or_else(|| repo_id_from_url(url));
        if id.is_empty() || id == "." {
            return Err(Error::config(format!(
                "cannot infer repository ID from URL {:?}",
                url
            )));
        }
        if !seen.insert(id.clone()) {
            return Err(Error::config(format!(
                "duplicate repository ID {:?} in arguments",
                id
            )));
        }

        let git_ref = match &request.r#ref {
            Some(r) => r.clone(),
            None => git.detect_default_branch(url).unwrap_or_else(|e| {
                warn!(
                    "failed to detect default branch for {} ({}), using {:?}",
                    url, e, DEFAULT_REF
                );
                DEFAULT_REF.to_string()
            }),
        };

        repos.push(Repo {
            path: request
                .path
                .clone()
                .unwrap_or_else(|| default_path(workspace.repos_root.as_deref(), &id)),
            id,
            url: Some(url.clone()),
            r#ref: Some(git_ref.clone()),
            base_ref: Some(git_ref),
            tags: request.tags.clone(),
            ..Default::default()
        });
    }
    Ok(repos)
}

fn build_local_repos(workspace: &Workspace, request: &AddRequest) -> Result<Vec<Repo>> {
    if request.args.is_empty() {
        return Err(Error::config(
            "--local requires at least one repository ID as argument",
        ));
    }
    if request.args.len() > 1 && request.path.is_some() {
        return Err(Error::config("--path can only be used with a single repository"));
    }

    let mut seen = HashSet::new();
    let mut repos = Vec::with_capacity(request.args.len());
    for id in &request.args {
        if id.is_empty() {
            return Err(Error::config("empty repository ID is not allowed"));
        }
        if !seen.insert(id.as_str()) {
            return Err(Error::config(format!(
                "duplicate repository ID {:?} in arguments",
                id
            )));
        }
        repos.push(Repo {
            id: id.clone(),
            local: true,
            path: request
                .path
                .clone()
                .unwrap_or_else(|| default_path(workspace.repos_root.as_deref(), id)),
            r#ref: Some(
                request
                    .r#ref
                    .clone()
                    .unwrap_or_else(|| DEFAULT_REF.to_string()),
            ),
            tags: request.tags.clone(),
            ..Default::default()
        });
    }
    Ok(repos)
}

/// Fails when a new repo reuses an existing id or path.
///
/// Paths are compared component-wise, so `./repos/api` and `repos/api/`
/// collide with `repos/api`.
pub fn find_conflicts(existing: &[Repo], new_repos: &[Repo]) -> Result<()> {
    let ids: HashSet<&str> = existing.iter().map(|r| r.id.as_str()).collect();
    let mut paths: HashSet<PathBuf> = existing.iter().map(|r| normalize(&r.path)).collect();
    for repo in new_repos {
        if ids.contains(repo.id.as_str()) {
            return Err(Error::config(format!(
                "repository ID {:?} already exists in workspace",
                repo.id
            )));
        }
        if !paths.insert(normalize(&repo.path)) {
            return Err(Error::config(format!(
                "repository path {:?} already exists in workspace",
                repo.path
            )));
        }
    }
    Ok(())
}

fn normalize(path: &str) -> PathBuf {
    Path::new(path)
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

/// Appends `new_repos`, re-validates and saves the manifest.
pub fn append(ctx: &Context, new_repos: &[Repo]) -> Result<Workspace> {
    find_conflicts(&ctx.manifest.repos, new_repos)?;
    let mut workspace = ctx.manifest.clone();
    workspace.repos.extend(new_repos.iter().cloned());
    manifest::save(&ctx.manifest_path, &workspace)?;
    Ok(workspace)
}

/// Clones or initializes freshly added repos. Failures are warnings, since
/// `sync` can retry them.
pub fn materialize(ctx: &Context, git: &dyn GitOperations, repos: &[Repo]) -> Vec<String> {
    let mut failed = Vec::new();
    for repo in repos {
        let dir = ctx.repo_dir(repo);
        if git.is_initialized(&dir) {
            info!("{} is already cloned", repo.id);
            continue;
        }
        if let Err(e) = sync::clone_or_fetch(ctx, git, repo, &dir) {
            warn!("{} (use `agentws sync` to retry)", e);
            failed.push(repo.id.clone());
        }
    }
    failed
}
