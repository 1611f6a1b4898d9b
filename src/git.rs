//! Thin wrappers around the system `git` binary.
//!
//! Every function here shells out through `std::process::Command`, which
//! picks up whatever authentication the user already has configured:
//! - SSH keys from ~/.ssh/
//! - Git credential helpers
//! - Personal access tokens
//! - Any authentication configured in ~/.gitconfig

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use log::debug;

use crate::error::{Error, Result};

/// Clone behaviour derived from a repo's effective settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CloneOptions {
    /// History depth; `None` or `Some(0)` clones the full history.
    pub depth: Option<u32>,
    /// Adds `--filter=blob:none`.
    pub partial_clone: bool,
    /// Non-empty enables sparse checkout of these paths.
    pub sparse: Vec<String>,
}

fn spawn(dir: Option<&Path>, args: &[&str]) -> Result<Output> {
    let mut cmd = Command::new("git");
    if let Some(dir) = dir {
        cmd.current_dir(dir);
    }
    cmd.args(args);
    debug!(
        "git {} (in {})",
        args.join(" "),
        dir.map(|d| d.display().to_string()).unwrap_or_else(|| ".".to_string())
    );

    cmd.output().map_err(|e| Error::GitCommand {
        command: args.join(" "),
        dir: display_dir(dir),
        stderr: e.to_string(),
    })
}

fn display_dir(dir: Option<&Path>) -> String {
    dir.map(|d| d.display().to_string())
        .unwrap_or_else(|| ".".to_string())
}

/// Runs git and returns trimmed stdout, failing on a non-zero exit.
fn run(dir: Option<&Path>, args: &[&str]) -> Result<String> {
    let output = spawn(dir, args)?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::GitCommand {
            command: args.join(" "),
            dir: display_dir(dir),
            stderr: explain_failure(stderr.trim()),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Runs git where exit status 1 means "no" rather than failure.
fn probe(dir: &Path, args: &[&str]) -> Result<bool> {
    let output = spawn(Some(dir), args)?;
    match output.status.code() {
        Some(0) => Ok(true),
        Some(1) => Ok(false),
        _ => Err(Error::GitCommand {
            command: args.join(" "),
            dir: dir.display().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }),
    }
}

// Provide helpful error message for common auth failures
fn explain_failure(stderr: &str) -> String {
    if stderr.contains("Authentication failed")
        || stderr.contains("Permission denied")
        || stderr.contains("Could not read from remote repository")
    {
        format!(
            "Authentication failed. Make sure you have access to the repository.\n\
            For private repos, ensure you have:\n\
            - SSH key added to ssh-agent\n\
            - Git credentials configured\n\
            - Personal access token set up\n\
            Error: {}",
            stderr
        )
    } else {
        stderr.to_string()
    }
}

/// True when `dir` contains a `.git` directory.
pub fn is_initialized(dir: &Path) -> bool {
    dir.join(".git").is_dir()
}

/// Builds the argv for `git clone`.
pub fn clone_args(url: &str, dir: &Path, options: &CloneOptions) -> Vec<String> {
    let mut args = vec!["clone".to_string()];
    if let Some(depth) = options.depth.filter(|d| *d > 0) {
        args.push("--depth".to_string());
        args.push(depth.to_string());
    }
    if options.partial_clone {
        args.push("--filter=blob:none".to_string());
    }
    if !options.sparse.is_empty() {
        args.push("--no-checkout".to_string());
    }
    args.push(url.to_string());
    args.push(dir.display().to_string());
    args
}

/// Clones `url` into `dir`, creating parent directories first.
pub fn clone_repo(url: &str, dir: &Path, options: &CloneOptions) -> Result<()> {
    if let Some(parent) = dir.parent() {
        fs::create_dir_all(parent)?;
    }

    let args = clone_args(url, dir, options);
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    run(None, &args)?;

    if !options.sparse.is_empty() {
        let mut sparse = vec!["sparse-checkout", "set", "--"];
        sparse.extend(options.sparse.iter().map(String::as_str));
        run(Some(dir), &sparse)?;
        run(Some(dir), &["checkout"])?;
    }
    Ok(())
}

/// Initializes a repository with no remote and a single README commit.
pub fn init_local(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)?;
    run(Some(dir), &["init"])?;

    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    fs::write(dir.join("README.md"), format!("# {}\n", name))?;
    run(Some(dir), &["add", "README.md"])?;
    ensure_commit_identity(dir)?;
    run(Some(dir), &["commit", "-m", "Initial commit"])?;
    Ok(())
}

/// Sets a repo-local identity when none is configured, so the initial commit
/// can be created on machines without a global git identity.
fn ensure_commit_identity(dir: &Path) -> Result<()> {
    let configured = |key: &str| -> Result<bool> {
        let output = spawn(Some(dir), &["config", "--get", key])?;
        Ok(output.status.success() && !output.stdout.trim_ascii().is_empty())
    };
    if !configured("user.name")? {
        run(Some(dir), &["config", "user.name", "agentws"])?;
    }
    if !configured("user.email")? {
        run(Some(dir), &["config", "user.email", "agentws@localhost"])?;
    }
    Ok(())
}

pub fn fetch(dir: &Path) -> Result<()> {
    run(Some(dir), &["fetch", "--prune"]).map(|_| ())
}

pub fn checkout(dir: &Path, git_ref: &str) -> Result<()> {
    run(Some(dir), &["checkout", git_ref]).map(|_| ())
}

/// The checked-out branch name, or an empty string for a detached HEAD.
pub fn current_branch(dir: &Path) -> Result<String> {
    let output = spawn(Some(dir), &["symbolic-ref", "--short", "HEAD"])?;
    if !output.status.success() {
        return Ok(String::new());
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

pub fn head_commit(dir: &Path) -> Result<String> {
    run(Some(dir), &["rev-parse", "--short", "HEAD"])
}

pub fn head_commit_full(dir: &Path) -> Result<String> {
    run(Some(dir), &["rev-parse", "HEAD"])
}

/// True when `status --porcelain` reports anything.
pub fn is_dirty(dir: &Path) -> Result<bool> {
    run(Some(dir), &["status", "--porcelain"]).map(|out| !out.is_empty())
}

pub fn local_branch_exists(dir: &Path, branch: &str) -> Result<bool> {
    let reference = format!("refs/heads/{}", branch);
    probe(dir, &["show-ref", "--verify", "--quiet", &reference])
}

pub fn remote_branch_exists(dir: &Path, branch: &str) -> Result<bool> {
    let reference = format!("refs/remotes/origin/{}", branch);
    probe(dir, &["show-ref", "--verify", "--quiet", &reference])
}

/// Creates and checks out `branch` at `from` without upstream tracking.
pub fn create_branch(dir: &Path, branch: &str, from: &str) -> Result<()> {
    run(Some(dir), &["checkout", "-b", branch, "--no-track", from]).map(|_| ())
}

/// Creates and checks out `branch` tracking `origin/<branch>`.
pub fn create_tracking_branch(dir: &Path, branch: &str) -> Result<()> {
    let upstream = format!("origin/{}", branch);
    run(Some(dir), &["checkout", "-b", branch, "--track", &upstream]).map(|_| ())
}

pub fn stash(dir: &Path) -> Result<()> {
    run(Some(dir), &["stash"]).map(|_| ())
}

pub fn reset_hard(dir: &Path, git_ref: &str) -> Result<()> {
    run(Some(dir), &["reset", "--hard", git_ref]).map(|_| ())
}

/// Asks the remote which branch its HEAD points at.
pub fn default_branch(url: &str) -> Result<String> {
    let out = run(None, &["ls-remote", "--symref", url, "HEAD"])?;
    parse_symref(&out).ok_or_else(|| Error::GitCommand {
        command: "ls-remote --symref".to_string(),
        dir: url.to_string(),
        stderr: "remote did not report a default branch".to_string(),
    })
}

/// Extracts the branch from a `ref: refs/heads/<name>\tHEAD` line.
pub fn parse_symref(output: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let rest = line.strip_prefix("ref:")?;
        let (target, name) = rest.trim().split_once('\t')?;
        if name.trim() != "HEAD" {
            return None;
        }
        target
            .trim()
            .strip_prefix("refs/heads/")
            .map(|b| b.to_string())
    })
}
