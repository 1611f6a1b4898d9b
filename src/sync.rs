//! # Sync Engine
//!
//! Brings every selected repository in line with the manifest:
//!
//! 1. clone it if missing (local repos are initialized instead), else fetch;
//! 2. apply the dirty-tree strategy, skipping the repo under `safe`;
//! 3. check out the target ref, which is the pinned commit in lock mode;
//! 4. run the repo's post-sync commands in order.
//!
//! Repositories are processed in parallel on a dedicated rayon pool with
//! exactly `jobs` threads, which is also the bound on concurrent gateway
//! calls. Each task reports on a channel sized to the repo count, and the
//! pool's scope only returns once every task has finished, so a failure is
//! never surfaced while sibling tasks are still running.
//!
//! A failure on a required repo fails the run (the first one in manifest
//! order is returned). A failure on a non-required repo is logged as a
//! warning and the run still succeeds.

use std::path::Path;
use std::process::Command;
use std::sync::mpsc;

use log::{debug, info, warn};
use serde::Serialize;

use crate::dirty::{self, DirtyOutcome, Strategy};
use crate::error::{Error, Result};
use crate::manifest::Repo;
use crate::progress::Progress;
use crate::repository::{CloneOptions, GitOperations};
use crate::workspace::Context;

/// Worker count used when `--jobs` is not given.
pub const DEFAULT_JOBS: usize = 4;

#[derive(Debug, Clone, Copy)]
pub struct SyncOptions {
    pub strategy: Strategy,
    /// Check out pinned commits from the lock file.
    pub use_lock: bool,
    pub jobs: usize,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            strategy: Strategy::Safe,
            use_lock: false,
            jobs: DEFAULT_JOBS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RepoOutcome {
    Synced { target: String },
    Skipped { reason: String },
    Failed { required: bool, error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoResult {
    pub repo: String,
    #[serde(flatten)]
    pub outcome: RepoOutcome,
}

/// Per-repo outcomes in manifest order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    pub results: Vec<RepoResult>,
}

impl SyncReport {
    /// Ids of repos that reached their target ref.
    pub fn synced(&self) -> Vec<&str> {
        self.ids(|o| matches!(o, RepoOutcome::Synced { .. }))
    }

    pub fn skipped(&self) -> Vec<&str> {
        self.ids(|o| matches!(o, RepoOutcome::Skipped { .. }))
    }

    pub fn failed(&self) -> Vec<&str> {
        self.ids(|o| matches!(o, RepoOutcome::Failed { .. }))
    }

    fn ids(&self, keep: impl Fn(&RepoOutcome) -> bool) -> Vec<&str> {
        self.results
            .iter()
            .filter(|r| keep(&r.outcome))
            .map(|r| r.repo.as_str())
            .collect()
    }
}

/// Rejects a worker count below one.
pub fn validate_jobs(jobs: usize) -> Result<()> {
    if jobs < 1 {
        return Err(Error::config(format!("--jobs must be >= 1 (got {})", jobs)));
    }
    Ok(())
}

/// Syncs `repos` with at most `options.jobs` running at once.
pub fn sync(
    ctx: &Context,
    git: &dyn GitOperations,
    repos: &[Repo],
    options: &SyncOptions,
    progress: &Progress,
) -> Result<SyncReport> {
    validate_jobs(options.jobs)?;
    if options.use_lock && ctx.lock.is_none() {
        return Err(Error::config(format!(
            "--lock specified but no {} found",
            crate::workspace::LOCK_FILE
        )));
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.jobs)
        .thread_name(|i| format!("agentws-sync-{}", i))
        .build()
        .map_err(|e| Error::Io(std::io::Error::other(e.to_string())))?;

    let (tx, rx) = mpsc::sync_channel(repos.len());
    pool.scope(|scope| {
        for (index, repo) in repos.iter().enumerate() {
            let tx = tx.clone();
            scope.spawn(move |_| {
                let result = sync_repo(ctx, git, repo, options, progress);
                // The receiver outlives the scope and the channel holds every
                // result, so this never blocks or fails.
                let _ = tx.send((index, result));
            });
        }
    });
    drop(tx);

    let mut slots: Vec<Option<Result<RepoOutcome>>> = repos.iter().map(|_| None).collect();
    for (index, result) in rx {
        slots[index] = Some(result);
    }

    let mut report = SyncReport::default();
    let mut first_error = None;
    for (repo, slot) in repos.iter().zip(slots) {
        let outcome = match slot {
            Some(Ok(outcome)) => outcome,
            Some(Err(e)) => {
                let error = e.to_string();
                if repo.is_required() {
                    first_error.get_or_insert(e);
                } else {
                    warn!("optional repo {}: {}", repo.id, error);
                }
                RepoOutcome::Failed {
                    required: repo.is_required(),
                    error,
                }
            }
            None => RepoOutcome::Failed {
                required: repo.is_required(),
                error: "task did not report a result".to_string(),
            },
        };
        report.results.push(RepoResult {
            repo: repo.id.clone(),
            outcome,
        });
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(report),
    }
}

fn sync_repo(
    ctx: &Context,
    git: &dyn GitOperations,
    repo: &Repo,
    options: &SyncOptions,
    progress: &Progress,
) -> Result<RepoOutcome> {
    let dir = ctx.repo_dir(repo);
    clone_or_fetch(ctx, git, repo, &dir)?;

    if dirty::apply(git, &dir, &repo.id, options.strategy)? == DirtyOutcome::Skipped {
        progress.done(&format!("{} skipped (dirty)", repo.id))?;
        return Ok(RepoOutcome::Skipped {
            reason: "dirty".to_string(),
        });
    }

    let target = target_ref(ctx, repo, options.use_lock);
    git.checkout(&dir, &target)
        .map_err(|e| e.in_repo(&repo.id, &format!("checkout {}", target)))?;

    run_post_sync(&dir, repo)?;

    progress.done(&format!("{} synced @ {}", repo.id, target))?;
    Ok(RepoOutcome::Synced { target })
}

/// Makes sure the repo exists locally and, for remote repos, is up to date.
pub fn clone_or_fetch(ctx: &Context, git: &dyn GitOperations, repo: &Repo, dir: &Path) -> Result<()> {
    if git.is_initialized(dir) {
        if repo.is_local() {
            return Ok(());
        }
        info!("fetching {}", repo.id);
        return git.fetch(dir).map_err(|e| e.in_repo(&repo.id, "fetch"));
    }

    if repo.is_local() {
        info!("initializing local repo {}", repo.id);
        return git
            .init_local(dir)
            .map_err(|e| e.in_repo(&repo.id, "init"));
    }

    info!("cloning {}", repo.id);
    let options = CloneOptions {
        depth: repo.effective_depth(ctx.defaults()),
        partial_clone: repo.effective_partial_clone(ctx.defaults()),
        sparse: repo.sparse.clone(),
    };
    git.clone_repo(repo.url_or_empty(), dir, &options)
        .map_err(|e| e.in_repo(&repo.id, "clone"))
}

/// The manifest ref, or the pinned commit when lock mode is on and the lock
/// file lists this repo.
pub fn target_ref(ctx: &Context, repo: &Repo, use_lock: bool) -> String {
    if use_lock {
        if let Some(commit) = ctx.pinned_commit(&repo.id) {
            return commit.to_string();
        }
    }
    repo.effective_ref().to_string()
}

/// Runs the repo's post-sync commands in order, stopping at the first failure.
///
/// Commands are executed directly from their argv, never through a shell.
pub fn run_post_sync(repo_dir: &Path, repo: &Repo) -> Result<()> {
    for post in &repo.post_sync {
        let label = post.label();
        let operation = format!("post_sync {:?}", label);
        let (program, args) = post
            .cmd
            .split_first()
            .ok_or_else(|| Error::manifest("post_sync cmd is empty").in_repo(&repo.id, &operation))?;

        let dir = match post.workdir.as_deref().filter(|w| !w.is_empty()) {
            Some(workdir) => repo_dir.join(workdir),
            None => repo_dir.to_path_buf(),
        };
        info!("{}: running post_sync {}", repo.id, label);

        let output = Command::new(program)
            .args(args)
            .current_dir(&dir)
            .output()
            .map_err(|e| {
                Error::PostSync {
                    command: post.cmd.join(" "),
                    status: format!("could not be started: {}", e),
                }
                .in_repo(&repo.id, &operation)
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            debug!("{}: {}: {}", repo.id, label, stdout.trim());
        }
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::PostSync {
                command: post.cmd.join(" "),
                status: format!("exited with {}: {}", output.status, stderr.trim()),
            }
            .in_repo(&repo.id, &operation));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lockfile::{LockFile, LockedRepo};
    use crate::manifest::{Defaults, PostSync, Workspace};
    use crate::repository::mock::{MockGit, MockRepo};
    use std::path::PathBuf;
    use std::time::Duration;
    use tempfile::TempDir;

    fn url(id: &str) -> String {
        format!("https://example.com/{}.git", id)
    }

    fn repo(id: &str) -> Repo {
        Repo {
            id: id.to_string(),
            url: Some(url(id)),
            path: format!("repos/{}", id),
            ..Default::default()
        }
    }

    fn context(repos: Vec<Repo>, lock: Option<LockFile>) -> Context {
        let manifest = Workspace {
            version: 1,
            name: "test".to_string(),
            defaults: Defaults {
                depth: Some(50),
                ..Default::default()
            },
            repos,
            ..Default::default()
        };
        Context::from_parts(PathBuf::from("/ws"), manifest, lock)
    }

    fn dir(id: &str) -> PathBuf {
        PathBuf::from(format!("/ws/repos/{}", id))
    }

    fn options(jobs: usize) -> SyncOptions {
        SyncOptions {
            jobs,
            ..Default::default()
        }
    }

    #[test]
    fn test_fresh_sync_clones_and_checks_out() {
        let ctx = context(vec![repo("api"), repo("web")], None);
        let git = MockGit::new()
            .with_remote(&url("api"), "main", "a1")
            .with_remote(&url("web"), "main", "w1");
        let progress = Progress::capture(2);

        let report = sync(&ctx, &git, &ctx.manifest.repos, &options(2), &progress).unwrap();
        assert_eq!(report.synced(), vec!["api", "web"]);

        let api = git.repo(&dir("api")).unwrap();
        assert_eq!(api.branch, "main");
        assert_eq!(api.head, "a1");
        assert_eq!(api.cloned_with.unwrap().depth, Some(50));

        let mut lines = progress.lines();
        lines.sort();
        assert!(lines.iter().any(|l| l.ends_with("api synced @ main")));
        assert!(lines.iter().any(|l| l.ends_with("web synced @ main")));
    }

    #[test]
    fn test_second_sync_fetches_and_is_idempotent() {
        let ctx = context(vec![repo("api")], None);
        let git = MockGit::new().with_remote(&url("api"), "main", "a1");

        sync(&ctx, &git, &ctx.manifest.repos, &options(1), &Progress::quiet(1)).unwrap();
        let first = git.repo(&dir("api")).unwrap();
        sync(&ctx, &git, &ctx.manifest.repos, &options(1), &Progress::quiet(1)).unwrap();
        let second = git.repo(&dir("api")).unwrap();

        assert_eq!(git.count("clone_repo"), 1);
        assert_eq!(git.count("fetch"), 1);
        assert_eq!(first.branch, second.branch);
        assert_eq!(first.head, second.head);
    }

    #[test]
    fn test_dirty_repo_is_skipped_under_safe() {
        let ctx = context(vec![repo("a"), repo("b")], None);
        let git = MockGit::new()
            .with_remote(&url("a"), "main", "a1")
            .with_remote(&url("b"), "main", "b1")
            .with_repo(dir("a"), MockRepo::cloned("main", "a0").dirty());
        let progress = Progress::capture(2);

        let report = sync(&ctx, &git, &ctx.manifest.repos, &options(2), &progress).unwrap();
        assert_eq!(report.skipped(), vec!["a"]);
        assert_eq!(report.synced(), vec!["b"]);

        let a = git.repo(&dir("a")).unwrap();
        assert!(a.dirty);
        assert_eq!(a.stashes, 0);
        assert!(!git.ops_for(&dir("a")).contains(&"checkout"));
        assert!(progress.lines().iter().any(|l| l.ends_with("a skipped (dirty)")));
    }

    #[test]
    fn test_stash_strategy_proceeds() {
        let ctx = context(vec![repo("a")], None);
        let git = MockGit::new()
            .with_remote(&url("a"), "main", "a1")
            .with_repo(dir("a"), MockRepo::cloned("main", "a0").dirty());
        let opts = SyncOptions {
            strategy: Strategy::Stash,
            ..options(1)
        };
        let report = sync(&ctx, &git, &ctx.manifest.repos, &opts, &Progress::quiet(1)).unwrap();
        assert_eq!(report.synced(), vec!["a"]);
        assert_eq!(git.repo(&dir("a")).unwrap().stashes, 1);
    }

    #[test]
    fn test_concurrency_is_bounded_by_jobs() {
        let repos: Vec<Repo> = (0..8).map(|i| repo(&format!("r{}", i))).collect();
        let ctx = context(repos, None);
        let mut git = MockGit::new();
        for i in 0..8 {
            git = git.with_remote(&url(&format!("r{}", i)), "main", "c1");
        }
        let git = git.with_delay(Duration::from_millis(10));

        let report = sync(&ctx, &git, &ctx.manifest.repos, &options(3), &Progress::quiet(8)).unwrap();
        assert_eq!(report.synced().len(), 8);
        assert!(git.max_in_flight() <= 3, "saw {}", git.max_in_flight());
        assert!(git.max_in_flight() >= 1);
    }

    #[test]
    fn test_single_job_is_sequential() {
        let repos: Vec<Repo> = (0..4).map(|i| repo(&format!("r{}", i))).collect();
        let ctx = context(repos, None);
        let mut git = MockGit::new();
        for i in 0..4 {
            git = git.with_remote(&url(&format!("r{}", i)), "main", "c1");
        }
        let git = git.with_delay(Duration::from_millis(5));

        sync(&ctx, &git, &ctx.manifest.repos, &options(1), &Progress::quiet(4)).unwrap();
        assert_eq!(git.max_in_flight(), 1);
    }

    #[test]
    fn test_lock_mode_checks_out_pinned_commit() {
        let mut lock = LockFile::new("test");
        lock.repos.insert(
            "api".to_string(),
            LockedRepo {
                url: Some(url("api")),
                r#ref: "main".to_string(),
                commit: "a1".to_string(),
            },
        );
        let ctx = context(vec![repo("api"), repo("web")], Some(lock));
        let git = MockGit::new()
            .with_remote(&url("api"), "main", "a1")
            .with_remote(&url("web"), "main", "w1");
        sync(&ctx, &git, &ctx.manifest.repos, &options(2), &Progress::quiet(2)).unwrap();

        git.advance_remote(&url("api"), "main", "a2");
        let opts = SyncOptions {
            use_lock: true,
            ..options(2)
        };
        let report = sync(&ctx, &git, &ctx.manifest.repos, &opts, &Progress::quiet(2)).unwrap();

        let api = git.repo(&dir("api")).unwrap();
        assert_eq!(api.head, "a1");
        assert_eq!(api.branch, "");
        assert_eq!(
            report.results[0].outcome,
            RepoOutcome::Synced {
                target: "a1".to_string()
            }
        );
        // No lock entry: falls back to the manifest ref.
        assert_eq!(git.repo(&dir("web")).unwrap().branch, "main");
    }

    #[test]
    fn test_lock_mode_without_lock_file_touches_nothing() {
        let ctx = context(vec![repo("api")], None);
        let git = MockGit::new().with_remote(&url("api"), "main", "a1");
        let opts = SyncOptions {
            use_lock: true,
            ..options(1)
        };
        let err = sync(&ctx, &git, &ctx.manifest.repos, &opts, &Progress::quiet(1)).unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("--lock specified"));
        assert!(git.calls().is_empty());
    }

    #[test]
    fn test_zero_jobs_is_config_error() {
        let ctx = context(vec![repo("api")], None);
        let git = MockGit::new();
        let err = sync(&ctx, &git, &ctx.manifest.repos, &options(0), &Progress::quiet(1)).unwrap_err();
        assert!(err.is_config());
        assert_eq!(err.to_string(), "--jobs must be >= 1 (got 0)");
        assert!(git.calls().is_empty());
    }

    #[test]
    fn test_required_failure_waits_for_siblings() {
        let ctx = context(vec![repo("api"), repo("web")], None);
        let git = MockGit::new()
            .with_remote(&url("web"), "main", "w1")
            .fail_on("clone_repo", dir("api"));

        let err = sync(&ctx, &git, &ctx.manifest.repos, &options(2), &Progress::quiet(2)).unwrap_err();
        assert!(err.to_string().starts_with("repo api: clone: "));
        assert_eq!(git.repo(&dir("web")).unwrap().head, "w1");
    }

    #[test]
    fn test_optional_failure_is_a_warning() {
        testing_logger::setup();
        let mut docs = repo("docs");
        docs.required = Some(false);
        let ctx = context(vec![docs, repo("api")], None);
        let git = MockGit::new()
            .with_remote(&url("api"), "main", "a1")
            .fail_on("clone_repo", dir("docs"));

        let report = sync(&ctx, &git, &ctx.manifest.repos, &options(2), &Progress::quiet(2)).unwrap();
        assert_eq!(report.failed(), vec!["docs"]);
        assert_eq!(report.synced(), vec!["api"]);
        assert!(matches!(
            report.results[0].outcome,
            RepoOutcome::Failed { required: false, .. }
        ));

        testing_logger::validate(|logs| {
            assert!(logs
                .iter()
                .any(|l| l.level == log::Level::Warn && l.body.contains("optional repo docs")));
        });
    }

    #[test]
    fn test_local_repo_is_initialized_not_cloned() {
        let local = Repo {
            id: "scratch".to_string(),
            local: true,
            path: "repos/scratch".to_string(),
            ..Default::default()
        };
        let ctx = context(vec![local], None);
        let git = MockGit::new();

        sync(&ctx, &git, &ctx.manifest.repos, &options(1), &Progress::quiet(1)).unwrap();
        sync(&ctx, &git, &ctx.manifest.repos, &options(1), &Progress::quiet(1)).unwrap();
        assert_eq!(git.count("init_local"), 1);
        assert_eq!(git.count("clone_repo"), 0);
        assert_eq!(git.count("fetch"), 0);
    }

    #[test]
    fn test_post_sync_runs_in_workdir() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("sub")).unwrap();
        let mut r = repo("api");
        r.post_sync = vec![PostSync {
            name: Some("marker".to_string()),
            workdir: Some("sub".to_string()),
            cmd: vec!["touch".to_string(), "ran".to_string()],
        }];

        run_post_sync(temp.path(), &r).unwrap();
        assert!(temp.path().join("sub/ran").exists());
    }

    #[test]
    fn test_post_sync_stops_at_first_failure() {
        let temp = TempDir::new().unwrap();
        let mut r = repo("api");
        r.post_sync = vec![
            PostSync {
                name: Some("fails".to_string()),
                cmd: vec!["false".to_string()],
                ..Default::default()
            },
            PostSync {
                cmd: vec!["touch".to_string(), "second".to_string()],
                ..Default::default()
            },
        ];

        let err = run_post_sync(temp.path(), &r).unwrap_err();
        assert!(err.to_string().starts_with("repo api: post_sync \"fails\": "));
        assert!(!temp.path().join("second").exists());
    }

    #[test]
    fn test_post_sync_missing_program() {
        let temp = TempDir::new().unwrap();
        let mut r = repo("api");
        r.post_sync = vec![PostSync {
            cmd: vec!["agentws-definitely-missing-binary".to_string()],
            ..Default::default()
        }];
        let err = run_post_sync(temp.path(), &r).unwrap_err();
        assert!(err.to_string().contains("could not be started"));
    }
}
