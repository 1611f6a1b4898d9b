//! End-to-end tests for `checkout` and `start`.

mod common;
use common::prelude::*;

use std::fs;
use std::path::Path;
use std::process::Command;

fn has_upstream(repo: &Path, branch: &str) -> bool {
    Command::new("git")
        .args(["rev-parse", "--abbrev-ref", &format!("{}@{{upstream}}", branch)])
        .current_dir(repo)
        .output()
        .unwrap()
        .status
        .success()
}

#[test]
fn test_start_creates_ticket_branch_without_upstream() {
    let fixture = TestFixture::new();
    fixture.manifest_for(&["api"]);
    fixture.cmd().arg("sync").assert().success();

    fixture
        .cmd()
        .args(["start", "JIRA-1", "slug"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Branch: feature/JIRA-1-slug"))
        .stdout(predicate::str::contains(
            "api: create new branch feature/JIRA-1-slug from origin/main",
        ));

    let repo = fixture.repo("api");
    assert_eq!(git(&repo, &["symbolic-ref", "--short", "HEAD"]), "feature/JIRA-1-slug");
    assert!(!has_upstream(&repo, "feature/JIRA-1-slug"));
}

#[test]
fn test_start_dry_run_changes_nothing() {
    let fixture = TestFixture::new();
    fixture.manifest_for(&["api"]);
    fixture.cmd().arg("sync").assert().success();

    fixture
        .cmd()
        .args(["start", "JIRA-2", "--prefix", "bugfix", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "[dry-run] api: create new branch bugfix/JIRA-2 from origin/main",
        ));

    assert_eq!(git(&fixture.repo("api"), &["symbolic-ref", "--short", "HEAD"]), "main");
}

#[test]
fn test_checkout_remote_branch_tracks_origin() {
    let fixture = TestFixture::new();
    fixture.manifest_for(&["api"]);
    fixture.remote_branch("api", "release");
    fixture.cmd().arg("sync").assert().success();

    fixture
        .cmd()
        .args(["checkout", "--branch", "release"])
        .assert()
        .success()
        .stdout(predicate::str::contains("api: create tracking branch release from origin"));

    let repo = fixture.repo("api");
    assert_eq!(git(&repo, &["rev-parse", "--abbrev-ref", "release@{upstream}"]), "origin/release");
}

#[test]
fn test_checkout_missing_branch_is_skipped() {
    let fixture = TestFixture::new();
    fixture.manifest_for(&["api"]);
    fixture.cmd().arg("sync").assert().success();

    fixture
        .cmd()
        .args(["checkout", "--branch", "nowhere"])
        .assert()
        .success()
        .stdout(predicate::str::contains("api: skip (branch nowhere not found)"));
}

#[test]
fn test_checkout_uncloned_repo_is_skipped() {
    let fixture = TestFixture::new();
    fixture.manifest_for(&["api"]);

    fixture
        .cmd()
        .args(["checkout", "--branch", "main"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Skipping api (not cloned)"));
}

#[test]
fn test_dirty_repo_stops_checkout() {
    let fixture = TestFixture::new();
    fixture.manifest_for(&["api"]);
    fixture.cmd().arg("sync").assert().success();
    let repo = fixture.repo("api");
    fs::write(repo.join("README.md"), "local edit\n").unwrap();

    fixture
        .cmd()
        .args(["start", "JIRA-3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("repo api has uncommitted changes"));

    assert_eq!(git(&repo, &["symbolic-ref", "--short", "HEAD"]), "main");
    assert_eq!(fs::read_to_string(repo.join("README.md")).unwrap(), "local edit\n");
}

#[test]
fn test_missing_base_ref_fails_before_stashing() {
    let fixture = TestFixture::new();
    let url = fixture.remote("api");
    fixture.manifest(&format!(
        "version: 1\nname: test\nrepos:\n  - id: api\n    url: {url}\n    path: api\n"
    ));
    fixture.cmd().arg("sync").assert().success();
    let repo = fixture.ws().join("api");
    fs::write(repo.join("README.md"), "local edit\n").unwrap();

    fixture
        .cmd()
        .args(["start", "JIRA-4", "--strategy", "stash"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("base_ref is not configured"));

    assert_eq!(git(&repo, &["stash", "list"]), "");
    assert_eq!(fs::read_to_string(repo.join("README.md")).unwrap(), "local edit\n");
}

#[test]
fn test_start_with_explicit_from() {
    let fixture = TestFixture::new();
    let url = fixture.remote("api");
    fixture.manifest(&format!(
        "version: 1\nname: test\nrepos:\n  - id: api\n    url: {url}\n    path: api\n"
    ));
    fixture.cmd().arg("sync").assert().success();

    fixture
        .cmd()
        .args(["start", "JIRA-5", "--from", "main"])
        .assert()
        .success()
        .stdout(predicate::str::contains("api: create new branch feature/JIRA-5 from main"));
}

#[test]
fn test_dry_run_never_stashes() {
    let fixture = TestFixture::new();
    fixture.manifest_for(&["api"]);
    fixture.cmd().arg("sync").assert().success();
    let repo = fixture.repo("api");
    fs::write(repo.join("README.md"), "local edit\n").unwrap();

    fixture
        .cmd()
        .args(["start", "JIRA-6", "--strategy", "stash", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "[dry-run] api: create new branch feature/JIRA-6 from origin/main (after stashing local changes)",
        ));

    fixture
        .cmd()
        .args(["start", "JIRA-6", "--strategy", "reset", "--force", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(after discarding local changes)"));

    assert_eq!(git(&repo, &["stash", "list"]), "");
    assert_eq!(fs::read_to_string(repo.join("README.md")).unwrap(), "local edit\n");
    assert_eq!(git(&repo, &["symbolic-ref", "--short", "HEAD"]), "main");
}
