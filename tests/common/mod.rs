//! Shared fixtures for the E2E tests.
//!
//! A [`TestFixture`] owns a temp directory with two parts:
//! - `remotes/<name>.git`: bare repositories standing in for upstreams,
//!   each fed by a seed clone in `seeds/<name>`;
//! - `ws/`: the workspace root the binary runs against.
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! let fixture = TestFixture::new();
//! let url = fixture.remote("api");
//! fixture.manifest(&format!("...url: {url}..."));
//! fixture.cmd().arg("sync").assert().success();
//! ```

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use assert_fs::prelude::*;
use assert_fs::TempDir;

pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    pub use predicates::prelude::*;

    pub use super::{git, TestFixture};
}

const IDENTITY: [(&str, &str); 4] = [
    ("GIT_AUTHOR_NAME", "agentws tests"),
    ("GIT_AUTHOR_EMAIL", "tests@example.com"),
    ("GIT_COMMITTER_NAME", "agentws tests"),
    ("GIT_COMMITTER_EMAIL", "tests@example.com"),
];

/// Runs git in `dir` and returns trimmed stdout, panicking on failure.
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .envs(IDENTITY)
        .output()
        .expect("failed to spawn git");
    assert!(
        output.status.success(),
        "git {:?} failed in {}: {}",
        args,
        dir.display(),
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

pub struct TestFixture {
    pub temp: TempDir,
}

impl TestFixture {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("failed to create temp dir");
        temp.child("ws").create_dir_all().expect("failed to create ws");
        Self { temp }
    }

    /// The workspace root.
    pub fn ws(&self) -> PathBuf {
        self.temp.path().join("ws")
    }

    /// Creates a bare remote with one commit on `main`; returns its URL.
    pub fn remote(&self, name: &str) -> String {
        let bare = self.temp.path().join("remotes").join(format!("{}.git", name));
        fs::create_dir_all(&bare).expect("failed to create remote dir");
        git(&bare, &["init", "--bare", "--initial-branch=main"]);

        let seed = self.seed(name);
        fs::create_dir_all(&seed).expect("failed to create seed dir");
        git(&seed, &["init", "--initial-branch=main"]);
        git(&seed, &["remote", "add", "origin", bare.to_str().expect("utf-8 path")]);
        fs::write(seed.join("README.md"), format!("# {}\n", name)).expect("write README");
        git(&seed, &["add", "README.md"]);
        git(&seed, &["commit", "-m", "initial"]);
        git(&seed, &["push", "origin", "main"]);

        bare.to_string_lossy().into_owned()
    }

    /// Pushes a new commit to the remote's `main`; returns the full hash.
    pub fn advance(&self, name: &str, file: &str) -> String {
        let seed = self.seed(name);
        fs::write(seed.join(file), "change\n").expect("write file");
        git(&seed, &["add", file]);
        git(&seed, &["commit", "-m", &format!("add {}", file)]);
        git(&seed, &["push", "origin", "main"]);
        git(&seed, &["rev-parse", "HEAD"])
    }

    /// Pushes a branch starting at the remote's `main`.
    pub fn remote_branch(&self, name: &str, branch: &str) {
        let seed = self.seed(name);
        git(&seed, &["push", "origin", &format!("main:refs/heads/{}", branch)]);
    }

    fn seed(&self, name: &str) -> PathBuf {
        self.temp.path().join("seeds").join(name)
    }

    pub fn manifest(&self, yaml: &str) {
        self.temp
            .child("ws/workspace.yaml")
            .write_str(yaml)
            .expect("failed to write manifest");
    }

    /// Manifest with `defaults.base_ref: main` and one remote repo per name.
    pub fn manifest_for(&self, names: &[&str]) {
        let mut yaml = String::from("version: 1\nname: test\ndefaults:\n  base_ref: main\nrepos:\n");
        for name in names {
            let url = self.remote(name);
            yaml.push_str(&format!(
                "  - id: {name}\n    url: {url}\n    path: repos/{name}\n    ref: main\n"
            ));
        }
        self.manifest(&yaml);
    }

    /// Checkout directory of a repo laid out by [`Self::manifest_for`].
    pub fn repo(&self, name: &str) -> PathBuf {
        self.ws().join("repos").join(name)
    }

    /// The binary, rooted at the workspace, with colour off and a git identity.
    pub fn cmd(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("agentws");
        cmd.arg("--root")
            .arg(self.ws())
            .env("NO_COLOR", "1")
            .env_remove("AGENTWS_ROOT")
            .env_remove("AGENTWS_JOBS")
            .env_remove("RUST_LOG")
            .envs(IDENTITY);
        cmd
    }
}
