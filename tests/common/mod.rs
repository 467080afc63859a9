// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use ros2nix::command::{CommandOutput, CommandRunner, CommandSpec, SystemRunner};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Whether a `git` binary is available; git tests are skipped otherwise
pub fn git_available() -> bool {
    which::which("git").is_ok()
}

/// A work tree cloned from a bare `origin` repository
///
/// Keep the fixture alive for as long as its paths are used.
pub struct GitFixture {
    pub dir: TempDir,
    pub origin: PathBuf,
    pub work: PathBuf,
}

impl GitFixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let origin = dir.path().join("origin.git");
        let work = dir.path().join("work");

        run_git(dir.path(), &["init", "-q", "--bare", "origin.git"]);
        run_git(dir.path(), &["init", "-q", "work"]);
        run_git(&work, &["checkout", "-q", "-b", "main"]);
        run_git(&work, &["remote", "add", "origin", origin.to_str().unwrap()]);

        Self { dir, origin, work }
    }

    /// Run git in the work tree and return its trimmed output
    pub fn git(&self, args: &[&str]) -> String {
        run_git(&self.work, args)
    }

    /// Write `content` to `rel` inside the work tree
    pub fn write(&self, rel: &str, content: &str) {
        let path = self.work.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    /// Commit everything and return the new HEAD
    pub fn commit(&self, message: &str) -> String {
        self.git(&["add", "-A"]);
        self.git(&[
            "-c",
            "user.name=Test User",
            "-c",
            "user.email=test@example.com",
            "-c",
            "commit.gpgsign=false",
            "commit",
            "-q",
            "-m",
            message,
        ]);
        self.head()
    }

    pub fn head(&self) -> String {
        self.git(&["rev-parse", "HEAD"])
    }

    /// Publish HEAD as `main` on origin and update the tracking refs
    pub fn push(&self) {
        self.git(&["push", "-q", "origin", "HEAD:main"]);
        self.git(&["fetch", "-q", "origin"]);
    }

    /// Whether `ancestor` is an ancestor of (or equal to) `rev`
    pub fn is_ancestor(&self, ancestor: &str, rev: &str) -> bool {
        Command::new("git")
            .args(["merge-base", "--is-ancestor", ancestor, rev])
            .current_dir(&self.work)
            .status()
            .unwrap()
            .success()
    }
}

fn run_git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .env("GIT_CONFIG_NOSYSTEM", "1")
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).unwrap().trim().to_string()
}

/// Runs git for real and answers `nix-prefetch-git` with a fake hash
#[derive(Default)]
pub struct FakePrefetchRunner {
    pub prefetches: RefCell<Vec<CommandSpec>>,
}

impl FakePrefetchRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prefetch_count(&self) -> usize {
        self.prefetches.borrow().len()
    }
}

impl CommandRunner for FakePrefetchRunner {
    fn run(&self, spec: &CommandSpec) -> ros2nix::Result<CommandOutput> {
        if spec.program != "nix-prefetch-git" {
            return SystemRunner.run(spec);
        }
        self.prefetches.borrow_mut().push(spec.clone());
        let rev = spec.args.last().cloned().unwrap_or_default();
        let stdout = serde_json::json!({
            "url": spec.args.iter().rev().nth(1),
            "rev": rev,
            "sha256": format!("fake-{}", &rev[..rev.len().min(12)]),
        })
        .to_string();
        Ok(CommandOutput {
            stdout,
            stderr: String::new(),
        })
    }
}

/// A format 3 manifest with the given dependency tags
pub fn manifest(name: &str, dependencies: &str) -> String {
    format!(
        r#"<?xml version="1.0"?>
<package format="3">
  <name>{name}</name>
  <version>1.0.0</version>
  <description>The {name} package</description>
  <maintainer email="dev@example.com">Dev</maintainer>
  <license>BSD</license>
{dependencies}
  <export>
    <build_type>ament_cmake</build_type>
  </export>
</package>
"#
    )
}
