// src/provenance/git.rs

//! Read-only queries against a git work tree
//!
//! All queries run `git` in the package directory, so path arguments such as
//! `-- .` restrict history to the package sub-directory.

use crate::command::{CommandRunner, CommandSpec};
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Namespace of remote-tracking refs considered upstream
pub const UPSTREAM_REFS: &str = "refs/remotes/origin";

/// A package directory inside a git work tree
pub struct GitRepo<'a> {
    runner: &'a dyn CommandRunner,
    dir: PathBuf,
}

impl<'a> GitRepo<'a> {
    pub fn new(runner: &'a dyn CommandRunner, dir: impl AsRef<Path>) -> Self {
        Self {
            runner,
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn git<I, S>(&self, args: I) -> Result<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let spec = CommandSpec::new("git").args(args).current_dir(&self.dir);
        Ok(self.runner.run(&spec)?.trimmed().to_string())
    }

    /// Run git and require a single non-empty line of output
    fn git_line<I, S>(&self, args: I) -> Result<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        let out = self.git(args.clone())?;
        if out.is_empty() || out.contains('\n') {
            return Err(Error::InvalidCommandOutput {
                command: format!("git {}", args.join(" ")),
                reason: format!("expected a single line, got {:?}", out),
            });
        }
        Ok(out)
    }

    /// URL of the `origin` remote
    pub fn remote_url(&self) -> Result<String> {
        self.git_line(["config", "remote.origin.url"])
    }

    /// Path of the package directory relative to the top level, with a
    /// trailing slash, or empty at the repository root
    pub fn prefix(&self) -> Result<String> {
        self.git(["rev-parse", "--show-prefix"])
    }

    pub fn toplevel(&self) -> Result<PathBuf> {
        self.git_line(["rev-parse", "--show-toplevel"]).map(PathBuf::from)
    }

    pub fn head(&self) -> Result<String> {
        self.git_line(["rev-parse", "HEAD"])
    }

    /// Tips of all remote-tracking branches of `origin`
    pub fn upstream_tips(&self) -> Result<Vec<String>> {
        let out = self.git(["for-each-ref", UPSTREAM_REFS, "--format=%(objectname)"])?;
        let mut tips: Vec<String> = Vec::new();
        for tip in out.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if !tips.iter().any(|t| t == tip) {
                tips.push(tip.to_string());
            }
        }
        Ok(tips)
    }

    /// Latest ancestor of `commit` that is reachable from some upstream tip
    pub fn merge_base_to_upstream(&self, commit: &str) -> Result<String> {
        let tips = self.upstream_tips()?;
        if tips.is_empty() {
            return Err(Error::NoUpstream {
                toplevel: self.toplevel().unwrap_or_else(|_| self.dir.clone()),
            });
        }
        let base = self.git_line(
            ["merge-base".to_string(), commit.to_string()]
                .into_iter()
                .chain(tips),
        )?;
        debug!("merge-base of {} with {}: {}", commit, UPSTREAM_REFS, base);
        Ok(base)
    }

    /// Most recent commit at or before `rev` that touched the package directory
    pub fn last_commit_touching(&self, rev: &str) -> Result<String> {
        let out = self.git(["rev-list", "-1", rev, "--", "."])?;
        if out.is_empty() {
            return Err(Error::InvalidCommandOutput {
                command: format!("git rev-list -1 {} -- .", rev),
                reason: format!("no commit touches {}", self.dir.display()),
            });
        }
        Ok(out)
    }

    /// Commits after `upstream` up to HEAD touching the package, oldest first
    pub fn local_commits(&self, upstream: &str) -> Result<Vec<String>> {
        let range = format!("{}..HEAD", upstream);
        let out = self.git(["rev-list", "--reverse", range.as_str(), "--", "."])?;
        Ok(out
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Write `commit` as a patch relative to the package directory into
    /// `out_dir` and return the created file
    ///
    /// Commit hashes and signatures are left out so the patch only changes
    /// when the commit content does.
    pub fn format_patch(&self, commit: &str, out_dir: &Path) -> Result<PathBuf> {
        let out = self.git([
            "format-patch".to_string(),
            "--zero-commit".to_string(),
            "--relative".to_string(),
            "--no-signature".to_string(),
            "-o".to_string(),
            out_dir.display().to_string(),
            "-1".to_string(),
            commit.to_string(),
        ])?;
        let file = out.lines().last().map(str::trim).unwrap_or_default();
        if file.is_empty() {
            return Err(Error::InvalidCommandOutput {
                command: format!("git format-patch -1 {}", commit),
                reason: "no patch file reported".to_string(),
            });
        }
        let path = PathBuf::from(file);
        Ok(if path.is_absolute() {
            path
        } else {
            self.dir.join(path)
        })
    }
}
