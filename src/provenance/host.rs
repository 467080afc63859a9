// src/provenance/host.rs

//! Git hosting detection
//!
//! Remotes on GitHub are fetched with `fetchFromGitHub`, which downloads a
//! tarball instead of cloning. Everything else uses `fetchgit` with the
//! remote URL as is.

use regex::Regex;
use std::sync::LazyLock;

static GITHUB_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https://github\.com/(?P<owner>[^/]*)/(?P<repo>.*?)(\.git|/.*)?$").unwrap()
});

/// Where a git remote is hosted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitHost {
    /// Any git server, fetched by URL
    Generic { url: String },
    /// A GitHub repository
    GitHub { owner: String, repo: String },
}

impl GitHost {
    /// Classify a remote URL
    pub fn detect(url: &str) -> Self {
        match GITHUB_URL.captures(url) {
            Some(caps) => Self::GitHub {
                owner: caps["owner"].to_string(),
                repo: caps["repo"].to_string(),
            },
            None => Self::Generic {
                url: url.to_string(),
            },
        }
    }

    /// Name of the Nix fetcher for this host
    pub fn fetcher(&self) -> &'static str {
        match self {
            Self::Generic { .. } => "fetchgit",
            Self::GitHub { .. } => "fetchFromGitHub",
        }
    }
}
