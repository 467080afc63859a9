// src/provenance/prefetch.rs

//! Content prefetching and hash caches
//!
//! `nix-prefetch-git` clones a revision and prints its NAR hash. Because that
//! is slow, results are memoized twice:
//!
//! - [`GitRepoCache`] lives for one run and is keyed by repository top
//!   level, so packages sharing a repository share one prefetch.
//! - [`PrefetchCache`] is persisted between runs, keyed by remote URL (plus
//!   the package directory with per-package sources) and only trusted when
//!   the cached revision equals the requested one.

use crate::command::{CommandRunner, CommandSpec};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A prefetched revision and its content hash
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefetchInfo {
    pub rev: String,
    pub sha256: String,
}

/// Runs `nix-prefetch-git`
pub struct Prefetcher<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> Prefetcher<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }

    /// Hash `rev` of the repository at `location`, optionally restricted to a
    /// sparse checkout of `sparse_path`
    pub fn prefetch(
        &self,
        location: &Path,
        rev: &str,
        sparse_path: Option<&str>,
    ) -> Result<PrefetchInfo> {
        let mut spec = CommandSpec::new("nix-prefetch-git").arg("--quiet");
        if let Some(path) = sparse_path {
            spec = spec.args(["--sparse-checkout", path, "--non-cone-mode"]);
        }
        spec = spec.arg(location.display().to_string()).arg(rev);

        info!("Prefetching {} at {}", location.display(), rev);
        let output = self.runner.run(&spec)?;
        let parsed: PrefetchInfo =
            serde_json::from_str(&output.stdout).map_err(|e| Error::InvalidCommandOutput {
                command: spec.display(),
                reason: e.to_string(),
            })?;
        if parsed.rev != rev {
            warn!("nix-prefetch-git returned revision {} for {}", parsed.rev, rev);
        }
        Ok(parsed)
    }
}

/// Run-scoped memo of prefetch results keyed by repository top level
#[derive(Debug, Clone, Default)]
pub struct GitRepoCache {
    entries: HashMap<PathBuf, PrefetchInfo>,
}

impl GitRepoCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached result for `toplevel`, if it was computed for `rev`
    pub fn get(&self, toplevel: &Path, rev: &str) -> Option<&PrefetchInfo> {
        self.entries.get(toplevel).filter(|info| info.rev == rev)
    }

    pub fn insert(&mut self, toplevel: PathBuf, info: PrefetchInfo) {
        self.entries.insert(toplevel, info);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Prefetch results persisted across runs
#[derive(Debug, Clone, Default)]
pub struct PrefetchCache {
    path: PathBuf,
    entries: BTreeMap<String, PrefetchInfo>,
    dirty: bool,
}

impl PrefetchCache {
    /// Default location: `$XDG_CACHE_HOME/ros2nix/git-cache.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::cache_dir().map(|dir| dir.join("ros2nix").join("git-cache.json"))
    }

    /// Load the cache at `path`; a missing or corrupt file gives an empty cache
    pub fn load(path: &Path) -> Self {
        let entries = match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!("Ignoring unreadable git cache {}: {}", path.display(), e);
                BTreeMap::new()
            }),
            Err(_) => BTreeMap::new(),
        };
        debug!("Loaded {} git cache entries from {}", entries.len(), path.display());
        Self {
            path: path.to_path_buf(),
            entries,
            dirty: false,
        }
    }

    /// Cache key for a remote, scoped to `prefix` with per-package sources
    pub fn key(url: &str, prefix: Option<&str>) -> String {
        match prefix {
            Some(prefix) => format!("{}?dir={}", url, prefix),
            None => url.to_string(),
        }
    }

    /// Cached result for `key`, if it was computed for `rev`
    pub fn get(&self, key: &str, rev: &str) -> Option<&PrefetchInfo> {
        self.entries.get(key).filter(|info| info.rev == rev)
    }

    pub fn insert(&mut self, key: String, info: PrefetchInfo) {
        self.entries.insert(key, info);
        self.dirty = true;
    }

    /// Write the cache back if anything changed
    pub fn save(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| Error::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string(&self.entries)?;
        std::fs::write(&self.path, json).map_err(|source| Error::Write {
            path: self.path.clone(),
            source,
        })?;
        self.dirty = false;
        Ok(())
    }
}
