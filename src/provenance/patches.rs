// src/provenance/patches.rs

//! Local patch series
//!
//! Commits that exist only in the local work tree are exported as patches so
//! the generated expression can apply them on top of the upstream revision.

use super::git::GitRepo;
use crate::error::{Error, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One exported commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchArtifact {
    /// File name chosen by `git format-patch`, e.g. `0001-Fix-build.patch`
    pub file_name: String,
    pub content: Vec<u8>,
}

/// Export every commit after `upstream` touching the package, oldest first
pub fn extract_patches(repo: &GitRepo<'_>, upstream: &str) -> Result<Vec<PatchArtifact>> {
    let commits = repo.local_commits(upstream)?;
    if commits.is_empty() {
        return Ok(Vec::new());
    }

    let scratch = tempfile::tempdir()?;
    let mut patches = Vec::with_capacity(commits.len());
    for commit in &commits {
        let file = repo.format_patch(commit, scratch.path())?;
        let content = std::fs::read(&file)?;
        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| Error::InvalidCommandOutput {
                command: format!("git format-patch -1 {}", commit),
                reason: format!("not a file: {}", file.display()),
            })?;
        // Every patch is numbered 0001; drop it before the next export
        std::fs::remove_file(&file)?;
        debug!("Exported {} as {}", commit, file_name);
        patches.push(PatchArtifact { file_name, content });
    }
    Ok(patches)
}

/// Output paths of all patches written during one run
#[derive(Debug, Clone, Default)]
pub struct PatchRegistry {
    used: HashSet<PathBuf>,
}

impl PatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `path`; claiming a path twice is a
    /// [`Error::PatchFilenameCollision`]
    pub fn register(&mut self, path: &Path) -> Result<()> {
        if !self.used.insert(path.to_path_buf()) {
            return Err(Error::PatchFilenameCollision(path.to_path_buf()));
        }
        Ok(())
    }
}
