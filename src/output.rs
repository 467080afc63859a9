// src/output.rs

//! Destination of generated files
//!
//! In write mode files are written to disk. In compare mode nothing is
//! written; each file is compared with what is on disk and a unified diff is
//! printed for every file that would change.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, error};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Write,
    Compare,
}

#[derive(Debug)]
pub struct OutputSink {
    mode: OutputMode,
    out_of_date: Vec<PathBuf>,
}

impl OutputSink {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            out_of_date: Vec::new(),
        }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Write `content` to `path`, or compare it with the file at `path`
    pub fn emit(&mut self, path: &Path, content: &[u8]) -> Result<()> {
        match self.mode {
            OutputMode::Write => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent).map_err(|source| Error::Write {
                        path: parent.to_path_buf(),
                        source,
                    })?;
                }
                std::fs::write(path, content).map_err(|source| Error::Write {
                    path: path.to_path_buf(),
                    source,
                })?;
                debug!("Wrote {}", path.display());
            }
            OutputMode::Compare => self.compare(path, content),
        }
        Ok(())
    }

    fn compare(&mut self, path: &Path, content: &[u8]) {
        let on_disk = match std::fs::read(path) {
            Ok(on_disk) => on_disk,
            Err(e) => {
                error!("Cannot read {}: {}", path.display(), e);
                self.out_of_date.push(path.to_path_buf());
                return;
            }
        };
        if on_disk == content {
            debug!("{} is up-to-date", path.display());
            return;
        }

        error!("{} is not up-to-date", path.display());
        println!(
            "{}",
            unified_diff(
                path,
                &String::from_utf8_lossy(&on_disk),
                &String::from_utf8_lossy(content)
            )
        );
        self.out_of_date.push(path.to_path_buf());
    }

    /// Files that differ from their generated content (compare mode)
    pub fn out_of_date(&self) -> &[PathBuf] {
        &self.out_of_date
    }
}

/// Diff from the file on disk to the generated content
fn unified_diff(path: &Path, on_disk: &str, generated: &str) -> String {
    let patch = diffy::create_patch(on_disk, generated).to_string();
    // Replace diffy's placeholder file names
    let hunks: Vec<&str> = patch
        .lines()
        .skip_while(|line| line.starts_with("--- ") || line.starts_with("+++ "))
        .collect();
    format!(
        "--- {}\n+++ up-to-date\n{}",
        path.display(),
        hunks.join("\n")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("package.nix");
        let mut sink = OutputSink::new(OutputMode::Write);
        sink.emit(&path, b"{ }").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ }");
        assert!(sink.out_of_date().is_empty());
    }

    #[test]
    fn test_compare_detects_changes() {
        let dir = tempfile::tempdir().unwrap();
        let same = dir.path().join("same.nix");
        let changed = dir.path().join("changed.nix");
        let missing = dir.path().join("missing.nix");
        std::fs::write(&same, "x\n").unwrap();
        std::fs::write(&changed, "old\n").unwrap();

        let mut sink = OutputSink::new(OutputMode::Compare);
        sink.emit(&same, b"x\n").unwrap();
        assert!(sink.out_of_date().is_empty());

        sink.emit(&changed, b"new\n").unwrap();
        sink.emit(&missing, b"y\n").unwrap();
        assert_eq!(sink.out_of_date(), &[changed.clone(), missing.clone()]);

        // Compare mode never touches the disk
        assert_eq!(std::fs::read_to_string(&changed).unwrap(), "old\n");
        assert!(!missing.exists());
    }

    #[test]
    fn test_unified_diff_names_file() {
        let diff = unified_diff(Path::new("pkg/package.nix"), "a\nb\n", "a\nc\n");
        assert!(diff.starts_with("--- pkg/package.nix\n+++ up-to-date\n@@"));
        assert!(diff.contains("-b"));
        assert!(diff.contains("+c"));
    }
}
