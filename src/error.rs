// src/error.rs

//! Error types for ros2nix
//!
//! Errors are local to one manifest unless [`Error::is_fatal_for_run`]
//! says otherwise; the generate command uses that to decide whether the
//! batch may continue.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using the crate error
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// A required dependency has a database entry that cannot be satisfied
    /// on the target system
    #[error("Unresolved dependency '{name}' ({role}) of package '{package}'")]
    UnresolvedDependency {
        package: String,
        name: String,
        role: String,
    },

    /// A source reference does not follow any supported convention
    #[error("Unsupported source reference: \"{0}\"")]
    UnsupportedSourceReference(String),

    /// Two patches in one run would be written to the same file
    #[error("Patch {} already exists", .0.display())]
    PatchFilenameCollision(PathBuf),

    /// An external command exited unsuccessfully
    #[error("Command `{command}` failed in {} ({status}): {stderr}", .dir.display())]
    CommandFailed {
        command: String,
        dir: PathBuf,
        status: String,
        stderr: String,
    },

    /// An external command produced output that could not be parsed
    #[error("Unexpected output from `{command}`: {reason}")]
    InvalidCommandOutput { command: String, reason: String },

    /// The work tree has no remote-tracking refs to compute a merge-base against
    #[error("No remote-tracking refs under refs/remotes/origin in {}", .toplevel.display())]
    NoUpstream { toplevel: PathBuf },

    /// A package.xml could not be parsed
    #[error("Failed to parse {}: {reason}", .path.display())]
    ManifestParse { path: PathBuf, reason: String },

    /// A dependency condition could not be parsed
    #[error("Invalid condition: {0}")]
    Condition(String),

    /// Contradictory or incomplete options
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// An output file could not be written
    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Whether this error must stop the whole run rather than one manifest
    pub fn is_fatal_for_run(&self) -> bool {
        matches!(self, Error::PatchFilenameCollision(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collision_is_fatal_for_run() {
        let err = Error::PatchFilenameCollision(PathBuf::from("out/0001-fix.patch"));
        assert!(err.is_fatal_for_run());
        assert_eq!(err.to_string(), "Patch out/0001-fix.patch already exists");
    }

    #[test]
    fn test_unresolved_is_local() {
        let err = Error::UnresolvedDependency {
            package: "demo".to_string(),
            name: "libfoo".to_string(),
            role: "build".to_string(),
        };
        assert!(!err.is_fatal_for_run());
        assert!(err.to_string().contains("libfoo"));
    }
}
