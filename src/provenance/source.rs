// src/provenance/source.rs

//! Source descriptors - where the code of a generated package comes from

use super::host::GitHost;

/// Git revision pinned by content hash
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitSource {
    pub host: GitHost,
    pub rev: String,
    pub sha256: String,
    /// Package directory inside the repository (git prefix, trailing slash)
    pub subdir: Option<String>,
    /// Sub-directory the fetch is restricted to
    pub sparse_checkout: Option<String>,
}

impl GitSource {
    /// `sourceRoot` for packages not at the repository root
    pub fn source_root(&self) -> Option<String> {
        self.subdir
            .as_ref()
            .map(|subdir| format!("${{src.name}}/{}", subdir))
    }
}

/// How the generated expression obtains its `src`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceDescriptor {
    /// A function parameter supplied by the caller
    Param { name: String },
    /// A path relative to the generated file
    Local { path: String },
    /// A fetch of a pinned git revision
    Git(GitSource),
}

impl SourceDescriptor {
    /// Local source for a package `rel_dir` away from the output file
    pub fn local(rel_dir: &str) -> Self {
        let path = match rel_dir.trim_end_matches('/') {
            "" | "." => "./.".to_string(),
            dir => format!("./{}", dir),
        };
        Self::Local { path }
    }

    /// Extra function parameter this source needs
    pub fn param(&self) -> Option<&str> {
        match self {
            Self::Param { name } => Some(name),
            Self::Local { .. } => None,
            Self::Git(git) => Some(git.host.fetcher()),
        }
    }

    /// Derived `sourceRoot`, if any
    pub fn source_root(&self) -> Option<String> {
        match self {
            Self::Git(git) => git.source_root(),
            _ => None,
        }
    }
}
