// src/provenance/mod.rs

//! Git source provenance
//!
//! Derives a reproducible `src` for a package from the git work tree it
//! lives in:
//!
//! 1. Read the `origin` URL, the package prefix, the top level and HEAD.
//! 2. Find the upstream revision: the merge-base of HEAD and all
//!    remote-tracking branches of `origin`. This is the newest commit known
//!    to exist upstream, even with a detached or advanced HEAD.
//! 3. With per-package sources, move back to the last upstream commit that
//!    touched the package directory, so unrelated commits do not change the
//!    package hash.
//! 4. Prefetch the revision (cached per repository, or per package with
//!    per-package sources) to obtain its content hash.
//! 5. Optionally export local commits on top of the upstream revision as
//!    patches.

mod git;
mod host;
mod patches;
mod prefetch;
mod source;

pub use git::{GitRepo, UPSTREAM_REFS};
pub use host::GitHost;
pub use patches::{PatchArtifact, PatchRegistry, extract_patches};
pub use prefetch::{GitRepoCache, PrefetchCache, PrefetchInfo, Prefetcher};
pub use source::{GitSource, SourceDescriptor};

use crate::command::CommandRunner;
use crate::context::RunContext;
use crate::error::Result;
use std::path::Path;
use tracing::{debug, warn};

/// Knobs of the git provenance resolution
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GitProvenanceOptions {
    /// Hash only the package sub-directory at its last upstream change
    pub per_package_src: bool,
    /// Export local commits as patches
    pub patches: bool,
}

/// Resolved source of one package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitProvenance {
    pub source: GitSource,
    /// Local commits exported as patches, oldest first
    pub patches: Vec<PatchArtifact>,
    /// Whole-repository upstream revision (merge-base with `origin`)
    pub merge_base: String,
    /// HEAD has commits that are neither upstream nor exported
    pub local_commits_dropped: bool,
}

/// Resolve the git source of the package in `package_dir`
pub fn resolve_git_provenance(
    runner: &dyn CommandRunner,
    package_dir: &Path,
    options: GitProvenanceOptions,
    ctx: &mut RunContext,
) -> Result<GitProvenance> {
    let repo = GitRepo::new(runner, package_dir);
    let url = repo.remote_url()?;
    let prefix = repo.prefix()?;
    let toplevel = repo.toplevel()?;
    let head = repo.head()?;

    let merge_base = repo.merge_base_to_upstream(&head)?;
    let upstream_rev = if options.per_package_src {
        repo.last_commit_touching(&merge_base)?
    } else {
        merge_base.clone()
    };
    debug!(
        "{}: HEAD {}, merge-base {}, upstream revision {}",
        package_dir.display(),
        head,
        merge_base,
        upstream_rev
    );

    let sparse_checkout = (options.per_package_src && !prefix.is_empty()).then(|| prefix.clone());

    // Per-package hashes depend on the package path, so they cannot be shared
    // through the repository keyed cache.
    let cached = if options.per_package_src {
        None
    } else {
        ctx.git_cache.get(&toplevel, &upstream_rev).cloned()
    };
    let info = match cached {
        Some(info) => {
            debug!("Reusing prefetch of {} for {}", toplevel.display(), upstream_rev);
            info
        }
        None => {
            let key = PrefetchCache::key(&url, options.per_package_src.then_some(prefix.as_str()));
            let persisted = ctx
                .prefetch_cache
                .as_ref()
                .and_then(|cache| cache.get(&key, &upstream_rev))
                .cloned();
            let info = match persisted {
                Some(info) => info,
                None => {
                    let info = Prefetcher::new(runner).prefetch(
                        &toplevel,
                        &upstream_rev,
                        sparse_checkout.as_deref(),
                    )?;
                    if let Some(cache) = ctx.prefetch_cache.as_mut() {
                        cache.insert(key, info.clone());
                    }
                    info
                }
            };
            if !options.per_package_src {
                ctx.git_cache.insert(toplevel.clone(), info.clone());
            }
            info
        }
    };

    let mut local_commits_dropped = false;
    let patches = if options.patches {
        extract_patches(&repo, &upstream_rev)?
    } else {
        if head != merge_base {
            warn!(
                "{} contains commits not available upstream. Consider using --patches",
                toplevel.display()
            );
            local_commits_dropped = true;
        }
        Vec::new()
    };

    let source = GitSource {
        host: GitHost::detect(&url),
        rev: info.rev,
        sha256: info.sha256,
        subdir: (!prefix.is_empty()).then_some(prefix),
        sparse_checkout,
    };

    Ok(GitProvenance {
        source,
        patches,
        merge_base,
        local_commits_dropped,
    })
}
