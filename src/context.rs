// src/context.rs

//! Run-scoped state shared by all manifests of one invocation
//!
//! Manifests are processed one at a time and each step borrows the context
//! mutably, so no locking is involved. Processing manifests in parallel
//! would require wrapping it in a mutex.

use crate::provenance::{GitRepoCache, PatchRegistry, PrefetchCache};
use crate::error::Result;

#[derive(Debug, Default)]
pub struct RunContext {
    /// Prefetch results of this run, keyed by repository top level
    pub git_cache: GitRepoCache,
    /// Patch files written so far
    pub patches: PatchRegistry,
    /// Prefetch results persisted across runs, unless disabled
    pub prefetch_cache: Option<PrefetchCache>,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefetch_cache(mut self, cache: PrefetchCache) -> Self {
        self.prefetch_cache = Some(cache);
        self
    }

    /// Persist state that outlives the run
    pub fn finish(&mut self) -> Result<()> {
        if let Some(cache) = self.prefetch_cache.as_mut() {
            cache.save()?;
        }
        Ok(())
    }
}
