//! Content-addressed cache of compiled modules
//!
//! Keyed by the CRC32 of the source; a hit is only returned when the stored
//! text is identical, so hash collisions fall through to a fresh compile.

use livemark_evaluator::CompiledModule;
use livemark_parser::source_hash;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::debug;

struct CachedModule {
    source: Arc<str>,
    module: Arc<CompiledModule>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

pub struct ModuleCache {
    entries: Mutex<LruCache<u32, CachedModule>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ModuleCache {
    /// Cache holding up to `capacity` modules. `None` when capacity is 0.
    pub fn new(capacity: usize) -> Option<Self> {
        let capacity = NonZeroUsize::new(capacity)?;
        Some(Self {
            entries: Mutex::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        })
    }

    pub fn get(&self, source: &str) -> Option<Arc<CompiledModule>> {
        let key = source_hash(source);
        let mut entries = self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        match entries.get(&key) {
            Some(cached) if &*cached.source == source => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(key = format!("{:08x}", key), "Module cache hit");
                Some(cached.module.clone())
            }
            _ => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub fn insert(&self, source: Arc<str>, module: Arc<CompiledModule>) {
        let key = source_hash(&source);
        let mut entries = self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.put(key, CachedModule { source, module });
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }
}

impl std::fmt::Debug for ModuleCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleCache").field("stats", &self.stats()).finish()
    }
}
