use anyhow::{anyhow, Result};
use async_trait::async_trait;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Mutex;

use super::types::CachedLink;
use super::LinkCache;

/// Default number of entries kept when no capacity is configured.
const DEFAULT_CAPACITY: usize = 1024;

/// Bounded in-process link cache with least-recently-used eviction.
///
/// The mutex is only held for the map operation itself, never across an
/// `.await`, so it is safe to share between tasks.
pub struct MemoryCache {
    entries: Mutex<LruCache<String, CachedLink>>,
}

impl MemoryCache {
    /// Creates a cache holding at most `capacity` entries.
    ///
    /// A capacity of zero falls back to the default of 1024.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity)
            .or(NonZeroUsize::new(DEFAULT_CAPACITY))
            .unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn with_entries<T>(&self, f: impl FnOnce(&mut LruCache<String, CachedLink>) -> T) -> Result<T> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow!("memory cache mutex poisoned"))?;
        Ok(f(&mut entries))
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[async_trait]
impl LinkCache for MemoryCache {
    async fn exists(&self, url: &str) -> Result<bool> {
        self.with_entries(|e| e.contains(url))
    }

    async fn get(&self, url: &str) -> Result<Option<CachedLink>> {
        self.with_entries(|e| e.get(url).cloned())
    }

    async fn put(&self, url: &str, link: &CachedLink) -> Result<()> {
        self.with_entries(|e| {
            e.put(url.to_string(), link.clone());
        })
    }
}
