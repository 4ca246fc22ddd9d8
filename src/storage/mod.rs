//! Cache backends for fetched link content.
//!
//! The fetcher only sees the [`LinkCache`] trait. Two backends implement it:
//!
//! - [`Database`] - SQLite file (or `:memory:`), survives restarts
//! - [`MemoryCache`] - bounded in-process LRU, lost on exit
//!
//! Every backend is responsible for its own synchronization; callers share a
//! single `Arc<dyn LinkCache>` across all concurrent fetches without locking.

mod link_cache;
mod memory;
mod schema;
mod types;

use anyhow::Result;
use async_trait::async_trait;

pub use memory::MemoryCache;
pub use schema::Database;
pub use types::{CacheStats, CachedLink, DatabaseError};

/// Key-value store of fetched pages, keyed by the exact URL string.
#[async_trait]
pub trait LinkCache: Send + Sync {
    /// Whether an entry exists for `url`.
    async fn exists(&self, url: &str) -> Result<bool>;

    /// Reads the stored body and content type for `url`.
    async fn get(&self, url: &str) -> Result<Option<CachedLink>>;

    /// Stores (or replaces) the entry for `url`.
    async fn put(&self, url: &str, link: &CachedLink) -> Result<()>;
}
