use anyhow::Result;
use async_trait::async_trait;

use super::schema::Database;
use super::types::{CacheStats, CachedLink};
use super::LinkCache;

impl Database {
    // ========================================================================
    // Link Cache Operations
    // ========================================================================

    /// Cache the body and content type fetched for `url`.
    ///
    /// Inserts or replaces the entry. `size_bytes` is the body length and
    /// `fetched_at` the current Unix time. Entries never expire.
    pub async fn cache_link(&self, url: &str, link: &CachedLink) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        let size_bytes = link.body.len() as i64;

        sqlx::query(
            r#"
            INSERT OR REPLACE INTO link_cache
                (url, body, content_type, fetched_at, size_bytes)
            VALUES (?, ?, ?, ?, ?)
        "#,
        )
        .bind(url)
        .bind(&link.body)
        .bind(&link.content_type)
        .bind(now)
        .bind(size_bytes)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Retrieve the cached entry for `url`, if any.
    pub async fn get_cached_link(&self, url: &str) -> Result<Option<CachedLink>> {
        let row: Option<(Vec<u8>, String)> =
            sqlx::query_as("SELECT body, content_type FROM link_cache WHERE url = ?")
                .bind(url)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(body, content_type)| CachedLink { body, content_type }))
    }

    /// Whether an entry exists for `url`.
    pub async fn is_link_cached(&self, url: &str) -> Result<bool> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM link_cache WHERE url = ?")
            .bind(url)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.is_some())
    }

    /// Delete every cached entry.
    ///
    /// Returns the number of entries removed.
    pub async fn clear_cache(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM link_cache")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Compute aggregate cache statistics.
    ///
    /// Returns total entry count, total size in bytes, and oldest/newest
    /// `fetched_at` timestamps.
    pub async fn cache_stats(&self) -> Result<CacheStats> {
        let row: (i64, Option<i64>, Option<i64>, Option<i64>) = sqlx::query_as(
            r#"
            SELECT COUNT(*), SUM(size_bytes), MIN(fetched_at), MAX(fetched_at)
            FROM link_cache
        "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(CacheStats {
            total_entries: row.0,
            total_size_bytes: row.1.unwrap_or(0),
            oldest_entry: row.2,
            newest_entry: row.3,
        })
    }
}

#[async_trait]
impl LinkCache for Database {
    async fn exists(&self, url: &str) -> Result<bool> {
        self.is_link_cached(url).await
    }

    async fn get(&self, url: &str) -> Result<Option<CachedLink>> {
        self.get_cached_link(url).await
    }

    async fn put(&self, url: &str, link: &CachedLink) -> Result<()> {
        self.cache_link(url, link).await
    }
}
