use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Database-specific errors with user-friendly messages
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Another process holds a lock on the cache file
    #[error("The cache database is locked by another process. Please close it and try again.")]
    InstanceLocked,

    /// Migration failed
    #[error("Database migration failed: {0}")]
    Migration(String),

    /// Generic database error
    #[error("Database error: {0}")]
    Other(#[from] sqlx::Error),
}

impl DatabaseError {
    /// Check if a sqlx error indicates database locking
    pub(crate) fn from_sqlx(err: sqlx::Error) -> Self {
        if is_lock_message(&err.to_string()) {
            return DatabaseError::InstanceLocked;
        }
        DatabaseError::Other(err)
    }
}

/// SQLITE_BUSY (5), SQLITE_LOCKED (6) and SQLITE_CANTOPEN (14) all surface as
/// one of these messages.
pub(crate) fn is_lock_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("database is locked")
        || lower.contains("database table is locked")
        || lower.contains("sqlite_busy")
        || lower.contains("sqlite_locked")
        || lower.contains("unable to open database file")
}

// ============================================================================
// Data Structures
// ============================================================================

/// A cached fetch: the raw body and its normalized content type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CachedLink {
    pub body: Vec<u8>,
    /// MIME type without parameters, e.g. `text/html`
    pub content_type: String,
}

impl CachedLink {
    /// An entry with neither body nor content type carries nothing worth
    /// reusing; readers treat it as a miss.
    pub fn is_blank(&self) -> bool {
        self.body.is_empty() && self.content_type.is_empty()
    }
}

/// Aggregate statistics for the SQLite link cache
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub total_entries: i64,
    pub total_size_bytes: i64,
    /// Unix timestamp of the oldest entry
    pub oldest_entry: Option<i64>,
    /// Unix timestamp of the newest entry
    pub newest_entry: Option<i64>,
}
