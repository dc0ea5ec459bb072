//! Error types for cache storage.

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;

/// Error raised by a cache store. A miss is never an error.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[cfg(feature = "sqlite-cache")]
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}
