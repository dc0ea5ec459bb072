//! Cache store selection from configuration.

use std::sync::Arc;

use chrono::Duration;
use log::info;

use super::error::{CacheError, CacheResult};
use super::store::{CacheStore, LocalCacheStore};
use super::ttl_cache::TtlCache;
use crate::config::CacheSettings;

/// Environment variable overriding the configured store type.
pub const CACHE_STORE_ENV: &str = "SHIFTER_CACHE_STORE";

/// Cache store type configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStoreType {
    /// In-memory store
    Local,
    /// SQLite file (requires the `sqlite-cache` feature)
    Sqlite,
}

impl CacheStoreType {
    /// Parse store type from string.
    ///
    /// # Arguments
    /// * `s` - String representation ("local", "memory", "sqlite")
    ///
    /// # Returns
    /// * `Ok(CacheStoreType)` if valid
    /// * `Err` if invalid
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.trim().to_lowercase().as_str() {
            "local" | "memory" => Ok(Self::Local),
            "sqlite" => Ok(Self::Sqlite),
            _ => Err(format!("Unknown cache store type: {}", s)),
        }
    }

    /// Get store type from the `SHIFTER_CACHE_STORE` environment variable.
    ///
    /// Returns `None` when the variable is unset or unparsable.
    pub fn from_env() -> Option<Self> {
        std::env::var(CACHE_STORE_ENV)
            .ok()
            .and_then(|s| Self::from_str(&s).ok())
    }
}

/// Factory for cache stores and caches.
pub struct CacheStoreFactory;

impl CacheStoreFactory {
    /// Create the store described by `settings`.
    ///
    /// The `SHIFTER_CACHE_STORE` environment variable takes precedence over
    /// `settings.store`.
    pub fn create(settings: &CacheSettings) -> CacheResult<Arc<dyn CacheStore>> {
        let store_type = match CacheStoreType::from_env() {
            Some(store_type) => store_type,
            None => settings.store_type().map_err(CacheError::Configuration)?,
        };
        Self::create_with_type(store_type, settings)
    }

    /// Create a store of an explicit type, ignoring the environment.
    pub fn create_with_type(
        store_type: CacheStoreType,
        settings: &CacheSettings,
    ) -> CacheResult<Arc<dyn CacheStore>> {
        info!("Cache: using {:?} store", store_type);
        match store_type {
            CacheStoreType::Local => Ok(Self::create_local()),
            CacheStoreType::Sqlite => Self::create_sqlite(settings),
        }
    }

    /// Create an in-memory store.
    pub fn create_local() -> Arc<dyn CacheStore> {
        Arc::new(LocalCacheStore::new())
    }

    #[cfg(feature = "sqlite-cache")]
    fn create_sqlite(settings: &CacheSettings) -> CacheResult<Arc<dyn CacheStore>> {
        let store = super::sqlite::SqliteCacheStore::open(&settings.path)?;
        Ok(Arc::new(store))
    }

    #[cfg(not(feature = "sqlite-cache"))]
    fn create_sqlite(_settings: &CacheSettings) -> CacheResult<Arc<dyn CacheStore>> {
        Err(CacheError::Configuration(
            "SQLite cache store requires the 'sqlite-cache' feature".to_string(),
        ))
    }

    /// Create a [`TtlCache`] over the configured store and ttl.
    pub fn create_cache(settings: &CacheSettings) -> CacheResult<TtlCache> {
        let store = Self::create(settings)?;
        let secs = i64::try_from(settings.ttl_secs)
            .unwrap_or(i64::MAX)
            .min(i64::MAX / 1000);
        Ok(TtlCache::new(store).with_default_ttl(Duration::seconds(secs)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_type_from_str() {
        assert_eq!(CacheStoreType::from_str("LOCAL").unwrap(), CacheStoreType::Local);
        assert_eq!(CacheStoreType::from_str("memory").unwrap(), CacheStoreType::Local);
        assert_eq!(CacheStoreType::from_str(" sqlite").unwrap(), CacheStoreType::Sqlite);
        assert!(CacheStoreType::from_str("redis").is_err());
    }

    #[test]
    fn test_create_local_cache() {
        let settings = CacheSettings {
            ttl_secs: 60,
            ..CacheSettings::default()
        };
        let store = CacheStoreFactory::create_with_type(CacheStoreType::Local, &settings).unwrap();
        assert!(store.is_empty().unwrap());

        let cache = TtlCache::new(store).with_default_ttl(Duration::seconds(60));
        assert_eq!(cache.default_ttl(), Duration::seconds(60));
    }

    #[cfg(not(feature = "sqlite-cache"))]
    #[test]
    fn test_sqlite_requires_feature() {
        let result =
            CacheStoreFactory::create_with_type(CacheStoreType::Sqlite, &CacheSettings::default());
        assert!(matches!(result, Err(CacheError::Configuration(_))));
    }

    #[cfg(feature = "sqlite-cache")]
    #[test]
    fn test_sqlite_store_from_settings() {
        let dir = tempfile::TempDir::new().unwrap();
        let settings = CacheSettings {
            store: "sqlite".to_string(),
            path: dir.path().join("cache.sqlite3"),
            ..CacheSettings::default()
        };
        let store = CacheStoreFactory::create_with_type(CacheStoreType::Sqlite, &settings).unwrap();
        assert!(store.is_empty().unwrap());
        assert!(settings.path.exists());
    }
}
