//! Cache storage trait and the in-memory store.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use super::error::CacheResult;

/// Stored value with its freshness timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub key: String,
    pub value: Vec<u8>,
    pub last_seen: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(key: impl Into<String>, value: Vec<u8>, last_seen: DateTime<Utc>) -> Self {
        Self {
            key: key.into(),
            value,
            last_seen,
        }
    }
}

/// Raw key/value storage behind a [`super::TtlCache`].
///
/// Every method is one atomic read or write against the backing store, so a
/// store can be shared between request handlers behind an `Arc`.
pub trait CacheStore: Send + Sync {
    /// Fetch the entry stored under `key`, regardless of age.
    fn read(&self, key: &str) -> CacheResult<Option<CacheEntry>>;

    /// Insert or replace an entry.
    fn write(&self, entry: CacheEntry) -> CacheResult<()>;

    /// Overwrite the timestamp of an existing entry.
    ///
    /// Returns `false` when no entry exists for `key`.
    fn touch(&self, key: &str, last_seen: DateTime<Utc>) -> CacheResult<bool>;

    /// Delete an entry. Returns `false` when no entry existed.
    fn remove(&self, key: &str) -> CacheResult<bool>;

    /// Delete every entry.
    fn clear(&self) -> CacheResult<()>;

    /// Number of stored entries, fresh or not.
    fn len(&self) -> CacheResult<usize>;

    fn is_empty(&self) -> CacheResult<bool> {
        Ok(self.len()? == 0)
    }
}

/// In-memory cache store.
///
/// Suitable for tests and single-process deployments; entries are lost when
/// the store is dropped.
#[derive(Debug, Default)]
pub struct LocalCacheStore {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl LocalCacheStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for LocalCacheStore {
    fn read(&self, key: &str) -> CacheResult<Option<CacheEntry>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn write(&self, entry: CacheEntry) -> CacheResult<()> {
        self.entries.write().insert(entry.key.clone(), entry);
        Ok(())
    }

    fn touch(&self, key: &str, last_seen: DateTime<Utc>) -> CacheResult<bool> {
        match self.entries.write().get_mut(key) {
            Some(entry) => {
                entry.last_seen = last_seen;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn remove(&self, key: &str) -> CacheResult<bool> {
        Ok(self.entries.write().remove(key).is_some())
    }

    fn clear(&self) -> CacheResult<()> {
        self.entries.write().clear();
        Ok(())
    }

    fn len(&self) -> CacheResult<usize> {
        Ok(self.entries.read().len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_store_roundtrip() {
        let store = LocalCacheStore::new();
        let now = Utc::now();
        assert!(store.is_empty().unwrap());
        assert_eq!(store.read("a").unwrap(), None);

        store.write(CacheEntry::new("a", b"1".to_vec(), now)).unwrap();
        store.write(CacheEntry::new("a", b"2".to_vec(), now)).unwrap();
        assert_eq!(store.len().unwrap(), 1);
        assert_eq!(store.read("a").unwrap().unwrap().value, b"2");
    }

    #[test]
    fn test_touch_and_remove() {
        let store = LocalCacheStore::new();
        let earlier = DateTime::<Utc>::default();
        assert!(!store.touch("a", earlier).unwrap());

        store.write(CacheEntry::new("a", vec![], Utc::now())).unwrap();
        assert!(store.touch("a", earlier).unwrap());
        assert_eq!(store.read("a").unwrap().unwrap().last_seen, earlier);

        assert!(store.remove("a").unwrap());
        assert!(!store.remove("a").unwrap());

        store.write(CacheEntry::new("b", vec![], Utc::now())).unwrap();
        store.clear().unwrap();
        assert!(store.is_empty().unwrap());
    }
}
