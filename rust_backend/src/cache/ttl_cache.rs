//! Freshness-filtered typed cache over a [`CacheStore`].

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use log::{debug, warn};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::error::CacheResult;
use super::store::{CacheEntry, CacheStore};

/// Entries older than this many days are invisible unless a caller
/// overrides the ttl.
pub const DEFAULT_TTL_DAYS: i64 = 14;

/// Time source for freshness checks.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now = *now + by;
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *self.now.lock() = at;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// Typed key/value cache with lazy expiry.
///
/// Values are stored as JSON. An entry is visible when
/// `now - last_seen <= ttl`; a zero ttl accepts any entry. Nothing is ever
/// swept in the background.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use shifter_rust::cache::{LocalCacheStore, TtlCache};
///
/// let cache = TtlCache::new(Arc::new(LocalCacheStore::new()));
/// cache.set("answer", &42u32).unwrap();
/// assert_eq!(cache.get::<u32>("answer", None).unwrap(), Some(42));
///
/// cache.expire("answer").unwrap();
/// assert!(!cache.has("answer", None).unwrap());
/// assert!(cache.has("answer", Some(chrono::Duration::zero())).unwrap());
/// ```
#[derive(Clone)]
pub struct TtlCache {
    store: Arc<dyn CacheStore>,
    clock: Arc<dyn Clock>,
    default_ttl: Duration,
}

impl TtlCache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            default_ttl: Duration::days(DEFAULT_TTL_DAYS),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }

    fn is_fresh(&self, entry: &CacheEntry, ttl: Option<Duration>) -> bool {
        let ttl = ttl.unwrap_or(self.default_ttl);
        ttl == Duration::zero() || self.clock.now() - entry.last_seen <= ttl
    }

    fn fresh_entry(&self, key: &str, ttl: Option<Duration>) -> CacheResult<Option<CacheEntry>> {
        Ok(self
            .store
            .read(key)?
            .filter(|entry| self.is_fresh(entry, ttl)))
    }

    /// Whether a fresh entry exists for `key`.
    ///
    /// `ttl` overrides the default window; `Some(Duration::zero())` disables
    /// the freshness check.
    pub fn has(&self, key: &str, ttl: Option<Duration>) -> CacheResult<bool> {
        Ok(self.fresh_entry(key, ttl)?.is_some())
    }

    /// Fetch and decode a fresh entry.
    ///
    /// An entry that no longer decodes as `T` is reported as a miss.
    pub fn get<T: DeserializeOwned>(
        &self,
        key: &str,
        ttl: Option<Duration>,
    ) -> CacheResult<Option<T>> {
        let Some(entry) = self.fresh_entry(key, ttl)? else {
            debug!("Cache: miss for '{}'", key);
            return Ok(None);
        };

        match serde_json::from_slice(&entry.value) {
            Ok(value) => {
                debug!("Cache: hit for '{}'", key);
                Ok(Some(value))
            }
            Err(e) => {
                warn!("Cache: discarding undecodable entry '{}': {}", key, e);
                Ok(None)
            }
        }
    }

    /// Store `value` under `key`, stamped with the current time.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> CacheResult<()> {
        let bytes = serde_json::to_vec(value)?;
        self.store.write(CacheEntry::new(key, bytes, self.clock.now()))
    }

    /// Push an entry outside every positive ttl without deleting it.
    ///
    /// Returns `false` when no entry exists.
    pub fn expire(&self, key: &str) -> CacheResult<bool> {
        self.store.touch(key, DateTime::<Utc>::default())
    }

    /// Physically remove an entry.
    pub fn delete(&self, key: &str) -> CacheResult<bool> {
        self.store.remove(key)
    }

    /// Physically remove every entry.
    pub fn clear(&self) -> CacheResult<()> {
        self.store.clear()
    }
}
