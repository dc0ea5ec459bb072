//! Time-to-live cache for fetched schedules.
//!
//! # Components
//!
//! - [`CacheStore`]: Raw key/value storage with per-entry timestamps
//! - [`LocalCacheStore`]: In-memory store
//! - `SqliteCacheStore`: Persistent store (feature `sqlite-cache`)
//! - [`TtlCache`]: Typed JSON values with a lazy freshness filter
//! - [`CacheStoreFactory`]: Store selection from [`crate::config::CacheSettings`]

pub mod error;
pub mod factory;
#[cfg(feature = "sqlite-cache")]
pub mod sqlite;
pub mod store;
pub mod ttl_cache;

pub use error::{CacheError, CacheResult};
pub use factory::{CacheStoreFactory, CacheStoreType, CACHE_STORE_ENV};
#[cfg(feature = "sqlite-cache")]
pub use sqlite::SqliteCacheStore;
pub use store::{CacheEntry, CacheStore, LocalCacheStore};
pub use ttl_cache::{Clock, ManualClock, SystemClock, TtlCache, DEFAULT_TTL_DAYS};
