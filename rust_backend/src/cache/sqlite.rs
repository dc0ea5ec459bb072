//! SQLite-backed cache store.

use std::path::Path;

use chrono::{DateTime, Utc};
use log::debug;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};

use super::error::{CacheError, CacheResult};
use super::store::{CacheEntry, CacheStore};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS cache (
    key TEXT PRIMARY KEY,
    value BLOB NOT NULL,
    last_seen INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_cache_last_seen ON cache(last_seen);
";

/// Cache store persisted in a single SQLite table.
///
/// Timestamps are stored as Unix seconds.
pub struct SqliteCacheStore {
    conn: Mutex<Connection>,
}

impl SqliteCacheStore {
    /// Open or create the cache database at `path`.
    pub fn open(path: &Path) -> CacheResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                CacheError::Storage(format!(
                    "Failed to create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        debug!("Cache: opening SQLite store at {}", path.display());
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        Self::with_connection(conn)
    }

    /// Open an in-memory database (for testing)
    pub fn in_memory() -> CacheResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> CacheResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

fn from_unix(seconds: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(seconds, 0).unwrap_or_default()
}

impl CacheStore for SqliteCacheStore {
    fn read(&self, key: &str) -> CacheResult<Option<CacheEntry>> {
        let entry = self
            .conn
            .lock()
            .query_row(
                "SELECT value, last_seen FROM cache WHERE key = ?",
                params![key],
                |row| {
                    Ok(CacheEntry::new(
                        key,
                        row.get::<_, Vec<u8>>(0)?,
                        from_unix(row.get(1)?),
                    ))
                },
            )
            .optional()?;
        Ok(entry)
    }

    fn write(&self, entry: CacheEntry) -> CacheResult<()> {
        self.conn.lock().execute(
            "INSERT OR REPLACE INTO cache (key, value, last_seen) VALUES (?, ?, ?)",
            params![entry.key, entry.value, entry.last_seen.timestamp()],
        )?;
        Ok(())
    }

    fn touch(&self, key: &str, last_seen: DateTime<Utc>) -> CacheResult<bool> {
        let rows = self.conn.lock().execute(
            "UPDATE cache SET last_seen = ? WHERE key = ?",
            params![last_seen.timestamp(), key],
        )?;
        Ok(rows > 0)
    }

    fn remove(&self, key: &str) -> CacheResult<bool> {
        let rows = self
            .conn
            .lock()
            .execute("DELETE FROM cache WHERE key = ?", params![key])?;
        Ok(rows > 0)
    }

    fn clear(&self) -> CacheResult<()> {
        self.conn.lock().execute("DELETE FROM cache", [])?;
        Ok(())
    }

    fn len(&self) -> CacheResult<usize> {
        let count: i64 = self
            .conn
            .lock()
            .query_row("SELECT COUNT(*) FROM cache", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_entries_persist_across_connections() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("cache.sqlite3");
        let stamp = from_unix(1_700_000_000);

        {
            let store = SqliteCacheStore::open(&path).unwrap();
            store.write(CacheEntry::new("k", b"v".to_vec(), stamp)).unwrap();
        }

        let store = SqliteCacheStore::open(&path).unwrap();
        let entry = store.read("k").unwrap().unwrap();
        assert_eq!(entry.value, b"v");
        assert_eq!(entry.last_seen, stamp);
    }

    #[test]
    fn test_upsert_touch_remove() {
        let store = SqliteCacheStore::in_memory().unwrap();
        store.write(CacheEntry::new("k", b"1".to_vec(), from_unix(10))).unwrap();
        store.write(CacheEntry::new("k", b"2".to_vec(), from_unix(20))).unwrap();
        assert_eq!(store.len().unwrap(), 1);

        assert!(store.touch("k", from_unix(5)).unwrap());
        assert!(!store.touch("missing", from_unix(5)).unwrap());
        let entry = store.read("k").unwrap().unwrap();
        assert_eq!(entry.value, b"2");
        assert_eq!(entry.last_seen, from_unix(5));

        assert!(store.remove("k").unwrap());
        assert_eq!(store.read("k").unwrap(), None);

        store.write(CacheEntry::new("a", vec![], from_unix(1))).unwrap();
        store.clear().unwrap();
        assert!(store.is_empty().unwrap());
    }
}
