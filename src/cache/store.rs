use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
#[cfg(test)]
use mockall::automock;
use rusqlite::{Connection, OptionalExtension};
use tracing::{debug, info};

use crate::error::CacheError;

/// Which listing table a key belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListingKind {
    Provider,
    Module,
}

impl ListingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Provider => "provider",
            Self::Module => "module",
        }
    }
}

/// A raw stored listing: compressed payload plus store-assigned timestamp
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredItem {
    pub package_key: String,
    pub data: Vec<u8>,
    pub last_updated: DateTime<Utc>,
}

/// Key-value persistence for compressed listings
#[cfg_attr(test, automock)]
pub trait ListingStore: Send + Sync {
    /// Returns `Ok(None)` when nothing is stored under `key`.
    fn get_item(&self, kind: ListingKind, key: &str) -> Result<Option<StoredItem>, CacheError>;

    /// Replaces the payload under `key` and returns the timestamp now recorded for it.
    fn put_item(&self, kind: ListingKind, key: &str, data: &[u8])
    -> Result<DateTime<Utc>, CacheError>;
}

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new(db_path: &Path) -> Result<Self, CacheError> {
        info!("Initializing listing store at {:?}", db_path);

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| CacheError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        let store = Self {
            conn: Mutex::new(conn),
        };
        store.create_schema()?;

        Ok(store)
    }

    fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>, CacheError> {
        self.conn.lock().map_err(|_| CacheError::LockPoisoned)
    }

    fn create_schema(&self) -> Result<(), CacheError> {
        let conn = self.lock_conn()?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS listings (
                kind TEXT NOT NULL,
                package_key TEXT NOT NULL,
                data BLOB NOT NULL,
                last_updated INTEGER NOT NULL,
                PRIMARY KEY (kind, package_key)
            )
            "#,
            [],
        )?;

        debug!("Listing schema ready");
        Ok(())
    }

    fn to_datetime(millis: i64) -> Result<DateTime<Utc>, CacheError> {
        DateTime::from_timestamp_millis(millis).ok_or(CacheError::InvalidTimestamp(millis))
    }
}

impl ListingStore for SqliteStore {
    fn get_item(&self, kind: ListingKind, key: &str) -> Result<Option<StoredItem>, CacheError> {
        let conn = self.lock_conn()?;
        let row = conn
            .query_row(
                "SELECT data, last_updated FROM listings WHERE kind = ?1 AND package_key = ?2",
                (kind.as_str(), key),
                |row| Ok((row.get::<_, Vec<u8>>(0)?, row.get::<_, i64>(1)?)),
            )
            .optional()?;

        let Some((data, last_updated)) = row else {
            debug!("No stored {} listing for {}", kind.as_str(), key);
            return Ok(None);
        };

        Ok(Some(StoredItem {
            package_key: key.to_string(),
            data,
            last_updated: Self::to_datetime(last_updated)?,
        }))
    }

    fn put_item(
        &self,
        kind: ListingKind,
        key: &str,
        data: &[u8],
    ) -> Result<DateTime<Utc>, CacheError> {
        let now = Utc::now().timestamp_millis();
        let conn = self.lock_conn()?;

        // last_updated never moves backwards for a key
        conn.execute(
            r#"
            INSERT INTO listings (kind, package_key, data, last_updated)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(kind, package_key) DO UPDATE SET
                data = excluded.data,
                last_updated = MAX(listings.last_updated, excluded.last_updated)
            "#,
            (kind.as_str(), key, data, now),
        )?;

        let last_updated: i64 = conn.query_row(
            "SELECT last_updated FROM listings WHERE kind = ?1 AND package_key = ?2",
            (kind.as_str(), key),
            |row| row.get(0),
        )?;

        info!("Stored {} listing for {} ({} bytes)", kind.as_str(), key, data.len());
        Self::to_datetime(last_updated)
    }
}
