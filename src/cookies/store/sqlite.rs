//! SQLite-backed durable store.
//!
//! `SqliteDurableStore` keeps encoded cookie records in a single table:
//!
//! ```sql
//! CREATE TABLE cookie_records (
//!     id INTEGER PRIMARY KEY AUTOINCREMENT,
//!     record TEXT NOT NULL
//! );
//! ```
//!
//! Database access goes through an `r2d2` pool for safe multi-threaded use.
//! [`DurableStore::replace_all`] runs in one transaction, so the table either
//! holds the old or the new bag.
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::rusqlite::{params, OpenFlags};
use r2d2_sqlite::SqliteConnectionManager;

use crate::cookies::store::DurableStore;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS cookie_records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    record TEXT NOT NULL
);";

/// A SQLite-based durable store that persists records across sessions.
pub struct SqliteDurableStore {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteDurableStore {
    /// Opens (or creates) the database at `path` and ensures the schema exists.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path.as_ref())
            .with_flags(OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE | OpenFlags::SQLITE_OPEN_URI)
            .with_init(|c| {
                c.busy_timeout(Duration::from_millis(500))?;
                c.pragma_update(None, "journal_mode", "WAL")?;
                c.execute_batch(SCHEMA)?;
                Ok(())
            });

        Self::from_manager(manager, 8)
    }

    /// Opens a private in-memory database. All data is gone when the store is dropped.
    pub fn in_memory() -> Result<Self> {
        let manager = SqliteConnectionManager::memory().with_init(|c| c.execute_batch(SCHEMA));
        // every pooled connection to ":memory:" is its own database
        Self::from_manager(manager, 1)
    }

    fn from_manager(manager: SqliteConnectionManager, max_size: u32) -> Result<Self> {
        let pool = Pool::builder()
            .max_size(max_size)
            .connection_timeout(Duration::from_secs(5))
            .build(manager)?;
        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>> {
        Ok(self.pool.get()?)
    }
}

impl DurableStore for SqliteDurableStore {
    fn append(&self, record: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute("INSERT INTO cookie_records (record) VALUES (?1)", params![record])?;
        Ok(())
    }

    fn list_all(&self) -> Result<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT record FROM cookie_records ORDER BY id")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn clear(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM cookie_records", [])?;
        Ok(())
    }

    fn replace_all(&self, records: &[String]) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM cookie_records", [])?;
        {
            let mut stmt = tx.prepare("INSERT INTO cookie_records (record) VALUES (?1)")?;
            for record in records {
                stmt.execute(params![record])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}
