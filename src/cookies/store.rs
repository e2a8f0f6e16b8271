//! Durable store infrastructure.
//!
//! A **durable store** is the persistence layer behind a
//! [`PersistentCookieStore`](crate::cookies::PersistentCookieStore). It knows
//! nothing about cookies: it keeps an unordered bag of text records, each one a
//! cookie encoded by [`codec`](crate::cookies::codec).
//!
//! This module exports three reference implementations:
//! - [`InMemoryDurableStore`]: keeps records in memory (tests, private sessions).
//! - [`JsonDurableStore`]: one JSON file holding all records (simple setups).
//! - [`SqliteDurableStore`]: SQLite-backed store (good for concurrency and scale).
//!
//! ## Design notes
//! - Implementations must be `Send + Sync`; the cookie store serializes its own
//!   calls but the same backend may be shared with other readers.
//! - Calls may block on local I/O.
//! - Errors are reported, never swallowed. The cookie store turns them into
//!   [`CookieError::StorageFailure`](crate::errors::CookieError::StorageFailure).
//!
//! ## Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use persistent_cookie_store::cookies::{JsonDurableStore, PersistentCookieStore};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let durable = Arc::new(JsonDurableStore::new("cookies.json"));
//! let store = PersistentCookieStore::new(durable)?;
//! # Ok(()) }
//! ```
mod in_memory;
mod json;
#[cfg(feature = "sqlite_cookie_store")]
mod sqlite;

use anyhow::Result;
use std::sync::Arc;

/// In-memory durable store (no persistence across restarts).
pub use in_memory::InMemoryDurableStore;
/// File-backed JSON durable store.
pub use json::JsonDurableStore;
/// SQLite-backed durable store.
#[cfg(feature = "sqlite_cookie_store")]
pub use sqlite::SqliteDurableStore;

/// A handle to a durable store trait object.
pub type DurableStoreHandle = Arc<dyn DurableStore>;

/// Append/list/clear capability over encoded cookie records.
///
/// No ordering is guaranteed by [`list_all`](DurableStore::list_all).
pub trait DurableStore: Send + Sync {
    /// Persists one encoded cookie record.
    fn append(&self, record: &str) -> Result<()>;

    /// Returns every currently persisted record.
    fn list_all(&self) -> Result<Vec<String>>;

    /// Removes all persisted records.
    fn clear(&self) -> Result<()>;

    /// Replaces the whole bag with `records`.
    ///
    /// The default clears and appends one by one. Backends that can swap the
    /// content in one step should override this.
    fn replace_all(&self, records: &[String]) -> Result<()> {
        self.clear()?;
        for record in records {
            self.append(record)?;
        }
        Ok(())
    }
}
