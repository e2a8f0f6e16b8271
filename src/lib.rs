//! Persistent cookie handling for `reqwest` clients.
//!
//! Cookies live in a [`MemoryCookieJar`](cookies::MemoryCookieJar) that a
//! [`PersistentCookieStore`](cookies::PersistentCookieStore) mirrors to a
//! pluggable [`DurableStore`](cookies::DurableStore) (in-memory, JSON file or
//! SQLite). The store doubles as the `reqwest` cookie provider of
//! [`HttpClient`](net::HttpClient).
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use persistent_cookie_store::config::ClientConfig;
//! use persistent_cookie_store::cookies::{JsonDurableStore, PersistentCookieStore};
//! use persistent_cookie_store::net::HttpClient;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let cookies = Arc::new(PersistentCookieStore::new(Arc::new(JsonDurableStore::new("cookies.json")))?);
//! let client = HttpClient::new(&ClientConfig::default(), cookies)?;
//! let response = client.fetch("https://example.com/").await?;
//! println!("{} {}", response.status, response.status_text);
//! # Ok(()) }
//! ```

pub mod config;
pub mod cookies;
pub mod errors;
pub mod net;

pub use errors::{CodecError, CookieError, NetError};
