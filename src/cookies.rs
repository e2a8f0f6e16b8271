//! Cookies: [`MemoryCookieJar`], [`PersistentCookieStore`] and durable backends.

mod cookies;
mod cookie_jar;
mod persistent_cookie_jar;
pub mod codec;
pub mod header;
pub mod store;

pub use cookies::Cookie;
pub use cookies::CookieKey;
pub use cookies::SameSite;

pub use cookie_jar::MemoryCookieJar;
pub use persistent_cookie_jar::PersistentCookieStore;

pub use store::DurableStore;
pub use store::DurableStoreHandle;
pub use store::InMemoryDurableStore;
pub use store::JsonDurableStore;
#[cfg(feature = "sqlite_cookie_store")]
pub use store::SqliteDurableStore;
