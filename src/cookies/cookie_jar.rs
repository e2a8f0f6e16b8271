//! In-memory cookie jar.
//!
//! A [`MemoryCookieJar`] is the authoritative runtime view of the cookies a
//! client currently holds. Entries are keyed by their identity
//! `(name, domain, path)`, so adding a cookie replaces any previous cookie with
//! the same identity.
//!
//! ## Notes & limitations
//! - No expiry logic runs on insertion; callers decide what is worth keeping.
//!   Expired entries are only filtered out of [`MemoryCookieJar::matching`].
//! - This type is **not** internally synchronized. The
//!   [`PersistentCookieStore`](crate::cookies::PersistentCookieStore) owns it behind
//!   a mutex together with its durable store.

use std::collections::hash_map::Values;
use std::collections::HashMap;

use time::OffsetDateTime;
use url::Url;

use crate::cookies::header::matches_url;
use crate::cookies::{Cookie, CookieKey};

/// Identity-keyed set of live cookies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryCookieJar {
    entries: HashMap<CookieKey, Cookie>,
}

impl MemoryCookieJar {
    /// Creates an empty in-memory cookie jar.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `cookie`, replacing and returning the cookie with the same identity.
    pub fn add(&mut self, cookie: Cookie) -> Option<Cookie> {
        self.entries.insert(cookie.key(), cookie)
    }

    /// Removes the cookie with the same identity as `cookie`, if any.
    pub fn remove(&mut self, cookie: &Cookie) -> Option<Cookie> {
        self.entries.remove(&cookie.key())
    }

    /// Removes all cookies. Returns `false` if the jar was already empty.
    pub fn remove_all(&mut self) -> bool {
        if self.entries.is_empty() {
            return false;
        }
        self.entries.clear();
        true
    }

    pub fn get(&self, key: &CookieKey) -> Option<&Cookie> {
        self.entries.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterates the cookies in no particular order.
    pub fn iter(&self) -> Values<'_, CookieKey, Cookie> {
        self.entries.values()
    }

    /// Returns a snapshot of all cookies.
    pub fn cookies(&self) -> Vec<Cookie> {
        self.entries.values().cloned().collect()
    }

    /// Returns the cookies to send with a request to `url` at `now`.
    ///
    /// Cookies with longer paths come first, as RFC 6265 recommends.
    pub fn matching(&self, url: &Url, now: OffsetDateTime) -> Vec<&Cookie> {
        let mut matched: Vec<&Cookie> = self
            .entries
            .values()
            .filter(|cookie| matches_url(cookie, url, now))
            .collect();
        matched.sort_by(|a, b| b.path.len().cmp(&a.path.len()).then_with(|| a.name.cmp(&b.name)));
        matched
    }
}

impl<'a> IntoIterator for &'a MemoryCookieJar {
    type Item = &'a Cookie;
    type IntoIter = Values<'a, CookieKey, Cookie>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
