//! Cookie core types.
//!
//! This module defines the [`Cookie`] value handled by the jars and stores, its
//! identity key [`CookieKey`], and the [`SameSite`] policy.
//!
//! Two cookies are *the same cookie* when their `(name, domain, path)` triple
//! matches; every other attribute is payload that replaces the old one on add.
//!
//! ```rust
//! use persistent_cookie_store::cookies::{Cookie, SameSite};
//! use time::{Duration, OffsetDateTime};
//!
//! let c = Cookie::new("session", "abc123", "example.com")
//!     .with_path("/")
//!     .with_expires(OffsetDateTime::now_utc() + Duration::hours(1))
//!     .with_same_site(SameSite::Lax)
//!     .secure(true)
//!     .http_only(true);
//! assert!(!c.is_expired());
//! assert!(c.is_persistent());
//! ```

use std::fmt;
use time::OffsetDateTime;

/// SameSite policy of a cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl SameSite {
    /// Parses the `SameSite` attribute value, case-insensitive.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.eq_ignore_ascii_case("strict") {
            Some(SameSite::Strict)
        } else if value.eq_ignore_ascii_case("lax") {
            Some(SameSite::Lax)
        } else if value.eq_ignore_ascii_case("none") {
            Some(SameSite::None)
        } else {
            None
        }
    }
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SameSite::Strict => f.write_str("Strict"),
            SameSite::Lax => f.write_str("Lax"),
            SameSite::None => f.write_str("None"),
        }
    }
}

/// Identity of a cookie: `(name, domain, path)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CookieKey {
    pub name: String,
    pub domain: String,
    pub path: String,
}

/// An HTTP cookie as kept by the jar and the durable store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    /// Cookie name (case-sensitive).
    pub name: String,

    /// Raw cookie value (not URL-decoded).
    pub value: String,

    /// Domain the cookie belongs to, without a leading dot.
    pub domain: String,

    /// Path scoping (e.g. `"/"`).
    pub path: String,

    /// Absolute expiry time. Session cookies have `None`.
    pub expires: Option<OffsetDateTime>,

    /// If `true`, cookie is sent only over HTTPS.
    pub secure: bool,

    /// If `true`, cookie is hidden from client-side scripts.
    pub http_only: bool,

    /// If `true`, the cookie only matches `domain` exactly and not its subdomains.
    pub host_only: bool,

    /// SameSite policy, if the server set one.
    pub same_site: Option<SameSite>,
}

impl Cookie {
    /// Creates a host-only session cookie with path `/`.
    pub fn new(name: impl Into<String>, value: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: domain.into(),
            path: "/".to_string(),
            expires: None,
            secure: false,
            http_only: false,
            host_only: true,
            same_site: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_expires(mut self, expires: OffsetDateTime) -> Self {
        self.expires = Some(expires);
        self
    }

    pub fn with_same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = Some(same_site);
        self
    }

    pub fn secure(mut self, on: bool) -> Self {
        self.secure = on;
        self
    }

    pub fn http_only(mut self, on: bool) -> Self {
        self.http_only = on;
        self
    }

    pub fn host_only(mut self, on: bool) -> Self {
        self.host_only = on;
        self
    }

    /// Returns the identity key of this cookie.
    pub fn key(&self) -> CookieKey {
        CookieKey {
            name: self.name.clone(),
            domain: self.domain.clone(),
            path: self.path.clone(),
        }
    }

    /// Returns `true` if `other` has the same `(name, domain, path)`.
    pub fn same_identity(&self, other: &Cookie) -> bool {
        self.name == other.name && self.domain == other.domain && self.path == other.path
    }

    /// A cookie with an expiry time survives restarts; a session cookie does not carry one.
    pub fn is_persistent(&self) -> bool {
        self.expires.is_some()
    }

    /// Returns `true` if the cookie carries an expiry at or before `now`.
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        matches!(self.expires, Some(expires) if expires <= now)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(OffsetDateTime::now_utc())
    }
}

impl fmt::Display for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}
