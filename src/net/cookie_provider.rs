//! `reqwest` cookie provider backed by the persistent store.
use http::HeaderValue;
use time::OffsetDateTime;
use url::Url;

use crate::cookies::header::parse_set_cookie;
use crate::cookies::PersistentCookieStore;

impl reqwest::cookie::CookieStore for PersistentCookieStore {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        let now = OffsetDateTime::now_utc();

        for header in cookie_headers {
            let Ok(value) = header.to_str() else {
                log::warn!("Ignoring non-ASCII Set-Cookie header from {url}");
                continue;
            };
            let Some(cookie) = parse_set_cookie(value, url, now) else {
                log::warn!("Ignoring malformed Set-Cookie header from {url}");
                continue;
            };
            if let Err(e) = self.add(cookie) {
                log::error!("Cannot store cookie from {url}: {e}");
            }
        }
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        let header = self.request_header(url)?;
        match HeaderValue::from_str(&header) {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("Cannot build Cookie header for {url}: {e}");
                None
            }
        }
    }
}
