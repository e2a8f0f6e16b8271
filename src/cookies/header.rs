//! `Set-Cookie` parsing and request matching.
//!
//! Parsing follows a pragmatic subset of RFC 6265: the attributes `Path`,
//! `Domain` (leading dot stripped), `Expires`, `Max-Age`, `SameSite`, `Secure`
//! and `HttpOnly` are understood, everything else is ignored.
//!
//! ## Notes & limitations
//! - `Expires` is read with the RFC 6265 cookie-date algorithm, which covers
//!   IMF-fixdate (`Wed, 21 Oct 2015 07:28:00 GMT`), RFC 850
//!   (`Wednesday, 21-Oct-15 07:28:00 GMT`) and asctime
//!   (`Wed Oct 21 07:28:00 2015`). Two-digit years `70..=99` are 19xx, `0..=69`
//!   are 20xx. Unparseable dates turn the cookie into a session cookie.
//! - `Max-Age` wins over `Expires` and is capped at 400 days.
//! - There is no public suffix list. A `Domain` attribute must domain-match the
//!   request host and contain a dot; a dotless domain equal to the host, or any
//!   `Domain` sent by an IP-address host that equals it, yields a host-only
//!   cookie. Everything else is rejected.
//!
//! See also: RFC 6265bis (HTTP State Management Mechanism).

use crate::cookies::{Cookie, SameSite};
use time::{Date, Duration, Month, OffsetDateTime, PrimitiveDateTime, Time};
use url::{Host, Url};

const MAX_AGE_CAP_SECS: i64 = 400 * 24 * 60 * 60;

/// Parses a single `Set-Cookie` header value received from `url`.
///
/// Returns `None` when the header has no `name=value` pair, an empty name, or a
/// `Domain` attribute the request host may not set.
pub fn parse_set_cookie(header: &str, url: &Url, now: OffsetDateTime) -> Option<Cookie> {
    let host = url.host_str()?.to_ascii_lowercase();
    let default_path = default_path(url);

    let mut parts = header.split(';');
    let (name, value) = parts.next()?.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }

    let mut cookie = Cookie::new(name, value.trim(), host.clone()).with_path(default_path);
    let mut max_age: Option<i64> = None;

    for part in parts {
        let part = part.trim();
        if let Some((k, v)) = part.split_once('=') {
            let v = v.trim();
            match k.trim().to_ascii_lowercase().as_str() {
                "path" => {
                    if v.starts_with('/') {
                        cookie.path = v.to_string();
                    }
                }
                "domain" => {
                    let domain = v.trim_start_matches('.').to_ascii_lowercase();
                    if !domain.is_empty() {
                        cookie.domain = domain;
                        cookie.host_only = false;
                    }
                }
                "expires" => cookie.expires = parse_cookie_date(v),
                "max-age" => {
                    if let Ok(secs) = v.parse::<i64>() {
                        max_age = Some(secs);
                    }
                }
                "samesite" => cookie.same_site = SameSite::parse(v),
                _ => {}
            }
        } else if part.eq_ignore_ascii_case("secure") {
            cookie.secure = true;
        } else if part.eq_ignore_ascii_case("httponly") {
            cookie.http_only = true;
        }
    }

    if let Some(secs) = max_age {
        cookie.expires = Some(if secs <= 0 {
            OffsetDateTime::UNIX_EPOCH
        } else {
            now + Duration::seconds(secs.min(MAX_AGE_CAP_SECS))
        });
    }

    if !cookie.host_only {
        if cookie.domain == host && (is_ip_host(url) || !cookie.domain.contains('.')) {
            cookie.host_only = true;
        } else if is_ip_host(url) || !domain_matches(&host, &cookie.domain) {
            log::warn!("Rejecting cookie {} for domain {} set by host {}", cookie.name, cookie.domain, host);
            return None;
        }
    }

    Some(cookie)
}

/// Returns `true` if `cookie` should be sent with a request to `url` at `now`.
pub fn matches_url(cookie: &Cookie, url: &Url, now: OffsetDateTime) -> bool {
    let host = match url.host_str() {
        Some(h) => h.to_ascii_lowercase(),
        None => return false,
    };

    let domain_ok = if cookie.host_only || is_ip_host(url) {
        host == cookie.domain
    } else {
        domain_matches(&host, &cookie.domain)
    };

    domain_ok
        && path_matches(&cookie.path, url.path())
        && (!cookie.secure || url.scheme() == "https")
        && !cookie.is_expired_at(now)
}

/// Builds a `Cookie` request header value from `cookies`, `None` if there are none.
pub fn request_header<'a>(cookies: impl IntoIterator<Item = &'a Cookie>) -> Option<String> {
    let header = cookies
        .into_iter()
        .map(|c| format!("{}={}", c.name, c.value))
        .collect::<Vec<_>>()
        .join("; ");

    if header.is_empty() {
        None
    } else {
        Some(header)
    }
}

fn default_path(url: &Url) -> String {
    url.path()
        .rsplit_once('/')
        .map_or("/", |(a, _)| if a.is_empty() { "/" } else { a })
        .to_string()
}

fn is_ip_host(url: &Url) -> bool {
    matches!(url.host(), Some(Host::Ipv4(_) | Host::Ipv6(_)))
}

/// Suffix match for domain cookies. A dotless domain only matches itself.
fn domain_matches(host: &str, domain: &str) -> bool {
    host == domain || (domain.contains('.') && host.ends_with(&format!(".{}", domain)))
}

fn path_matches(cookie_path: &str, request_path: &str) -> bool {
    if request_path == cookie_path {
        return true;
    }
    request_path.starts_with(cookie_path)
        && (cookie_path.ends_with('/') || request_path[cookie_path.len()..].starts_with('/'))
}

/// RFC 6265 section 5.1.1: the first token that looks like a time, a day, a
/// month and a year wins for each slot, everything else is ignored.
fn parse_cookie_date(value: &str) -> Option<OffsetDateTime> {
    let mut hms = None;
    let mut day = None;
    let mut month = None;
    let mut year = None;

    for token in value.split(is_date_delimiter).filter(|t| !t.is_empty()) {
        if hms.is_none() {
            if let Some(t) = time_token(token) {
                hms = Some(t);
                continue;
            }
        }
        if day.is_none() {
            if let Some(d) = leading_number(token, 1, 2) {
                day = Some(d);
                continue;
            }
        }
        if month.is_none() {
            if let Some(m) = month_token(token) {
                month = Some(m);
                continue;
            }
        }
        if year.is_none() {
            if let Some(y) = leading_number(token, 2, 4) {
                year = Some(y);
            }
        }
    }

    let year = match year? {
        y @ 70..=99 => y + 1900,
        y @ 0..=69 => y + 2000,
        y => y,
    };
    if year < 1601 {
        return None;
    }

    let (hour, minute, second) = hms?;
    let date = Date::from_calendar_date(i32::try_from(year).ok()?, month?, u8::try_from(day?).ok()?).ok()?;
    let time = Time::from_hms(hour, minute, second).ok()?;
    Some(PrimitiveDateTime::new(date, time).assume_utc())
}

fn is_date_delimiter(c: char) -> bool {
    matches!(c, '\t' | ' '..='/' | ';'..='@' | '['..='`' | '{'..='~')
}

/// `min..=max` leading digits, optionally followed by a non-digit tail.
fn leading_number(token: &str, min: usize, max: usize) -> Option<u32> {
    let digits = token.bytes().take_while(u8::is_ascii_digit).count();
    if digits < min || digits > max {
        return None;
    }
    token[..digits].parse().ok()
}

fn time_token(token: &str) -> Option<(u8, u8, u8)> {
    let mut fields = token.splitn(3, ':');
    let hour = fields.next()?;
    let minute = fields.next()?;
    let second = fields.next()?;

    let field = |f: &str| -> Option<u8> {
        if (1..=2).contains(&f.len()) && f.bytes().all(|b| b.is_ascii_digit()) {
            f.parse().ok()
        } else {
            None
        }
    };
    let second_digits = second.bytes().take_while(u8::is_ascii_digit).count();
    Some((field(hour)?, field(minute)?, field(&second[..second_digits])?))
}

fn month_token(token: &str) -> Option<Month> {
    let month = match token.get(..3)?.to_ascii_lowercase().as_str() {
        "jan" => Month::January,
        "feb" => Month::February,
        "mar" => Month::March,
        "apr" => Month::April,
        "may" => Month::May,
        "jun" => Month::June,
        "jul" => Month::July,
        "aug" => Month::August,
        "sep" => Month::September,
        "oct" => Month::October,
        "nov" => Month::November,
        "dec" => Month::December,
        _ => return None,
    };
    Some(month)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn parses_attributes() {
        let now = OffsetDateTime::now_utc();
        let c = parse_set_cookie(
            "sid=abc; Path=/app; Domain=.Example.com; Secure; HttpOnly; SameSite=strict",
            &url("https://www.example.com/app/login"),
            now,
        )
        .unwrap();

        assert_eq!(c.name, "sid");
        assert_eq!(c.value, "abc");
        assert_eq!(c.path, "/app");
        assert_eq!(c.domain, "example.com");
        assert!(!c.host_only);
        assert!(c.secure);
        assert!(c.http_only);
        assert_eq!(c.same_site, Some(SameSite::Strict));
        assert_eq!(c.expires, None);
    }

    #[test]
    fn defaults_to_host_only_and_request_directory() {
        let c = parse_set_cookie("a=1", &url("http://Example.com/docs/page.html"), OffsetDateTime::now_utc()).unwrap();
        assert_eq!(c.domain, "example.com");
        assert!(c.host_only);
        assert_eq!(c.path, "/docs");

        let c = parse_set_cookie("a=1; Path=relative", &url("http://example.com/index"), OffsetDateTime::now_utc()).unwrap();
        assert_eq!(c.path, "/");
    }

    #[test]
    fn parses_expires_formats() {
        let u = url("https://example.com/");
        let now = OffsetDateTime::now_utc();

        let c = parse_set_cookie("a=1; Expires=Wed, 21 Oct 2015 07:28:00 GMT", &u, now).unwrap();
        assert_eq!(c.expires, Some(datetime!(2015-10-21 07:28:00 UTC)));

        let c = parse_set_cookie("a=1; expires=Wed, 21-Oct-2015 07:28:00 GMT", &u, now).unwrap();
        assert_eq!(c.expires, Some(datetime!(2015-10-21 07:28:00 UTC)));

        let c = parse_set_cookie("a=1; Expires=Wednesday, 21-Oct-15 07:28:00 GMT", &u, now).unwrap();
        assert_eq!(c.expires, Some(datetime!(2015-10-21 07:28:00 UTC)));

        let c = parse_set_cookie("a=1; Expires=Wed Oct 21 07:28:00 2015", &u, now).unwrap();
        assert_eq!(c.expires, Some(datetime!(2015-10-21 07:28:00 UTC)));

        let c = parse_set_cookie("a=1; Expires=Sun Nov  6 08:49:37 1994", &u, now).unwrap();
        assert_eq!(c.expires, Some(datetime!(1994-11-06 08:49:37 UTC)));

        let c = parse_set_cookie("a=1; Expires=tomorrow", &u, now).unwrap();
        assert_eq!(c.expires, None);

        let c = parse_set_cookie("a=1; Expires=Wed, 31 Feb 2015 07:28:00 GMT", &u, now).unwrap();
        assert_eq!(c.expires, None);
    }

    #[test]
    fn two_digit_years_follow_the_cookie_date_rule() {
        assert_eq!(
            parse_cookie_date("Thursday, 01-Jan-70 00:00:00 GMT"),
            Some(datetime!(1970-01-01 00:00:00 UTC))
        );
        assert_eq!(
            parse_cookie_date("Friday, 31-Dec-99 23:59:59 GMT"),
            Some(datetime!(1999-12-31 23:59:59 UTC))
        );
        assert_eq!(
            parse_cookie_date("Monday, 01-Jan-00 00:00:00 GMT"),
            Some(datetime!(2000-01-01 00:00:00 UTC))
        );
        assert_eq!(
            parse_cookie_date("Sunday, 31-Dec-69 12:00:00 GMT"),
            Some(datetime!(2069-12-31 12:00:00 UTC))
        );
        assert_eq!(parse_cookie_date("Sat, 01 Jan 1600 00:00:00 GMT"), None);
    }

    #[test]
    fn logout_cookie_with_legacy_date_is_expired() {
        let now = OffsetDateTime::now_utc();
        let c = parse_set_cookie(
            "sid=; Expires=Thursday, 01-Jan-70 00:00:00 GMT",
            &url("https://example.com/"),
            now,
        )
        .unwrap();
        assert!(c.is_expired_at(now));
    }

    #[test]
    fn max_age_wins_over_expires() {
        let u = url("https://example.com/");
        let now = datetime!(2030-01-01 00:00:00 UTC);

        let c = parse_set_cookie("a=1; Max-Age=60; Expires=Wed, 21 Oct 2015 07:28:00 GMT", &u, now).unwrap();
        assert_eq!(c.expires, Some(now + Duration::seconds(60)));

        let c = parse_set_cookie("a=1; Max-Age=0", &u, now).unwrap();
        assert!(c.is_expired_at(now));
    }

    #[test]
    fn rejects_malformed_and_foreign_domains() {
        let u = url("https://example.com/");
        let now = OffsetDateTime::now_utc();

        assert!(parse_set_cookie("novalue", &u, now).is_none());
        assert!(parse_set_cookie("=1", &u, now).is_none());
        assert!(parse_set_cookie("a=1; Domain=other.org", &u, now).is_none());
        assert!(parse_set_cookie("a=1; Domain=www.example.com", &u, now).is_none());
    }

    #[test]
    fn rejects_top_level_domains() {
        let now = OffsetDateTime::now_utc();

        assert!(parse_set_cookie("sid=1; Domain=com", &url("https://example.com/"), now).is_none());
        assert!(parse_set_cookie("sid=1; Domain=.com", &url("https://www.example.com/"), now).is_none());

        let c = parse_set_cookie("sid=1; Domain=localhost", &url("http://localhost/"), now).unwrap();
        assert!(c.host_only);
        assert_eq!(c.domain, "localhost");

        let tld = Cookie::new("sid", "1", "com").host_only(false);
        assert!(!matches_url(&tld, &url("https://evil.com/"), now));
    }

    #[test]
    fn ip_hosts_only_get_host_only_cookies() {
        let now = OffsetDateTime::now_utc();
        let u = url("http://10.0.0.1/");

        assert!(parse_set_cookie("sid=1; Domain=0.0.1", &u, now).is_none());

        let c = parse_set_cookie("sid=1; Domain=10.0.0.1", &u, now).unwrap();
        assert!(c.host_only);

        let v6 = url("http://[::1]/");
        assert!(parse_set_cookie("sid=1; Domain=1]", &v6, now).is_none());

        let stored = Cookie::new("sid", "1", "0.0.1").host_only(false);
        assert!(!matches_url(&stored, &u, now));
    }

    #[test]
    fn matching_checks_domain_path_secure_and_expiry() {
        let now = OffsetDateTime::now_utc();
        let host_only = Cookie::new("h", "1", "example.com");
        let domain = Cookie::new("d", "1", "example.com").host_only(false).with_path("/api");
        let secure = Cookie::new("s", "1", "example.com").secure(true);
        let expired = Cookie::new("e", "1", "example.com").with_expires(now - Duration::minutes(1));

        assert!(matches_url(&host_only, &url("http://example.com/x"), now));
        assert!(!matches_url(&host_only, &url("http://www.example.com/x"), now));

        assert!(matches_url(&domain, &url("http://www.example.com/api/v1"), now));
        assert!(matches_url(&domain, &url("http://example.com/api"), now));
        assert!(!matches_url(&domain, &url("http://example.com/apix"), now));
        assert!(!matches_url(&domain, &url("http://badexample.com/api"), now));

        assert!(!matches_url(&secure, &url("http://example.com/"), now));
        assert!(matches_url(&secure, &url("https://example.com/"), now));

        assert!(!matches_url(&expired, &url("https://example.com/"), now));
    }

    #[test]
    fn request_header_joins_pairs() {
        let a = Cookie::new("a", "1", "example.com");
        let b = Cookie::new("b", "2", "example.com");
        assert_eq!(request_header([&a, &b]).as_deref(), Some("a=1; b=2"));
        assert_eq!(request_header(std::iter::empty()), None);
    }
}
