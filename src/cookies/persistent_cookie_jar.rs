//! A cookie jar that keeps a durable store in sync with every mutation.
//!
//! [`PersistentCookieStore`] composes a [`MemoryCookieJar`] with a
//! [`DurableStore`](crate::cookies::DurableStore). The memory jar answers all
//! reads; the durable store only exists so the jar can be rebuilt after a
//! restart.
//!
//! ## Loading
//! Construction drains the durable store: every record is read, the store is
//! cleared, and the records that still decode to a live cookie are written back
//! (one record per identity). Unreadable records are logged and dropped, expired
//! cookies are dropped without being re-persisted.
//!
//! ## Consistency policy
//! Mutations are durable-first. [`add`](PersistentCookieStore::add) rewrites the
//! durable store before touching memory and
//! [`remove_all`](PersistentCookieStore::remove_all) clears it before clearing
//! memory. When the durable store fails the call returns
//! [`CookieError::StorageFailure`] and memory keeps its previous state. The
//! durable store itself may be left partially written by a backend without an
//! atomic `replace_all`; the next successful mutation rewrites it completely.
//!
//! ## Concurrency
//! One mutex guards the memory jar and is held across the durable calls, so
//! concurrent `add`/`remove_all` calls cannot interleave their memory and durable
//! steps.
use std::sync::{Mutex, MutexGuard, PoisonError};

use time::OffsetDateTime;
use url::Url;

use crate::cookies::codec::{decode_cookie, encode_cookie};
use crate::cookies::cookie_jar::MemoryCookieJar;
use crate::cookies::header::request_header;
use crate::cookies::store::DurableStoreHandle;
use crate::cookies::{Cookie, CookieKey};
use crate::errors::CookieError;

/// In-memory cookie jar mirrored to a durable store.
pub struct PersistentCookieStore {
    /// Live cookies. Also serializes the memory + durable mutation sequence.
    jar: Mutex<MemoryCookieJar>,
    /// Backend the jar is mirrored to.
    durable: DurableStoreHandle,
}

impl PersistentCookieStore {
    /// Loads the cookies held by `durable` and returns a store ready for use.
    ///
    /// Corrupt records and expired cookies are skipped; only a failing durable
    /// store aborts the load.
    pub fn new(durable: DurableStoreHandle) -> Result<Self, CookieError> {
        let records = durable.list_all().map_err(CookieError::StorageFailure)?;
        durable.clear().map_err(CookieError::StorageFailure)?;

        let now = OffsetDateTime::now_utc();
        let mut jar = MemoryCookieJar::new();
        let mut dropped = 0usize;

        for record in &records {
            let cookie = match decode_cookie(record) {
                Ok(cookie) => cookie,
                Err(e) => {
                    log::warn!("Dropping unreadable cookie record: {e}");
                    dropped += 1;
                    continue;
                }
            };

            if let Err(e) = validate(&cookie) {
                log::warn!("Dropping invalid cookie record: {e}");
                dropped += 1;
                continue;
            }

            if cookie.is_expired_at(now) {
                log::debug!("Dropping expired cookie {} for {}{}", cookie.name, cookie.domain, cookie.path);
                dropped += 1;
                continue;
            }

            jar.add(cookie);
        }

        for cookie in &jar {
            durable
                .append(&encode(cookie)?)
                .map_err(CookieError::StorageFailure)?;
        }

        log::debug!(
            "Loaded {} cookies from {} records ({} dropped)",
            jar.len(),
            records.len(),
            dropped
        );

        Ok(Self {
            jar: Mutex::new(jar),
            durable,
        })
    }

    fn lock(&self) -> MutexGuard<'_, MemoryCookieJar> {
        self.jar.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds `cookie`, replacing any cookie with the same `(name, domain, path)`.
    ///
    /// An expired cookie removes the existing entry from memory and is not
    /// persisted. Its previous durable record stays until the next rewrite or
    /// until a load skips it.
    ///
    /// # Errors
    /// - [`CookieError::InvalidArgument`] if the cookie has an empty name or domain,
    ///   or a field too long to encode.
    /// - [`CookieError::StorageFailure`] if the durable store cannot be rewritten;
    ///   memory is unchanged in that case.
    pub fn add(&self, cookie: Cookie) -> Result<(), CookieError> {
        validate(&cookie)?;

        let mut jar = self.lock();

        if cookie.is_expired() {
            if jar.remove(&cookie).is_some() {
                log::debug!("Expired cookie {} removed from {}{}", cookie.name, cookie.domain, cookie.path);
            }
            return Ok(());
        }

        let records: Vec<String> = jar
            .iter()
            .filter(|existing| !existing.same_identity(&cookie))
            .chain(std::iter::once(&cookie))
            .map(encode)
            .collect::<Result<_, _>>()?;
        self.durable
            .replace_all(&records)
            .map_err(CookieError::StorageFailure)?;

        jar.add(cookie);
        Ok(())
    }

    /// Removes every cookie from memory and from the durable store.
    ///
    /// Returns `Ok(false)` without touching the durable store if the jar was
    /// already empty.
    pub fn remove_all(&self) -> Result<bool, CookieError> {
        let mut jar = self.lock();
        if jar.is_empty() {
            return Ok(false);
        }

        self.durable.clear().map_err(CookieError::StorageFailure)?;
        jar.remove_all();
        Ok(true)
    }

    /// Returns a snapshot of all cookies, in no particular order.
    pub fn cookies(&self) -> Vec<Cookie> {
        self.lock().cookies()
    }

    pub fn get(&self, key: &CookieKey) -> Option<Cookie> {
        self.lock().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Returns the live cookies that apply to a request for `url`.
    pub fn cookies_for(&self, url: &Url) -> Vec<Cookie> {
        let now = OffsetDateTime::now_utc();
        self.lock().matching(url, now).into_iter().cloned().collect()
    }

    /// Returns the `Cookie` request header value for `url`, if any cookie applies.
    pub fn request_header(&self, url: &Url) -> Option<String> {
        let now = OffsetDateTime::now_utc();
        request_header(self.lock().matching(url, now))
    }
}

fn encode(cookie: &Cookie) -> Result<String, CookieError> {
    encode_cookie(cookie).map_err(|e| CookieError::InvalidArgument(format!("cookie {}: {e}", cookie.name)))
}

fn validate(cookie: &Cookie) -> Result<(), CookieError> {
    if cookie.name.is_empty() {
        return Err(CookieError::InvalidArgument("cookie name is empty".into()));
    }
    if cookie.domain.is_empty() {
        return Err(CookieError::InvalidArgument(format!(
            "cookie {} has no domain",
            cookie.name
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cookies::codec::tests::arb_cookie;
    use crate::cookies::store::{DurableStore, InMemoryDurableStore};
    use proptest::prelude::*;
    use crate::cookies::SameSite;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use time::Duration;

    fn in_an_hour() -> OffsetDateTime {
        OffsetDateTime::now_utc() + Duration::hours(1)
    }

    fn an_hour_ago() -> OffsetDateTime {
        OffsetDateTime::now_utc() - Duration::hours(1)
    }

    fn sorted(mut cookies: Vec<Cookie>) -> Vec<Cookie> {
        cookies.sort_by_key(Cookie::key);
        cookies
    }

    fn decoded(durable: &InMemoryDurableStore) -> Vec<Cookie> {
        sorted(
            durable
                .list_all()
                .unwrap()
                .iter()
                .map(|r| decode_cookie(r).unwrap())
                .collect(),
        )
    }

    /// Durable store that can be told to fail every call.
    #[derive(Default)]
    struct FlakyStore {
        inner: InMemoryDurableStore,
        failing: AtomicBool,
    }

    impl FlakyStore {
        fn set_failing(&self, on: bool) {
            self.failing.store(on, Ordering::SeqCst);
        }

        fn check(&self) -> anyhow::Result<()> {
            if self.failing.load(Ordering::SeqCst) {
                anyhow::bail!("disk full");
            }
            Ok(())
        }
    }

    impl DurableStore for FlakyStore {
        fn append(&self, record: &str) -> anyhow::Result<()> {
            self.check()?;
            self.inner.append(record)
        }

        fn list_all(&self) -> anyhow::Result<Vec<String>> {
            self.check()?;
            self.inner.list_all()
        }

        fn clear(&self) -> anyhow::Result<()> {
            self.check()?;
            self.inner.clear()
        }
    }

    #[test]
    fn load_keeps_live_and_drops_expired() {
        let a = Cookie::new("a", "1", "example.com").with_expires(in_an_hour());
        let b = Cookie::new("b", "2", "example.com").with_expires(an_hour_ago());
        let durable = Arc::new(InMemoryDurableStore::with_records([encode_cookie(&a).unwrap(), encode_cookie(&b).unwrap()]));

        let store = PersistentCookieStore::new(durable.clone()).unwrap();

        assert_eq!(store.cookies(), vec![a.clone()]);
        assert_eq!(durable.list_all().unwrap(), vec![encode_cookie(&a).unwrap()]);
    }

    #[test]
    fn load_of_only_expired_records_is_empty() {
        let b = Cookie::new("b", "2", "example.com").with_expires(an_hour_ago());
        let durable = Arc::new(InMemoryDurableStore::with_records([encode_cookie(&b).unwrap()]));

        let store = PersistentCookieStore::new(durable.clone()).unwrap();
        assert!(store.is_empty());
        assert!(durable.is_empty());
    }

    #[test]
    fn load_skips_corrupt_records() {
        let a = Cookie::new("a", "1", "example.com");
        let good = encode_cookie(&a).unwrap();
        let truncated = good[..good.len() - 3].to_string();
        let durable = Arc::new(InMemoryDurableStore::with_records([
            truncated,
            "NOT HEX".to_string(),
            "02".to_string(),
            good.clone(),
        ]));

        let store = PersistentCookieStore::new(durable.clone()).unwrap();
        assert_eq!(store.cookies(), vec![a]);
        assert_eq!(durable.list_all().unwrap(), vec![good]);
    }

    #[test]
    fn load_collapses_duplicate_identities() {
        let first = Cookie::new("a", "1", "example.com");
        let second = Cookie::new("a", "2", "example.com");
        let durable = Arc::new(InMemoryDurableStore::with_records([encode_cookie(&first).unwrap(), encode_cookie(&second).unwrap()]));

        let store = PersistentCookieStore::new(durable.clone()).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(durable.len(), 1);
    }

    #[test]
    fn load_is_idempotent() {
        let records = [
            encode_cookie(&Cookie::new("a", "1", "example.com").with_expires(in_an_hour())).unwrap(),
            encode_cookie(&Cookie::new("b", "2", "example.org").with_path("/x").secure(true)).unwrap(),
            encode_cookie(&Cookie::new("c", "3", "example.net").with_same_site(SameSite::Strict)).unwrap(),
        ];

        let first = PersistentCookieStore::new(Arc::new(InMemoryDurableStore::with_records(records.clone()))).unwrap();
        let second = PersistentCookieStore::new(Arc::new(InMemoryDurableStore::with_records(records))).unwrap();
        assert_eq!(sorted(first.cookies()), sorted(second.cookies()));
        assert_eq!(first.len(), 3);

        // reloading what a store wrote back yields the same set again
        let durable = Arc::new(InMemoryDurableStore::new());
        let store = PersistentCookieStore::new(durable.clone()).unwrap();
        for c in first.cookies() {
            store.add(c).unwrap();
        }
        let reloaded = PersistentCookieStore::new(durable).unwrap();
        assert_eq!(sorted(reloaded.cookies()), sorted(first.cookies()));
    }

    fn sorted_records(durable: &InMemoryDurableStore) -> Vec<String> {
        let mut records = durable.list_all().unwrap();
        records.sort();
        records
    }

    proptest! {
        #[test]
        fn loading_twice_yields_the_same_store(
            records in proptest::collection::vec(
                prop_oneof![
                    arb_cookie().prop_map(|c| encode_cookie(&c).unwrap()),
                    any::<String>(),
                ],
                0..12,
            )
        ) {
            let durable = Arc::new(InMemoryDurableStore::with_records(records));

            let first = PersistentCookieStore::new(durable.clone()).unwrap();
            let written = sorted_records(&durable);
            let second = PersistentCookieStore::new(durable.clone()).unwrap();

            prop_assert_eq!(sorted(first.cookies()), sorted(second.cookies()));
            prop_assert_eq!(written, sorted_records(&durable));
            prop_assert_eq!(durable.len(), second.len());
        }
    }

    #[test]
    fn add_replaces_same_identity_in_memory_and_durable() {
        let durable = Arc::new(InMemoryDurableStore::new());
        let store = PersistentCookieStore::new(durable.clone()).unwrap();

        let a = Cookie::new("a", "1", "example.com").with_expires(in_an_hour());
        let a2 = Cookie::new("a", "2", "example.com").with_expires(in_an_hour()).http_only(true);
        let other = Cookie::new("b", "1", "example.com");

        store.add(a.clone()).unwrap();
        store.add(other.clone()).unwrap();
        store.add(a2.clone()).unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.get(&a.key()), Some(a2.clone()));
        assert_eq!(decoded(&durable), sorted(vec![a2, other]));
    }

    #[test]
    fn adding_expired_cookie_deletes_from_memory_only() {
        let durable = Arc::new(InMemoryDurableStore::new());
        let store = PersistentCookieStore::new(durable.clone()).unwrap();

        let a = Cookie::new("a", "1", "example.com");
        store.add(a.clone()).unwrap();

        let expired = Cookie::new("a", "1", "example.com").with_expires(an_hour_ago());
        store.add(expired).unwrap();

        assert!(store.is_empty());
        // the durable record of the old cookie is left in place
        assert_eq!(decoded(&durable), vec![a]);
    }

    #[test]
    fn expired_cookie_is_never_persisted() {
        let durable = Arc::new(InMemoryDurableStore::new());
        let store = PersistentCookieStore::new(durable.clone()).unwrap();

        store
            .add(Cookie::new("a", "1", "example.com").with_expires(an_hour_ago()))
            .unwrap();
        assert!(store.is_empty());
        assert!(durable.is_empty());
    }

    #[test]
    fn add_rejects_invalid_cookies() {
        let durable = Arc::new(InMemoryDurableStore::new());
        let store = PersistentCookieStore::new(durable.clone()).unwrap();

        let err = store.add(Cookie::new("", "1", "example.com")).unwrap_err();
        assert!(matches!(err, CookieError::InvalidArgument(_)));
        let err = store.add(Cookie::new("a", "1", "")).unwrap_err();
        assert!(matches!(err, CookieError::InvalidArgument(_)));

        assert!(store.is_empty());
        assert!(durable.is_empty());
    }

    #[test]
    fn remove_all_clears_both_sides_once() {
        let durable = Arc::new(InMemoryDurableStore::new());
        let store = PersistentCookieStore::new(durable.clone()).unwrap();
        store.add(Cookie::new("a", "1", "example.com")).unwrap();
        store.add(Cookie::new("b", "1", "example.com")).unwrap();

        assert!(store.remove_all().unwrap());
        assert!(store.is_empty());
        assert!(durable.is_empty());

        assert!(!store.remove_all().unwrap());
    }

    #[test]
    fn failed_add_leaves_memory_untouched() {
        let durable = Arc::new(FlakyStore::default());
        let store = PersistentCookieStore::new(durable.clone()).unwrap();

        let a = Cookie::new("a", "1", "example.com");
        store.add(a.clone()).unwrap();

        durable.set_failing(true);
        let err = store.add(Cookie::new("a", "2", "example.com")).unwrap_err();
        assert!(matches!(err, CookieError::StorageFailure(_)));
        let err = store.add(Cookie::new("b", "1", "example.com")).unwrap_err();
        assert!(matches!(err, CookieError::StorageFailure(_)));

        assert_eq!(store.cookies(), vec![a.clone()]);

        durable.set_failing(false);
        store.add(Cookie::new("b", "1", "example.com")).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(durable.inner.len(), 2);
    }

    #[test]
    fn failed_remove_all_leaves_memory_untouched() {
        let durable = Arc::new(FlakyStore::default());
        let store = PersistentCookieStore::new(durable.clone()).unwrap();
        store.add(Cookie::new("a", "1", "example.com")).unwrap();

        durable.set_failing(true);
        assert!(matches!(store.remove_all(), Err(CookieError::StorageFailure(_))));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn failing_backend_aborts_load() {
        let durable = Arc::new(FlakyStore::default());
        durable.set_failing(true);
        assert!(matches!(
            PersistentCookieStore::new(durable),
            Err(CookieError::StorageFailure(_))
        ));
    }

    #[test]
    fn request_header_uses_matching_cookies() {
        let store = PersistentCookieStore::new(Arc::new(InMemoryDurableStore::new())).unwrap();
        store.add(Cookie::new("a", "1", "example.com")).unwrap();
        store.add(Cookie::new("s", "2", "example.com").secure(true)).unwrap();
        store.add(Cookie::new("o", "3", "other.com")).unwrap();

        let http = Url::parse("http://example.com/").unwrap();
        let https = Url::parse("https://example.com/").unwrap();

        assert_eq!(store.request_header(&http).as_deref(), Some("a=1"));
        assert_eq!(store.cookies_for(&https).len(), 2);
        assert_eq!(store.request_header(&Url::parse("http://nowhere.org/").unwrap()), None);
    }

    #[test]
    fn concurrent_adds_keep_memory_and_durable_in_step() {
        let durable = Arc::new(InMemoryDurableStore::new());
        let store = Arc::new(PersistentCookieStore::new(durable.clone()).unwrap());

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for i in 0..25 {
                        store
                            .add(Cookie::new(format!("c{t}-{i}"), "v", "example.com"))
                            .unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(store.len(), 200);
        assert_eq!(decoded(&durable), sorted(store.cookies()));
    }
}
