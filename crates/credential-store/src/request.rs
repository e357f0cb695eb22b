//! Cookie jar scoped to one inbound server-rendered request.
//!
//! Seeded from the request's `Cookie` header. Writes are visible to later
//! reads within the same request and are also recorded as `Set-Cookie`
//! header values so the response can carry them back to the browser.

use crate::{CookieOptions, CookieStore, StorageError, StorageResult, StoredCookie};
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::debug;

#[derive(Default)]
struct RequestCookies {
    cookies: HashMap<String, StoredCookie>,
    /// Pending `Set-Cookie` values in write order, one per cookie name.
    outgoing: Vec<(String, String)>,
}

impl RequestCookies {
    fn record(&mut self, name: &str, header: String) {
        self.outgoing.retain(|(existing, _)| existing != name);
        self.outgoing.push((name.to_string(), header));
    }
}

#[derive(Default)]
pub struct RequestCookieJar {
    inner: Mutex<RequestCookies>,
}

impl RequestCookieJar {
    /// Build a jar from a raw `Cookie` header (`a=1; b=2`).
    ///
    /// Malformed pairs are skipped. The first occurrence of a name wins, as
    /// browsers send the most specific path first.
    pub fn from_cookie_header(header: &str) -> Self {
        let mut cookies = HashMap::new();
        for pair in header.split(';') {
            let Some((name, value)) = pair.trim().split_once('=') else {
                continue;
            };
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            cookies.entry(name.to_string()).or_insert_with(|| StoredCookie {
                value: value.trim().trim_matches('"').to_string(),
                path: "/".to_string(),
                expires_at: None,
            });
        }

        debug!(count = cookies.len(), "Parsed request cookies");

        Self {
            inner: Mutex::new(RequestCookies {
                cookies,
                outgoing: Vec::new(),
            }),
        }
    }

    /// `Set-Cookie` header values produced by writes during this request.
    pub fn set_cookie_headers(&self) -> Vec<String> {
        self.inner
            .lock()
            .outgoing
            .iter()
            .map(|(_, header)| header.clone())
            .collect()
    }

    fn validate(name: &str, value: &str) -> StorageResult<()> {
        let invalid = |c: char| c == ';' || c == ',' || c.is_whitespace();
        if name.is_empty() || name.contains('=') || name.contains(invalid) {
            return Err(StorageError::Encoding(format!("invalid cookie name: {name:?}")));
        }
        if value.contains(invalid) {
            return Err(StorageError::Encoding(format!(
                "cookie {name} has a value that cannot be sent in a header"
            )));
        }
        Ok(())
    }

    fn set_header(name: &str, value: &str, options: &CookieOptions) -> String {
        format!(
            "{}={}; Max-Age={}; Path={}",
            name,
            value,
            options.max_age.num_seconds().max(0),
            options.path
        )
    }

    fn clear_header(name: &str) -> String {
        format!("{}=; Max-Age=0; Path=/", name)
    }

    fn write(inner: &mut RequestCookies, name: &str, value: &str, options: &CookieOptions) {
        let cookie = StoredCookie::from_options(value, options);
        if cookie.is_expired() {
            inner.cookies.remove(name);
        } else {
            inner.cookies.insert(name.to_string(), cookie);
        }
        inner.record(name, Self::set_header(name, value, options));
    }
}

impl CookieStore for RequestCookieJar {
    fn get(&self, name: &str) -> StorageResult<Option<String>> {
        let inner = self.inner.lock();
        Ok(inner
            .cookies
            .get(name)
            .filter(|cookie| !cookie.is_expired())
            .map(|cookie| cookie.value.clone()))
    }

    fn set(&self, name: &str, value: &str, options: &CookieOptions) -> StorageResult<()> {
        Self::validate(name, value)?;
        let mut inner = self.inner.lock();
        Self::write(&mut inner, name, value, options);
        Ok(())
    }

    fn destroy(&self, name: &str) -> StorageResult<bool> {
        let mut inner = self.inner.lock();
        let existed = inner.cookies.remove(name).is_some();
        inner.record(name, Self::clear_header(name));
        Ok(existed)
    }

    fn set_many(&self, entries: &[(&str, &str)], options: &CookieOptions) -> StorageResult<()> {
        for (name, value) in entries {
            Self::validate(name, value)?;
        }
        let mut inner = self.inner.lock();
        for (name, value) in entries {
            Self::write(&mut inner, name, value, options);
        }
        Ok(())
    }

    fn destroy_many(&self, names: &[&str]) -> StorageResult<()> {
        let mut inner = self.inner.lock();
        for name in names {
            inner.cookies.remove(*name);
            inner.record(name, Self::clear_header(name));
        }
        Ok(())
    }
}
