//! In-memory cookie jar.
//!
//! One jar stands for one browser profile: every tab of the profile holds a
//! clone and sees the same cookies.

use crate::{CookieOptions, CookieStore, StorageResult, StoredCookie};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::trace;

#[derive(Clone, Default)]
pub struct MemoryCookieJar {
    cookies: Arc<Mutex<HashMap<String, StoredCookie>>>,
}

impl MemoryCookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw view of a cookie including expiry, expired or not.
    pub fn peek(&self, name: &str) -> Option<StoredCookie> {
        self.cookies.lock().get(name).cloned()
    }

    fn live_value(cookies: &mut HashMap<String, StoredCookie>, name: &str) -> Option<String> {
        if cookies.get(name)?.is_expired() {
            trace!(cookie = %name, "Dropping expired cookie");
            cookies.remove(name);
            return None;
        }
        cookies.get(name).map(|cookie| cookie.value.clone())
    }
}

impl CookieStore for MemoryCookieJar {
    fn get(&self, name: &str) -> StorageResult<Option<String>> {
        let mut cookies = self.cookies.lock();
        Ok(Self::live_value(&mut cookies, name))
    }

    fn set(&self, name: &str, value: &str, options: &CookieOptions) -> StorageResult<()> {
        self.cookies
            .lock()
            .insert(name.to_string(), StoredCookie::from_options(value, options));
        Ok(())
    }

    fn destroy(&self, name: &str) -> StorageResult<bool> {
        Ok(self.cookies.lock().remove(name).is_some())
    }

    fn get_many(&self, names: &[&str]) -> StorageResult<Vec<Option<String>>> {
        let mut cookies = self.cookies.lock();
        Ok(names
            .iter()
            .map(|name| Self::live_value(&mut cookies, name))
            .collect())
    }

    fn set_many(&self, entries: &[(&str, &str)], options: &CookieOptions) -> StorageResult<()> {
        let mut cookies = self.cookies.lock();
        for (name, value) in entries {
            cookies.insert(name.to_string(), StoredCookie::from_options(value, options));
        }
        Ok(())
    }

    fn destroy_many(&self, names: &[&str]) -> StorageResult<()> {
        let mut cookies = self.cookies.lock();
        for name in names {
            cookies.remove(*name);
        }
        Ok(())
    }
}
