//! Cookie storage trait definitions.

use crate::StorageResult;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Expiry and scope applied when a cookie is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieOptions {
    pub max_age: Duration,
    pub path: String,
}

impl CookieOptions {
    pub fn new(max_age: Duration) -> Self {
        Self {
            max_age,
            path: "/".to_string(),
        }
    }
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self::new(Duration::days(crate::DEFAULT_CREDENTIAL_TTL_DAYS))
    }
}

/// A cookie as held by a jar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCookie {
    pub value: String,
    pub path: String,
    /// `None` for cookies received from a request, which carry no expiry.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl StoredCookie {
    pub fn from_options(value: &str, options: &CookieOptions) -> Self {
        Self {
            value: value.to_string(),
            path: options.path.clone(),
            expires_at: Some(Utc::now() + options.max_age),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at
            .map(|expires_at| expires_at <= Utc::now())
            .unwrap_or(false)
    }
}

/// Trait for cookie persistence backends.
///
/// The `*_many` methods must apply to all names as one unit as far as other
/// callers of the same jar can observe. Backends override them to hold a
/// single lock; the defaults only loop.
pub trait CookieStore: Send + Sync {
    /// Read a live (unexpired) cookie value
    fn get(&self, name: &str) -> StorageResult<Option<String>>;

    /// Write a cookie with the given expiry and path
    fn set(&self, name: &str, value: &str, options: &CookieOptions) -> StorageResult<()>;

    /// Remove a cookie, returning whether it existed
    fn destroy(&self, name: &str) -> StorageResult<bool>;

    /// Check if a live cookie exists
    fn has(&self, name: &str) -> StorageResult<bool> {
        Ok(self.get(name)?.is_some())
    }

    fn get_many(&self, names: &[&str]) -> StorageResult<Vec<Option<String>>> {
        names.iter().map(|name| self.get(name)).collect()
    }

    fn set_many(&self, entries: &[(&str, &str)], options: &CookieOptions) -> StorageResult<()> {
        for (name, value) in entries {
            self.set(name, value, options)?;
        }
        Ok(())
    }

    fn destroy_many(&self, names: &[&str]) -> StorageResult<()> {
        for name in names {
            self.destroy(name)?;
        }
        Ok(())
    }
}
