//! High-level API for the session credential pair.

use crate::{CookieNames, CookieOptions, CookieStore, StorageResult};
use chrono::Duration;
use std::sync::Arc;
use tracing::debug;

/// Default lifetime of both tokens, in days.
pub const DEFAULT_CREDENTIAL_TTL_DAYS: i64 = 30;

/// The persisted token pair. Either half may be absent.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Reads and writes the access/refresh pair as one unit.
///
/// Both cookies are written and removed through the jar's `*_many` calls, so
/// no reader of the same jar observes one token without the other.
#[derive(Clone)]
pub struct CredentialStore {
    jar: Arc<dyn CookieStore>,
    ttl: Duration,
}

impl CredentialStore {
    pub fn new(jar: Arc<dyn CookieStore>) -> Self {
        Self::with_ttl(jar, Duration::days(DEFAULT_CREDENTIAL_TTL_DAYS))
    }

    pub fn with_ttl(jar: Arc<dyn CookieStore>, ttl: Duration) -> Self {
        Self { jar, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get(&self) -> StorageResult<Credentials> {
        let mut values = self.jar.get_many(&CookieNames::ALL)?.into_iter();
        Ok(Credentials {
            access_token: values.next().flatten(),
            refresh_token: values.next().flatten(),
        })
    }

    pub fn access_token(&self) -> StorageResult<Option<String>> {
        self.jar.get(CookieNames::ACCESS_TOKEN)
    }

    pub fn refresh_token(&self) -> StorageResult<Option<String>> {
        self.jar.get(CookieNames::REFRESH_TOKEN)
    }

    /// Persist a new pair with the store's default TTL.
    pub fn set(&self, access_token: &str, refresh_token: &str) -> StorageResult<()> {
        self.set_with_ttl(access_token, refresh_token, self.ttl)
    }

    pub fn set_with_ttl(
        &self,
        access_token: &str,
        refresh_token: &str,
        ttl: Duration,
    ) -> StorageResult<()> {
        self.jar.set_many(
            &[
                (CookieNames::ACCESS_TOKEN, access_token),
                (CookieNames::REFRESH_TOKEN, refresh_token),
            ],
            &CookieOptions::new(ttl),
        )?;
        debug!(ttl_days = ttl.num_days(), "Stored credential pair");
        Ok(())
    }

    /// Remove both tokens.
    pub fn clear(&self) -> StorageResult<()> {
        self.jar.destroy_many(&CookieNames::ALL)?;
        debug!("Cleared credential pair");
        Ok(())
    }

    pub fn has_access_token(&self) -> StorageResult<bool> {
        self.jar.has(CookieNames::ACCESS_TOKEN)
    }
}
