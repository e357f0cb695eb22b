//! Credential persistence for the session layer.
//!
//! This crate provides:
//! - the `CookieStore` capability (get/set/destroy with expiry and path)
//! - three jars: the ambient in-memory jar shared by every tab of a profile,
//!   a per-request jar seeded from an inbound `Cookie` header, and a
//!   file-backed jar for processes that must survive restarts
//! - `CredentialStore`, which keeps the access/refresh token pair consistent
//!   on top of any jar

mod credentials;
mod file;
mod keys;
mod memory;
mod request;
mod traits;

pub use credentials::{CredentialStore, Credentials, DEFAULT_CREDENTIAL_TTL_DAYS};
pub use file::FileCookieJar;
pub use keys::CookieNames;
pub use memory::MemoryCookieJar;
pub use request::RequestCookieJar;
pub use traits::{CookieOptions, CookieStore, StoredCookie};

use thiserror::Error;

/// Error type for cookie storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Backend-specific failure
    #[error("Cookie backend error: {0}")]
    Backend(String),

    /// Cookie name or value cannot be represented
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
