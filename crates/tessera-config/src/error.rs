//! Errors raised while resolving client configuration.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    /// A setting holds a value the client cannot use
    #[error("Invalid setting {key}: {message}")]
    InvalidSetting { key: String, message: String },

    /// The config file exists but is not a valid config document
    #[error("Malformed config file {}: {source}", path.display())]
    ConfigFile {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Neither `TESSERA_HOME` nor a home directory is available
    #[error("Could not determine the Tessera home directory")]
    NoHomeDir,
}

impl CoreError {
    pub(crate) fn invalid(key: &str, message: impl Into<String>) -> Self {
        CoreError::InvalidSetting {
            key: key.to_string(),
            message: message.into(),
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
