//! Client and session error types.

use credential_store::StorageError;
use session_broadcast::BroadcastError;
use thiserror::Error;

/// Why a token refresh failed.
///
/// Cloned to every request that was waiting on the refresh.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RefreshError {
    /// No refresh token in the credential store
    #[error("No refresh token stored")]
    MissingRefreshToken,

    /// Backend answered the refresh call with a non-2xx status
    #[error("Refresh rejected with status {status}")]
    Rejected { status: u16 },

    /// The refresh call never produced a response
    #[error("Refresh transport failure: {0}")]
    Transport(String),

    /// Refresh response body could not be read
    #[error("Malformed refresh response: {0}")]
    Malformed(String),

    /// New credentials could not be persisted
    #[error("Could not persist refreshed credentials: {0}")]
    Storage(String),

    /// The refresh task went away without settling the queue
    #[error("Refresh abandoned")]
    Abandoned,
}

/// Error type for requests made through the authenticated client.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Non-2xx response other than a handled 401
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Network-level failure, no response received
    #[error("Transport error: {0}")]
    Transport(String),

    /// Request timed out in the transport
    #[error("Request timed out")]
    Timeout,

    /// Server context only: the credential is no longer usable
    #[error("Credential invalid")]
    CredentialInvalid,

    /// Browser context only: the credential was rejected and the session was signed out
    #[error("Session ended")]
    SessionEnded,

    /// Browser context only: the refresh this request waited on failed
    #[error("Token refresh failed: {0}")]
    Refresh(#[from] RefreshError),

    /// Credential storage error
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parse error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ClientError {
    /// Returns true if this error is transient and the request can be retried.
    pub fn is_transient(&self) -> bool {
        match self {
            ClientError::Transport(_) | ClientError::Timeout => true,
            ClientError::Http { status, .. } => (500..600).contains(status),
            ClientError::Refresh(RefreshError::Transport(_)) => true,
            _ => false,
        }
    }

    /// Returns true if the credential itself was rejected.
    pub fn is_credential_invalid(&self) -> bool {
        matches!(
            self,
            ClientError::CredentialInvalid | ClientError::SessionEnded
        )
    }

    /// HTTP status, when a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ClientError::Timeout
        } else {
            ClientError::Transport(e.to_string())
        }
    }
}

/// Result type alias using ClientError.
pub type ClientResult<T> = Result<T, ClientError>;

/// Error type for session lifecycle operations.
#[derive(Error, Debug)]
pub enum SessionError {
    /// Backend or transport failure
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Credential storage error
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Broadcast channel error
    #[error("Broadcast error: {0}")]
    Broadcast(#[from] BroadcastError),

    /// Invalid state transition in the session FSM
    #[error("Invalid session state transition: {0}")]
    InvalidStateTransition(String),
}

/// Result type alias using SessionError.
pub type SessionResult<T> = Result<T, SessionError>;
