//! Cross-tab session notifications.
//!
//! This crate provides:
//! - `SessionMessage`: the two notifications tabs exchange
//! - `BroadcastBus`: an abstract topic-based pub/sub capability
//! - `LocalBus`: an in-process bus backed by tokio broadcast channels
//! - `SessionBroadcaster`: one tab's handle on the named session channel
//!
//! Tabs share nothing but the bus. A tab never receives its own posts.

mod broadcaster;
mod bus;
mod message;

pub use broadcaster::{Inbound, SessionBroadcaster, DEFAULT_CHANNEL};
pub use bus::{BroadcastBus, Envelope, LocalBus};
pub use message::SessionMessage;

use thiserror::Error;

/// Broadcast error type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BroadcastError {
    /// Payload is not one of the known tags
    #[error("Unknown session message: {0}")]
    UnknownMessage(String),

    /// The receiving side of the channel was already taken by a listener
    #[error("Channel {0} already has a listener")]
    AlreadyListening(String),
}

/// Result type alias using BroadcastError.
pub type BroadcastResult<T> = Result<T, BroadcastError>;
