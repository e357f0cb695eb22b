//! One tab's endpoint on the session channel.

use crate::{BroadcastBus, BroadcastError, BroadcastResult, Envelope, SessionMessage};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Channel name every tab of a profile joins.
pub const DEFAULT_CHANNEL: &str = "auth";

/// What a listener hands to its handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inbound {
    /// A message posted by another endpoint.
    Message(SessionMessage),
    /// The receiver fell behind and this many messages were dropped.
    Missed(u64),
}

/// Posts to and listens on one named channel of a bus.
///
/// The receiver is subscribed in [`SessionBroadcaster::open`], so anything
/// posted after `open` returns is buffered until [`listen`](Self::listen)
/// starts draining it.
pub struct SessionBroadcaster {
    bus: Arc<dyn BroadcastBus>,
    channel: String,
    origin: Uuid,
    receiver: Mutex<Option<broadcast::Receiver<Envelope>>>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl SessionBroadcaster {
    pub fn open(bus: Arc<dyn BroadcastBus>, channel: impl Into<String>) -> Self {
        let channel = channel.into();
        let receiver = bus.subscribe(&channel);
        let origin = Uuid::new_v4();
        debug!(channel = %channel, origin = %origin, "Opened session channel");
        Self {
            bus,
            channel,
            origin,
            receiver: Mutex::new(Some(receiver)),
            listener: Mutex::new(None),
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn origin(&self) -> Uuid {
        self.origin
    }

    /// Post a message to every other endpoint on the channel.
    pub fn post(&self, message: SessionMessage) -> usize {
        let envelope = Envelope {
            origin: self.origin,
            payload: message.as_tag().to_string(),
        };
        let reached = self.bus.publish(&self.channel, envelope);
        // Our own receiver counts as one.
        let others = reached.saturating_sub(1);
        debug!(channel = %self.channel, message = %message, others, "Posted session message");
        others
    }

    /// Spawn the listener task. Must be called within a tokio runtime.
    ///
    /// Envelopes from this endpoint and unknown payloads are skipped. The task
    /// ends when the bus is dropped or [`close`](Self::close) is called.
    pub fn listen<F>(&self, handler: F) -> BroadcastResult<()>
    where
        F: Fn(Inbound) + Send + Sync + 'static,
    {
        let mut receiver = self
            .receiver
            .lock()
            .take()
            .ok_or_else(|| BroadcastError::AlreadyListening(self.channel.clone()))?;
        let origin = self.origin;
        let channel = self.channel.clone();

        let handle = tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(envelope) if envelope.origin == origin => continue,
                    Ok(envelope) => match envelope.payload.parse::<SessionMessage>() {
                        Ok(message) => {
                            debug!(channel = %channel, message = %message, "Received session message");
                            handler(Inbound::Message(message));
                        }
                        Err(e) => warn!(channel = %channel, error = %e, "Ignoring session message"),
                    },
                    Err(RecvError::Lagged(missed)) => {
                        warn!(channel = %channel, missed, "Session listener lagged");
                        handler(Inbound::Missed(missed));
                    }
                    Err(RecvError::Closed) => {
                        info!(channel = %channel, "Session channel closed");
                        break;
                    }
                }
            }
        });

        *self.listener.lock() = Some(handle);
        Ok(())
    }

    /// Stop the listener task, if any.
    pub fn close(&self) {
        if let Some(handle) = self.listener.lock().take() {
            handle.abort();
            debug!(channel = %self.channel, "Closed session listener");
        }
    }
}

impl Drop for SessionBroadcaster {
    fn drop(&mut self) {
        self.close();
    }
}
