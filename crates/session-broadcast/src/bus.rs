//! Topic-based pub/sub capability and its in-process implementation.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::trace;
use uuid::Uuid;

/// Default per-topic buffer before slow receivers start lagging.
const DEFAULT_CAPACITY: usize = 64;

/// A published payload tagged with the publishing endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub origin: Uuid,
    pub payload: String,
}

/// Pub/sub capability shared by every tab of a profile.
///
/// Implementations deliver each publish to every receiver subscribed to the
/// topic at that moment, in publish order.
pub trait BroadcastBus: Send + Sync {
    /// Publish to a topic. Returns how many receivers it reached.
    fn publish(&self, topic: &str, envelope: Envelope) -> usize;

    fn subscribe(&self, topic: &str) -> broadcast::Receiver<Envelope>;
}

/// In-process bus: one tokio broadcast channel per topic.
#[derive(Clone)]
pub struct LocalBus {
    senders: Arc<RwLock<HashMap<String, broadcast::Sender<Envelope>>>>,
    capacity: usize,
}

impl LocalBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            senders: Arc::new(RwLock::new(HashMap::new())),
            capacity: capacity.max(1),
        }
    }

    /// Number of live receivers on a topic.
    pub fn receiver_count(&self, topic: &str) -> usize {
        self.senders
            .read()
            .get(topic)
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }
}

impl Default for LocalBus {
    fn default() -> Self {
        Self::new()
    }
}

impl BroadcastBus for LocalBus {
    fn publish(&self, topic: &str, envelope: Envelope) -> usize {
        let senders = self.senders.read();
        match senders.get(topic) {
            // Err only means nobody is subscribed.
            Some(sender) => sender.send(envelope).unwrap_or(0),
            None => {
                trace!(topic = %topic, "Publish to topic with no subscribers");
                0
            }
        }
    }

    fn subscribe(&self, topic: &str) -> broadcast::Receiver<Envelope> {
        let mut senders = self.senders.write();
        let capacity = self.capacity;
        senders
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(capacity).0)
            .subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(payload: &str) -> Envelope {
        Envelope {
            origin: Uuid::new_v4(),
            payload: payload.to_string(),
        }
    }

    #[tokio::test]
    async fn test_publish_reaches_every_subscriber() {
        let bus = LocalBus::new();
        let mut first = bus.subscribe("auth");
        let mut second = bus.subscribe("auth");

        assert_eq!(bus.publish("auth", envelope("signOut")), 2);
        assert_eq!(first.recv().await.unwrap().payload, "signOut");
        assert_eq!(second.recv().await.unwrap().payload, "signOut");
    }

    #[tokio::test]
    async fn test_topics_are_isolated() {
        let bus = LocalBus::new();
        let mut auth = bus.subscribe("auth");
        let _other = bus.subscribe("other");

        bus.publish("other", envelope("signOut"));
        bus.publish("auth", envelope("signIn"));
        assert_eq!(auth.recv().await.unwrap().payload, "signIn");
    }

    #[test]
    fn test_publish_without_subscribers() {
        let bus = LocalBus::new();
        assert_eq!(bus.publish("auth", envelope("signOut")), 0);
        assert_eq!(bus.receiver_count("auth"), 0);
    }
}
