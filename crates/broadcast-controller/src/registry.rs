//! Connection registry.
//!
//! Tracks each live transport connection by an opaque [`ConnectionId`] and
//! owns the outbound side of its event channel. The registry has no business
//! semantics: room-affecting cleanup on disconnect is the lifecycle
//! controller's job.
//!
//! Delivery through [`ConnectionRegistry::send`] is best-effort. A send to an
//! unregistered id, or to a connection whose channel has closed underneath
//! us, reports `false` and nothing else; no delivery guarantee is promised
//! anywhere in the protocol.

use crate::protocol::ServerEvent;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tokio::sync::{mpsc, RwLock};
use tracing::debug;
use uuid::Uuid;

/// Buffer size for each connection's outbound event channel.
pub const CONNECTION_CHANNEL_BUFFER: usize = 200;

/// Opaque identifier for one transport connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Generate a fresh connection id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Registry of live connections and their outbound event channels.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: RwLock<HashMap<ConnectionId, mpsc::Sender<ServerEvent>>>,
}

impl ConnectionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new connection on transport link-up.
    ///
    /// `sender` is the outbound half of the connection's event channel; the
    /// transport task drains the other half into the socket.
    pub async fn register(&self, sender: mpsc::Sender<ServerEvent>) -> ConnectionId {
        let id = ConnectionId::new();
        let count = {
            let mut connections = self.connections.write().await;
            connections.insert(id, sender);
            connections.len()
        };
        metrics::gauge!("bc_connections").increment(1.0);
        debug!(target: "bc.registry", connection_id = %id, total = count, "Connection registered");
        id
    }

    /// Unregister a connection on transport link-down.
    ///
    /// Idempotent: unregistering an id that is already absent is a no-op.
    pub async fn unregister(&self, id: &ConnectionId) {
        let removed = self.connections.write().await.remove(id).is_some();
        if removed {
            metrics::gauge!("bc_connections").decrement(1.0);
            debug!(target: "bc.registry", connection_id = %id, "Connection unregistered");
        }
    }

    /// Check whether a connection is currently registered.
    pub async fn is_registered(&self, id: &ConnectionId) -> bool {
        self.connections.read().await.contains_key(id)
    }

    /// Number of registered connections.
    pub async fn len(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Whether the registry holds no connections.
    pub async fn is_empty(&self) -> bool {
        self.connections.read().await.is_empty()
    }

    /// Send an event to a connection, best-effort.
    ///
    /// Returns `true` if the event was enqueued on the connection's channel.
    /// The sender is cloned out under the lock and the send awaited after it
    /// is released, so a slow consumer never blocks the registry.
    pub async fn send(&self, id: &ConnectionId, event: ServerEvent) -> bool {
        let sender = self.connections.read().await.get(id).cloned();
        match sender {
            Some(tx) => tx.send(event).await.is_ok(),
            None => false,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn event() -> ServerEvent {
        ServerEvent::StreamEnded {
            reason: "test".to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_and_send() {
        let registry = ConnectionRegistry::new();
        let (tx, mut rx) = mpsc::channel(8);
        let id = registry.register(tx).await;

        assert!(registry.is_registered(&id).await);
        assert!(registry.send(&id, event()).await);
        assert_eq!(rx.recv().await, Some(event()));
    }

    #[tokio::test]
    async fn test_send_to_unknown_id_is_dropped() {
        let registry = ConnectionRegistry::new();
        assert!(!registry.send(&ConnectionId::new(), event()).await);
    }

    #[tokio::test]
    async fn test_send_after_receiver_dropped_is_dropped() {
        let registry = ConnectionRegistry::new();
        let (tx, rx) = mpsc::channel(8);
        let id = registry.register(tx).await;
        drop(rx);
        assert!(!registry.send(&id, event()).await);
    }

    #[tokio::test]
    async fn test_unregister_is_idempotent() {
        let registry = ConnectionRegistry::new();
        let (tx, _rx) = mpsc::channel(8);
        let id = registry.register(tx).await;
        assert_eq!(registry.len().await, 1);

        registry.unregister(&id).await;
        assert!(!registry.is_registered(&id).await);
        assert!(registry.is_empty().await);

        // Second unregister for the same id is a silent no-op.
        registry.unregister(&id).await;
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_ids_are_unique() {
        let registry = ConnectionRegistry::new();
        let (tx_a, _rx_a) = mpsc::channel(8);
        let (tx_b, _rx_b) = mpsc::channel(8);
        let a = registry.register(tx_a).await;
        let b = registry.register(tx_b).await;
        assert_ne!(a, b);
        assert_eq!(registry.len().await, 2);
    }
}
