//! Signaling relay.
//!
//! Forwards an opaque negotiation payload from one connection to another,
//! verbatim. The relay never inspects or validates the payload, and it makes
//! no delivery promise: a target that is no longer registered means the
//! message is dropped, not an error to the sender. The protocol trusts that
//! `to` values were learned from prior `new-viewer`/`stream-joined` events.

use crate::protocol::ServerEvent;
use crate::registry::{ConnectionId, ConnectionRegistry};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Fire-and-forget forwarder for opaque signaling payloads.
#[derive(Clone)]
pub struct SignalRelay {
    registry: Arc<ConnectionRegistry>,
}

impl SignalRelay {
    /// Create a relay over the given connection registry.
    #[must_use]
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// Forward `signal` from `from` to `to` if `to` is registered.
    pub async fn relay(&self, from: ConnectionId, to: ConnectionId, signal: Value) {
        let delivered = self
            .registry
            .send(&to, ServerEvent::Signal { from, signal })
            .await;

        if delivered {
            metrics::counter!("bc_signals_relayed_total").increment(1);
        } else {
            metrics::counter!("bc_signals_dropped_total").increment(1);
            debug!(
                target: "bc.relay",
                from = %from,
                to = %to,
                "Signal target not registered, dropping"
            );
        }
    }
}
