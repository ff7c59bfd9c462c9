//! Shared server state: one [`Channel`] per path-scoped endpoint.

use std::sync::Arc;

use tether_protocol::Envelope;
use tokio::sync::broadcast;

use crate::registry::ClientRegistry;

/// One logical endpoint: a registry of its clients and a broadcast stream
/// of their inbound events for server-side consumers (terminal reporters,
/// inspector UIs).
pub struct Channel {
    pub name: &'static str,
    pub registry: ClientRegistry,
    inbound_tx: broadcast::Sender<Envelope>,
}

impl Channel {
    pub fn new(name: &'static str) -> Self {
        let (inbound_tx, _) = broadcast::channel(256);
        Self {
            name,
            registry: ClientRegistry::new(),
            inbound_tx,
        }
    }

    /// Subscribe to every envelope received on this channel.
    pub fn subscribe(&self) -> broadcast::Receiver<Envelope> {
        self.inbound_tx.subscribe()
    }

    pub(crate) fn publish(&self, envelope: Envelope) {
        // No subscribers is fine.
        let _ = self.inbound_tx.send(envelope);
    }
}

#[derive(Clone)]
pub struct AppState {
    /// The server's own instance id, stamped on handshake envelopes.
    pub instance_id: Arc<String>,
    pub debugger: Arc<Channel>,
    pub device: Arc<Channel>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            instance_id: Arc::new(uuid::Uuid::new_v4().to_string()),
            debugger: Arc::new(Channel::new("debugger")),
            device: Arc::new(Channel::new("device")),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
