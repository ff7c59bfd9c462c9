//! In-memory registry of connected transport clients.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use tether_protocol::Envelope;
use tokio::sync::mpsc;

/// An envelope the server can push to a connected client's writer task.
pub type ClientSink = mpsc::Sender<Envelope>;

/// One connected client.
pub struct ConnectedClient {
    /// Server-issued session identifier.
    pub client_id: String,
    /// The client's own instance identifier, learned from its first
    /// envelope; empty until then.
    pub instance_id: String,
    pub connected_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    /// Channel to the client's WS writer task.
    pub sink: ClientSink,
}

/// Summary info returned by list endpoints and diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct ClientInfo {
    pub client_id: String,
    pub instance_id: String,
    pub connected_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

/// Thread-safe registry of all clients on one path-scoped channel.
#[derive(Default)]
pub struct ClientRegistry {
    clients: RwLock<HashMap<String, ConnectedClient>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new client connection. `client_id` is per-connection
    /// unique, so a reconnecting device simply appears under its new id.
    pub fn register(&self, client: ConnectedClient) {
        let id = client.client_id.clone();
        tracing::info!(client_id = %id, "client registered");
        self.clients.write().insert(id, client);
    }

    /// Remove a client (on disconnect).
    pub fn remove(&self, client_id: &str) {
        if self.clients.write().remove(client_id).is_some() {
            tracing::info!(client_id = %client_id, "client removed");
        }
    }

    /// Refresh `last_seen` and record the instance id from an inbound
    /// envelope.
    pub fn touch(&self, client_id: &str, instance_id: &str) {
        if let Some(client) = self.clients.write().get_mut(client_id) {
            client.last_seen = Utc::now();
            if client.instance_id.is_empty() && !instance_id.is_empty() {
                client.instance_id = instance_id.to_string();
            }
        }
    }

    /// Sink for pushing envelopes to a specific client.
    pub fn get_sink(&self, client_id: &str) -> Option<ClientSink> {
        self.clients.read().get(client_id).map(|c| c.sink.clone())
    }

    pub fn list(&self) -> Vec<ClientInfo> {
        self.clients
            .read()
            .values()
            .map(|c| ClientInfo {
                client_id: c.client_id.clone(),
                instance_id: c.instance_id.clone(),
                connected_at: c.connected_at,
                last_seen: c.last_seen,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.clients.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.read().is_empty()
    }
}
