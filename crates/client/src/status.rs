//! Connection status and the local channel that publishes its transitions.

use std::fmt;

use parking_lot::RwLock;
use tokio::sync::broadcast;

/// Connection state of the transport. Exactly one is active at a time.
///
/// `Failed` is terminal once the reconnect budget is exhausted; only an
/// explicit [`reconnect`](crate::EventClient::reconnect) recovers from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// Initial dial in progress.
    Connecting,
    /// Socket open; events flow once the handshake assigns an identity.
    Connected,
    /// Waiting out the fixed delay before the next dial.
    Reconnecting,
    /// Socket closed by the peer.
    Disconnected,
    /// Socket error, or reconnect budget exhausted (terminal).
    Failed,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Connecting => "CONNECTING",
            Self::Connected => "CONNECTED",
            Self::Reconnecting => "RECONNECTING",
            Self::Disconnected => "DISCONNECTED",
            Self::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

/// Publishes every status transition to local subscribers (UI indicators,
/// retry policies) and keeps the current value readable at any time.
///
/// Transitions are published unconditionally — two consecutive
/// `Reconnecting` publications mean two scheduled retries, which observers
/// are allowed to count.
pub struct StatusChannel {
    current: RwLock<ConnectionStatus>,
    tx: broadcast::Sender<ConnectionStatus>,
}

impl StatusChannel {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(64);
        Self {
            current: RwLock::new(ConnectionStatus::Connecting),
            tx,
        }
    }

    /// The currently active status.
    pub fn get(&self) -> ConnectionStatus {
        *self.current.read()
    }

    /// Subscribe to future transitions.
    pub fn subscribe(&self) -> broadcast::Receiver<ConnectionStatus> {
        self.tx.subscribe()
    }

    /// The single internal setter: stores and publishes the transition.
    pub(crate) fn set(&self, status: ConnectionStatus) {
        tracing::info!(status = %status, "connection status change");
        *self.current.write() = status;
        // No subscribers is fine.
        let _ = self.tx.send(status);
    }
}

impl Default for StatusChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_connecting() {
        let ch = StatusChannel::new();
        assert_eq!(ch.get(), ConnectionStatus::Connecting);
    }

    #[tokio::test]
    async fn publishes_every_transition_including_repeats() {
        let ch = StatusChannel::new();
        let mut rx = ch.subscribe();

        ch.set(ConnectionStatus::Reconnecting);
        ch.set(ConnectionStatus::Reconnecting);
        ch.set(ConnectionStatus::Failed);

        assert_eq!(rx.recv().await.unwrap(), ConnectionStatus::Reconnecting);
        assert_eq!(rx.recv().await.unwrap(), ConnectionStatus::Reconnecting);
        assert_eq!(rx.recv().await.unwrap(), ConnectionStatus::Failed);
        assert_eq!(ch.get(), ConnectionStatus::Failed);
    }

    #[test]
    fn displays_wire_names() {
        assert_eq!(ConnectionStatus::Connecting.to_string(), "CONNECTING");
        assert_eq!(ConnectionStatus::Failed.to_string(), "FAILED");
    }
}
