//! The injected strategy that reacts to inbound server events.

use tether_protocol::Envelope;

use crate::client::EventSender;

/// Implement this to observe the connection and emit session-scoped events.
///
/// Passed to [`ClientBuilder::build`](crate::ClientBuilder::build); the
/// transport owns it for the client's lifetime.  Both hooks have no-op
/// defaults, so a producer that only ever calls `send()` can use
/// [`NoopHandler`].
///
/// # Example
///
/// ```rust,no_run
/// use tether_client::{event_types, Envelope, EventHandler, EventSender};
///
/// struct DeviceReporter;
///
/// #[async_trait::async_trait]
/// impl EventHandler for DeviceReporter {
///     async fn on_connection_established(&self, sender: &EventSender, _event: &Envelope) {
///         sender
///             .send(
///                 event_types::CLIENT_CONNECTION_ESTABLISHED,
///                 serde_json::json!({ "deviceName": "iPhone", "platform": "ios" }),
///             )
///             .await;
///     }
/// }
/// ```
#[async_trait::async_trait]
pub trait EventHandler: Send + Sync + 'static {
    /// Called after a handshake assigned the session identity and the
    /// pending queue has fully drained.  Events sent from here are the
    /// first post-handshake events on the wire.
    async fn on_connection_established(&self, sender: &EventSender, event: &Envelope) {
        let _ = (sender, event);
    }

    /// Called for every non-handshake inbound envelope.
    async fn on_event(&self, event: Envelope) {
        tracing::debug!(event_type = %event.event_type, "unhandled inbound event");
    }
}

/// Handler that ignores everything; for send-only producers.
pub struct NoopHandler;

#[async_trait::async_trait]
impl EventHandler for NoopHandler {}
