//! Tether wire protocol: the event envelope exchanged between a device-side
//! transport client and the companion dev server, plus the JSON codec for it.
//!
//! Every frame on the wire is one [`Envelope`] serialized as JSON.  The
//! server assigns a session identity by sending a
//! [`event_types::CONNECTION_ESTABLISHED`] envelope whose `client_id` field
//! carries the issued identifier; no application event is valid on the wire
//! without that identifier.

pub mod codec;
pub mod envelope;

pub use codec::{decode_binary, decode_text, encode, DecodeError};
pub use envelope::Envelope;

/// Default dev-server port.
pub const DEFAULT_PORT: u16 = 20024;

/// Reserved event-type discriminators.
///
/// `CONNECTION_ESTABLISHED` is the only type with protocol-level meaning:
/// it is the server-issued handshake.  The rest are the well-known producer
/// types; the transport treats them as opaque strings.
pub mod event_types {
    /// Server → client: session identity assignment (handshake).
    pub const CONNECTION_ESTABLISHED: &str = "CONNECTION_ESTABLISHED";
    /// Client → server: device/app metadata, emitted right after handshake.
    pub const CLIENT_CONNECTION_ESTABLISHED: &str = "CLIENT_CONNECTION_ESTABLISHED";
    /// Client → server: intercepted console output.
    pub const CONSOLE_LOG: &str = "CONSOLE_LOG";
    /// Client → server: intercepted HTTP traffic.
    pub const NETWORK_HTTP_REQUEST: &str = "NETWORK_HTTP_REQUEST";
    pub const NETWORK_HTTP_RESPONSE: &str = "NETWORK_HTTP_RESPONSE";
    /// Client → server: intercepted WebSocket traffic.
    pub const NETWORK_WEBSOCKET_OPEN: &str = "NETWORK_WEBSOCKET_OPEN";
    pub const NETWORK_WEBSOCKET_MESSAGE: &str = "NETWORK_WEBSOCKET_MESSAGE";
    pub const NETWORK_WEBSOCKET_CLOSE: &str = "NETWORK_WEBSOCKET_CLOSE";
}
