//! The wire envelope: one structured event per WebSocket frame.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::event_types;

/// One unit of wire exchange.
///
/// `client_id` is empty until the server has assigned a session identity;
/// the transport guarantees no envelope reaches the wire with an empty
/// `client_id` once a handshake has completed.  All fields except `type`
/// are defaulted on decode so that shape validation stays minimal: a frame
/// only has to be a JSON object with a `type` field to be accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Stable for the lifetime of one client instance.
    #[serde(default)]
    pub instance_id: String,
    /// Unique per envelope, generated at construction time.
    #[serde(default)]
    pub event_id: String,
    /// Server-issued session identifier; empty until assigned.
    #[serde(default)]
    pub client_id: String,
    /// Milliseconds since the Unix epoch, taken at construction time.
    #[serde(default)]
    pub timestamp: i64,
    /// Discriminator identifying the event's meaning.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Type-specific structured data (object or string).
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl Envelope {
    /// Build a new envelope with a fresh `event_id` and current timestamp.
    pub fn new(
        instance_id: impl Into<String>,
        client_id: impl Into<String>,
        event_type: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            instance_id: instance_id.into(),
            event_id: uuid::Uuid::new_v4().to_string(),
            client_id: client_id.into(),
            timestamp: Utc::now().timestamp_millis(),
            event_type: event_type.into(),
            payload,
        }
    }

    /// Build the server-issued handshake envelope assigning `client_id`.
    pub fn handshake(instance_id: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self::new(
            instance_id,
            client_id,
            event_types::CONNECTION_ESTABLISHED,
            serde_json::json!({}),
        )
    }

    /// Whether this envelope is the session-identity handshake.
    pub fn is_handshake(&self) -> bool {
        self.event_type == event_types::CONNECTION_ESTABLISHED
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_envelope_has_fresh_event_id_and_timestamp() {
        let a = Envelope::new("inst", "", "CONSOLE_LOG", serde_json::json!({"x": 1}));
        let b = Envelope::new("inst", "", "CONSOLE_LOG", serde_json::json!({"x": 1}));
        assert_ne!(a.event_id, b.event_id);
        assert!(a.timestamp > 0);
        assert_eq!(a.client_id, "");
    }

    #[test]
    fn handshake_envelope_is_recognized() {
        let hs = Envelope::handshake("server", "c1");
        assert!(hs.is_handshake());
        assert_eq!(hs.client_id, "c1");

        let other = Envelope::new("inst", "c1", "CONSOLE_LOG", serde_json::Value::Null);
        assert!(!other.is_handshake());
    }

    #[test]
    fn serializes_type_field_name() {
        let env = Envelope::new("inst", "c1", "CONSOLE_LOG", serde_json::json!("hello"));
        let json: serde_json::Value = serde_json::to_value(&env).unwrap();
        assert_eq!(json["type"], "CONSOLE_LOG");
        assert_eq!(json["client_id"], "c1");
        assert_eq!(json["payload"], "hello");
    }
}
