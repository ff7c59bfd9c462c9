//! JSON codec for [`Envelope`] frames.
//!
//! Inbound frames arrive either as text or as binary buffers; binary is
//! decoded as UTF-8 text first.  A frame that is not valid JSON, or whose
//! parsed value is not an object with a `type` field, is rejected with a
//! [`DecodeError`] — callers log and drop it, the connection is unaffected.

use crate::envelope::Envelope;

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("frame is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("frame is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("frame is not an object with a `type` field")]
    MissingType,
}

/// Decode a text frame into an [`Envelope`].
pub fn decode_text(text: &str) -> Result<Envelope, DecodeError> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    let is_typed_object = value
        .as_object()
        .is_some_and(|map| map.contains_key("type"));
    if !is_typed_object {
        return Err(DecodeError::MissingType);
    }
    Ok(serde_json::from_value(value)?)
}

/// Decode a binary frame: UTF-8 decode, then JSON-parse.
pub fn decode_binary(bytes: &[u8]) -> Result<Envelope, DecodeError> {
    decode_text(std::str::from_utf8(bytes)?)
}

/// Encode an envelope for the wire.
pub fn encode(envelope: &Envelope) -> Result<String, serde_json::Error> {
    serde_json::to_string(envelope)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_full_envelope() {
        let text = r#"{
            "instance_id": "i1",
            "event_id": "e1",
            "client_id": "c1",
            "timestamp": 1700000000000,
            "type": "CONSOLE_LOG",
            "payload": {"args": ["hi"]}
        }"#;
        let env = decode_text(text).unwrap();
        assert_eq!(env.instance_id, "i1");
        assert_eq!(env.client_id, "c1");
        assert_eq!(env.event_type, "CONSOLE_LOG");
        assert_eq!(env.payload["args"][0], "hi");
    }

    #[test]
    fn decodes_minimal_typed_object() {
        // Only `type` is required; everything else is defaulted.
        let env = decode_text(r#"{"type":"PING"}"#).unwrap();
        assert_eq!(env.event_type, "PING");
        assert_eq!(env.client_id, "");
        assert_eq!(env.timestamp, 0);
        assert_eq!(env.payload, serde_json::Value::Null);
    }

    #[test]
    fn rejects_non_json() {
        assert!(matches!(decode_text("not json"), Err(DecodeError::Json(_))));
    }

    #[test]
    fn rejects_typeless_object() {
        assert!(matches!(
            decode_text(r#"{"foo": 1}"#),
            Err(DecodeError::MissingType)
        ));
    }

    #[test]
    fn rejects_non_object_json() {
        assert!(matches!(
            decode_text(r#"[1, 2, 3]"#),
            Err(DecodeError::MissingType)
        ));
        assert!(matches!(
            decode_text(r#""just a string""#),
            Err(DecodeError::MissingType)
        ));
    }

    #[test]
    fn decodes_binary_utf8() {
        let env = decode_binary(br#"{"type":"CONSOLE_LOG","payload":"x"}"#).unwrap();
        assert_eq!(env.event_type, "CONSOLE_LOG");
    }

    #[test]
    fn rejects_binary_non_utf8() {
        assert!(matches!(
            decode_binary(&[0xff, 0xfe, 0x00]),
            Err(DecodeError::Utf8(_))
        ));
    }

    #[test]
    fn encode_then_decode_preserves_envelope() {
        let env = Envelope::new("i1", "c1", "NETWORK_HTTP_REQUEST", serde_json::json!({"url": "/"}));
        let text = encode(&env).unwrap();
        assert_eq!(decode_text(&text).unwrap(), env);
    }
}
