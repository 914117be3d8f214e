//! JSON codec for encoding and decoding protocol envelopes.
//!
//! Wire format (UTF-8 text frame):
//! ```text
//! {"op": <int>, "d": <object>}
//! ```
//! Exactly two fields. The numeric opcode selects the schema of `d`.
//!
//! Decode failures are recoverable per message: the caller logs and drops the
//! frame and the connection stays open. A single malformed inbound message
//! must never terminate the connection.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::protocol::messages::{
    EventMessage, HelloMessage, OpCode, RequestResponseMessage, ServerMessage,
};

/// Errors that can occur while encoding or decoding an envelope.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The text is not valid JSON, or a required field is missing or has the
    /// wrong type for the envelope's opcode.
    #[error("malformed envelope: {0}")]
    Json(#[from] serde_json::Error),

    /// The `op` field holds a value outside the protocol's opcode table.
    #[error("unknown opcode: {0}")]
    UnknownOpCode(u8),

    /// The opcode is valid but only travels client-to-server; the server
    /// must never send it.
    #[error("unexpected client-to-server opcode from server: {0:?}")]
    UnexpectedOpCode(OpCode),
}

/// The raw two-field wire shape. `d` is opaque at this layer.
#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    op: u8,
    d: Value,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Encodes an opcode and payload document into an envelope text frame.
///
/// # Errors
///
/// Returns [`ProtocolError::Json`] if serialization fails.
pub fn encode_envelope(op: OpCode, data: Value) -> Result<String, ProtocolError> {
    let envelope = Envelope {
        op: op as u8,
        d: data,
    };
    Ok(serde_json::to_string(&envelope)?)
}

/// Decodes a text frame into its opcode and opaque payload document.
///
/// # Errors
///
/// Returns [`ProtocolError`] if the text is malformed or the opcode unknown.
pub fn decode_envelope(text: &str) -> Result<(OpCode, Value), ProtocolError> {
    let envelope: Envelope = serde_json::from_str(text)?;
    let op = OpCode::try_from(envelope.op).map_err(|_| ProtocolError::UnknownOpCode(envelope.op))?;
    Ok((op, envelope.d))
}

/// Decodes a text frame into a typed [`ServerMessage`].
///
/// This is the schema-checked decode step: a missing or mistyped field
/// surfaces here as an explicit error instead of faulting at access time.
///
/// # Errors
///
/// Returns [`ProtocolError`] if the frame is malformed, the opcode is
/// unknown, or the opcode is one only a client may send.
pub fn decode_server_message(text: &str) -> Result<ServerMessage, ProtocolError> {
    let (op, data) = decode_envelope(text)?;
    match op {
        OpCode::Hello => {
            let hello: HelloMessage = serde_json::from_value(data)?;
            Ok(ServerMessage::Hello(hello))
        }
        OpCode::Identified => Ok(ServerMessage::Identified(data)),
        OpCode::Event => {
            let event: EventMessage = serde_json::from_value(data)?;
            Ok(ServerMessage::Event(event))
        }
        OpCode::RequestResponse => {
            let response: RequestResponseMessage = serde_json::from_value(data)?;
            Ok(ServerMessage::RequestResponse(response))
        }
        OpCode::Identify | OpCode::Request => Err(ProtocolError::UnexpectedOpCode(op)),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_encode_emits_exactly_op_and_d() {
        let text = encode_envelope(OpCode::Identify, json!({"rpcVersion": 1})).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();

        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 2);
        assert_eq!(object["op"], json!(1));
        assert_eq!(object["d"], json!({"rpcVersion": 1}));
    }

    #[test]
    fn test_envelope_round_trip_preserves_opcode_and_data() {
        let data = json!({"eventType": "RecordStateChanged", "eventData": {"outputActive": true}});
        let text = encode_envelope(OpCode::Event, data.clone()).unwrap();

        let (op, decoded) = decode_envelope(&text).unwrap();
        assert_eq!(op, OpCode::Event);
        assert_eq!(decoded, data);
    }

    #[test]
    fn test_decode_invalid_json_is_recoverable_error() {
        let result = decode_envelope("{\"op\": 0, \"d\":");
        assert!(matches!(result, Err(ProtocolError::Json(_))));
    }

    #[test]
    fn test_decode_missing_d_field_is_error() {
        let result = decode_envelope("{\"op\": 5}");
        assert!(matches!(result, Err(ProtocolError::Json(_))));
    }

    #[test]
    fn test_decode_unknown_opcode_is_error() {
        let result = decode_envelope("{\"op\": 4, \"d\": {}}");
        assert!(matches!(result, Err(ProtocolError::UnknownOpCode(4))));
    }

    #[test]
    fn test_decode_hello_with_authentication() {
        let text = r#"{"op":0,"d":{"obsWebSocketVersion":"5.1.0","rpcVersion":1,"authentication":{"challenge":"abc","salt":"xyz"}}}"#;
        let msg = decode_server_message(text).unwrap();

        match msg {
            ServerMessage::Hello(hello) => {
                let auth = hello.authentication.expect("authentication must be present");
                assert_eq!(auth.challenge, "abc");
                assert_eq!(auth.salt, "xyz");
                assert_eq!(hello.rpc_version, Some(1));
            }
            other => panic!("expected Hello, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_hello_without_authentication_decodes_to_none() {
        let text = r#"{"op":0,"d":{"rpcVersion":1}}"#;
        let msg = decode_server_message(text).unwrap();

        match msg {
            ServerMessage::Hello(hello) => assert!(hello.authentication.is_none()),
            other => panic!("expected Hello, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_request_response_reads_status_and_correlation_id() {
        let text = r#"{"op":7,"d":{"requestType":"ToggleInputMute","requestId":"id-1","requestStatus":{"result":true,"code":100}}}"#;
        let msg = decode_server_message(text).unwrap();

        match msg {
            ServerMessage::RequestResponse(resp) => {
                assert_eq!(resp.request_id, "id-1");
                assert!(resp.request_status.result);
                assert_eq!(resp.request_status.code, Some(100));
                assert!(resp.response_data.is_none());
            }
            other => panic!("expected RequestResponse, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_event_reads_type_and_payload() {
        let text = r#"{"op":5,"d":{"eventType":"InputMuteStateChanged","eventIntent":8,"eventData":{"inputMuted":true}}}"#;
        let msg = decode_server_message(text).unwrap();

        match msg {
            ServerMessage::Event(event) => {
                assert_eq!(event.event_type, "InputMuteStateChanged");
                assert_eq!(event.event_intent, Some(8));
                assert_eq!(event.event_data, Some(json!({"inputMuted": true})));
            }
            other => panic!("expected Event, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_event_with_missing_event_type_is_error() {
        let text = r#"{"op":5,"d":{"eventData":{}}}"#;
        assert!(matches!(
            decode_server_message(text),
            Err(ProtocolError::Json(_))
        ));
    }

    #[test]
    fn test_decode_client_opcode_from_server_is_error() {
        let text = r#"{"op":6,"d":{"requestType":"StartRecord","requestId":"x","requestData":{}}}"#;
        assert!(matches!(
            decode_server_message(text),
            Err(ProtocolError::UnexpectedOpCode(OpCode::Request))
        ));
    }

    #[test]
    fn test_identified_payload_is_opaque() {
        let msg = decode_server_message(r#"{"op":2,"d":{"negotiatedRpcVersion":1}}"#).unwrap();
        assert!(matches!(msg, ServerMessage::Identified(_)));
        assert_eq!(msg.opcode(), OpCode::Identified);
    }
}
