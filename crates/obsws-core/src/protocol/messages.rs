//! All obs-websocket v5 protocol message types.
//!
//! Every message on the wire is a JSON envelope `{"op": <int>, "d": <object>}`.
//! The opcode values, field names, and field casing are fixed by the external
//! protocol and must not be altered.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ── Protocol constants ────────────────────────────────────────────────────────

/// RPC protocol version negotiated in the Identify message.
pub const RPC_VERSION: u32 = 1;

/// Event-subscription bitmask flags carried in [`IdentifyMessage::event_subscriptions`].
///
/// Each bit opts the client into one category of asynchronous Event messages.
pub mod event_subscriptions {
    pub const NONE: u32 = 0;
    pub const GENERAL: u32 = 1 << 0;
    pub const CONFIG: u32 = 1 << 1;
    pub const SCENES: u32 = 1 << 2;
    pub const INPUTS: u32 = 1 << 3;
    pub const TRANSITIONS: u32 = 1 << 4;
    pub const FILTERS: u32 = 1 << 5;
    pub const OUTPUTS: u32 = 1 << 6;
    pub const SCENE_ITEMS: u32 = 1 << 7;
    pub const MEDIA_INPUTS: u32 = 1 << 8;
    pub const VENDORS: u32 = 1 << 9;
    pub const UI: u32 = 1 << 10;

    /// Mask sent by default when the caller does not pick one.
    pub const DEFAULT: u32 = GENERAL | FILTERS;
}

// ── Opcodes ───────────────────────────────────────────────────────────────────

/// All envelope opcodes defined by the protocol.
///
/// Opcodes travel on the wire as the numeric `"op"` field of the envelope,
/// never as stringified names; the codec converts through `u8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OpCode {
    /// Server greeting; carries the authentication challenge and salt.
    Hello = 0,
    /// Client authentication response.
    Identify = 1,
    /// Authentication accepted; the connection is live.
    Identified = 2,
    /// Asynchronous server notification.
    Event = 5,
    /// Client command invocation.
    Request = 6,
    /// Result of a prior Request.
    RequestResponse = 7,
}

impl TryFrom<u8> for OpCode {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(OpCode::Hello),
            1 => Ok(OpCode::Identify),
            2 => Ok(OpCode::Identified),
            5 => Ok(OpCode::Event),
            6 => Ok(OpCode::Request),
            7 => Ok(OpCode::RequestResponse),
            _ => Err(()),
        }
    }
}

// ── Per-opcode payload structs ────────────────────────────────────────────────

/// Challenge and salt issued by the server inside the Hello payload.
///
/// Exists only transiently during the handshake; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticationChallenge {
    /// Random per-connection challenge string.
    pub challenge: String,
    /// Random per-password salt string.
    pub salt: String,
}

/// Hello (op 0): first message from the server after the transport connects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HelloMessage {
    /// Server software version, informational.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obs_web_socket_version: Option<String>,
    /// RPC version the server speaks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpc_version: Option<u32>,
    /// Present when the server requires authentication.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication: Option<AuthenticationChallenge>,
}

/// Identify (op 1): the client's authenticated response to a Hello.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifyMessage {
    /// Always [`RPC_VERSION`].
    pub rpc_version: u32,
    /// Derived authentication key; see [`crate::auth::derive_auth_key`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authentication: Option<String>,
    /// Bitmask of [`event_subscriptions`] flags.
    pub event_subscriptions: u32,
}

/// Request (op 6): a command invocation with a unique correlation id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestMessage {
    /// Name of the command, e.g. `"ToggleInputMute"`.
    pub request_type: String,
    /// UUID v4, unique within the connection's lifetime.
    pub request_id: String,
    /// Command parameters. Always serialized, even when empty.
    pub request_data: BTreeMap<String, String>,
}

/// Outcome field inside a [`RequestResponseMessage`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestStatus {
    /// `true` when the request succeeded.
    pub result: bool,
    /// Protocol status code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
    /// Human-readable detail when the request failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// RequestResponse (op 7): result of a prior Request, matched by `request_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestResponseMessage {
    /// Echo of the request's `requestType`.
    pub request_type: String,
    /// Echo of the request's `requestId`; the correlation key.
    pub request_id: String,
    /// Success flag plus optional code/comment.
    pub request_status: RequestStatus,
    /// Command-specific result document, when any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_data: Option<Value>,
}

/// Event (op 5): an asynchronous server notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventMessage {
    /// Name of the event, e.g. `"RecordStateChanged"`.
    pub event_type: String,
    /// Subscription category bit that produced this event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_intent: Option<u32>,
    /// Event-specific payload document, when any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_data: Option<Value>,
}

// ── Top-level server message enum ─────────────────────────────────────────────

/// All messages the server can send, discriminated by opcode.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    Hello(HelloMessage),
    /// Payload is opaque; the opcode itself is the acknowledgement.
    Identified(Value),
    Event(EventMessage),
    RequestResponse(RequestResponseMessage),
}

impl ServerMessage {
    /// Returns the [`OpCode`] discriminant for this message.
    pub fn opcode(&self) -> OpCode {
        match self {
            ServerMessage::Hello(_) => OpCode::Hello,
            ServerMessage::Identified(_) => OpCode::Identified,
            ServerMessage::Event(_) => OpCode::Event,
            ServerMessage::RequestResponse(_) => OpCode::RequestResponse,
        }
    }
}
