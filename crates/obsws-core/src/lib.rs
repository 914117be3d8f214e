//! # obsws-core
//!
//! Shared library for the obsws client containing the JSON envelope codec,
//! the typed protocol message definitions, the request builder, and the
//! authentication key derivation.
//!
//! This crate has no dependency on any transport or async runtime: it turns
//! text frames into typed messages and back, nothing more. The WebSocket
//! connection itself lives in `obsws-client`.
//!
//! - **`protocol`** – The wire contract of the obs-websocket v5 control
//!   protocol. Every message on the wire is a two-field JSON envelope
//!   `{"op": <int>, "d": <object>}` where the numeric opcode selects the
//!   schema of `d`.
//!
//! - **`auth`** – The two-round salted-hash scheme used to prove knowledge
//!   of the server password without transmitting it: SHA-256 and Base64,
//!   applied in a fixed order over the server-issued salt and challenge.

pub mod auth;
pub mod protocol;

pub use auth::derive_auth_key;
pub use protocol::codec::{decode_envelope, decode_server_message, encode_envelope, ProtocolError};
pub use protocol::messages::{OpCode, ServerMessage};
pub use protocol::request::{build_request, encode_request, RecordRequest};
