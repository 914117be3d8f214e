//! # obsws-client
//!
//! Async connection layer for the obs-websocket v5 control protocol.
//!
//! The crate is split along the same seam as the protocol itself:
//!
//! - **`session`** – The connection state machine, free of any transport.
//!   It consumes inbound text frames and produces actions (text to send,
//!   events to surface). All handshake logic lives here, which keeps it
//!   testable without a socket.
//!
//! - **`connection`** – Owns the tokio-tungstenite WebSocket, drives the
//!   session, correlates request/response pairs, and delivers
//!   [`connection::ClientEvent`]s over an mpsc channel in the exact order
//!   frames arrived.
//!
//! - **`config`** – TOML configuration (host, port, password, event
//!   subscription mask).

pub mod config;
pub mod connection;
pub mod session;

pub use config::{ClientConfig, ConfigError};
pub use connection::{ClientError, ClientEvent, ObsConnection, ResponseHandle};
pub use session::{ConnectionState, ProtocolSession, SessionAction};
