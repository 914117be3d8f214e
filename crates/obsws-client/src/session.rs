//! The connection state machine, independent of any transport.
//!
//! [`ProtocolSession`] consumes the signals a transport produces (connected,
//! text frame, error, closed) and returns [`SessionAction`]s for the driver
//! to execute: text to send back, events to surface to the caller, failures
//! to report. Because it never touches a socket, the whole handshake is
//! testable with plain strings.
//!
//! State graph:
//!
//! ```text
//! Disconnected → Connecting → AwaitingHello → Authenticating → Ready
//!                     └──────────────┴──────────────┴───────────┴──→ Closed / Errored
//! ```
//!
//! `Closed` and `Errored` are absorbing and reachable from every state.
//! Out-of-order handshake opcodes (Hello outside `AwaitingHello`, Identified
//! outside `Authenticating`) are logged and ignored rather than fatal: the
//! server is the authority and minor reordering must not crash the caller.

use tracing::{debug, warn};

use obsws_core::auth::derive_auth_key;
use obsws_core::protocol::codec::{decode_server_message, encode_envelope};
use obsws_core::protocol::messages::{
    EventMessage, HelloMessage, IdentifyMessage, OpCode, RequestResponseMessage, ServerMessage,
    RPC_VERSION,
};

/// Lifecycle state of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No transport activity yet, or ready for a fresh connect.
    Disconnected,
    /// Transport connect requested, not yet established.
    Connecting,
    /// Transport up; waiting for the server's Hello.
    AwaitingHello,
    /// Identify sent; waiting for Identified.
    Authenticating,
    /// Handshake complete; requests may be sent.
    Ready,
    /// Transport closed (absorbing).
    Closed,
    /// Transport or handshake failure (absorbing).
    Errored,
}

/// An instruction produced by the session for its driver to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionAction {
    /// Send this text frame to the server.
    Send(String),
    /// The handshake completed; the connection is live.
    Ready,
    /// Surface an asynchronous server event.
    Event(EventMessage),
    /// Surface a request result (the driver correlates it by `request_id`).
    RequestResponse(RequestResponseMessage),
    /// Report a handshake failure; the session has moved to `Errored`.
    Fail(String),
}

/// Connection state machine for one protocol session.
///
/// The password is an explicit field owned by the session and read only
/// during [`ProtocolSession::on_message`] for the Hello→Identify step; it is
/// never captured by closures or copied into derived state.
#[derive(Debug)]
pub struct ProtocolSession {
    state: ConnectionState,
    password: String,
    event_subscriptions: u32,
}

impl ProtocolSession {
    /// Creates a session in the `Disconnected` state.
    pub fn new(password: impl Into<String>, event_subscriptions: u32) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            password: password.into(),
            event_subscriptions,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Signals that the caller asked to connect.
    ///
    /// Returns `true` when the transition to `Connecting` happened; `false`
    /// when the session is already connecting or connected (idempotent no-op).
    pub fn on_connect_requested(&mut self) -> bool {
        match self.state {
            ConnectionState::Disconnected | ConnectionState::Closed | ConnectionState::Errored => {
                self.state = ConnectionState::Connecting;
                true
            }
            _ => false,
        }
    }

    /// Signals that the transport finished connecting.
    pub fn on_transport_connected(&mut self) {
        if self.state == ConnectionState::Connecting {
            self.state = ConnectionState::AwaitingHello;
        } else {
            warn!(state = ?self.state, "transport connected signal in unexpected state");
        }
    }

    /// Signals a transport-level connection error. Absorbing.
    pub fn on_transport_error(&mut self) {
        self.state = ConnectionState::Errored;
    }

    /// Signals that the transport closed. Absorbing.
    pub fn on_transport_closed(&mut self) {
        self.state = ConnectionState::Closed;
    }

    /// Consumes one inbound text frame and returns the actions it triggers.
    ///
    /// A malformed frame never changes state and never terminates the
    /// connection: it is logged and dropped, returning no actions.
    pub fn on_message(&mut self, text: &str) -> Vec<SessionAction> {
        let message = match decode_server_message(text) {
            Ok(message) => message,
            Err(e) => {
                warn!("dropping malformed inbound message: {e}");
                return Vec::new();
            }
        };

        match message {
            ServerMessage::Hello(hello) => self.handle_hello(hello),
            ServerMessage::Identified(_) => {
                if self.state == ConnectionState::Authenticating {
                    self.state = ConnectionState::Ready;
                    vec![SessionAction::Ready]
                } else {
                    warn!(state = ?self.state, "ignoring Identified outside Authenticating");
                    Vec::new()
                }
            }
            ServerMessage::Event(event) => {
                if self.state != ConnectionState::Ready {
                    debug!(state = ?self.state, event_type = %event.event_type, "event before Ready");
                }
                vec![SessionAction::Event(event)]
            }
            ServerMessage::RequestResponse(response) => {
                vec![SessionAction::RequestResponse(response)]
            }
        }
    }

    fn handle_hello(&mut self, hello: HelloMessage) -> Vec<SessionAction> {
        if self.state != ConnectionState::AwaitingHello {
            warn!(state = ?self.state, "ignoring Hello outside AwaitingHello");
            return Vec::new();
        }

        let Some(auth) = hello.authentication else {
            self.state = ConnectionState::Errored;
            return vec![SessionAction::Fail(
                "server Hello carried no authentication challenge".to_string(),
            )];
        };

        let key = derive_auth_key(&self.password, &auth.salt, &auth.challenge);
        let identify = IdentifyMessage {
            rpc_version: RPC_VERSION,
            authentication: Some(key),
            event_subscriptions: self.event_subscriptions,
        };

        let payload = match serde_json::to_value(&identify) {
            Ok(payload) => payload,
            Err(e) => {
                self.state = ConnectionState::Errored;
                return vec![SessionAction::Fail(format!(
                    "could not serialize Identify: {e}"
                ))];
            }
        };
        match encode_envelope(OpCode::Identify, payload) {
            Ok(text) => {
                self.state = ConnectionState::Authenticating;
                vec![SessionAction::Send(text)]
            }
            Err(e) => {
                self.state = ConnectionState::Errored;
                vec![SessionAction::Fail(format!(
                    "could not encode Identify envelope: {e}"
                ))]
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
