//! WebSocket connection driver.
//!
//! [`ObsConnection`] owns the tokio-tungstenite transport exclusively and
//! drives a [`ProtocolSession`] with the frames it reads. Inbound frames are
//! processed one at a time by a single reader task, so callers observe
//! [`ClientEvent`]s in the exact order the transport received them.
//!
//! Request/response correlation: every outgoing request registers its
//! `requestId` in a pending table; when the matching RequestResponse arrives
//! the oneshot handle returned by [`ObsConnection::send_request`] resolves.
//! Responses with no pending entry are surfaced as ordinary events. When the
//! connection ends, the pending table is cleared and waiting callers see a
//! closed channel.
//!
//! Sending while the handshake is incomplete fails fast with
//! [`ClientError::NotReady`]; nothing is queued.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

use obsws_core::protocol::codec::ProtocolError;
use obsws_core::protocol::messages::{EventMessage, RequestMessage, RequestResponseMessage};
use obsws_core::protocol::request::{
    build_request, encode_request, get_profile_parameter, set_profile_parameter,
    toggle_input_mute, RecordRequest,
};

use crate::config::ClientConfig;
use crate::session::{ConnectionState, ProtocolSession, SessionAction};

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// Resolves with the correlated [`RequestResponseMessage`]. The channel
/// closes without a value when the connection ends first; callers wanting a
/// deadline compose this with `tokio::time::timeout`.
pub type ResponseHandle = oneshot::Receiver<RequestResponseMessage>;

/// Errors that can occur in the client connection layer.
#[derive(Debug, Error)]
pub enum ClientError {
    /// A request was issued before the handshake completed (or after the
    /// connection ended). Nothing was sent.
    #[error("connection is not ready for requests (state: {state:?})")]
    NotReady { state: ConnectionState },

    /// The transport has no open write half.
    #[error("transport is not connected")]
    NotConnected,

    /// A WebSocket-level error occurred.
    #[error("websocket transport error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),

    /// A message could not be encoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

/// Observations delivered to the caller, in strict frame-arrival order.
#[derive(Debug)]
pub enum ClientEvent {
    /// The transport finished connecting; the handshake is starting.
    Connected,
    /// The handshake completed; requests may now be sent.
    Ready,
    /// An asynchronous server notification.
    Event(EventMessage),
    /// A request result that matched no pending request.
    RequestResponse(RequestResponseMessage),
    /// A transport or handshake failure.
    Error(String),
    /// The connection closed.
    Closed {
        code: Option<u16>,
        reason: String,
        clean: bool,
    },
}

/// A single client connection to the control-protocol server.
///
/// Owns its transport exclusively; the transport is dropped with the
/// connection. All public operations are non-blocking signals: completion
/// and failure are observed through the [`ClientEvent`] channel.
pub struct ObsConnection {
    config: ClientConfig,
    session: Arc<Mutex<ProtocolSession>>,
    writer: Arc<Mutex<Option<WsSink>>>,
    pending: Arc<Mutex<HashMap<String, oneshot::Sender<RequestResponseMessage>>>>,
    events: mpsc::Sender<ClientEvent>,
}

impl ObsConnection {
    /// Creates a new (not yet connected) connection and its event receiver.
    pub fn new(config: ClientConfig) -> (Arc<Self>, mpsc::Receiver<ClientEvent>) {
        let (tx, rx) = mpsc::channel(128);
        let session = ProtocolSession::new(config.password.clone(), config.event_subscriptions);
        let connection = Arc::new(Self {
            config,
            session: Arc::new(Mutex::new(session)),
            writer: Arc::new(Mutex::new(None)),
            pending: Arc::new(Mutex::new(HashMap::new())),
            events: tx,
        });
        (connection, rx)
    }

    /// Current lifecycle state.
    pub async fn state(&self) -> ConnectionState {
        self.session.lock().await.state()
    }

    /// Requests a transport connection.
    ///
    /// Never blocks on the network: the connect attempt runs in a spawned
    /// task and its outcome arrives as [`ClientEvent`]s. Idempotent: calling
    /// while already connecting or connected is a no-op.
    pub async fn connect(self: &Arc<Self>) {
        {
            let mut session = self.session.lock().await;
            if !session.on_connect_requested() {
                debug!(state = ?session.state(), "connect ignored");
                return;
            }
        }
        let this = Arc::clone(self);
        tokio::spawn(async move {
            this.run().await;
        });
    }

    /// Requests a graceful shutdown.
    ///
    /// Always safe to call, including before connecting or after the
    /// connection has already closed (no-op). The `Closed` event arrives
    /// once the transport acknowledges.
    pub async fn close(&self) {
        let mut guard = self.writer.lock().await;
        if let Some(sink) = guard.as_mut() {
            if let Err(e) = sink.send(Message::Close(None)).await {
                debug!("close request failed: {e}");
            }
        }
    }

    /// Builds and sends a request, returning a correlation handle.
    ///
    /// # Errors
    ///
    /// Fails fast with [`ClientError::NotReady`] when the handshake has not
    /// completed; nothing is queued in that case.
    pub async fn send_request(
        &self,
        request_type: &str,
        fields: BTreeMap<String, String>,
    ) -> Result<ResponseHandle, ClientError> {
        self.dispatch(build_request(request_type, fields)).await
    }

    /// Sends a recording-control request.
    pub async fn record(&self, request: RecordRequest) -> Result<ResponseHandle, ClientError> {
        self.send_request(request.request_type(), BTreeMap::new())
            .await
    }

    /// Toggles mute on the named input.
    pub async fn toggle_input_mute(&self, input_name: &str) -> Result<ResponseHandle, ClientError> {
        self.dispatch(toggle_input_mute(input_name)).await
    }

    /// Reads a profile parameter.
    pub async fn get_profile_parameter(
        &self,
        parameter_category: &str,
        parameter_name: &str,
    ) -> Result<ResponseHandle, ClientError> {
        self.dispatch(get_profile_parameter(parameter_category, parameter_name))
            .await
    }

    /// Points the recorder's output at `directory` with the given filename
    /// formatting, via two profile-parameter writes.
    pub async fn set_record_directory(
        &self,
        directory: &str,
        file_name: &str,
    ) -> Result<(), ClientError> {
        // Fire-and-forget: outcome is visible through later profile reads.
        let _ = self
            .dispatch(set_profile_parameter("SimpleOutput", "FilePath", directory))
            .await?;
        let _ = self
            .dispatch(set_profile_parameter("Output", "FilenameFormatting", file_name))
            .await?;
        Ok(())
    }

    // ── Internals ─────────────────────────────────────────────────────────────

    async fn dispatch(&self, request: RequestMessage) -> Result<ResponseHandle, ClientError> {
        let state = self.session.lock().await.state();
        if state != ConnectionState::Ready {
            return Err(ClientError::NotReady { state });
        }

        let text = encode_request(&request)?;
        let (tx, rx) = oneshot::channel();
        self.pending
            .lock()
            .await
            .insert(request.request_id.clone(), tx);

        if let Err(e) = self.write(text).await {
            self.pending.lock().await.remove(&request.request_id);
            return Err(e);
        }
        debug!(
            request_type = %request.request_type,
            request_id = %request.request_id,
            "request sent"
        );
        Ok(rx)
    }

    async fn write(&self, text: String) -> Result<(), ClientError> {
        let mut guard = self.writer.lock().await;
        match guard.as_mut() {
            Some(sink) => Ok(sink.send(Message::Text(text)).await?),
            None => Err(ClientError::NotConnected),
        }
    }

    /// Connects the transport and drives the read loop until it ends.
    async fn run(self: Arc<Self>) {
        let url = self.config.ws_url();
        let stream = match connect_async(url.as_str()).await {
            Ok((stream, _response)) => stream,
            Err(e) => {
                error!("failed to connect to {url}: {e}");
                self.session.lock().await.on_transport_error();
                let _ = self
                    .events
                    .send(ClientEvent::Error(format!("connect failed: {e}")))
                    .await;
                return;
            }
        };

        info!("connected to {url}");
        let (sink, mut reader) = stream.split();
        *self.writer.lock().await = Some(sink);
        self.session.lock().await.on_transport_connected();
        let _ = self.events.send(ClientEvent::Connected).await;

        while let Some(frame) = reader.next().await {
            match frame {
                Ok(Message::Text(text)) => {
                    let actions = self.session.lock().await.on_message(&text);
                    for action in actions {
                        self.apply(action).await;
                    }
                }
                Ok(Message::Close(frame)) => {
                    let (code, reason) = match frame {
                        Some(frame) => (Some(u16::from(frame.code)), frame.reason.into_owned()),
                        None => (None, String::new()),
                    };
                    info!("server closed the connection (code {code:?}): {reason}");
                    self.session.lock().await.on_transport_closed();
                    let _ = self
                        .events
                        .send(ClientEvent::Closed {
                            code,
                            reason,
                            clean: true,
                        })
                        .await;
                    break;
                }
                // Ping/pong and binary frames are transport concerns.
                Ok(_) => {}
                Err(e) => {
                    warn!("transport error: {e}");
                    self.session.lock().await.on_transport_error();
                    let _ = self
                        .events
                        .send(ClientEvent::Error(format!("transport error: {e}")))
                        .await;
                    break;
                }
            }
        }

        *self.writer.lock().await = None;
        // Dropping the senders closes every outstanding correlation handle.
        self.pending.lock().await.clear();

        let mut session = self.session.lock().await;
        if !matches!(
            session.state(),
            ConnectionState::Closed | ConnectionState::Errored
        ) {
            session.on_transport_closed();
            let _ = self
                .events
                .send(ClientEvent::Closed {
                    code: None,
                    reason: "connection ended".to_string(),
                    clean: false,
                })
                .await;
        }
    }

    async fn apply(&self, action: SessionAction) {
        match action {
            SessionAction::Send(text) => {
                if let Err(e) = self.write(text).await {
                    error!("failed to send handshake message: {e}");
                }
            }
            SessionAction::Ready => {
                info!("handshake complete; connection is ready");
                let _ = self.events.send(ClientEvent::Ready).await;
            }
            SessionAction::Event(event) => {
                let _ = self.events.send(ClientEvent::Event(event)).await;
            }
            SessionAction::RequestResponse(response) => {
                let waiter = self.pending.lock().await.remove(&response.request_id);
                match waiter {
                    Some(tx) => {
                        // The caller may have dropped its handle; that is fine.
                        let _ = tx.send(response);
                    }
                    None => {
                        let _ = self.events.send(ClientEvent::RequestResponse(response)).await;
                    }
                }
            }
            SessionAction::Fail(detail) => {
                error!("handshake failed: {detail}");
                let _ = self.events.send(ClientEvent::Error(detail)).await;
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
