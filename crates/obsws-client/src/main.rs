//! obsws client demo binary.
//!
//! Loads the TOML config (path given as the first argument, default
//! `obsws.toml`, falling back to defaults when the file is absent), connects
//! to the server, and logs every event it observes. Once the handshake
//! completes it issues a `GetVersion` request and prints the correlated
//! response.

use std::path::PathBuf;
use std::time::Duration;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use obsws_client::config::ClientConfig;
use obsws_client::connection::{ClientEvent, ObsConnection};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("obsws.toml"));

    let config = match ClientConfig::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            warn!("could not load {}: {e}; using defaults", config_path.display());
            ClientConfig::default()
        }
    };

    info!("connecting to {}", config.ws_url());
    let (connection, mut events) = ObsConnection::new(config);
    connection.connect().await;

    // Ctrl-C requests a graceful close; the Closed event ends the loop.
    let closer = connection.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            closer.close().await;
        }
    });

    while let Some(event) = events.recv().await {
        match event {
            ClientEvent::Connected => info!("transport connected; authenticating"),
            ClientEvent::Ready => {
                info!("connection ready");
                match connection.send_request("GetVersion", Default::default()).await {
                    Ok(handle) => {
                        match tokio::time::timeout(Duration::from_secs(5), handle).await {
                            Ok(Ok(response)) => info!(
                                "GetVersion: result={} data={:?}",
                                response.request_status.result, response.response_data
                            ),
                            Ok(Err(_)) => warn!("GetVersion dropped: connection ended"),
                            Err(_) => warn!("GetVersion timed out"),
                        }
                    }
                    Err(e) => error!("GetVersion failed: {e}"),
                }
            }
            ClientEvent::Event(event) => {
                info!("event {}: {:?}", event.event_type, event.event_data)
            }
            ClientEvent::RequestResponse(response) => info!(
                "uncorrelated response {} ({}): result={}",
                response.request_type, response.request_id, response.request_status.result
            ),
            ClientEvent::Error(detail) => error!("connection error: {detail}"),
            ClientEvent::Closed {
                code,
                reason,
                clean,
            } => {
                info!("connection closed (code {code:?}, clean {clean}): {reason}");
                break;
            }
        }
    }

    info!("obsws client stopped");
    Ok(())
}
