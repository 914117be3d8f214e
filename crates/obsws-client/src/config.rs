//! TOML-based configuration for the client.
//!
//! Example file:
//!
//! ```toml
//! host = "127.0.0.1"
//! port = 4455
//! password = "supersecret"
//! event_subscriptions = 33
//! ```
//!
//! Fields use serde defaults so a partial (or absent) file still yields a
//! working configuration pointing at a local server.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use obsws_core::protocol::messages::event_subscriptions;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Connection settings for the control-protocol server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientConfig {
    /// Server hostname or IP address.
    #[serde(default = "default_host")]
    pub host: String,
    /// Server WebSocket port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Server password; opaque secret, held only in memory.
    #[serde(default)]
    pub password: String,
    /// Bitmask of event categories to subscribe to.
    #[serde(default = "default_event_subscriptions")]
    pub event_subscriptions: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            password: String::new(),
            event_subscriptions: default_event_subscriptions(),
        }
    }
}

impl ClientConfig {
    /// Loads the configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&text)?)
    }

    /// The WebSocket URL for this configuration.
    pub fn ws_url(&self) -> String {
        format!("ws://{}:{}", self.host, self.port)
    }
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    4455
}

fn default_event_subscriptions() -> u32 {
    event_subscriptions::DEFAULT
}

// ── Tests ─────────────────────────────────────────────────────────────────────
