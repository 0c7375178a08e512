//! Connection Settings
//!
//! Where the agent lives and how to reach it.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Port the agent serves gRPC on unless told otherwise.
pub const DEFAULT_GRPC_PORT: &str = "50061";

/// Agent connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    /// Agent node address: IPv4, IPv6 or hostname.
    pub node_address: String,
    /// Agent gRPC port, as text.
    pub port: String,
    /// Use TLS with the platform's native roots.
    pub tls: bool,
    /// Upper bound on channel establishment.
    pub connect_timeout: Option<Duration>,
}

impl ConnectionSettings {
    /// Plaintext settings for `node_address` on the default port.
    #[must_use]
    pub fn new(node_address: impl Into<String>) -> Self {
        Self {
            node_address: node_address.into(),
            port: DEFAULT_GRPC_PORT.to_string(),
            tls: false,
            connect_timeout: None,
        }
    }

    /// Set the port.
    #[must_use]
    pub fn with_port(mut self, port: impl Into<String>) -> Self {
        self.port = port.into();
        self
    }

    /// Parse the port.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidPort` if the port is not a `u16`.
    pub fn port_number(&self) -> Result<u16, ConfigError> {
        self.port
            .trim()
            .parse()
            .map_err(|e: std::num::ParseIntError| ConfigError::InvalidPort {
                value: self.port.clone(),
                reason: e.to_string(),
            })
    }

    /// Build the endpoint URI, e.g. `http://10.0.0.5:50061`.
    ///
    /// IPv6 literals are bracketed. The scheme follows `tls`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::EmptyValue` for an empty address and
    /// `ConfigError::InvalidPort` for a bad port.
    pub fn endpoint_uri(&self) -> Result<String, ConfigError> {
        let host = self.node_address.trim();
        if host.is_empty() {
            return Err(ConfigError::EmptyValue("node address".to_string()));
        }
        let port = self.port_number()?;
        let scheme = if self.tls { "https" } else { "http" };

        if host.contains(':') && !host.starts_with('[') {
            Ok(format!("{scheme}://[{host}]:{port}"))
        } else {
            Ok(format!("{scheme}://{host}:{port}"))
        }
    }
}

/// Configuration error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A value is empty.
    #[error("{0} cannot be empty")]
    EmptyValue(String),
    /// The port is not a valid TCP port.
    #[error("invalid grpc port {value:?}: {reason}")]
    InvalidPort {
        /// Port text as supplied.
        value: String,
        /// Parser message.
        reason: String,
    },
}

/// Load `.env` from the current directory or any ancestor directory.
///
/// Returns the file that was loaded, if any. Variables already set in the
/// environment win.
pub fn load_dotenv() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    load_dotenv_from(&cwd)
}

/// Load the nearest `.env` at or above `start`.
pub fn load_dotenv_from(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(".env"))
        .find(|candidate| candidate.is_file())
        .and_then(|path| match dotenvy::from_path(&path) {
            Ok(()) => Some(path),
            Err(e) => {
                eprintln!("Ignoring unreadable {}: {e}", path.display());
                None
            }
        })
}
