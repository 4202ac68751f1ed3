//! Configuration Types

use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Default port the relay listens on
pub const DEFAULT_LISTEN_PORT: u16 = 12340;
/// Default port of the backend process
pub const DEFAULT_TARGET_PORT: u16 = 12344;
/// Default read buffer capacity, and so the largest chunk size
pub const DEFAULT_BUFFER_SIZE: usize = 4096;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub relay: RelayConfig,
    pub diagnostics: DiagnosticsConfig,
    pub logging: LoggingConfig,
}

/// Relay configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RelayConfig {
    pub listen_addr: SocketAddr,
    pub target_host: String,
    pub target_port: u16,
    pub buffer_size: usize,
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
    pub nodelay: bool,
}

impl RelayConfig {
    /// Target endpoint as `host:port`
    pub fn target_endpoint(&self) -> String {
        format!("{}:{}", self.target_host, self.target_port)
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_LISTEN_PORT)),
            target_host: "localhost".to_string(),
            target_port: DEFAULT_TARGET_PORT,
            buffer_size: DEFAULT_BUFFER_SIZE,
            poll_interval: Duration::from_secs(1),
            connect_timeout: Duration::from_secs(10),
            nodelay: true,
        }
    }
}

/// Stream the diagnostic dump is written to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticsOutput {
    Stdout,
    Stderr,
}

/// Diagnostic dump configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    pub hex_dump: bool,
    pub decode_frames: bool,
    pub output: DiagnosticsOutput,
    pub client_name: String,
    pub target_name: String,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            hex_dump: true,
            decode_frames: true,
            output: DiagnosticsOutput::Stdout,
            client_name: "CLIENT".to_string(),
            target_name: "TARGET".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
