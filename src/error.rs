//! Relay Errors

use std::io;
use std::net::SocketAddr;
use thiserror::Error;

use crate::protocol::Direction;

/// Failures that end a relay run.
///
/// Orderly end of stream is not an error (see `SessionEnd`), and diagnostic
/// output failures are absorbed by the reporter.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Listening socket could not be bound
    #[error("failed to bind listener on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    /// Accepting the client connection failed
    #[error("failed to accept client connection: {0}")]
    Accept(#[source] io::Error),

    /// Target host name did not resolve
    #[error("failed to resolve target {target}: {reason}")]
    Resolve { target: String, reason: String },

    /// No resolved target address accepted the connection
    #[error("failed to connect to target {target}: {reason}")]
    Connect { target: String, reason: String },

    /// A read or write failed mid-session
    #[error("transport error ({direction}): {source}")]
    Transport {
        direction: Direction,
        #[source]
        source: io::Error,
    },
}

impl RelayError {
    /// Whether the error happened before any byte was relayed
    pub fn is_setup(&self) -> bool {
        !matches!(self, RelayError::Transport { .. })
    }
}

pub type RelayResult<T> = std::result::Result<T, RelayError>;
