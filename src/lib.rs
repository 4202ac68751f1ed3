//! framerelay Library
//! 
//! Diagnostic TCP relay: forwards one client connection to a backend
//! unmodified while dumping every chunk and decoding the FEED/BEEF frames
//! embedded in the stream.

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod protocol;
pub mod relay;
pub mod shutdown;

pub use config::Config;
pub use diagnostics::DiagnosticReporter;
pub use error::RelayError;
pub use relay::{RelayEngine, RelayOutcome, SessionEnd};
pub use shutdown::ShutdownCoordinator;

/// Common error type for setup and configuration plumbing
pub type Result<T> = anyhow::Result<T>;
