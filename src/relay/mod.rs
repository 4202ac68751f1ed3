//! Data Relay Module
//! 
//! Accepts the client, connects the target and relays bytes between them.

pub mod engine;
pub mod session;

pub use engine::{RelayEngine, RelayOutcome};
pub use session::{RelaySession, SessionEnd, SessionStats};
