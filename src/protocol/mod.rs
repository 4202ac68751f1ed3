//! Embedded Frame Protocol
//! 
//! Detection and decoding of FEED/BEEF frames carried inside the relayed byte stream.

pub mod constants;
pub mod scanner;
pub mod types;

pub use constants::*;
pub use scanner::{scan_frames, FrameScanner};
pub use types::*;
