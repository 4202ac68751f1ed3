//! Diagnostic Output
//! 
//! Hex dumps and frame summaries for every chunk the relay forwards.

pub mod format;
pub mod reporter;

pub use format::{chunk_header, frame_summary, hex_dump, hex_dump_lines, BYTES_PER_LINE};
pub use reporter::DiagnosticReporter;
