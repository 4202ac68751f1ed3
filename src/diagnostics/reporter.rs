//! Diagnostic Reporter

use std::io::{self, Write};

use tracing::debug;

use super::format::{chunk_header, frame_summary, hex_dump};
use crate::config::{DiagnosticsConfig, DiagnosticsOutput};
use crate::protocol::{Chunk, Direction, FrameScanner};

const DUMP_INDENT: &str = "    ";
const FRAME_INDENT: &str = "  ";

/// Writes hex dumps and frame summaries for relayed chunks.
///
/// Output is best effort: a failing diagnostic stream is noted once in the
/// log and otherwise ignored so it can never interrupt the relay.
pub struct DiagnosticReporter {
    writer: Box<dyn Write + Send>,
    options: DiagnosticsConfig,
    write_failed: bool,
}

impl DiagnosticReporter {
    /// Create a reporter writing to `writer`
    pub fn new(writer: Box<dyn Write + Send>, options: DiagnosticsConfig) -> Self {
        Self {
            writer,
            options,
            write_failed: false,
        }
    }

    /// Create a reporter writing to the stream selected in the configuration
    pub fn from_config(options: &DiagnosticsConfig) -> Self {
        let writer: Box<dyn Write + Send> = match options.output {
            DiagnosticsOutput::Stdout => Box::new(io::stdout()),
            DiagnosticsOutput::Stderr => Box::new(io::stderr()),
        };
        Self::new(writer, options.clone())
    }

    /// Label for a direction using the configured endpoint names
    pub fn label(&self, direction: Direction) -> String {
        direction.label(&self.options.client_name, &self.options.target_name)
    }

    /// Report one chunk. Returns the number of frames decoded from it.
    pub fn report(&mut self, chunk: &Chunk) -> usize {
        let label = self.label(chunk.direction());
        let mut text = chunk_header(chunk, &label);
        text.push('\n');

        if self.options.hex_dump && !chunk.is_empty() {
            text.push_str(&hex_dump(chunk.data(), DUMP_INDENT));
            text.push('\n');
        }

        let mut frames = 0;
        if self.options.decode_frames {
            for frame in FrameScanner::new(chunk.data()) {
                text.push_str(FRAME_INDENT);
                text.push_str(&frame_summary(&label, &frame));
                text.push('\n');
                frames += 1;
            }
        }

        self.emit(&text);
        frames
    }

    /// Write a free-form notice line, e.g. on connection close
    pub fn notice(&mut self, message: &str) {
        let mut text = String::with_capacity(message.len() + 1);
        text.push_str(message);
        text.push('\n');
        self.emit(&text);
    }

    fn emit(&mut self, text: &str) {
        let result = self
            .writer
            .write_all(text.as_bytes())
            .and_then(|_| self.writer.flush());

        if let Err(e) = result {
            if !self.write_failed {
                debug!("Diagnostic output failed, further failures are ignored: {}", e);
                self.write_failed = true;
            }
        }
    }
}
