//! Relay Protocol Types

use std::fmt;
use std::time::Duration;
use bytes::Bytes;

/// Direction a chunk travelled through the relay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    ClientToTarget,
    TargetToClient,
}

impl Direction {
    /// Build a display label such as `TOOL->QEMU` from the endpoint names
    pub fn label(self, client_name: &str, target_name: &str) -> String {
        match self {
            Direction::ClientToTarget => format!("{}->{}", client_name, target_name),
            Direction::TargetToClient => format!("{}->{}", target_name, client_name),
        }
    }

    /// The opposite direction
    pub fn reverse(self) -> Self {
        match self {
            Direction::ClientToTarget => Direction::TargetToClient,
            Direction::TargetToClient => Direction::ClientToTarget,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::ClientToTarget => write!(f, "client->target"),
            Direction::TargetToClient => write!(f, "target->client"),
        }
    }
}

/// Bytes returned by a single read, tagged with direction and session time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    direction: Direction,
    elapsed: Duration,
    data: Bytes,
}

impl Chunk {
    /// Create a new chunk
    pub fn new(direction: Direction, elapsed: Duration, data: Bytes) -> Self {
        Self { direction, elapsed, data }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Time since session start at which the chunk was read
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// A FEED/BEEF frame decoded from a chunk.
///
/// The payload borrows from the scanned buffer. `declared_length` is the
/// value carried in the header and is not checked against the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    pub protocol: u16,
    pub declared_length: u16,
    pub payload: &'a [u8],
    /// Offset of the header within the scanned buffer
    pub offset: usize,
    /// Total span from header start through trailer end
    pub len: usize,
}

impl Frame<'_> {
    /// Payload rendered as lowercase hex
    pub fn payload_hex(&self) -> String {
        hex::encode(self.payload)
    }

    /// Whether the declared length matches the bytes actually found
    pub fn length_matches(&self) -> bool {
        usize::from(self.declared_length) == self.payload.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_labels() {
        assert_eq!(Direction::ClientToTarget.label("TOOL", "QEMU"), "TOOL->QEMU");
        assert_eq!(Direction::TargetToClient.label("TOOL", "QEMU"), "QEMU->TOOL");
        assert_eq!(Direction::ClientToTarget.reverse(), Direction::TargetToClient);
    }

    #[test]
    fn test_chunk_accessors() {
        let chunk = Chunk::new(
            Direction::TargetToClient,
            Duration::from_millis(1500),
            Bytes::from_static(b"abc"),
        );
        assert_eq!(chunk.direction(), Direction::TargetToClient);
        assert_eq!(chunk.elapsed(), Duration::from_millis(1500));
        assert_eq!(chunk.data(), b"abc");
        assert_eq!(chunk.len(), 3);
        assert!(!chunk.is_empty());
    }

    #[test]
    fn test_frame_payload_hex() {
        let frame = Frame {
            protocol: 0x1234,
            declared_length: 2,
            payload: &[0xAA, 0xBB],
            offset: 0,
            len: 10,
        };
        assert_eq!(frame.payload_hex(), "aabb");
        assert!(frame.length_matches());
    }
}
