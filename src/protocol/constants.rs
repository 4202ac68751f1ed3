//! FEED/BEEF Framing Constants

// Frame delimiters
pub const FRAME_HEADER: [u8; 2] = [0xFE, 0xED];
pub const FRAME_TRAILER: [u8; 2] = [0xBE, 0xEF];

// Field offsets within a frame, measured from the first header byte
pub const FRAME_PROTOCOL_OFFSET: usize = 2;
pub const FRAME_LENGTH_OFFSET: usize = 4;
pub const FRAME_PAYLOAD_OFFSET: usize = 6;

// Field widths
pub const FRAME_MARKER_LEN: usize = 2;
pub const FRAME_PROTOCOL_LEN: usize = 2;
pub const FRAME_LENGTH_LEN: usize = 2;

/// Shortest span (header + protocol + length) that is decoded as a frame.
pub const FRAME_MIN_LEN: usize = FRAME_MARKER_LEN + FRAME_PROTOCOL_LEN + FRAME_LENGTH_LEN;
