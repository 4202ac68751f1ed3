//! Frame Scanner
//!
//! Finds FEED/BEEF frames inside a single buffer. Scanning is stateless across
//! buffers: a header whose trailer lands in a later read is not decoded.

use super::constants::*;
use super::types::Frame;

/// Iterator over the frames found in one buffer, in source order
#[derive(Debug, Clone)]
pub struct FrameScanner<'a> {
    data: &'a [u8],
    pos: usize,
    done: bool,
}

impl<'a> FrameScanner<'a> {
    /// Create a scanner over `data`
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            done: false,
        }
    }

    /// Decode the span `data[start..end]`, which begins with the header and
    /// ends with the trailer.
    fn decode(&self, start: usize, trailer_start: usize, end: usize) -> Frame<'a> {
        let data = self.data;
        let span = &data[start..end];
        let protocol = read_u16_be(span, FRAME_PROTOCOL_OFFSET);
        let declared_length = read_u16_be(span, FRAME_LENGTH_OFFSET);
        let payload_start = start + FRAME_PAYLOAD_OFFSET;
        let payload = if payload_start <= trailer_start {
            &data[payload_start..trailer_start]
        } else {
            &[]
        };

        Frame {
            protocol,
            declared_length,
            payload,
            offset: start,
            len: end - start,
        }
    }
}

impl<'a> Iterator for FrameScanner<'a> {
    type Item = Frame<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            let start = match find_marker(&self.data[self.pos..], &FRAME_HEADER) {
                Some(rel) => self.pos + rel,
                None => {
                    self.done = true;
                    break;
                }
            };

            let search_from = start + FRAME_MARKER_LEN;
            let trailer_start = match find_marker(&self.data[search_from..], &FRAME_TRAILER) {
                Some(rel) => search_from + rel,
                None => {
                    // Unterminated frame; the rest of the buffer is not scanned
                    self.done = true;
                    break;
                }
            };

            let end = trailer_start + FRAME_MARKER_LEN;
            self.pos = end;

            if end - start >= FRAME_MIN_LEN {
                return Some(self.decode(start, trailer_start, end));
            }
        }

        None
    }
}

/// Scan `data` and collect every frame it contains
pub fn scan_frames(data: &[u8]) -> Vec<Frame<'_>> {
    FrameScanner::new(data).collect()
}

fn find_marker(haystack: &[u8], marker: &[u8; 2]) -> Option<usize> {
    haystack.windows(marker.len()).position(|window| window == marker)
}

fn read_u16_be(span: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([span[offset], span[offset + 1]])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_frame() {
        let data = [0xFE, 0xED, 0x12, 0x34, 0x00, 0x02, 0xAA, 0xBB, 0xBE, 0xEF];
        let frames = scan_frames(&data);

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].protocol, 0x1234);
        assert_eq!(frames[0].declared_length, 2);
        assert_eq!(frames[0].payload, &[0xAA, 0xBB]);
        assert_eq!(frames[0].offset, 0);
        assert_eq!(frames[0].len, 10);
    }

    #[test]
    fn test_unmatched_header_yields_nothing() {
        let data = [0x00, 0xFE, 0xED, 0x12, 0x34, 0x00, 0x02, 0xAA];
        assert!(scan_frames(&data).is_empty());
    }

    #[test]
    fn test_empty_and_tiny_buffers() {
        assert!(scan_frames(&[]).is_empty());
        assert!(scan_frames(&[0xFE]).is_empty());
        assert!(scan_frames(&[0xFE, 0xED]).is_empty());
    }

    #[test]
    fn test_short_span_is_skipped_and_scanning_resumes() {
        // FE ED BE EF is too short to carry a frame, the next one still decodes
        let data = [
            0xFE, 0xED, 0xBE, 0xEF,
            0xFE, 0xED, 0x00, 0x01, 0x00, 0x00, 0xBE, 0xEF,
        ];
        let frames = scan_frames(&data);

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].protocol, 0x0001);
        assert_eq!(frames[0].offset, 4);
        assert!(frames[0].payload.is_empty());
    }

    #[test]
    fn test_trailer_inside_length_field() {
        // The trailer overlaps the length field: length reads as the trailer
        // bytes and the payload is empty.
        let data = [0xFE, 0xED, 0x12, 0x34, 0xBE, 0xEF];
        let frames = scan_frames(&data);

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].protocol, 0x1234);
        assert_eq!(frames[0].declared_length, 0xBEEF);
        assert!(frames[0].payload.is_empty());
    }

    #[test]
    fn test_seven_byte_span_has_empty_payload() {
        let data = [0xFE, 0xED, 0x12, 0x34, 0x00, 0xBE, 0xEF];
        let frames = scan_frames(&data);

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].declared_length, 0x00BE);
        assert!(frames[0].payload.is_empty());
    }

    #[test]
    fn test_iterator_is_lazy_and_restartable() {
        let data = [
            0xFE, 0xED, 0x00, 0x01, 0x00, 0x01, 0x11, 0xBE, 0xEF,
            0xFE, 0xED, 0x00, 0x02, 0x00, 0x01, 0x22, 0xBE, 0xEF,
        ];
        let mut scanner = FrameScanner::new(&data);
        assert_eq!(scanner.next().map(|f| f.protocol), Some(1));

        let restarted: Vec<u16> = FrameScanner::new(&data).map(|f| f.protocol).collect();
        assert_eq!(restarted, vec![1, 2]);

        assert_eq!(scanner.next().map(|f| f.protocol), Some(2));
        assert!(scanner.next().is_none());
        assert!(scanner.next().is_none());
    }
}
