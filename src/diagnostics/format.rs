//! Text rendering for chunks and decoded frames

use std::fmt::Write as _;

use crate::protocol::{Chunk, Frame};

/// Bytes rendered on each hex dump line
pub const BYTES_PER_LINE: usize = 16;

/// Width the hex column is padded to; a full row of "xx " cells leaves one
/// spare column before the separator
const HEX_COLUMN_WIDTH: usize = BYTES_PER_LINE * 3;

/// Render `data` as hex dump lines of the form
/// `0010: 48 65 6c 6c 6f ...                      Hello`.
pub fn hex_dump_lines(data: &[u8]) -> Vec<String> {
    data.chunks(BYTES_PER_LINE)
        .enumerate()
        .map(|(index, row)| {
            let hex = row
                .iter()
                .map(|byte| format!("{:02x}", byte))
                .collect::<Vec<_>>()
                .join(" ");
            let ascii: String = row.iter().map(|&byte| printable(byte)).collect();
            format!(
                "{:04x}: {:<width$} {}",
                index * BYTES_PER_LINE,
                hex,
                ascii,
                width = HEX_COLUMN_WIDTH
            )
        })
        .collect()
}

/// Render `data` as a hex dump with every line prefixed by `indent`
pub fn hex_dump(data: &[u8], indent: &str) -> String {
    let mut out = String::new();
    for (i, line) in hex_dump_lines(data).iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(indent);
        out.push_str(line);
    }
    out
}

/// `[t=1.2s] CLIENT->TARGET: 10 bytes`
pub fn chunk_header(chunk: &Chunk, label: &str) -> String {
    format!(
        "[t={:.1}s] {}: {} bytes",
        chunk.elapsed().as_secs_f64(),
        label,
        chunk.len()
    )
}

/// `[CLIENT->TARGET] FRAME: proto=0x1234 len=2 payload=aabb`
pub fn frame_summary(label: &str, frame: &Frame<'_>) -> String {
    let mut line = String::with_capacity(48 + frame.payload.len() * 2);
    // Writing into a String cannot fail
    let _ = write!(
        line,
        "[{}] FRAME: proto=0x{:04x} len={} payload={}",
        label,
        frame.protocol,
        frame.declared_length,
        frame.payload_hex()
    );
    line
}

fn printable(byte: u8) -> char {
    if (0x20..0x7f).contains(&byte) {
        byte as char
    } else {
        '.'
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Direction;
    use bytes::Bytes;
    use std::time::Duration;

    #[test]
    fn test_seventeen_bytes_render_two_lines() {
        let data: Vec<u8> = (0x41..0x41 + 17).collect();
        let lines = hex_dump_lines(&data);

        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("0000: 41 42 43"));
        assert!(lines[1].starts_with("0010: 51 "));
        assert!(lines[1].ends_with(" Q"));

        // One hex byte on the second line, padded out to the ASCII column
        let hex_part = &lines[1]["0010: ".len().."0010: ".len() + HEX_COLUMN_WIDTH];
        assert_eq!(hex_part.trim_end(), "51");
    }

    #[test]
    fn test_columns_line_up() {
        let lines = hex_dump_lines(&[0u8; 20]);
        let ascii_col = |line: &str| line.rfind(' ').unwrap();
        assert_eq!(ascii_col(lines[0].as_str()), ascii_col(lines[1].as_str()));
        assert_eq!(lines[0].len(), "0000: ".len() + HEX_COLUMN_WIDTH + 1 + BYTES_PER_LINE);
    }

    #[test]
    fn test_ascii_column_position() {
        // "0000: " + 48 padded hex columns + one separator
        let single = hex_dump_lines(b"A");
        assert_eq!(single[0].find('A'), Some(55));
        assert_eq!(single[0], format!("0000: {:<48} A", "41"));

        let full = hex_dump_lines(b"0123456789abcdef");
        assert_eq!(full[0].find("0123"), Some(55));
        assert!(full[0].contains("65 66  0123"));
    }

    #[test]
    fn test_unprintable_bytes_become_dots() {
        let lines = hex_dump_lines(&[0x00, b'a', 0x7f, b'~', b' ', 0xff]);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].ends_with(" .a.~ ."));
    }

    #[test]
    fn test_empty_input() {
        assert!(hex_dump_lines(&[]).is_empty());
        assert_eq!(hex_dump(&[], "  "), "");
    }

    #[test]
    fn test_indent_applies_to_every_line() {
        let dump = hex_dump(&[0u8; 17], "    ");
        let lines: Vec<&str> = dump.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("    0000:"));
        assert!(lines[1].starts_with("    0010:"));
    }

    #[test]
    fn test_chunk_header() {
        let chunk = Chunk::new(
            Direction::ClientToTarget,
            Duration::from_millis(1260),
            Bytes::from_static(&[1, 2, 3]),
        );
        assert_eq!(chunk_header(&chunk, "TOOL->QEMU"), "[t=1.3s] TOOL->QEMU: 3 bytes");
    }

    #[test]
    fn test_frame_summary() {
        let frame = Frame {
            protocol: 0x1234,
            declared_length: 2,
            payload: &[0xAA, 0xBB],
            offset: 0,
            len: 10,
        };
        assert_eq!(
            frame_summary("QEMU->TOOL", &frame),
            "[QEMU->TOOL] FRAME: proto=0x1234 len=2 payload=aabb"
        );
    }
}
