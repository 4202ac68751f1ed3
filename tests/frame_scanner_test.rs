//! Tests for FEED/BEEF frame detection on whole chunks

use framerelay::protocol::{scan_frames, FrameScanner, FRAME_HEADER, FRAME_TRAILER};

fn frame(protocol: u16, payload: &[u8]) -> Vec<u8> {
    let mut bytes = FRAME_HEADER.to_vec();
    bytes.extend_from_slice(&protocol.to_be_bytes());
    bytes.extend_from_slice(&(payload.len() as u16).to_be_bytes());
    bytes.extend_from_slice(payload);
    bytes.extend_from_slice(&FRAME_TRAILER);
    bytes
}

#[test]
fn test_reference_frame() {
    let data = [0xFE, 0xED, 0x12, 0x34, 0x00, 0x02, 0xAA, 0xBB, 0xBE, 0xEF];
    let frames = scan_frames(&data);

    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].protocol, 0x1234);
    assert_eq!(frames[0].declared_length, 2);
    assert_eq!(frames[0].payload, &[0xAA, 0xBB]);
}

#[test]
fn test_back_to_back_frames_in_order() {
    let mut data = frame(0x0001, b"one");
    data.extend(frame(0x0002, b"two"));

    let frames = scan_frames(&data);
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0].protocol, 0x0001);
    assert_eq!(frames[0].payload, b"one");
    assert_eq!(frames[1].protocol, 0x0002);
    assert_eq!(frames[1].payload, b"two");
    assert_eq!(frames[1].offset, frames[0].offset + frames[0].len);
}

#[test]
fn test_frames_surrounded_by_noise() {
    let mut data = b"noise".to_vec();
    data.extend(frame(0x00AB, &[1, 2, 3]));
    data.extend_from_slice(b"\xBE\xEF more noise \xFE");
    data.extend(frame(0x00CD, &[]));
    data.extend_from_slice(b"tail");

    let protocols: Vec<u16> = FrameScanner::new(&data).map(|f| f.protocol).collect();
    assert_eq!(protocols, vec![0x00AB, 0x00CD]);
}

#[test]
fn test_scanning_resumes_after_trailer() {
    // The payload of the first frame contains a header; it must not start a new frame
    let data = [
        0xFE, 0xED, 0x00, 0x01, 0x00, 0x02, 0xFE, 0xED, 0xBE, 0xEF,
        0x00, 0x00, 0xBE, 0xEF,
    ];
    let frames = scan_frames(&data);

    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].payload, &[0xFE, 0xED]);
}

#[test]
fn test_unterminated_frame_stops_scan() {
    let mut data = frame(0x0001, b"ok");
    data.extend_from_slice(&[0xFE, 0xED, 0x00, 0x02, 0x00, 0x05, 0x01]);

    let frames = scan_frames(&data);
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].protocol, 0x0001);
}

#[test]
fn test_header_split_across_chunks_is_not_buffered() {
    let whole = frame(0x4242, b"split");
    let (first, second) = whole.split_at(4);

    assert!(scan_frames(first).is_empty());
    assert!(scan_frames(second).is_empty());
    assert_eq!(scan_frames(&whole).len(), 1);
}

#[test]
fn test_declared_length_is_not_validated() {
    let data = [0xFE, 0xED, 0x00, 0x07, 0x01, 0x00, 0x11, 0xBE, 0xEF];
    let frames = scan_frames(&data);

    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].declared_length, 0x0100);
    assert_eq!(frames[0].payload, &[0x11]);
    assert!(!frames[0].length_matches());
}

#[test]
fn test_scan_is_deterministic() {
    let mut data = frame(0x0102, b"abc");
    data.extend_from_slice(b"junk");
    data.extend(frame(0x0304, b"def"));

    let first = scan_frames(&data);
    let second = scan_frames(&data);
    assert_eq!(first, second);
    assert_eq!(first.len(), 2);
}
