//! Frame length encoding at the 7-bit, 16-bit and 64-bit boundaries.

use m2_connections::http::websocket::{decode_length, encode_frame, FrameHeader, Opcode};
use m2_connections::http::CodecError;

fn header_len(frame: &[u8]) -> usize {
    decode_length(frame).unwrap().1
}

#[test]
fn short_payload_uses_one_length_byte() {
    let payload = vec![b'a'; 125];
    let frame = encode_frame(&payload, Opcode::Text, 0);

    assert_eq!(frame[0], 0x81);
    assert_eq!(frame[1], 125);
    assert_eq!(frame.len(), 2 + 125);
    assert_eq!(decode_length(&frame).unwrap(), (125, 2));
}

#[test]
fn medium_payload_uses_sixteen_bit_length() {
    for len in [126usize, 65535] {
        let payload = vec![0u8; len];
        let frame = encode_frame(&payload, Opcode::Binary, 0);

        assert_eq!(frame[0], 0x82);
        assert_eq!(frame[1], 126);
        assert_eq!(&frame[2..4], &(len as u16).to_be_bytes());
        assert_eq!(header_len(&frame), 4);
        assert_eq!(&frame[4..], &payload[..]);
    }
}

#[test]
fn large_payload_uses_sixty_four_bit_length() {
    let payload = vec![7u8; 65536];
    let frame = encode_frame(&payload, Opcode::Binary, 0);

    assert_eq!(frame[1], 127);
    assert_eq!(&frame[2..10], &[0, 0, 0, 0, 0, 1, 0, 0]);
    assert_eq!(decode_length(&frame).unwrap(), (65536, 10));
    assert_eq!(frame.len(), 10 + 65536);
}

#[test]
fn reserved_bits_land_above_the_opcode() {
    let frame = encode_frame(b"", Opcode::Text, 0b101);
    assert_eq!(frame[0], 0x80 | 0x50 | 0x01);

    let header = FrameHeader::from_byte(frame[0]).unwrap();
    assert!(header.fin);
    assert_eq!(header.rsvd, 0x50);
    assert_eq!(header.opcode, Opcode::Text);
}

#[test]
fn control_frames_decode_from_flags() {
    assert_eq!(FrameHeader::from_flags("0x88").unwrap().opcode, Opcode::Close);
    assert_eq!(FrameHeader::from_flags("89").unwrap().opcode, Opcode::Ping);
    assert!(matches!(
        FrameHeader::from_flags("0x83"),
        Err(CodecError::UnsupportedOpcode(3))
    ));
    assert!(matches!(
        FrameHeader::from_flags("zz"),
        Err(CodecError::InvalidFlags(_))
    ));
}

#[test]
fn truncated_extended_length_is_reported() {
    assert!(matches!(
        decode_length(&[0x82, 127, 0, 0]),
        Err(CodecError::Truncated { needed: 10, available: 4 })
    ));
}
