//! Property tests for the frame codec

use mkbus_protocol::{
    Addressed, AddressedHeader, BusAddress, Compact, CompactHeader, Frame, FrameError,
    FrameParser, FRAME_END, MAX_BODY_SIZE,
};
use proptest::collection::vec;
use proptest::prelude::*;

/// Compact bodies never carry END
fn compact_body() -> impl Strategy<Value = std::vec::Vec<u8>> {
    vec(any::<u8>().prop_filter("not END", |b| *b != FRAME_END), 0..=MAX_BODY_SIZE)
}

fn addressed(address: [u8; 2], opcode: u8, body: &[u8]) -> Frame<Addressed> {
    Frame::new(AddressedHeader::new(BusAddress::new(address), opcode), body).unwrap()
}

proptest! {
    #[test]
    fn addressed_roundtrip(
        address in any::<[u8; 2]>(),
        opcode in any::<u8>(),
        body in vec(any::<u8>(), 0..=MAX_BODY_SIZE),
    ) {
        let frame = addressed(address, opcode, &body);
        let encoded = frame.encode_to_vec().unwrap();

        let decoded = Frame::<Addressed>::decode(&encoded).unwrap();
        prop_assert_eq!(decoded.header.address, BusAddress::new(address));
        prop_assert_eq!(decoded.header.opcode, opcode);
        prop_assert_eq!(decoded.body.as_slice(), body.as_slice());
        prop_assert_eq!(decoded, frame);
    }

    #[test]
    fn compact_roundtrip(
        code in any::<u8>(),
        from in any::<u8>(),
        to in any::<u8>(),
        body in compact_body(),
    ) {
        let header = CompactHeader { code, from, to };
        let frame = Frame::<Compact>::new(header, &body).unwrap();
        prop_assume!(frame.checksum != u16::from(FRAME_END));
        let encoded = frame.encode_to_vec().unwrap();

        let decoded = Frame::<Compact>::decode(&encoded).unwrap();
        prop_assert_eq!(decoded.header, header);
        prop_assert_eq!(decoded.body.as_slice(), body.as_slice());
    }

    #[test]
    fn parser_agrees_with_decode(
        address in any::<[u8; 2]>(),
        opcode in any::<u8>(),
        noise in vec(any::<u8>().prop_filter("not a start byte", |b| *b != b':'), 0..8),
        body in vec(any::<u8>(), 0..=MAX_BODY_SIZE),
    ) {
        let frame = addressed(address, opcode, &body);
        let encoded = frame.encode_to_vec().unwrap();

        let mut parser = FrameParser::<Addressed>::new();
        prop_assert_eq!(parser.feed_bytes(&noise), Ok(None));
        let parsed = parser.feed_bytes(&encoded).unwrap();
        prop_assert_eq!(parsed, Some(frame));
    }

    #[test]
    fn addressed_single_bit_flip_is_detected(
        address in any::<[u8; 2]>(),
        opcode in any::<u8>(),
        body in vec(any::<u8>(), 0..=MAX_BODY_SIZE),
        position in any::<usize>(),
        bit in 0u8..8,
    ) {
        let frame = addressed(address, opcode, &body);
        let mut encoded = frame.encode_to_vec().unwrap();

        // Anything between the delimiters
        let index = 1 + position % (encoded.len() - 2);
        encoded[index] ^= 1 << bit;

        prop_assert_eq!(
            Frame::<Addressed>::decode(&encoded),
            Err(FrameError::InvalidChecksum)
        );
    }

    #[test]
    fn compact_single_bit_flip_is_detected(
        code in any::<u8>(),
        body in compact_body(),
        position in any::<usize>(),
        bit in 0u8..8,
    ) {
        let header = CompactHeader { code, from: 1, to: 2 };
        let frame = Frame::<Compact>::new(header, &body).unwrap();
        prop_assume!(frame.checksum != u16::from(FRAME_END));
        let mut encoded = frame.encode_to_vec().unwrap();

        let index = 1 + position % (encoded.len() - 2);
        encoded[index] ^= 1 << bit;

        prop_assert_eq!(
            Frame::<Compact>::decode(&encoded),
            Err(FrameError::InvalidChecksum)
        );
    }

    #[test]
    fn compact_end_in_body_never_encodes(
        code in any::<u8>(),
        mut body in vec(any::<u8>(), 0..MAX_BODY_SIZE),
        position in any::<usize>(),
    ) {
        let index = position % (body.len() + 1);
        body.insert(index, FRAME_END);

        let header = CompactHeader { code, from: 1, to: 2 };
        let frame = Frame::<Compact>::new(header, &body).unwrap();
        prop_assert_eq!(frame.encode_to_vec(), Err(FrameError::EndInPayload));
    }
}
