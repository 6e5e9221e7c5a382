//! Property-based tests for the LEB128 codec and OBU headers.

use proptest::prelude::*;
use remux_av1::{decode_leb128, encode_leb128, ObuHeader};

proptest! {
    /// decode(encode(n)) == n for all n below 2^56.
    #[test]
    fn roundtrip_leb128(value in 0u64..(1u64 << 56)) {
        let encoded = encode_leb128(value);
        prop_assert!(encoded.len() <= 8);
        let (decoded, consumed) = decode_leb128(&encoded).unwrap();
        prop_assert_eq!(decoded, value);
        prop_assert_eq!(consumed, encoded.len());
    }

    /// Trailing bytes after a terminated value are never consumed.
    #[test]
    fn decode_ignores_trailing_bytes(value in 0u64..(1u64 << 56), tail in any::<u8>()) {
        let mut encoded = encode_leb128(value);
        let expected_len = encoded.len();
        encoded.push(tail);
        let (decoded, consumed) = decode_leb128(&encoded).unwrap();
        prop_assert_eq!(decoded, value);
        prop_assert_eq!(consumed, expected_len);
    }

    /// OBU header parsing never panics and respects the forbidden/reserved bits.
    #[test]
    fn obu_header_parse_is_total(b0 in any::<u8>(), b1 in any::<u8>()) {
        let buf = [b0, b1];
        match ObuHeader::parse(&buf) {
            Ok((hdr, len)) => {
                prop_assert_eq!(b0 & 0x81, 0);
                prop_assert_eq!(len, if hdr.extension_flag { 2 } else { 1 });
                prop_assert_eq!(hdr.obu_type.code(), (b0 >> 3) & 0x0F);
            }
            Err(_) => prop_assert!(b0 & 0x81 != 0),
        }
    }
}
