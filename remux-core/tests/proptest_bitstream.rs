//! Property-based tests for bitstream operations.
//!
//! Uses proptest to verify round-trip correctness of the BitReader and the
//! emulation prevention codec.

use proptest::prelude::*;
use remux_core::bitstream::{
    add_emulation_prevention, find_start_code, remove_emulation_prevention, BitReader,
};

proptest! {
    /// Escaping then unescaping arbitrary bytes is the identity.
    #[test]
    fn roundtrip_emulation_prevention(data in proptest::collection::vec(any::<u8>(), 0..512)) {
        let escaped = add_emulation_prevention(&data);
        prop_assert_eq!(remove_emulation_prevention(&escaped), data);
    }

    /// Zero-heavy payloads (the pathological case) round-trip too.
    #[test]
    fn roundtrip_emulation_prevention_zero_runs(
        data in proptest::collection::vec(0u8..4, 0..512)
    ) {
        let escaped = add_emulation_prevention(&data);
        prop_assert_eq!(remove_emulation_prevention(&escaped), data);
    }

    /// Escaped data never contains a start code.
    #[test]
    fn escaped_data_has_no_start_code(data in proptest::collection::vec(any::<u8>(), 0..512)) {
        let escaped = add_emulation_prevention(&data);
        prop_assert!(find_start_code(&escaped).is_none());
    }

    /// Reading back bits written MSB-first recovers the value.
    #[test]
    fn read_bits_matches_manual_pack(value in any::<u32>(), width in 1u8..=32) {
        let masked = if width == 32 { value } else { value & ((1u32 << width) - 1) };
        let packed = (u64::from(masked) << (64 - u64::from(width))).to_be_bytes();

        let mut reader = BitReader::new(&packed);
        prop_assert_eq!(reader.read_bits(width).unwrap(), masked);
    }

    /// Skipping n bits lands the reader on the right position.
    #[test]
    fn skip_advances_position(
        data in proptest::collection::vec(any::<u8>(), 1..64),
        n in 0usize..256
    ) {
        let mut reader = BitReader::new(&data);
        let total = reader.total_bits();
        if n <= total {
            reader.skip(n).unwrap();
            prop_assert_eq!(reader.position(), n);
        } else {
            prop_assert!(reader.skip(n).is_err());
        }
    }
}
