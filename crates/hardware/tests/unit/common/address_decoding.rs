//! # Address Decoding Tests
//!
//! Verifies the tag/set/offset split and its inverse for several geometries,
//! including the reference layout (16K sets, 64-byte lines: 12-bit tag,
//! 14-bit index, 6-bit offset of a 32-bit address).

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rstest::rstest;
use splitcache_core::common::{AddressLayout, DecodedAddr};

#[rstest]
#[case(64, 2, 0x00, 0, 0, 0x00)]
#[case(64, 2, 0x80, 1, 0, 0x00)]
#[case(64, 2, 0x40, 0, 1, 0x00)]
#[case(64, 2, 0x1C5, 3, 1, 0x05)]
#[case(64, 16384, 0xFFFF_FFFF, 0xFFF, 0x3FFF, 0x3F)]
#[case(64, 16384, 0x1234_5678, 0x123, 0x1159, 0x38)]
#[case(32, 1, 0x7F, 3, 0, 0x1F)]
fn decode_known_addresses(
    #[case] line: usize,
    #[case] sets: usize,
    #[case] addr: u64,
    #[case] tag: u64,
    #[case] set: usize,
    #[case] offset: u64,
) {
    let layout = AddressLayout::new(line, sets);
    assert_eq!(layout.decode(addr), DecodedAddr { tag, set, offset });
}

/// Offsets within one block share tag and set.
#[test]
fn offsets_in_one_block_share_identity() {
    let layout = AddressLayout::new(64, 4);
    let base = layout.decode(0x1000);
    for off in 0..64 {
        let d = layout.decode(0x1000 + off);
        assert_eq!((d.tag, d.set), (base.tag, base.set));
        assert_eq!(d.offset, off);
    }
}

/// Consecutive blocks walk the sets before the tag advances.
#[test]
fn consecutive_blocks_cycle_through_sets() {
    let layout = AddressLayout::new(64, 4);
    let sets: Vec<usize> = (0..8).map(|i| layout.decode(i * 64).set).collect();
    assert_eq!(sets, vec![0, 1, 2, 3, 0, 1, 2, 3]);
    assert_eq!(layout.decode(4 * 64).tag, 1);
}

#[test]
fn encode_rebuilds_reference_example() {
    let layout = AddressLayout::new(64, 16384);
    assert_eq!(layout.encode(0x123, 0x1159, 0x38), 0x1234_5678);
}

proptest! {
    /// Reconstruction from (tag, set, offset) yields the original address.
    #[test]
    fn decode_encode_round_trip(
        addr in any::<u64>(),
        line_shift in 0u32..13,
        set_shift in 0u32..17,
    ) {
        let layout = AddressLayout::new(1 << line_shift, 1 << set_shift);
        let d = layout.decode(addr);
        prop_assert!(d.offset < layout.line_bytes());
        prop_assert!((d.set as u64) < layout.num_sets());
        prop_assert_eq!(layout.encode(d.tag, d.set, d.offset), addr);
    }
}
