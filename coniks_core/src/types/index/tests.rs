// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Tests for index bit arithmetic

use super::*;
use proptest::prelude::*;

// Creates an index of 32 bytes from a u64, placing the bits at the front
// of the byte array (big-endian).
fn index_from_u64(input_int: u64) -> Index {
    let mut output_arr = [0u8; INDEX_BYTES];
    output_arr[..8].clone_from_slice(&input_int.to_be_bytes());
    Index(output_arr)
}

// This test checks direction_at on an index whose leading bits are
// logically "1010": descents should go right, left, right, left and then
// left for the remaining zero bits.
#[test]
fn test_direction_at_leading_bits() {
    let index = index_from_u64(0b1010u64 << 60);
    let expected = [
        Direction::Right,
        Direction::Left,
        Direction::Right,
        Direction::Left,
    ];
    for (depth, direction) in expected.iter().enumerate() {
        assert_eq!(
            *direction,
            index.direction_at(depth as u32),
            "direction_at({}) wrong for the leading bits 1010",
            depth
        );
    }
    for depth in 4u32..INDEX_BITS {
        assert_eq!(Direction::Left, index.direction_at(depth));
    }
}

#[test]
fn test_direction_at_last_bit() {
    let mut bytes = [0u8; INDEX_BYTES];
    bytes[INDEX_BYTES - 1] = 1;
    let index = Index(bytes);
    assert_eq!(Direction::Right, index.direction_at(INDEX_BITS - 1));
    assert_eq!(Direction::Left, index.direction_at(INDEX_BITS - 2));
    // out of range reads as zero
    assert_eq!(Direction::Left, index.direction_at(INDEX_BITS));
}

#[test]
fn test_shares_prefix() {
    let a = index_from_u64(0b10100000u64 << 56);
    let b = index_from_u64(0b10111111u64 << 56);
    assert!(a.shares_prefix(&b, 0));
    assert!(a.shares_prefix(&b, 3));
    assert!(!a.shares_prefix(&b, 4));
    assert!(!a.shares_prefix(&b, 9));
    assert!(a.shares_prefix(&a, INDEX_BITS));
}

#[test]
fn test_shares_prefix_across_byte_boundary() {
    let mut a = [0u8; INDEX_BYTES];
    let mut b = [0u8; INDEX_BYTES];
    a[1] = 0b1000_0000;
    b[1] = 0b0000_0000;
    assert!(Index(a).shares_prefix(&Index(b), 8));
    assert!(!Index(a).shares_prefix(&Index(b), 9));
}

#[test]
fn test_sibling_prefix() {
    // 010100... with len 3 becomes 011000...
    let index = index_from_u64(0b010100u64 << 58);
    let sibling = index.sibling_prefix(3);
    assert_eq!(index_from_u64(0b011000u64 << 58), sibling);

    // flipping the first bit
    let sibling = index.sibling_prefix(1);
    assert_eq!(index_from_u64(0b1u64 << 63), sibling);
}

proptest! {
    #[test]
    fn test_sibling_prefix_properties(bytes in any::<[u8; INDEX_BYTES]>(), len in 1u32..=INDEX_BITS) {
        let index = Index(bytes);
        let sibling = index.sibling_prefix(len);
        // agrees with the original up to the flipped bit
        prop_assert!(index.shares_prefix(&sibling, len - 1));
        // and disagrees on the flipped bit itself
        prop_assert!(!index.shares_prefix(&sibling, len));
        prop_assert_eq!(
            index.direction_at(len - 1).other(),
            sibling.direction_at(len - 1)
        );
        // everything after the flipped bit is zero padded
        for depth in len..INDEX_BITS {
            prop_assert_eq!(Direction::Left, sibling.direction_at(depth));
        }
    }

    #[test]
    fn test_shares_prefix_is_symmetric(a in any::<[u8; INDEX_BYTES]>(), b in any::<[u8; INDEX_BYTES]>(), len in 0u32..=INDEX_BITS) {
        let a = Index(a);
        let b = Index(b);
        prop_assert_eq!(a.shares_prefix(&b, len), b.shares_prefix(&a, len));
    }
}
