// Copyright (c) 2026-present, the rootlist-kv authors
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Internal keys and the store's custom comparator.
//!
//! Every stored key is a user key plus an 8-byte trailer recording how
//! it was written and when; the comparator that orders these keys on
//! disk treats one in-band byte specially, which is why it lives here
//! rather than behind the default byte-string ordering.

use byteorder::{LittleEndian, ReadBytesExt};

use crate::error::{Error, Result};

/// The 8-byte trailer layout: 1 byte of value type, 7 bytes of
/// little-endian sequence number.
const TRAILER_LEN: usize = 8;

/// The kind of mutation an internal key's trailer records.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ValueType {
    /// A deletion (tombstone).
    Delete,
    /// A value write.
    Put,
}

impl ValueType {
    fn from_tag(tag: u8) -> Result<Self> {
        match tag {
            0 => Ok(Self::Delete),
            1 => Ok(Self::Put),
            _ => Err(Error::Corrupt("internal key value_type not in {0, 1}")),
        }
    }
}

/// A parsed internal key: `user_key ++ trailer(value_type, seq)`.
#[derive(Clone, Debug)]
pub struct InternalKey<'a> {
    /// The bytes of the internal key, trailer included.
    pub bytes: &'a [u8],
}

impl<'a> InternalKey<'a> {
    /// Parses an internal key. Panics if `bytes.len() < 8`: this is a
    /// programmer-invariant violation, not a tolerated per-file
    /// corruption, since it can only happen if a caller handed us
    /// something that was never framed as an internal key to begin
    /// with.
    #[must_use]
    pub fn parse(bytes: &'a [u8]) -> Self {
        assert!(
            bytes.len() >= TRAILER_LEN,
            "internal key shorter than the 8-byte trailer"
        );
        Self { bytes }
    }

    /// The user key: everything before the trailer.
    #[must_use]
    pub fn user_key(&self) -> &'a [u8] {
        &self.bytes[..self.bytes.len() - TRAILER_LEN]
    }

    /// The value type from the trailer.
    pub fn value_type(&self) -> Result<ValueType> {
        let tag = self.bytes[self.bytes.len() - TRAILER_LEN];
        ValueType::from_tag(tag)
    }

    /// The 56-bit sequence number from the trailer, little-endian.
    #[must_use]
    pub fn sequence(&self) -> u64 {
        let trailer = &self.bytes[self.bytes.len() - TRAILER_LEN + 1..];
        (&mut &trailer[..])
            .read_uint::<LittleEndian>(trailer.len())
            .expect("trailer is exactly 7 bytes")
    }
}

/// The in-band group separator byte. Sorts after all other bytes at the
/// same position in the store's custom comparator.
pub const GROUP_SEPARATOR: u8 = 0x1D;

/// `a <= b` under the store's comparator: identical to unsigned
/// byte-string order, except that [`GROUP_SEPARATOR`] sorts after every
/// other byte at the same position.
#[must_use]
pub fn less_or_equal(a: &[u8], b: &[u8]) -> bool {
    let shared = a.len().min(b.len());
    for i in 0..shared {
        let (x, y) = (a[i], b[i]);
        if x == y {
            continue;
        }
        if x == GROUP_SEPARATOR {
            // a[i] sorts after b[i] regardless of byte value: a > b.
            return false;
        }
        if y == GROUP_SEPARATOR {
            // a[i] sorts before b[i] regardless of byte value: a < b.
            return true;
        }
        return x < y;
    }
    // Shared prefix is equal: shorter string is not greater.
    a.len() <= b.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn less_or_equal_is_reflexive() {
        assert!(less_or_equal(b"abc", b"abc"));
    }

    #[test]
    fn less_or_equal_is_antisymmetric() {
        assert!(less_or_equal(b"abc", b"abd"));
        assert!(!less_or_equal(b"abd", b"abc"));
    }

    #[test]
    fn group_separator_sorts_after_non_separator_same_position() {
        assert!(!less_or_equal(b"ab\x1d", b"ab\x1e"));
        // less_or_equal("ab", "ab\x1d") is true (prefix is shorter).
        assert!(less_or_equal(b"ab", b"ab\x1d"));
    }

    #[test]
    fn shorter_prefix_is_not_greater() {
        assert!(less_or_equal(b"ab", b"abc"));
        assert!(!less_or_equal(b"abc", b"ab"));
    }

    #[test]
    fn internal_key_splits_user_key_and_trailer() {
        let mut bytes = b"hello".to_vec();
        bytes.extend_from_slice(&[1, 5, 0, 0, 0, 0, 0, 0]); // PUT, seq=5
        let key = InternalKey::parse(&bytes);
        assert_eq!(key.user_key(), b"hello");
        assert_eq!(key.value_type().unwrap(), ValueType::Put);
        assert_eq!(key.sequence(), 5);
    }

    #[test]
    #[should_panic]
    fn internal_key_shorter_than_trailer_panics() {
        let _ = InternalKey::parse(&[1, 2, 3]);
    }
}
