// Copyright (c) 2026-present, the rootlist-kv authors
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! A positioned reader over an owned byte buffer, with bounded sub-views,
//! fixed-width little-endian integers and base-128 varints.
//!
//! Every on-disk structure this crate reads (log fragments, table blocks,
//! the footer) is first materialized into an owned `Vec<u8>` — a whole
//! physical block, a whole decompressed table block, or the tail of a
//! file — and then walked with a [`Cursor`]. This keeps the framing code
//! independent of whatever read the bytes in (a file, a slice, a
//! decompression buffer).

use byteorder::{LittleEndian, ReadBytesExt};

use crate::error::{Error, Result};

/// Upper bound on the number of bytes a single varint may occupy. Seven
/// bits per byte, so 10 bytes covers any value up to `u64::MAX` with one
/// bit to spare.
const MAX_VARINT_BYTES: usize = 10;

/// A positioned reader over an owned byte buffer.
pub struct Cursor {
    bytes: Vec<u8>,
    pos: usize,
}

impl Cursor {
    /// Wraps an owned buffer, positioned at the start.
    #[must_use]
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes, pos: 0 }
    }

    /// Current absolute position.
    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Number of bytes left to read.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    /// Total size of the underlying buffer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether there are no bytes left to read.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Seeks to an absolute offset. Seeking past the end is allowed (it
    /// just leaves `remaining() == 0`); later reads will fail.
    pub fn seek(&mut self, pos: usize) {
        self.pos = pos.min(self.bytes.len());
    }

    /// Reads exactly `n` bytes and advances the cursor.
    pub fn read_exact(&mut self, n: usize) -> Result<&[u8]> {
        if n > self.remaining() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "cursor read past end of buffer",
            )));
        }
        let start = self.pos;
        self.pos += n;
        Ok(&self.bytes[start..self.pos])
    }

    /// Reads a single byte.
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_exact(1)?[0])
    }

    /// Reads a fixed-width little-endian unsigned integer of `n` bytes,
    /// `n` in `{1, 2, 4, 7, 8}`, into a `u64`.
    pub fn uint(&mut self, n: usize) -> Result<u64> {
        let bytes = self.read_exact(n)?;
        Ok((&mut &bytes[..]).read_uint::<LittleEndian>(n)?)
    }

    /// Reads a base-128 little-endian varint (MSB continuation bit).
    /// Caps at [`MAX_VARINT_BYTES`] bytes to guard against a runaway
    /// continuation chain in corrupt input.
    pub fn varint(&mut self) -> Result<u64> {
        let mut result: u64 = 0;
        let mut shift = 0u32;
        for _ in 0..MAX_VARINT_BYTES {
            let byte = self.read_u8()?;
            result |= u64::from(byte & 0x7F) << shift;
            if byte & 0x80 == 0 {
                return Ok(result);
            }
            shift += 7;
        }
        Err(Error::Corrupt("varint did not terminate within 10 bytes"))
    }

    /// Returns a cursor over the next `min(n, remaining())` bytes and
    /// advances this cursor past them.
    pub fn sub_view(&mut self, n: usize) -> Result<Cursor> {
        let take = n.min(self.remaining());
        let bytes = self.read_exact(take)?.to_vec();
        Ok(Cursor::from_bytes(bytes))
    }

    /// Consumes the cursor, returning the bytes from the current
    /// position to the end.
    #[must_use]
    pub fn into_remaining(mut self) -> Vec<u8> {
        self.bytes.split_off(self.pos)
    }
}
