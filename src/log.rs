// Copyright (c) 2026-present, the rootlist-kv authors
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Reader for `.log` write-ahead-log segments: 32 KiB physical blocks of
//! checksummed fragments, reassembled into logical batches of PUT/DELETE
//! operations.
//!
//! Log segments are unsorted, so [`LogReader::find`] is a full scan that
//! remembers the last matching PUT — "last wins" is what makes that scan
//! correct, since later writes in a segment have higher sequence numbers.

use std::io::Read;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::cursor::Cursor;
use crate::error::{Error, Result};

/// Size of a physical block. A fragment never crosses this boundary.
const BLOCK_SIZE: usize = 32 * 1024;

/// Size of a fragment header: `checksum:u32 ++ length:u16 ++ type:u8`.
const FRAGMENT_HEADER_LEN: usize = 7;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum FragmentType {
    Full,
    First,
    Middle,
    Last,
}

impl FragmentType {
    fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(Self::Full),
            2 => Some(Self::First),
            3 => Some(Self::Middle),
            4 => Some(Self::Last),
            _ => None,
        }
    }
}

/// One operation recorded in a batch.
#[derive(Clone, Debug)]
pub enum Operation {
    /// A write: key bound to value.
    Put { key: Vec<u8>, value: Vec<u8> },
    /// A tombstone for a key.
    Delete { key: Vec<u8> },
}

/// A logical record decoded from one or more fragments.
#[derive(Clone, Debug)]
pub struct Batch {
    /// Sequence number of the first operation in the batch.
    pub sequence: u64,
    /// The operations in this batch, in write order.
    pub operations: Vec<Operation>,
}

/// Reads fragments out of a log segment one physical block at a time,
/// tolerating a short last block and resyncing on a type-sequence
/// violation instead of failing the whole segment.
struct FragmentReader<R> {
    reader: R,
    block: Vec<u8>,
    pos: usize,
    exhausted: bool,
}

impl<R: Read> FragmentReader<R> {
    fn new(reader: R) -> Self {
        Self {
            reader,
            block: Vec::new(),
            pos: 0,
            exhausted: false,
        }
    }

    /// Loads the next physical block if the current one is exhausted.
    /// Returns `false` once the underlying file has no more data.
    fn ensure_block(&mut self) -> Result<bool> {
        if self.pos < self.block.len() {
            return Ok(true);
        }
        if self.exhausted {
            return Ok(false);
        }

        let mut buf = vec![0u8; BLOCK_SIZE];
        let mut filled = 0;
        loop {
            match self.reader.read(&mut buf[filled..])? {
                0 => break,
                n => filled += n,
            }
        }
        if filled < BLOCK_SIZE {
            self.exhausted = true;
        }
        buf.truncate(filled);
        self.block = buf;
        self.pos = 0;
        Ok(!self.block.is_empty())
    }

    /// Reads the next fragment, or `None` at true end-of-file. A block
    /// whose remaining space is smaller than a fragment header ends the
    /// block (the rest is padding); the reader silently moves to the
    /// next physical block.
    fn next_fragment(&mut self) -> Result<Option<(FragmentType, Vec<u8>)>> {
        loop {
            if !self.ensure_block()? {
                return Ok(None);
            }

            if self.block.len() - self.pos < FRAGMENT_HEADER_LEN {
                // Not enough room for another header: rest of the block
                // is trailer padding. Force a reload on the next call.
                self.pos = self.block.len();
                continue;
            }

            let header = &self.block[self.pos..self.pos + FRAGMENT_HEADER_LEN];
            let length = (&mut &header[4..6])
                .read_u16::<LittleEndian>()
                .expect("slice is exactly 2 bytes") as usize;
            let type_tag = header[6];

            let Some(frag_type) = FragmentType::from_tag(type_tag) else {
                log::warn!("log segment: unknown fragment type {type_tag}, skipping block");
                self.pos = self.block.len();
                continue;
            };

            let payload_start = self.pos + FRAGMENT_HEADER_LEN;
            let payload_end = payload_start + length;
            if payload_end > self.block.len() {
                log::warn!("log segment: fragment length overruns block, skipping block");
                self.pos = self.block.len();
                continue;
            }

            let payload = self.block[payload_start..payload_end].to_vec();
            self.pos = payload_end;
            return Ok(Some((frag_type, payload)));
        }
    }
}

/// A lazy sequence of batches read from one log segment file.
pub struct LogReader<R> {
    fragments: FragmentReader<R>,
}

impl<R: Read> LogReader<R> {
    /// Wraps a reader positioned at the start of a log segment.
    pub fn new(reader: R) -> Self {
        Self {
            fragments: FragmentReader::new(reader),
        }
    }

    /// Decodes and returns the next logical batch, resyncing past any
    /// type-sequence violation. Returns `None` once the segment is
    /// exhausted.
    pub fn next_batch(&mut self) -> Result<Option<Batch>> {
        let mut buffer: Vec<u8> = Vec::new();
        let mut in_progress = false;

        loop {
            let Some((frag_type, payload)) = self.fragments.next_fragment()? else {
                return Ok(None);
            };

            match frag_type {
                FragmentType::Full => {
                    return Some(decode_batch(&payload)).transpose();
                }
                FragmentType::First => {
                    if in_progress {
                        log::warn!("log segment: FIRST while a batch was in progress, resyncing");
                    }
                    buffer = payload;
                    in_progress = true;
                }
                FragmentType::Middle => {
                    if !in_progress {
                        log::warn!("log segment: MIDDLE with no preceding FIRST, discarding");
                        continue;
                    }
                    buffer.extend_from_slice(&payload);
                }
                FragmentType::Last => {
                    if !in_progress {
                        log::warn!("log segment: LAST with no preceding FIRST, discarding");
                        continue;
                    }
                    buffer.extend_from_slice(&payload);
                    return Some(decode_batch(&buffer)).transpose();
                }
            }
        }
    }

    /// Scans every batch and every PUT operation, returning the value
    /// last bound to `target_key`. Log segments are unsorted, so this is
    /// a full scan; "last wins" because later writes appear later in
    /// the segment.
    pub fn find(mut self, target_key: &[u8]) -> Result<Option<Vec<u8>>> {
        let mut found: Option<Vec<u8>> = None;

        while let Some(batch) = self.next_batch()? {
            for op in batch.operations {
                match op {
                    Operation::Put { key, value } if key == target_key => {
                        found = Some(value);
                    }
                    _ => {}
                }
            }
        }

        Ok(found)
    }
}

fn decode_batch(buffer: &[u8]) -> Result<Batch> {
    let mut cursor = Cursor::from_bytes(buffer.to_vec());
    let sequence = cursor.uint(8)?;
    let count = cursor.uint(4)?;

    let mut operations = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let tag = cursor.read_u8()?;
        let key_len = cursor.varint()? as usize;
        let key = cursor.read_exact(key_len)?.to_vec();

        match tag {
            1 => {
                let value_len = cursor.varint()? as usize;
                let value = cursor.read_exact(value_len)?.to_vec();
                operations.push(Operation::Put { key, value });
            }
            0 => operations.push(Operation::Delete { key }),
            _ => return Err(Error::Corrupt("log batch operation tag not in {0, 1}")),
        }
    }

    if !cursor.is_empty() {
        log::warn!(
            "log segment: {} trailing bytes after decoding batch, discarding",
            cursor.remaining()
        );
    }

    Ok(Batch { sequence, operations })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor as IoCursor;
    use test_log::test;

    fn encode_varint(mut v: u64, out: &mut Vec<u8>) {
        loop {
            let byte = (v & 0x7F) as u8;
            v >>= 7;
            if v == 0 {
                out.push(byte);
                break;
            }
            out.push(byte | 0x80);
        }
    }

    fn encode_batch(sequence: u64, ops: &[(u8, &[u8], Option<&[u8]>)]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&sequence.to_le_bytes());
        out.extend_from_slice(&(ops.len() as u32).to_le_bytes());
        for (tag, key, value) in ops {
            out.push(*tag);
            encode_varint(key.len() as u64, &mut out);
            out.extend_from_slice(key);
            if let Some(value) = value {
                encode_varint(value.len() as u64, &mut out);
                out.extend_from_slice(value);
            }
        }
        out
    }

    fn wrap_full_fragment(payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&0u32.to_le_bytes()); // checksum, not verified
        out.extend_from_slice(&(payload.len() as u16).to_le_bytes());
        out.push(1); // FULL
        out.extend_from_slice(payload);
        out
    }

    #[test]
    fn decodes_a_single_full_batch() {
        let batch = encode_batch(42, &[(1, b"key", Some(b"value"))]);
        let segment = wrap_full_fragment(&batch);

        let mut reader = LogReader::new(IoCursor::new(segment));
        let decoded = reader.next_batch().unwrap().unwrap();
        assert_eq!(decoded.sequence, 42);
        assert_eq!(decoded.operations.len(), 1);
        assert!(matches!(&decoded.operations[0], Operation::Put { key, value }
            if key == b"key" && value == b"value"));
        assert!(reader.next_batch().unwrap().is_none());
    }

    #[test]
    fn find_returns_last_matching_put() {
        let first = wrap_full_fragment(&encode_batch(1, &[(1, b"k", Some(b"old"))]));
        let second = wrap_full_fragment(&encode_batch(2, &[(1, b"k", Some(b"new"))]));
        let mut segment = first;
        segment.extend_from_slice(&second);

        let reader = LogReader::new(IoCursor::new(segment));
        let value = reader.find(b"k").unwrap();
        assert_eq!(value, Some(b"new".to_vec()));
    }

    #[test]
    fn find_returns_none_when_absent() {
        let segment = wrap_full_fragment(&encode_batch(1, &[(1, b"other", Some(b"v"))]));
        let reader = LogReader::new(IoCursor::new(segment));
        assert_eq!(reader.find(b"k").unwrap(), None);
    }

    #[test]
    fn first_middle_last_reassembles_one_batch() {
        let batch = encode_batch(7, &[(1, b"longkey", Some(b"longvalue"))]);
        let (first_half, second_half) = batch.split_at(batch.len() / 2);

        let mut segment = Vec::new();
        let mut header = |len: usize, ty: u8| -> Vec<u8> {
            let mut h = Vec::new();
            h.extend_from_slice(&0u32.to_le_bytes());
            h.extend_from_slice(&(len as u16).to_le_bytes());
            h.push(ty);
            h
        };
        segment.extend_from_slice(&header(first_half.len(), 2)); // FIRST
        segment.extend_from_slice(first_half);
        segment.extend_from_slice(&header(second_half.len(), 4)); // LAST
        segment.extend_from_slice(second_half);

        let mut reader = LogReader::new(IoCursor::new(segment));
        let decoded = reader.next_batch().unwrap().unwrap();
        assert_eq!(decoded.sequence, 7);
        assert!(matches!(&decoded.operations[0], Operation::Put { key, .. } if key == b"longkey"));
    }

    #[test]
    fn short_final_block_decodes_up_to_last_complete_fragment() {
        // A segment shorter than BLOCK_SIZE is a valid "last block".
        let batch = encode_batch(1, &[(1, b"k", Some(b"v"))]);
        let segment = wrap_full_fragment(&batch);
        assert!(segment.len() < BLOCK_SIZE);

        let mut reader = LogReader::new(IoCursor::new(segment));
        assert!(reader.next_batch().unwrap().is_some());
        assert!(reader.next_batch().unwrap().is_none());
    }
}
