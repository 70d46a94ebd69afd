// Copyright (c) 2026-present, the rootlist-kv authors
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Reader for `.ldb` sorted-table files: footer → index block → data
//! blocks, restart-point prefix-compressed, optionally Snappy-compressed.
//!
//! The footer is a fixed-size trailer at the end of the file: read it,
//! validate its magic, and it hands you the handles needed to locate
//! every other block in the file without a separate index pass.

use std::io::{Read, Seek, SeekFrom};

use crate::block::Block;
use crate::cursor::Cursor;
use crate::error::{Error, Result};
use crate::key::{less_or_equal, InternalKey, ValueType};
use crate::snappy::Decompressor;

/// Size of the serialized footer.
const FOOTER_LEN: u64 = 48;

/// The 8-byte little-endian magic at the very end of a table file.
const MAGIC: u64 = 0xDB_4775_248B_80FB_57;

/// A `(offset, size)` pair of varints, pointing into the table file.
#[derive(Copy, Clone, Debug)]
struct BlockHandle {
    offset: u64,
    size: u64,
}

impl BlockHandle {
    fn decode(cursor: &mut Cursor) -> Result<Self> {
        let offset = cursor.varint()?;
        let size = cursor.varint()?;
        Ok(Self { offset, size })
    }
}

/// Parsed footer. The metaindex handle is read (to stay positioned
/// correctly) but discarded: nothing here ever needs the metaindex
/// block.
struct Footer {
    index_handle: BlockHandle,
}

impl Footer {
    fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < 8 {
            return Err(Error::NotATable);
        }

        let mut magic_cursor = Cursor::from_bytes(bytes[bytes.len() - 8..].to_vec());
        let magic = magic_cursor.uint(8)?;
        if magic != MAGIC {
            return Err(Error::NotATable);
        }

        let mut cursor = Cursor::from_bytes(bytes.to_vec());
        let _metaindex_handle = BlockHandle::decode(&mut cursor)?;
        let index_handle = BlockHandle::decode(&mut cursor)?;

        Ok(Self { index_handle })
    }
}

/// Reads one `.ldb` file: footer, index block, and on-demand data
/// blocks.
pub struct TableReader<F, D> {
    file: F,
    decompressor: D,
    index_handle: BlockHandle,
}

impl<F: Read + Seek, D: Decompressor> TableReader<F, D> {
    /// Opens a table reader over a file of known size, reading and
    /// validating the footer immediately.
    pub fn new(mut file: F, file_size: u64, decompressor: D) -> Result<Self> {
        if file_size < FOOTER_LEN {
            return Err(Error::NotATable);
        }

        file.seek(SeekFrom::Start(file_size - FOOTER_LEN))?;
        let mut footer_bytes = vec![0u8; FOOTER_LEN as usize];
        file.read_exact(&mut footer_bytes)?;
        let footer = Footer::decode(&footer_bytes)?;

        Ok(Self {
            file,
            decompressor,
            index_handle: footer.index_handle,
        })
    }

    /// Reads the block referenced by `handle`: payload bytes, a
    /// compression tag byte, a 4-byte checksum (not verified — tolerant
    /// read, same policy as the log reader), then optional
    /// decompression, then parsing into a restart-compressed stream.
    fn read_block(&mut self, handle: BlockHandle) -> Result<Block> {
        self.file.seek(SeekFrom::Start(handle.offset))?;

        let mut framed = vec![0u8; handle.size as usize + 5];
        self.file.read_exact(&mut framed)?;

        let payload = &framed[..handle.size as usize];
        let compression_tag = framed[handle.size as usize];
        // Trailing 4 bytes are the block checksum; not verified.

        let decompressed = match compression_tag {
            0 => payload.to_vec(),
            1 => self.decompressor.decompress(payload)?,
            other => return Err(Error::UnsupportedCompression(other)),
        };

        Block::parse(decompressed)
    }

    /// Walks the index in order; for each `(index_key, handle)` with
    /// `index_key.user_key() >= target_key` under the store's
    /// comparator, loads the referenced data block and scans it for an
    /// entry whose user key equals `target_key`. Because each data
    /// block's entries are newest-first for a given user key, the first
    /// matching entry is the current value — unless it's a DELETE
    /// tombstone, in which case it shadows every older write and the
    /// key counts as not found.
    pub fn find(&mut self, target_key: &[u8]) -> Result<Option<Vec<u8>>> {
        let index_block = self.read_block(self.index_handle)?;

        for entry in index_block.iter() {
            let entry = entry?;
            let index_user_key = InternalKey::parse(&entry.key).user_key();

            // Index keys are >= all user keys in their data block.
            // Skip blocks that are entirely below the target under the
            // store's comparator.
            if less_or_equal(index_user_key, target_key) && index_user_key != target_key {
                continue;
            }

            let mut handle_cursor = Cursor::from_bytes(entry.value);
            let data_handle = BlockHandle::decode(&mut handle_cursor)?;
            let data_block = self.read_block(data_handle)?;

            for data_entry in data_block.iter() {
                let data_entry = data_entry?;
                let internal = InternalKey::parse(&data_entry.key);
                if internal.user_key() == target_key {
                    return match internal.value_type()? {
                        ValueType::Put => Ok(Some(data_entry.value)),
                        ValueType::Delete => Ok(None),
                    };
                }
            }

            // The comparator guarantees no later block holds this key
            // once we've reached the first block whose index key is
            // >= target_key and found no match inside it.
            return Ok(None);
        }

        Ok(None)
    }
}

/// Helpers shared with other modules' tests (e.g. the locator's
/// end-to-end scan test) for building minimal, valid `.ldb` byte
/// strings without going through a real writer.
#[cfg(test)]
pub(crate) mod tests_support {
    use super::MAGIC;

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

    fn encode_internal_key(user_key: &[u8], value_type: u8, seq: u64) -> Vec<u8> {
        let mut out = user_key.to_vec();
        out.push(value_type);
        out.extend_from_slice(&seq.to_le_bytes()[..7]);
        out
    }

    fn block_bytes(key: &[u8], value: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        encode_varint(0, &mut out); // shared
        encode_varint(key.len() as u64, &mut out);
        encode_varint(value.len() as u64, &mut out);
        out.extend_from_slice(key);
        out.extend_from_slice(value);
        out.extend_from_slice(&0u32.to_le_bytes()); // restart at 0
        out.extend_from_slice(&1u32.to_le_bytes()); // num_restarts
        out
    }

    /// Builds a complete, uncompressed, single-row `.ldb` file binding
    /// `user_key` to `value`.
    pub(crate) fn build_single_row_table(user_key: &[u8], value: &[u8]) -> Vec<u8> {
        let data_payload = block_bytes(&encode_internal_key(user_key, 1, 1), value);
        let mut file = Vec::new();
        file.extend_from_slice(&data_payload);
        file.push(0); // no compression
        file.extend_from_slice(&0u32.to_le_bytes());
        let data_size = data_payload.len() as u64;

        let mut handle_bytes = Vec::new();
        encode_varint(0, &mut handle_bytes);
        encode_varint(data_size, &mut handle_bytes);

        let index_payload = block_bytes(&encode_internal_key(user_key, 1, 1), &handle_bytes);
        let index_offset = file.len() as u64;
        file.extend_from_slice(&index_payload);
        file.push(0);
        file.extend_from_slice(&0u32.to_le_bytes());
        let index_size = index_payload.len() as u64;

        let mut footer = Vec::new();
        encode_varint(0, &mut footer);
        encode_varint(0, &mut footer);
        encode_varint(index_offset, &mut footer);
        encode_varint(index_size, &mut footer);
        footer.resize(40, 0);
        footer.extend_from_slice(&MAGIC.to_le_bytes());
        file.extend_from_slice(&footer);

        file
    }
}
