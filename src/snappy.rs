// Copyright (c) 2026-present, the rootlist-kv authors
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Single-shot Snappy decompression, made pluggable so a caller can make
//! Snappy support unavailable a first-class value instead of a crash.
//!
//! Each codec a table block can claim is an explicit, matched tag; this
//! reader only ever needs to decide whether the one codec it knows about,
//! Snappy, is wired in or absent.

use crate::error::{Error, Result};

/// A pluggable single-shot decompressor. The default implementation
/// ([`SnapDecompressor`]) wraps the `snap` crate; tests can supply a
/// stub to exercise [`Error::SnappyMissing`] / [`Error::SnappyFailed`]
/// without a real compressed fixture.
pub trait Decompressor {
    /// Decompresses a single Snappy frame.
    fn decompress(&self, bytes: &[u8]) -> Result<Vec<u8>>;
}

/// Decompresses using the `snap` crate (the ecosystem's Snappy
/// implementation).
#[derive(Debug, Default, Clone, Copy)]
pub struct SnapDecompressor;

impl Decompressor for SnapDecompressor {
    fn decompress(&self, bytes: &[u8]) -> Result<Vec<u8>> {
        snap::raw::Decoder::new()
            .decompress_vec(bytes)
            .map_err(|_| Error::SnappyFailed)
    }
}

impl<T: Decompressor + ?Sized> Decompressor for &T {
    fn decompress(&self, bytes: &[u8]) -> Result<Vec<u8>> {
        (**self).decompress(bytes)
    }
}

/// First-class "no Snappy available" value: a table reader configured
/// with this decompressor turns any Snappy-tagged block into a clean
/// [`Error::SnappyMissing`] instead of panicking.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSnappy;

impl Decompressor for NoSnappy {
    fn decompress(&self, _bytes: &[u8]) -> Result<Vec<u8>> {
        Err(Error::SnappyMissing)
    }
}
