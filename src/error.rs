// Copyright (c) 2026-present, the rootlist-kv authors
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

/// Errors that can occur while reading the rootlist cache.
#[derive(Debug)]
pub enum Error {
    /// I/O error on a specific file.
    Io(std::io::Error),

    /// A `.ldb` file's footer magic did not match.
    NotATable,

    /// Malformed framing: out-of-range varint, bad restart offsets,
    /// shared-length overflow, or an unbalanced decompressed size.
    Corrupt(&'static str),

    /// A table block's compression tag was not one of the known values.
    UnsupportedCompression(u8),

    /// A table block is Snappy-compressed but no decompressor was supplied.
    SnappyMissing,

    /// Snappy decompression failed on a block that claimed to be compressed.
    SnappyFailed,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::NotATable => write!(f, "not a table file (footer magic mismatch)"),
            Self::Corrupt(msg) => write!(f, "corrupt data: {msg}"),
            Self::UnsupportedCompression(tag) => {
                write!(f, "unsupported block compression tag {tag}")
            }
            Self::SnappyMissing => {
                write!(f, "block is Snappy-compressed but Snappy is unavailable")
            }
            Self::SnappyFailed => write!(f, "Snappy decompression failed"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;
