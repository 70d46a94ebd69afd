// Copyright (c) 2026-present, the rootlist-kv authors
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! A small builder for the handful of knobs that are genuinely
//! configurable in a read-only reader: which Snappy backend a table
//! reader is given, whether a per-file read error aborts the whole
//! scan or is tolerated and logged, and a cap on how large a single
//! value is allowed to be before the reader gives up.

use crate::error::Result;
use crate::snappy::{Decompressor, NoSnappy, SnapDecompressor};

/// Default cap on a single value's size: 64 MiB. A rootlist is a
/// handful of kilobytes to a few megabytes even for large libraries;
/// this exists purely to defend against a corrupt length prefix
/// pointing at a huge allocation.
pub const DEFAULT_MAX_VALUE_SIZE: usize = 64 * 1024 * 1024;

/// Which Snappy backend a table reader should use for compression tag
/// 1. `Available` wraps the real `snap` crate; `Unavailable` is a
/// first-class stand-in that turns every Snappy-tagged block into a
/// clean [`crate::Error::SnappyMissing`] instead.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Default)]
pub enum SnappyBackend {
    /// Decompress Snappy blocks with the `snap` crate.
    #[default]
    Available,
    /// Treat Snappy as unavailable; any Snappy-tagged block errors.
    Unavailable,
}

/// The decompressor a [`Config`] resolves to: dispatches to whichever
/// concrete [`Decompressor`] the configured [`SnappyBackend`] selects.
#[derive(Clone, Copy, Debug)]
pub enum ConfiguredDecompressor {
    Snappy(SnapDecompressor),
    Unavailable(NoSnappy),
}

impl Decompressor for ConfiguredDecompressor {
    fn decompress(&self, bytes: &[u8]) -> Result<Vec<u8>> {
        match self {
            Self::Snappy(d) => d.decompress(bytes),
            Self::Unavailable(d) => d.decompress(bytes),
        }
    }
}

/// Reader configuration.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Upper bound on a single decoded value's length.
    pub max_value_size: usize,
    /// Which Snappy backend table reads use.
    pub snappy: SnappyBackend,
    /// When `true`, the first per-file error the locator hits aborts
    /// the whole scan with that error instead of logging it and
    /// moving on to the next file.
    pub fail_fast: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_value_size: DEFAULT_MAX_VALUE_SIZE,
            snappy: SnappyBackend::default(),
            fail_fast: false,
        }
    }
}

impl Config {
    /// Starts a builder with defaults.
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// The decompressor this configuration implies for table reads.
    #[must_use]
    pub fn decompressor(&self) -> ConfiguredDecompressor {
        match self.snappy {
            SnappyBackend::Available => ConfiguredDecompressor::Snappy(SnapDecompressor),
            SnappyBackend::Unavailable => ConfiguredDecompressor::Unavailable(NoSnappy),
        }
    }
}

/// Builder for [`Config`].
#[derive(Clone, Copy, Default)]
pub struct ConfigBuilder {
    max_value_size: Option<usize>,
    snappy: Option<SnappyBackend>,
    fail_fast: Option<bool>,
}

impl ConfigBuilder {
    /// Overrides the maximum value size.
    #[must_use]
    pub fn max_value_size(mut self, bytes: usize) -> Self {
        self.max_value_size = Some(bytes);
        self
    }

    /// Selects which Snappy backend table reads use.
    #[must_use]
    pub fn snappy(mut self, backend: SnappyBackend) -> Self {
        self.snappy = Some(backend);
        self
    }

    /// Sets whether a per-file read error aborts the whole locator
    /// scan (`true`) or is logged and tolerated (`false`, the default).
    #[must_use]
    pub fn fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = Some(fail_fast);
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> Config {
        let defaults = Config::default();
        Config {
            max_value_size: self.max_value_size.unwrap_or(defaults.max_value_size),
            snappy: self.snappy.unwrap_or(defaults.snappy),
            fail_fast: self.fail_fast.unwrap_or(defaults.fail_fast),
        }
    }
}
