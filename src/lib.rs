// Copyright (c) 2026-present, the rootlist-kv authors
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! A read-only reader for a desktop music client's on-disk rootlist
//! cache — the playlist/folder hierarchy a user has arranged, stored
//! inside an embedded LevelDB-style key-value store alongside a lot of
//! other cached state this crate never touches.
//!
//! This is not a general-purpose LSM-tree or LevelDB implementation:
//! there is no write path, no compaction, and no iterator beyond what
//! it takes to locate one specific key. It only knows enough of the
//! on-disk format to find that key's current value and decode it.
//!
//! # Example usage
//!
//! ```no_run
//! use rootlist_kv::{extract_rootlist, decode_rootlist};
//!
//! # fn main() -> rootlist_kv::Result<()> {
//! let cache_dir = std::path::Path::new("/path/to/PersistentCache/Storage");
//! let (user, raw_value) = extract_rootlist(cache_dir, None)?;
//!
//! if let (Some(user), Some(raw_value)) = (user, raw_value) {
//!     let tree = decode_rootlist(&raw_value, &user);
//!     println!("{tree:#?}");
//! }
//! # Ok(())
//! # }
//! ```

mod block;
mod cursor;
pub mod config;
mod error;
mod key;
mod locator;
mod log;
pub mod platform;
mod rootlist;
mod snappy;
mod table;

pub use config::{Config, ConfiguredDecompressor, SnappyBackend};
pub use error::{Error, Result};
pub use locator::{extract_rootlist, extract_rootlist_with_config, infer_username, rootlist_key};
pub use platform::{default_cache_path, list_users, Platform};
pub use rootlist::{decode_rootlist, Node};
pub use snappy::{Decompressor, NoSnappy, SnapDecompressor};
pub use table::TableReader;

pub use crate::log::{LogReader, Operation};
