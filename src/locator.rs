// Copyright (c) 2026-present, the rootlist-kv authors
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Finds the rootlist key's value across a cache directory's log
//! segments and tables.
//!
//! Walks newest-first so the first hit is already the most recent
//! write, without needing to compare sequence numbers across file
//! kinds: within a file the readers already resolve to the latest
//! value, and the first *file* to yield a hit is by construction the
//! most recently touched one.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use walkdir::WalkDir;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::log::LogReader;
use crate::snappy::Decompressor;
use crate::table::TableReader;

/// Builds the literal rootlist key for a username.
#[must_use]
pub fn rootlist_key(username: &str) -> Vec<u8> {
    let mut key = b"!pl#slc#\x1dspotify:user:".to_vec();
    key.extend_from_slice(username.as_bytes());
    key.extend_from_slice(b":rootlist#");
    key
}

/// Infers a username from a path: the first path segment (leaf to root)
/// ending in `-user` contributes the username, everything before the
/// final `-`.
#[must_use]
pub fn infer_username(path: &Path) -> Option<String> {
    path.components().rev().find_map(|component| {
        let segment = component.as_os_str().to_str()?;
        let username = segment.strip_suffix("-user")?;
        if username.is_empty() {
            None
        } else {
            Some(username.to_string())
        }
    })
}

/// Resolves the root directory to scan: `<cache>/<hint>-user` when a
/// hint is given, else `cache_dir` itself.
fn candidate_root(cache_dir: &Path, user_hint: Option<&str>) -> PathBuf {
    match user_hint {
        Some(hint) => cache_dir.join(format!("{hint}-user")),
        None => cache_dir.to_path_buf(),
    }
}

/// Walks `root` recursively, returning regular files sorted by
/// last-modified time descending. An I/O error reading one entry's
/// metadata never aborts the scan.
fn files_newest_first(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<(PathBuf, SystemTime)> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    log::warn!("rootlist locator: skipping directory entry: {e}");
                    return None;
                }
            };
            if !entry.file_type().is_file() {
                return None;
            }
            let modified = match entry.metadata().and_then(|m| m.modified()) {
                Ok(m) => m,
                Err(e) => {
                    log::warn!("rootlist locator: skipping {:?}: {e}", entry.path());
                    return None;
                }
            };
            Some((entry.into_path(), modified))
        })
        .collect();

    files.sort_by(|a, b| b.1.cmp(&a.1));
    files.into_iter().map(|(path, _)| path).collect()
}

/// Extracts the raw rootlist value bytes for `user_hint` (or the first
/// inferable user, in a per-user layout) from `cache_dir`, using the
/// default [`Config`] (real Snappy, default max value size). Returns
/// `(resolved_user, raw_value)`; either half may be absent if nothing
/// was found.
pub fn extract_rootlist(
    cache_dir: &Path,
    user_hint: Option<&str>,
) -> Result<(Option<String>, Option<Vec<u8>>)> {
    extract_rootlist_with_config(cache_dir, user_hint, &Config::default())
}

/// As [`extract_rootlist`], but with an explicit [`Config`] controlling
/// which decompressor table reads use and the cap on how large a
/// returned value may be before it is treated as corrupt (and the file
/// skipped, same as any other per-file tolerated failure).
pub fn extract_rootlist_with_config(
    cache_dir: &Path,
    user_hint: Option<&str>,
    config: &Config,
) -> Result<(Option<String>, Option<Vec<u8>>)> {
    let root = candidate_root(cache_dir, user_hint);
    let files = files_newest_first(&root);
    let decompressor = config.decompressor();

    for extension in ["log", "ldb"] {
        for path in files.iter().filter(|p| has_extension(p, extension)) {
            let username = match user_hint {
                Some(hint) => hint.to_string(),
                None => match infer_username(path) {
                    Some(u) => u,
                    None => continue,
                },
            };
            let target_key = rootlist_key(&username);

            let value = match extension {
                "log" => read_log_file(path, &target_key),
                _ => read_table_file(path, &target_key, &decompressor),
            };

            match value.and_then(|v| check_max_value_size(v, config.max_value_size)) {
                Ok(Some(value)) => return Ok((Some(username), Some(value))),
                Ok(None) => {}
                Err(e) if config.fail_fast => return Err(e),
                Err(e) => {
                    log::warn!("rootlist locator: skipping {path:?}: {e}");
                }
            }
        }
    }

    Ok((None, None))
}

fn check_max_value_size(
    value: Option<Vec<u8>>,
    max_value_size: usize,
) -> Result<Option<Vec<u8>>> {
    match value {
        Some(v) if v.len() > max_value_size => Err(Error::Corrupt(
            "rootlist value exceeds the configured maximum size",
        )),
        other => Ok(other),
    }
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(extension)
}

fn read_log_file(path: &Path, target_key: &[u8]) -> Result<Option<Vec<u8>>> {
    let file = File::open(path)?;
    LogReader::new(file).find(target_key)
}

fn read_table_file(
    path: &Path,
    target_key: &[u8],
    decompressor: &impl Decompressor,
) -> Result<Option<Vec<u8>>> {
    let file = File::open(path)?;
    let file_size = file.metadata()?.len();
    let mut reader = TableReader::new(file, file_size, decompressor)?;
    reader.find(target_key)
}
