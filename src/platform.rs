// Copyright (c) 2026-present, the rootlist-kv authors
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Platform-specific defaults: where the cache directory lives, and
//! which `-user` subdirectories are discoverable inside it.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// The host platform, as far as cache-path defaults are concerned.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Platform {
    Macos,
    Linux,
    Other,
}

impl Platform {
    /// The platform this binary was actually compiled for.
    #[must_use]
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Self::Macos
        } else if cfg!(target_os = "linux") {
            Self::Linux
        } else {
            Self::Other
        }
    }
}

/// The client's default persistent-cache root for a given platform, or
/// `None` if there is no known default (e.g. `Platform::Other`, or a
/// required environment variable/home directory is unavailable).
#[must_use]
pub fn default_cache_path(platform: Platform) -> Option<PathBuf> {
    let home = std::env::var_os("HOME").map(PathBuf::from);
    let xdg_cache_home = std::env::var_os("XDG_CACHE_HOME").map(PathBuf::from);
    cache_path_for(platform, home.as_deref(), xdg_cache_home.as_deref())
}

/// The pure computation behind [`default_cache_path`], taking `$HOME`
/// and `$XDG_CACHE_HOME` as explicit inputs so it can be tested without
/// mutating process-wide environment state.
fn cache_path_for(
    platform: Platform,
    home: Option<&Path>,
    xdg_cache_home: Option<&Path>,
) -> Option<PathBuf> {
    match platform {
        Platform::Macos => Some(
            home?.join("Library/Application Support/Spotify/PersistentCache/Storage"),
        ),
        Platform::Linux => {
            let cache_home = xdg_cache_home
                .map(Path::to_path_buf)
                .or_else(|| home.map(|home| home.join(".cache")))?;
            Some(cache_home.join("spotify/Storage"))
        }
        Platform::Other => None,
    }
}

/// Lists the usernames discoverable as `<cache_dir>/<user>-user`
/// subdirectories, newest-modified first. Tolerates per-entry I/O
/// errors by skipping the entry.
#[must_use]
pub fn list_users(cache_dir: &Path) -> Vec<String> {
    let mut entries: Vec<(String, SystemTime)> = match std::fs::read_dir(cache_dir) {
        Ok(dir) => dir
            .filter_map(|entry| {
                let entry = match entry {
                    Ok(e) => e,
                    Err(e) => {
                        log::warn!("user discovery: skipping entry in {cache_dir:?}: {e}");
                        return None;
                    }
                };
                let file_type = entry.file_type().ok()?;
                if !file_type.is_dir() {
                    return None;
                }
                let name = entry.file_name();
                let name = name.to_str()?;
                let username = name.strip_suffix("-user")?.to_string();
                let modified = entry.metadata().and_then(|m| m.modified()).ok()?;
                Some((username, modified))
            })
            .collect(),
        Err(e) => {
            log::warn!("user discovery: cannot read {cache_dir:?}: {e}");
            Vec::new()
        }
    };

    entries.sort_by(|a, b| b.1.cmp(&a.1));
    entries.into_iter().map(|(username, _)| username).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn linux_cache_path_prefers_xdg_cache_home() {
        let path = cache_path_for(
            Platform::Linux,
            Some(Path::new("/home/whoever")),
            Some(Path::new("/tmp/xdg-cache")),
        )
        .unwrap();
        assert_eq!(path, PathBuf::from("/tmp/xdg-cache/spotify/Storage"));
    }

    #[test]
    fn linux_cache_path_falls_back_to_home_dot_cache() {
        let path = cache_path_for(Platform::Linux, Some(Path::new("/home/whoever")), None).unwrap();
        assert_eq!(path, PathBuf::from("/home/whoever/.cache/spotify/Storage"));
    }

    #[test]
    fn macos_cache_path_is_under_application_support() {
        let path = cache_path_for(Platform::Macos, Some(Path::new("/Users/whoever")), None).unwrap();
        assert!(path.ends_with("Spotify/PersistentCache/Storage"));
        assert!(path.starts_with("/Users/whoever"));
    }

    #[test]
    fn other_platform_has_no_default() {
        assert_eq!(cache_path_for(Platform::Other, None, None), None);
    }

    #[test]
    fn list_users_sorts_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("alice-user")).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(10));
        std::fs::create_dir(dir.path().join("bob-user")).unwrap();

        let users = list_users(dir.path());
        assert_eq!(users, vec!["bob".to_string(), "alice".to_string()]);
    }

    #[test]
    fn list_users_ignores_non_user_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("scratch")).unwrap();
        std::fs::create_dir(dir.path().join("alice-user")).unwrap();

        assert_eq!(list_users(dir.path()), vec!["alice".to_string()]);
    }
}
