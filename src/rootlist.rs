// Copyright (c) 2026-present, the rootlist-kv authors
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Decodes the raw rootlist value into a tree of folders and playlists.
//!
//! The value bytes are a semi-documented, protobuf-adjacent stream.
//! This parser is deliberately tolerant: it auto-closes unbalanced
//! groups and ignores trailing bytes rather than failing.

#[cfg(feature = "cli")]
use serde::Serialize;

/// A node in the rootlist tree: either a playlist leaf or a folder with
/// ordered children. The root is always a folder with no name or uri.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(Serialize))]
#[cfg_attr(feature = "cli", serde(tag = "type", rename_all = "lowercase"))]
pub enum Node {
    /// A single playlist reference.
    Playlist {
        /// The playlist's `spotify:playlist:...` URI.
        uri: String,
    },
    /// A folder: an ordered list of playlists and nested folders.
    Folder {
        /// Folder display name; absent for the root.
        #[cfg_attr(feature = "cli", serde(skip_serializing_if = "Option::is_none"))]
        name: Option<String>,
        /// Folder URI (`spotify:user:<id>:folder:<16-hex>`); absent for
        /// the root.
        #[cfg_attr(feature = "cli", serde(skip_serializing_if = "Option::is_none"))]
        uri: Option<String>,
        /// Ordered children.
        children: Vec<Node>,
    },
}

impl Node {
    fn empty_folder() -> Self {
        Self::Folder {
            name: None,
            uri: None,
            children: Vec::new(),
        }
    }

    fn children_mut(&mut self) -> &mut Vec<Node> {
        match self {
            Self::Folder { children, .. } => children,
            Self::Playlist { .. } => unreachable!("only folders hold children"),
        }
    }

    /// Recursively searches for the first folder whose `uri` ends with
    /// `folder_id`, in document order.
    #[must_use]
    pub fn find_folder(&self, folder_id: &str) -> Option<&Node> {
        match self {
            Self::Folder { uri, children, .. } => {
                if uri.as_deref().is_some_and(|u| u.ends_with(folder_id)) {
                    return Some(self);
                }
                children.iter().find_map(|child| child.find_folder(folder_id))
            }
            Self::Playlist { .. } => None,
        }
    }
}

/// The marker the producer writes between records, preceded by
/// `"spotify:"`, that this parser splits on.
const MARKERS: [u8; 3] = [b'p', b's', b'e'];

/// The framing byte the producer emits between records; this parser
/// truncates each row at the first occurrence. This is a protobuf
/// field tag read heuristically as a terminator.
const RECORD_TERMINATOR: u8 = 0x12;

/// Decodes the raw rootlist value into a folder tree.
///
/// `user_id` is used verbatim to build folder URIs; it need not be the
/// true resolved username.
#[must_use]
pub fn decode_rootlist(data: &[u8], user_id: &str) -> Node {
    let mut current = Node::empty_folder();
    let mut stack: Vec<Node> = Vec::new();

    for row in split_rows(data) {
        let row = truncate_at_terminator(row);

        if row.starts_with(b"playlist:") {
            current.children_mut().push(Node::Playlist {
                uri: format!("spotify:{}", String::from_utf8_lossy(row)),
            });
        } else if row.starts_with(b"start-group:") {
            let parts: Vec<&[u8]> = row.split(|b| *b == b':').collect();
            stack.push(current);

            let name = parts
                .last()
                .map(|p| percent_unquote_plus(p))
                .unwrap_or_default();
            let group_id = parts
                .len()
                .checked_sub(2)
                .and_then(|i| parts.get(i))
                .map(|p| String::from_utf8_lossy(p).into_owned())
                .unwrap_or_default();

            current = Node::Folder {
                name: Some(name),
                uri: Some(format!(
                    "spotify:user:{user_id}:folder:{:0>16}",
                    group_id
                )),
                children: Vec::new(),
            };
        } else if row.starts_with(b"end-group:") {
            if let Some(parent) = stack.pop() {
                let mut parent = parent;
                parent.children_mut().push(current);
                current = parent;
            }
            // Root never pops: empty stack is a tolerated no-op.
        }
    }

    while let Some(parent) = stack.pop() {
        let mut parent = parent;
        parent.children_mut().push(current);
        current = parent;
        log::debug!("rootlist decoder: auto-closed an unbalanced start-group");
    }

    current
}

/// Splits `data` at every occurrence of `"spotify:"` followed by one of
/// `{p, s, e}`, discarding the first row.
fn split_rows(data: &[u8]) -> Vec<&[u8]> {
    const PREFIX: &[u8] = b"spotify:";
    let mut rows = Vec::new();
    let mut search_from = 0usize;
    let mut last_start: Option<usize> = None;

    while let Some(rel) = find_subslice(&data[search_from..], PREFIX) {
        let marker_pos = search_from + rel;
        let after_prefix = marker_pos + PREFIX.len();
        let Some(&marker_byte) = data.get(after_prefix) else {
            break;
        };
        if !MARKERS.contains(&marker_byte) {
            search_from = marker_pos + 1;
            continue;
        }

        if let Some(start) = last_start {
            rows.push(&data[start..marker_pos]);
        }
        // The row payload begins right after "spotify:" itself so that
        // e.g. "playlist:..." / "start-group:..." prefixes line up with
        // the literal checks below.
        last_start = Some(after_prefix);
        search_from = after_prefix + 1;
    }

    if let Some(start) = last_start {
        rows.push(&data[start..]);
    }

    rows
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn truncate_at_terminator(row: &[u8]) -> &[u8] {
    match row.iter().position(|b| *b == RECORD_TERMINATOR) {
        Some(idx) => &row[..idx],
        None => row,
    }
}

/// Decodes `+` as space and `%XX` as the raw byte `0xXX`, interpreting
/// the result as (possibly lossy) UTF-8.
fn percent_unquote_plus(input: &[u8]) -> String {
    let mut out: Vec<u8> = Vec::with_capacity(input.len());
    let mut iter = input.iter().copied().peekable();

    while let Some(b) = iter.next() {
        match b {
            b'+' => out.push(b' '),
            b'%' => {
                let hi = iter.next();
                let lo = iter.next();
                match (hi.and_then(hex_value), lo.and_then(hex_value)) {
                    (Some(hi), Some(lo)) => out.push((hi << 4) | lo),
                    _ => {
                        out.push(b'%');
                        if let Some(hi) = hi {
                            out.push(hi_to_ascii(hi));
                        }
                        if let Some(lo) = lo {
                            out.push(hi_to_ascii(lo));
                        }
                    }
                }
            }
            other => out.push(other),
        }
    }

    String::from_utf8_lossy(&out).into_owned()
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

fn hi_to_ascii(_nibble: u8) -> u8 {
    // Only reached on malformed "%" escapes; emit the nibble as a digit
    // so the output stays printable rather than lossily dropping data.
    b'?'
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn empty_value_decodes_to_empty_root_folder() {
        let root = decode_rootlist(b"", "u");
        assert_eq!(
            root,
            Node::Folder {
                name: None,
                uri: None,
                children: Vec::new(),
            }
        );
    }

    #[test]
    fn single_playlist_at_root() {
        let data = b"junk spotify:playlist:37i9dQZF1DXdCsscAsbRNz\x12tail";
        let root = decode_rootlist(data, "u");
        assert_eq!(
            root,
            Node::Folder {
                name: None,
                uri: None,
                children: vec![Node::Playlist {
                    uri: "spotify:playlist:37i9dQZF1DXdCsscAsbRNz".to_string(),
                }],
            }
        );
    }

    #[test]
    fn folder_with_one_playlist() {
        let data = b"junk spotify:start-group:8212237ac7347bfe:Summer\x12junk \
                      spotify:playlist:AAA\x12junk \
                      spotify:end-group:8212237ac7347bfe\x12junk";
        let root = decode_rootlist(data, "u");
        assert_eq!(
            root,
            Node::Folder {
                name: None,
                uri: None,
                children: vec![Node::Folder {
                    name: Some("Summer".to_string()),
                    uri: Some("spotify:user:u:folder:8212237ac7347bfe".to_string()),
                    children: vec![Node::Playlist {
                        uri: "spotify:playlist:AAA".to_string(),
                    }],
                }],
            }
        );
    }

    #[test]
    fn short_group_id_left_pads_to_16_hex() {
        let data = b"junk spotify:start-group:abc:Name\x12junk spotify:end-group:abc\x12";
        let root = decode_rootlist(data, "u");
        match root {
            Node::Folder { children, .. } => match &children[0] {
                Node::Folder { uri, .. } => {
                    assert_eq!(uri.as_deref(), Some("spotify:user:u:folder:0000000000000abc"));
                }
                _ => panic!("expected folder"),
            },
            _ => panic!("expected root folder"),
        }
    }

    #[test]
    fn plus_and_percent_escapes_decode() {
        let data = b"junk spotify:start-group:1:My+Best%20Hits\x12junk spotify:end-group:1\x12";
        let root = decode_rootlist(data, "u");
        match root {
            Node::Folder { children, .. } => match &children[0] {
                Node::Folder { name, .. } => {
                    assert_eq!(name.as_deref(), Some("My Best Hits"));
                }
                _ => panic!("expected folder"),
            },
            _ => panic!("expected root folder"),
        }
    }

    #[test]
    fn unbalanced_start_group_auto_closes() {
        let data = b"junk spotify:start-group:1:Orphan\x12junk spotify:playlist:X\x12";
        let root = decode_rootlist(data, "u");
        match root {
            Node::Folder { children, .. } => {
                assert_eq!(children.len(), 1);
                match &children[0] {
                    Node::Folder { name, children, .. } => {
                        assert_eq!(name.as_deref(), Some("Orphan"));
                        assert_eq!(children.len(), 1);
                    }
                    _ => panic!("expected folder"),
                }
            }
            _ => panic!("expected root folder"),
        }
    }

    #[test]
    fn end_group_with_empty_stack_is_skipped() {
        let data = b"junk spotify:end-group:1\x12junk spotify:playlist:X\x12";
        let root = decode_rootlist(data, "u");
        match root {
            Node::Folder { children, .. } => assert_eq!(children.len(), 1),
            _ => panic!("expected root folder"),
        }
    }

    #[test]
    fn decoding_twice_yields_structurally_equal_trees() {
        let data = b"junk spotify:playlist:A\x12junk spotify:playlist:B\x12";
        assert_eq!(decode_rootlist(data, "u"), decode_rootlist(data, "u"));
    }

    #[test]
    fn find_folder_locates_nested_folder_by_suffix() {
        let data = b"junk spotify:start-group:8212237ac7347bfe:Summer\x12junk \
                      spotify:end-group:8212237ac7347bfe\x12";
        let root = decode_rootlist(data, "u");
        let found = root.find_folder("8212237ac7347bfe");
        assert!(found.is_some());
        assert!(root.find_folder("nonexistent").is_none());
    }
}
