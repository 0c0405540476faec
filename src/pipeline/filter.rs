use std::collections::HashMap;
use std::fmt;

use crate::models::torrent::TorrentRecord;

/// A torrent chosen for migration, with the download directory seen at selection time
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedTorrent {
    pub hash_string: String,
    pub download_dir: String,
    pub matched_announces: Vec<String>,
}

impl fmt::Display for SelectedTorrent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Torrent hash: {}, Announce URLs: {}, Download Directory: {}",
            self.hash_string,
            self.matched_announces.join(", "),
            self.download_dir
        )
    }
}

/// Identifier -> download directory association, kept in selection order.
/// Drives both the copy and the re-upload stages.
#[derive(Debug, Default)]
pub struct Selection {
    entries: Vec<SelectedTorrent>,
    index: HashMap<String, usize>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, hash_string: &str) -> bool {
        self.index.contains_key(hash_string)
    }

    #[cfg(test)]
    pub fn get(&self, hash_string: &str) -> Option<&SelectedTorrent> {
        self.index.get(hash_string).map(|&i| &self.entries[i])
    }

    #[cfg(test)]
    pub fn download_dir(&self, hash_string: &str) -> Option<&str> {
        self.get(hash_string).map(|t| t.download_dir.as_str())
    }

    /// Record a torrent. The first entry for an identifier wins; returns false
    /// and leaves the selection untouched if it is already present.
    pub fn insert(&mut self, torrent: SelectedTorrent) -> bool {
        if self.contains(&torrent.hash_string) {
            return false;
        }
        self.index.insert(torrent.hash_string.clone(), self.entries.len());
        self.entries.push(torrent);
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = &SelectedTorrent> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Case-sensitive substring test
pub fn contains_passkey(announce: &str, passkey: &str) -> bool {
    announce.contains(passkey)
}

/// Every announce URL of `record` that carries `passkey`, in tracker order
pub fn matching_announces(record: &TorrentRecord, passkey: &str) -> Vec<String> {
    record
        .announces()
        .filter(|announce| contains_passkey(announce, passkey))
        .map(str::to_string)
        .collect()
}

/// Select torrents whose trackers carry `passkey`, deduplicated by identifier.
///
/// Entries whose identifier is already selected are skipped without looking
/// at their trackers. Entries that do not match are not remembered, so a
/// later entry with the same identifier gets its own evaluation.
pub fn select_by_passkey(listing: &[TorrentRecord], passkey: &str) -> Selection {
    let mut selection = Selection::new();

    for record in listing {
        if selection.contains(&record.hash_string) {
            continue;
        }

        let matched = matching_announces(record, passkey);
        if matched.is_empty() {
            continue;
        }

        selection.insert(SelectedTorrent {
            hash_string: record.hash_string.clone(),
            download_dir: record.download_dir.clone(),
            matched_announces: matched,
        });
    }

    selection
}

#[cfg(test)]
mod tests {
    use super::*;

    const PASSKEY: &str = "ABC123";

    #[test]
    fn test_contains_passkey_is_case_sensitive() {
        let url = "http://tracker.example/announce?passkey=ABC123";
        assert!(contains_passkey(url, "ABC123"));
        assert!(!contains_passkey(url, "abc123"));
        assert!(!contains_passkey("http://other.example/announce", "ABC123"));
    }

    #[test]
    fn test_select_only_matching() {
        let listing = vec![
            TorrentRecord::new("a", &["http://t.example/announce?passkey=ABC123"], "/data/a"),
            TorrentRecord::new("b", &["http://t.example/announce?passkey=ZZZ"], "/data/b"),
            TorrentRecord::new("c", &[], "/data/c"),
        ];

        let selection = select_by_passkey(&listing, PASSKEY);

        assert_eq!(selection.len(), 1);
        assert!(selection.contains("a"));
        assert!(!selection.contains("b"));
        assert!(!selection.contains("c"));
        assert_eq!(selection.download_dir("a"), Some("/data/a"));
    }

    #[test]
    fn test_collects_every_matching_announce() {
        let listing = vec![TorrentRecord::new(
            "a",
            &[
                "http://one.example/announce?passkey=ABC123",
                "http://two.example/announce",
                "udp://three.example:80/ABC123/announce",
            ],
            "/data/a",
        )];

        let selection = select_by_passkey(&listing, PASSKEY);
        let torrent = selection.get("a").unwrap();

        assert_eq!(
            torrent.matched_announces,
            vec![
                "http://one.example/announce?passkey=ABC123".to_string(),
                "udp://three.example:80/ABC123/announce".to_string(),
            ]
        );
        assert_eq!(
            torrent.to_string(),
            "Torrent hash: a, Announce URLs: http://one.example/announce?passkey=ABC123, \
             udp://three.example:80/ABC123/announce, Download Directory: /data/a"
        );
    }

    #[test]
    fn test_duplicate_after_selection_is_ignored() {
        let listing = vec![
            TorrentRecord::new("x", &["http://t.example/?passkey=ABC123"], "/first"),
            TorrentRecord::new("x", &["http://t.example/?passkey=ABC123"], "/second"),
            TorrentRecord::new("x", &["http://t.example/?passkey=nope"], "/third"),
        ];

        let selection = select_by_passkey(&listing, PASSKEY);

        assert_eq!(selection.len(), 1);
        assert_eq!(selection.download_dir("x"), Some("/first"));
    }

    #[test]
    fn test_unmatched_entry_does_not_block_later_duplicate() {
        let listing = vec![
            TorrentRecord::new("x", &["http://t.example/?passkey=nope"], "/first"),
            TorrentRecord::new("x", &["http://t.example/?passkey=ABC123"], "/second"),
        ];

        let selection = select_by_passkey(&listing, PASSKEY);

        assert_eq!(selection.len(), 1);
        assert_eq!(selection.download_dir("x"), Some("/second"));
    }

    #[test]
    fn test_match_count_equals_distinct_matching_identifiers() {
        let mut listing = Vec::new();
        for i in 0..20 {
            let hash = format!("{:040x}", i % 7);
            let announce = if i % 7 < 4 {
                format!("http://t.example/announce?passkey={}", PASSKEY)
            } else {
                "http://t.example/announce?passkey=other".to_string()
            };
            listing.push(TorrentRecord::new(&hash, &[announce.as_str()], "/data"));
        }

        let selection = select_by_passkey(&listing, PASSKEY);
        assert_eq!(selection.len(), 4);
    }

    #[test]
    fn test_selection_preserves_order() {
        let listing = vec![
            TorrentRecord::new("c", &["http://t/?ABC123"], "/c"),
            TorrentRecord::new("a", &["http://t/?ABC123"], "/a"),
            TorrentRecord::new("b", &["http://t/?ABC123"], "/b"),
        ];

        let selection = select_by_passkey(&listing, PASSKEY);
        let order: Vec<&str> = selection.iter().map(|t| t.hash_string.as_str()).collect();
        assert_eq!(order, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_insert_keeps_first() {
        let mut selection = Selection::new();
        assert!(selection.is_empty());

        let first = SelectedTorrent {
            hash_string: "a".to_string(),
            download_dir: "/one".to_string(),
            matched_announces: vec![],
        };
        let second = SelectedTorrent {
            download_dir: "/two".to_string(),
            ..first.clone()
        };

        assert!(selection.insert(first));
        assert!(!selection.insert(second));
        assert_eq!(selection.download_dir("a"), Some("/one"));
    }
}
