use serde::Deserialize;

/// One entry of a `torrent-get` listing
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct TorrentRecord {
    /// 40-character hex info hash, also the .torrent file stem on disk
    #[serde(rename = "hashString")]
    pub hash_string: String,
    /// Tracker status entries, in the order the client reports them
    #[serde(rename = "trackerStats")]
    pub tracker_stats: Vec<TrackerStat>,
    /// Where the client keeps this torrent's data
    #[serde(rename = "downloadDir")]
    pub download_dir: String,
}

/// Per-tracker state. Only the announce URL is used; the rest is ignored.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct TrackerStat {
    pub announce: String,
}

impl TorrentRecord {
    pub fn new(hash_string: &str, announces: &[&str], download_dir: &str) -> Self {
        Self {
            hash_string: hash_string.to_string(),
            tracker_stats: announces
                .iter()
                .map(|announce| TrackerStat {
                    announce: announce.to_string(),
                })
                .collect(),
            download_dir: download_dir.to_string(),
        }
    }

    pub fn announces(&self) -> impl Iterator<Item = &str> {
        self.tracker_stats.iter().map(|stat| stat.announce.as_str())
    }

    /// The identifier must decode to a 20-byte info hash before it is used as a file stem
    pub fn has_valid_hash(&self) -> bool {
        matches!(hex::decode(&self.hash_string), Ok(bytes) if bytes.len() == 20)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_ignores_extra_tracker_fields() {
        let value = json!({
            "hashString": "0123456789abcdef0123456789abcdef01234567",
            "downloadDir": "/data/movies",
            "trackerStats": [
                {
                    "announce": "https://tracker.example/announce?passkey=ABC123",
                    "announceState": 0,
                    "host": "https://tracker.example:443",
                    "seederCount": 12
                }
            ]
        });

        let record: TorrentRecord = serde_json::from_value(value).unwrap();
        assert_eq!(record.hash_string, "0123456789abcdef0123456789abcdef01234567");
        assert_eq!(record.download_dir, "/data/movies");
        assert_eq!(
            record.announces().collect::<Vec<_>>(),
            vec!["https://tracker.example/announce?passkey=ABC123"]
        );
    }

    #[test]
    fn test_has_valid_hash() {
        let valid = TorrentRecord::new("0123456789abcdef0123456789ABCDEF01234567", &[], "/data");
        assert!(valid.has_valid_hash());

        for bad in [
            "",
            "abcd",
            "0123456789abcdef0123456789abcdef0123456",
            "0123456789abcdef0123456789abcdef012345678",
            "0123456789abcdef0123456789abcdef0123456z",
            "../../../../../../../../../../etc/passwd",
            "/tmp/0123456789abcdef0123456789abcdef0123",
        ] {
            assert!(!TorrentRecord::new(bad, &[], "/data").has_valid_hash(), "{bad}");
        }
    }

    #[test]
    fn test_deserialize_rejects_wrong_types() {
        let value = json!({
            "hashString": 42,
            "downloadDir": "/data",
            "trackerStats": []
        });
        assert!(serde_json::from_value::<TorrentRecord>(value).is_err());
    }
}
