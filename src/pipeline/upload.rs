use std::path::Path;
use tracing::{info, warn};

use crate::core::error::{FileError, MigrateError};
use crate::pipeline::filter::Selection;
use crate::pipeline::migrate::torrent_file_name;
use crate::rpc::client::{AddOutcome, RpcClient};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct UploadSummary {
    pub added: usize,
    pub duplicates: usize,
}

/// Submit one .torrent file to `client`, keeping the recorded download directory
pub async fn reupload(
    client: &mut RpcClient,
    torrent_file: &Path,
    download_dir: &str,
) -> Result<AddOutcome, MigrateError> {
    let metainfo = tokio::fs::read(torrent_file)
        .await
        .map_err(|source| FileError::Read {
            path: torrent_file.to_path_buf(),
            source,
        })?;

    let outcome = client.torrent_add(&metainfo, download_dir).await?;

    match &outcome {
        AddOutcome::Added(torrent) => info!(
            file = %torrent_file.display(),
            download_dir = %download_dir,
            id = ?torrent.id,
            name = ?torrent.name,
            "Torrent added to target instance"
        ),
        AddOutcome::Duplicate(torrent) => warn!(
            file = %torrent_file.display(),
            id = ?torrent.id,
            name = ?torrent.name,
            "Target instance already manages this torrent"
        ),
        AddOutcome::Unreported => info!(
            file = %torrent_file.display(),
            download_dir = %download_dir,
            "Torrent submitted to target instance"
        ),
    }

    Ok(outcome)
}

/// Re-upload every selected torrent from `target_dir`, in selection order,
/// stopping at the first failure
pub async fn upload_all(
    client: &mut RpcClient,
    selection: &Selection,
    target_dir: &Path,
) -> Result<UploadSummary, MigrateError> {
    let mut summary = UploadSummary::default();

    for torrent in selection.iter() {
        let path = target_dir.join(torrent_file_name(&torrent.hash_string));
        match reupload(client, &path, &torrent.download_dir).await? {
            AddOutcome::Duplicate(_) => summary.duplicates += 1,
            AddOutcome::Added(_) | AddOutcome::Unreported => summary.added += 1,
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorKind;
    use crate::models::torrent::TorrentRecord;
    use crate::pipeline::filter::select_by_passkey;
    use crate::rpc::client::Credentials;
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use httpmock::prelude::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    const RPC_PATH: &str = "/transmission/rpc";

    fn client_for(server: &MockServer) -> RpcClient {
        RpcClient::new(
            server.url(RPC_PATH),
            Credentials::new("user".to_string(), "pass".to_string()),
            None,
        )
        .unwrap()
    }

    fn mock_session(server: &MockServer) -> httpmock::Mock<'_> {
        server.mock(|when, then| {
            when.method(POST).path(RPC_PATH).header_missing("x-transmission-session-id");
            then.status(409).header("x-transmission-session-id", "tok");
        })
    }

    #[tokio::test]
    async fn test_reupload_uses_recorded_download_dir() {
        let server = MockServer::start_async().await;
        mock_session(&server);

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("aa.torrent");
        fs::write(&path, b"d4:infod4:name3:fooee").unwrap();

        let add = server.mock(|when, then| {
            when.method(POST).path(RPC_PATH).json_body(json!({
                "method": "torrent-add",
                "arguments": {
                    "metainfo": STANDARD.encode(b"d4:infod4:name3:fooee"),
                    "download-dir": "/mnt/old/location"
                }
            }));
            then.status(200).json_body(json!({
                "result": "success",
                "arguments": { "torrent-added": { "id": 1, "name": "foo", "hashString": "aa" } }
            }));
        });

        let mut client = client_for(&server);
        let outcome = reupload(&mut client, &path, "/mnt/old/location").await.unwrap();

        assert!(matches!(outcome, AddOutcome::Added(_)));
        add.assert();
    }

    #[tokio::test]
    async fn test_reupload_missing_file_makes_no_rpc_call() {
        let server = MockServer::start_async().await;
        let session = mock_session(&server);

        let dir = TempDir::new().unwrap();
        let mut client = client_for(&server);
        let err = reupload(&mut client, &dir.path().join("gone.torrent"), "/data")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Filesystem);
        assert!(matches!(err, MigrateError::File(FileError::Read { .. })));
        session.assert_calls(0);
    }

    #[tokio::test]
    async fn test_upload_all_counts_duplicates() {
        let server = MockServer::start_async().await;
        mock_session(&server);

        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("aa.torrent"), b"A").unwrap();
        fs::write(dir.path().join("bb.torrent"), b"B").unwrap();

        server.mock(|when, then| {
            when.method(POST).path(RPC_PATH).json_body(json!({
                "method": "torrent-add",
                "arguments": { "metainfo": STANDARD.encode(b"A"), "download-dir": "/a" }
            }));
            then.status(200).json_body(json!({
                "result": "success",
                "arguments": { "torrent-added": { "id": 1, "name": "a", "hashString": "aa" } }
            }));
        });
        server.mock(|when, then| {
            when.method(POST).path(RPC_PATH).json_body(json!({
                "method": "torrent-add",
                "arguments": { "metainfo": STANDARD.encode(b"B"), "download-dir": "/b" }
            }));
            then.status(200).json_body(json!({
                "result": "success",
                "arguments": { "torrent-duplicate": { "id": 2, "name": "b", "hashString": "bb" } }
            }));
        });

        let listing = vec![
            TorrentRecord::new("aa", &["http://t/?K"], "/a"),
            TorrentRecord::new("bb", &["http://t/?K"], "/b"),
        ];
        let selection = select_by_passkey(&listing, "K");

        let mut client = client_for(&server);
        let summary = upload_all(&mut client, &selection, dir.path()).await.unwrap();

        assert_eq!(summary, UploadSummary { added: 1, duplicates: 1 });
    }
}
