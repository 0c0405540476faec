use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;
use std::time::Duration;
use tracing::debug;

use crate::core::error::RpcError;
use crate::models::torrent::TorrentRecord;
use crate::rpc::session::{negotiate, SessionId, SESSION_HEADER};

/// Fields requested from `torrent-get`
pub const LIST_FIELDS: [&str; 3] = ["hashString", "trackerStats", "downloadDir"];

/// HTTP basic credentials for one RPC endpoint
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: String, password: String) -> Self {
        Self { username, password }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    method: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    arguments: Option<Value>,
}

/// Response envelope shared by every RPC method
#[derive(Debug, Deserialize)]
pub struct RpcResponse {
    pub result: String,
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

impl RpcResponse {
    pub fn is_success(&self) -> bool {
        self.result == "success"
    }
}

/// Torrent summary returned by `torrent-add`
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AddedTorrent {
    pub id: Option<i64>,
    pub name: Option<String>,
    #[serde(rename = "hashString")]
    pub hash_string: Option<String>,
}

/// What the target client did with a `torrent-add`
#[derive(Debug, Clone, PartialEq)]
pub enum AddOutcome {
    Added(AddedTorrent),
    /// The client already manages this torrent
    Duplicate(AddedTorrent),
    /// Success without a torrent summary (older daemons)
    Unreported,
}

impl AddOutcome {
    fn from_arguments(arguments: &mut Map<String, Value>) -> Result<Self, RpcError> {
        let parse = |value: Value| {
            serde_json::from_value::<AddedTorrent>(value)
                .map_err(|e| RpcError::InvalidResponse(format!("Unexpected torrent-add payload: {}", e)))
        };

        if let Some(added) = arguments.remove("torrent-added") {
            return Ok(AddOutcome::Added(parse(added)?));
        }
        if let Some(duplicate) = arguments.remove("torrent-duplicate") {
            return Ok(AddOutcome::Duplicate(parse(duplicate)?));
        }
        Ok(AddOutcome::Unreported)
    }
}

/// JSON-RPC client for a single Transmission endpoint.
///
/// The session id is negotiated on the first call and reused for every later
/// call on this client. A stale id is not renegotiated.
pub struct RpcClient {
    http: reqwest::Client,
    endpoint: String,
    credentials: Credentials,
    session: Option<SessionId>,
}

impl RpcClient {
    pub fn new(
        endpoint: String,
        credentials: Credentials,
        timeout: Option<Duration>,
    ) -> Result<Self, RpcError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let http = builder.build().map_err(|source| RpcError::Transport {
            endpoint: endpoint.clone(),
            source,
        })?;

        Ok(Self {
            http,
            endpoint,
            credentials,
            session: None,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn session(&mut self) -> Result<SessionId, RpcError> {
        if let Some(id) = &self.session {
            return Ok(id.clone());
        }

        let id = negotiate(&self.http, &self.endpoint, &self.credentials).await?;
        self.session = Some(id.clone());
        Ok(id)
    }

    /// Send `method` with `arguments` and return the decoded envelope.
    /// Anything other than HTTP success with `"result": "success"` is an error.
    pub async fn call(&mut self, method: &str, arguments: Option<Value>) -> Result<RpcResponse, RpcError> {
        let session = self.session().await?;

        let response = self
            .http
            .post(&self.endpoint)
            .basic_auth(&self.credentials.username, Some(&self.credentials.password))
            .header(SESSION_HEADER, session.as_str())
            .json(&RpcRequest { method, arguments })
            .send()
            .await
            .map_err(|source| RpcError::Transport {
                endpoint: self.endpoint.clone(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(RpcError::Status {
                endpoint: self.endpoint.clone(),
                status: response.status(),
            });
        }

        let body = response.bytes().await.map_err(|source| RpcError::Transport {
            endpoint: self.endpoint.clone(),
            source,
        })?;

        let parsed: RpcResponse = serde_json::from_slice(&body)
            .map_err(|e| RpcError::InvalidResponse(format!("{} returned malformed JSON: {}", method, e)))?;

        debug!(
            endpoint = %self.endpoint,
            method = method,
            result = %parsed.result,
            "RPC call completed"
        );

        if !parsed.is_success() {
            return Err(RpcError::Rejected {
                method: method.to_string(),
                result: parsed.result,
            });
        }

        Ok(parsed)
    }

    /// List every torrent the client manages, in server order
    pub async fn torrent_get(&mut self) -> Result<Vec<TorrentRecord>, RpcError> {
        let mut response = self
            .call("torrent-get", Some(json!({ "fields": LIST_FIELDS })))
            .await?;

        let torrents = response
            .arguments
            .remove("torrents")
            .ok_or_else(|| RpcError::InvalidResponse("torrent-get response has no torrents array".to_string()))?;

        let records: Vec<TorrentRecord> = serde_json::from_value(torrents)
            .map_err(|e| RpcError::InvalidResponse(format!("Unexpected torrent-get payload: {}", e)))?;

        if let Some(bad) = records.iter().find(|record| !record.has_valid_hash()) {
            return Err(RpcError::InvalidResponse(format!(
                "torrent-get returned invalid hashString '{}'",
                bad.hash_string
            )));
        }

        Ok(records)
    }

    /// Add a torrent from raw .torrent bytes, storing its data under `download_dir`
    pub async fn torrent_add(&mut self, metainfo: &[u8], download_dir: &str) -> Result<AddOutcome, RpcError> {
        let arguments = json!({
            "metainfo": STANDARD.encode(metainfo),
            "download-dir": download_dir,
        });

        let mut response = self.call("torrent-add", Some(arguments)).await?;
        AddOutcome::from_arguments(&mut response.arguments)
    }
}
