use tracing::debug;

use crate::core::error::RpcError;
use crate::rpc::client::Credentials;

/// Header carrying the anti-CSRF token on every authenticated call
pub const SESSION_HEADER: &str = "X-Transmission-Session-Id";

/// Opaque session token issued by an RPC endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionId(String);

impl SessionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Obtain a session token from `endpoint`.
///
/// The request carries credentials but no token and no body, so the server
/// answers 409 Conflict and names the token it expects in [`SESSION_HEADER`].
/// The status itself is not checked; only the header matters.
pub async fn negotiate(
    http: &reqwest::Client,
    endpoint: &str,
    credentials: &Credentials,
) -> Result<SessionId, RpcError> {
    let response = http
        .post(endpoint)
        .basic_auth(&credentials.username, Some(&credentials.password))
        .send()
        .await
        .map_err(|source| RpcError::Transport {
            endpoint: endpoint.to_string(),
            source,
        })?;

    let status = response.status();
    let session_id = response
        .headers()
        .get(SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(|value| SessionId(value.to_string()));

    match session_id {
        Some(id) => {
            debug!(endpoint = %endpoint, status = %status, "Session id negotiated");
            Ok(id)
        }
        None => Err(RpcError::MissingSessionId {
            endpoint: endpoint.to_string(),
            status,
        }),
    }
}
