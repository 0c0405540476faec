// Centralized error handling for the migration run

use reqwest::StatusCode;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while talking to a Transmission RPC endpoint
#[derive(Error, Debug)]
pub enum RpcError {
    #[error("Failed to reach RPC endpoint {endpoint}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("RPC endpoint {endpoint} returned error status: {status}")]
    Status { endpoint: String, status: StatusCode },

    #[error("RPC endpoint {endpoint} did not return an X-Transmission-Session-Id header (status {status})")]
    MissingSessionId { endpoint: String, status: StatusCode },

    #[error("Failed to parse RPC response: {0}")]
    InvalidResponse(String),

    #[error("RPC method {method} failed: {result}")]
    Rejected { method: String, result: String },
}

/// Errors raised while reading or copying .torrent files
#[derive(Error, Debug)]
pub enum FileError {
    #[error("Source torrent directory does not exist: {}", .0.display())]
    MissingSourceDir(PathBuf),

    #[error("Failed to open source file {}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create destination file {}", .path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to copy {} -> {}", .from.display(), .to.display())]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read torrent file {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Broad failure classes, used to tell errors apart without matching every variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Transport,
    Protocol,
    Filesystem,
}

/// Top-level error for a migration run
#[derive(Error, Debug)]
pub enum MigrateError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error(transparent)]
    File(#[from] FileError),
}

impl MigrateError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MigrateError::Config(_) => ErrorKind::Configuration,
            MigrateError::Rpc(RpcError::Transport { .. } | RpcError::Status { .. }) => {
                ErrorKind::Transport
            }
            MigrateError::Rpc(_) => ErrorKind::Protocol,
            MigrateError::File(FileError::MissingSourceDir(_)) => ErrorKind::Configuration,
            MigrateError::File(_) => ErrorKind::Filesystem,
        }
    }
}
