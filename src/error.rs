//! Error types

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

/// Fatal errors that stop the server
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid bind address {0:?}")]
    InvalidAddress(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to load script {}: {reason}", path.display())]
    ScriptFile { path: PathBuf, reason: String },

    #[error("failed to render message: {0}")]
    Render(#[from] serde_json::Error),

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Non-fatal broadcast failures; the sequencer logs these and carries on
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BroadcastError {
    #[error("no connected clients")]
    NoClients,
}

/// Result type for server setup
pub type ServerResult<T> = Result<T, ServerError>;
