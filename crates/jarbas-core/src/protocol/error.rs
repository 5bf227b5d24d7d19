//! Protocol client error types

use std::time::Duration;

use thiserror::Error;

use crate::transport::TransportError;
use crate::types::{ToolErrorKind, ToolFailure};

use super::wire::{RemoteError, RequestId};

/// Errors raised by a session or a tool protocol client
#[derive(Error, Debug)]
pub enum McpError {
    #[error("Transport closed")]
    TransportClosed,

    #[error("{method} timed out after {timeout:?}")]
    Timeout { method: String, timeout: Duration },

    #[error("Session not initialized")]
    NotInitialized,

    #[error("Server {server} unreachable: {reason}")]
    ServerUnreachable { server: String, reason: String },

    #[error("Remote error: {0}")]
    Remote(RemoteError),

    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("No pending request with id {0}")]
    UnknownRequest(RequestId),

    #[error("Request cancelled")]
    Cancelled,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl McpError {
    /// Wrap a transport failure raised while connecting to `server`
    pub fn unreachable(server: &str, err: TransportError) -> Self {
        McpError::ServerUnreachable {
            server: server.to_string(),
            reason: err.to_string(),
        }
    }

    /// Describe this error as a tool result the model can read
    pub fn to_failure(&self) -> ToolFailure {
        match self {
            McpError::TransportClosed => ToolFailure::new(ToolErrorKind::TransportClosed, self.to_string()),
            McpError::Timeout { .. } => ToolFailure::new(ToolErrorKind::Timeout, self.to_string()),
            McpError::NotInitialized => ToolFailure::new(ToolErrorKind::NotInitialized, self.to_string()),
            McpError::ServerUnreachable { .. } => {
                ToolFailure::new(ToolErrorKind::ServerUnreachable, self.to_string())
            }
            McpError::Remote(remote) => {
                ToolFailure::protocol(remote.code, remote.message.clone(), remote.data.clone())
            }
            McpError::InitializationFailed(_) => {
                ToolFailure::new(ToolErrorKind::ServerUnreachable, self.to_string())
            }
            McpError::InvalidResponse(_) | McpError::UnknownRequest(_) | McpError::Json(_) => {
                ToolFailure::new(ToolErrorKind::InvalidResponse, self.to_string())
            }
            McpError::Cancelled => ToolFailure::new(ToolErrorKind::Cancelled, self.to_string()),
        }
    }
}

pub type McpResult<T> = Result<T, McpError>;
