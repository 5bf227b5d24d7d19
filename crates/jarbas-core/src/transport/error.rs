//! Transport error types

use thiserror::Error;

/// Errors raised while establishing or using a link to a tool server
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Connection closed")]
    Closed,

    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    #[error("Unsupported endpoint: {0}")]
    Unsupported(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type TransportResult<T> = Result<T, TransportError>;
