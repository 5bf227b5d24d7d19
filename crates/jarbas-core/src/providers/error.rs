//! Model adapter error types

use thiserror::Error;

/// Errors that can occur while asking a model for a reply
#[derive(Error, Debug)]
pub enum ProviderError {
    /// No configured or built-in backend for this provider
    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),

    #[error("Invalid model '{0}': expected provider/model")]
    InvalidModel(String),

    /// API request failed
    #[error("{provider} API error: {message}")]
    ApiError { provider: String, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Request was cancelled
    #[error("Request cancelled")]
    Cancelled,

    /// Invalid response from provider
    #[error("Invalid response from {provider}: {message}")]
    InvalidResponse { provider: String, message: String },

    #[error("{0}")]
    Other(String),
}

impl ProviderError {
    pub fn api_error(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ApiError {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn invalid_response(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            provider: provider.into(),
            message: message.into(),
        }
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;
