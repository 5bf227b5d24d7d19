//! Conversation-level errors
//!
//! Tool problems never show up here; they travel back to the model as
//! results. These are the conditions that end a conversation.

use thiserror::Error;

use crate::config::ConfigError;
use crate::providers::ProviderError;

#[derive(Error, Debug)]
pub enum ConversationError {
    #[error("Unknown agent: {0}")]
    UnknownAgent(String),

    #[error("No agent selected and no default agent configured")]
    NoAgentSelected,

    #[error("No model selected and no default model configured")]
    NoModelSelected,

    /// The model kept requesting tools past the configured bound
    #[error("Conversation exceeded {0} model turns")]
    MaxTurnsExceeded(usize),

    #[error("Model error: {0}")]
    Model(#[from] ProviderError),

    #[error("Conversation cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to encode tool results: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ConversationError {
    /// Model failures that stem from cancellation collapse into `Cancelled`
    pub(crate) fn from_model(error: ProviderError) -> Self {
        match error {
            ProviderError::Cancelled => ConversationError::Cancelled,
            other => ConversationError::Model(other),
        }
    }
}

pub type ConversationResult<T> = Result<T, ConversationError>;
