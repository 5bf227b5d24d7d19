//! Model adapter trait definition

use async_trait::async_trait;

use crate::types::{CancellationToken, Message, ToolDefinition};

use super::error::{ProviderError, ProviderResult};

/// Which provider and model a conversation talks to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelTarget {
    /// Configured provider name (or a built-in provider type)
    pub provider: String,
    /// Model identifier as the provider knows it
    pub model: String,
}

impl ModelTarget {
    pub fn new(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
        }
    }

    /// Parse `provider/model`; the model part may itself contain slashes
    pub fn parse(value: &str) -> ProviderResult<Self> {
        match value.split_once('/') {
            Some((provider, model)) if !provider.is_empty() && !model.is_empty() => {
                Ok(Self::new(provider, model))
            }
            _ => Err(ProviderError::InvalidModel(value.to_string())),
        }
    }
}

impl std::fmt::Display for ModelTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.provider, self.model)
    }
}

/// Produces one assistant message from a conversation
///
/// Implementations:
/// - `GenaiModelAdapter`: real providers through `genai`
/// - `ScriptedModel`: queued replies for tests
#[async_trait]
pub trait ModelAdapter: Send + Sync {
    /// Ask the model for the next assistant message
    ///
    /// `tools`, when given, are offered to the model by short name.
    async fn chat(
        &self,
        target: &ModelTarget,
        messages: &[Message],
        tools: Option<&[ToolDefinition]>,
        cancel: &CancellationToken,
    ) -> ProviderResult<Message>;
}
