//! Configuration provider trait

use async_trait::async_trait;

use crate::agents::AgentProfile;

use super::schema::{LlmProviderConfig, ToolServerConfig};

/// Configuration provider abstraction
///
/// Implementations:
/// - `MemoryConfigProvider`: In-memory for testing
/// - `FileConfigProvider`: Reads from YAML file (~/.config/jarbas/config.yaml)
#[async_trait]
pub trait ConfigProvider: Send + Sync {
    /// Configured tool servers
    async fn tool_servers(&self) -> ConfigResult<Vec<ToolServerConfig>>;

    /// Configured agent profiles
    async fn agents(&self) -> ConfigResult<Vec<AgentProfile>>;

    /// Configured model providers
    async fn llm_providers(&self) -> ConfigResult<Vec<LlmProviderConfig>>;

    /// Default `provider/model`, if any
    async fn default_model(&self) -> ConfigResult<Option<String>>;

    /// Default agent name, if any
    async fn default_agent(&self) -> ConfigResult<Option<String>>;

    async fn set_default_model(&self, model: &str) -> ConfigResult<()>;

    /// Fails with `AgentNotFound` unless the agent is configured
    async fn set_default_agent(&self, agent: &str) -> ConfigResult<()>;
}

/// Errors that can occur during configuration operations
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Agent '{0}' not found")]
    AgentNotFound(String),

    #[error("Provider not found: {0}")]
    ProviderNotFound(String),

    #[error("Invalid tool server '{name}': {reason}")]
    InvalidServer { name: String, reason: String },

    #[error("Invalid model '{0}': expected provider/model")]
    InvalidModel(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Other(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;
