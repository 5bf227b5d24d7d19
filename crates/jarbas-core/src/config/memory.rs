//! In-memory configuration provider

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::agents::AgentProfile;

use super::schema::{ConfigFile, LlmProviderConfig, ToolServerConfig};
use super::traits::{ConfigProvider, ConfigResult};

/// In-memory configuration provider for testing
#[derive(Debug, Default)]
pub struct MemoryConfigProvider {
    config: RwLock<ConfigFile>,
}

impl MemoryConfigProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ConfigFile) -> Self {
        Self {
            config: RwLock::new(config),
        }
    }

    pub fn add_server(&self, server: ToolServerConfig) {
        self.config.write().mcp_servers.push(server);
    }

    pub fn add_agent(&self, agent: AgentProfile) {
        self.config.write().agents.push(agent);
    }

    pub fn add_llm_provider(&self, provider: LlmProviderConfig) {
        self.config.write().llm_providers.push(provider);
    }

    pub fn snapshot(&self) -> ConfigFile {
        self.config.read().clone()
    }
}

#[async_trait]
impl ConfigProvider for MemoryConfigProvider {
    async fn tool_servers(&self) -> ConfigResult<Vec<ToolServerConfig>> {
        Ok(self.config.read().mcp_servers.clone())
    }

    async fn agents(&self) -> ConfigResult<Vec<AgentProfile>> {
        Ok(self.config.read().agents.clone())
    }

    async fn llm_providers(&self) -> ConfigResult<Vec<LlmProviderConfig>> {
        Ok(self.config.read().llm_providers.clone())
    }

    async fn default_model(&self) -> ConfigResult<Option<String>> {
        Ok(self.config.read().default_model.clone())
    }

    async fn default_agent(&self) -> ConfigResult<Option<String>> {
        Ok(self.config.read().default_agent.clone())
    }

    async fn set_default_model(&self, model: &str) -> ConfigResult<()> {
        self.config.write().default_model = Some(model.to_string());
        Ok(())
    }

    async fn set_default_agent(&self, agent: &str) -> ConfigResult<()> {
        self.config.write().select_agent(agent)
    }
}
