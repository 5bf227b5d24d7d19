//! File-based configuration provider (YAML)
//!
//! Supports user-level (~/.config/jarbas/config.yaml) and workspace-level
//! (.config/jarbas/config.yaml) config.

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::agents::AgentProfile;

use super::schema::{ConfigFile, LlmProviderConfig, ToolServerConfig};
use super::traits::{ConfigError, ConfigProvider, ConfigResult};

/// Config level (user or workspace)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLevel {
    /// User-level config (~/.config/jarbas/config.yaml)
    User,
    /// Workspace-level config (.config/jarbas/config.yaml in workspace root)
    Workspace,
    /// Explicit path, e.g. `./config.yaml`
    Explicit,
}

/// File-based configuration provider
///
/// A missing file reads as an empty configuration; writes create it.
///
/// # Example
///
/// ```no_run
/// use jarbas_core::config::FileConfigProvider;
///
/// let user_config = FileConfigProvider::user();
/// let workspace_config = FileConfigProvider::workspace("/path/to/workspace");
/// let local = FileConfigProvider::at("config.yaml");
/// ```
pub struct FileConfigProvider {
    path: PathBuf,
    level: ConfigLevel,
    cache: RwLock<Option<ConfigFile>>,
}

impl FileConfigProvider {
    pub fn new(path: impl Into<PathBuf>, level: ConfigLevel) -> Self {
        Self {
            path: path.into(),
            level,
            cache: RwLock::new(None),
        }
    }

    /// Provider for an explicit file path
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self::new(path, ConfigLevel::Explicit)
    }

    /// Create a user-level config provider (~/.config/jarbas/config.yaml)
    pub fn user() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".config"));
        Self::new(config_dir.join("jarbas").join("config.yaml"), ConfigLevel::User)
    }

    /// Create a workspace-level config provider (.config/jarbas/config.yaml)
    pub fn workspace(workspace_root: impl AsRef<Path>) -> Self {
        let path = workspace_root.as_ref().join(".config").join("jarbas").join("config.yaml");
        Self::new(path, ConfigLevel::Workspace)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn level(&self) -> ConfigLevel {
        self.level
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    fn load(&self) -> ConfigResult<ConfigFile> {
        if !self.path.exists() {
            return Ok(ConfigFile::default());
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(ConfigFile::default());
        }
        serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::Other(format!("Failed to parse {}: {}", self.path.display(), e)))
    }

    fn save(&self, config: &ConfigFile) -> ConfigResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(config)
            .map_err(|e| ConfigError::Other(format!("Failed to serialize YAML: {}", e)))?;
        fs::write(&self.path, content)?;

        *self.cache.write() = Some(config.clone());
        Ok(())
    }

    /// Cached document, loading it on first use
    pub fn snapshot(&self) -> ConfigResult<ConfigFile> {
        if let Some(config) = self.cache.read().as_ref() {
            return Ok(config.clone());
        }
        self.reload()
    }

    /// Reload config from disk (invalidate cache)
    pub fn reload(&self) -> ConfigResult<ConfigFile> {
        let config = self.load()?;
        *self.cache.write() = Some(config.clone());
        Ok(config)
    }

    /// Replace the whole document
    pub fn replace(&self, config: &ConfigFile) -> ConfigResult<()> {
        self.save(config)
    }
}

impl std::fmt::Debug for FileConfigProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileConfigProvider")
            .field("path", &self.path)
            .field("level", &self.level)
            .field("exists", &self.exists())
            .finish()
    }
}

#[async_trait]
impl ConfigProvider for FileConfigProvider {
    async fn tool_servers(&self) -> ConfigResult<Vec<ToolServerConfig>> {
        Ok(self.snapshot()?.mcp_servers)
    }

    async fn agents(&self) -> ConfigResult<Vec<AgentProfile>> {
        Ok(self.snapshot()?.agents)
    }

    async fn llm_providers(&self) -> ConfigResult<Vec<LlmProviderConfig>> {
        Ok(self.snapshot()?.llm_providers)
    }

    async fn default_model(&self) -> ConfigResult<Option<String>> {
        Ok(self.snapshot()?.default_model)
    }

    async fn default_agent(&self) -> ConfigResult<Option<String>> {
        Ok(self.snapshot()?.default_agent)
    }

    async fn set_default_model(&self, model: &str) -> ConfigResult<()> {
        let mut config = self.snapshot()?;
        config.default_model = Some(model.to_string());
        self.save(&config)
    }

    async fn set_default_agent(&self, agent: &str) -> ConfigResult<()> {
        let mut config = self.snapshot()?;
        config.select_agent(agent)?;
        self.save(&config)
    }
}
