//! Configuration document and its entries

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::agents::AgentProfile;
use crate::transport::{Framing, ServerEndpoint};

use super::traits::{ConfigError, ConfigResult};

/// Configuration file structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Tool servers; older files spell the key `mcp_serrvers`
    #[serde(default, alias = "mcp_serrvers")]
    pub mcp_servers: Vec<ToolServerConfig>,

    #[serde(default)]
    pub llm_providers: Vec<LlmProviderConfig>,

    #[serde(default)]
    pub agents: Vec<AgentProfile>,

    /// `provider/model`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_agent: Option<String>,
}

impl ConfigFile {
    pub fn has_agent(&self, name: &str) -> bool {
        self.agents.iter().any(|a| a.name == name)
    }

    /// Set the default agent after checking it exists
    pub fn select_agent(&mut self, name: &str) -> ConfigResult<()> {
        if !self.has_agent(name) {
            return Err(ConfigError::AgentNotFound(name.to_string()));
        }
        self.default_agent = Some(name.to_string());
        Ok(())
    }
}

/// Wire transport named in a server entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    #[default]
    Sse,
    StreamableHttp,
    Tcp,
    Unix,
    Stdio,
}

/// One configured tool server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolServerConfig {
    pub name: String,

    #[serde(default)]
    pub transport: TransportKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// `host:port` for TCP servers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    /// Socket path for Unix servers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub env: HashMap<String, String>,

    /// Overrides the transport's default framing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framing: Option<Framing>,
}

impl ToolServerConfig {
    pub fn sse(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self::bare(name.into(), TransportKind::Sse).with_url(url)
    }

    pub fn streamable_http(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self::bare(name.into(), TransportKind::StreamableHttp).with_url(url)
    }

    pub fn stdio(name: impl Into<String>, command: impl Into<String>, args: Vec<String>) -> Self {
        let mut config = Self::bare(name.into(), TransportKind::Stdio);
        config.command = Some(command.into());
        config.args = args;
        config
    }

    fn bare(name: String, transport: TransportKind) -> Self {
        Self {
            name,
            transport,
            url: None,
            address: None,
            path: None,
            command: None,
            args: Vec::new(),
            env: HashMap::new(),
            framing: None,
        }
    }

    fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Build the endpoint this entry describes
    pub fn endpoint(&self) -> ConfigResult<ServerEndpoint> {
        let missing = |field: &str| ConfigError::InvalidServer {
            name: self.name.clone(),
            reason: format!("{:?} transport requires `{}`", self.transport, field),
        };

        let endpoint = match self.transport {
            TransportKind::Sse => ServerEndpoint::Sse {
                url: self.url.clone().ok_or_else(|| missing("url"))?,
            },
            TransportKind::StreamableHttp => ServerEndpoint::StreamableHttp {
                url: self.url.clone().ok_or_else(|| missing("url"))?,
            },
            TransportKind::Tcp => ServerEndpoint::Tcp {
                address: self.address.clone().ok_or_else(|| missing("address"))?,
                framing: self.framing.unwrap_or(Framing::ContentLength),
            },
            TransportKind::Unix => ServerEndpoint::Unix {
                path: self.path.clone().ok_or_else(|| missing("path"))?,
                framing: self.framing.unwrap_or(Framing::ContentLength),
            },
            TransportKind::Stdio => ServerEndpoint::Stdio {
                command: self.command.clone().ok_or_else(|| missing("command"))?,
                args: self.args.clone(),
                env: self.env.clone(),
                framing: self.framing.unwrap_or(Framing::Newline),
            },
        };
        Ok(endpoint)
    }
}

/// One configured model provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmProviderConfig {
    pub name: String,

    /// Backend kind, e.g. `ollama`, `openai`, `anthropic`
    #[serde(rename = "type")]
    pub provider_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Environment variable holding the API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
}

impl LlmProviderConfig {
    pub fn new(name: impl Into<String>, provider_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            provider_type: provider_type.into(),
            url: None,
            api_key: None,
            api_key_env: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_api_key_env(mut self, var: impl Into<String>) -> Self {
        self.api_key_env = Some(var.into());
        self
    }

    /// Inline key first, then the named environment variable
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Some(key) = self.api_key.as_ref().filter(|k| !k.is_empty()) {
            return Some(key.clone());
        }
        self.api_key_env
            .as_ref()
            .and_then(|var| std::env::var(var).ok())
            .filter(|k| !k.is_empty())
    }
}
