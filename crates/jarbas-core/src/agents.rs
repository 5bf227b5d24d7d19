//! Agent profiles
//!
//! A profile names a persona: its system prompt, whether tools are offered
//! to the model, and which tool patterns it may reach.

use serde::{Deserialize, Serialize};

use crate::orchestrator::ConversationError;
use crate::tools::ToolPattern;

/// A configured persona
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentProfile {
    pub name: String,
    pub system_content: String,
    #[serde(default)]
    pub enable_tools: bool,
    /// Exact names (`server.tool`) or server wildcards (`server.*`)
    #[serde(default)]
    pub tools: Vec<String>,
}

impl AgentProfile {
    pub fn new(name: impl Into<String>, system_content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            system_content: system_content.into(),
            enable_tools: false,
            tools: Vec::new(),
        }
    }

    /// Enable tool use restricted to `patterns`
    pub fn with_tools<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enable_tools = true;
        self.tools = patterns.into_iter().map(Into::into).collect();
        self
    }

    pub fn patterns(&self) -> Vec<ToolPattern> {
        self.tools.iter().map(|p| ToolPattern::parse(p)).collect()
    }

    /// Whether the model should be offered tools
    ///
    /// An enabled profile with no patterns reaches the whole catalog.
    pub fn uses_tools(&self) -> bool {
        self.enable_tools
    }
}

/// Lookup table of agent profiles by name
#[derive(Debug, Clone, Default)]
pub struct AgentBook {
    agents: Vec<AgentProfile>,
}

impl AgentBook {
    pub fn new(agents: Vec<AgentProfile>) -> Self {
        Self { agents }
    }

    pub fn get(&self, name: &str) -> Option<&AgentProfile> {
        self.agents.iter().find(|a| a.name == name)
    }

    /// Like `get`, failing with `UnknownAgent`
    pub fn require(&self, name: &str) -> Result<&AgentProfile, ConversationError> {
        self.get(name)
            .ok_or_else(|| ConversationError::UnknownAgent(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.agents.iter().map(|a| a.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_schema() {
        let agent: AgentProfile = serde_json::from_value(serde_json::json!({
            "name": "helpful",
            "system_content": "You are a helpful assistant.",
            "enable_tools": true,
            "tools": ["slack.*", "youtube.get_transcript"]
        }))
        .unwrap();
        assert!(agent.uses_tools());
        assert_eq!(
            agent.patterns(),
            vec![
                ToolPattern::Server("slack".into()),
                ToolPattern::Exact("youtube.get_transcript".into())
            ]
        );
    }

    #[test]
    fn test_tools_disabled() {
        let agent = AgentProfile {
            enable_tools: false,
            ..AgentProfile::new("quiet", "No tools.").with_tools(["slack.*"])
        };
        assert!(!agent.uses_tools());
    }

    #[test]
    fn test_unknown_agent() {
        let book = AgentBook::new(vec![AgentProfile::new("helpful", "Be helpful.")]);
        assert!(book.require("helpful").is_ok());
        assert!(matches!(
            book.require("grumpy"),
            Err(ConversationError::UnknownAgent(ref name)) if name == "grumpy"
        ));
        assert_eq!(book.names().collect::<Vec<_>>(), vec!["helpful"]);
    }
}
