//! Tool name patterns

use crate::types::{split_qualified, ToolDefinition, NAMESPACE_SEPARATOR};

/// Selects tools from the catalog
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ToolPattern {
    /// One namespaced tool, `server.tool`
    Exact(String),
    /// Every tool of a server, written `server.*`
    Server(String),
}

impl ToolPattern {
    pub fn parse(pattern: &str) -> Self {
        match pattern.strip_suffix(".*") {
            Some(server) => ToolPattern::Server(server.to_string()),
            None => ToolPattern::Exact(pattern.to_string()),
        }
    }

    /// Server this pattern points at, if it names one
    pub fn server(&self) -> Option<&str> {
        match self {
            ToolPattern::Server(server) => Some(server),
            ToolPattern::Exact(name) => split_qualified(name).map(|(server, _)| server),
        }
    }

    /// Case-sensitive match against a namespaced definition
    pub fn matches(&self, def: &ToolDefinition) -> bool {
        match self {
            ToolPattern::Exact(name) => def.name == *name,
            ToolPattern::Server(server) => def
                .name
                .strip_prefix(server.as_str())
                .map_or(false, |rest| rest.starts_with(NAMESPACE_SEPARATOR)),
        }
    }
}

impl std::fmt::Display for ToolPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolPattern::Exact(name) => write!(f, "{}", name),
            ToolPattern::Server(server) => write!(f, "{}.*", server),
        }
    }
}

impl From<&str> for ToolPattern {
    fn from(pattern: &str) -> Self {
        ToolPattern::parse(pattern)
    }
}
