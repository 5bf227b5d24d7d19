//! Tool registry
//!
//! Aggregates the tool catalogs of every configured server under
//! namespaced names (`server.tool`), answers pattern queries, maps the
//! short names models reply with back to catalog entries, and routes
//! invocations to the owning server's client.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures::future::join_all;
use parking_lot::RwLock;
use serde_json::Value;

use crate::logging::Logger;
use crate::protocol::ToolServerClient;
use crate::types::{
    qualify, split_qualified, CancellationToken, ToolCallResult, ToolDefinition, ToolErrorKind,
    ToolFailure, ToolOutcome, NAMESPACE_SEPARATOR,
};

use super::pattern::ToolPattern;

/// Immutable snapshot of all known tools
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<ToolDefinition>,
    index: HashMap<String, usize>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a definition; returns false if the name is already taken
    pub fn insert(&mut self, def: ToolDefinition) -> bool {
        if self.index.contains_key(&def.name) {
            return false;
        }
        self.index.insert(def.name.clone(), self.entries.len());
        self.entries.push(def);
        true
    }

    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        self.index.get(name).map(|&i| &self.entries[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &ToolDefinition> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry of `server` answering to `name`, directly or once the
    /// `<server>_` prefix is stripped from either side
    fn find_in_server(&self, server: &str, name: &str) -> Option<&ToolDefinition> {
        let prefix = format!("{}_", server);
        let mut in_server = self.entries.iter().filter(|d| d.server == server);

        if let Some(def) = in_server.clone().find(|d| d.short_name == name) {
            return Some(def);
        }
        in_server.find(|d| {
            d.short_name.strip_prefix(prefix.as_str()) == Some(name)
                || name.strip_prefix(prefix.as_str()) == Some(d.short_name.as_str())
        })
    }
}

/// One server that could not be loaded during a refresh
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerFailure {
    pub server: String,
    pub error: String,
}

/// Result of a refresh; partial success is normal
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshOutcome {
    /// Servers whose tools are in the new catalog
    pub loaded: Vec<String>,
    /// Servers left out of the new catalog
    pub failed: Vec<ServerFailure>,
    /// Total definitions installed
    pub tool_count: usize,
}

impl RefreshOutcome {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn failed_servers(&self) -> Vec<&str> {
        self.failed.iter().map(|f| f.server.as_str()).collect()
    }
}

/// Shared, read-mostly catalog of tools across servers
pub struct ToolRegistry {
    clients: RwLock<Vec<Arc<dyn ToolServerClient>>>,
    /// Configured servers that never got a client
    unavailable: RwLock<Vec<ServerFailure>>,
    catalog: RwLock<Arc<Catalog>>,
    logger: Arc<dyn Logger>,
}

impl ToolRegistry {
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self {
            clients: RwLock::new(Vec::new()),
            unavailable: RwLock::new(Vec::new()),
            catalog: RwLock::new(Arc::new(Catalog::new())),
            logger,
        }
    }

    pub fn with_clients(clients: Vec<Arc<dyn ToolServerClient>>, logger: Arc<dyn Logger>) -> Self {
        let registry = Self::new(logger);
        *registry.clients.write() = clients;
        registry
    }

    /// Register a server client, replacing one with the same name
    pub fn add_client(&self, client: Arc<dyn ToolServerClient>) {
        self.unavailable.write().retain(|f| f.server != client.server_name());
        let mut clients = self.clients.write();
        match clients.iter().position(|c| c.server_name() == client.server_name()) {
            Some(pos) => clients[pos] = client,
            None => clients.push(client),
        }
    }

    /// Record a configured server that could not be set up
    ///
    /// It stays listed in the `failed` part of every refresh outcome until
    /// a client with the same name is added.
    pub fn mark_unavailable(&self, server: impl Into<String>, error: impl Into<String>) {
        let failure = ServerFailure {
            server: server.into(),
            error: error.into(),
        };
        let mut unavailable = self.unavailable.write();
        match unavailable.iter().position(|f| f.server == failure.server) {
            Some(pos) => unavailable[pos] = failure,
            None => unavailable.push(failure),
        }
    }

    pub fn unavailable(&self) -> Vec<ServerFailure> {
        self.unavailable.read().clone()
    }

    pub fn client(&self, server: &str) -> Option<Arc<dyn ToolServerClient>> {
        self.clients
            .read()
            .iter()
            .find(|c| c.server_name() == server)
            .cloned()
    }

    pub fn servers(&self) -> Vec<String> {
        self.clients.read().iter().map(|c| c.server_name().to_string()).collect()
    }

    /// Current catalog snapshot
    pub fn catalog(&self) -> Arc<Catalog> {
        self.catalog.read().clone()
    }

    pub fn tool_count(&self) -> usize {
        self.catalog.read().len()
    }

    /// Replace the client set, then refresh
    ///
    /// Servers previously marked unavailable are forgotten.
    pub async fn refresh_from(&self, clients: Vec<Arc<dyn ToolServerClient>>) -> RefreshOutcome {
        self.unavailable.write().clear();
        *self.clients.write() = clients;
        self.refresh().await
    }

    /// Reload every server's tools and install the new catalog atomically
    ///
    /// Servers are listed concurrently. A server that fails is left out of
    /// the new catalog and reported in the outcome.
    pub async fn refresh(&self) -> RefreshOutcome {
        let clients = self.clients.read().clone();
        let listings = join_all(clients.iter().map(|client| async move {
            (client.server_name().to_string(), client.list_tools().await)
        }))
        .await;

        let mut catalog = Catalog::new();
        let mut outcome = RefreshOutcome {
            failed: self.unavailable(),
            ..Default::default()
        };

        for (server, listing) in listings {
            match listing {
                Ok(tools) => {
                    self.logger.info(&format!(
                        "[ToolRegistry] Discovered {} tools from {}",
                        tools.len(),
                        server
                    ));
                    for def in tools {
                        let name = def.name.clone();
                        if !catalog.insert(def) {
                            self.logger.warn(&format!(
                                "[ToolRegistry] Duplicate tool {} from {}, keeping the first",
                                name, server
                            ));
                        }
                    }
                    outcome.loaded.push(server);
                }
                Err(e) => {
                    self.logger.error(&format!(
                        "[ToolRegistry] Failed to load tools from {}: {}",
                        server, e
                    ));
                    outcome.failed.push(ServerFailure {
                        server,
                        error: e.to_string(),
                    });
                }
            }
        }

        outcome.tool_count = catalog.len();
        *self.catalog.write() = Arc::new(catalog);
        outcome
    }

    pub fn get(&self, name: &str) -> Option<ToolDefinition> {
        self.catalog.read().get(name).cloned()
    }

    /// Definitions matching any pattern, in pattern order, without repeats
    ///
    /// No patterns selects the whole catalog.
    pub fn query(&self, patterns: &[ToolPattern]) -> Vec<ToolDefinition> {
        let catalog = self.catalog();
        if patterns.is_empty() {
            return catalog.iter().cloned().collect();
        }

        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for pattern in patterns {
            for def in catalog.iter().filter(|d| pattern.matches(d)) {
                if seen.insert(def.name.as_str()) {
                    out.push(def.clone());
                }
            }
        }
        out
    }

    /// Map a name returned by a model to a namespaced tool name
    ///
    /// 1. A name that is already namespaced is returned as is.
    /// 2. Otherwise every allowed pattern is checked for a tool answering
    ///    to the name; exactly one distinct candidate wins, several are
    ///    `AmbiguousResolution`.
    /// 3. Without candidates the name goes under the first pattern's server.
    /// 4. Without patterns the name stays unqualified.
    pub fn resolve(&self, name: &str, allowed: &[ToolPattern]) -> Result<String, ToolFailure> {
        if name.contains(NAMESPACE_SEPARATOR) {
            return Ok(name.to_string());
        }

        let catalog = self.catalog();
        let mut candidates: Vec<String> = Vec::new();
        for pattern in allowed {
            let found = match pattern {
                ToolPattern::Server(server) => {
                    catalog.find_in_server(server, name).map(|d| d.name.clone())
                }
                ToolPattern::Exact(full) => split_qualified(full)
                    .filter(|(_, short)| *short == name)
                    .map(|_| full.clone()),
            };
            if let Some(candidate) = found {
                if !candidates.contains(&candidate) {
                    candidates.push(candidate);
                }
            }
        }

        match candidates.len() {
            0 => Ok(allowed
                .first()
                .and_then(|p| p.server())
                .map(|server| qualify(server, name))
                .unwrap_or_else(|| name.to_string())),
            1 => Ok(candidates.remove(0)),
            _ => Err(ToolFailure::new(
                ToolErrorKind::AmbiguousResolution,
                format!("'{}' matches several tools: {}", name, candidates.join(", ")),
            )),
        }
    }

    /// Invoke a namespaced tool
    ///
    /// Never fails: unknown servers or tools and every remote or transport
    /// problem come back as a failure inside the result.
    pub async fn call(&self, name: &str, arguments: Value, cancel: &CancellationToken) -> ToolCallResult {
        self.logger.info(&format!("[ToolRegistry] Calling tool: {}", name));
        match self.invoke(name, arguments, cancel).await {
            Ok(outcome) => ToolCallResult {
                tool: name.to_string(),
                result: outcome,
            },
            Err(failure) => {
                self.logger
                    .warn(&format!("[ToolRegistry] Tool {} failed: {}", name, failure));
                ToolCallResult::failure(name, failure)
            }
        }
    }

    async fn invoke(
        &self,
        name: &str,
        arguments: Value,
        cancel: &CancellationToken,
    ) -> Result<ToolOutcome, ToolFailure> {
        let (server, short_name) = split_qualified(name).ok_or_else(|| {
            ToolFailure::new(
                ToolErrorKind::ToolNotFound,
                format!("'{}' is not a namespaced tool name", name),
            )
        })?;

        let client = self.client(server).ok_or_else(|| {
            ToolFailure::new(
                ToolErrorKind::ServerNotFound,
                format!("No tool server named '{}'", server),
            )
        })?;

        if self.catalog.read().get(name).is_none() {
            return Err(ToolFailure::new(
                ToolErrorKind::ToolNotFound,
                format!("Server '{}' has no tool '{}'", server, short_name),
            ));
        }

        client
            .call_tool(short_name, arguments, cancel)
            .await
            .map_err(|e| e.to_failure())
    }
}
