//! Tool-level client for one server

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::logging::Logger;
use crate::transport::{Connector, ServerEndpoint};
use crate::types::{CancellationToken, ToolDefinition, ToolErrorKind, ToolFailure, ToolOutcome};

use super::error::{McpError, McpResult};
use super::options::ClientOptions;
use super::pool::SessionPool;
use super::wire::Reply;

/// Anything that can list and invoke the tools of a single server
///
/// Implementations:
/// - `ToolProtocolClient`: JSON-RPC over SSE, sockets or stdio
/// - `SdkToolClient`: Streamable HTTP through the official MCP SDK
#[async_trait]
pub trait ToolServerClient: Send + Sync {
    /// Configured server name, used as the tool namespace
    fn server_name(&self) -> &str;

    /// Fetch the server's tool catalog, following pagination
    async fn list_tools(&self) -> McpResult<Vec<ToolDefinition>>;

    /// Invoke a tool by its short name
    ///
    /// Remote-side errors come back as `ToolOutcome::Failure`; only local
    /// failures (transport, timeout, cancellation) are returned as `Err`.
    async fn call_tool(
        &self,
        name: &str,
        arguments: Value,
        cancel: &CancellationToken,
    ) -> McpResult<ToolOutcome>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListToolsPage {
    #[serde(default)]
    tools: Vec<WireTool>,
    #[serde(default)]
    next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireTool {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    input_schema: Option<Value>,
}

impl WireTool {
    fn into_definition(self, server: &str) -> ToolDefinition {
        let mut def = ToolDefinition::new(server, self.name);
        if let Some(description) = self.description {
            def = def.with_description(description);
        }
        if let Some(schema) = self.input_schema {
            def = def.with_schema(schema);
        }
        def
    }
}

/// JSON-RPC tool client backed by a [`SessionPool`]
pub struct ToolProtocolClient {
    pool: SessionPool,
    logger: Arc<dyn Logger>,
}

impl ToolProtocolClient {
    pub fn new(
        server: impl Into<String>,
        endpoint: ServerEndpoint,
        connector: Arc<dyn Connector>,
        options: ClientOptions,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            pool: SessionPool::new(server, endpoint, connector, options, Arc::clone(&logger)),
            logger,
        }
    }

    pub fn pool(&self) -> &SessionPool {
        &self.pool
    }
}

#[async_trait]
impl ToolServerClient for ToolProtocolClient {
    fn server_name(&self) -> &str {
        self.pool.server()
    }

    async fn list_tools(&self) -> McpResult<Vec<ToolDefinition>> {
        let server = self.pool.server();
        // Listing runs on its own short-lived session
        let session = self.pool.open_session().await?;

        let mut tools = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let params = match &cursor {
                Some(cursor) => json!({ "cursor": cursor }),
                None => json!({}),
            };
            let page: ListToolsPage = serde_json::from_value(session.call("tools/list", params).await?)
                .map_err(|e| McpError::InvalidResponse(format!("tools/list: {}", e)))?;

            tools.extend(page.tools.into_iter().map(|t| t.into_definition(server)));

            match page.next_cursor {
                Some(next) if !next.is_empty() && cursor.as_deref() != Some(next.as_str()) => {
                    cursor = Some(next);
                }
                _ => break,
            }
        }
        session.close();

        self.logger
            .info(&format!("[ToolClient:{}] Listed {} tools", server, tools.len()));
        Ok(tools)
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: Value,
        cancel: &CancellationToken,
    ) -> McpResult<ToolOutcome> {
        if cancel.is_cancelled() {
            return Err(McpError::Cancelled);
        }

        let session = match cancel.run_until_cancelled(self.pool.acquire()).await {
            Some(session) => session?,
            None => return Err(McpError::Cancelled),
        };

        self.logger.debug(&format!(
            "[ToolClient:{}] Calling {} with {}",
            self.pool.server(),
            name,
            arguments
        ));

        let id = session
            .send("tools/call", json!({ "name": name, "arguments": arguments }))
            .await?;
        let reply = session
            .receive_with(id, session.request_timeout(), Some(cancel))
            .await?;

        Ok(normalize_reply(reply))
    }
}

/// Turn a `tools/call` reply into a tool outcome
pub fn normalize_reply(reply: Reply) -> ToolOutcome {
    match reply {
        Reply::Error(remote) => {
            ToolOutcome::Failure(ToolFailure::protocol(remote.code, remote.message, remote.data))
        }
        Reply::Result(result) => normalize_call_result(&result),
    }
}

/// Extract the payload of a `tools/call` result
///
/// Reads the legacy `toolResult` wrapper when present. The first content
/// item is the payload; a text item whose text is valid JSON yields the
/// parsed value. An empty content list yields `null`.
pub fn normalize_call_result(result: &Value) -> ToolOutcome {
    let envelope = result.get("toolResult").unwrap_or(result);

    let items = match envelope.get("content") {
        Some(Value::Array(items)) => items,
        Some(other) => {
            return ToolOutcome::Failure(ToolFailure::new(
                ToolErrorKind::InvalidResponse,
                format!("content is not a list: {}", other),
            ))
        }
        None => {
            return ToolOutcome::Failure(ToolFailure::new(
                ToolErrorKind::InvalidResponse,
                "tool result has no content",
            ))
        }
    };

    let payload = items.first().map(unwrap_content_item).unwrap_or(Value::Null);

    let is_error = envelope
        .get("isError")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    if !is_error {
        return ToolOutcome::Success(payload);
    }

    let message = match items.first().and_then(|i| i.get("text")).and_then(Value::as_str) {
        Some(text) => text.to_string(),
        None if payload.is_null() => "tool reported an error".to_string(),
        None => payload.to_string(),
    };
    let mut failure = ToolFailure::new(ToolErrorKind::ToolReported, message);
    failure.data = Some(payload);
    ToolOutcome::Failure(failure)
}

fn unwrap_content_item(item: &Value) -> Value {
    match item.get("text").and_then(|t| t.as_str()) {
        Some(text) => serde_json::from_str(text).unwrap_or_else(|_| item.clone()),
        None => item.clone(),
    }
}
