//! Tool server client using the official rmcp SDK
//!
//! Serves Streamable HTTP endpoints, which the in-house session stack
//! does not speak. Results go through the same normalization as
//! `ToolProtocolClient`, so callers cannot tell the two apart.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rmcp::{
    model::{CallToolRequestParams, ClientCapabilities, ClientInfo, Implementation, Tool},
    service::{RunningService, ServiceError},
    transport::StreamableHttpClientTransport,
    RoleClient, ServiceExt,
};
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use crate::logging::Logger;
use crate::protocol::{
    normalize_call_result, ClientOptions, McpError, McpResult, RemoteError, ToolServerClient,
};
use crate::types::{CancellationToken, ToolDefinition, ToolErrorKind, ToolFailure, ToolOutcome};

type SdkService = RunningService<RoleClient, ClientInfo>;

/// Streamable HTTP tool client
///
/// Connects on first use and keeps the connection; a connection that
/// reports itself closed is dropped and re-established on the next call.
pub struct SdkToolClient {
    server: String,
    url: String,
    options: ClientOptions,
    service: Mutex<Option<Arc<SdkService>>>,
    logger: Arc<dyn Logger>,
}

impl SdkToolClient {
    pub fn new(
        server: impl Into<String>,
        url: impl Into<String>,
        options: ClientOptions,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            server: server.into(),
            url: url.into(),
            options,
            service: Mutex::new(None),
            logger,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn client_info(&self) -> ClientInfo {
        ClientInfo {
            meta: None,
            protocol_version: Default::default(),
            capabilities: ClientCapabilities::default(),
            client_info: Implementation {
                name: self.options.client_name.clone(),
                title: Some("Jarbas".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                website_url: None,
                icons: None,
            },
        }
    }

    async fn service(&self) -> McpResult<Arc<SdkService>> {
        let mut slot = self.service.lock().await;
        if let Some(service) = slot.as_ref() {
            return Ok(Arc::clone(service));
        }

        self.logger.info(&format!(
            "[SdkToolClient:{}] Connecting to HTTP: {}",
            self.server, self.url
        ));

        let transport = StreamableHttpClientTransport::from_uri(self.url.as_str());
        let connecting = self.client_info().serve(transport);
        let service = match tokio::time::timeout(self.options.handshake_timeout, connecting).await {
            Ok(Ok(service)) => Arc::new(service),
            Ok(Err(e)) => {
                return Err(McpError::ServerUnreachable {
                    server: self.server.clone(),
                    reason: e.to_string(),
                })
            }
            Err(_) => {
                return Err(McpError::Timeout {
                    method: "initialize".to_string(),
                    timeout: self.options.handshake_timeout,
                })
            }
        };

        self.logger.info(&format!("[SdkToolClient:{}] Connected and initialized", self.server));
        *slot = Some(Arc::clone(&service));
        Ok(service)
    }

    async fn forget_if_closed(&self, err: &McpError) {
        if matches!(err, McpError::TransportClosed) {
            *self.service.lock().await = None;
        }
    }

    async fn bounded<T, F>(
        &self,
        method: &str,
        timeout: Duration,
        cancel: &CancellationToken,
        fut: F,
    ) -> McpResult<T>
    where
        F: std::future::Future<Output = Result<T, ServiceError>>,
    {
        match cancel.run_until_cancelled(tokio::time::timeout(timeout, fut)).await {
            None => Err(McpError::Cancelled),
            Some(Err(_)) => Err(McpError::Timeout {
                method: method.to_string(),
                timeout,
            }),
            Some(Ok(result)) => result.map_err(map_service_error),
        }
    }
}

/// Convert an SDK failure into the protocol error taxonomy
fn map_service_error(err: ServiceError) -> McpError {
    match err {
        ServiceError::McpError(data) => McpError::Remote(RemoteError {
            code: i64::from(data.code.0),
            message: data.message.to_string(),
            data: data.data,
        }),
        ServiceError::TransportClosed => McpError::TransportClosed,
        other => McpError::InvalidResponse(other.to_string()),
    }
}

fn to_definition(server: &str, tool: Tool) -> ToolDefinition {
    let mut def = ToolDefinition::new(server, tool.name.to_string())
        .with_schema(serde_json::to_value(tool.input_schema.as_ref()).unwrap_or_default());
    if let Some(description) = tool.description {
        def = def.with_description(description.to_string());
    }
    def
}

#[async_trait]
impl ToolServerClient for SdkToolClient {
    fn server_name(&self) -> &str {
        &self.server
    }

    async fn list_tools(&self) -> McpResult<Vec<ToolDefinition>> {
        let service = self.service().await?;
        let listed = self
            .bounded(
                "tools/list",
                self.options.request_timeout,
                &CancellationToken::new(),
                service.list_all_tools(),
            )
            .await;

        let tools = match listed {
            Ok(tools) => tools,
            Err(e) => {
                self.forget_if_closed(&e).await;
                return Err(e);
            }
        };

        self.logger.info(&format!(
            "[SdkToolClient:{}] Listed {} tools",
            self.server,
            tools.len()
        ));
        Ok(tools.into_iter().map(|t| to_definition(&self.server, t)).collect())
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: Value,
        cancel: &CancellationToken,
    ) -> McpResult<ToolOutcome> {
        let arguments = match sdk_arguments(arguments) {
            Ok(arguments) => arguments,
            Err(failure) => {
                self.logger.warn(&format!(
                    "[SdkToolClient:{}] Not calling {}: {}",
                    self.server, name, failure.message
                ));
                return Ok(ToolOutcome::Failure(failure));
            }
        };

        let service = match cancel.run_until_cancelled(self.service()).await {
            Some(service) => service?,
            None => return Err(McpError::Cancelled),
        };

        self.logger
            .debug(&format!("[SdkToolClient:{}] Calling {}", self.server, name));

        let params = CallToolRequestParams {
            meta: None,
            name: name.to_owned().into(),
            arguments,
            task: None,
        };

        let called = self
            .bounded("tools/call", self.options.request_timeout, cancel, service.call_tool(params))
            .await;

        match called {
            Ok(result) => {
                let raw = serde_json::to_value(&result)?;
                Ok(normalize_call_result(&raw))
            }
            // Remote-side errors are results, not failures of the call
            Err(McpError::Remote(remote)) => Ok(ToolOutcome::Failure(ToolFailure::protocol(
                remote.code,
                remote.message,
                remote.data,
            ))),
            Err(e) => {
                self.forget_if_closed(&e).await;
                Err(e)
            }
        }
    }
}

/// The SDK only carries object arguments; `null` means none at all
fn sdk_arguments(arguments: Value) -> Result<Option<Map<String, Value>>, ToolFailure> {
    match arguments {
        Value::Object(map) => Ok(Some(map)),
        Value::Null => Ok(None),
        Value::String(raw) => Err(ToolFailure::new(
            ToolErrorKind::InvalidArguments,
            format!("arguments are not a JSON object: {}", raw),
        )),
        other => Err(ToolFailure::new(
            ToolErrorKind::InvalidArguments,
            format!("arguments are not a JSON object: {}", other),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;
    use serde_json::json;

    #[test]
    fn test_remote_error_mapping() {
        let err = map_service_error(ServiceError::McpError(rmcp::model::ErrorData::new(
            rmcp::model::ErrorCode(-32601),
            "method not found",
            Some(json!({"method": "tools/call"})),
        )));
        match err {
            McpError::Remote(remote) => {
                assert_eq!(remote.code, -32601);
                assert_eq!(remote.message, "method not found");
                assert_eq!(remote.data, Some(json!({"method": "tools/call"})));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_sdk_result_normalizes_like_wire_result() {
        let raw = json!({
            "content": [{"type": "text", "text": "{\"ok\":true}"}],
            "isError": false
        });
        assert_eq!(normalize_call_result(&raw), ToolOutcome::Success(json!({"ok": true})));
    }

    #[test]
    fn test_sdk_arguments() {
        let map = sdk_arguments(json!({"limit": 10})).unwrap().unwrap();
        assert_eq!(map.get("limit"), Some(&json!(10)));
        assert_eq!(sdk_arguments(Value::Null).unwrap(), None);

        let failure = sdk_arguments(json!("{limit: 10")).unwrap_err();
        assert_eq!(failure.kind, ToolErrorKind::InvalidArguments);
        assert!(failure.message.contains("{limit: 10"));
        assert!(sdk_arguments(json!([1, 2])).is_err());
    }

    #[tokio::test]
    async fn test_raw_arguments_are_reported_to_the_model() {
        // Checked before connecting, so the unreachable url is never dialed
        let client = SdkToolClient::new(
            "docs",
            "http://127.0.0.1:1/mcp",
            ClientOptions::default(),
            Arc::new(NoOpLogger),
        );
        let outcome = client
            .call_tool("search", json!("{query: rust"), &CancellationToken::new())
            .await
            .unwrap();
        let failure = outcome.failure().unwrap();
        assert_eq!(failure.kind, ToolErrorKind::InvalidArguments);
        assert!(failure.message.contains("{query: rust"));
    }

    #[tokio::test]
    async fn test_unreachable_server() {
        let client = SdkToolClient::new(
            "docs",
            "http://127.0.0.1:1/mcp",
            ClientOptions::default().with_handshake_timeout(Duration::from_secs(2)),
            Arc::new(NoOpLogger),
        );
        let err = client.list_tools().await.unwrap_err();
        assert!(matches!(
            err,
            McpError::ServerUnreachable { .. } | McpError::Timeout { .. }
        ));
        assert!(matches!(
            err.to_failure().kind,
            ToolErrorKind::ServerUnreachable | ToolErrorKind::Timeout
        ));
    }
}
