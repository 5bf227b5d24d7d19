//! Building tool server clients from configuration

use std::sync::Arc;

use crate::config::{ConfigProvider, ConfigResult, ToolServerConfig};
use crate::logging::Logger;
use crate::mcp::SdkToolClient;
use crate::protocol::{ClientOptions, ToolProtocolClient, ToolServerClient};
use crate::transport::{Connector, ServerEndpoint};

use super::registry::ToolRegistry;

/// Client for one configured server
///
/// Streamable HTTP servers go through the MCP SDK; every other transport
/// uses the JSON-RPC session stack over `connector`.
pub fn client_for(
    server: &ToolServerConfig,
    connector: Arc<dyn Connector>,
    options: ClientOptions,
    logger: Arc<dyn Logger>,
) -> ConfigResult<Arc<dyn ToolServerClient>> {
    let client: Arc<dyn ToolServerClient> = match server.endpoint()? {
        ServerEndpoint::StreamableHttp { url } => {
            Arc::new(SdkToolClient::new(server.name.as_str(), url, options, logger))
        }
        endpoint => Arc::new(ToolProtocolClient::new(
            server.name.as_str(),
            endpoint,
            connector,
            options,
            logger,
        )),
    };
    Ok(client)
}

/// Registry with one client per configured server, not yet refreshed
///
/// Entries that cannot be turned into a client are logged and marked
/// unavailable, so they show up as failed in every refresh outcome while
/// the other servers load normally.
pub async fn registry_from_config(
    config: &dyn ConfigProvider,
    connector: Arc<dyn Connector>,
    options: ClientOptions,
    logger: Arc<dyn Logger>,
) -> ConfigResult<ToolRegistry> {
    let registry = ToolRegistry::new(Arc::clone(&logger));
    for server in config.tool_servers().await? {
        match client_for(&server, Arc::clone(&connector), options.clone(), Arc::clone(&logger)) {
            Ok(client) => registry.add_client(client),
            Err(e) => {
                logger.error(&format!("[ToolRegistry] Skipping server {}: {}", server.name, e));
                registry.mark_unavailable(server.name.as_str(), e.to_string());
            }
        }
    }
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigFile, MemoryConfigProvider, TransportKind};
    use crate::logging::{LogLevel, MemoryLogger, NoOpLogger};
    use crate::transport::NetworkConnector;

    #[tokio::test]
    async fn test_registry_from_config() {
        let mut broken = ToolServerConfig::sse("broken", "http://unused");
        broken.transport = TransportKind::Tcp;
        let config = MemoryConfigProvider::with_config(ConfigFile {
            mcp_servers: vec![
                ToolServerConfig::sse("slack", "http://localhost:8201/sse"),
                ToolServerConfig::streamable_http("docs", "http://localhost:8300/mcp"),
                broken,
            ],
            ..Default::default()
        });
        let logger = Arc::new(MemoryLogger::new());
        let connector = Arc::new(NetworkConnector::new(Arc::new(NoOpLogger)));

        let registry = registry_from_config(&config, connector, ClientOptions::default(), logger.clone())
            .await
            .unwrap();

        assert_eq!(registry.servers(), vec!["slack".to_string(), "docs".to_string()]);
        assert_eq!(registry.tool_count(), 0);
        assert!(logger.contains(LogLevel::Error, "Skipping server broken"));
        assert_eq!(registry.unavailable()[0].server, "broken");
    }

    #[tokio::test]
    async fn test_broken_entry_fails_refresh() {
        let mut broken = ToolServerConfig::sse("broken", "http://unused");
        broken.transport = TransportKind::Tcp;
        let config = MemoryConfigProvider::with_config(ConfigFile {
            mcp_servers: vec![broken],
            ..Default::default()
        });
        let connector = Arc::new(NetworkConnector::new(Arc::new(NoOpLogger)));

        let registry = registry_from_config(&config, connector, ClientOptions::default(), Arc::new(NoOpLogger))
            .await
            .unwrap();
        let outcome = registry.refresh().await;

        assert!(outcome.loaded.is_empty());
        assert_eq!(outcome.failed_servers(), vec!["broken"]);
        assert_eq!(outcome.tool_count, 0);
    }
}
