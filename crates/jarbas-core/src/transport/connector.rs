//! Opening links to tool servers

use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

use crate::logging::{Logger, ScopedLogger};

use super::endpoint::ServerEndpoint;
use super::error::{TransportError, TransportResult};
use super::link::Link;
use super::sse::connect_sse;

/// Establishes links to tool servers
///
/// Implementations:
/// - `NetworkConnector`: real sockets, HTTP and child processes
/// - test connectors that hand out in-process links
#[async_trait]
pub trait Connector: Send + Sync {
    /// Open a fresh link; `label` names the server in log lines
    async fn connect(&self, label: &str, endpoint: &ServerEndpoint) -> TransportResult<Link>;
}

/// Production connector
pub struct NetworkConnector {
    http: reqwest::Client,
    logger: Arc<dyn Logger>,
}

impl NetworkConnector {
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self {
            http: reqwest::Client::new(),
            logger,
        }
    }

    /// Use a preconfigured HTTP client (proxies, TLS roots, ...)
    pub fn with_http_client(http: reqwest::Client, logger: Arc<dyn Logger>) -> Self {
        Self { http, logger }
    }
}

#[async_trait]
impl Connector for NetworkConnector {
    async fn connect(&self, label: &str, endpoint: &ServerEndpoint) -> TransportResult<Link> {
        self.logger.debug(&format!("[Connector] Connecting to {} ({})", label, endpoint));

        match endpoint {
            ServerEndpoint::Sse { url } => {
                connect_sse(self.http.clone(), url, label, Arc::clone(&self.logger)).await
            }
            ServerEndpoint::Tcp { address, framing } => {
                let stream = tokio::net::TcpStream::connect(address)
                    .await
                    .map_err(|e| TransportError::ConnectionFailed(format!("{}: {}", address, e)))?;
                let (reader, writer) = stream.into_split();
                Ok(Link::framed(reader, writer, *framing, label, Arc::clone(&self.logger)))
            }
            #[cfg(unix)]
            ServerEndpoint::Unix { path, framing } => {
                let stream = tokio::net::UnixStream::connect(path).await.map_err(|e| {
                    TransportError::ConnectionFailed(format!("{}: {}", path.display(), e))
                })?;
                let (reader, writer) = stream.into_split();
                Ok(Link::framed(reader, writer, *framing, label, Arc::clone(&self.logger)))
            }
            #[cfg(not(unix))]
            ServerEndpoint::Unix { .. } => Err(TransportError::Unsupported(
                "Unix sockets are not available on this platform".to_string(),
            )),
            ServerEndpoint::Stdio { command, args, env, framing } => {
                let mut cmd = Command::new(command);
                cmd.args(args)
                    .envs(env)
                    .stdin(Stdio::piped())
                    .stdout(Stdio::piped())
                    .stderr(Stdio::piped())
                    .kill_on_drop(true);

                let mut child = cmd.spawn().map_err(|e| {
                    TransportError::ConnectionFailed(format!("Failed to spawn `{}`: {}", command, e))
                })?;

                let stdin = child
                    .stdin
                    .take()
                    .ok_or_else(|| TransportError::ConnectionFailed("Failed to open stdin".to_string()))?;
                let stdout = child
                    .stdout
                    .take()
                    .ok_or_else(|| TransportError::ConnectionFailed("Failed to open stdout".to_string()))?;

                let mut link = Link::framed(stdout, stdin, *framing, label, Arc::clone(&self.logger));

                if let Some(stderr) = child.stderr.take() {
                    let logger =
                        ScopedLogger::new(format!("{}:stderr", label), Arc::clone(&self.logger));
                    link = link.with_task(tokio::spawn(async move {
                        let mut lines = BufReader::new(stderr).lines();
                        while let Ok(Some(line)) = lines.next_line().await {
                            if !line.trim().is_empty() {
                                logger.debug(line.trim());
                            }
                        }
                    }));
                }

                Ok(link.with_child(child))
            }
            ServerEndpoint::StreamableHttp { url } => Err(TransportError::Unsupported(format!(
                "{} uses Streamable HTTP; connect it through the MCP SDK client",
                url
            ))),
        }
    }
}
