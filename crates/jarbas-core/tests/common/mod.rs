//! In-process tool servers for integration tests
//!
//! Each fake server speaks JSON-RPC over a `tokio::io::duplex` pipe with
//! Content-Length framing, so the whole client stack runs unmodified.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use jarbas_core::logging::{Logger, NoOpLogger};
use jarbas_core::protocol::{ClientOptions, ToolProtocolClient, ToolServerClient};
use jarbas_core::transport::{Connector, Framing, Link, ServerEndpoint, TransportError, TransportResult};

/// How a fake server answers one `tools/call`
pub enum CallReply {
    /// `result.content[0].text` carrying this value as JSON text
    Json(Value),
    /// Same payload under the legacy `toolResult` wrapper
    LegacyJson(Value),
    /// An error envelope
    Error { code: i64, message: String },
    /// Never answer
    Silent,
}

type Handler = Box<dyn Fn(&str, &Value) -> CallReply + Send + Sync>;

pub struct FakeServer {
    name: String,
    tools: Vec<&'static str>,
    handler: Handler,
    /// Send a reply for an id nobody asked for before each call answer
    stray_reply: bool,
    calls: AtomicUsize,
}

impl FakeServer {
    pub fn new<F>(name: &str, tools: Vec<&'static str>, handler: F) -> Self
    where
        F: Fn(&str, &Value) -> CallReply + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            tools,
            handler: Box::new(handler),
            stray_reply: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_stray_reply(mut self) -> Self {
        self.stray_reply = true;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn listing(&self) -> Value {
        let tools: Vec<Value> = self
            .tools
            .iter()
            .map(|name| {
                json!({
                    "name": name,
                    "description": format!("{} on {}", name, self.name),
                    "inputSchema": {"type": "object", "properties": {}}
                })
            })
            .collect();
        json!({ "tools": tools })
    }

    async fn serve(self: Arc<Self>, mut link: Link) {
        while let Some(message) = link.recv().await {
            let Some(id) = message.get("id").cloned() else {
                continue;
            };
            let method = message["method"].as_str().unwrap_or_default();
            let params = message.get("params").cloned().unwrap_or(Value::Null);

            let result = match method {
                "initialize" => json!({
                    "protocolVersion": "2024-11-05",
                    "capabilities": {"tools": {}},
                    "serverInfo": {"name": self.name, "version": "0.0.1"}
                }),
                "tools/list" => self.listing(),
                "tools/call" => {
                    self.calls.fetch_add(1, Ordering::SeqCst);
                    if self.stray_reply {
                        link.send(json!({"jsonrpc": "2.0", "id": 999, "result": {}})).await;
                    }
                    let name = params["name"].as_str().unwrap_or_default();
                    match (self.handler)(name, &params["arguments"]) {
                        CallReply::Json(value) => json!({
                            "content": [{"type": "text", "text": value.to_string()}]
                        }),
                        CallReply::LegacyJson(value) => json!({
                            "toolResult": {"content": [{"type": "text", "text": value.to_string()}]}
                        }),
                        CallReply::Error { code, message } => {
                            link.send(json!({
                                "jsonrpc": "2.0",
                                "id": id,
                                "error": {"code": code, "message": message}
                            }))
                            .await;
                            continue;
                        }
                        CallReply::Silent => continue,
                    }
                }
                other => {
                    link.send(json!({
                        "jsonrpc": "2.0",
                        "id": id,
                        "error": {"code": -32601, "message": format!("Method not found: {}", other)}
                    }))
                    .await;
                    continue;
                }
            };

            link.send(json!({"jsonrpc": "2.0", "id": id, "result": result})).await;
        }
    }
}

/// Connector handing out duplex links to registered fake servers
///
/// Unregistered server names fail to connect.
#[derive(Default)]
pub struct DuplexConnector {
    servers: HashMap<String, Arc<FakeServer>>,
}

impl DuplexConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, server: Arc<FakeServer>) -> Self {
        self.servers.insert(server.name.clone(), server);
        self
    }
}

#[async_trait]
impl Connector for DuplexConnector {
    async fn connect(&self, label: &str, _endpoint: &ServerEndpoint) -> TransportResult<Link> {
        let server = self
            .servers
            .get(label)
            .cloned()
            .ok_or_else(|| TransportError::ConnectionFailed(format!("{} is down", label)))?;

        let (client_io, server_io) = tokio::io::duplex(64 * 1024);
        let (cr, cw) = tokio::io::split(client_io);
        let (sr, sw) = tokio::io::split(server_io);
        let logger: Arc<dyn Logger> = Arc::new(NoOpLogger);

        let server_link = Link::framed(sr, sw, Framing::ContentLength, format!("fake:{}", label), Arc::clone(&logger));
        tokio::spawn(server.serve(server_link));

        Ok(Link::framed(cr, cw, Framing::ContentLength, label, logger))
    }
}

/// Protocol client for `server` through `connector`
pub fn client(
    server: &str,
    connector: Arc<DuplexConnector>,
    options: ClientOptions,
    logger: Arc<dyn Logger>,
) -> Arc<dyn ToolServerClient> {
    let endpoint = ServerEndpoint::Tcp {
        address: format!("{}.test:0", server),
        framing: Framing::ContentLength,
    };
    Arc::new(ToolProtocolClient::new(server, endpoint, connector, options, logger))
}

/// Slack server from the reference scenarios
pub fn slack() -> FakeServer {
    FakeServer::new("slack", vec!["get_users", "post_message"], |name, args| match name {
        "get_users" => {
            let limit = args["limit"].as_u64().unwrap_or(2) as usize;
            let members: Vec<&str> = ["ana", "bruno", "carla"].into_iter().take(limit).collect();
            CallReply::Json(json!({"ok": true, "members": members}))
        }
        _ => CallReply::Error {
            code: -32601,
            message: "method not found".to_string(),
        },
    })
}

/// YouTube server answering in the legacy result shape
pub fn youtube() -> FakeServer {
    FakeServer::new("youtube", vec!["get_transcript"], |_, args| {
        CallReply::LegacyJson(json!({"video": args["video_id"], "text": "never gonna give you up"}))
    })
}
