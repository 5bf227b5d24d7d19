//! Tool server endpoints

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// How JSON-RPC messages are delimited on a byte stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Framing {
    /// `Content-Length: N\r\n\r\n` header before each body (LSP style)
    ContentLength,
    /// One JSON document per line
    Newline,
}

/// Where and how a tool server is reached
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEndpoint {
    /// HTTP event stream; replies arrive as `message` events and requests
    /// are POSTed to the URL announced by the `endpoint` event
    Sse { url: String },
    /// Streamable HTTP, served through the official MCP SDK
    StreamableHttp { url: String },
    /// Plain TCP socket
    Tcp { address: String, framing: Framing },
    /// Unix domain socket
    Unix { path: PathBuf, framing: Framing },
    /// Child process speaking over stdin/stdout
    Stdio {
        command: String,
        args: Vec<String>,
        env: HashMap<String, String>,
        framing: Framing,
    },
}

impl ServerEndpoint {
    /// Short transport label for log lines
    pub fn kind(&self) -> &'static str {
        match self {
            ServerEndpoint::Sse { .. } => "sse",
            ServerEndpoint::StreamableHttp { .. } => "streamable_http",
            ServerEndpoint::Tcp { .. } => "tcp",
            ServerEndpoint::Unix { .. } => "unix",
            ServerEndpoint::Stdio { .. } => "stdio",
        }
    }
}

impl std::fmt::Display for ServerEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServerEndpoint::Sse { url } | ServerEndpoint::StreamableHttp { url } => {
                write!(f, "{} {}", self.kind(), url)
            }
            ServerEndpoint::Tcp { address, .. } => write!(f, "tcp {}", address),
            ServerEndpoint::Unix { path, .. } => write!(f, "unix {}", path.display()),
            ServerEndpoint::Stdio { command, args, .. } => {
                write!(f, "stdio {}", command)?;
                for arg in args {
                    write!(f, " {}", arg)?;
                }
                Ok(())
            }
        }
    }
}
