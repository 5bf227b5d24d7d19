//! Tool protocol client
//!
//! JSON-RPC 2.0 sessions on top of [`crate::transport`] links:
//! - `Session`: handshake, id allocation, reply correlation
//! - `SessionPool`: bounded set of sessions per server
//! - `ToolProtocolClient`: `tools/list` and `tools/call` with result normalization

pub mod client;
pub mod error;
pub mod options;
pub mod pool;
pub mod session;
pub mod wire;

pub use client::{normalize_call_result, normalize_reply, ToolProtocolClient, ToolServerClient};
pub use error::{McpError, McpResult};
pub use options::{ClientOptions, CLIENT_NAME, PROTOCOL_VERSION};
pub use pool::{PooledSession, SessionPool};
pub use session::{ServerIdentity, ServerInfo, Session};
pub use wire::{RemoteError, Reply, RequestId};
