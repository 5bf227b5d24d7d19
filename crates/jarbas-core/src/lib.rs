//! Jarbas Core
//!
//! Tool-calling orchestration engine: connects a language model to a set
//! of remote tool servers speaking JSON-RPC 2.0 (MCP), exposes their tools
//! under namespaced names, and runs the conversation loop in which the
//! model requests tool calls and receives their results.
//!
//! ## Layers
//!
//! - `transport`: framed byte streams, SSE and child processes as message links
//! - `protocol`: JSON-RPC sessions, pooling and the `tools/*` client
//! - `mcp`: Streamable HTTP servers through the official SDK
//! - `tools`: the namespaced catalog, pattern queries and name resolution
//! - `providers`: model adapters (`genai`, scripted)
//! - `orchestrator`: the turn state machine
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use jarbas_core::{ConsoleLogger, FileConfigProvider, NetworkConnector, ClientOptions};
//! use jarbas_core::tools::registry_from_config;
//! use jarbas_core::orchestrator::{ConversationContext, Orchestrator};
//! use jarbas_core::providers::GenaiModelAdapter;
//!
//! let logger = Arc::new(ConsoleLogger::new());
//! let config = FileConfigProvider::user();
//! let connector = Arc::new(NetworkConnector::new(logger.clone()));
//!
//! let registry = Arc::new(
//!     registry_from_config(&config, connector, ClientOptions::default(), logger.clone()).await?,
//! );
//! registry.refresh().await;
//!
//! let model = Arc::new(GenaiModelAdapter::from_config(&config, logger.clone()).await?);
//! let ctx = ConversationContext::from_config(&config, None, None).await?;
//! let history = Orchestrator::new(model, registry, logger)
//!     .start_conversation(&ctx, "Summarize today's Slack threads", None, &Default::default())
//!     .await?;
//! ```

pub mod types;
pub mod logging;
pub mod config;
pub mod agents;
pub mod transport;
pub mod protocol;
pub mod mcp;
pub mod tools;
pub mod providers;
pub mod orchestrator;

// Re-export commonly used types
pub use types::{
    Message, MessageRole, ToolCallRequest, FunctionCall,
    ToolDefinition, ToolCallResult, ToolOutcome, ToolFailure, ToolErrorKind,
    CancellationToken,
};

pub use logging::{Logger, NoOpLogger, ConsoleLogger, FileLogger, MemoryLogger};

pub use config::{ConfigProvider, ConfigError, FileConfigProvider, MemoryConfigProvider};

pub use agents::{AgentBook, AgentProfile};

pub use transport::{Connector, NetworkConnector, ServerEndpoint};

pub use protocol::{ClientOptions, McpError, McpResult, ToolProtocolClient, ToolServerClient};

pub use mcp::SdkToolClient;

pub use tools::{ToolPattern, ToolRegistry, RefreshOutcome};

pub use providers::{ModelAdapter, ModelTarget, ProviderError, GenaiModelAdapter, ScriptedModel};

pub use orchestrator::{
    ConversationContext, ConversationError, Orchestrator, OrchestratorOptions,
    ToolEvent, ToolObserver,
};
