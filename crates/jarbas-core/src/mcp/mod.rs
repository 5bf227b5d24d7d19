//! Tool server access through the official MCP SDK (rmcp)
//!
//! # Example
//!
//! ```rust,ignore
//! use jarbas_core::mcp::SdkToolClient;
//! use jarbas_core::protocol::{ClientOptions, ToolServerClient};
//!
//! let client = SdkToolClient::new("docs", "http://localhost:8300/mcp", ClientOptions::default(), logger);
//! let tools = client.list_tools().await?;
//! ```

mod client;

pub use client::SdkToolClient;
