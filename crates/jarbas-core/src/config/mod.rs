//! Configuration abstraction
//!
//! The `ConfigProvider` trait serves tool servers, model providers, agent
//! profiles and the default model/agent selection.

mod file;
mod memory;
mod schema;
mod traits;

pub use file::{ConfigLevel, FileConfigProvider};
pub use memory::MemoryConfigProvider;
pub use schema::{ConfigFile, LlmProviderConfig, ToolServerConfig, TransportKind};
pub use traits::{ConfigError, ConfigProvider, ConfigResult};
