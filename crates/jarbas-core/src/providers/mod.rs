//! Model adapters
//!
//! The orchestrator talks to models only through the `ModelAdapter` trait:
//! history and optional tool list in, one assistant message out.
//!
//! `GenaiModelAdapter` reaches real providers through the `genai` crate,
//! which handles streaming, provider protocols and tool calling. The
//! `ScriptedModel` replays canned replies for tests.

mod error;
mod genai_adapter;
mod genai_provider;
mod mock;
mod traits;

pub use error::{ProviderError, ProviderResult};
pub use traits::{ModelAdapter, ModelTarget};

pub use genai_adapter::{adapter_for, create_client, is_supported, ProviderConfig};
pub use genai_provider::GenaiModelAdapter;

pub use mock::{RecordedRequest, ScriptedModel, ScriptedReply};
