//! Conversation orchestration
//!
//! Couples a `ModelAdapter` with the `ToolRegistry`: the model proposes
//! tool calls, the registry runs them, and the results go back to the
//! model until it answers in plain text.
//!
//! ```rust,ignore
//! use jarbas_core::orchestrator::{ConversationContext, Orchestrator};
//!
//! let ctx = ConversationContext::from_config(&config, None, None).await?;
//! let orchestrator = Orchestrator::new(model, registry, logger);
//! let history = orchestrator
//!     .start_conversation(&ctx, "Who is on the team?", None, &cancel)
//!     .await?;
//! println!("{}", history.last().and_then(|m| m.text_content()).unwrap_or(""));
//! ```

mod batch;
mod context;
mod engine;
mod error;
mod observer;

pub use batch::{batch_message, decode_batch, encode_batch};
pub use context::ConversationContext;
pub use engine::{Orchestrator, OrchestratorOptions, TurnState};
pub use error::{ConversationError, ConversationResult};
pub use observer::{EventLog, ToolEvent, ToolObserver};
