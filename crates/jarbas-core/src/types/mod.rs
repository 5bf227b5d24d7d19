//! Core types shared by the protocol, registry and orchestration layers

mod message;
mod tool;
mod cancellation;

pub use message::{Message, MessageRole, ToolCallRequest, FunctionCall};
pub use tool::{
    ToolDefinition, ToolCallResult, ToolOutcome, ToolFailure, ToolErrorKind,
    qualify, split_qualified, NAMESPACE_SEPARATOR,
};
pub use cancellation::CancellationToken;
