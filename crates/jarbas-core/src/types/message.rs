//! Conversation message types

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Message role in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
    Tool,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
            MessageRole::Tool => write!(f, "tool"),
        }
    }
}

/// One turn of a conversation
///
/// Serializes to the shape model providers use:
/// `{role, content?, tool_calls?: [{id, type, function: {name, arguments}}]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// The role of the message sender
    pub role: MessageRole,
    /// Text content, absent on pure tool-call replies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Tool invocations requested by the model
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRequest>,
}

impl Message {
    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::text(MessageRole::System, content)
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::text(MessageRole::User, content)
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::text(MessageRole::Assistant, content)
    }

    /// Create a tool message carrying a serialized result batch
    pub fn tool(content: impl Into<String>) -> Self {
        Self::text(MessageRole::Tool, content)
    }

    /// Create an assistant message that requests tool calls
    pub fn assistant_tool_calls(content: Option<String>, tool_calls: Vec<ToolCallRequest>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content,
            tool_calls,
        }
    }

    fn text(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(content.into()),
            tool_calls: Vec::new(),
        }
    }

    /// Get the text content, if any
    pub fn text_content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    /// Whether the model asked for at least one tool invocation
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// A model's request to invoke a tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Provider-assigned call identifier
    pub id: String,
    /// Always "function" for the providers we talk to
    #[serde(rename = "type", default = "default_call_type")]
    pub call_type: String,
    /// The requested function
    pub function: FunctionCall,
}

fn default_call_type() -> String {
    "function".to_string()
}

/// Name and arguments of a requested function
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Tool name as returned by the model (short or namespaced)
    pub name: String,
    /// Arguments, either structured or raw JSON text
    #[serde(default)]
    pub arguments: Value,
}

impl ToolCallRequest {
    /// Create a new function call request
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: id.into(),
            call_type: default_call_type(),
            function: FunctionCall {
                name: name.into(),
                arguments,
            },
        }
    }

    /// Requested tool name
    pub fn name(&self) -> &str {
        &self.function.name
    }

    /// Decode the arguments into a structured value
    ///
    /// Textual payloads are parsed as JSON. Anything else is already
    /// structured and is returned unchanged.
    pub fn decode_arguments(&self) -> Result<Value, serde_json::Error> {
        match &self.function.arguments {
            Value::String(raw) => serde_json::from_str(raw),
            other => Ok(other.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_creation() {
        let sys = Message::system("You are helpful");
        assert_eq!(sys.role, MessageRole::System);
        assert_eq!(sys.text_content(), Some("You are helpful"));
        assert!(!sys.has_tool_calls());

        let tool = Message::tool("[]");
        assert_eq!(tool.role, MessageRole::Tool);
    }

    #[test]
    fn test_message_serialization_omits_empty_fields() {
        let msg = Message::user("Hello");
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"Hello"}"#);
    }

    #[test]
    fn test_tool_call_wire_shape() {
        let msg = Message::assistant_tool_calls(
            None,
            vec![ToolCallRequest::new("call_0", "get_users", json!({"limit": 10}))],
        );
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            value,
            json!({
                "role": "assistant",
                "tool_calls": [{
                    "id": "call_0",
                    "type": "function",
                    "function": {"name": "get_users", "arguments": {"limit": 10}}
                }]
            })
        );

        let back: Message = serde_json::from_value(value).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn test_decode_textual_arguments() {
        let call = ToolCallRequest::new("1", "get_users", json!("{\"limit\": 5}"));
        assert_eq!(call.decode_arguments().unwrap(), json!({"limit": 5}));

        let structured = ToolCallRequest::new("2", "get_users", json!({"limit": 5}));
        assert_eq!(structured.decode_arguments().unwrap(), json!({"limit": 5}));

        let broken = ToolCallRequest::new("3", "get_users", json!("limit=5"));
        assert!(broken.decode_arguments().is_err());
    }

    #[test]
    fn test_missing_call_type_defaults_to_function() {
        let call: ToolCallRequest = serde_json::from_value(json!({
            "id": "x",
            "function": {"name": "echo", "arguments": {}}
        }))
        .unwrap();
        assert_eq!(call.call_type, "function");
    }
}
