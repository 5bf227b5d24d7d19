//! Tool definition and tool result types

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Separator between server name and tool short name
pub const NAMESPACE_SEPARATOR: char = '.';

/// One invocable tool, namespaced under the server that hosts it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Namespaced name (`server.tool`)
    pub name: String,
    /// Server hosting the tool
    pub server: String,
    /// Name the server knows the tool by
    pub short_name: String,
    /// Description of what the tool does
    #[serde(default)]
    pub description: String,
    /// JSON Schema for the input parameters
    #[serde(rename = "inputSchema", default)]
    pub input_schema: Value,
}

impl ToolDefinition {
    /// Create a definition for `short_name` hosted on `server`
    pub fn new(server: impl Into<String>, short_name: impl Into<String>) -> Self {
        let server = server.into();
        let short_name = short_name.into();
        Self {
            name: qualify(&server, &short_name),
            server,
            short_name,
            description: String::new(),
            input_schema: Value::Object(Default::default()),
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the input schema
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.input_schema = schema;
        self
    }
}

/// Build a namespaced tool name
pub fn qualify(server: &str, short_name: &str) -> String {
    format!("{}{}{}", server, NAMESPACE_SEPARATOR, short_name)
}

/// Split a namespaced name into `(server, short_name)`
pub fn split_qualified(name: &str) -> Option<(&str, &str)> {
    name.split_once(NAMESPACE_SEPARATOR)
}

/// Classification of a failed tool invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolErrorKind {
    TransportClosed,
    Timeout,
    NotInitialized,
    ServerUnreachable,
    ProtocolError,
    ToolNotFound,
    ServerNotFound,
    AmbiguousResolution,
    /// The tool ran and flagged its own result as an error
    ToolReported,
    InvalidResponse,
    /// The model's arguments could not be sent in the shape the server needs
    InvalidArguments,
    /// The call was abandoned because the turn was cancelled
    Cancelled,
}

/// Structured description of a failed invocation
///
/// Serialized with a `"type": "error"` marker so the model sees the same
/// shape regardless of which layer failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "error")]
pub struct ToolFailure {
    pub kind: ToolErrorKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<i64>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ToolFailure {
    pub fn new(kind: ToolErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: None,
            message: message.into(),
            data: None,
        }
    }

    /// An error envelope reported by the remote server
    pub fn protocol(code: i64, message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            kind: ToolErrorKind::ProtocolError,
            code: Some(code),
            message: message.into(),
            data,
        }
    }
}

impl std::fmt::Display for ToolFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.code {
            Some(code) => write!(f, "{:?} ({}): {}", self.kind, code, self.message),
            None => write!(f, "{:?}: {}", self.kind, self.message),
        }
    }
}

/// Result payload of one invocation
///
/// Serializes as the bare payload or the failure object. Decoding goes
/// through [`ToolCallResult`], whose wire form says which arm it carries.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ToolOutcome {
    Failure(ToolFailure),
    Success(Value),
}

impl ToolOutcome {
    pub fn is_error(&self) -> bool {
        matches!(self, ToolOutcome::Failure(_))
    }

    pub fn failure(&self) -> Option<&ToolFailure> {
        match self {
            ToolOutcome::Failure(failure) => Some(failure),
            ToolOutcome::Success(_) => None,
        }
    }
}

impl From<ToolFailure> for ToolOutcome {
    fn from(failure: ToolFailure) -> Self {
        ToolOutcome::Failure(failure)
    }
}

/// Outcome of one invocation, as surfaced back into the conversation
///
/// On the wire a success is `{"tool": ..., "result": <payload>}` and a
/// failure is `{"tool": ..., "error": {"type": "error", ...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "CallResultWire", into = "CallResultWire")]
pub struct ToolCallResult {
    /// Tool identity (namespaced when resolution succeeded)
    pub tool: String,
    /// Payload or structured error
    pub result: ToolOutcome,
}

#[derive(Serialize, Deserialize)]
struct CallResultWire {
    tool: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<ToolFailure>,
}

impl From<CallResultWire> for ToolCallResult {
    fn from(wire: CallResultWire) -> Self {
        let result = match wire.error {
            Some(failure) => ToolOutcome::Failure(failure),
            // `"result": null` and a missing key both mean a null payload
            None => ToolOutcome::Success(wire.result.unwrap_or(Value::Null)),
        };
        Self { tool: wire.tool, result }
    }
}

impl From<ToolCallResult> for CallResultWire {
    fn from(call: ToolCallResult) -> Self {
        match call.result {
            ToolOutcome::Success(payload) => Self {
                tool: call.tool,
                result: Some(payload),
                error: None,
            },
            ToolOutcome::Failure(failure) => Self {
                tool: call.tool,
                result: None,
                error: Some(failure),
            },
        }
    }
}

impl ToolCallResult {
    pub fn success(tool: impl Into<String>, payload: Value) -> Self {
        Self {
            tool: tool.into(),
            result: ToolOutcome::Success(payload),
        }
    }

    pub fn failure(tool: impl Into<String>, failure: ToolFailure) -> Self {
        Self {
            tool: tool.into(),
            result: ToolOutcome::Failure(failure),
        }
    }

    pub fn is_error(&self) -> bool {
        self.result.is_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_definition_is_namespaced() {
        let def = ToolDefinition::new("slack", "get_users").with_description("List users");
        assert_eq!(def.name, "slack.get_users");
        assert_eq!(def.server, "slack");
        assert_eq!(def.short_name, "get_users");
    }

    #[test]
    fn test_split_qualified() {
        assert_eq!(split_qualified("slack.get_users"), Some(("slack", "get_users")));
        assert_eq!(split_qualified("a.b.c"), Some(("a", "b.c")));
        assert_eq!(split_qualified("get_users"), None);
    }

    #[test]
    fn test_failure_wire_shape() {
        let failure = ToolFailure::protocol(-32601, "method not found", None);
        let value = serde_json::to_value(ToolOutcome::from(failure)).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "error",
                "kind": "protocol_error",
                "code": -32601,
                "message": "method not found"
            })
        );
    }

    #[test]
    fn test_call_result_wire_shape() {
        let ok = ToolCallResult::success("slack.get_users", json!({"ok": true}));
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            json!({"tool": "slack.get_users", "result": {"ok": true}})
        );

        let failed = ToolCallResult::failure(
            "slack.post_message",
            ToolFailure::new(ToolErrorKind::Timeout, "no reply"),
        );
        assert_eq!(
            serde_json::to_value(&failed).unwrap(),
            json!({
                "tool": "slack.post_message",
                "error": {"type": "error", "kind": "timeout", "message": "no reply"}
            })
        );
    }

    #[test]
    fn test_error_shaped_payload_stays_success() {
        let payload = json!({"type": "error", "kind": "timeout", "message": "upstream jira timed out"});
        let call = ToolCallResult::success("jira.get_issue", payload.clone());

        let decoded: ToolCallResult =
            serde_json::from_value(serde_json::to_value(&call).unwrap()).unwrap();
        assert!(!decoded.is_error());
        assert_eq!(decoded.result, ToolOutcome::Success(payload));
    }

    #[test]
    fn test_null_payload_round_trips() {
        let call = ToolCallResult::success("youtube.get_transcript", Value::Null);
        let value = serde_json::to_value(&call).unwrap();
        assert_eq!(value, json!({"tool": "youtube.get_transcript", "result": null}));

        let decoded: ToolCallResult = serde_json::from_value(value).unwrap();
        assert_eq!(decoded, call);
    }
}
