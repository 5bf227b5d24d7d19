//! JSON-RPC 2.0 envelopes used by the tool protocol

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const JSONRPC_VERSION: &str = "2.0";

/// Request identifier, assigned per session
pub type RequestId = u64;

/// Error object carried by an error envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl std::fmt::Display for RemoteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code)
    }
}

/// Correlated reply to one request
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Result(Value),
    Error(RemoteError),
}

/// Classification of a message received from a server
#[derive(Debug, Clone, PartialEq)]
pub enum Incoming {
    Reply { id: Value, reply: Reply },
    Request { id: Value, method: String, params: Value },
    Notification { method: String, params: Value },
    Invalid(String),
}

/// Build a request envelope
pub fn request(id: RequestId, method: &str, params: Value) -> Value {
    json!({
        "jsonrpc": JSONRPC_VERSION,
        "id": id,
        "method": method,
        "params": params,
    })
}

/// Build a notification envelope (no id, no reply expected)
pub fn notification(method: &str, params: Value) -> Value {
    json!({
        "jsonrpc": JSONRPC_VERSION,
        "method": method,
        "params": params,
    })
}

/// Build a success envelope answering a server-initiated request
pub fn result_envelope(id: Value, result: Value) -> Value {
    json!({
        "jsonrpc": JSONRPC_VERSION,
        "id": id,
        "result": result,
    })
}

/// Build an error envelope answering a server-initiated request
pub fn error_envelope(id: Value, code: i64, message: &str) -> Value {
    json!({
        "jsonrpc": JSONRPC_VERSION,
        "id": id,
        "error": { "code": code, "message": message },
    })
}

/// Sort an inbound message into reply / request / notification
pub fn classify(mut message: Value) -> Incoming {
    let Some(object) = message.as_object_mut() else {
        return Incoming::Invalid("message is not a JSON object".to_string());
    };

    let id = object.remove("id").filter(|id| !id.is_null());
    let params = object.remove("params").unwrap_or(Value::Null);

    if let Some(method) = object.get("method").and_then(|m| m.as_str()) {
        let method = method.to_string();
        return match id {
            Some(id) => Incoming::Request { id, method, params },
            None => Incoming::Notification { method, params },
        };
    }

    let Some(id) = id else {
        return Incoming::Invalid("reply without an id".to_string());
    };

    if let Some(error) = object.remove("error") {
        let code = error.get("code").and_then(|c| c.as_i64()).unwrap_or(-1);
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("Unknown error")
            .to_string();
        let data = error.get("data").cloned().filter(|d| !d.is_null());
        return Incoming::Reply {
            id,
            reply: Reply::Error(RemoteError { code, message, data }),
        };
    }

    match object.remove("result") {
        Some(result) => Incoming::Reply { id, reply: Reply::Result(result) },
        None => Incoming::Invalid(format!("reply {} has neither result nor error", id)),
    }
}
