//! Wire form of a turn's tool results
//!
//! All results of one turn travel in a single `tool` message whose content
//! is a JSON array aligned with the requests: `[{"tool": ..., "result": ...}]`.
//! A failed entry carries `"error"` in place of `"result"`.

use crate::types::{Message, ToolCallResult};

/// Serialize a batch of results, in request order
pub fn encode_batch(results: &[ToolCallResult]) -> serde_json::Result<String> {
    serde_json::to_string(results)
}

/// Parse the content of a batch message
pub fn decode_batch(content: &str) -> serde_json::Result<Vec<ToolCallResult>> {
    serde_json::from_str(content)
}

/// Build the `tool` message for a batch
pub fn batch_message(results: &[ToolCallResult]) -> serde_json::Result<Message> {
    encode_batch(results).map(Message::tool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ToolErrorKind, ToolFailure};
    use serde_json::{json, Value};

    #[test]
    fn test_wire_shape() {
        let results = vec![ToolCallResult::success(
            "slack.get_users",
            json!({"ok": true, "members": ["ana"]}),
        )];
        let content = encode_batch(&results).unwrap();
        let raw: Value = serde_json::from_str(&content).unwrap();
        assert_eq!(
            raw,
            json!([{"tool": "slack.get_users", "result": {"ok": true, "members": ["ana"]}}])
        );
    }

    #[test]
    fn test_mixed_batch_decodes_to_same_entries() {
        let results = vec![
            ToolCallResult::success("slack.get_users", json!([1, 2])),
            ToolCallResult::failure(
                "slack.post",
                ToolFailure::protocol(-32601, "method not found", None),
            ),
            ToolCallResult::failure(
                "github.search",
                ToolFailure::new(ToolErrorKind::ServerNotFound, "No tool server named 'github'"),
            ),
            ToolCallResult::success("youtube.get_transcript", Value::Null),
        ];
        let decoded = decode_batch(&encode_batch(&results).unwrap()).unwrap();
        assert_eq!(decoded, results);
    }

    #[test]
    fn test_error_shaped_success_survives_decoding() {
        let results = vec![
            ToolCallResult::success(
                "jira.get_issue",
                json!({"type": "error", "kind": "timeout", "message": "upstream jira timed out"}),
            ),
            ToolCallResult::failure(
                "jira.get_issue",
                ToolFailure::new(ToolErrorKind::Timeout, "upstream jira timed out"),
            ),
        ];
        let content = encode_batch(&results).unwrap();
        let raw: Value = serde_json::from_str(&content).unwrap();
        assert!(raw[0].get("result").is_some());
        assert!(raw[1].get("error").is_some());

        let decoded = decode_batch(&content).unwrap();
        assert!(!decoded[0].is_error());
        assert!(decoded[1].is_error());
        assert_eq!(decoded, results);
    }

    #[test]
    fn test_batch_message_role() {
        let message = batch_message(&[]).unwrap();
        assert_eq!(message.role, crate::types::MessageRole::Tool);
        assert_eq!(message.text_content(), Some("[]"));
    }

    #[test]
    fn test_decode_garbage() {
        assert!(decode_batch("not json").is_err());
    }
}
