//! Scripted model adapter for testing
//!
//! Replays queued replies in order without network dependencies and
//! records every request it receives.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::logging::Logger;
use crate::types::{CancellationToken, Message, ToolCallRequest, ToolDefinition};

use super::error::{ProviderError, ProviderResult};
use super::traits::{ModelAdapter, ModelTarget};

/// One queued reply
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Message(Message),
    /// Fail the call with an API error
    Error(String),
}

/// A request as seen by the scripted model
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub target: ModelTarget,
    pub messages: Vec<Message>,
    pub tools: Option<Vec<ToolDefinition>>,
}

impl RecordedRequest {
    /// Names of the offered tools, empty when none were offered
    pub fn tool_names(&self) -> Vec<String> {
        self.tools
            .iter()
            .flatten()
            .map(|t| t.name.clone())
            .collect()
    }
}

/// Deterministic model adapter
pub struct ScriptedModel {
    replies: Mutex<VecDeque<ScriptedReply>>,
    requests: Mutex<Vec<RecordedRequest>>,
    delay: Option<Duration>,
    logger: Arc<dyn Logger>,
}

impl ScriptedModel {
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            delay: None,
            logger,
        }
    }

    /// Queue a full message
    pub fn then(self, message: Message) -> Self {
        self.replies.lock().push_back(ScriptedReply::Message(message));
        self
    }

    /// Queue a plain text answer
    pub fn then_text(self, text: impl Into<String>) -> Self {
        self.then(Message::assistant(text))
    }

    /// Queue a reply requesting tool calls
    pub fn then_tool_calls(self, calls: Vec<ToolCallRequest>) -> Self {
        self.then(Message::assistant_tool_calls(None, calls))
    }

    /// Queue a failure
    pub fn then_error(self, message: impl Into<String>) -> Self {
        self.replies.lock().push_back(ScriptedReply::Error(message.into()));
        self
    }

    /// Wait this long before answering (cancellable)
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Replies not consumed yet
    pub fn remaining(&self) -> usize {
        self.replies.lock().len()
    }
}

#[async_trait]
impl ModelAdapter for ScriptedModel {
    async fn chat(
        &self,
        target: &ModelTarget,
        messages: &[Message],
        tools: Option<&[ToolDefinition]>,
        cancel: &CancellationToken,
    ) -> ProviderResult<Message> {
        self.requests.lock().push(RecordedRequest {
            target: target.clone(),
            messages: messages.to_vec(),
            tools: tools.map(|t| t.to_vec()),
        });

        if let Some(delay) = self.delay {
            cancel
                .run_until_cancelled(tokio::time::sleep(delay))
                .await
                .ok_or(ProviderError::Cancelled)?;
        }
        if cancel.is_cancelled() {
            return Err(ProviderError::Cancelled);
        }

        let reply = self.replies.lock().pop_front();
        match reply {
            Some(ScriptedReply::Message(message)) => {
                self.logger.debug(&format!(
                    "[ScriptedModel] Replying with {} tool calls",
                    message.tool_calls.len()
                ));
                Ok(message)
            }
            Some(ScriptedReply::Error(message)) => Err(ProviderError::api_error("scripted", message)),
            None => Err(ProviderError::Other("Scripted model has no replies left".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;
    use serde_json::json;

    fn target() -> ModelTarget {
        ModelTarget::new("scripted", "test")
    }

    #[tokio::test]
    async fn test_replies_in_order() {
        let model = ScriptedModel::new(Arc::new(NoOpLogger))
            .then_tool_calls(vec![ToolCallRequest::new("c1", "get_users", json!({}))])
            .then_text("done");
        let cancel = CancellationToken::new();

        let first = model.chat(&target(), &[Message::user("hi")], None, &cancel).await.unwrap();
        assert!(first.has_tool_calls());
        let second = model.chat(&target(), &[Message::user("hi")], None, &cancel).await.unwrap();
        assert_eq!(second.text_content(), Some("done"));

        assert_eq!(model.request_count(), 2);
        assert_eq!(model.remaining(), 0);
        assert!(model.chat(&target(), &[], None, &cancel).await.is_err());
    }

    #[tokio::test]
    async fn test_records_offered_tools() {
        let model = ScriptedModel::new(Arc::new(NoOpLogger)).then_text("ok");
        let tools = vec![ToolDefinition::new("slack", "get_users")];
        model
            .chat(&target(), &[Message::user("hi")], Some(&tools), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(model.requests()[0].tool_names(), vec!["slack.get_users"]);
    }

    #[tokio::test]
    async fn test_error_reply() {
        let model = ScriptedModel::new(Arc::new(NoOpLogger)).then_error("boom");
        let err = model
            .chat(&target(), &[], None, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::ApiError { .. }));
    }

    #[tokio::test]
    async fn test_cancel_during_delay() {
        let model = ScriptedModel::new(Arc::new(NoOpLogger))
            .then_text("too late")
            .with_delay(Duration::from_secs(60));
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = model.chat(&target(), &[], None, &cancel).await.unwrap_err();
        assert!(matches!(err, ProviderError::Cancelled));
        // The reply stays queued
        assert_eq!(model.remaining(), 1);
    }
}
