//! GenaiModelAdapter - model adapter backed by the genai crate

use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use genai::chat::{ChatRequest, ChatStreamEvent};

use crate::config::{ConfigProvider, ConfigResult, LlmProviderConfig};
use crate::logging::Logger;
use crate::types::{CancellationToken, Message, ToolCallRequest, ToolDefinition};

use super::error::{ProviderError, ProviderResult};
use super::genai_adapter::{
    create_client, from_genai_tool_call, is_supported, to_genai_messages, to_genai_options,
    to_genai_tools, ProviderConfig,
};
use super::traits::{ModelAdapter, ModelTarget};

/// Model adapter for every provider genai can reach
///
/// `ModelTarget::provider` names an entry of `llm_providers`; a name with
/// no entry is taken as a provider type (`openai`, `ollama`, ...) with
/// default endpoint and no key.
pub struct GenaiModelAdapter {
    providers: Vec<LlmProviderConfig>,
    logger: Arc<dyn Logger>,
}

impl GenaiModelAdapter {
    pub fn new(providers: Vec<LlmProviderConfig>, logger: Arc<dyn Logger>) -> Self {
        Self { providers, logger }
    }

    /// Build from the configured `llm_providers`
    pub async fn from_config(config: &dyn ConfigProvider, logger: Arc<dyn Logger>) -> ConfigResult<Self> {
        Ok(Self::new(config.llm_providers().await?, logger))
    }

    /// Backend settings for a provider name
    pub fn resolve_provider(&self, name: &str) -> ProviderResult<ProviderConfig> {
        if let Some(config) = self.providers.iter().find(|p| p.name == name) {
            let resolved = ProviderConfig::from(config);
            if !is_supported(&resolved.provider) {
                return Err(ProviderError::UnsupportedProvider(config.provider_type.clone()));
            }
            return Ok(resolved);
        }
        if is_supported(name) {
            return Ok(ProviderConfig {
                provider: name.to_lowercase(),
                api_key: None,
                api_base: None,
            });
        }
        Err(ProviderError::UnsupportedProvider(name.to_string()))
    }
}

#[async_trait]
impl ModelAdapter for GenaiModelAdapter {
    async fn chat(
        &self,
        target: &ModelTarget,
        messages: &[Message],
        tools: Option<&[ToolDefinition]>,
        cancel: &CancellationToken,
    ) -> ProviderResult<Message> {
        self.logger.info(&format!(
            "[GenaiModelAdapter] chat called: provider={}, model={}, messages={}",
            target.provider,
            target.model,
            messages.len()
        ));

        let config = self.resolve_provider(&target.provider)?;
        let client = create_client(&config)?;

        let mut chat_req = ChatRequest::new(to_genai_messages(messages)?);
        if let Some(tools) = tools.filter(|t| !t.is_empty()) {
            chat_req = chat_req.with_tools(to_genai_tools(tools));
        }
        let options = to_genai_options();

        let started = cancel
            .run_until_cancelled(client.exec_chat_stream(target.model.as_str(), chat_req, Some(&options)))
            .await
            .ok_or(ProviderError::Cancelled)?;
        let chat_stream =
            started.map_err(|e| ProviderError::api_error(target.provider.as_str(), e.to_string()))?;

        let mut stream = chat_stream.stream;
        let mut text = String::new();
        let mut tool_calls: Vec<ToolCallRequest> = Vec::new();

        loop {
            let next = cancel
                .run_until_cancelled(stream.next())
                .await
                .ok_or(ProviderError::Cancelled)?;
            let Some(event) = next else { break };

            match event {
                Ok(ChatStreamEvent::Chunk(chunk)) => text.push_str(&chunk.content),
                Ok(ChatStreamEvent::End(end)) => {
                    if let Some(captured) = end.captured_tool_calls() {
                        tool_calls.extend(captured.iter().map(|tc| from_genai_tool_call(tc)));
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    self.logger
                        .error(&format!("[GenaiModelAdapter] Stream error: {}", e));
                    return Err(ProviderError::api_error(target.provider.as_str(), e.to_string()));
                }
            }
        }

        self.logger.debug(&format!(
            "[GenaiModelAdapter] Reply: {} chars, {} tool calls",
            text.len(),
            tool_calls.len()
        ));

        let content = if text.is_empty() { None } else { Some(text) };
        Ok(Message::assistant_tool_calls(content, tool_calls))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;

    fn adapter() -> GenaiModelAdapter {
        GenaiModelAdapter::new(
            vec![
                LlmProviderConfig::new("ollama-local", "ollama").with_url("http://localhost:11434"),
                LlmProviderConfig::new("legacy", "watsonx"),
            ],
            Arc::new(NoOpLogger),
        )
    }

    #[test]
    fn test_resolve_configured_provider() {
        let resolved = adapter().resolve_provider("ollama-local").unwrap();
        assert_eq!(resolved.provider, "ollama");
        assert_eq!(resolved.api_base.as_deref(), Some("http://localhost:11434"));
    }

    #[test]
    fn test_resolve_builtin_type() {
        let resolved = adapter().resolve_provider("openai").unwrap();
        assert_eq!(resolved.provider, "openai");
        assert!(resolved.api_base.is_none());
    }

    #[test]
    fn test_unsupported_provider() {
        assert!(matches!(
            adapter().resolve_provider("legacy"),
            Err(ProviderError::UnsupportedProvider(ref t)) if t == "watsonx"
        ));
        assert!(matches!(
            adapter().resolve_provider("nowhere"),
            Err(ProviderError::UnsupportedProvider(_))
        ));
    }

    #[tokio::test]
    async fn test_chat_fails_fast_on_unsupported_provider() {
        let err = adapter()
            .chat(
                &ModelTarget::new("nowhere", "model"),
                &[Message::user("hi")],
                None,
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::UnsupportedProvider(_)));
    }
}
