//! Conversion between jarbas types and genai types, plus client creation
//!
//! Tools are offered to models by short name: most provider APIs reject
//! dots in function names, and the registry maps short names back.

use std::future::Future;
use std::pin::Pin;

use genai::chat::{
    ChatMessage as GenaiMessage, ChatOptions as GenaiOptions, Tool as GenaiTool,
    ToolCall as GenaiToolCall, ToolResponse as GenaiToolResponse,
};
use genai::resolver::{AuthData, AuthResolver, Endpoint, ServiceTargetResolver};
use genai::{adapter::AdapterKind, Client, ModelIden, ServiceTarget};
use serde_json::json;

use crate::config::LlmProviderConfig;
use crate::orchestrator::decode_batch;
use crate::types::{Message, MessageRole, ToolCallRequest, ToolDefinition};

use super::error::{ProviderError, ProviderResult};

// ============================================================================
// Message Conversion: jarbas -> genai
// ============================================================================

fn to_genai_tool_call(call: &ToolCallRequest) -> ProviderResult<GenaiToolCall> {
    // genai wants structured arguments; raw text that is not JSON goes as a string
    let arguments = call
        .decode_arguments()
        .unwrap_or_else(|_| call.function.arguments.clone());
    let tool_call = serde_json::from_value(json!({
        "call_id": call.id,
        "fn_name": call.function.name,
        "fn_arguments": arguments,
    }))?;
    Ok(tool_call)
}

/// Convert a conversation to genai messages
///
/// A `tool` message holds the whole batch of a turn; it is split back into
/// one tool response per call of the preceding assistant message.
pub fn to_genai_messages(messages: &[Message]) -> ProviderResult<Vec<GenaiMessage>> {
    let mut out = Vec::with_capacity(messages.len());
    let mut last_calls: &[ToolCallRequest] = &[];

    for message in messages {
        let text = message.text_content().unwrap_or_default().to_string();
        match message.role {
            MessageRole::System => out.push(GenaiMessage::system(text)),
            MessageRole::User => out.push(GenaiMessage::user(text)),
            MessageRole::Assistant if message.has_tool_calls() => {
                let calls = message
                    .tool_calls
                    .iter()
                    .map(to_genai_tool_call)
                    .collect::<ProviderResult<Vec<_>>>()?;
                out.push(GenaiMessage::from(calls));
                last_calls = &message.tool_calls;
            }
            MessageRole::Assistant => out.push(GenaiMessage::assistant(text)),
            MessageRole::Tool => {
                if last_calls.is_empty() {
                    // Nothing to answer; keep the content visible to the model
                    out.push(GenaiMessage::user(text));
                    continue;
                }
                let entries = decode_batch(&text).ok();
                for (i, call) in last_calls.iter().enumerate() {
                    let content = match entries.as_ref().and_then(|e| e.get(i)) {
                        Some(entry) => serde_json::to_string(entry)?,
                        None => text.clone(),
                    };
                    out.push(GenaiMessage::from(GenaiToolResponse::new(call.id.clone(), content)));
                }
                last_calls = &[];
            }
        }
    }

    Ok(out)
}

// ============================================================================
// Tool Conversion: jarbas -> genai
// ============================================================================

pub fn to_genai_tool(def: &ToolDefinition) -> GenaiTool {
    let mut tool = GenaiTool::new(def.short_name.as_str());
    if !def.description.is_empty() {
        tool = tool.with_description(def.description.as_str());
    }
    tool.with_schema(def.input_schema.clone())
}

pub fn to_genai_tools(defs: &[ToolDefinition]) -> Vec<GenaiTool> {
    defs.iter().map(to_genai_tool).collect()
}

pub fn to_genai_options() -> GenaiOptions {
    // Capture tool calls in stream so we can return them
    GenaiOptions::default().with_capture_tool_calls(true)
}

// ============================================================================
// Response Conversion: genai -> jarbas
// ============================================================================

pub fn from_genai_tool_call(tc: &GenaiToolCall) -> ToolCallRequest {
    ToolCallRequest::new(tc.call_id.clone(), tc.fn_name.clone(), tc.fn_arguments.clone())
}

// ============================================================================
// Provider Resolution
// ============================================================================

/// Backend settings for one request
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Provider type, e.g. "ollama", "openai", "openrouter"
    pub provider: String,
    /// API key for authentication
    pub api_key: Option<String>,
    /// Custom API base URL
    pub api_base: Option<String>,
}

impl From<&LlmProviderConfig> for ProviderConfig {
    fn from(config: &LlmProviderConfig) -> Self {
        Self {
            provider: config.provider_type.to_lowercase(),
            api_key: config.resolve_api_key(),
            api_base: config.url.clone(),
        }
    }
}

/// Adapter and default endpoint for a provider type
pub fn adapter_for(provider: &str) -> Option<(AdapterKind, Option<&'static str>)> {
    let resolved = match provider.to_lowercase().as_str() {
        "openai" => (AdapterKind::OpenAI, None),
        "anthropic" => (AdapterKind::Anthropic, None),
        "gemini" | "google" => (AdapterKind::Gemini, None),
        "ollama" => (AdapterKind::Ollama, None),
        "groq" => (AdapterKind::Groq, None),
        "xai" => (AdapterKind::Xai, None),
        "deepseek" => (AdapterKind::DeepSeek, None),
        "cohere" => (AdapterKind::Cohere, None),
        "fireworks" => (AdapterKind::Fireworks, None),
        "together" => (AdapterKind::Together, None),
        // OpenAI-compatible
        "openrouter" => (AdapterKind::OpenAI, Some("https://openrouter.ai/api/v1/")),
        "mistral" => (AdapterKind::OpenAI, Some("https://api.mistral.ai/v1/")),
        "azure" | "openai_compatible" => (AdapterKind::OpenAI, None),
        _ => return None,
    };
    Some(resolved)
}

pub fn is_supported(provider: &str) -> bool {
    adapter_for(provider).is_some()
}

fn with_trailing_slash(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{}/", url)
    }
}

// ============================================================================
// Client Creation with Custom Auth
// ============================================================================

/// Create a genai Client pinned to one provider
///
/// The adapter kind comes from the provider type, never from the model
/// name, so e.g. `qwen2.5` on an `ollama` provider goes to Ollama.
pub fn create_client(config: &ProviderConfig) -> ProviderResult<Client> {
    let (adapter_kind, default_base) = adapter_for(&config.provider)
        .ok_or_else(|| ProviderError::UnsupportedProvider(config.provider.clone()))?;

    let explicit_key = config.api_key.clone();
    let auth_resolver = AuthResolver::from_resolver_async_fn(
        move |_model_iden: ModelIden| -> Pin<Box<dyn Future<Output = genai::resolver::Result<Option<AuthData>>> + Send>> {
            let key = explicit_key.clone();
            Box::pin(async move { Ok(key.map(AuthData::from_single)) })
        },
    );

    let api_base = config
        .api_base
        .as_deref()
        .or(default_base)
        .map(with_trailing_slash);

    let target_resolver = ServiceTargetResolver::from_resolver_fn(
        move |target: ServiceTarget| -> Result<ServiceTarget, genai::resolver::Error> {
            let ServiceTarget { endpoint, auth, model } = target;
            let endpoint = match &api_base {
                Some(base) => Endpoint::from_owned(base.clone()),
                None => endpoint,
            };
            Ok(ServiceTarget {
                endpoint,
                auth,
                model: ModelIden::new(adapter_kind, model.model_name.clone()),
            })
        },
    );

    Ok(Client::builder()
        .with_auth_resolver(auth_resolver)
        .with_service_target_resolver(target_resolver)
        .build())
}
