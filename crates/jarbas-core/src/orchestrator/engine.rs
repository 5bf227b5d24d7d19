//! The conversation loop
//!
//! ```text
//! Idle -> AwaitingModel -> (ToolsPending -> AwaitingModel)* -> Done
//! ```
//!
//! Each pass through `AwaitingModel` asks the model for one assistant
//! message. A message with tool calls moves to `ToolsPending`, where the
//! calls run in request order and their results are appended as a single
//! `tool` message. A message without tool calls ends the turn.

use std::sync::Arc;

use serde_json::Value;

use crate::logging::Logger;
use crate::providers::ModelAdapter;
use crate::tools::{ToolPattern, ToolRegistry};
use crate::types::{CancellationToken, Message, ToolCallRequest, ToolCallResult};

use super::batch::batch_message;
use super::context::ConversationContext;
use super::error::{ConversationError, ConversationResult};
use super::observer::{ToolEvent, ToolObserver};

/// Where a turn currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Idle,
    AwaitingModel,
    ToolsPending,
    Done,
}

/// Limits applied to every conversation
#[derive(Debug, Clone, Default)]
pub struct OrchestratorOptions {
    /// Model invocations allowed per turn; `None` is unbounded
    pub max_turns: Option<usize>,
}

impl OrchestratorOptions {
    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = Some(max_turns);
        self
    }
}

/// Drives conversations between a model and the tool registry
pub struct Orchestrator {
    model: Arc<dyn ModelAdapter>,
    registry: Arc<ToolRegistry>,
    options: OrchestratorOptions,
    logger: Arc<dyn Logger>,
}

impl Orchestrator {
    pub fn new(
        model: Arc<dyn ModelAdapter>,
        registry: Arc<ToolRegistry>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            model,
            registry,
            options: OrchestratorOptions::default(),
            logger,
        }
    }

    pub fn with_options(mut self, options: OrchestratorOptions) -> Self {
        self.options = options;
        self
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    pub fn options(&self) -> &OrchestratorOptions {
        &self.options
    }

    /// Open a conversation with the agent's system prompt and `user_text`
    pub async fn start_conversation(
        &self,
        ctx: &ConversationContext,
        user_text: &str,
        observer: Option<&dyn ToolObserver>,
        cancel: &CancellationToken,
    ) -> ConversationResult<Vec<Message>> {
        let history = vec![
            Message::system(ctx.agent.system_content.as_str()),
            Message::user(user_text),
        ];
        self.run(ctx, history, observer, cancel).await
    }

    /// Add a user message to `history` and run a turn
    ///
    /// `history` itself is never modified; the extended history is returned.
    pub async fn continue_conversation(
        &self,
        ctx: &ConversationContext,
        history: &[Message],
        user_text: &str,
        observer: Option<&dyn ToolObserver>,
        cancel: &CancellationToken,
    ) -> ConversationResult<Vec<Message>> {
        let mut history = history.to_vec();
        history.push(Message::user(user_text));
        self.run(ctx, history, observer, cancel).await
    }

    /// Run one turn over `history` until the model stops requesting tools
    ///
    /// Returns the full history, ending with the model's final message.
    pub async fn run(
        &self,
        ctx: &ConversationContext,
        mut history: Vec<Message>,
        observer: Option<&dyn ToolObserver>,
        cancel: &CancellationToken,
    ) -> ConversationResult<Vec<Message>> {
        let mut state = TurnState::Idle;
        let allowed = self.allowed_patterns(ctx);
        let mut model_calls = 0usize;

        self.transition(&mut state, TurnState::AwaitingModel);
        loop {
            if cancel.is_cancelled() {
                return Err(ConversationError::Cancelled);
            }
            if let Some(max) = self.options.max_turns {
                if model_calls >= max {
                    self.logger.warn(&format!(
                        "[Orchestrator] Giving up after {} model turns",
                        max
                    ));
                    return Err(ConversationError::MaxTurnsExceeded(max));
                }
            }
            model_calls += 1;

            let tools = allowed.as_ref().map(|patterns| self.registry.query(patterns));
            self.logger.debug(&format!(
                "[Orchestrator] Asking {} ({} messages, {} tools)",
                ctx.target,
                history.len(),
                tools.as_ref().map_or(0, Vec::len)
            ));

            let reply = self
                .model
                .chat(&ctx.target, &history, tools.as_deref(), cancel)
                .await
                .map_err(ConversationError::from_model)?;
            if cancel.is_cancelled() {
                return Err(ConversationError::Cancelled);
            }

            let calls = reply.tool_calls.clone();
            history.push(reply);

            if calls.is_empty() {
                self.transition(&mut state, TurnState::Done);
                return Ok(history);
            }

            self.transition(&mut state, TurnState::ToolsPending);
            let patterns = allowed.as_deref().unwrap_or(&[]);
            let mut results = Vec::with_capacity(calls.len());
            for call in &calls {
                results.push(self.run_tool(call, patterns, observer, cancel).await);
                if cancel.is_cancelled() {
                    return Err(ConversationError::Cancelled);
                }
            }
            history.push(batch_message(&results)?);
            self.transition(&mut state, TurnState::AwaitingModel);
        }
    }

    /// Patterns the agent may reach, `None` when tools are off
    ///
    /// An enabled agent without patterns reaches every registered server.
    fn allowed_patterns(&self, ctx: &ConversationContext) -> Option<Vec<ToolPattern>> {
        if !ctx.agent.uses_tools() {
            return None;
        }
        let patterns = ctx.agent.patterns();
        if patterns.is_empty() {
            // Per-server patterns let `resolve` qualify bare names; an empty
            // list would leave them unqualified and the call would miss.
            return Some(
                self.registry
                    .servers()
                    .into_iter()
                    .map(ToolPattern::Server)
                    .collect(),
            );
        }
        Some(patterns)
    }

    async fn run_tool(
        &self,
        call: &ToolCallRequest,
        allowed: &[ToolPattern],
        observer: Option<&dyn ToolObserver>,
        cancel: &CancellationToken,
    ) -> ToolCallResult {
        let arguments = self.decode_arguments(call);

        let tool = match self.registry.resolve(call.name(), allowed) {
            Ok(tool) => tool,
            Err(failure) => {
                self.logger.warn(&format!(
                    "[Orchestrator] Could not resolve '{}': {}",
                    call.name(),
                    failure.message
                ));
                let result = ToolCallResult::failure(call.name(), failure);
                notify(observer, ToolEvent::Call {
                    tool: result.tool.clone(),
                    arguments,
                });
                notify(observer, ToolEvent::Result {
                    tool: result.tool.clone(),
                    result: result.result.clone(),
                });
                return result;
            }
        };

        notify(observer, ToolEvent::Call {
            tool: tool.clone(),
            arguments: arguments.clone(),
        });
        let result = self.registry.call(&tool, arguments, cancel).await;
        notify(observer, ToolEvent::Result {
            tool: result.tool.clone(),
            result: result.result.clone(),
        });
        result
    }

    /// Structured arguments, or the raw text when it is not valid JSON
    fn decode_arguments(&self, call: &ToolCallRequest) -> Value {
        match call.decode_arguments() {
            Ok(arguments) => arguments,
            Err(e) => {
                self.logger.warn(&format!(
                    "[Orchestrator] Passing raw arguments to {}: {}",
                    call.name(),
                    e
                ));
                call.function.arguments.clone()
            }
        }
    }

    fn transition(&self, state: &mut TurnState, next: TurnState) {
        self.logger
            .debug(&format!("[Orchestrator] {:?} -> {:?}", state, next));
        *state = next;
    }
}

fn notify(observer: Option<&dyn ToolObserver>, event: ToolEvent) {
    if let Some(observer) = observer {
        observer.notify(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::AgentProfile;
    use crate::logging::{LogLevel, MemoryLogger, NoOpLogger};
    use crate::orchestrator::{decode_batch, EventLog};
    use crate::protocol::{McpResult, ToolServerClient};
    use crate::providers::{ModelTarget, ScriptedModel};
    use crate::types::{MessageRole, ToolDefinition, ToolErrorKind, ToolOutcome};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::json;

    /// Server whose tools echo their arguments back
    struct EchoServer {
        name: String,
        tools: Vec<&'static str>,
        calls: Mutex<Vec<(String, Value)>>,
    }

    impl EchoServer {
        fn new(name: &str, tools: Vec<&'static str>) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                tools,
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ToolServerClient for EchoServer {
        fn server_name(&self) -> &str {
            &self.name
        }

        async fn list_tools(&self) -> McpResult<Vec<ToolDefinition>> {
            Ok(self
                .tools
                .iter()
                .map(|t| ToolDefinition::new(self.name.as_str(), *t))
                .collect())
        }

        async fn call_tool(
            &self,
            name: &str,
            arguments: Value,
            _cancel: &CancellationToken,
        ) -> McpResult<ToolOutcome> {
            self.calls.lock().push((name.to_string(), arguments.clone()));
            Ok(ToolOutcome::Success(json!({ "echo": arguments })))
        }
    }

    async fn registry_with(servers: Vec<Arc<EchoServer>>) -> Arc<ToolRegistry> {
        let clients = servers
            .into_iter()
            .map(|s| s as Arc<dyn ToolServerClient>)
            .collect();
        let registry = Arc::new(ToolRegistry::with_clients(clients, Arc::new(NoOpLogger)));
        registry.refresh().await;
        registry
    }

    fn ctx(agent: AgentProfile) -> ConversationContext {
        ConversationContext::new(ModelTarget::new("scripted", "test"), agent)
    }

    fn tool_agent() -> AgentProfile {
        AgentProfile::new("helpful", "You are helpful.").with_tools(["slack.*"])
    }

    #[tokio::test]
    async fn test_plain_answer() {
        let model = Arc::new(ScriptedModel::new(Arc::new(NoOpLogger)).then_text("Hello!"));
        let registry = registry_with(vec![]).await;
        let orchestrator = Orchestrator::new(model.clone(), registry, Arc::new(NoOpLogger));

        let history = orchestrator
            .start_conversation(
                &ctx(AgentProfile::new("plain", "Be brief.")),
                "hi",
                None,
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(history.len(), 3);
        assert_eq!(history[0], Message::system("Be brief."));
        assert_eq!(history[1], Message::user("hi"));
        assert_eq!(history[2].text_content(), Some("Hello!"));
        // Tools disabled: nothing offered
        assert!(model.requests()[0].tools.is_none());
    }

    #[tokio::test]
    async fn test_tool_turn_then_answer() {
        let slack = EchoServer::new("slack", vec!["get_users"]);
        let registry = registry_with(vec![slack.clone()]).await;
        let model = Arc::new(
            ScriptedModel::new(Arc::new(NoOpLogger))
                .then_tool_calls(vec![ToolCallRequest::new(
                    "c1",
                    "get_users",
                    Value::String("{\"limit\": 10}".into()),
                )])
                .then_text("There are users."),
        );
        let orchestrator = Orchestrator::new(model.clone(), registry, Arc::new(NoOpLogger));
        let events = EventLog::new();

        let history = orchestrator
            .start_conversation(&ctx(tool_agent()), "who?", Some(&events), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(history.len(), 5);
        assert_eq!(history[3].role, MessageRole::Tool);
        let batch = decode_batch(history[3].text_content().unwrap()).unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].tool, "slack.get_users");
        assert_eq!(batch[0].result, ToolOutcome::Success(json!({"echo": {"limit": 10}})));
        assert_eq!(history[4].text_content(), Some("There are users."));

        assert_eq!(slack.calls.lock()[0], ("get_users".to_string(), json!({"limit": 10})));
        assert_eq!(
            events.summary(),
            vec![
                ("tool_call", "slack.get_users".to_string()),
                ("tool_result", "slack.get_users".to_string())
            ]
        );

        let requests = model.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].tool_names(), vec!["slack.get_users"]);
        assert_eq!(requests[1].messages.len(), 4);
    }

    #[tokio::test]
    async fn test_results_keep_request_order() {
        let slack = EchoServer::new("slack", vec!["a", "b"]);
        let registry = registry_with(vec![slack]).await;
        let model = Arc::new(
            ScriptedModel::new(Arc::new(NoOpLogger))
                .then_tool_calls(vec![
                    ToolCallRequest::new("1", "b", json!({"n": 1})),
                    ToolCallRequest::new("2", "missing", json!({})),
                    ToolCallRequest::new("3", "a", json!({"n": 3})),
                ])
                .then_text("ok"),
        );
        let orchestrator = Orchestrator::new(model, registry, Arc::new(NoOpLogger));

        let history = orchestrator
            .start_conversation(&ctx(tool_agent()), "go", None, &CancellationToken::new())
            .await
            .unwrap();

        let batch = decode_batch(history[3].text_content().unwrap()).unwrap();
        let tools: Vec<_> = batch.iter().map(|r| r.tool.as_str()).collect();
        assert_eq!(tools, vec!["slack.b", "slack.missing", "slack.a"]);
        assert_eq!(
            batch[1].result.failure().map(|f| f.kind),
            Some(ToolErrorKind::ToolNotFound)
        );
    }

    #[tokio::test]
    async fn test_undecodable_arguments_pass_through() {
        let slack = EchoServer::new("slack", vec!["post"]);
        let registry = registry_with(vec![slack.clone()]).await;
        let model = Arc::new(
            ScriptedModel::new(Arc::new(NoOpLogger))
                .then_tool_calls(vec![ToolCallRequest::new(
                    "c1",
                    "post",
                    Value::String("not json".into()),
                )])
                .then_text("posted"),
        );
        let logger = Arc::new(MemoryLogger::new());
        let orchestrator = Orchestrator::new(model, registry, logger.clone());

        orchestrator
            .start_conversation(&ctx(tool_agent()), "post", None, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(slack.calls.lock()[0].1, Value::String("not json".into()));
        assert!(logger.contains(LogLevel::Warn, "Passing raw arguments"));
    }

    #[tokio::test]
    async fn test_max_turns() {
        let slack = EchoServer::new("slack", vec!["get_users"]);
        let registry = registry_with(vec![slack]).await;
        let looping = (0..5).fold(ScriptedModel::new(Arc::new(NoOpLogger)), |m, i| {
            m.then_tool_calls(vec![ToolCallRequest::new(i.to_string(), "get_users", json!({}))])
        });
        let orchestrator = Orchestrator::new(Arc::new(looping), registry, Arc::new(NoOpLogger))
            .with_options(OrchestratorOptions::default().with_max_turns(3));

        let err = orchestrator
            .start_conversation(&ctx(tool_agent()), "loop", None, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ConversationError::MaxTurnsExceeded(3)));
    }

    #[tokio::test]
    async fn test_model_failure_is_fatal() {
        let registry = registry_with(vec![]).await;
        let model = Arc::new(ScriptedModel::new(Arc::new(NoOpLogger)).then_error("overloaded"));
        let orchestrator = Orchestrator::new(model, registry, Arc::new(NoOpLogger));
        let history = vec![Message::system("s"), Message::user("u"), Message::assistant("a")];

        let err = orchestrator
            .continue_conversation(
                &ctx(tool_agent()),
                &history,
                "again",
                None,
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ConversationError::Model(_)));
        assert_eq!(history.len(), 3);
    }

    #[tokio::test]
    async fn test_cancelled_before_model_answers() {
        let registry = registry_with(vec![]).await;
        let model = Arc::new(
            ScriptedModel::new(Arc::new(NoOpLogger))
                .then_text("late")
                .with_delay(std::time::Duration::from_secs(60)),
        );
        let orchestrator = Orchestrator::new(model, registry, Arc::new(NoOpLogger));
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::task::yield_now().await;
            trigger.cancel();
        });

        let err = orchestrator
            .start_conversation(&ctx(tool_agent()), "hi", None, &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, ConversationError::Cancelled));
    }

    #[tokio::test]
    async fn test_enabled_agent_without_patterns_reaches_all_servers() {
        let slack = EchoServer::new("slack", vec!["get_users"]);
        let youtube = EchoServer::new("youtube", vec!["get_transcript"]);
        let registry = registry_with(vec![slack, youtube.clone()]).await;
        let model = Arc::new(
            ScriptedModel::new(Arc::new(NoOpLogger))
                .then_tool_calls(vec![ToolCallRequest::new("c1", "get_transcript", json!({}))])
                .then_text("done"),
        );
        let orchestrator = Orchestrator::new(model.clone(), registry, Arc::new(NoOpLogger));
        let agent = AgentProfile {
            enable_tools: true,
            ..AgentProfile::new("open", "Anything goes.")
        };

        let history = orchestrator
            .start_conversation(&ctx(agent), "watch", None, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(model.requests()[0].tool_names().len(), 2);
        let batch = decode_batch(history[3].text_content().unwrap()).unwrap();
        assert_eq!(batch[0].tool, "youtube.get_transcript");
        assert_eq!(youtube.calls.lock().len(), 1);
    }
}
