//! Per-conversation selection of model and agent

use crate::agents::{AgentBook, AgentProfile};
use crate::config::ConfigProvider;
use crate::providers::ModelTarget;

use super::error::{ConversationError, ConversationResult};

/// Everything a turn needs to know about who it is talking to
///
/// Passed explicitly to every orchestrator call, so independent
/// conversations can use different models and agents side by side.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationContext {
    pub target: ModelTarget,
    pub agent: AgentProfile,
}

impl ConversationContext {
    pub fn new(target: ModelTarget, agent: AgentProfile) -> Self {
        Self { target, agent }
    }

    /// Build a context from configuration
    ///
    /// `model` and `agent` override the configured defaults.
    pub async fn from_config(
        config: &dyn ConfigProvider,
        model: Option<&str>,
        agent: Option<&str>,
    ) -> ConversationResult<Self> {
        let model = match model {
            Some(model) => model.to_string(),
            None => config
                .default_model()
                .await?
                .ok_or(ConversationError::NoModelSelected)?,
        };
        let target = ModelTarget::parse(&model)?;

        let agent_name = match agent {
            Some(agent) => agent.to_string(),
            None => config
                .default_agent()
                .await?
                .ok_or(ConversationError::NoAgentSelected)?,
        };
        let book = AgentBook::new(config.agents().await?);
        let agent = book.require(&agent_name)?.clone();

        Ok(Self { target, agent })
    }

    /// Same agent, different model
    pub fn with_target(mut self, target: ModelTarget) -> Self {
        self.target = target;
        self
    }
}
