use realzen_agent_core::{
    Agent, AgentBuilder, Conversation, Error, TranscriptSource,
};
use realzen_agent_model::ModelProvider;

use crate::config::{ConfigError, Configuration};
use crate::tools::{PropertySearchTool, RealzenToolset};

/// A session builder.
///
/// See [`Session`].
pub struct SessionBuilder {
    agent_builder: AgentBuilder,
    search_endpoint: Option<String>,
}

impl SessionBuilder {
    /// Creates a session builder with a specified model provider.
    pub fn with_model_provider<M: ModelProvider + 'static>(
        provider: M,
    ) -> Self {
        let agent_builder = AgentBuilder::with_model_provider(provider);
        Self {
            agent_builder,
            search_endpoint: None,
        }
    }

    /// Attaches a callback to be invoked when a transcript is generated.
    #[inline]
    pub fn on_transcript(
        mut self,
        on_transcript: impl Fn(&str, TranscriptSource) + Send + Sync + 'static,
    ) -> Self {
        self.agent_builder = self.agent_builder.on_transcript(on_transcript);
        self
    }

    /// Sends property searches to `endpoint` instead of the listings API.
    #[inline]
    pub fn with_search_endpoint<S: Into<String>>(mut self, endpoint: S) -> Self {
        self.search_endpoint = Some(endpoint.into());
        self
    }

    /// Builds a new session.
    pub fn build(self, config: &Configuration) -> Result<Session, ConfigError> {
        let mut search = PropertySearchTool::new(config)?;
        if let Some(endpoint) = &self.search_endpoint {
            search = search.with_endpoint(endpoint);
        }

        let agent = self
            .agent_builder
            .with_toolset(RealzenToolset::with_search_tool(search))
            .with_system_prompt(config.system_prompt())
            .with_max_turns(config.max_turns().get())
            .build();
        debug!(model = config.model(), "session created");

        Ok(Session {
            agent,
            conversation: Conversation::new(),
        })
    }
}

/// A chat session, like a window that displays messages and has a input box.
///
/// The session owns the running conversation. A message that fails leaves
/// the conversation as it was before the message was sent.
pub struct Session {
    agent: Agent,
    conversation: Conversation,
}

impl Session {
    /// Sends a message and runs the agent until it answers.
    ///
    /// Returns the text of the final answer.
    pub async fn send_message(&mut self, message: &str) -> Result<&str, Error> {
        let conversation =
            self.agent.send_message(&self.conversation, message).await?;
        self.conversation = conversation;
        Ok(self
            .conversation
            .last_assistant_item()
            .map(|item| item.transcript())
            .unwrap_or_default())
    }

    /// Returns the conversation so far.
    #[inline]
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }
}
