use std::sync::Arc;

use realzen_agent_model::ModelProvider;

use super::{Agent, DEFAULT_MAX_TURNS};
use crate::conversation::TranscriptSource;
use crate::model_client::ModelClient;
use crate::tool::{Dispatcher, Toolset};

/// [`Agent`] builder.
pub struct AgentBuilder {
    agent: Agent,
}

impl AgentBuilder {
    /// Creates a new builder with the specified model provider.
    #[inline]
    pub fn with_model_provider<P: ModelProvider + 'static>(
        provider: P,
    ) -> Self {
        Self {
            agent: Agent {
                model_client: ModelClient::new(provider),
                tools: Dispatcher::empty(),
                system_prompt: None,
                max_turns: DEFAULT_MAX_TURNS,
                on_transcript: None,
            },
        }
    }

    /// Sets the tools offered to the model.
    #[inline]
    pub fn with_toolset<T: Toolset>(mut self, toolset: T) -> Self {
        self.agent.tools = Dispatcher::new(toolset);
        self
    }

    /// Sets the system prompt.
    ///
    /// The prompt is sent ahead of the conversation on every model
    /// invocation and is never stored in the conversation. Occurrences of
    /// `{system_time}` are replaced with the current UTC time.
    #[inline]
    pub fn with_system_prompt<S: Into<String>>(mut self, prompt: S) -> Self {
        self.agent.system_prompt = Some(prompt.into());
        self
    }

    /// Sets how many times the model may be invoked in one run.
    ///
    /// Values below 1 are raised to 1.
    #[inline]
    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.agent.max_turns = max_turns.max(1);
        self
    }

    /// Attaches a callback invoked with the transcript of every assistant
    /// message and tool result as it is appended.
    #[inline]
    pub fn on_transcript(
        mut self,
        on_transcript: impl Fn(&str, TranscriptSource) + Send + Sync + 'static,
    ) -> Self {
        self.agent.on_transcript = Some(Arc::new(on_transcript));
        self
    }

    /// Builds the agent.
    #[inline]
    pub fn build(self) -> Agent {
        self.agent
    }
}
