mod builder;
mod state;

use std::sync::Arc;

use tracing::Instrument;

use crate::conversation::{Conversation, TranscriptSource};
use crate::error::Error;
use crate::model_client::ModelClient;
use crate::tool::Dispatcher;
pub use builder::AgentBuilder;

/// The number of model invocations allowed in one run unless configured
/// otherwise.
pub const DEFAULT_MAX_TURNS: usize = 25;

type TranscriptFn = Arc<dyn Fn(&str, TranscriptSource) + Send + Sync>;

/// An agent that drives a model and its tools until the model answers.
///
/// An agent holds no conversation of its own. Every [`Agent::run`] takes a
/// conversation, appends to it and returns it, so one agent can serve any
/// number of conversations.
#[derive(Clone)]
pub struct Agent {
    model_client: ModelClient,
    tools: Dispatcher,
    system_prompt: Option<String>,
    max_turns: usize,
    on_transcript: Option<TranscriptFn>,
}

impl Agent {
    /// Runs the agent loop over `conversation`.
    ///
    /// The model is invoked, the tools it asks for are executed and their
    /// results appended, and this repeats until the model replies without
    /// tool calls. The conversation is returned with every message of the
    /// run appended.
    pub async fn run(
        &self,
        conversation: Conversation,
    ) -> Result<Conversation, Error> {
        state::run(self, conversation)
            .instrument(debug_span!("agent run"))
            .await
    }

    /// Appends `input` to a copy of `conversation` and runs the loop.
    ///
    /// `conversation` itself is left untouched, so callers still have it
    /// when the run fails.
    pub async fn send_message<S: Into<String>>(
        &self,
        conversation: &Conversation,
        input: S,
    ) -> Result<Conversation, Error> {
        let mut conversation = conversation.clone();
        conversation.push_user_input(input);
        self.run(conversation).await
    }

    #[inline]
    fn emit_transcript(&self, transcript: &str, source: TranscriptSource) {
        if let Some(on_transcript) = &self.on_transcript {
            on_transcript(transcript, source);
        }
    }
}
