use realzen_agent_model::{ErrorKind as ModelErrorKind, ModelProviderError};

use crate::tool::{self, ErrorKind as ToolErrorKind};

/// The error that ends an agent run.
///
/// None of these are retried. The conversation of the failed run is
/// dropped, the caller keeps whatever it held before the run started.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The model answered with something other than a well-formed
    /// assistant message.
    #[error("malformed model output: {0}")]
    MalformedModelOutput(String),
    /// The model provider failed.
    #[error("model invocation failed: {0}")]
    ModelInvocation(Box<dyn ModelProviderError>),
    /// A tool failed in a way the model cannot recover from.
    #[error("tool `{name}` failed: {source}")]
    Tool {
        /// The name of the tool.
        name: String,
        /// The tool error.
        source: tool::Error,
    },
    /// The model kept requesting tools after the allowed number of turns.
    #[error("the model was still requesting tools after {0} turns")]
    MaxTurnsExceeded(usize),
}

impl Error {
    /// Returns the provider error kind for [`Error::ModelInvocation`].
    pub fn model_error_kind(&self) -> Option<ModelErrorKind> {
        match self {
            Error::ModelInvocation(err) => Some(err.kind()),
            _ => None,
        }
    }

    /// Returns the tool error kind for [`Error::Tool`].
    pub fn tool_error_kind(&self) -> Option<ToolErrorKind> {
        match self {
            Error::Tool { source, .. } => Some(source.kind()),
            _ => None,
        }
    }
}
