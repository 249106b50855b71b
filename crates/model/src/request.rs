use serde_json::Value;

use crate::OpaqueMessage;

/// A request to be sent to the model provider.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ModelRequest {
    /// The input messages, oldest first.
    pub messages: Vec<ModelMessage>,
    /// Tools that are available to the model.
    pub tools: Vec<ModelTool>,
}

impl ModelRequest {
    /// Returns the system instructions, if the request starts with any.
    pub fn system_prompt(&self) -> Option<&str> {
        match self.messages.first() {
            Some(ModelMessage::System(prompt)) => Some(prompt),
            _ => None,
        }
    }

    /// Returns the number of model turns already in the request.
    pub fn assistant_turns(&self) -> usize {
        self.messages.iter().filter(|msg| msg.is_assistant()).count()
    }

    /// Returns the definition of the tool named `name`.
    pub fn tool(&self, name: &str) -> Option<&ModelTool> {
        self.tools.iter().find(|tool| tool.name == name)
    }
}

/// A complete message.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ModelMessage {
    /// The system instructions.
    System(String),
    /// A user input text.
    User(String),
    /// A plain assistant text without tool calls.
    Assistant(String),
    /// A tool call result.
    Tool(ToolCallResult),
    /// A provider-native message, usually an assistant turn that the
    /// provider wants replayed verbatim.
    Opaque(OpaqueMessage),
}

impl ModelMessage {
    /// Returns `true` if the message was produced by the model.
    ///
    /// Opaque messages only ever hold model output.
    #[inline]
    pub fn is_assistant(&self) -> bool {
        matches!(self, ModelMessage::Assistant(_) | ModelMessage::Opaque(_))
    }
}

/// The result of calling a tool.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ToolCallResult {
    /// The id of the tool call request this result answers.
    pub id: String,
    /// The result of the tool call.
    pub content: String,
}

impl ToolCallResult {
    /// Creates the result answering the tool call `id`.
    #[inline]
    pub fn new<I: Into<String>, C: Into<String>>(id: I, content: C) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
        }
    }
}

/// Describes a tool that can be used by the model.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ModelTool {
    /// Name of the tool.
    pub name: String,
    /// Description of the tool.
    pub description: String,
    /// Parameters of the tool as a [JSON schema](https://json-schema.org/).
    pub parameters: Value,
}
