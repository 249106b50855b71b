use realzen_agent_model::{ErrorKind, ToolCallRequest};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The events in a preset response.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PresetEvent {
    #[serde(rename = "message_delta")]
    MessageDelta(String),
    #[serde(rename = "tool_call")]
    ToolCall(ToolCallRequest),
}

impl PresetEvent {
    /// Shorthand for a tool call event.
    #[inline]
    pub fn tool_call(id: &str, name: &str, arguments: Value) -> Self {
        Self::ToolCall(ToolCallRequest {
            id: id.to_owned(),
            name: name.to_owned(),
            arguments,
        })
    }
}

/// The preset response for one assistant turn.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PresetResponse {
    /// Events in this response.
    pub events: Vec<PresetEvent>,
    /// If set, the request fails with this kind instead of responding.
    #[serde(skip)]
    pub failure: Option<ErrorKind>,
    /// If set, the response ends without reporting a finish reason.
    #[serde(default)]
    pub truncated: bool,
}

impl PresetResponse {
    /// Creates a `PresetResponse` with the specified events.
    #[inline]
    pub fn with_events(events: impl Into<Vec<PresetEvent>>) -> Self {
        Self {
            events: events.into(),
            failure: None,
            truncated: false,
        }
    }

    /// Creates a final text answer.
    #[inline]
    pub fn text(text: &str) -> Self {
        Self::with_events([PresetEvent::MessageDelta(text.to_owned())])
    }

    /// Creates a response that fails with `kind`.
    #[inline]
    pub fn failing(kind: ErrorKind) -> Self {
        Self {
            events: vec![],
            failure: Some(kind),
            truncated: false,
        }
    }

    /// Drops the finish reason from the end of this response.
    #[inline]
    pub fn truncated(mut self) -> Self {
        self.truncated = true;
        self
    }
}
