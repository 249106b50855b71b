//! Conversation-related types.

use realzen_agent_model::{ModelMessage, ToolCallRequest};

/// Who produced a conversation item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TranscriptSource {
    /// The human user.
    User,
    /// The model.
    Assistant,
    /// The result of a tool call.
    Tool,
}

/// An append-only sequence of messages.
///
/// Items can be added but never edited or removed.
#[derive(Clone, Default, Debug)]
pub struct Conversation {
    items: Vec<Item>,
}

impl Conversation {
    /// Creates an empty conversation.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a user input.
    pub fn push_user_input<S: Into<String>>(&mut self, input: S) {
        let input = input.into();
        self.push(Item {
            msg: ModelMessage::User(input.clone()),
            transcript: input,
            source: TranscriptSource::User,
            tool_calls: vec![],
        });
    }

    /// Returns all items, oldest first.
    #[inline]
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Returns the number of items.
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the conversation has no items.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the most recent item produced by the model.
    pub fn last_assistant_item(&self) -> Option<&Item> {
        self.items
            .iter()
            .rev()
            .find(|item| item.source == TranscriptSource::Assistant)
    }

    pub(crate) fn push(&mut self, item: Item) {
        self.items.push(item);
    }

    pub(crate) fn messages(&self) -> impl Iterator<Item = &ModelMessage> {
        self.items.iter().map(|item| &item.msg)
    }
}

/// An item in the conversation.
#[derive(Clone, Debug)]
pub struct Item {
    pub(crate) msg: ModelMessage,
    pub(crate) transcript: String,
    pub(crate) source: TranscriptSource,
    pub(crate) tool_calls: Vec<ToolCallRequest>,
}

impl Item {
    /// Returns the message sent to the model for this item.
    #[inline]
    pub fn message(&self) -> &ModelMessage {
        &self.msg
    }

    /// Returns the transcript of this item.
    ///
    /// The transcript is a plain text rendering of the item for display
    /// or export. It alone is not enough to rebuild the message.
    #[inline]
    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    /// Returns who produced this item.
    #[inline]
    pub fn source(&self) -> TranscriptSource {
        self.source
    }

    /// Returns the tool calls requested by this item.
    ///
    /// Always empty for items not produced by the model.
    #[inline]
    pub fn tool_calls(&self) -> &[ToolCallRequest] {
        &self.tool_calls
    }
}
