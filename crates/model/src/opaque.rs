use std::any::Any;
use std::fmt::{self, Debug, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A provider-specific message kept verbatim in the conversation history.
///
/// The neutral message types of this crate cannot express everything a
/// provider may need to see again on the next request. An assistant message
/// that requested tools is the typical case: the provider expects its own
/// tool call records replayed before the matching tool results. Providers
/// wrap their native message in an `OpaqueMessage` and unwrap it again with
/// [`OpaqueMessage::to_raw`] when building the next request.
pub struct OpaqueMessage(Arc<dyn OpaqueMessageObject>);

impl OpaqueMessage {
    /// Wraps `value` under the given `id`.
    ///
    /// The `id` must be unique within a conversation. Two opaque messages
    /// are equal exactly when their ids are equal.
    #[inline]
    pub fn new<ID: Into<String>, T: Send + Sync + 'static>(
        id: ID,
        value: T,
    ) -> Self {
        Self(Arc::new(OpaqueMessageInner {
            id: id.into(),
            value,
        }))
    }

    /// Returns the id of this message.
    #[inline]
    pub fn id(&self) -> &str {
        self.0.id()
    }

    /// Returns the wrapped value if it is a `T`.
    #[inline]
    pub fn to_raw<T: 'static>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref()
    }
}

impl Clone for OpaqueMessage {
    #[inline]
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl Debug for OpaqueMessage {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_tuple("OpaqueMessage").field(&self.id()).finish()
    }
}

impl PartialEq for OpaqueMessage {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for OpaqueMessage {}

impl Hash for OpaqueMessage {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

trait OpaqueMessageObject: Send + Sync {
    fn id(&self) -> &str;
    fn as_any(&self) -> &dyn Any;
}

struct OpaqueMessageInner<T> {
    id: String,
    value: T,
}

impl<T: Send + Sync + 'static> OpaqueMessageObject for OpaqueMessageInner<T> {
    fn id(&self) -> &str {
        &self.id
    }

    fn as_any(&self) -> &dyn Any {
        &self.value
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    struct NativeAssistantMessage {
        tool_call_ids: Vec<String>,
    }

    #[test]
    fn test_unwrap_native_message() {
        let opaque = OpaqueMessage::new(
            "chatcmpl-1",
            NativeAssistantMessage {
                tool_call_ids: vec!["call_1".to_owned()],
            },
        );
        assert_eq!(opaque.id(), "chatcmpl-1");

        let native = opaque.to_raw::<NativeAssistantMessage>().unwrap();
        assert_eq!(native.tool_call_ids, ["call_1"]);
        assert!(opaque.to_raw::<String>().is_none());
    }

    #[test]
    fn test_identity_by_id() {
        let first = OpaqueMessage::new("msg:0", "Searching now.".to_owned());
        let second = OpaqueMessage::new("msg:1", "Here you go.".to_owned());
        let first_again = OpaqueMessage::new("msg:0", 42_u32);

        assert_eq!(first, first.clone());
        assert_eq!(first, first_again);
        assert_ne!(first, second);

        let set: HashSet<_> = [first, first_again, second].into_iter().collect();
        assert_eq!(set.len(), 2);
    }
}
