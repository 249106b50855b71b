use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

use realzen_agent_model::{
    ErrorKind, ModelFinishReason, ModelResponse, ModelResponseEvent,
    OpaqueMessage, ToolCallRequest,
};
use serde_json::Value;

use crate::Error;
use crate::proto::{ChatCompletion, Message, ToolCall};

/// A complete chat completion replayed as a sequence of events.
pub struct OpenAIResponse {
    events: VecDeque<ModelResponseEvent>,
    full_msg: (String, Message),
}

impl OpenAIResponse {
    pub(crate) fn from_completion(
        completion: ChatCompletion,
    ) -> Result<Self, Error> {
        let ChatCompletion { id, choices } = completion;
        let Some(choice) = choices.into_iter().next() else {
            return Err(Error::new("completion has no choices", ErrorKind::Other));
        };
        if choice.finish_reason.as_deref() == Some("content_filter") {
            return Err(Error::new(
                "completion was stopped by the content filter",
                ErrorKind::Moderated,
            ));
        }

        // Events go out in a fixed order: text, tool calls, finish reason.
        let mut events = VecDeque::new();
        let content = choice.message.content.filter(|c| !c.is_empty());
        if let Some(content) = &content {
            events.push_back(ModelResponseEvent::MessageDelta(content.clone()));
        }
        let tool_calls = choice.message.tool_calls.filter(|t| !t.is_empty());
        for tool_call in tool_calls.iter().flatten() {
            events.push_back(ModelResponseEvent::ToolCall(tool_call_request(
                tool_call,
            )));
        }
        // A missing finish reason is left for the caller to reject.
        if let Some(finish_reason) = choice.finish_reason {
            let finish_reason = if finish_reason == "tool_calls" {
                ModelFinishReason::ToolCalls
            } else {
                ModelFinishReason::Stop
            };
            events.push_back(ModelResponseEvent::Completed(finish_reason));
        }

        Ok(Self {
            events,
            full_msg: (
                id,
                Message::Assistant {
                    content,
                    tool_calls,
                    reasoning_content: choice.message.reasoning_content,
                },
            ),
        })
    }
}

fn tool_call_request(tool_call: &ToolCall) -> ToolCallRequest {
    // Undecodable arguments are passed on as the raw string so the loop can
    // reject the message as malformed.
    let arguments = match tool_call.function.arguments.trim() {
        "" => Value::Null,
        raw => serde_json::from_str(raw)
            .unwrap_or_else(|_| Value::String(raw.to_owned())),
    };
    ToolCallRequest {
        id: tool_call.id.clone(),
        name: tool_call.function.name.clone(),
        arguments,
    }
}

impl ModelResponse for OpenAIResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        Poll::Ready(Ok(self.get_mut().events.pop_front()))
    }

    fn make_opaque_message(&self) -> Option<OpaqueMessage> {
        let (id, msg) = &self.full_msg;
        Some(OpaqueMessage::new(id, msg.clone()))
    }
}

#[cfg(test)]
mod tests {
    use std::future::poll_fn;
    use std::pin::pin;

    use realzen_agent_model::ModelProviderError;
    use serde_json::json;

    use super::*;

    fn completion(value: Value) -> ChatCompletion {
        serde_json::from_value(value).unwrap()
    }

    async fn drain(resp: OpenAIResponse) -> (Vec<ModelResponseEvent>, OpaqueMessage) {
        let mut resp = pin!(resp);
        let mut events = vec![];
        while let Some(event) = poll_fn(|cx| resp.as_mut().poll_next_event(cx))
            .await
            .unwrap()
        {
            events.push(event);
        }
        (events, resp.make_opaque_message().unwrap())
    }

    #[tokio::test]
    async fn test_tool_call_events() {
        let resp = OpenAIResponse::from_completion(completion(json!({
            "id": "chatcmpl-7",
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": "Let me look that up.",
                    "tool_calls": [
                        {
                            "id": "call_a",
                            "type": "function",
                            "function": {
                                "name": "search_for_properties_by_location",
                                "arguments": "{\"location\":\"Austin, TX\"}"
                            }
                        },
                        {
                            "id": "call_b",
                            "type": "function",
                            "function": {
                                "name": "calculate_cash_on_cash",
                                "arguments": ""
                            }
                        }
                    ]
                },
                "finish_reason": "tool_calls"
            }]
        })))
        .unwrap();

        let (events, opaque) = drain(resp).await;
        assert_eq!(
            events,
            [
                ModelResponseEvent::MessageDelta("Let me look that up.".to_owned()),
                ModelResponseEvent::ToolCall(ToolCallRequest {
                    id: "call_a".to_owned(),
                    name: "search_for_properties_by_location".to_owned(),
                    arguments: json!({ "location": "Austin, TX" }),
                }),
                ModelResponseEvent::ToolCall(ToolCallRequest {
                    id: "call_b".to_owned(),
                    name: "calculate_cash_on_cash".to_owned(),
                    arguments: Value::Null,
                }),
                ModelResponseEvent::Completed(ModelFinishReason::ToolCalls),
            ]
        );

        assert_eq!(opaque.id(), "chatcmpl-7");
        let Some(Message::Assistant { tool_calls, .. }) = opaque.to_raw::<Message>() else {
            panic!("expected an assistant message");
        };
        assert_eq!(tool_calls.as_ref().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn test_undecodable_arguments_kept_raw() {
        let resp = OpenAIResponse::from_completion(completion(json!({
            "id": "chatcmpl-8",
            "choices": [{
                "message": {
                    "content": null,
                    "tool_calls": [{
                        "id": "call_a",
                        "function": { "name": "calculate_cash_on_cash", "arguments": "{\"rent\":" }
                    }]
                },
                "finish_reason": "tool_calls"
            }]
        })))
        .unwrap();

        let (events, _) = drain(resp).await;
        let ModelResponseEvent::ToolCall(req) = &events[0] else {
            panic!("expected a tool call, got {events:?}");
        };
        assert_eq!(req.arguments, Value::String("{\"rent\":".to_owned()));
    }

    #[tokio::test]
    async fn test_missing_finish_reason_has_no_completion() {
        let resp = OpenAIResponse::from_completion(completion(json!({
            "id": "chatcmpl-9",
            "choices": [{ "message": { "content": "Partial" }, "finish_reason": null }]
        })))
        .unwrap();

        let (events, _) = drain(resp).await;
        assert_eq!(events, [ModelResponseEvent::MessageDelta("Partial".to_owned())]);
    }

    #[test]
    fn test_content_filter_is_moderated() {
        let err = OpenAIResponse::from_completion(completion(json!({
            "id": "chatcmpl-10",
            "choices": [{ "message": { "content": "" }, "finish_reason": "content_filter" }]
        })))
        .err()
        .unwrap();
        assert_eq!(err.kind(), ErrorKind::Moderated);
    }

    #[test]
    fn test_no_choices() {
        let err = OpenAIResponse::from_completion(completion(json!({
            "id": "chatcmpl-11",
            "choices": []
        })))
        .err()
        .unwrap();
        assert_eq!(err.kind(), ErrorKind::Other);
    }
}
