use std::collections::HashSet;
use std::future::poll_fn;
use std::pin::{Pin, pin};
use std::sync::Arc;

use realzen_agent_model::{
    ModelFinishReason, ModelProvider, ModelProviderError, ModelRequest,
    ModelResponse, ModelResponseEvent, OpaqueMessage, ToolCallRequest,
};
use serde_json::{Map, Value};
use tracing::Instrument;

type SendRequestResult =
    Result<ModelClientResponse, Box<dyn ModelProviderError>>;
type BoxedSendRequestFuture =
    Pin<Box<dyn Future<Output = SendRequestResult> + Send>>;
type HandlerFn = Arc<dyn Fn(ModelRequest) -> BoxedSendRequestFuture + Send + Sync>;

/// A type-erased wrapper around a model provider.
#[derive(Clone)]
pub struct ModelClient {
    handler_fn: HandlerFn,
}

impl ModelClient {
    #[inline]
    pub fn new<P: ModelProvider + 'static>(provider: P) -> Self {
        // Erase `P` so the agent does not need a generic parameter.
        let handler_fn: HandlerFn = Arc::new(move |req: ModelRequest| {
            let fut = provider.send_request(&req);
            let span = debug_span!("model request", model = provider.model_name());
            Box::pin(
                async move {
                    trace!("sending {} messages", req.messages.len());
                    let resp_or_err = fut.await;
                    handle_response::<P>(resp_or_err).await
                }
                .instrument(span),
            )
        });
        Self { handler_fn }
    }

    /// Sends a request and collects the whole response.
    #[inline]
    pub async fn send_request(&self, req: ModelRequest) -> SendRequestResult {
        (self.handler_fn)(req).await
    }
}

/// A completely received response from the model client.
#[derive(Clone, Debug)]
pub struct ModelClientResponse {
    pub transcript: String,
    pub opaque_msg: Option<OpaqueMessage>,
    /// Tool calls requested by the model.
    pub tool_calls: Vec<ToolCallRequest>,
    /// The reason the model finished generating.
    pub finish_reason: Option<ModelFinishReason>,
}

impl ModelClientResponse {
    /// Checks that the response is a well-formed assistant message.
    ///
    /// Tool call arguments of `null` are normalized to an empty object.
    pub fn validate(mut self) -> Result<Self, String> {
        let Some(finish_reason) = self.finish_reason else {
            return Err("response ended without a finish reason".to_owned());
        };
        if finish_reason == ModelFinishReason::ToolCalls
            && self.tool_calls.is_empty()
        {
            return Err("finished for tool calls but requested none".to_owned());
        }

        let mut seen_ids = HashSet::with_capacity(self.tool_calls.len());
        for call in &mut self.tool_calls {
            if call.id.is_empty() {
                return Err(format!("tool call `{}` has no id", call.name));
            }
            if call.name.is_empty() {
                return Err(format!("tool call `{}` has no name", call.id));
            }
            if !seen_ids.insert(call.id.clone()) {
                return Err(format!("duplicated tool call id `{}`", call.id));
            }
            match &call.arguments {
                Value::Object(_) => {}
                Value::Null => call.arguments = Value::Object(Map::new()),
                other => {
                    return Err(format!(
                        "arguments of tool call `{}` are not an object: {other}",
                        call.id
                    ));
                }
            }
        }
        Ok(self)
    }
}

async fn handle_response<P: ModelProvider + 'static>(
    resp_or_err: Result<P::Response, P::Error>,
) -> SendRequestResult {
    let resp = match resp_or_err {
        Ok(resp) => resp,
        Err(err) => {
            error!("got an error: {err:?}");
            return Err(Box::new(err));
        }
    };

    let mut transcript = String::new();
    let opaque_msg;
    let mut tool_calls = Vec::new();
    let mut finish_reason = None;

    let mut pinned_resp = pin!(resp);
    loop {
        let event_or_err =
            poll_fn(|cx| pinned_resp.as_mut().poll_next_event(cx)).await;
        let event = match event_or_err {
            Ok(event) => event,
            Err(err) => {
                error!("got an error: {err:?}");
                return Err(Box::new(err));
            }
        };

        let Some(event) = event else {
            opaque_msg = pinned_resp.make_opaque_message();
            break;
        };
        trace!("got an event: {event:?}");

        match event {
            ModelResponseEvent::MessageDelta(msg) => {
                transcript.push_str(&msg);
            }
            ModelResponseEvent::ToolCall(req) => {
                tool_calls.push(req);
            }
            ModelResponseEvent::Completed(reason) => {
                finish_reason = Some(reason);
            }
        }
    }

    debug!(
        "received {} chars and {} tool calls",
        transcript.len(),
        tool_calls.len()
    );

    Ok(ModelClientResponse {
        transcript,
        opaque_msg,
        tool_calls,
        finish_reason,
    })
}
