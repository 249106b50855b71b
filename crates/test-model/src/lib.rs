//! A scripted fake model and an HTTP stub server for tests.

mod http;
mod preset;

use std::error::Error as StdError;
use std::fmt::{self, Debug, Display, Formatter};
use std::future::ready;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, ready};
use std::time::Duration;

use realzen_agent_model::{
    ErrorKind, ModelFinishReason, ModelProvider, ModelProviderError,
    ModelRequest, ModelResponse, ModelResponseEvent, OpaqueMessage,
};
use tokio::time::{Sleep, sleep};

pub use http::StubServer;
pub use preset::*;

const EVENT_DELAY: Duration = Duration::from_millis(1);

#[derive(Debug)]
pub struct Error {
    message: &'static str,
    kind: ErrorKind,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.kind)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

pub struct TestModelResponse {
    turn: usize,
    preset: PresetResponse,
    event_idx: usize,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl ModelResponse for TestModelResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        let this = self.get_mut();

        // Every event is delivered after a short delay, like a real stream.
        let Some(pending) = &mut this.sleep else {
            this.sleep = Some(Box::pin(sleep(EVENT_DELAY)));
            return Pin::new(this).poll_next_event(cx);
        };
        ready!(pending.as_mut().poll(cx));
        this.sleep = None;

        let events = &this.preset.events;
        let event = if this.event_idx < events.len() {
            match &events[this.event_idx] {
                PresetEvent::MessageDelta(msg) => {
                    ModelResponseEvent::MessageDelta(msg.clone())
                }
                PresetEvent::ToolCall(req) => {
                    ModelResponseEvent::ToolCall(req.clone())
                }
            }
        } else if this.event_idx == events.len() && !this.preset.truncated {
            let has_tool_call = events
                .iter()
                .any(|event| matches!(event, PresetEvent::ToolCall(_)));
            ModelResponseEvent::Completed(if has_tool_call {
                ModelFinishReason::ToolCalls
            } else {
                ModelFinishReason::Stop
            })
        } else {
            return Poll::Ready(Ok(None));
        };
        this.event_idx += 1;
        Poll::Ready(Ok(Some(event)))
    }

    fn make_opaque_message(&self) -> Option<OpaqueMessage> {
        Some(OpaqueMessage::new(
            format!("msg:{}", self.turn),
            self.preset.clone(),
        ))
    }
}

/// A scripted fake model.
///
/// Each request is answered with the preset response of the current
/// assistant turn, which is the number of assistant messages already in
/// the request. If the script has no response for that turn, the request
/// fails with [`ErrorKind::Other`].
///
/// Every request is recorded and can be inspected with
/// [`TestModelProvider::requests`]. Clones share the same record.
#[derive(Clone, Default)]
pub struct TestModelProvider {
    script: Vec<PresetResponse>,
    requests: Arc<Mutex<Vec<ModelRequest>>>,
}

impl TestModelProvider {
    /// Creates a provider that answers with `responses`, one per turn.
    #[inline]
    pub fn with_script(responses: impl Into<Vec<PresetResponse>>) -> Self {
        Self {
            script: responses.into(),
            ..Default::default()
        }
    }

    /// Returns the requests received so far.
    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

impl ModelProvider for TestModelProvider {
    type Error = crate::Error;
    type Response = TestModelResponse;

    #[inline]
    fn model_name(&self) -> &str {
        "test-model"
    }

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(req.clone());
        }

        let turn = req.assistant_turns();
        let result = match self.script.get(turn) {
            None => Err(Error {
                message: "script has no response for this turn",
                kind: ErrorKind::Other,
            }),
            Some(PresetResponse {
                failure: Some(kind),
                ..
            }) => Err(Error {
                message: "preset failure",
                kind: *kind,
            }),
            Some(preset) => Ok(TestModelResponse {
                turn,
                preset: preset.clone(),
                                event_idx: 0,
                sleep: None,
            }),
        };
        ready(result)
    }
}
