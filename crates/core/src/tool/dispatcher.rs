use std::future::ready;
use std::pin::Pin;
use std::sync::Arc;

use realzen_agent_model::{ModelTool, ToolCallRequest};
use tracing::Instrument;

use crate::tool::{ToolResult, Toolset};

type BoxedToolFuture = Pin<Box<dyn Future<Output = ToolResult> + Send>>;
type DispatchFn = Arc<dyn Fn(&ToolCallRequest) -> BoxedToolFuture + Send + Sync>;

/// A type-erased [`Toolset`].
#[derive(Clone)]
pub struct Dispatcher {
    definitions: Vec<ModelTool>,
    dispatch_fn: DispatchFn,
}

impl Dispatcher {
    pub fn new<T: Toolset>(toolset: T) -> Self {
        let definitions = toolset.definitions();
        let dispatch_fn: DispatchFn = Arc::new(move |req: &ToolCallRequest| {
            let span = debug_span!("tool", id = %req.id, name = %req.name);
            let call = match span.in_scope(|| toolset.resolve(req)) {
                Ok(call) => call,
                Err(err) => {
                    warn!(parent: &span, "cannot resolve tool call: {err}");
                    return Box::pin(ready(Err(err)));
                }
            };
            trace!(parent: &span, "executing with args: {}", req.arguments);
            Box::pin(toolset.execute(call).instrument(span))
        });
        Self {
            definitions,
            dispatch_fn,
        }
    }

    /// A dispatcher that offers no tools.
    pub fn empty() -> Self {
        Self::new(NoTools)
    }

    #[inline]
    pub fn definitions(&self) -> &[ModelTool] {
        &self.definitions
    }

    #[inline]
    pub fn dispatch(&self, req: &ToolCallRequest) -> BoxedToolFuture {
        (self.dispatch_fn)(req)
    }
}

struct NoTools;

impl Toolset for NoTools {
    type Call = ();

    fn definitions(&self) -> Vec<ModelTool> {
        vec![]
    }

    fn resolve(&self, request: &ToolCallRequest) -> Result<(), super::Error> {
        Err(super::Error::unknown_tool().with_reason(format!(
            "no tool named `{}` is available",
            request.name
        )))
    }

    fn execute(
        &self,
        _call: (),
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        ready(Ok(String::new()))
    }
}
