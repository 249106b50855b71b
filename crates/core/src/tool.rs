//! Tool call supports.

mod dispatcher;
mod error;

use realzen_agent_model::{ModelTool, ToolCallRequest};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

pub(crate) use dispatcher::Dispatcher;
pub use error::{Error, ErrorKind};

/// The result of a tool call.
pub type ToolResult = Result<String, Error>;

/// A tool that can be called by the model.
///
/// Implementations should not keep mutable state. Anything the tool needs
/// at execution time, such as credentials or limits, is set when the tool
/// is created and copied into the returned future.
pub trait Tool: Send + Sync + 'static {
    /// The type of input that the tool accepts.
    type Input: DeserializeOwned;

    /// Returns the name of the tool.
    fn name(&self) -> &str;

    /// Returns the description of the tool.
    fn description(&self) -> &str;

    /// Returns the parameter schema of the tool.
    fn parameter_schema(&self) -> &Value;

    /// Returns the definition sent to the model.
    fn definition(&self) -> ModelTool {
        ModelTool {
            name: self.name().to_owned(),
            description: self.description().trim().to_owned(),
            parameters: self.parameter_schema().clone(),
        }
    }

    /// Decodes the arguments of a tool call request.
    ///
    /// `null` arguments are treated as an empty object.
    fn parse_input(&self, arguments: Value) -> Result<Self::Input, Error> {
        let arguments = match arguments {
            Value::Null => Value::Object(Map::new()),
            arguments => arguments,
        };
        serde_json::from_value(arguments)
            .map_err(|err| Error::invalid_input().with_reason(err.to_string()))
    }

    /// Executes the tool with the given input.
    ///
    /// This method must return a future that is fully independent of `self`.
    fn execute(
        &self,
        input: Self::Input,
    ) -> impl Future<Output = ToolResult> + Send + 'static;
}

/// A closed set of tools offered to the model.
///
/// A toolset turns a raw [`ToolCallRequest`] into its own typed call, so
/// the dispatch over the known tools is an exhaustive `match` rather than
/// a lookup in an open registry.
pub trait Toolset: Send + Sync + 'static {
    /// A decoded tool call, typically an enum with one variant per tool.
    type Call: Send + 'static;

    /// Returns the definitions of all tools in this set.
    fn definitions(&self) -> Vec<ModelTool>;

    /// Decodes a tool call request.
    ///
    /// Returns an [`ErrorKind::UnknownTool`] error for names outside of
    /// this set and an [`ErrorKind::InvalidInput`] error for arguments
    /// that don't match the tool's input.
    fn resolve(&self, request: &ToolCallRequest) -> Result<Self::Call, Error>;

    /// Executes a decoded call.
    fn execute(
        &self,
        call: Self::Call,
    ) -> impl Future<Output = ToolResult> + Send + 'static;
}
