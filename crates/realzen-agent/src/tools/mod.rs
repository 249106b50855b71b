//! The tools offered to the model.

mod cash_on_cash;
mod property_search;

use futures_util::future::Either;
use realzen_agent_core::tool::{Error as ToolError, Tool, ToolResult, Toolset};
use realzen_agent_model::{ModelTool, ToolCallRequest};

pub use cash_on_cash::{CashOnCashParameters, CashOnCashTool, cash_on_cash};
pub use property_search::{
    PropertySearchTool, PropertyType, SearchParameters, build_query,
    effective_limit, extract_results,
};

use crate::config::{ConfigError, Configuration};

/// A decoded call to one of the tools in [`RealzenToolset`].
#[derive(Clone, Debug, PartialEq)]
pub enum RealzenToolCall {
    /// A property search.
    SearchProperties(SearchParameters),
    /// A cash-on-cash calculation.
    CalculateCashOnCash(CashOnCashParameters),
}

/// The property search and cash-on-cash tools.
pub struct RealzenToolset {
    search: PropertySearchTool,
    cash_on_cash: CashOnCashTool,
}

impl RealzenToolset {
    /// Creates the toolset from the configuration.
    pub fn new(config: &Configuration) -> Result<Self, ConfigError> {
        Ok(Self::with_search_tool(PropertySearchTool::new(config)?))
    }

    /// Creates the toolset around a prepared search tool.
    #[inline]
    pub fn with_search_tool(search: PropertySearchTool) -> Self {
        Self {
            search,
            cash_on_cash: CashOnCashTool::new(),
        }
    }
}

impl Toolset for RealzenToolset {
    type Call = RealzenToolCall;

    fn definitions(&self) -> Vec<ModelTool> {
        vec![self.search.definition(), self.cash_on_cash.definition()]
    }

    fn resolve(&self, request: &ToolCallRequest) -> Result<Self::Call, ToolError> {
        let arguments = request.arguments.clone();
        match request.name.as_str() {
            PropertySearchTool::NAME => self
                .search
                .parse_input(arguments)
                .map(RealzenToolCall::SearchProperties),
            CashOnCashTool::NAME => self
                .cash_on_cash
                .parse_input(arguments)
                .map(RealzenToolCall::CalculateCashOnCash),
            name => Err(ToolError::unknown_tool().with_reason(format!(
                "`{name}` is not one of `{}`, `{}`",
                PropertySearchTool::NAME,
                CashOnCashTool::NAME
            ))),
        }
    }

    fn execute(
        &self,
        call: Self::Call,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        match call {
            RealzenToolCall::SearchProperties(input) => {
                Either::Left(self.search.execute(input))
            }
            RealzenToolCall::CalculateCashOnCash(input) => {
                Either::Right(self.cash_on_cash.execute(input))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use realzen_agent_core::tool::ErrorKind;
    use serde_json::json;

    use super::*;

    fn toolset() -> RealzenToolset {
        RealzenToolset::new(&Configuration::default()).unwrap()
    }

    fn request(name: &str, arguments: serde_json::Value) -> ToolCallRequest {
        ToolCallRequest {
            id: "call_1".to_owned(),
            name: name.to_owned(),
            arguments,
        }
    }

    #[test]
    fn test_definitions() {
        let definitions = toolset().definitions();
        let names: Vec<_> = definitions.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(
            names,
            ["search_for_properties_by_location", "calculate_cash_on_cash"]
        );
        for definition in &definitions {
            assert_eq!(definition.parameters["type"], "object");
            assert!(!definition.description.starts_with('\n'));
        }
        assert!(
            definitions[0].parameters["properties"]
                .get("location")
                .is_some()
        );
    }

    #[test]
    fn test_resolve() {
        let toolset = toolset();
        let call = toolset
            .resolve(&request(
                "calculate_cash_on_cash",
                json!({ "home_price": 500000, "rent": 3000, "tax_assessed_value": 400000 }),
            ))
            .unwrap();
        let RealzenToolCall::CalculateCashOnCash(params) = call else {
            panic!("expected a calculation, got {call:?}");
        };
        assert_eq!(params.down_payment, 0.2);

        let call = toolset
            .resolve(&request(
                "search_for_properties_by_location",
                json!({ "location": "Austin, TX" }),
            ))
            .unwrap();
        assert_eq!(
            call,
            RealzenToolCall::SearchProperties(SearchParameters::new("Austin, TX"))
        );
    }

    #[test]
    fn test_resolve_errors() {
        let toolset = toolset();
        let err = toolset
            .resolve(&request("get_weather", json!({})))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownTool);
        assert!(!err.is_fatal());

        let err = toolset
            .resolve(&request("calculate_cash_on_cash", json!({ "rent": "lots" })))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_execute_calculation() {
        let toolset = toolset();
        let call = RealzenToolCall::CalculateCashOnCash(CashOnCashParameters {
            home_price: 500_000.0,
            rent: 3_000.0,
            tax_assessed_value: 400_000.0,
            down_payment: 0.0,
        });
        let err = toolset.execute(call).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DivisionByZero);
        assert!(err.is_fatal());
    }
}
