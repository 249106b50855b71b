use realzen_agent_core::tool::{Error as ToolError, Tool, ToolResult};
use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde_json::Value;

/// Annual mortgage interest rate.
const INTEREST_RATE: f64 = 0.065;
/// Mortgage term in months.
const LOAN_TERM_MONTHS: f64 = 360.0;
/// Annual property tax rate on the tax-assessed value.
const PROPERTY_TAX_RATE: f64 = 0.009;
/// Management fee as a share of the rent.
const MANAGEMENT_FEE_RATE: f64 = 0.1;

const fn default_down_payment() -> f64 {
    0.2
}

/// Input of [`CashOnCashTool`].
#[derive(Clone, Debug, PartialEq, Deserialize, JsonSchema)]
pub struct CashOnCashParameters {
    /// The price of the home.
    pub home_price: f64,
    /// The monthly rent.
    pub rent: f64,
    /// The tax-assessed value of the home.
    pub tax_assessed_value: f64,
    /// The down payment as a fraction of the home price, 0.2 by default.
    #[serde(default = "default_down_payment")]
    pub down_payment: f64,
}

/// Computes the cash-on-cash return of a rental financed with a 30-year
/// fixed-rate mortgage.
///
/// Inputs must be finite and non-negative, and `down_payment` must lie
/// within `[0, 1]`. A zero down payment amount is reported as
/// [`ErrorKind::DivisionByZero`](realzen_agent_core::tool::ErrorKind::DivisionByZero).
pub fn cash_on_cash(params: &CashOnCashParameters) -> Result<f64, ToolError> {
    let CashOnCashParameters {
        home_price,
        rent,
        tax_assessed_value,
        down_payment,
    } = *params;

    for (name, value) in [
        ("home_price", home_price),
        ("rent", rent),
        ("tax_assessed_value", tax_assessed_value),
        ("down_payment", down_payment),
    ] {
        if !value.is_finite() {
            return Err(ToolError::invalid_input()
                .with_reason(format!("`{name}` must be a finite number")));
        }
    }
    for (name, value) in [
        ("home_price", home_price),
        ("rent", rent),
        ("tax_assessed_value", tax_assessed_value),
    ] {
        if value < 0.0 {
            return Err(ToolError::invalid_input()
                .with_reason(format!("`{name}` must not be negative")));
        }
    }
    if !(0.0..=1.0).contains(&down_payment) {
        return Err(ToolError::invalid_input()
            .with_reason("`down_payment` must be a fraction between 0 and 1"));
    }

    let down_payment_amount = home_price * down_payment;
    if down_payment_amount == 0.0 {
        return Err(ToolError::division_by_zero()
            .with_reason("the down payment amount is zero"));
    }
    let loan_amount = home_price - down_payment_amount;

    let monthly_rate = INTEREST_RATE / 12.0;
    let growth = (1.0 + monthly_rate).powf(LOAN_TERM_MONTHS);
    let annual_mortgage_payment =
        loan_amount * (monthly_rate * growth) / (growth - 1.0) * 12.0;
    let annual_property_tax = tax_assessed_value * PROPERTY_TAX_RATE;
    let annual_management_fee = rent * MANAGEMENT_FEE_RATE * 12.0;
    let annual_rent = rent * 12.0;

    Ok((annual_rent
        - annual_property_tax
        - annual_mortgage_payment
        - annual_management_fee)
        / down_payment_amount)
}

/// A tool computing the cash-on-cash return of a rental property.
pub struct CashOnCashTool {
    parameter_schema: Value,
}

impl CashOnCashTool {
    /// The name the model calls this tool by.
    pub const NAME: &'static str = "calculate_cash_on_cash";

    /// Creates a new calculator tool.
    #[inline]
    pub fn new() -> Self {
        Self {
            parameter_schema: schema_for!(CashOnCashParameters).to_value(),
        }
    }
}

impl Default for CashOnCashTool {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for CashOnCashTool {
    type Input = CashOnCashParameters;

    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        r#"
Calculate the cash-on-cash return on investment for a rental property.
Assumes a 30-year fixed-rate mortgage at 6.5%, a 0.9% annual property tax on the
tax-assessed value and a management fee of 10% of the rent.
Returns the annual cash flow divided by the down payment, e.g. 0.05 for 5%."#
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    #[allow(clippy::manual_async_fn)]
    fn execute(
        &self,
        input: CashOnCashParameters,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        async move {
            let ratio = cash_on_cash(&input)?;
            debug!(ratio, "computed cash-on-cash return");
            Ok(ratio.to_string())
        }
    }
}
