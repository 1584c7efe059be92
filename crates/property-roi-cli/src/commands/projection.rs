use clap::Args;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;

use property_roi_core::projection::{self, ExitAssumptions, ProjectionInput};

use crate::input;

/// Arguments for a holding-period cash flow projection
#[derive(Args)]
pub struct ProjectArgs {
    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Year-1 net cash flow (may be negative)
    #[arg(long, allow_hyphen_values = true)]
    pub base_cash_flow: Option<Decimal>,

    /// Annual growth of the cash flow as a decimal
    #[arg(long, default_value_t = dec!(0.03), allow_hyphen_values = true)]
    pub growth_rate: Decimal,

    /// Holding period in years
    #[arg(long, default_value_t = 10)]
    pub holding_years: u32,

    /// Purchase price the sale value compounds from
    #[arg(long)]
    pub purchase_price: Option<Decimal>,

    /// Annual appreciation as a decimal
    #[arg(long, default_value_t = dec!(0.03), allow_hyphen_values = true)]
    pub appreciation_rate: Decimal,

    /// Selling costs as a fraction of the sale price
    #[arg(long, default_value_t = dec!(0.06))]
    pub selling_cost_rate: Decimal,

    /// Loan balance repaid from the sale
    #[arg(long, default_value_t = Decimal::ZERO)]
    pub loan_balance: Decimal,
}

pub fn run_project(args: ProjectArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let projection_input: ProjectionInput = match input::load(args.input.as_deref())? {
        Some(data) => data,
        None => ProjectionInput {
            base_annual_cash_flow: args
                .base_cash_flow
                .ok_or("--base-cash-flow is required (or provide --input)")?,
            growth_rate: args.growth_rate,
            holding_years: args.holding_years,
            exit: ExitAssumptions {
                purchase_price: args
                    .purchase_price
                    .ok_or("--purchase-price is required (or provide --input)")?,
                appreciation_rate: args.appreciation_rate,
                selling_cost_rate: args.selling_cost_rate,
                outstanding_loan_balance: args.loan_balance,
            },
        },
    };

    let result = projection::project_cash_flows(&projection_input)?;
    Ok(serde_json::to_value(result)?)
}
