use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use property_roi_core::time_value::{self, IrrConfig, IrrInput, NpvInput};

use crate::input;

/// Arguments for NPV calculation
#[derive(Args)]
pub struct NpvArgs {
    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Cash invested up front
    #[arg(long)]
    pub outlay: Option<Decimal>,

    /// Year-end cash flows (comma-separated, e.g. "300,400,500")
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub cash_flows: Option<Vec<Decimal>>,

    /// Discount rate as a decimal (e.g. 0.025)
    #[arg(long, allow_hyphen_values = true)]
    pub rate: Option<Decimal>,
}

pub fn run_npv(args: NpvArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let npv_input: NpvInput = match input::load(args.input.as_deref())? {
        Some(data) => data,
        None => NpvInput {
            initial_outlay: args.outlay.ok_or("--outlay is required (or provide --input)")?,
            cash_flows: args
                .cash_flows
                .ok_or("--cash-flows is required (or provide --input)")?,
            discount_rate: args.rate.ok_or("--rate is required (or provide --input)")?,
        },
    };

    let result = time_value::calculate_npv(&npv_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for IRR calculation
#[derive(Args)]
pub struct IrrArgs {
    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Cash invested up front
    #[arg(long)]
    pub outlay: Option<Decimal>,

    /// Year-end cash flows (comma-separated, e.g. "400,400,400")
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub cash_flows: Option<Vec<Decimal>>,

    /// Lower bound of the search window
    #[arg(long, allow_hyphen_values = true)]
    pub lower_bound: Option<Decimal>,

    /// Upper bound of the search window
    #[arg(long)]
    pub upper_bound: Option<Decimal>,

    /// Maximum bisection iterations
    #[arg(long)]
    pub max_iterations: Option<u32>,
}

pub fn run_irr(args: IrrArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let irr_input: IrrInput = match input::load(args.input.as_deref())? {
        Some(data) => data,
        None => {
            let defaults = IrrConfig::default();
            IrrInput {
                initial_outlay: args.outlay.ok_or("--outlay is required (or provide --input)")?,
                cash_flows: args
                    .cash_flows
                    .ok_or("--cash-flows is required (or provide --input)")?,
                config: IrrConfig {
                    lower_bound: args.lower_bound.unwrap_or(defaults.lower_bound),
                    upper_bound: args.upper_bound.unwrap_or(defaults.upper_bound),
                    max_iterations: args.max_iterations.unwrap_or(defaults.max_iterations),
                    ..defaults
                },
            }
        }
    };

    let result = time_value::calculate_irr(&irr_input)?;
    Ok(serde_json::to_value(result)?)
}
