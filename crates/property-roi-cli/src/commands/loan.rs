use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use property_roi_core::amortization::{self, LoanTerms};

use crate::input;

/// Arguments for mortgage payment calculation
#[derive(Args)]
pub struct PaymentArgs {
    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Loan principal
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual interest rate as a decimal (e.g. 0.065)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Loan term in years
    #[arg(long, default_value_t = 30)]
    pub term_years: u32,

    /// Omit the yearly amortization schedule
    #[arg(long)]
    pub no_schedule: bool,
}

pub fn run_payment(args: PaymentArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let terms: LoanTerms = match input::load(args.input.as_deref())? {
        Some(terms) => terms,
        None => {
            let principal = args
                .principal
                .ok_or("--principal is required (or provide --input)")?;
            let rate = args.rate.ok_or("--rate is required (or provide --input)")?;
            LoanTerms::new(principal, rate, args.term_years)?
        }
    };

    let mut output = amortization::analyze_loan(&terms)?;
    if args.no_schedule {
        output.result.schedule.clear();
    }
    Ok(serde_json::to_value(output)?)
}
