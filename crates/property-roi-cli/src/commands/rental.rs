use chrono::{Datelike, Local};
use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::Value;

use property_roi_core::rental::{self, ExitLoanBalance, RentalPropertyInput};
use property_roi_core::MarketCondition;

use crate::input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ExitBalanceArg {
    /// Repay the original loan amount at sale
    Original,
    /// Repay the balance still owed after the holding period
    Amortized,
}

impl From<ExitBalanceArg> for ExitLoanBalance {
    fn from(arg: ExitBalanceArg) -> Self {
        match arg {
            ExitBalanceArg::Original => ExitLoanBalance::OriginalPrincipal,
            ExitBalanceArg::Amortized => ExitLoanBalance::Amortized,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum MarketArg {
    Declining,
    Cooling,
    Stable,
    Growing,
    Hot,
}

impl From<MarketArg> for MarketCondition {
    fn from(arg: MarketArg) -> Self {
        match arg {
            MarketArg::Declining => MarketCondition::Declining,
            MarketArg::Cooling => MarketCondition::Cooling,
            MarketArg::Stable => MarketCondition::Stable,
            MarketArg::Growing => MarketCondition::Growing,
            MarketArg::Hot => MarketCondition::Hot,
        }
    }
}

/// Arguments for a full rental property evaluation
#[derive(Args)]
pub struct EvaluateArgs {
    /// Path to JSON or YAML input file (flags below override its values)
    #[arg(long)]
    pub input: Option<String>,

    /// Purchase price of the property
    #[arg(long)]
    pub purchase_price: Option<Decimal>,

    /// Cash down payment
    #[arg(long)]
    pub down_payment: Option<Decimal>,

    /// Closing costs paid in cash
    #[arg(long)]
    pub closing_costs: Option<Decimal>,

    /// Mortgage principal
    #[arg(long)]
    pub loan_amount: Option<Decimal>,

    /// Annual mortgage rate as a decimal (e.g. 0.065)
    #[arg(long)]
    pub interest_rate: Option<Decimal>,

    /// Loan term in years
    #[arg(long)]
    pub loan_term: Option<u32>,

    /// Expected monthly rent
    #[arg(long)]
    pub monthly_rent: Option<Decimal>,

    /// Holding period in years
    #[arg(long)]
    pub holding_years: Option<u32>,

    /// Local market condition
    #[arg(long)]
    pub market: Option<MarketArg>,

    /// Reject missing or invalid inputs instead of substituting defaults
    #[arg(long)]
    pub strict: bool,

    /// Loan balance repaid from the sale proceeds
    #[arg(long)]
    pub exit_balance: Option<ExitBalanceArg>,

    /// Year the analysis is made in (defaults to the current year)
    #[arg(long)]
    pub analysis_year: Option<i32>,
}

pub fn run_evaluate(args: EvaluateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut rental_input: RentalPropertyInput =
        input::load(args.input.as_deref())?.unwrap_or_default();

    apply_overrides(&mut rental_input, &args);

    require_any_figure(&rental_input)?;

    let result = rental::evaluate(&rental_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Only an empty request is rejected here. A single missing figure is left
/// to the engine, which zeroes it with a warning or fails in strict mode.
fn require_any_figure(input: &RentalPropertyInput) -> Result<(), String> {
    if input.purchase_price.is_none() && input.monthly_rent.is_none() {
        return Err(
            "nothing to evaluate: pass --purchase-price and/or --monthly-rent (or provide --input or stdin)"
                .into(),
        );
    }
    Ok(())
}

fn apply_overrides(target: &mut RentalPropertyInput, args: &EvaluateArgs) {
    macro_rules! set_if_some {
        ($($field:ident => $arg:expr),* $(,)?) => {
            $(if let Some(v) = $arg {
                target.$field = Some(v);
            })*
        };
    }

    set_if_some!(
        purchase_price => args.purchase_price,
        down_payment => args.down_payment,
        closing_costs => args.closing_costs,
        loan_amount => args.loan_amount,
        interest_rate => args.interest_rate,
        loan_term_years => args.loan_term,
        monthly_rent => args.monthly_rent,
        holding_period_years => args.holding_years,
        market_condition => args.market.map(MarketCondition::from),
        analysis_year => args.analysis_year,
    );

    if args.strict {
        target.options.strict = true;
    }
    if let Some(balance) = args.exit_balance {
        target.options.exit_loan_balance = balance.into();
    }
    if target.analysis_year.is_none() {
        target.analysis_year = Some(Local::now().year());
    }
}
