pub mod assumptions;
pub mod roi;

pub use assumptions::{
    EvaluationOptions, ExitLoanBalance, RentalPropertyInput, ResolvedAssumptions, MAX_AMOUNT, MAX_GROWTH_RATE,
};
pub use roi::{evaluate, InvestmentResult};
