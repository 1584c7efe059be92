use clap::Args;
use serde_json::Value;

use property_roi_core::scoring::{self, ScoreInput};

use crate::input;

/// Arguments for composite scoring
#[derive(Args)]
pub struct ScoreArgs {
    /// Path to JSON or YAML file with score factors
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_score(args: ScoreArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let score_input: ScoreInput = input::load(args.input.as_deref())?
        .ok_or("--input <factors.json> or stdin required for scoring")?;
    let result = scoring::score_investment(&score_input);
    Ok(serde_json::to_value(result)?)
}
