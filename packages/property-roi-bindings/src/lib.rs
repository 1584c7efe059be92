use napi::Result as NapiResult;
use napi_derive::napi;

use property_roi_core::amortization::{self, LoanTerms};
use property_roi_core::projection::{self, ProjectionInput};
use property_roi_core::rental::{self, RentalPropertyInput};
use property_roi_core::scoring::{self, ScoreInput};
use property_roi_core::time_value::{self, IrrInput, NpvInput};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Rental property
// ---------------------------------------------------------------------------

#[napi]
pub fn evaluate_rental_property(input_json: String) -> NapiResult<String> {
    let input: RentalPropertyInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = rental::evaluate(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Building blocks
// ---------------------------------------------------------------------------

#[napi]
pub fn periodic_payment(input_json: String) -> NapiResult<String> {
    let terms: LoanTerms = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = amortization::analyze_loan(&terms).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn project_cash_flows(input_json: String) -> NapiResult<String> {
    let input: ProjectionInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = projection::project_cash_flows(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn npv(input_json: String) -> NapiResult<String> {
    let input: NpvInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = time_value::calculate_npv(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn irr(input_json: String) -> NapiResult<String> {
    let input: IrrInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = time_value::calculate_irr(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn score_investment(input_json: String) -> NapiResult<String> {
    let input: ScoreInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = scoring::score_investment(&input);
    serde_json::to_string(&output).map_err(to_napi_error)
}
