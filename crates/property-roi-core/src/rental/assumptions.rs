//! Rental property inputs and their resolution to concrete assumptions.
//!
//! Every field of [`RentalPropertyInput`] is optional. Resolution fills
//! market defaults, substitutes zero for missing or non-positive required
//! figures (or rejects them in strict mode), and collects the sanity
//! warnings reported alongside the result.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::PropertyRoiError;
use crate::scoring::TierThresholds;
use crate::time_value::IrrConfig;
use crate::types::{Location, MarketCondition, Money, PropertyType, Rate, Years};
use crate::PropertyRoiResult;

pub const DEFAULT_LOAN_TERM_YEARS: u32 = 30;
pub const DEFAULT_HOLDING_PERIOD_YEARS: u32 = 10;
pub const MAX_TERM_YEARS: u32 = 50;
/// Largest accepted currency figure
pub const MAX_AMOUNT: Money = dec!(1000000000000000);
/// Largest accepted growth, appreciation or discount rate (1000%)
pub const MAX_GROWTH_RATE: Rate = dec!(10);

const DEFAULT_VACANCY_RATE: Rate = dec!(0.05);
const DEFAULT_RENT_GROWTH: Rate = dec!(0.03);
const DEFAULT_MANAGEMENT_RATE: Rate = dec!(0.08);
const DEFAULT_APPRECIATION: Rate = dec!(0.03);
const DEFAULT_DISCOUNT_RATE: Rate = dec!(0.025);
const DEFAULT_TAX_RATE: Rate = dec!(0.22);
const DEFAULT_DEPRECIATION_YEARS: Years = dec!(27.5);
const DEFAULT_SELLING_COSTS: Rate = dec!(0.06);

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// How much debt is repaid from the sale proceeds at exit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitLoanBalance {
    /// Repay the full original loan amount regardless of amortization.
    #[default]
    OriginalPrincipal,
    /// Repay the scheduled balance outstanding at the exit year.
    Amortized,
}

/// Evaluation policy carried alongside the property inputs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationOptions {
    /// Reject missing or non-positive required figures instead of zeroing them
    pub strict: bool,
    pub exit_loan_balance: ExitLoanBalance,
    pub irr: IrrConfig,
    pub tiers: TierThresholds,
}

/// Input parameters for a rental property evaluation.
///
/// Rates are fractions (0.05 = 5%). Monthly and annual figures are marked
/// in the field name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RentalPropertyInput {
    // --- Acquisition ---
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase_price: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub down_payment: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closing_costs: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub renovation_costs: Option<Money>,

    // --- Financing ---
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loan_amount: Option<Money>,
    /// Nominal annual mortgage rate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interest_rate: Option<Rate>,
    /// Defaults to 30 years
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loan_term_years: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pmi_monthly: Option<Money>,

    // --- Income ---
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_rent: Option<Money>,
    /// Defaults to 5%
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vacancy_rate: Option<Rate>,
    /// Annual growth applied to projected cash flow. Defaults to 3%
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rent_growth_rate: Option<Rate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub other_income_monthly: Option<Money>,

    // --- Operating expenses ---
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_taxes_annual: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insurance_annual: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hoa_fees_monthly: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utilities_monthly: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maintenance_monthly: Option<Money>,
    /// Fraction of gross monthly income. Defaults to 8%
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_management_rate: Option<Rate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repairs_monthly: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub landscaping_monthly: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pest_control_monthly: Option<Money>,

    // --- Property and market ---
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_type: Option<PropertyType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_condition: Option<MarketCondition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year_built: Option<i32>,
    /// Year the analysis is made in; property age needs it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis_year: Option<i32>,
    /// Defaults to 3%
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appreciation_rate: Option<Rate>,
    /// NPV discount rate (inflation). Defaults to 2.5%
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_rate: Option<Rate>,
    /// Defaults to 10 years
    #[serde(skip_serializing_if = "Option::is_none")]
    pub holding_period_years: Option<u32>,

    // --- Tax and exit ---
    /// Marginal income tax rate. Defaults to 22%
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_rate: Option<Rate>,
    /// Straight-line depreciation life. Defaults to 27.5 years
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depreciation_years: Option<Years>,
    /// Fraction of sale price. Defaults to 6%
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selling_cost_rate: Option<Rate>,

    pub options: EvaluationOptions,
}

// ---------------------------------------------------------------------------
// Resolved assumptions
// ---------------------------------------------------------------------------

/// Every input with defaults applied. Echoed back in the output envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedAssumptions {
    pub purchase_price: Money,
    pub down_payment: Money,
    pub closing_costs: Money,
    pub renovation_costs: Money,
    pub loan_amount: Money,
    pub interest_rate: Rate,
    pub loan_term_years: u32,
    pub pmi_monthly: Money,
    pub monthly_rent: Money,
    pub vacancy_rate: Rate,
    pub rent_growth_rate: Rate,
    pub other_income_monthly: Money,
    pub property_taxes_annual: Money,
    pub insurance_annual: Money,
    pub hoa_fees_monthly: Money,
    pub utilities_monthly: Money,
    pub maintenance_monthly: Money,
    pub property_management_rate: Rate,
    pub repairs_monthly: Money,
    pub landscaping_monthly: Money,
    pub pest_control_monthly: Money,
    pub property_type: PropertyType,
    pub location: Location,
    pub market_condition: MarketCondition,
    pub property_age_years: Option<u32>,
    pub appreciation_rate: Rate,
    pub discount_rate: Rate,
    pub holding_period_years: u32,
    pub tax_rate: Rate,
    pub depreciation_years: Years,
    pub selling_cost_rate: Rate,
    pub options: EvaluationOptions,
}

impl ResolvedAssumptions {
    /// Cash the investor puts in: down payment, closing and renovation.
    pub fn total_investment(&self) -> Money {
        self.down_payment + self.closing_costs + self.renovation_costs
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Apply defaults and validation, pushing non-fatal findings to `warnings`.
pub fn resolve(
    input: &RentalPropertyInput,
    warnings: &mut Vec<String>,
) -> PropertyRoiResult<ResolvedAssumptions> {
    let strict = input.options.strict;

    let purchase_price = required_positive("purchase_price", input.purchase_price, strict, warnings)?;
    let loan_amount = required_positive("loan_amount", input.loan_amount, strict, warnings)?;
    let monthly_rent = required_positive("monthly_rent", input.monthly_rent, strict, warnings)?;

    let loan_term_years = term("loan_term_years", input.loan_term_years, DEFAULT_LOAN_TERM_YEARS)?;
    let holding_period_years = term(
        "holding_period_years",
        input.holding_period_years,
        DEFAULT_HOLDING_PERIOD_YEARS,
    )?;

    let vacancy_rate = input.vacancy_rate.unwrap_or(DEFAULT_VACANCY_RATE);
    fraction("vacancy_rate", vacancy_rate)?;
    let property_management_rate = input
        .property_management_rate
        .unwrap_or(DEFAULT_MANAGEMENT_RATE);
    fraction("property_management_rate", property_management_rate)?;
    let tax_rate = input.tax_rate.unwrap_or(DEFAULT_TAX_RATE);
    fraction("tax_rate", tax_rate)?;
    let selling_cost_rate = input.selling_cost_rate.unwrap_or(DEFAULT_SELLING_COSTS);
    fraction("selling_cost_rate", selling_cost_rate)?;

    let interest_rate = input.interest_rate.unwrap_or(Decimal::ZERO);
    fraction("interest_rate", interest_rate)?;

    let rent_growth_rate = input.rent_growth_rate.unwrap_or(DEFAULT_RENT_GROWTH);
    growth("rent_growth_rate", rent_growth_rate)?;
    let appreciation_rate = input.appreciation_rate.unwrap_or(DEFAULT_APPRECIATION);
    growth("appreciation_rate", appreciation_rate)?;
    let discount_rate = input.discount_rate.unwrap_or(DEFAULT_DISCOUNT_RATE);
    growth("discount_rate", discount_rate)?;

    let depreciation_years = input.depreciation_years.unwrap_or(DEFAULT_DEPRECIATION_YEARS);
    if depreciation_years <= Decimal::ZERO {
        return Err(PropertyRoiError::InvalidInput {
            field: "depreciation_years".into(),
            reason: "Depreciation life must be positive".into(),
        });
    }

    let resolved = ResolvedAssumptions {
        purchase_price,
        down_payment: optional_amount("down_payment", input.down_payment, strict, warnings)?,
        closing_costs: optional_amount("closing_costs", input.closing_costs, strict, warnings)?,
        renovation_costs: optional_amount("renovation_costs", input.renovation_costs, strict, warnings)?,
        loan_amount,
        interest_rate,
        loan_term_years,
        pmi_monthly: optional_amount("pmi_monthly", input.pmi_monthly, strict, warnings)?,
        monthly_rent,
        vacancy_rate,
        rent_growth_rate,
        other_income_monthly: optional_amount(
            "other_income_monthly",
            input.other_income_monthly,
            strict,
            warnings,
        )?,
        property_taxes_annual: optional_amount(
            "property_taxes_annual",
            input.property_taxes_annual,
            strict,
            warnings,
        )?,
        insurance_annual: optional_amount("insurance_annual", input.insurance_annual, strict, warnings)?,
        hoa_fees_monthly: optional_amount("hoa_fees_monthly", input.hoa_fees_monthly, strict, warnings)?,
        utilities_monthly: optional_amount("utilities_monthly", input.utilities_monthly, strict, warnings)?,
        maintenance_monthly: optional_amount(
            "maintenance_monthly",
            input.maintenance_monthly,
            strict,
            warnings,
        )?,
        property_management_rate,
        repairs_monthly: optional_amount("repairs_monthly", input.repairs_monthly, strict, warnings)?,
        landscaping_monthly: optional_amount(
            "landscaping_monthly",
            input.landscaping_monthly,
            strict,
            warnings,
        )?,
        pest_control_monthly: optional_amount(
            "pest_control_monthly",
            input.pest_control_monthly,
            strict,
            warnings,
        )?,
        property_type: input.property_type.unwrap_or_default(),
        location: input.location.unwrap_or_default(),
        market_condition: input.market_condition.unwrap_or_default(),
        property_age_years: property_age(input.year_built, input.analysis_year, warnings),
        appreciation_rate,
        discount_rate,
        holding_period_years,
        tax_rate,
        depreciation_years,
        selling_cost_rate,
        options: input.options.clone(),
    };

    sanity_warnings(&resolved, warnings);

    Ok(resolved)
}

fn required_positive(
    field: &str,
    value: Option<Money>,
    strict: bool,
    warnings: &mut Vec<String>,
) -> PropertyRoiResult<Money> {
    match value {
        Some(v) if v > MAX_AMOUNT => Err(too_large(field)),
        Some(v) if v > Decimal::ZERO => Ok(v),
        other => {
            if strict {
                return Err(PropertyRoiError::InvalidInput {
                    field: field.into(),
                    reason: "Required and must be greater than 0".into(),
                });
            }
            warn!(field, value = ?other, "substituting 0 for missing or non-positive input");
            warnings.push(format!("{field} missing or not positive; treated as 0"));
            Ok(Decimal::ZERO)
        }
    }
}

fn optional_amount(
    field: &str,
    value: Option<Money>,
    strict: bool,
    warnings: &mut Vec<String>,
) -> PropertyRoiResult<Money> {
    match value {
        None => Ok(Decimal::ZERO),
        Some(v) if v > MAX_AMOUNT => Err(too_large(field)),
        Some(v) if v >= Decimal::ZERO => Ok(v),
        Some(v) => {
            if strict {
                return Err(PropertyRoiError::InvalidInput {
                    field: field.into(),
                    reason: "Must be non-negative".into(),
                });
            }
            warnings.push(format!("{field} = {v} is negative; treated as 0"));
            Ok(Decimal::ZERO)
        }
    }
}

fn too_large(field: &str) -> PropertyRoiError {
    PropertyRoiError::InvalidInput {
        field: field.into(),
        reason: format!("Must not exceed {MAX_AMOUNT}"),
    }
}

fn term(field: &str, value: Option<u32>, default: u32) -> PropertyRoiResult<u32> {
    let years = value.unwrap_or(default);
    if years < 1 {
        return Err(PropertyRoiError::InvalidHorizon {
            field: field.into(),
            value: i64::from(years),
        });
    }
    if years > MAX_TERM_YEARS {
        return Err(PropertyRoiError::InvalidInput {
            field: field.into(),
            reason: format!("Must be between 1 and {MAX_TERM_YEARS} years"),
        });
    }
    Ok(years)
}

fn fraction(field: &str, rate: Rate) -> PropertyRoiResult<()> {
    if rate < Decimal::ZERO || rate > Decimal::ONE {
        return Err(PropertyRoiError::InvalidRate {
            field: field.into(),
            rate,
        });
    }
    Ok(())
}

/// Growth-style rates live in `(-1, MAX_GROWTH_RATE]`.
fn growth(field: &str, rate: Rate) -> PropertyRoiResult<()> {
    if rate <= dec!(-1) || rate > MAX_GROWTH_RATE {
        return Err(PropertyRoiError::InvalidRate {
            field: field.into(),
            rate,
        });
    }
    Ok(())
}

fn property_age(
    year_built: Option<i32>,
    analysis_year: Option<i32>,
    warnings: &mut Vec<String>,
) -> Option<u32> {
    match (year_built, analysis_year) {
        (Some(built), Some(now)) if now >= built => u32::try_from(now - built).ok(),
        (Some(built), Some(now)) => {
            warnings.push(format!(
                "year_built {built} is after analysis_year {now}; property age not scored"
            ));
            None
        }
        (Some(_), None) => {
            warnings.push("analysis_year not supplied; property age not scored".into());
            None
        }
        _ => None,
    }
}

fn sanity_warnings(a: &ResolvedAssumptions, warnings: &mut Vec<String>) {
    if a.purchase_price > Decimal::ZERO && a.monthly_rent > Decimal::ZERO {
        // A ratio past the Decimal range is reported as the maximum
        let rent_to_price = (a.monthly_rent * dec!(12))
            .checked_div(a.purchase_price)
            .unwrap_or(Decimal::MAX);
        if rent_to_price < dec!(0.06) {
            warnings.push(format!(
                "Annual rent-to-price ratio {:.2}% is low — may indicate poor cash flow",
                rent_to_price * dec!(100)
            ));
        } else if rent_to_price > dec!(0.15) {
            warnings.push(format!(
                "Annual rent-to-price ratio {:.2}% is high — verify rent is realistic",
                rent_to_price.saturating_mul(dec!(100))
            ));
        }
    }

    if a.vacancy_rate > dec!(0.10) {
        warnings.push(format!(
            "Vacancy rate {:.1}% exceeds 10% — may indicate market issues",
            a.vacancy_rate * dec!(100)
        ));
    }

    if a.appreciation_rate < Decimal::ZERO {
        warnings.push("Negative appreciation rate indicates a declining market".into());
    }

    if a.purchase_price > Decimal::ZERO && a.down_payment > a.purchase_price {
        warnings.push("Down payment exceeds purchase price".into());
    }
}
