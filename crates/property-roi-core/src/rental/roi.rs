use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::amortization::{self, LoanTerms};
use crate::error::PropertyRoiError;
use crate::projection::{self, ExitAssumptions};
use crate::rental::assumptions::{self, ExitLoanBalance, RentalPropertyInput, ResolvedAssumptions};
use crate::scoring::{self, CompositeScores, RecommendationTier, ScoreFactors};
use crate::time_value::{self, IrrOutcome};
use crate::types::{with_metadata, CashFlowSeries, ComputationOutput, Money, Multiple, Rate, Years};
use crate::PropertyRoiResult;

const MONTHS_PER_YEAR: Decimal = dec!(12);

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Complete rental property evaluation.
///
/// Ratios are fractions. A ratio whose denominator is zero is reported as 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentResult {
    /// Down payment + closing costs + renovation
    pub total_investment: Money,
    pub monthly_mortgage_payment: Money,
    /// Rent net of vacancy plus other income
    pub gross_monthly_income: Money,
    pub total_monthly_expenses: Money,
    pub monthly_cash_flow: Money,
    pub annual_cash_flow: Money,
    pub net_operating_income: Money,
    /// Annual cash flow / total investment
    pub cash_on_cash_return: Rate,
    /// NOI / purchase price
    pub cap_rate: Rate,
    /// NOI / annual debt service (mortgage + PMI)
    pub debt_service_coverage: Multiple,
    /// Monthly rent that covers expenses and debt service
    pub break_even_rent: Money,
    /// Break-even rent / stated rent. Above 1.0 the property cannot break even
    pub break_even_occupancy: Rate,
    pub gross_rent_multiplier: Multiple,
    pub operating_expense_ratio: Rate,
    /// Annual cash flow / gross annual income
    pub profit_margin: Rate,
    /// Principal repaid in year 1
    pub equity_build_up: Money,
    /// Year-1 depreciation and mortgage interest, times the tax rate
    pub tax_benefits: Money,
    /// One year of appreciation on the purchase price
    pub appreciation_value: Money,
    /// Cash flow + equity build-up + tax benefits + appreciation
    pub total_return: Money,
    pub total_roi: Rate,
    /// Compound-growth inverse of `total_roi` over the holding period
    pub annualized_roi: Rate,
    /// Years of cash flow to recover the investment; None if cash flow <= 0
    pub payback_period_years: Option<Years>,
    /// Best available IRR estimate (fraction); see `irr_outcome`
    pub irr: Rate,
    /// IRR as a percentage rounded to 2 dp
    pub irr_pct: Decimal,
    pub irr_converged: bool,
    pub irr_outcome: IrrOutcome,
    pub npv: Money,
    pub exit_proceeds: Money,
    pub projected_cash_flows: CashFlowSeries,
    pub scores: CompositeScores,
    pub recommendation: RecommendationTier,
    pub recommendation_label: String,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Evaluate a leveraged rental property: financing, operating cash flow,
/// return ratios, holding-period projection with IRR/NPV, and composite
/// scores with a recommendation tier.
pub fn evaluate(input: &RentalPropertyInput) -> PropertyRoiResult<ComputationOutput<InvestmentResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let a = assumptions::resolve(input, &mut warnings)?;
    let result = evaluate_resolved(&a, &mut warnings)?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Rental Property ROI: amortization, cash-flow projection, IRR/NPV, composite scoring",
        &a,
        warnings,
        elapsed,
        result,
    ))
}

/// Run the pipeline on already-resolved assumptions.
pub fn evaluate_resolved(
    a: &ResolvedAssumptions,
    warnings: &mut Vec<String>,
) -> PropertyRoiResult<InvestmentResult> {
    // --- Financing ---
    let terms = LoanTerms::new(a.loan_amount, a.interest_rate, a.loan_term_years)?;
    let monthly_mortgage_payment = terms.payment()?;
    let monthly_debt_service = monthly_mortgage_payment + a.pmi_monthly;
    let schedule = amortization::amortization_schedule(&terms)?;
    let (year1_interest, year1_principal) = schedule
        .first()
        .map(|y| (y.interest, y.principal))
        .unwrap_or((Decimal::ZERO, Decimal::ZERO));

    // --- Operating cash flow (monthly) ---
    let total_investment = a.total_investment();
    let effective_rent = a.monthly_rent * (Decimal::ONE - a.vacancy_rate);
    let gross_monthly_income = effective_rent + a.other_income_monthly;
    let gross_annual_income = gross_monthly_income * MONTHS_PER_YEAR;

    let management = gross_monthly_income * a.property_management_rate;
    let total_monthly_expenses = a.property_taxes_annual / MONTHS_PER_YEAR
        + a.insurance_annual / MONTHS_PER_YEAR
        + a.hoa_fees_monthly
        + a.utilities_monthly
        + a.maintenance_monthly
        + management
        + a.repairs_monthly
        + a.landscaping_monthly
        + a.pest_control_monthly;
    let total_annual_expenses = total_monthly_expenses * MONTHS_PER_YEAR;

    let net_operating_income = gross_annual_income - total_annual_expenses;
    let monthly_cash_flow = gross_monthly_income - total_monthly_expenses - monthly_debt_service;
    let annual_cash_flow = monthly_cash_flow * MONTHS_PER_YEAR;

    debug!(
        %total_investment,
        %monthly_mortgage_payment,
        %monthly_cash_flow,
        %net_operating_income,
        "operating cash flow computed"
    );

    // --- Return ratios ---
    let cash_on_cash_return = ratio("cash_on_cash_return", annual_cash_flow, total_investment)?;
    let cap_rate = ratio("cap_rate", net_operating_income, a.purchase_price)?;
    let debt_service_coverage = ratio(
        "debt_service_coverage",
        net_operating_income,
        monthly_debt_service * MONTHS_PER_YEAR,
    )?;

    // --- Break-even ---
    let break_even_rent = total_monthly_expenses + monthly_debt_service;
    let break_even_occupancy = ratio("break_even_occupancy", break_even_rent, a.monthly_rent)?;
    if break_even_occupancy > Decimal::ONE {
        warnings.push(format!(
            "Break-even occupancy {:.1}% exceeds 100%; rent cannot cover costs",
            break_even_occupancy.saturating_mul(dec!(100))
        ));
    }

    let gross_rent_multiplier = ratio(
        "gross_rent_multiplier",
        a.purchase_price,
        a.monthly_rent * MONTHS_PER_YEAR,
    )?;
    let operating_expense_ratio = ratio(
        "operating_expense_ratio",
        total_annual_expenses,
        gross_annual_income,
    )?;
    let profit_margin = ratio("profit_margin", annual_cash_flow, gross_annual_income)?;

    // --- Equity, tax and appreciation ---
    let equity_build_up = year1_principal;
    let annual_depreciation = ratio("annual_depreciation", a.purchase_price, a.depreciation_years)?;
    let tax_benefits = annual_depreciation
        .checked_add(year1_interest)
        .and_then(|deductible| deductible.checked_mul(a.tax_rate))
        .ok_or_else(|| PropertyRoiError::Overflow {
            context: "tax_benefits".into(),
        })?;
    let appreciation_value = a.purchase_price * a.appreciation_rate;

    let total_return = [equity_build_up, tax_benefits, appreciation_value]
        .into_iter()
        .try_fold(annual_cash_flow, |acc, part| acc.checked_add(part))
        .ok_or_else(|| PropertyRoiError::Overflow {
            context: "total_return".into(),
        })?;
    let total_roi = ratio("total_roi", total_return, total_investment)?;
    let annualized_roi = annualize(total_roi, a.holding_period_years)?;
    let payback_period_years = if annual_cash_flow > Decimal::ZERO {
        Some(ratio("payback_period_years", total_investment, annual_cash_flow)?)
    } else {
        None
    };

    // --- Holding-period projection ---
    let outstanding_loan_balance = match a.options.exit_loan_balance {
        ExitLoanBalance::OriginalPrincipal => a.loan_amount,
        ExitLoanBalance::Amortized => amortization::remaining_balance(
            &terms,
            monthly_mortgage_payment,
            a.holding_period_years * 12,
        )?,
    };
    let exit = ExitAssumptions {
        purchase_price: a.purchase_price,
        appreciation_rate: a.appreciation_rate,
        selling_cost_rate: a.selling_cost_rate,
        outstanding_loan_balance,
    };
    let projected_cash_flows = projection::project(
        annual_cash_flow,
        a.rent_growth_rate,
        a.holding_period_years,
        &exit,
    )?;
    let amounts = projected_cash_flows.amounts();

    let irr_outcome = time_value::irr(total_investment, &amounts, &a.options.irr)?;
    if !irr_outcome.converged() {
        warnings.push(match &irr_outcome {
            IrrOutcome::NotBracketed { .. } => format!(
                "IRR not bracketed between {} and {}; reported figure is a best-effort estimate",
                a.options.irr.lower_bound, a.options.irr.upper_bound
            ),
            _ => format!(
                "IRR did not converge within {} iterations",
                a.options.irr.max_iterations
            ),
        });
    }
    let npv = time_value::npv(total_investment, &amounts, a.discount_rate)?;

    // --- Scores ---
    let factors = ScoreFactors {
        cash_on_cash_return,
        cap_rate,
        debt_service_coverage,
        vacancy_rate: a.vacancy_rate,
        appreciation_rate: a.appreciation_rate,
        monthly_cash_flow,
        total_investment,
        market_condition: a.market_condition,
        property_type: a.property_type,
        location: a.location,
        property_age_years: a.property_age_years,
        holding_period_years: a.holding_period_years,
    };
    let scores = scoring::score_all(&factors);
    let recommendation = a.options.tiers.tier(scores.investment);

    debug!(
        investment = %scores.investment,
        risk = %scores.risk,
        irr = %irr_outcome.rate(),
        %npv,
        "rental property scored"
    );

    Ok(InvestmentResult {
        total_investment,
        monthly_mortgage_payment,
        gross_monthly_income,
        total_monthly_expenses,
        monthly_cash_flow,
        annual_cash_flow,
        net_operating_income,
        cash_on_cash_return,
        cap_rate,
        debt_service_coverage,
        break_even_rent,
        break_even_occupancy,
        gross_rent_multiplier,
        operating_expense_ratio,
        profit_margin,
        equity_build_up,
        tax_benefits,
        appreciation_value,
        total_return,
        total_roi,
        annualized_roi,
        payback_period_years,
        irr: irr_outcome.rate(),
        irr_pct: irr_outcome.rate_pct(),
        irr_converged: irr_outcome.converged(),
        irr_outcome,
        npv,
        exit_proceeds: projected_cash_flows.exit_proceeds,
        projected_cash_flows,
        scores,
        recommendation,
        recommendation_label: recommendation.label().to_string(),
    })
}

/// `numerator / denominator`, or 0 when the denominator is not positive.
fn ratio(field: &str, numerator: Decimal, denominator: Decimal) -> PropertyRoiResult<Decimal> {
    if denominator <= Decimal::ZERO {
        return Ok(Decimal::ZERO);
    }
    numerator
        .checked_div(denominator)
        .ok_or_else(|| PropertyRoiError::Overflow {
            context: field.into(),
        })
}

/// `(1 + total)^(1/years) - 1`, floored at -100% when the total loses
/// everything.
fn annualize(total_roi: Rate, years: u32) -> PropertyRoiResult<Rate> {
    let growth = total_roi
        .checked_add(Decimal::ONE)
        .ok_or_else(|| PropertyRoiError::Overflow {
            context: "annualized_roi".into(),
        })?;
    if growth <= Decimal::ZERO {
        return Ok(dec!(-1));
    }
    if years == 1 {
        return Ok(total_roi);
    }
    let exponent = Decimal::ONE / Decimal::from(years);
    let annual = growth
        .checked_powd(exponent)
        .ok_or_else(|| PropertyRoiError::InvalidInput {
            field: "total_roi".into(),
            reason: format!("Cannot annualize a total return of {total_roi}"),
        })?;
    Ok(annual - Decimal::ONE)
}
