use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::PropertyRoiError;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::PropertyRoiResult;

const MONTHS_PER_YEAR: u32 = 12;
/// Longest loan a yearly schedule is built for
pub const MAX_SCHEDULE_YEARS: u32 = 1000;

/// Fixed-rate, fully amortizing loan with monthly payments.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoanTerms {
    pub principal: Money,
    /// Nominal annual rate (0.065 = 6.5%)
    pub annual_rate: Rate,
    pub term_years: u32,
}

impl LoanTerms {
    pub fn new(principal: Money, annual_rate: Rate, term_years: u32) -> PropertyRoiResult<Self> {
        validate_terms(principal, annual_rate, term_years)?;
        Ok(Self {
            principal,
            annual_rate,
            term_years,
        })
    }

    pub fn monthly_rate(&self) -> Rate {
        self.annual_rate / Decimal::from(MONTHS_PER_YEAR)
    }

    pub fn months(&self) -> u64 {
        total_months(self.term_years)
    }

    pub fn payment(&self) -> PropertyRoiResult<Money> {
        periodic_payment(self.principal, self.annual_rate, self.term_years)
    }
}

/// One year of an amortization schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationYear {
    pub year: u32,
    pub total_paid: Money,
    pub interest: Money,
    pub principal: Money,
    pub closing_balance: Money,
}

fn total_months(term_years: u32) -> u64 {
    u64::from(term_years) * u64::from(MONTHS_PER_YEAR)
}

fn overflow(context: &str) -> PropertyRoiError {
    PropertyRoiError::Overflow {
        context: context.into(),
    }
}

fn validate_terms(principal: Money, annual_rate: Rate, term_years: u32) -> PropertyRoiResult<()> {
    if principal < Decimal::ZERO {
        return Err(PropertyRoiError::InvalidInput {
            field: "principal".into(),
            reason: "Loan principal cannot be negative".into(),
        });
    }
    if annual_rate < Decimal::ZERO {
        return Err(PropertyRoiError::InvalidRate {
            field: "annual_rate".into(),
            rate: annual_rate,
        });
    }
    if term_years < 1 {
        return Err(PropertyRoiError::InvalidHorizon {
            field: "term_years".into(),
            value: i64::from(term_years),
        });
    }
    Ok(())
}

/// Monthly payment of a fixed-rate loan (annuity formula).
///
/// A zero rate is a straight-line schedule, `principal / months`. A zero
/// principal (an all-cash purchase) has a zero payment. When the annuity
/// factor `(1 + r)^n` is past the Decimal range the payment is the
/// interest-only limit `principal * r`.
pub fn periodic_payment(
    principal: Money,
    annual_rate: Rate,
    term_years: u32,
) -> PropertyRoiResult<Money> {
    validate_terms(principal, annual_rate, term_years)?;

    let n = total_months(term_years);
    if principal.is_zero() {
        return Ok(Decimal::ZERO);
    }
    let r = annual_rate / Decimal::from(MONTHS_PER_YEAR);
    if r.is_zero() {
        return Ok(principal / Decimal::from(n));
    }

    let interest_only = principal.checked_mul(r).ok_or_else(|| overflow("periodic payment"))?;
    let Some(factor) = (Decimal::ONE + r).checked_powu(n) else {
        return Ok(interest_only);
    };
    let denominator = factor - Decimal::ONE;
    if denominator.is_zero() {
        return Err(PropertyRoiError::DivisionByZero {
            context: "annuity factor in periodic payment".into(),
        });
    }

    factor
        .checked_div(denominator)
        .and_then(|scale| interest_only.checked_mul(scale))
        .ok_or_else(|| overflow("periodic payment"))
}

/// Total interest over the full schedule: `payment * months - principal`.
/// Saturates at the Decimal range.
pub fn total_interest(principal: Money, payment: Money, term_years: u32) -> Money {
    payment
        .saturating_mul(Decimal::from(total_months(term_years)))
        .saturating_sub(principal)
}

/// Principal share of a single payment given that period's interest.
pub fn principal_portion(total_payment: Money, interest_payment: Money) -> Money {
    total_payment - interest_payment
}

/// Outstanding balance after `months_elapsed` payments. Never negative.
pub fn remaining_balance(
    terms: &LoanTerms,
    payment: Money,
    months_elapsed: u32,
) -> PropertyRoiResult<Money> {
    validate_terms(terms.principal, terms.annual_rate, terms.term_years)?;

    if u64::from(months_elapsed) >= terms.months() {
        return Ok(Decimal::ZERO);
    }
    let k = Decimal::from(months_elapsed);
    let r = terms.monthly_rate();

    let balance = if r.is_zero() {
        payment
            .checked_mul(k)
            .and_then(|paid| terms.principal.checked_sub(paid))
    } else {
        (Decimal::ONE + r)
            .checked_powu(u64::from(months_elapsed))
            .and_then(|growth| {
                let owed = terms.principal.checked_mul(growth)?;
                let repaid = payment.checked_mul(growth - Decimal::ONE)?.checked_div(r)?;
                owed.checked_sub(repaid)
            })
    };
    let balance = balance.ok_or_else(|| overflow("remaining balance"))?;

    Ok(balance.max(Decimal::ZERO))
}

/// Year-by-year interest/principal split of the loan.
pub fn amortization_schedule(terms: &LoanTerms) -> PropertyRoiResult<Vec<AmortizationYear>> {
    if terms.term_years > MAX_SCHEDULE_YEARS {
        return Err(PropertyRoiError::InvalidInput {
            field: "term_years".into(),
            reason: format!("Schedules are limited to {} years", MAX_SCHEDULE_YEARS),
        });
    }
    let payment = terms.payment()?;
    let r = terms.monthly_rate();

    let mut balance = terms.principal;
    let mut schedule = Vec::with_capacity(terms.term_years as usize);

    for year in 1..=terms.term_years {
        let mut interest = Decimal::ZERO;
        let mut principal = Decimal::ZERO;
        let mut total_paid = Decimal::ZERO;

        for _ in 0..MONTHS_PER_YEAR {
            if balance <= Decimal::ZERO {
                break;
            }
            let month_interest = balance.checked_mul(r).ok_or_else(|| overflow("schedule interest"))?;
            // Final payment absorbs rounding drift
            let month_principal = principal_portion(payment, month_interest).min(balance);
            balance -= month_principal;
            interest = interest
                .checked_add(month_interest)
                .ok_or_else(|| overflow("schedule interest"))?;
            principal += month_principal;
            total_paid = total_paid
                .checked_add(month_interest + month_principal)
                .ok_or_else(|| overflow("schedule total paid"))?;
        }

        if balance.abs() < dec!(0.000001) {
            balance = Decimal::ZERO;
        }

        schedule.push(AmortizationYear {
            year,
            total_paid,
            interest,
            principal,
            closing_balance: balance,
        });
    }

    Ok(schedule)
}

// ---------------------------------------------------------------------------
// Loan summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanSummary {
    pub monthly_payment: Money,
    pub total_paid: Money,
    pub total_interest: Money,
    pub schedule: Vec<AmortizationYear>,
}

/// Payment, lifetime cost and yearly schedule of a loan.
pub fn analyze_loan(terms: &LoanTerms) -> PropertyRoiResult<ComputationOutput<LoanSummary>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let monthly_payment = terms.payment()?;
    let schedule = amortization_schedule(terms)?;
    monthly_payment
        .checked_mul(Decimal::from(terms.months()))
        .ok_or_else(|| overflow("lifetime loan cost"))?;
    let total_interest = total_interest(terms.principal, monthly_payment, terms.term_years);

    if terms.principal.is_zero() {
        warnings.push("Zero principal: no financing cost".into());
    }
    if terms.annual_rate > dec!(0.15) {
        warnings.push(format!(
            "Annual rate {}% is unusually high for a mortgage",
            terms.annual_rate.saturating_mul(dec!(100)).round_dp(2)
        ));
    }

    let summary = LoanSummary {
        monthly_payment,
        total_paid: terms.principal.saturating_add(total_interest),
        total_interest,
        schedule,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Fixed-rate annuity payment with monthly amortization",
        terms,
        warnings,
        elapsed,
        summary,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_payment_30yr_mortgage() {
        let pmt = periodic_payment(dec!(240000), dec!(0.065), 30).unwrap();
        // Standard 30-year at 6.5%: ~1516.96
        assert!((pmt - dec!(1516.96)).abs() < dec!(1), "got {pmt}");
    }

    #[test]
    fn test_zero_rate_is_straight_line() {
        let pmt = periodic_payment(dec!(120000), dec!(0), 10).unwrap();
        assert_eq!(pmt, dec!(1000));
    }

    #[test]
    fn test_zero_principal_has_zero_payment() {
        let pmt = periodic_payment(dec!(0), dec!(0.05), 30).unwrap();
        assert_eq!(pmt, Decimal::ZERO);
    }

    #[test]
    fn test_invalid_term_rejected() {
        let err = periodic_payment(dec!(100000), dec!(0.05), 0).unwrap_err();
        assert!(matches!(err, PropertyRoiError::InvalidHorizon { .. }));
    }

    #[test]
    fn test_negative_principal_rejected() {
        let err = periodic_payment(dec!(-1), dec!(0.05), 30).unwrap_err();
        assert!(matches!(err, PropertyRoiError::InvalidInput { .. }));
    }

    #[test]
    fn test_extreme_term_falls_back_to_interest_only() {
        // (1 + 0.5/12)^6000 is past the Decimal range
        let pmt = periodic_payment(dec!(100000), dec!(0.5), 500).unwrap();
        assert_eq!(pmt, dec!(100000) * (dec!(0.5) / dec!(12)));

        let pmt = periodic_payment(dec!(100000), dec!(0.05), 2000).unwrap();
        assert!((pmt - dec!(416.67)).abs() < dec!(0.01), "got {pmt}");

        let pmt = periodic_payment(dec!(100000), dec!(0.05), u32::MAX).unwrap();
        assert!((pmt - dec!(416.67)).abs() < dec!(0.01), "got {pmt}");
    }

    #[test]
    fn test_payment_overflow_is_an_error() {
        let err = periodic_payment(Decimal::MAX, dec!(24), 30).unwrap_err();
        assert!(matches!(err, PropertyRoiError::Overflow { .. }));
    }

    #[test]
    fn test_remaining_balance_overflow_is_an_error() {
        let terms = LoanTerms::new(dec!(100000), dec!(0.5), 500).unwrap();
        let pmt = terms.payment().unwrap();
        let err = remaining_balance(&terms, pmt, 5000).unwrap_err();
        assert!(matches!(err, PropertyRoiError::Overflow { .. }));
    }

    #[test]
    fn test_schedule_length_is_capped() {
        let terms = LoanTerms::new(dec!(100000), dec!(0.05), 2000).unwrap();
        let err = amortization_schedule(&terms).unwrap_err();
        assert!(matches!(err, PropertyRoiError::InvalidInput { .. }));
        assert!(analyze_loan(&terms).is_err());
    }

    #[test]
    fn test_negative_rate_rejected() {
        let err = periodic_payment(dec!(100000), dec!(-0.01), 30).unwrap_err();
        assert!(matches!(err, PropertyRoiError::InvalidRate { .. }));
    }

    #[test]
    fn test_total_interest() {
        let pmt = periodic_payment(dec!(240000), dec!(0.065), 30).unwrap();
        let interest = total_interest(dec!(240000), pmt, 30);
        // 1516.96 * 360 - 240000 ≈ 306105
        assert!((interest - dec!(306105)).abs() < dec!(50));
    }

    #[test]
    fn test_principal_portion() {
        assert_eq!(principal_portion(dec!(1516.96), dec!(1300)), dec!(216.96));
    }

    #[test]
    fn test_remaining_balance_endpoints() {
        let terms = LoanTerms::new(dec!(240000), dec!(0.065), 30).unwrap();
        let pmt = terms.payment().unwrap();
        assert_eq!(remaining_balance(&terms, pmt, 0).unwrap(), dec!(240000));
        assert_eq!(remaining_balance(&terms, pmt, 360).unwrap(), Decimal::ZERO);
        let after_10y = remaining_balance(&terms, pmt, 120).unwrap();
        // Roughly 203k remains after ten years on a 30-year 6.5% loan
        assert!(after_10y > dec!(200000) && after_10y < dec!(206000), "got {after_10y}");
    }

    #[test]
    fn test_schedule_pays_off_loan() {
        let terms = LoanTerms::new(dec!(100000), dec!(0.06), 15).unwrap();
        let schedule = amortization_schedule(&terms).unwrap();
        assert_eq!(schedule.len(), 15);
        let repaid: Decimal = schedule.iter().map(|y| y.principal).sum();
        assert!((repaid - dec!(100000)).abs() < dec!(0.01));
        assert!(schedule.last().unwrap().closing_balance < dec!(0.01));
        // Interest share falls over time
        assert!(schedule[0].interest > schedule[14].interest);
    }

    #[test]
    fn test_schedule_matches_closed_form_balance() {
        let terms = LoanTerms::new(dec!(240000), dec!(0.065), 30).unwrap();
        let pmt = terms.payment().unwrap();
        let schedule = amortization_schedule(&terms).unwrap();
        let closed = remaining_balance(&terms, pmt, 60).unwrap();
        assert!((schedule[4].closing_balance - closed).abs() < dec!(0.01));
    }

    #[test]
    fn test_analyze_loan_envelope() {
        let terms = LoanTerms::new(dec!(120000), dec!(0), 10).unwrap();
        let out = analyze_loan(&terms).unwrap();
        assert_eq!(out.result.monthly_payment, dec!(1000));
        assert_eq!(out.result.total_interest, Decimal::ZERO);
        assert_eq!(out.result.total_paid, dec!(120000));
        assert_eq!(out.result.schedule.len(), 10);
        assert_eq!(out.assumptions["term_years"], 10);
        assert!(out.warnings.is_empty());
    }
}
