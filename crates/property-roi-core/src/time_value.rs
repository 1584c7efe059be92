use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

use crate::error::PropertyRoiError;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::PropertyRoiResult;

const DEFAULT_IRR_LOWER_BOUND: Decimal = dec!(-0.5);
const DEFAULT_IRR_UPPER_BOUND: Decimal = dec!(1.0);
const DEFAULT_IRR_TOLERANCE: Decimal = dec!(0.0001);
const DEFAULT_MAX_IRR_ITERATIONS: u32 = 100;

/// Net Present Value of year-end cash flows against an up-front outlay.
///
/// `cash_flows[0]` is received at the end of year 1, so every flow is
/// discounted at least once: `-outlay + Σ cf_y / (1 + r)^y`. A sum that
/// leaves the Decimal range fails with `Overflow`.
pub fn npv(initial_outlay: Money, cash_flows: &[Money], discount_rate: Rate) -> PropertyRoiResult<Money> {
    match discount_flows(initial_outlay, cash_flows, discount_rate)? {
        Discounted::Value(value) => Ok(value),
        Discounted::OutOfRange { period, .. } => Err(PropertyRoiError::Overflow {
            context: format!("NPV at rate {} (period {})", discount_rate, period),
        }),
    }
}

/// NPV that saturates to `Decimal::MAX`/`Decimal::MIN` instead of failing,
/// so a search can keep comparing signs at extreme rates.
fn saturating_npv(initial_outlay: Money, cash_flows: &[Money], rate: Rate) -> PropertyRoiResult<Money> {
    Ok(match discount_flows(initial_outlay, cash_flows, rate)? {
        Discounted::Value(value) => value,
        Discounted::OutOfRange { negative: true, .. } => Decimal::MIN,
        Discounted::OutOfRange { negative: false, .. } => Decimal::MAX,
    })
}

enum Discounted {
    Value(Money),
    /// The term for `period` pushed the sum past the Decimal range in the
    /// direction given by `negative`.
    OutOfRange { period: usize, negative: bool },
}

fn discount_flows(initial_outlay: Money, cash_flows: &[Money], discount_rate: Rate) -> PropertyRoiResult<Discounted> {
    if discount_rate <= dec!(-1) {
        return Err(PropertyRoiError::InvalidRate {
            field: "discount_rate".into(),
            rate: discount_rate,
        });
    }

    let Some(one_plus_r) = discount_rate.checked_add(Decimal::ONE) else {
        // Every flow discounts to nothing
        return Ok(Discounted::Value(-initial_outlay));
    };
    let mut total = -initial_outlay;
    let mut discount = Decimal::ONE;

    for (t, cf) in cash_flows.iter().enumerate() {
        discount = match discount.checked_mul(one_plus_r) {
            Some(d) => d,
            // Remaining flows are discounted below Decimal resolution
            None if one_plus_r > Decimal::ONE => break,
            None => Decimal::ZERO,
        };
        if cf.is_zero() {
            continue;
        }
        // A factor that underflowed to zero means an unbounded term
        let term = if discount.is_zero() { None } else { cf.checked_div(discount) };
        match term.and_then(|term| total.checked_add(term)) {
            Some(sum) => total = sum,
            None => {
                return Ok(Discounted::OutOfRange {
                    period: t + 1,
                    negative: cf.is_sign_negative(),
                })
            }
        }
    }

    Ok(Discounted::Value(total))
}

/// Search window and stopping rule for the IRR bisection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IrrConfig {
    pub lower_bound: Rate,
    pub upper_bound: Rate,
    /// Absolute NPV (currency) considered zero
    pub tolerance: Money,
    pub max_iterations: u32,
}

impl Default for IrrConfig {
    fn default() -> Self {
        Self {
            lower_bound: DEFAULT_IRR_LOWER_BOUND,
            upper_bound: DEFAULT_IRR_UPPER_BOUND,
            tolerance: DEFAULT_IRR_TOLERANCE,
            max_iterations: DEFAULT_MAX_IRR_ITERATIONS,
        }
    }
}

/// Result of an IRR search. Only `Converged` is a verified root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IrrOutcome {
    Converged { rate: Rate, iterations: u32 },
    /// NPV has the same sign at both bounds; the estimate is bisection's
    /// best effort and may not be a root.
    NotBracketed { best_estimate: Rate },
    MaxIterationsExceeded { last_estimate: Rate },
}

impl IrrOutcome {
    /// The rate to report, whether or not it converged.
    pub fn rate(&self) -> Rate {
        match self {
            IrrOutcome::Converged { rate, .. } => *rate,
            IrrOutcome::NotBracketed { best_estimate } => *best_estimate,
            IrrOutcome::MaxIterationsExceeded { last_estimate } => *last_estimate,
        }
    }

    pub fn converged(&self) -> bool {
        matches!(self, IrrOutcome::Converged { .. })
    }

    /// Rate as a percentage rounded to 2 dp (0.08123 -> 8.12).
    pub fn rate_pct(&self) -> Decimal {
        self.rate().saturating_mul(dec!(100)).round_dp(2)
    }
}

/// Internal Rate of Return by bisection over `[lower_bound, upper_bound]`.
///
/// The bounds are checked first; when NPV does not change sign across them
/// the search still runs to `max_iterations` and reports `NotBracketed`.
/// Non-convergence is never an error. NPV at rates where the discounted sum
/// leaves the Decimal range is treated as the largest value of its sign.
pub fn irr(initial_outlay: Money, cash_flows: &[Money], config: &IrrConfig) -> PropertyRoiResult<IrrOutcome> {
    validate_config(config)?;

    let mut low = config.lower_bound;
    let mut high = config.upper_bound;
    let mut npv_low = saturating_npv(initial_outlay, cash_flows, low)?;
    let npv_high = saturating_npv(initial_outlay, cash_flows, high)?;

    if npv_low.abs() < config.tolerance {
        return Ok(IrrOutcome::Converged { rate: low, iterations: 0 });
    }
    if npv_high.abs() < config.tolerance {
        return Ok(IrrOutcome::Converged { rate: high, iterations: 0 });
    }

    let bracketed = npv_low.is_sign_negative() != npv_high.is_sign_negative();
    let mut mid = midpoint(low, high);

    for i in 1..=config.max_iterations {
        mid = midpoint(low, high);
        let npv_mid = saturating_npv(initial_outlay, cash_flows, mid)?;

        if npv_mid.abs() < config.tolerance {
            debug!(iterations = i, rate = %mid, "IRR converged");
            return Ok(IrrOutcome::Converged { rate: mid, iterations: i });
        }

        if npv_mid.is_sign_negative() == npv_low.is_sign_negative() {
            low = mid;
            npv_low = npv_mid;
        } else {
            high = mid;
        }
    }

    if bracketed {
        warn!(
            iterations = config.max_iterations,
            estimate = %mid,
            "IRR did not converge within the iteration cap"
        );
        Ok(IrrOutcome::MaxIterationsExceeded { last_estimate: mid })
    } else {
        warn!(
            lower = %config.lower_bound,
            upper = %config.upper_bound,
            "NPV does not change sign across the IRR bounds"
        );
        Ok(IrrOutcome::NotBracketed { best_estimate: mid })
    }
}

fn midpoint(low: Rate, high: Rate) -> Rate {
    low / dec!(2) + high / dec!(2)
}

fn validate_config(config: &IrrConfig) -> PropertyRoiResult<()> {
    if config.lower_bound <= dec!(-1) {
        return Err(PropertyRoiError::InvalidRate {
            field: "irr.lower_bound".into(),
            rate: config.lower_bound,
        });
    }
    if config.upper_bound <= config.lower_bound {
        return Err(PropertyRoiError::InvalidInput {
            field: "irr.upper_bound".into(),
            reason: "Upper bound must exceed lower bound".into(),
        });
    }
    if config.tolerance <= Decimal::ZERO {
        return Err(PropertyRoiError::InvalidInput {
            field: "irr.tolerance".into(),
            reason: "Tolerance must be positive".into(),
        });
    }
    if config.max_iterations == 0 {
        return Err(PropertyRoiError::InvalidInput {
            field: "irr.max_iterations".into(),
            reason: "At least one iteration is required".into(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Envelope entry points
// ---------------------------------------------------------------------------

/// Up-front outlay followed by year-end cash flows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NpvInput {
    pub initial_outlay: Money,
    pub cash_flows: Vec<Money>,
    pub discount_rate: Rate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NpvOutput {
    pub npv: Money,
    pub present_value_of_inflows: Money,
    /// Present value of inflows / outlay; 0 without an outlay
    pub profitability_index: Decimal,
}

pub fn calculate_npv(input: &NpvInput) -> PropertyRoiResult<ComputationOutput<NpvOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.cash_flows.is_empty() {
        warnings.push("No cash flows supplied: NPV is the negated outlay".into());
    }

    let npv = npv(input.initial_outlay, &input.cash_flows, input.discount_rate)?;
    let present_value_of_inflows = npv.checked_add(input.initial_outlay).ok_or_else(|| PropertyRoiError::Overflow {
        context: "present value of inflows".into(),
    })?;
    let profitability_index = if input.initial_outlay > Decimal::ZERO {
        present_value_of_inflows
            .checked_div(input.initial_outlay)
            .ok_or_else(|| PropertyRoiError::Overflow {
                context: "profitability index".into(),
            })?
    } else {
        Decimal::ZERO
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Net present value with year-end discounting",
        input,
        warnings,
        elapsed,
        NpvOutput {
            npv,
            present_value_of_inflows,
            profitability_index,
        },
    ))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrrInput {
    pub initial_outlay: Money,
    pub cash_flows: Vec<Money>,
    #[serde(default)]
    pub config: IrrConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrrOutput {
    pub irr: Rate,
    pub irr_pct: Decimal,
    pub converged: bool,
    pub outcome: IrrOutcome,
}

pub fn calculate_irr(input: &IrrInput) -> PropertyRoiResult<ComputationOutput<IrrOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let outcome = irr(input.initial_outlay, &input.cash_flows, &input.config)?;
    match &outcome {
        IrrOutcome::Converged { .. } => {}
        IrrOutcome::NotBracketed { .. } => warnings.push(format!(
            "IRR not bracketed between {} and {}; reported figure is a best-effort estimate",
            input.config.lower_bound, input.config.upper_bound
        )),
        IrrOutcome::MaxIterationsExceeded { .. } => warnings.push(format!(
            "IRR did not converge within {} iterations",
            input.config.max_iterations
        )),
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Internal rate of return by bisection",
        input,
        warnings,
        elapsed,
        IrrOutput {
            irr: outcome.rate(),
            irr_pct: outcome.rate_pct(),
            converged: outcome.converged(),
            outcome,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_npv_basic() {
        let cfs = vec![dec!(300), dec!(400), dec!(500)];
        let result = npv(dec!(1000), &cfs, dec!(0.10)).unwrap();
        // -1000 + 300/1.1 + 400/1.21 + 500/1.331 ≈ -21.04
        assert!((result - dec!(-21.04)).abs() < dec!(0.01));
    }

    #[test]
    fn test_npv_zero_rate() {
        let cfs = vec![dec!(50), dec!(50), dec!(50)];
        let result = npv(dec!(100), &cfs, dec!(0.0)).unwrap();
        assert_eq!(result, dec!(50));
    }

    #[test]
    fn test_npv_rejects_rate_at_minus_one() {
        let err = npv(dec!(100), &[dec!(10)], dec!(-1)).unwrap_err();
        assert!(matches!(err, PropertyRoiError::InvalidRate { .. }));
    }

    #[test]
    fn test_npv_negative_rate_allowed() {
        let result = npv(dec!(0), &[dec!(90)], dec!(-0.1)).unwrap();
        assert_eq!(result, dec!(100));
    }

    #[test]
    fn test_irr_basic() {
        let cfs = vec![dec!(400), dec!(400), dec!(400)];
        let outcome = irr(dec!(1000), &cfs, &IrrConfig::default()).unwrap();
        assert!(outcome.converged());
        // IRR should be ~9.7%
        assert!((outcome.rate() - dec!(0.097)).abs() < dec!(0.001));
        assert_eq!(outcome.rate_pct(), dec!(9.70));
    }

    #[test]
    fn test_irr_single_period() {
        let outcome = irr(dec!(100), &[dec!(110)], &IrrConfig::default()).unwrap();
        assert!(outcome.converged());
        assert!((outcome.rate() - dec!(0.10)).abs() < dec!(0.000001));
    }

    #[test]
    fn test_irr_npv_near_zero_at_root() {
        let cfs = vec![dec!(12000), dec!(12360), dec!(12730.80), dec!(13112.72), dec!(95000)];
        let outcome = irr(dec!(69000), &cfs, &IrrConfig::default()).unwrap();
        let config = IrrConfig::default();
        assert!(outcome.converged());
        let residual = npv(dec!(69000), &cfs, outcome.rate()).unwrap();
        assert!(residual.abs() < config.tolerance);
    }

    #[test]
    fn test_irr_not_bracketed() {
        // Every flow positive and no outlay: NPV > 0 at both bounds
        let outcome = irr(dec!(0), &[dec!(100), dec!(100)], &IrrConfig::default()).unwrap();
        assert!(!outcome.converged());
        assert!(matches!(outcome, IrrOutcome::NotBracketed { .. }));
    }

    #[test]
    fn test_irr_iteration_cap() {
        let config = IrrConfig {
            max_iterations: 3,
            ..IrrConfig::default()
        };
        let outcome = irr(dec!(1000), &[dec!(400), dec!(400), dec!(400)], &config).unwrap();
        assert!(matches!(outcome, IrrOutcome::MaxIterationsExceeded { .. }));
        assert!(outcome.rate() > dec!(-0.5) && outcome.rate() < dec!(1.0));
    }

    #[test]
    fn test_irr_invalid_bounds() {
        let config = IrrConfig {
            lower_bound: dec!(0.5),
            upper_bound: dec!(0.1),
            ..IrrConfig::default()
        };
        assert!(irr(dec!(1000), &[dec!(1100)], &config).is_err());
    }

    #[test]
    fn test_npv_long_series_at_high_rate_stays_finite() {
        // (2.0)^120 is past the Decimal range; the tail discounts to nothing
        let cfs = vec![dec!(1000); 120];
        let result = npv(dec!(50000), &cfs, dec!(1.0)).unwrap();
        assert!((result - dec!(-49000)).abs() < dec!(0.01));
    }

    #[test]
    fn test_npv_long_series_at_deep_negative_rate_is_overflow() {
        let cfs = vec![dec!(1000); 120];
        let err = npv(dec!(50000), &cfs, dec!(-0.5)).unwrap_err();
        assert!(matches!(err, PropertyRoiError::Overflow { .. }));
    }

    #[test]
    fn test_irr_long_series_with_default_bounds() {
        // NPV at the -50% bound saturates positive; the root is still found
        let cfs = vec![dec!(1000); 120];
        let config = IrrConfig::default();
        let outcome = irr(dec!(50000), &cfs, &config).unwrap();
        assert!(outcome.converged());
        assert!(outcome.rate() > dec!(0.0) && outcome.rate() < dec!(0.05));
        let residual = npv(dec!(50000), &cfs, outcome.rate()).unwrap();
        assert!(residual.abs() < config.tolerance);
    }

    #[test]
    fn test_irr_saturated_lower_bound_with_outflows() {
        // Late outflow dominates at -50%: NPV saturates negative there
        let mut cfs = vec![dec!(0); 119];
        cfs.push(dec!(-1000));
        let outcome = irr(dec!(-100), &cfs, &IrrConfig::default()).unwrap();
        assert!(outcome.converged());
        // (1 + r)^120 = 10
        assert!((outcome.rate() - dec!(0.0194)).abs() < dec!(0.0005));
    }

    #[test]
    fn test_irr_wide_bounds_do_not_overflow_midpoint() {
        let config = IrrConfig {
            lower_bound: dec!(-0.9),
            upper_bound: Decimal::MAX,
            ..IrrConfig::default()
        };
        let outcome = irr(dec!(1000), &[dec!(400), dec!(400), dec!(400)], &config).unwrap();
        assert!(outcome.rate_pct() > Decimal::ZERO);
    }

    #[test]
    fn test_calculate_npv_profitability_index() {
        let input = NpvInput {
            initial_outlay: dec!(100),
            cash_flows: vec![dec!(50), dec!(50), dec!(50)],
            discount_rate: dec!(0),
        };
        let out = calculate_npv(&input).unwrap();
        assert_eq!(out.result.npv, dec!(50));
        assert_eq!(out.result.present_value_of_inflows, dec!(150));
        assert_eq!(out.result.profitability_index, dec!(1.5));
    }

    #[test]
    fn test_calculate_irr_reports_unbracketed() {
        let input: IrrInput =
            serde_json::from_str(r#"{"initial_outlay": "0", "cash_flows": ["100", "100"]}"#).unwrap();
        assert_eq!(input.config, IrrConfig::default());
        let out = calculate_irr(&input).unwrap();
        assert!(!out.result.converged);
        assert_eq!(out.warnings.len(), 1);
    }
}
