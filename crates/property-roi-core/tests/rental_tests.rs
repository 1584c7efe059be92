use pretty_assertions::assert_eq;
use property_roi_core::rental::{self, ExitLoanBalance, RentalPropertyInput};
use property_roi_core::scoring::{RecommendationTier, INVESTMENT_CASH_ON_CASH};
use property_roi_core::time_value::IrrOutcome;
use property_roi_core::{MarketCondition, PropertyRoiError};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn typical_rental() -> RentalPropertyInput {
    RentalPropertyInput {
        purchase_price: Some(dec!(300000)),
        down_payment: Some(dec!(60000)),
        closing_costs: Some(dec!(9000)),
        loan_amount: Some(dec!(240000)),
        interest_rate: Some(dec!(0.065)),
        loan_term_years: Some(30),
        monthly_rent: Some(dec!(2500)),
        ..Default::default()
    }
}

// ===========================================================================
// Known-answer scenarios
// ===========================================================================

#[test]
fn test_total_investment_is_cash_in() {
    let out = rental::evaluate(&typical_rental()).unwrap();
    assert_eq!(out.result.total_investment, dec!(69000));
}

#[test]
fn test_mortgage_payment_30yr() {
    let out = rental::evaluate(&typical_rental()).unwrap();
    let pmt = out.result.monthly_mortgage_payment;
    assert!((pmt - dec!(1516.96)).abs() < dec!(1), "got {pmt}");
}

#[test]
fn test_monthly_cash_flow_rent_only() {
    // Rent net of 5% vacancy with no expenses and no debt
    let input = RentalPropertyInput {
        purchase_price: Some(dec!(300000)),
        monthly_rent: Some(dec!(2500)),
        vacancy_rate: Some(dec!(0.05)),
        property_management_rate: Some(dec!(0)),
        loan_amount: None,
        ..Default::default()
    };
    let out = rental::evaluate(&input).unwrap();
    assert_eq!(out.result.monthly_cash_flow, dec!(2375));
    assert_eq!(out.result.annual_cash_flow, dec!(28500));
    assert_eq!(out.result.monthly_mortgage_payment, Decimal::ZERO);
    assert!(out.warnings.iter().any(|w| w.contains("loan_amount")));
}

#[test]
fn test_zero_cash_flow_scores_lowest_positive_bucket() {
    // 1000 rent, no vacancy, 1000 HOA: cash flow is exactly zero
    let input = RentalPropertyInput {
        purchase_price: Some(dec!(200000)),
        down_payment: Some(dec!(200000)),
        monthly_rent: Some(dec!(1000)),
        vacancy_rate: Some(dec!(0)),
        property_management_rate: Some(dec!(0)),
        hoa_fees_monthly: Some(dec!(1000)),
        ..Default::default()
    };
    let out = rental::evaluate(&input).unwrap();
    assert_eq!(out.result.annual_cash_flow, Decimal::ZERO);
    assert_eq!(out.result.cash_on_cash_return, Decimal::ZERO);
    assert_eq!(
        INVESTMENT_CASH_ON_CASH.points(out.result.cash_on_cash_return),
        dec!(5)
    );
    assert_eq!(out.result.payback_period_years, None);
}

#[test]
fn test_single_year_exit_proceeds() {
    let input = RentalPropertyInput {
        holding_period_years: Some(1),
        appreciation_rate: Some(dec!(0.03)),
        selling_cost_rate: Some(dec!(0.06)),
        ..typical_rental()
    };
    let out = rental::evaluate(&input).unwrap();
    // 300000 * 1.03 * 0.94 - 240000
    assert!((out.result.exit_proceeds - dec!(50676)).abs() < dec!(1));
    assert_eq!(out.result.projected_cash_flows.len(), 1);
}

// ===========================================================================
// Cash flow and ratio behaviour
// ===========================================================================

#[test]
fn test_typical_rental_ratios() {
    let r = rental::evaluate(&typical_rental()).unwrap().result;
    // Gross 2375, management 8% = 190, NOI = 2185 * 12 = 26220
    assert_eq!(r.gross_monthly_income, dec!(2375));
    assert_eq!(r.net_operating_income, dec!(26220));
    assert_eq!(r.cap_rate, dec!(0.0874));
    assert!(r.monthly_cash_flow > dec!(660) && r.monthly_cash_flow < dec!(670));
    assert!(r.cash_on_cash_return > dec!(0.11) && r.cash_on_cash_return < dec!(0.12));
    assert!(r.debt_service_coverage > dec!(1.4) && r.debt_service_coverage < dec!(1.5));
    assert_eq!(r.gross_rent_multiplier, dec!(10));
    assert!(r.break_even_occupancy > Decimal::ZERO && r.break_even_occupancy < Decimal::ONE);
    assert!(r.irr_converged);
}

#[test]
fn test_negative_cash_flow_property() {
    let input = RentalPropertyInput {
        monthly_rent: Some(dec!(1200)),
        ..typical_rental()
    };
    let out = rental::evaluate(&input).unwrap();
    let r = &out.result;
    assert!(r.monthly_cash_flow < Decimal::ZERO);
    assert!(r.cash_on_cash_return < Decimal::ZERO);
    assert!(r.scores.investment < dec!(50));
    assert!(r.break_even_occupancy > Decimal::ONE);
    assert!(out.warnings.iter().any(|w| w.contains("Break-even occupancy")));
}

#[test]
fn test_annualized_roi_consistent_with_total() {
    let r = rental::evaluate(&typical_rental()).unwrap().result;
    // (1 + annualized)^10 should reproduce 1 + total
    let mut compounded = Decimal::ONE;
    for _ in 0..10 {
        compounded *= Decimal::ONE + r.annualized_roi;
    }
    assert!(
        (compounded - (Decimal::ONE + r.total_roi)).abs() < dec!(0.0001),
        "compounded {compounded} vs total {}",
        r.total_roi
    );
}

#[test]
fn test_amortized_exit_balance_raises_proceeds() {
    let original = rental::evaluate(&typical_rental()).unwrap().result;
    let mut input = typical_rental();
    input.options.exit_loan_balance = ExitLoanBalance::Amortized;
    let amortized = rental::evaluate(&input).unwrap().result;

    assert!(amortized.exit_proceeds > original.exit_proceeds);
    assert!(amortized.irr > original.irr);
    assert_eq!(amortized.monthly_cash_flow, original.monthly_cash_flow);
}

#[test]
fn test_npv_uses_discount_rate() {
    let low = rental::evaluate(&RentalPropertyInput {
        discount_rate: Some(dec!(0.02)),
        ..typical_rental()
    })
    .unwrap()
    .result;
    let high = rental::evaluate(&RentalPropertyInput {
        discount_rate: Some(dec!(0.10)),
        ..typical_rental()
    })
    .unwrap()
    .result;
    assert!(low.npv > high.npv);
}

// ===========================================================================
// Scores and recommendation
// ===========================================================================

#[test]
fn test_high_risk_inputs() {
    let input = RentalPropertyInput {
        monthly_rent: Some(dec!(1500)),
        vacancy_rate: Some(dec!(0.2)),
        market_condition: Some(MarketCondition::Declining),
        year_built: Some(1950),
        analysis_year: Some(2024),
        ..typical_rental()
    };
    let r = rental::evaluate(&input).unwrap().result;
    assert!(r.scores.risk > dec!(50));
    assert!(r.scores.appreciation < dec!(80));
}

#[test]
fn test_recommendation_follows_custom_tiers() {
    let mut input = typical_rental();
    input.options.tiers.strong_buy = dec!(0);
    let r = rental::evaluate(&input).unwrap().result;
    assert_eq!(r.recommendation, RecommendationTier::StrongBuy);
    assert_eq!(r.recommendation_label, "Strong buy recommendation");
}

#[test]
fn test_scores_bounded() {
    let r = rental::evaluate(&typical_rental()).unwrap().result;
    for s in [r.scores.investment, r.scores.risk, r.scores.cash_flow, r.scores.appreciation] {
        assert!(s >= Decimal::ZERO && s <= dec!(100));
    }
}

// ===========================================================================
// Error policy
// ===========================================================================

#[test]
fn test_permissive_mode_substitutes_zero() {
    let out = rental::evaluate(&RentalPropertyInput::default()).unwrap();
    assert_eq!(out.result.total_investment, Decimal::ZERO);
    assert_eq!(out.result.cap_rate, Decimal::ZERO);
    assert!(out.warnings.len() >= 3);
}

#[test]
fn test_strict_mode_rejects_missing_rent() {
    let mut input = typical_rental();
    input.monthly_rent = None;
    input.options.strict = true;
    let err = rental::evaluate(&input).unwrap_err();
    assert!(matches!(err, PropertyRoiError::InvalidInput { ref field, .. } if field == "monthly_rent"));
}

#[test]
fn test_zero_loan_term_rejected() {
    let input = RentalPropertyInput {
        loan_term_years: Some(0),
        ..typical_rental()
    };
    assert!(matches!(
        rental::evaluate(&input).unwrap_err(),
        PropertyRoiError::InvalidHorizon { .. }
    ));
}

#[test]
fn test_discount_rate_at_minus_one_rejected() {
    let input = RentalPropertyInput {
        discount_rate: Some(dec!(-1)),
        ..typical_rental()
    };
    assert!(matches!(
        rental::evaluate(&input).unwrap_err(),
        PropertyRoiError::InvalidRate { .. }
    ));
}

#[test]
fn test_unbracketed_irr_is_flagged_not_failed() {
    // No cash invested: NPV is positive at every rate in the window
    let input = RentalPropertyInput {
        purchase_price: Some(dec!(300000)),
        monthly_rent: Some(dec!(2500)),
        ..Default::default()
    };
    let out = rental::evaluate(&input).unwrap();
    assert!(!out.result.irr_converged);
    assert!(matches!(out.result.irr_outcome, IrrOutcome::NotBracketed { .. }));
    assert!(out.warnings.iter().any(|w| w.contains("IRR not bracketed")));
}

// ===========================================================================
// Extreme horizons and rates
// ===========================================================================

#[test]
fn test_long_hold_with_steep_appreciation() {
    let input = RentalPropertyInput {
        purchase_price: Some(dec!(500000)),
        appreciation_rate: Some(dec!(0.5)),
        holding_period_years: Some(50),
        ..typical_rental()
    };
    let out = rental::evaluate(&input).unwrap();
    // 500000 * 1.5^50 is roughly 3.2e14 before selling costs
    assert!(out.result.exit_proceeds > dec!(290000000000000));
    assert_eq!(out.result.projected_cash_flows.len(), 50);
    assert!(out.result.irr_converged);
    assert!(out.result.irr > dec!(-0.5) && out.result.irr < dec!(1.0));
}

#[test]
fn test_runaway_rent_growth_is_overflow() {
    let input = RentalPropertyInput {
        rent_growth_rate: Some(dec!(10)),
        holding_period_years: Some(50),
        ..typical_rental()
    };
    assert!(matches!(
        rental::evaluate(&input).unwrap_err(),
        PropertyRoiError::Overflow { .. }
    ));
}

#[test]
fn test_largest_accepted_figures_fail_cleanly() {
    let input = RentalPropertyInput {
        purchase_price: Some(rental::MAX_AMOUNT),
        down_payment: Some(rental::MAX_AMOUNT),
        loan_amount: Some(rental::MAX_AMOUNT),
        interest_rate: Some(dec!(1)),
        monthly_rent: Some(rental::MAX_AMOUNT),
        appreciation_rate: Some(rental::MAX_GROWTH_RATE),
        holding_period_years: Some(50),
        ..typical_rental()
    };
    // 11^50 appreciation is past the Decimal range
    assert!(matches!(
        rental::evaluate(&input).unwrap_err(),
        PropertyRoiError::Overflow { .. }
    ));
}

#[test]
fn test_figures_above_the_limit_rejected() {
    let input = RentalPropertyInput {
        monthly_rent: Some(Decimal::MAX),
        ..typical_rental()
    };
    assert!(matches!(
        rental::evaluate(&input).unwrap_err(),
        PropertyRoiError::InvalidInput { ref field, .. } if field == "monthly_rent"
    ));
}

// ===========================================================================
// Envelope
// ===========================================================================

#[test]
fn test_evaluate_is_idempotent() {
    let first = rental::evaluate(&typical_rental()).unwrap();
    let second = rental::evaluate(&typical_rental()).unwrap();
    assert_eq!(first.result, second.result);
    assert_eq!(first.assumptions, second.assumptions);
    assert_eq!(first.warnings, second.warnings);
}

#[test]
fn test_envelope_echoes_resolved_assumptions() {
    let out = rental::evaluate(&typical_rental()).unwrap();
    assert_eq!(out.assumptions["loan_term_years"], 30);
    assert_eq!(out.assumptions["market_condition"], "stable");
    assert_eq!(out.metadata.precision, "rust_decimal_128bit");
}

#[test]
fn test_input_deserializes_from_json() {
    let json = r#"{
        "purchase_price": "300000",
        "down_payment": "60000",
        "closing_costs": "9000",
        "loan_amount": "240000",
        "interest_rate": "0.065",
        "monthly_rent": "2500",
        "property_type": "single-family",
        "market_condition": "hot",
        "options": { "exit_loan_balance": "amortized" }
    }"#;
    let input: RentalPropertyInput = serde_json::from_str(json).unwrap();
    assert_eq!(input.market_condition, Some(MarketCondition::Hot));
    assert_eq!(input.options.exit_loan_balance, ExitLoanBalance::Amortized);
    assert_eq!(input.options.irr.max_iterations, 100);
    let out = rental::evaluate(&input).unwrap();
    assert_eq!(out.result.total_investment, dec!(69000));
}
