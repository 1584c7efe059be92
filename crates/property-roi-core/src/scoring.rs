//! Composite investment scoring.
//!
//! Four independent 0-100 scores built from bucketed thresholds: investment
//! quality, risk (higher = riskier), cash-flow quality and appreciation
//! potential. Numeric factors map through ordered `(threshold, points)`
//! tables where the first matching row wins; categorical factors map
//! through `match`. All arithmetic uses `rust_decimal::Decimal`.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::types::{with_metadata, ComputationOutput, Location, MarketCondition, Money, Multiple, PropertyType, Rate};

const MAX_SCORE: Decimal = dec!(100);

// ---------------------------------------------------------------------------
// Threshold tables
// ---------------------------------------------------------------------------

/// How a factor value is compared against each row's threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    AtLeast,
    AtMost,
    Above,
    Below,
}

/// Ordered bucket table. Rows are tried top to bottom.
#[derive(Debug, Clone, Copy)]
pub struct ThresholdTable {
    pub comparison: Comparison,
    pub rows: &'static [(Decimal, Decimal)],
    /// Points when no row matches
    pub fallback: Decimal,
}

impl ThresholdTable {
    pub fn points(&self, value: Decimal) -> Decimal {
        self.rows
            .iter()
            .find(|(threshold, _)| match self.comparison {
                Comparison::AtLeast => value >= *threshold,
                Comparison::AtMost => value <= *threshold,
                Comparison::Above => value > *threshold,
                Comparison::Below => value < *threshold,
            })
            .map(|(_, pts)| *pts)
            .unwrap_or(self.fallback)
    }

    /// Highest points any row can award.
    pub fn max_points(&self) -> Decimal {
        self.rows
            .iter()
            .map(|(_, pts)| *pts)
            .fold(self.fallback, Decimal::max)
    }
}

// --- Investment score (30 / 25 / 20 / 15 / 5 / 3 / 2) ---

pub const INVESTMENT_CASH_ON_CASH: ThresholdTable = ThresholdTable {
    comparison: Comparison::AtLeast,
    rows: &[
        (dec!(0.12), dec!(30)),
        (dec!(0.08), dec!(25)),
        (dec!(0.06), dec!(20)),
        (dec!(0.04), dec!(15)),
        (dec!(0.02), dec!(10)),
        (dec!(0), dec!(5)),
    ],
    fallback: dec!(0),
};

pub const INVESTMENT_CAP_RATE: ThresholdTable = ThresholdTable {
    comparison: Comparison::AtLeast,
    rows: &[
        (dec!(0.08), dec!(25)),
        (dec!(0.06), dec!(20)),
        (dec!(0.04), dec!(15)),
        (dec!(0.02), dec!(10)),
        (dec!(0), dec!(5)),
    ],
    fallback: dec!(0),
};

pub const INVESTMENT_DSCR: ThresholdTable = ThresholdTable {
    comparison: Comparison::AtLeast,
    rows: &[
        (dec!(1.5), dec!(20)),
        (dec!(1.3), dec!(15)),
        (dec!(1.2), dec!(10)),
        (dec!(1.1), dec!(5)),
    ],
    fallback: dec!(0),
};

pub const INVESTMENT_VACANCY: ThresholdTable = ThresholdTable {
    comparison: Comparison::AtMost,
    rows: &[
        (dec!(0.03), dec!(15)),
        (dec!(0.05), dec!(12)),
        (dec!(0.08), dec!(8)),
        (dec!(0.12), dec!(4)),
    ],
    fallback: dec!(0),
};

// --- Risk score (25 / 25 / 20 / 15 / 15) ---

pub const RISK_VACANCY: ThresholdTable = ThresholdTable {
    comparison: Comparison::Above,
    rows: &[
        (dec!(0.15), dec!(25)),
        (dec!(0.10), dec!(20)),
        (dec!(0.07), dec!(15)),
        (dec!(0.05), dec!(10)),
        (dec!(0.03), dec!(5)),
    ],
    fallback: dec!(0),
};

pub const RISK_DSCR: ThresholdTable = ThresholdTable {
    comparison: Comparison::Below,
    rows: &[
        (dec!(1.1), dec!(25)),
        (dec!(1.2), dec!(20)),
        (dec!(1.3), dec!(15)),
        (dec!(1.4), dec!(10)),
        (dec!(1.5), dec!(5)),
    ],
    fallback: dec!(0),
};

pub const RISK_PROPERTY_AGE: ThresholdTable = ThresholdTable {
    comparison: Comparison::Above,
    rows: &[
        (dec!(50), dec!(15)),
        (dec!(30), dec!(12)),
        (dec!(20), dec!(8)),
        (dec!(10), dec!(4)),
    ],
    fallback: dec!(0),
};

pub const RISK_CASH_ON_CASH: ThresholdTable = ThresholdTable {
    comparison: Comparison::Below,
    rows: &[
        (dec!(0), dec!(15)),
        (dec!(0.02), dec!(12)),
        (dec!(0.04), dec!(8)),
        (dec!(0.06), dec!(4)),
    ],
    fallback: dec!(0),
};

// --- Cash-flow score (40 / 30 / 20 / 10) ---

pub const CASH_FLOW_CASH_ON_CASH: ThresholdTable = ThresholdTable {
    comparison: Comparison::AtLeast,
    rows: &[
        (dec!(0.12), dec!(40)),
        (dec!(0.08), dec!(35)),
        (dec!(0.06), dec!(30)),
        (dec!(0.04), dec!(25)),
        (dec!(0.02), dec!(20)),
        (dec!(0), dec!(15)),
    ],
    fallback: dec!(0),
};

pub const CASH_FLOW_DSCR: ThresholdTable = ThresholdTable {
    comparison: Comparison::AtLeast,
    rows: &[
        (dec!(1.5), dec!(30)),
        (dec!(1.3), dec!(25)),
        (dec!(1.2), dec!(20)),
        (dec!(1.1), dec!(15)),
        (dec!(1.0), dec!(10)),
    ],
    fallback: dec!(0),
};

/// Monthly cash flow as a fraction of total cash invested.
pub const CASH_FLOW_YIELD: ThresholdTable = ThresholdTable {
    comparison: Comparison::AtLeast,
    rows: &[
        (dec!(0.01), dec!(20)),
        (dec!(0.008), dec!(15)),
        (dec!(0.006), dec!(10)),
        (dec!(0.004), dec!(5)),
    ],
    fallback: dec!(0),
};

pub const CASH_FLOW_STABILITY: ThresholdTable = ThresholdTable {
    comparison: Comparison::Above,
    rows: &[(dec!(0), dec!(10)), (dec!(-500), dec!(5))],
    fallback: dec!(0),
};

// --- Appreciation score (40 / 30 / 20 / 10) ---

pub const APPRECIATION_RATE: ThresholdTable = ThresholdTable {
    comparison: Comparison::AtLeast,
    rows: &[
        (dec!(0.05), dec!(40)),
        (dec!(0.03), dec!(35)),
        (dec!(0.01), dec!(30)),
        (dec!(0), dec!(25)),
        (dec!(-0.02), dec!(20)),
    ],
    fallback: dec!(15),
};

// ---------------------------------------------------------------------------
// Categorical factors
// ---------------------------------------------------------------------------

fn investment_market_points(market: MarketCondition) -> Decimal {
    match market {
        MarketCondition::Hot | MarketCondition::Growing => dec!(5),
        MarketCondition::Stable => dec!(4),
        MarketCondition::Cooling => dec!(2),
        MarketCondition::Declining => dec!(1),
    }
}

fn investment_property_points(property: PropertyType) -> Decimal {
    match property {
        PropertyType::SingleFamily | PropertyType::Duplex => dec!(3),
        PropertyType::Condo | PropertyType::Townhouse => dec!(2),
        _ => Decimal::ZERO,
    }
}

fn investment_location_points(location: Location) -> Decimal {
    match location {
        Location::Suburban | Location::Urban => dec!(2),
        Location::Rural => dec!(1),
    }
}

fn risk_market_points(market: MarketCondition) -> Decimal {
    match market {
        MarketCondition::Declining => dec!(20),
        MarketCondition::Cooling => dec!(15),
        MarketCondition::Stable => dec!(10),
        MarketCondition::Growing => dec!(7),
        MarketCondition::Hot => dec!(5),
    }
}

fn appreciation_market_points(market: MarketCondition) -> Decimal {
    match market {
        MarketCondition::Hot => dec!(30),
        MarketCondition::Growing => dec!(28),
        MarketCondition::Stable => dec!(25),
        MarketCondition::Cooling => dec!(20),
        MarketCondition::Declining => dec!(15),
    }
}

fn appreciation_location_points(location: Location) -> Decimal {
    match location {
        Location::Urban => dec!(20),
        Location::Suburban => dec!(18),
        Location::Rural => dec!(15),
    }
}

fn appreciation_property_points(property: PropertyType) -> Decimal {
    match property {
        PropertyType::SingleFamily | PropertyType::Duplex => dec!(10),
        PropertyType::Condo | PropertyType::Townhouse => dec!(8),
        _ => Decimal::ZERO,
    }
}

// ---------------------------------------------------------------------------
// Input / Output
// ---------------------------------------------------------------------------

/// Ratios and categories the scorers read. All rates are fractions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreFactors {
    pub cash_on_cash_return: Rate,
    pub cap_rate: Rate,
    pub debt_service_coverage: Multiple,
    pub vacancy_rate: Rate,
    pub appreciation_rate: Rate,
    pub monthly_cash_flow: Money,
    pub total_investment: Money,
    #[serde(default)]
    pub market_condition: MarketCondition,
    #[serde(default)]
    pub property_type: PropertyType,
    #[serde(default)]
    pub location: Location,
    /// Unknown age contributes no age risk
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_age_years: Option<u32>,
    pub holding_period_years: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeScores {
    pub investment: Decimal,
    pub risk: Decimal,
    pub cash_flow: Decimal,
    pub appreciation: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationTier {
    StrongBuy,
    Buy,
    Consider,
    Caution,
    NotRecommended,
}

impl RecommendationTier {
    pub fn label(&self) -> &'static str {
        match self {
            RecommendationTier::StrongBuy => "Strong buy recommendation",
            RecommendationTier::Buy => "Buy recommendation",
            RecommendationTier::Consider => "Consider this investment",
            RecommendationTier::Caution => "Proceed with caution",
            RecommendationTier::NotRecommended => "Not recommended",
        }
    }
}

/// Minimum investment score for each tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierThresholds {
    pub strong_buy: Decimal,
    pub buy: Decimal,
    pub consider: Decimal,
    pub caution: Decimal,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            strong_buy: dec!(80),
            buy: dec!(60),
            consider: dec!(40),
            caution: dec!(20),
        }
    }
}

impl TierThresholds {
    pub fn tier(&self, investment_score: Decimal) -> RecommendationTier {
        if investment_score >= self.strong_buy {
            RecommendationTier::StrongBuy
        } else if investment_score >= self.buy {
            RecommendationTier::Buy
        } else if investment_score >= self.consider {
            RecommendationTier::Consider
        } else if investment_score >= self.caution {
            RecommendationTier::Caution
        } else {
            RecommendationTier::NotRecommended
        }
    }
}

// ---------------------------------------------------------------------------
// Scorers
// ---------------------------------------------------------------------------

fn clamp_score(val: Decimal) -> Decimal {
    val.max(Decimal::ZERO).min(MAX_SCORE)
}

/// Investment quality: return, cap rate, coverage, vacancy, market,
/// property type and location.
pub fn investment_score(f: &ScoreFactors) -> Decimal {
    let score = INVESTMENT_CASH_ON_CASH.points(f.cash_on_cash_return)
        + INVESTMENT_CAP_RATE.points(f.cap_rate)
        + INVESTMENT_DSCR.points(f.debt_service_coverage)
        + INVESTMENT_VACANCY.points(f.vacancy_rate)
        + investment_market_points(f.market_condition)
        + investment_property_points(f.property_type)
        + investment_location_points(f.location);
    clamp_score(score)
}

/// Additive risk penalties. Higher is riskier.
pub fn risk_score(f: &ScoreFactors) -> Decimal {
    let age_points = f
        .property_age_years
        .map(|age| RISK_PROPERTY_AGE.points(Decimal::from(age)))
        .unwrap_or(Decimal::ZERO);

    let score = RISK_VACANCY.points(f.vacancy_rate)
        + RISK_DSCR.points(f.debt_service_coverage)
        + risk_market_points(f.market_condition)
        + age_points
        + RISK_CASH_ON_CASH.points(f.cash_on_cash_return);
    clamp_score(score)
}

pub fn cash_flow_score(f: &ScoreFactors) -> Decimal {
    let yield_points = if f.total_investment > Decimal::ZERO {
        // A yield past the Decimal range scores as the extreme of its sign
        let monthly_yield = f.monthly_cash_flow.checked_div(f.total_investment).unwrap_or(
            if f.monthly_cash_flow.is_sign_negative() {
                Decimal::MIN
            } else {
                Decimal::MAX
            },
        );
        CASH_FLOW_YIELD.points(monthly_yield)
    } else {
        Decimal::ZERO
    };

    let score = CASH_FLOW_CASH_ON_CASH.points(f.cash_on_cash_return)
        + CASH_FLOW_DSCR.points(f.debt_service_coverage)
        + yield_points
        + CASH_FLOW_STABILITY.points(f.monthly_cash_flow);
    clamp_score(score)
}

pub fn appreciation_score(f: &ScoreFactors) -> Decimal {
    let score = APPRECIATION_RATE.points(f.appreciation_rate)
        + appreciation_market_points(f.market_condition)
        + appreciation_location_points(f.location)
        + appreciation_property_points(f.property_type);
    clamp_score(score)
}

/// Run all four scorers.
pub fn score_all(f: &ScoreFactors) -> CompositeScores {
    CompositeScores {
        investment: investment_score(f),
        risk: risk_score(f),
        cash_flow: cash_flow_score(f),
        appreciation: appreciation_score(f),
    }
}

// ---------------------------------------------------------------------------
// Standalone scoring
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreInput {
    #[serde(flatten)]
    pub factors: ScoreFactors,
    #[serde(default)]
    pub tiers: TierThresholds,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreOutput {
    pub scores: CompositeScores,
    pub recommendation: RecommendationTier,
    pub recommendation_label: String,
}

/// Score pre-computed factors without running the full evaluation.
pub fn score_investment(input: &ScoreInput) -> ComputationOutput<ScoreOutput> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.factors.property_age_years.is_none() {
        warnings.push("Property age unknown: no age risk applied".into());
    }

    let scores = score_all(&input.factors);
    let recommendation = input.tiers.tier(scores.investment);

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "Bucketed composite scoring: investment, risk, cash flow, appreciation",
        input,
        warnings,
        elapsed,
        ScoreOutput {
            scores,
            recommendation,
            recommendation_label: recommendation.label().to_string(),
        },
    )
}
