use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.05 = 5%). Never as percentages.
pub type Rate = Decimal;

/// Multiples and coverage ratios (e.g., 1.25x DSCR)
pub type Multiple = Decimal;

/// Year fractions or counts
pub type Years = Decimal;

/// Local market direction, ordered from weakest to strongest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketCondition {
    Declining,
    Cooling,
    #[default]
    Stable,
    Growing,
    Hot,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PropertyType {
    #[default]
    SingleFamily,
    Condo,
    Townhouse,
    Duplex,
    Triplex,
    Fourplex,
    Apartment,
    Commercial,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    Urban,
    #[default]
    Suburban,
    Rural,
}

/// One year of a projected holding period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowEntry {
    /// 1-based year index
    pub period: u32,
    pub amount: Money,
    /// True only for the final year, which carries the exit proceeds
    pub is_terminal: bool,
}

/// Year-indexed net cash flows for a holding period.
///
/// Periods are contiguous from 1 and the last entry is terminal: its
/// amount already includes `exit_proceeds`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowSeries {
    pub entries: Vec<CashFlowEntry>,
    /// Sale proceeds folded into the terminal entry
    pub exit_proceeds: Money,
}

impl CashFlowSeries {
    /// Amounts in period order, ready for discounting.
    pub fn amounts(&self) -> Vec<Money> {
        self.entries.iter().map(|e| e.amount).collect()
    }

    pub fn terminal(&self) -> Option<&CashFlowEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all entries including the exit, or `None` past the Decimal
    /// range.
    pub fn total(&self) -> Option<Money> {
        self.entries
            .iter()
            .try_fold(Decimal::ZERO, |acc, e| acc.checked_add(e.amount))
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
