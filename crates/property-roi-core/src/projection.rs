//! Multi-year cash-flow projection with a terminal sale.
//!
//! Year 1 carries the base annual cash flow un-grown; each later year
//! compounds the growth rate once more. The final year also receives the
//! exit proceeds: appreciated value net of selling costs, less the loan
//! balance still owed.

use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::error::PropertyRoiError;
use crate::types::{with_metadata, CashFlowEntry, CashFlowSeries, ComputationOutput, Money, Rate};
use crate::PropertyRoiResult;

/// Longest holding period that is projected year by year
pub const MAX_PROJECTION_YEARS: u32 = 1000;

fn overflow(context: &str) -> PropertyRoiError {
    PropertyRoiError::Overflow {
        context: context.into(),
    }
}

/// Assumptions used to value the sale at the end of the holding period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExitAssumptions {
    pub purchase_price: Money,
    /// Annual appreciation of the property value
    pub appreciation_rate: Rate,
    /// Selling costs as a fraction of the sale price (0.06 = 6%)
    pub selling_cost_rate: Rate,
    /// Debt repaid from the sale proceeds
    pub outstanding_loan_balance: Money,
}

impl ExitAssumptions {
    /// Property value after `holding_years` of compounding appreciation.
    pub fn final_property_value(&self, holding_years: u32) -> PropertyRoiResult<Money> {
        self.appreciation_rate
            .checked_add(Decimal::ONE)
            .and_then(|growth| growth.checked_powu(u64::from(holding_years)))
            .and_then(|factor| self.purchase_price.checked_mul(factor))
            .ok_or_else(|| overflow("final property value"))
    }

    /// Net cash to the investor on sale.
    pub fn exit_proceeds(&self, holding_years: u32) -> PropertyRoiResult<Money> {
        let value = self.final_property_value(holding_years)?;
        Decimal::ONE
            .checked_sub(self.selling_cost_rate)
            .and_then(|kept| value.checked_mul(kept))
            .and_then(|net| net.checked_sub(self.outstanding_loan_balance))
            .ok_or_else(|| overflow("exit proceeds"))
    }
}

/// Project the annual cash flows of a holding period and append the exit.
///
/// A negative base cash flow is a legitimate loss-making property and is
/// projected as-is. Growth that carries a year past the Decimal range fails
/// with `Overflow`.
pub fn project(
    base_annual_cash_flow: Money,
    growth_rate: Rate,
    holding_years: u32,
    exit: &ExitAssumptions,
) -> PropertyRoiResult<CashFlowSeries> {
    if holding_years < 1 {
        return Err(PropertyRoiError::InvalidHorizon {
            field: "holding_years".into(),
            value: i64::from(holding_years),
        });
    }
    if holding_years > MAX_PROJECTION_YEARS {
        return Err(PropertyRoiError::InvalidInput {
            field: "holding_years".into(),
            reason: format!("Projections are limited to {} years", MAX_PROJECTION_YEARS),
        });
    }
    if growth_rate <= -Decimal::ONE {
        return Err(PropertyRoiError::InvalidRate {
            field: "growth_rate".into(),
            rate: growth_rate,
        });
    }
    if exit.appreciation_rate <= -Decimal::ONE {
        return Err(PropertyRoiError::InvalidRate {
            field: "appreciation_rate".into(),
            rate: exit.appreciation_rate,
        });
    }

    let one_plus_g = growth_rate
        .checked_add(Decimal::ONE)
        .ok_or_else(|| overflow("cash flow growth"))?;
    let mut entries = Vec::with_capacity(holding_years as usize);
    let mut amount = base_annual_cash_flow;

    for period in 1..=holding_years {
        if period > 1 {
            amount = amount
                .checked_mul(one_plus_g)
                .ok_or_else(|| overflow(&format!("projected cash flow for year {}", period)))?;
        }
        entries.push(CashFlowEntry {
            period,
            amount,
            is_terminal: period == holding_years,
        });
    }

    let exit_proceeds = exit.exit_proceeds(holding_years)?;
    if let Some(last) = entries.last_mut() {
        last.amount = last
            .amount
            .checked_add(exit_proceeds)
            .ok_or_else(|| overflow("terminal year cash flow"))?;
    }

    debug!(
        holding_years,
        %base_annual_cash_flow,
        %exit_proceeds,
        "projected holding period cash flows"
    );

    Ok(CashFlowSeries {
        entries,
        exit_proceeds,
    })
}

// ---------------------------------------------------------------------------
// Standalone projection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionInput {
    pub base_annual_cash_flow: Money,
    pub growth_rate: Rate,
    pub holding_years: u32,
    pub exit: ExitAssumptions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionOutput {
    pub final_property_value: Money,
    pub series: CashFlowSeries,
    /// Sum of every projected amount, exit included
    pub total_cash_returned: Money,
}

pub fn project_cash_flows(input: &ProjectionInput) -> PropertyRoiResult<ComputationOutput<ProjectionOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let series = project(
        input.base_annual_cash_flow,
        input.growth_rate,
        input.holding_years,
        &input.exit,
    )?;

    if input.base_annual_cash_flow < Decimal::ZERO {
        warnings.push("Negative base cash flow: the property loses money each year".into());
    }
    if series.exit_proceeds < Decimal::ZERO {
        warnings.push(format!(
            "Exit proceeds {} are negative: sale does not repay the loan",
            series.exit_proceeds.round_dp(2)
        ));
    }

    let output = ProjectionOutput {
        final_property_value: input.exit.final_property_value(input.holding_years)?,
        total_cash_returned: series.total().ok_or_else(|| overflow("total cash returned"))?,
        series,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Compound-growth annual cash flows with terminal sale proceeds",
        input,
        warnings,
        elapsed,
        output,
    ))
}
