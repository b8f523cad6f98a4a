//! True time-weighted rate of return.
//!
//! Links daily sub-period returns geometrically so that external cash flows
//! drop out of the result: each day's net flow is backed out of that day's
//! closing value before the period return is taken, so a deposit or
//! withdrawal with no market movement yields a flat period.

use chrono::NaiveDate;
use rust_decimal::{Decimal, MathematicalOps};
use serde::{Deserialize, Serialize};

use crate::activities::ValuationPoint;
use crate::constants::{DAYS_PER_YEAR, DECIMAL_PRECISION};
use crate::utils::decimal_serde::*;

/// Cumulative return as of a date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnData {
    pub date: NaiveDate,
    #[serde(with = "decimal_serde")]
    pub value: Decimal,
}

/// Time-weighted return over a valuation series.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TwrResult {
    #[serde(with = "decimal_serde")]
    pub ttwror: Decimal,
    #[serde(with = "decimal_serde")]
    pub ttwror_annualized: Decimal,
    /// Per-day cumulative return series, starting at zero.
    pub returns: Vec<ReturnData>,
    /// Raw sub-period returns, one per valuation pair.
    #[serde(skip)]
    pub period_returns: Vec<Decimal>,
}

impl TwrResult {
    pub fn empty() -> Self {
        TwrResult {
            ttwror: Decimal::ZERO,
            ttwror_annualized: Decimal::ZERO,
            returns: Vec::new(),
            period_returns: Vec::new(),
        }
    }
}

/// Computes the cash-flow-neutral geometric return over daily valuations.
/// Fewer than two points yields the all-zero result.
pub fn calculate_twr(points: &[ValuationPoint]) -> TwrResult {
    if points.len() < 2 {
        return TwrResult::empty();
    }

    let mut sorted: Vec<&ValuationPoint> = points.iter().collect();
    sorted.sort_by_key(|p| p.date);

    let first = sorted[0];
    let last = sorted[sorted.len() - 1];

    let mut returns = Vec::with_capacity(sorted.len());
    let mut period_returns = Vec::with_capacity(sorted.len() - 1);
    let mut cumulative = Decimal::ONE;

    returns.push(ReturnData {
        date: first.date,
        value: Decimal::ZERO,
    });

    for window in sorted.windows(2) {
        let prev = window[0];
        let curr = window[1];

        // The day's net flow is part of the recorded closing value; strip it
        // so only market movement remains in the ratio.
        let flow = curr.external_flow();

        let denominator = prev.total_value;
        let period_return = if denominator <= Decimal::ZERO {
            Decimal::ZERO
        } else {
            (curr.total_value - flow) / denominator - Decimal::ONE
        };

        period_returns.push(period_return);
        cumulative *= Decimal::ONE + period_return;

        returns.push(ReturnData {
            date: curr.date,
            value: (cumulative - Decimal::ONE).round_dp(DECIMAL_PRECISION),
        });
    }

    let ttwror = cumulative - Decimal::ONE;
    let days = last.date.signed_duration_since(first.date).num_days();
    let ttwror_annualized = annualize(ttwror, days);

    TwrResult {
        ttwror: ttwror.round_dp(DECIMAL_PRECISION),
        ttwror_annualized: ttwror_annualized.round_dp(DECIMAL_PRECISION),
        returns,
        period_returns,
    }
}

/// (1 + r)^(365/days) - 1, capped at -100% when the base is non-positive.
fn annualize(total_return: Decimal, days: i64) -> Decimal {
    if days <= 0 {
        return total_return;
    }
    let base = Decimal::ONE + total_return;
    if base <= Decimal::ZERO {
        return Decimal::NEGATIVE_ONE;
    }
    let exponent = Decimal::from(DAYS_PER_YEAR) / Decimal::from(days);
    base.powd(exponent) - Decimal::ONE
}
