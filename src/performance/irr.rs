//! Money-weighted rate of return.
//!
//! Solves for the discount base `x = 1 + r` at which the net present value
//! of the dated cash flows plus the terminal value is zero. All arithmetic
//! in here is `f64`; the decimal/float boundary sits at the entry point and
//! quantities are converted exactly once.

use chrono::NaiveDate;
use log::warn;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::activities::CashFlow;
use crate::constants::DAYS_PER_YEAR;

const MAX_ITERATIONS: u32 = 500;
const CONVERGENCE_TOLERANCE: f64 = 1e-5;
const DERIVATIVE_EPSILON: f64 = 1e-10;
const BISECTION_WIDTH: f64 = 1e-3;
const RATE_BASE_MIN: f64 = 1e-4;
const RATE_BASE_MAX: f64 = 100.0;

/// Result of a money-weighted return calculation.
///
/// `irr` is the rate over the whole holding period; `irr_annualized`
/// converts it to a yearly rate. Both are `None` for empty or all-zero
/// input. A non-converged solve still reports the last iterate so callers
/// can show a best-effort figure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IrrResult {
    pub irr: Option<f64>,
    pub irr_annualized: Option<f64>,
    pub converged: bool,
    pub iterations: u32,
}

impl IrrResult {
    pub fn empty() -> Self {
        IrrResult {
            irr: None,
            irr_annualized: None,
            converged: false,
            iterations: 0,
        }
    }
}

/// Solves the internal rate of return for a set of cash flows and a
/// terminal value observed on `end_date`.
pub fn calculate_irr(cash_flows: &[CashFlow], end_value: Decimal, end_date: NaiveDate) -> IrrResult {
    if cash_flows.is_empty() {
        return IrrResult::empty();
    }

    let end_value_f = end_value.to_f64().unwrap_or(0.0);
    let total_flow: f64 = cash_flows
        .iter()
        .map(|cf| cf.amount.to_f64().unwrap_or(0.0).abs())
        .sum();
    if total_flow == 0.0 && end_value_f == 0.0 {
        return IrrResult::empty();
    }

    let earliest = cash_flows
        .iter()
        .map(|cf| cf.date)
        .min()
        .expect("non-empty cash flows");
    let holding_days = end_date.signed_duration_since(earliest).num_days().max(0);
    let period_days = holding_days.max(1) as f64;

    // Entries as (exponent over the holding period, value); the terminal
    // value joins as a final inflow on end_date.
    let mut entries: Vec<(f64, f64)> = cash_flows
        .iter()
        .map(|cf| {
            let days = cf.date.signed_duration_since(earliest).num_days().max(0) as f64;
            (days / period_days, cf.amount.to_f64().unwrap_or(0.0))
        })
        .collect();
    entries.push((holding_days as f64 / period_days, end_value_f));

    let npv = |x: f64| -> f64 {
        entries
            .iter()
            .map(|(exponent, value)| value * x.powf(-exponent))
            .sum()
    };

    // Bracketed start when the probe points straddle the root, otherwise a
    // fixed seed slightly above break-even.
    let npv_low = npv(RATE_BASE_MIN * 10.0);
    let npv_one = npv(1.0);
    let mut x = if npv_low * npv_one < 0.0 {
        bisect(&npv, RATE_BASE_MIN * 10.0, 1.0)
    } else {
        1.05
    };

    let mut converged = false;
    let mut iterations = 0;
    while iterations < MAX_ITERATIONS {
        iterations += 1;

        let value = npv(x);
        let step = (x.abs() * 1e-6).max(DERIVATIVE_EPSILON);
        let derivative = (npv(x + step) - npv(x - step)) / (2.0 * step);
        if derivative.abs() < DERIVATIVE_EPSILON {
            warn!("IRR solve aborted: flat NPV derivative at x = {}", x);
            break;
        }

        let next = (x - value / derivative).clamp(RATE_BASE_MIN, RATE_BASE_MAX);
        let delta = (next - x).abs();
        x = next;
        if delta < CONVERGENCE_TOLERANCE {
            converged = true;
            break;
        }
    }

    if !converged {
        warn!(
            "IRR did not converge after {} iterations; returning last iterate",
            iterations
        );
    }

    let irr = x - 1.0;
    let irr_annualized = annualize(irr, holding_days);

    IrrResult {
        irr: Some(irr),
        irr_annualized: Some(irr_annualized),
        converged,
        iterations,
    }
}

/// Converts a holding-period rate to a yearly rate. A zero holding period
/// yields zero; a wiped-out position caps at -100%.
fn annualize(rate: f64, holding_days: i64) -> f64 {
    if holding_days == 0 {
        return 0.0;
    }
    let base = 1.0 + rate;
    if base <= 0.0 {
        return -1.0;
    }
    base.powf(f64::from(DAYS_PER_YEAR) / holding_days as f64) - 1.0
}

/// Recursive bisection down to the seed-interval width.
fn bisect(npv: &impl Fn(f64) -> f64, low: f64, high: f64) -> f64 {
    if high - low < BISECTION_WIDTH {
        return (low + high) / 2.0;
    }
    let mid = (low + high) / 2.0;
    if npv(low) * npv(mid) <= 0.0 {
        bisect(npv, low, mid)
    } else {
        bisect(npv, mid, high)
    }
}
