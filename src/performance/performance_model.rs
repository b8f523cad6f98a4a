//! Combined performance metrics models.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cost_basis::CostBasisSummary;
use crate::utils::decimal_serde::*;

use super::irr::IrrResult;
use super::twr::ReturnData;

/// Portfolio-level performance over a reporting window.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceSummary {
    pub period_start_date: Option<NaiveDate>,
    pub period_end_date: Option<NaiveDate>,
    pub irr: IrrResult,
    #[serde(with = "decimal_serde")]
    pub ttwror: Decimal,
    #[serde(with = "decimal_serde")]
    pub ttwror_annualized: Decimal,
    #[serde(with = "decimal_serde")]
    pub capital_gains: Decimal,
    #[serde(with = "decimal_serde")]
    pub dividends: Decimal,
    #[serde(with = "decimal_serde")]
    pub interest: Decimal,
    #[serde(with = "decimal_serde")]
    pub fees: Decimal,
    #[serde(with = "decimal_serde")]
    pub taxes: Decimal,
    #[serde(with = "decimal_serde")]
    pub absolute_perf: Decimal,
    #[serde(with = "decimal_serde")]
    pub absolute_perf_percent: Decimal,
    #[serde(with = "decimal_serde")]
    pub volatility: Decimal,
    #[serde(with = "decimal_serde")]
    pub max_drawdown: Decimal,
    /// Per-day cumulative time-weighted return series.
    pub returns: Vec<ReturnData>,
}

/// Per-holding performance snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldingPerformance {
    pub symbol: String,
    pub irr: IrrResult,
    pub cost_basis: CostBasisSummary,
    #[serde(with = "decimal_serde")]
    pub realized_gain: Decimal,
    #[serde(with = "decimal_serde")]
    pub dividends: Decimal,
    pub oldest_holding_days: Option<i64>,
    pub is_long_term: bool,
}
