//! Performance facade.
//!
//! Composes the IRR solver, the TWR accumulator, and the lot ledger into
//! per-portfolio and per-holding metrics. The calculator is stateless; the
//! ledger it builds lives for one call and is dropped with the result.

use chrono::NaiveDate;
use log::warn;
use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;

use crate::activities::{Activity, ActivityType, CashFlow, ValuationPoint};
use crate::constants::{DECIMAL_PRECISION, LONG_TERM_THRESHOLD_DAYS};
use crate::cost_basis::LotLedger;
use crate::errors::{CalculatorError, Result, ValidationError};

use super::irr::{calculate_irr, IrrResult};
use super::performance_model::{HoldingPerformance, PerformanceSummary};
use super::twr::calculate_twr;

const TRADING_DAYS_PER_YEAR: u32 = 252;
const SQRT_TRADING_DAYS_APPROX: Decimal = dec!(15.874507866); // sqrt(252)

/// Stateless calculator over materialized activity and valuation streams.
#[derive(Debug, Default, Clone)]
pub struct PerformanceCalculator {}

impl PerformanceCalculator {
    pub fn new() -> Self {
        PerformanceCalculator {}
    }

    /// Combined portfolio metrics over `[start, end]`.
    ///
    /// Degenerate input (no valuations, zero values) produces the zero
    /// result rather than an error; only an inverted window is rejected.
    pub fn portfolio_performance(
        &self,
        activities: &[Activity],
        valuations: &[ValuationPoint],
        start: NaiveDate,
        end: NaiveDate,
        current_value: Decimal,
    ) -> Result<PerformanceSummary> {
        if start > end {
            return Err(ValidationError::InvalidInput(
                "Start date must be before end date".to_string(),
            )
            .into());
        }

        let mut window_activities: Vec<&Activity> = activities
            .iter()
            .filter(|a| a.date >= start && a.date <= end)
            .collect();
        window_activities.sort_by_key(|a| a.date);

        let mut points: Vec<ValuationPoint> = valuations
            .iter()
            .filter(|v| v.date >= start && v.date <= end)
            .cloned()
            .collect();
        points.sort_by_key(|v| v.date);

        if points.iter().any(|p| p.total_value.is_sign_negative()) {
            return Err(CalculatorError::Calculation(
                "Negative total value found in valuation history".to_string(),
            )
            .into());
        }

        let twr = calculate_twr(&points);

        let irr = self.portfolio_irr(&points, current_value, end);

        let (capital_gains, dividends, interest, fees, taxes) =
            self.replay_activities(&window_activities);

        let (absolute_perf, absolute_perf_percent) =
            self.absolute_performance(&points, current_value);

        let volatility = Self::calculate_volatility(&twr.period_returns);
        let max_drawdown = Self::calculate_max_drawdown(&twr.period_returns);

        Ok(PerformanceSummary {
            period_start_date: points.first().map(|p| p.date),
            period_end_date: points.last().map(|p| p.date),
            irr,
            ttwror: twr.ttwror,
            ttwror_annualized: twr.ttwror_annualized,
            capital_gains: capital_gains.round_dp(DECIMAL_PRECISION),
            dividends: dividends.round_dp(DECIMAL_PRECISION),
            interest: interest.round_dp(DECIMAL_PRECISION),
            fees: fees.round_dp(DECIMAL_PRECISION),
            taxes: taxes.round_dp(DECIMAL_PRECISION),
            absolute_perf: absolute_perf.round_dp(DECIMAL_PRECISION),
            absolute_perf_percent: absolute_perf_percent.round_dp(DECIMAL_PRECISION),
            volatility: volatility.round_dp(DECIMAL_PRECISION),
            max_drawdown: max_drawdown.round_dp(DECIMAL_PRECISION),
            returns: twr.returns,
        })
    }

    /// Money-weighted return, cost basis, and holding-period flag for one
    /// symbol's activity history.
    pub fn holding_performance(
        &self,
        symbol: &str,
        activities: &[Activity],
        current_price: Decimal,
        end: NaiveDate,
    ) -> Result<HoldingPerformance> {
        let mut symbol_activities: Vec<&Activity> = activities
            .iter()
            .filter(|a| a.symbol.as_deref() == Some(symbol) && a.date <= end)
            .collect();
        symbol_activities.sort_by_key(|a| a.date);

        let mut ledger = LotLedger::new();
        let mut realized_gain = Decimal::ZERO;
        let mut dividends = Decimal::ZERO;
        let mut flows: Vec<CashFlow> = Vec::new();

        for activity in &symbol_activities {
            match activity.activity_type {
                ActivityType::Buy => {
                    ledger.add_purchase(
                        symbol,
                        activity.date,
                        activity.quantity,
                        activity.total_value() + activity.fee,
                        activity.fee,
                    );
                }
                ActivityType::Sell => {
                    let sale = ledger.process_sale(
                        symbol,
                        activity.quantity,
                        activity.unit_price,
                        activity.date,
                    );
                    realized_gain += sale.realized_gain;
                }
                ActivityType::Dividend => {
                    dividends += activity.total_value();
                }
                _ => {}
            }
            if let Some(flow) = CashFlow::from_activity(activity) {
                flows.push(flow);
            }
        }

        let cost_basis = ledger.summary(symbol, current_price);
        let terminal_value = cost_basis.current_value;
        let irr = calculate_irr(&flows, terminal_value, end);

        let oldest_holding_days = ledger.oldest_holding_days(symbol, end);
        let is_long_term = ledger.is_long_term(symbol, end, LONG_TERM_THRESHOLD_DAYS);

        Ok(HoldingPerformance {
            symbol: symbol.to_string(),
            irr,
            cost_basis,
            realized_gain: realized_gain.round_dp(DECIMAL_PRECISION),
            dividends: dividends.round_dp(DECIMAL_PRECISION),
            oldest_holding_days,
            is_long_term,
        })
    }

    /// External flows for the portfolio-level money-weighted return: the
    /// opening value counts as the initial buy-in, then each day's deposits
    /// and withdrawals, with the current value as terminal inflow.
    fn portfolio_irr(
        &self,
        points: &[ValuationPoint],
        current_value: Decimal,
        end: NaiveDate,
    ) -> IrrResult {
        let first = match points.first() {
            Some(first) => first,
            None => return IrrResult::empty(),
        };

        let mut flows = Vec::with_capacity(points.len() + 1);
        if !first.total_value.is_zero() {
            flows.push(CashFlow::deposit(first.date, first.total_value));
        }
        for point in points.iter().skip(1) {
            if !point.deposits.is_zero() {
                flows.push(CashFlow::deposit(point.date, point.deposits));
            }
            if !point.withdrawals.is_zero() {
                flows.push(CashFlow::withdrawal(point.date, point.withdrawals));
            }
        }

        calculate_irr(&flows, current_value, end)
    }

    /// Replays buys and sells through a fresh ledger for realized gains and
    /// sums the income and cost channels.
    fn replay_activities(
        &self,
        activities: &[&Activity],
    ) -> (Decimal, Decimal, Decimal, Decimal, Decimal) {
        let mut ledger = LotLedger::new();
        let mut capital_gains = Decimal::ZERO;
        let mut dividends = Decimal::ZERO;
        let mut interest = Decimal::ZERO;
        let mut fees = Decimal::ZERO;
        let mut taxes = Decimal::ZERO;

        for activity in activities {
            taxes += activity.tax;
            match activity.activity_type {
                ActivityType::Buy => {
                    fees += activity.fee;
                    if let Some(symbol) = activity.symbol.as_deref() {
                        ledger.add_purchase(
                            symbol,
                            activity.date,
                            activity.quantity,
                            activity.total_value() + activity.fee,
                            activity.fee,
                        );
                    } else {
                        warn!("BUY activity {} has no symbol; skipping lot", activity.id);
                    }
                }
                ActivityType::Sell => {
                    fees += activity.fee;
                    if let Some(symbol) = activity.symbol.as_deref() {
                        let sale = ledger.process_sale(
                            symbol,
                            activity.quantity,
                            activity.unit_price,
                            activity.date,
                        );
                        capital_gains += sale.realized_gain;
                    } else {
                        warn!("SELL activity {} has no symbol; skipping lot", activity.id);
                    }
                }
                ActivityType::Dividend => {
                    fees += activity.fee;
                    dividends += activity.total_value();
                }
                ActivityType::Interest => {
                    fees += activity.fee;
                    interest += activity.total_value();
                }
                ActivityType::Fee => {
                    fees += if activity.fee.is_zero() {
                        activity.total_value()
                    } else {
                        activity.fee
                    };
                }
                ActivityType::Item | ActivityType::Liability => {}
            }
        }

        (capital_gains, dividends, interest, fees, taxes)
    }

    /// Gain over the window net of external flows, and its percentage of
    /// the opening value.
    fn absolute_performance(
        &self,
        points: &[ValuationPoint],
        current_value: Decimal,
    ) -> (Decimal, Decimal) {
        let first = match points.first() {
            Some(first) => first,
            None => return (Decimal::ZERO, Decimal::ZERO),
        };

        let net_external_flow: Decimal =
            points.iter().skip(1).map(|p| p.external_flow()).sum();
        let absolute_perf = current_value - first.total_value - net_external_flow;
        let absolute_perf_percent = if first.total_value.is_zero() {
            Decimal::ZERO
        } else {
            absolute_perf / first.total_value * Decimal::ONE_HUNDRED
        };

        (absolute_perf, absolute_perf_percent)
    }

    fn calculate_volatility(period_returns: &[Decimal]) -> Decimal {
        if period_returns.len() < 2 {
            return Decimal::ZERO;
        }

        let count = Decimal::from(period_returns.len());
        let sum: Decimal = period_returns.iter().sum();
        let mean = sum / count;

        let sum_squared_diff: Decimal = period_returns
            .iter()
            .map(|&r| {
                let diff = r - mean;
                diff * diff
            })
            .sum();

        let variance = sum_squared_diff / (count - Decimal::ONE);
        if variance.is_sign_negative() {
            return Decimal::ZERO;
        }

        let daily_volatility = variance.sqrt().unwrap_or(Decimal::ZERO);
        let annualization_factor = Decimal::from(TRADING_DAYS_PER_YEAR)
            .sqrt()
            .unwrap_or(SQRT_TRADING_DAYS_APPROX);

        daily_volatility * annualization_factor
    }

    fn calculate_max_drawdown(period_returns: &[Decimal]) -> Decimal {
        if period_returns.is_empty() {
            return Decimal::ZERO;
        }

        let mut cumulative_value = Decimal::ONE;
        let mut peak_value = Decimal::ONE;
        let mut max_drawdown = Decimal::ZERO;

        for &period_return in period_returns {
            cumulative_value *= Decimal::ONE + period_return;
            peak_value = peak_value.max(cumulative_value);
            if peak_value.is_zero() {
                max_drawdown = max_drawdown.max(Decimal::ONE);
            } else {
                let drawdown = (peak_value - cumulative_value) / peak_value;
                max_drawdown = max_drawdown.max(drawdown);
            }
        }

        max_drawdown.max(Decimal::ZERO)
    }
}
