//! Activity and valuation domain models.
//!
//! Activities are append-only observations of financial events; the engine
//! never mutates them. Daily valuations carry the external deposit and
//! withdrawal flows that performance calculations must neutralize.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::utils::decimal_serde::*;

/// Observed financial event type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityType {
    Buy,
    Sell,
    Dividend,
    Interest,
    Fee,
    Item,
    Liability,
}

impl ActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::Buy => "BUY",
            ActivityType::Sell => "SELL",
            ActivityType::Dividend => "DIVIDEND",
            ActivityType::Interest => "INTEREST",
            ActivityType::Fee => "FEE",
            ActivityType::Item => "ITEM",
            ActivityType::Liability => "LIABILITY",
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ActivityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BUY" => Ok(ActivityType::Buy),
            "SELL" => Ok(ActivityType::Sell),
            "DIVIDEND" => Ok(ActivityType::Dividend),
            "INTEREST" => Ok(ActivityType::Interest),
            "FEE" => Ok(ActivityType::Fee),
            "ITEM" => Ok(ActivityType::Item),
            "LIABILITY" => Ok(ActivityType::Liability),
            _ => Err(format!("Unknown activity type: {}", s)),
        }
    }
}

/// An observed financial event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: String,
    pub date: NaiveDate,
    pub activity_type: ActivityType,
    pub symbol: Option<String>,
    #[serde(with = "decimal_serde")]
    pub quantity: Decimal,
    #[serde(with = "decimal_serde")]
    pub unit_price: Decimal,
    #[serde(with = "decimal_serde")]
    pub fee: Decimal,
    #[serde(with = "decimal_serde")]
    pub tax: Decimal,
    /// Optional value override; when absent the value is quantity x unit_price.
    #[serde(default)]
    #[serde(with = "decimal_serde_option")]
    pub amount: Option<Decimal>,
}

impl Activity {
    /// Resolved monetary value of the event, before fees and taxes.
    pub fn total_value(&self) -> Decimal {
        self.amount.unwrap_or(self.quantity * self.unit_price)
    }
}

/// Daily portfolio snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuationPoint {
    pub date: NaiveDate,
    #[serde(with = "decimal_serde")]
    pub total_value: Decimal,
    #[serde(with = "decimal_serde")]
    pub deposits: Decimal,
    #[serde(with = "decimal_serde")]
    pub withdrawals: Decimal,
}

impl ValuationPoint {
    /// Net external flow for the day. Positive means money entered the
    /// portfolio, negative means money left it.
    pub fn external_flow(&self) -> Decimal {
        self.deposits - self.withdrawals
    }
}

/// Tag describing where a cash flow came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CashFlowType {
    Buy,
    Sell,
    Dividend,
    Interest,
    Fee,
    Deposit,
    Withdrawal,
    TerminalValue,
}

/// A dated, signed cash flow from the investor's point of view.
///
/// Negative amounts are money the investor put in (buys, fees, deposits);
/// positive amounts are money the investor got out (sells, dividends,
/// interest, withdrawals).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashFlow {
    pub date: NaiveDate,
    #[serde(with = "decimal_serde")]
    pub amount: Decimal,
    pub flow_type: CashFlowType,
}

impl CashFlow {
    /// Maps an activity to its investor-signed cash flow. ITEM and LIABILITY
    /// entries value non-traded positions and carry no cash.
    pub fn from_activity(activity: &Activity) -> Option<CashFlow> {
        let value = activity.total_value();
        match activity.activity_type {
            ActivityType::Buy => Some(CashFlow {
                date: activity.date,
                amount: -(value + activity.fee + activity.tax),
                flow_type: CashFlowType::Buy,
            }),
            ActivityType::Sell => Some(CashFlow {
                date: activity.date,
                amount: value - activity.fee - activity.tax,
                flow_type: CashFlowType::Sell,
            }),
            ActivityType::Dividend => Some(CashFlow {
                date: activity.date,
                amount: value - activity.fee - activity.tax,
                flow_type: CashFlowType::Dividend,
            }),
            ActivityType::Interest => Some(CashFlow {
                date: activity.date,
                amount: value - activity.fee - activity.tax,
                flow_type: CashFlowType::Interest,
            }),
            ActivityType::Fee => {
                let charged = if activity.fee.is_zero() {
                    value
                } else {
                    activity.fee
                };
                Some(CashFlow {
                    date: activity.date,
                    amount: -charged,
                    flow_type: CashFlowType::Fee,
                })
            }
            ActivityType::Item | ActivityType::Liability => None,
        }
    }

    pub fn deposit(date: NaiveDate, amount: Decimal) -> CashFlow {
        CashFlow {
            date,
            amount: -amount,
            flow_type: CashFlowType::Deposit,
        }
    }

    pub fn withdrawal(date: NaiveDate, amount: Decimal) -> CashFlow {
        CashFlow {
            date,
            amount,
            flow_type: CashFlowType::Withdrawal,
        }
    }
}

/// Converts an activity stream into signed cash flows, dropping the
/// non-cash entries.
pub fn cash_flows_from_activities(activities: &[Activity]) -> Vec<CashFlow> {
    activities.iter().filter_map(CashFlow::from_activity).collect()
}
