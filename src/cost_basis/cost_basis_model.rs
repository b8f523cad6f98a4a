//! Lot-level cost basis models.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::QUANTITY_THRESHOLD;
use crate::utils::decimal_serde::*;

/// Quantities below this threshold are treated as zero.
pub fn is_quantity_significant(quantity: &Decimal) -> bool {
    let threshold =
        Decimal::from_str_radix(QUANTITY_THRESHOLD, 10).unwrap_or_else(|_| Decimal::new(1, 8));
    quantity.abs() >= threshold
}

/// One acquisition, the unit of FIFO accounting.
///
/// `cost_per_share` is frozen at creation; only `remaining_shares` ever
/// changes, and it only decreases. Fully consumed lots are retained for
/// audit and excluded from active totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseLot {
    pub id: String,
    pub date: NaiveDate,
    #[serde(with = "decimal_serde")]
    pub shares: Decimal,
    #[serde(with = "decimal_serde")]
    pub cost_per_share: Decimal,
    #[serde(with = "decimal_serde")]
    pub total_cost: Decimal,
    #[serde(with = "decimal_serde")]
    pub remaining_shares: Decimal,
    #[serde(with = "decimal_serde")]
    pub fees: Decimal,
}

impl PurchaseLot {
    pub fn is_active(&self) -> bool {
        is_quantity_significant(&self.remaining_shares)
    }
}

/// Record of shares consumed from a single lot during a sale or transfer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LotConsumed {
    pub lot_id: String,
    pub lot_date: NaiveDate,
    #[serde(with = "decimal_serde")]
    pub shares: Decimal,
    #[serde(with = "decimal_serde")]
    pub cost_basis: Decimal,
}

/// Outcome of a FIFO sale.
///
/// `shares_sold` may be below `shares_requested` when the ledger held fewer
/// shares than the sale asked for; the ledger never goes negative.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleResult {
    pub security_id: String,
    pub sale_date: NaiveDate,
    #[serde(with = "decimal_serde")]
    pub shares_requested: Decimal,
    #[serde(with = "decimal_serde")]
    pub shares_sold: Decimal,
    #[serde(with = "decimal_serde")]
    pub total_cost_basis: Decimal,
    #[serde(with = "decimal_serde")]
    pub total_proceeds: Decimal,
    #[serde(with = "decimal_serde")]
    pub realized_gain: Decimal,
    #[serde(with = "decimal_serde")]
    pub realized_gain_percent: Decimal,
    pub lots_used: Vec<LotConsumed>,
}

/// A lot slice produced by a transfer. The acquisition date is preserved
/// from the source lot so holding-period semantics survive the move; fees
/// travel proportionally. Installing these in the destination ledger is the
/// caller's responsibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferredLot {
    pub source_lot_id: String,
    pub date: NaiveDate,
    #[serde(with = "decimal_serde")]
    pub shares: Decimal,
    #[serde(with = "decimal_serde")]
    pub cost_per_share: Decimal,
    #[serde(with = "decimal_serde")]
    pub total_cost: Decimal,
    #[serde(with = "decimal_serde")]
    pub fees: Decimal,
}

/// Aggregate view over the active lots of one security.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostBasisSummary {
    pub security_id: String,
    #[serde(with = "decimal_serde")]
    pub total_shares: Decimal,
    #[serde(with = "decimal_serde")]
    pub total_cost_basis: Decimal,
    #[serde(with = "decimal_serde")]
    pub average_cost: Decimal,
    #[serde(with = "decimal_serde")]
    pub current_value: Decimal,
    #[serde(with = "decimal_serde")]
    pub unrealized_gain: Decimal,
    #[serde(with = "decimal_serde")]
    pub unrealized_gain_percent: Decimal,
}
