//! FIFO lot ledger.
//!
//! A securities-keyed store of purchase lots. It is a pure in-memory
//! projection: built from the activity stream per analysis call, queried,
//! then dropped. Market data never enters the ledger; callers supply the
//! current price for summaries.

use std::collections::HashMap;

use chrono::NaiveDate;
use log::warn;
use rust_decimal::Decimal;

use crate::constants::ROUNDING_SCALE;

use super::cost_basis_model::{
    is_quantity_significant, CostBasisSummary, LotConsumed, PurchaseLot, SaleResult,
    TransferredLot,
};

#[derive(Debug, Default)]
pub struct LotLedger {
    lots: HashMap<String, Vec<PurchaseLot>>,
    lot_seq: u64,
}

impl LotLedger {
    pub fn new() -> Self {
        LotLedger::default()
    }

    /// Records an acquisition as a new lot. The per-share cost is frozen
    /// here and never recomputed. Non-positive quantities are skipped.
    pub fn add_purchase(
        &mut self,
        security_id: &str,
        date: NaiveDate,
        shares: Decimal,
        total_cost: Decimal,
        fees: Decimal,
    ) {
        if !shares.is_sign_positive() {
            warn!(
                "Skipping purchase of {} with non-positive quantity {}",
                security_id, shares
            );
            return;
        }

        self.lot_seq += 1;
        let lot = PurchaseLot {
            id: format!("LOT-{}-{}", security_id, self.lot_seq),
            date,
            shares,
            cost_per_share: (total_cost / shares).round_dp(ROUNDING_SCALE),
            total_cost,
            remaining_shares: shares,
            fees,
        };

        let lots = self.lots.entry(security_id.to_string()).or_default();
        lots.push(lot);
        lots.sort_by_key(|lot| lot.date); // keep FIFO order
    }

    /// Sells shares oldest-lot-first and reports the realized outcome.
    ///
    /// When the request exceeds what the ledger holds, the excess is dropped
    /// and `shares_sold` reflects the actual reduction.
    pub fn process_sale(
        &mut self,
        security_id: &str,
        shares: Decimal,
        sale_price: Decimal,
        date: NaiveDate,
    ) -> SaleResult {
        let (shares_sold, total_cost_basis, lots_used) = self.consume_fifo(security_id, shares);

        if shares_sold < shares {
            warn!(
                "Sale of {} {} requested but only {} available; clamping",
                shares, security_id, shares_sold
            );
        }

        let total_proceeds = (shares_sold * sale_price).round_dp(ROUNDING_SCALE);
        let realized_gain = total_proceeds - total_cost_basis;
        let realized_gain_percent = if total_cost_basis.is_zero() {
            Decimal::ZERO
        } else {
            (realized_gain / total_cost_basis * Decimal::ONE_HUNDRED).round_dp(ROUNDING_SCALE)
        };

        SaleResult {
            security_id: security_id.to_string(),
            sale_date: date,
            shares_requested: shares,
            shares_sold,
            total_cost_basis,
            total_proceeds,
            realized_gain,
            realized_gain_percent,
            lots_used,
        }
    }

    /// Moves shares out of the ledger, consuming lots FIFO like a sale but
    /// producing lot slices that keep the original acquisition date and a
    /// proportional share of the fees. No gain is realized.
    pub fn process_transfer(
        &mut self,
        security_id: &str,
        shares: Decimal,
        _date: NaiveDate,
    ) -> Vec<TransferredLot> {
        let mut transferred = Vec::new();
        let mut remaining_to_move = shares;

        if !remaining_to_move.is_sign_positive() {
            return transferred;
        }

        if let Some(lots) = self.lots.get_mut(security_id) {
            for lot in lots.iter_mut() {
                if remaining_to_move <= Decimal::ZERO {
                    break;
                }
                if !is_quantity_significant(&lot.remaining_shares) {
                    continue;
                }

                let taken = remaining_to_move.min(lot.remaining_shares);
                lot.remaining_shares -= taken;
                remaining_to_move -= taken;

                transferred.push(TransferredLot {
                    source_lot_id: lot.id.clone(),
                    date: lot.date,
                    shares: taken,
                    cost_per_share: lot.cost_per_share,
                    total_cost: (taken * lot.cost_per_share).round_dp(ROUNDING_SCALE),
                    fees: (lot.fees * taken / lot.shares).round_dp(ROUNDING_SCALE),
                });
            }
        }

        if remaining_to_move.is_sign_positive() && is_quantity_significant(&remaining_to_move) {
            warn!(
                "Transfer of {} {} requested but {} could not be covered by held lots",
                shares, security_id, remaining_to_move
            );
        }

        transferred
    }

    /// Aggregates the active lots of a security at the supplied price.
    pub fn summary(&self, security_id: &str, current_price: Decimal) -> CostBasisSummary {
        let mut total_shares = Decimal::ZERO;
        let mut total_cost_basis = Decimal::ZERO;

        for lot in self.active_lots(security_id) {
            total_shares += lot.remaining_shares;
            total_cost_basis += lot.remaining_shares * lot.cost_per_share;
        }

        let average_cost = if total_shares.is_zero() {
            Decimal::ZERO
        } else {
            (total_cost_basis / total_shares).round_dp(ROUNDING_SCALE)
        };
        let current_value = (total_shares * current_price).round_dp(ROUNDING_SCALE);
        let unrealized_gain = current_value - total_cost_basis;
        let unrealized_gain_percent = if total_cost_basis.is_zero() {
            Decimal::ZERO
        } else {
            (unrealized_gain / total_cost_basis * Decimal::ONE_HUNDRED).round_dp(ROUNDING_SCALE)
        };

        CostBasisSummary {
            security_id: security_id.to_string(),
            total_shares,
            total_cost_basis: total_cost_basis.round_dp(ROUNDING_SCALE),
            average_cost,
            current_value,
            unrealized_gain: unrealized_gain.round_dp(ROUNDING_SCALE),
            unrealized_gain_percent,
        }
    }

    /// Days since the oldest lot that still holds shares, or `None` when the
    /// position is closed.
    pub fn oldest_holding_days(&self, security_id: &str, as_of: NaiveDate) -> Option<i64> {
        self.active_lots(security_id)
            .map(|lot| lot.date)
            .min()
            .map(|oldest| as_of.signed_duration_since(oldest).num_days())
    }

    pub fn is_long_term(&self, security_id: &str, as_of: NaiveDate, threshold_days: i64) -> bool {
        self.oldest_holding_days(security_id, as_of)
            .map(|days| days > threshold_days)
            .unwrap_or(false)
    }

    /// Net shares currently held for a security.
    pub fn total_remaining_shares(&self, security_id: &str) -> Decimal {
        self.active_lots(security_id)
            .map(|lot| lot.remaining_shares)
            .sum()
    }

    /// All lots for a security, consumed ones included, oldest first.
    pub fn lots(&self, security_id: &str) -> &[PurchaseLot] {
        self.lots.get(security_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Security IDs with at least one recorded lot.
    pub fn securities(&self) -> Vec<&str> {
        self.lots.keys().map(String::as_str).collect()
    }

    pub fn clear(&mut self) {
        self.lots.clear();
        self.lot_seq = 0;
    }

    fn active_lots<'a>(&'a self, security_id: &str) -> impl Iterator<Item = &'a PurchaseLot> {
        self.lots
            .get(security_id)
            .into_iter()
            .flatten()
            .filter(|lot| lot.is_active())
    }

    /// FIFO consumption shared by sales and transfers. Returns the shares
    /// actually consumed, their cost basis, and the per-lot breakdown.
    fn consume_fifo(
        &mut self,
        security_id: &str,
        quantity: Decimal,
    ) -> (Decimal, Decimal, Vec<LotConsumed>) {
        let mut consumed_total = Decimal::ZERO;
        let mut cost_basis_total = Decimal::ZERO;
        let mut lots_used = Vec::new();

        if !quantity.is_sign_positive() {
            return (consumed_total, cost_basis_total, lots_used);
        }

        let mut remaining_to_sell = quantity;
        if let Some(lots) = self.lots.get_mut(security_id) {
            for lot in lots.iter_mut() {
                if remaining_to_sell <= Decimal::ZERO {
                    break;
                }
                if !is_quantity_significant(&lot.remaining_shares) {
                    continue;
                }

                let consumed = remaining_to_sell.min(lot.remaining_shares);
                let cost_basis = (consumed * lot.cost_per_share).round_dp(ROUNDING_SCALE);

                lot.remaining_shares -= consumed;
                remaining_to_sell -= consumed;
                consumed_total += consumed;
                cost_basis_total += cost_basis;

                lots_used.push(LotConsumed {
                    lot_id: lot.id.clone(),
                    lot_date: lot.date,
                    shares: consumed,
                    cost_basis,
                });
            }
        }

        (
            consumed_total.round_dp(ROUNDING_SCALE),
            cost_basis_total.round_dp(ROUNDING_SCALE),
            lots_used,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn ledger_with_two_lots() -> LotLedger {
        let mut ledger = LotLedger::new();
        ledger.add_purchase("AAPL", date("2023-01-01"), dec!(10), dec!(1000), dec!(0));
        ledger.add_purchase("AAPL", date("2023-02-01"), dec!(10), dec!(1200), dec!(0));
        ledger
    }

    #[test]
    fn test_fifo_sale_across_two_lots() {
        let mut ledger = ledger_with_two_lots();

        let result = ledger.process_sale("AAPL", dec!(15), dec!(130), date("2023-03-01"));

        assert_eq!(result.shares_sold, dec!(15));
        assert_eq!(result.total_cost_basis, dec!(1600)); // 10*100 + 5*120
        assert_eq!(result.total_proceeds, dec!(1950));
        assert_eq!(result.realized_gain, dec!(350));
        assert_eq!(result.lots_used.len(), 2);
        assert_eq!(result.lots_used[0].shares, dec!(10));
        assert_eq!(result.lots_used[1].shares, dec!(5));
        assert_eq!(ledger.total_remaining_shares("AAPL"), dec!(5));
    }

    #[test]
    fn test_sale_is_clamped_to_available_shares() {
        let mut ledger = ledger_with_two_lots();

        let result = ledger.process_sale("AAPL", dec!(50), dec!(130), date("2023-03-01"));

        assert_eq!(result.shares_requested, dec!(50));
        assert_eq!(result.shares_sold, dec!(20));
        assert_eq!(ledger.total_remaining_shares("AAPL"), Decimal::ZERO);
        // consumed lots are retained for audit
        assert_eq!(ledger.lots("AAPL").len(), 2);
    }

    #[test]
    fn test_sale_of_unknown_security_sells_nothing() {
        let mut ledger = LotLedger::new();
        let result = ledger.process_sale("MSFT", dec!(5), dec!(100), date("2023-03-01"));
        assert_eq!(result.shares_sold, Decimal::ZERO);
        assert_eq!(result.realized_gain, Decimal::ZERO);
        assert_eq!(result.realized_gain_percent, Decimal::ZERO);
        assert!(result.lots_used.is_empty());
    }

    #[test]
    fn test_cost_per_share_is_frozen_after_partial_sale() {
        let mut ledger = ledger_with_two_lots();
        ledger.process_sale("AAPL", dec!(12), dec!(130), date("2023-03-01"));

        let lots = ledger.lots("AAPL");
        assert_eq!(lots[0].cost_per_share, dec!(100));
        assert_eq!(lots[0].remaining_shares, Decimal::ZERO);
        assert_eq!(lots[1].cost_per_share, dec!(120));
        assert_eq!(lots[1].remaining_shares, dec!(8));
    }

    #[test]
    fn test_transfer_preserves_acquisition_date_and_splits_fees() {
        let mut ledger = LotLedger::new();
        ledger.add_purchase("VTI", date("2022-06-01"), dec!(10), dec!(2010), dec!(10));

        let moved = ledger.process_transfer("VTI", dec!(4), date("2023-06-01"));

        assert_eq!(moved.len(), 1);
        assert_eq!(moved[0].date, date("2022-06-01"));
        assert_eq!(moved[0].shares, dec!(4));
        assert_eq!(moved[0].cost_per_share, dec!(201));
        assert_eq!(moved[0].fees, dec!(4)); // 10 * 4/10
        assert_eq!(ledger.total_remaining_shares("VTI"), dec!(6));
    }

    #[test]
    fn test_summary_over_active_lots_only() {
        let mut ledger = ledger_with_two_lots();
        ledger.process_sale("AAPL", dec!(10), dec!(130), date("2023-03-01"));

        let summary = ledger.summary("AAPL", dec!(150));
        assert_eq!(summary.total_shares, dec!(10));
        assert_eq!(summary.total_cost_basis, dec!(1200));
        assert_eq!(summary.average_cost, dec!(120));
        assert_eq!(summary.current_value, dec!(1500));
        assert_eq!(summary.unrealized_gain, dec!(300));
        assert_eq!(summary.unrealized_gain_percent, dec!(25));
    }

    #[test]
    fn test_summary_of_empty_security_is_zero() {
        let ledger = LotLedger::new();
        let summary = ledger.summary("NONE", dec!(10));
        assert_eq!(summary.total_shares, Decimal::ZERO);
        assert_eq!(summary.average_cost, Decimal::ZERO);
        assert_eq!(summary.unrealized_gain, Decimal::ZERO);
    }

    #[test]
    fn test_oldest_holding_days_skips_consumed_lots() {
        let mut ledger = ledger_with_two_lots();
        assert_eq!(
            ledger.oldest_holding_days("AAPL", date("2023-03-01")),
            Some(59)
        );

        // consume the first lot entirely; the clock restarts at lot two
        ledger.process_sale("AAPL", dec!(10), dec!(130), date("2023-03-01"));
        assert_eq!(
            ledger.oldest_holding_days("AAPL", date("2023-03-01")),
            Some(28)
        );

        ledger.process_sale("AAPL", dec!(10), dec!(130), date("2023-03-02"));
        assert_eq!(ledger.oldest_holding_days("AAPL", date("2023-03-02")), None);
    }

    #[test]
    fn test_is_long_term_uses_strict_threshold() {
        let mut ledger = LotLedger::new();
        ledger.add_purchase("VTI", date("2022-01-01"), dec!(1), dec!(100), dec!(0));

        assert!(!ledger.is_long_term("VTI", date("2023-01-01"), 365));
        assert!(ledger.is_long_term("VTI", date("2023-01-02"), 365));
        assert!(!ledger.is_long_term("MISSING", date("2023-01-02"), 365));
    }

    #[test]
    fn test_replaying_the_same_stream_gives_equal_summaries() {
        let build = || {
            let mut ledger = LotLedger::new();
            ledger.add_purchase("AAPL", date("2023-01-01"), dec!(10), dec!(1000), dec!(5));
            ledger.add_purchase("AAPL", date("2023-02-01"), dec!(10), dec!(1200), dec!(5));
            ledger.process_sale("AAPL", dec!(7), dec!(125), date("2023-02-15"));
            ledger.process_transfer("AAPL", dec!(3), date("2023-03-01"));
            ledger.summary("AAPL", dec!(140))
        };
        assert_eq!(build(), build());
    }

    #[test]
    fn test_sell_all_then_rebuy_has_zero_unrealized_gain() {
        let mut ledger = LotLedger::new();
        ledger.add_purchase("AAPL", date("2023-01-01"), dec!(10), dec!(1000), dec!(0));
        ledger.process_sale("AAPL", dec!(10), dec!(100), date("2023-02-01"));
        ledger.add_purchase("AAPL", date("2023-02-01"), dec!(10), dec!(1000), dec!(0));

        let summary = ledger.summary("AAPL", dec!(100));
        assert_eq!(summary.unrealized_gain, Decimal::ZERO);
    }

    #[test]
    fn test_out_of_order_purchases_are_consumed_by_date() {
        let mut ledger = LotLedger::new();
        ledger.add_purchase("AAPL", date("2023-02-01"), dec!(10), dec!(1200), dec!(0));
        ledger.add_purchase("AAPL", date("2023-01-01"), dec!(10), dec!(1000), dec!(0));

        let result = ledger.process_sale("AAPL", dec!(5), dec!(130), date("2023-03-01"));
        // the January lot is consumed first even though it was added second
        assert_eq!(result.lots_used[0].lot_date, date("2023-01-01"));
        assert_eq!(result.total_cost_basis, dec!(500));
    }

    #[test]
    fn test_clear_resets_the_ledger() {
        let mut ledger = ledger_with_two_lots();
        ledger.clear();
        assert!(ledger.securities().is_empty());
        assert_eq!(ledger.total_remaining_shares("AAPL"), Decimal::ZERO);
    }
}
