//! Allocation drift analysis and suggestion generation.
//!
//! Pure functions over a materialized strategy, the holdings reported by the
//! portfolio collaborator, and the strategy's exclusions. Sub-class targets
//! are stored as percent-of-parent but drift is always evaluated as
//! percent-of-total; both representations are carried side by side.

use std::collections::{HashMap, HashSet};

use log::debug;
use rust_decimal::Decimal;

use crate::constants::DECIMAL_PRECISION;
use crate::taxonomies::{AssetClass, AssetSubClass};

use super::rebalancing_model::{
    AllocationAnalysis, CategoryDrift, ClassAllocation, DriftDirection, DriftStatus, DriftSummary,
    Exclusion, HoldingData, RebalancingStrategy, RebalancingSuggestion, SubClassAllocation,
    SuggestionAction,
};

/// Computes two-level drift of actual holdings against the strategy's
/// target tree.
pub fn analyze(
    strategy: &RebalancingStrategy,
    holdings: &[HoldingData],
    exclusions: &[Exclusion],
) -> AllocationAnalysis {
    let excluded_keys: HashSet<(&str, &str)> = exclusions
        .iter()
        .filter(|e| e.exclude_from_calculation)
        .map(|e| (e.data_source.as_str(), e.symbol.as_str()))
        .collect();

    let (included, excluded): (Vec<&HoldingData>, Vec<&HoldingData>) = holdings
        .iter()
        .partition(|h| !excluded_keys.contains(&(h.data_source.as_str(), h.symbol.as_str())));

    let portfolio_value: Decimal = included.iter().map(|h| h.value).sum();
    let excluded_value: Decimal = excluded.iter().map(|h| h.value).sum();

    debug!(
        "Analyzing strategy '{}' over {} holdings ({} excluded), portfolio value {}",
        strategy.name,
        included.len(),
        excluded.len(),
        portfolio_value
    );

    let mut value_by_class: HashMap<AssetClass, Decimal> = HashMap::new();
    let mut value_by_sub_class: HashMap<AssetSubClass, Decimal> = HashMap::new();
    for holding in &included {
        *value_by_class.entry(holding.asset_class).or_insert(Decimal::ZERO) += holding.value;
        *value_by_sub_class
            .entry(holding.asset_sub_class)
            .or_insert(Decimal::ZERO) += holding.value;
    }

    let mut classes = Vec::with_capacity(strategy.class_targets.len());
    let mut max_drift = Decimal::ZERO;

    for class_target in &strategy.class_targets {
        let actual_value = value_by_class
            .get(&class_target.asset_class)
            .copied()
            .unwrap_or(Decimal::ZERO);
        let actual_percent = percent_of(actual_value, portfolio_value);
        let target_value = class_target.target_percent / Decimal::ONE_HUNDRED * portfolio_value;
        let drift_percent = actual_percent - class_target.target_percent;
        let drift_value = actual_value - target_value;

        max_drift = max_drift.max(drift_percent.abs());

        let mut sub_classes = Vec::with_capacity(class_target.sub_class_targets.len());
        for sub_target in &class_target.sub_class_targets {
            let target_percent_of_total =
                class_target.target_percent * sub_target.target_percent / Decimal::ONE_HUNDRED;
            let sub_target_value = target_percent_of_total / Decimal::ONE_HUNDRED * portfolio_value;

            let sub_actual_value = value_by_sub_class
                .get(&sub_target.asset_sub_class)
                .copied()
                .unwrap_or(Decimal::ZERO);
            let actual_percent_of_total = percent_of(sub_actual_value, portfolio_value);
            let actual_percent_of_parent = percent_of(sub_actual_value, actual_value);
            let sub_drift_percent = actual_percent_of_total - target_percent_of_total;
            let sub_drift_value = sub_actual_value - sub_target_value;

            sub_classes.push(SubClassAllocation {
                asset_sub_class: sub_target.asset_sub_class,
                target_percent_of_parent: sub_target.target_percent,
                target_percent_of_total: target_percent_of_total.round_dp(DECIMAL_PRECISION),
                target_value: sub_target_value.round_dp(DECIMAL_PRECISION),
                actual_value: sub_actual_value,
                actual_percent_of_total: actual_percent_of_total.round_dp(DECIMAL_PRECISION),
                actual_percent_of_parent: actual_percent_of_parent.round_dp(DECIMAL_PRECISION),
                drift_percent: sub_drift_percent.round_dp(DECIMAL_PRECISION),
                drift_value: sub_drift_value.round_dp(DECIMAL_PRECISION),
                drift_status: DriftStatus::from_drift(
                    sub_drift_percent.abs(),
                    strategy.drift_threshold,
                ),
            });
        }

        classes.push(ClassAllocation {
            asset_class: class_target.asset_class,
            target_percent: class_target.target_percent,
            target_value: target_value.round_dp(DECIMAL_PRECISION),
            actual_value,
            actual_percent: actual_percent.round_dp(DECIMAL_PRECISION),
            drift_percent: drift_percent.round_dp(DECIMAL_PRECISION),
            drift_value: drift_value.round_dp(DECIMAL_PRECISION),
            drift_status: DriftStatus::from_drift(drift_percent.abs(), strategy.drift_threshold),
            sub_classes,
        });
    }

    AllocationAnalysis {
        strategy_id: strategy.id.clone(),
        strategy_name: strategy.name.clone(),
        drift_threshold: strategy.drift_threshold,
        portfolio_value,
        excluded_value,
        max_drift: max_drift.round_dp(DECIMAL_PRECISION),
        overall_status: DriftStatus::from_drift(max_drift, strategy.drift_threshold),
        classes,
    }
}

/// Generates prioritized trade suggestions from an analysis: first SELLs out
/// of overweight sub-classes (pro-rated across their sellable holdings, in
/// holding iteration order), then one BUY per underweight sub-class with the
/// symbol choice left to the user. Priority is positional, starting at 1.
pub fn generate_suggestions(
    analysis: &AllocationAnalysis,
    holdings: &[HoldingData],
    exclusions: &[Exclusion],
) -> Vec<RebalancingSuggestion> {
    let excluded_keys: HashSet<(&str, &str)> = exclusions
        .iter()
        .filter(|e| e.exclude_from_calculation)
        .map(|e| (e.data_source.as_str(), e.symbol.as_str()))
        .collect();
    let never_sell_keys: HashSet<(&str, &str)> = exclusions
        .iter()
        .filter(|e| e.never_sell)
        .map(|e| (e.data_source.as_str(), e.symbol.as_str()))
        .collect();

    let mut suggestions = Vec::new();
    let mut priority: u32 = 1;

    // Pass 1: sell out of overweight sub-classes.
    for class in &analysis.classes {
        if class.drift_percent <= Decimal::ZERO {
            continue;
        }
        for sub in &class.sub_classes {
            if sub.drift_percent <= Decimal::ZERO {
                continue;
            }

            let amount_to_sell = sub.drift_value.abs();
            let sellable: Vec<&HoldingData> = holdings
                .iter()
                .filter(|h| {
                    h.asset_class == class.asset_class
                        && h.asset_sub_class == sub.asset_sub_class
                        && !excluded_keys.contains(&(h.data_source.as_str(), h.symbol.as_str()))
                        && !never_sell_keys.contains(&(h.data_source.as_str(), h.symbol.as_str()))
                })
                .collect();
            let total_sellable: Decimal = sellable.iter().map(|h| h.value).sum();
            if total_sellable.is_zero() {
                debug!(
                    "No sellable holdings for overweight sub-class {}; skipping",
                    sub.asset_sub_class
                );
                continue;
            }

            for holding in sellable {
                let holding_sell_amount = amount_to_sell * holding.value / total_sellable;
                if holding.market_price <= Decimal::ZERO {
                    continue;
                }
                let shares = (holding_sell_amount / holding.market_price).floor();
                if shares <= Decimal::ZERO {
                    continue;
                }

                suggestions.push(RebalancingSuggestion {
                    action: SuggestionAction::Sell,
                    asset_class: class.asset_class,
                    asset_sub_class: sub.asset_sub_class,
                    symbol: Some(holding.symbol.clone()),
                    data_source: Some(holding.data_source.clone()),
                    name: holding.name.clone(),
                    current_value: Some(holding.value),
                    current_quantity: Some(holding.quantity),
                    suggested_amount: (shares * holding.market_price)
                        .round_dp(DECIMAL_PRECISION),
                    suggested_shares: Some(shares),
                    reason: format!(
                        "{} is {}% of the portfolio against a {}% target; reduce {}",
                        sub.asset_sub_class,
                        sub.actual_percent_of_total.round_dp(2),
                        sub.target_percent_of_total.round_dp(2),
                        holding.symbol
                    ),
                    priority,
                    target_percent_after: sub.target_percent_of_total,
                    drift_after: Decimal::ZERO,
                });
                priority += 1;
            }
        }
    }

    // Pass 2: one buy per underweight sub-class; the symbol is the user's
    // choice.
    for class in &analysis.classes {
        if class.drift_percent >= Decimal::ZERO {
            continue;
        }
        for sub in &class.sub_classes {
            if sub.drift_percent >= Decimal::ZERO {
                continue;
            }

            suggestions.push(RebalancingSuggestion {
                action: SuggestionAction::Buy,
                asset_class: class.asset_class,
                asset_sub_class: sub.asset_sub_class,
                symbol: None,
                data_source: None,
                name: None,
                current_value: Some(sub.actual_value),
                current_quantity: None,
                suggested_amount: sub.drift_value.abs().round_dp(DECIMAL_PRECISION),
                suggested_shares: None,
                reason: format!(
                    "{} is {}% of the portfolio against a {}% target; add to it",
                    sub.asset_sub_class,
                    sub.actual_percent_of_total.round_dp(2),
                    sub.target_percent_of_total.round_dp(2)
                ),
                priority,
                target_percent_after: sub.target_percent_of_total,
                drift_after: Decimal::ZERO,
            });
            priority += 1;
        }
    }

    suggestions
}

/// Compresses an analysis into the dashboard summary.
pub fn summarize_drift(analysis: &AllocationAnalysis) -> DriftSummary {
    let categories_over_threshold = analysis
        .classes
        .iter()
        .filter(|c| c.drift_percent.abs() >= analysis.drift_threshold)
        .map(|c| CategoryDrift {
            name: c.asset_class.to_string(),
            drift: c.drift_percent,
            direction: if c.drift_percent > Decimal::ZERO {
                DriftDirection::Over
            } else {
                DriftDirection::Under
            },
        })
        .collect();

    DriftSummary {
        has_active_strategy: true,
        overall_status: analysis.overall_status,
        max_drift: analysis.max_drift,
        drift_threshold: analysis.drift_threshold,
        categories_over_threshold,
    }
}

fn percent_of(value: Decimal, total: Decimal) -> Decimal {
    if total.is_zero() {
        Decimal::ZERO
    } else {
        value / total * Decimal::ONE_HUNDRED
    }
}
