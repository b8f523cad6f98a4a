//! Rebalancing domain models: strategies, targets, exclusions, and the
//! analysis/suggestion shapes the planner produces.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::{MAX_DRIFT_THRESHOLD, MIN_DRIFT_THRESHOLD};
use crate::errors::{Error, Result, ValidationError};
use crate::taxonomies::{AssetClass, AssetSubClass};
use crate::utils::decimal_serde::*;

// ============================================================================
// Domain Models
// ============================================================================

/// A user's rebalancing strategy: a two-level allocation target tree plus
/// per-symbol exclusions. At most one strategy per user is active.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RebalancingStrategy {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub is_active: bool,
    /// Drift percentage at which a category counts as CRITICAL (1-50).
    #[serde(with = "decimal_serde")]
    pub drift_threshold: Decimal,
    pub class_targets: Vec<AssetClassTarget>,
    pub exclusions: Vec<Exclusion>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetClassTarget {
    pub id: String,
    pub strategy_id: String,
    pub asset_class: AssetClass,
    /// Percent of the total portfolio (0-100).
    #[serde(with = "decimal_serde")]
    pub target_percent: Decimal,
    pub sub_class_targets: Vec<AssetSubClassTarget>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetSubClassTarget {
    pub id: String,
    pub class_target_id: String,
    pub asset_sub_class: AssetSubClass,
    /// Percent within the parent class (0-100), not of the total portfolio.
    #[serde(with = "decimal_serde")]
    pub target_percent: Decimal,
}

/// Per-strategy opt-out for one symbol. `exclude_from_calculation` removes
/// the holding from the drift math entirely; `never_sell` only suppresses
/// SELL suggestions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exclusion {
    pub id: String,
    pub strategy_id: String,
    pub symbol: String,
    pub data_source: String,
    pub exclude_from_calculation: bool,
    pub never_sell: bool,
    pub reason: Option<String>,
}

impl Exclusion {
    /// Holdings are identified by (data_source, symbol).
    pub fn key(&self) -> (String, String) {
        (self.data_source.clone(), self.symbol.clone())
    }
}

// ============================================================================
// Input Models
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRebalancingStrategy {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(with = "decimal_serde")]
    pub drift_threshold: Decimal,
    pub is_active: bool,
}

impl NewRebalancingStrategy {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Validation(ValidationError::InvalidInput(
                "Strategy name cannot be empty".to_string(),
            )));
        }
        let min: Decimal = MIN_DRIFT_THRESHOLD.parse()?;
        let max: Decimal = MAX_DRIFT_THRESHOLD.parse()?;
        if self.drift_threshold < min || self.drift_threshold > max {
            return Err(Error::Validation(ValidationError::InvalidInput(format!(
                "Drift threshold must be between {} and {}",
                min, max
            ))));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAssetClassTarget {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub strategy_id: String,
    pub asset_class: AssetClass,
    #[serde(with = "decimal_serde")]
    pub target_percent: Decimal,
}

impl NewAssetClassTarget {
    pub fn validate(&self) -> Result<()> {
        if self.target_percent < Decimal::ZERO || self.target_percent > Decimal::ONE_HUNDRED {
            return Err(Error::Validation(ValidationError::InvalidInput(
                "Target percent must be between 0 and 100".to_string(),
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAssetSubClassTarget {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub class_target_id: String,
    pub asset_sub_class: AssetSubClass,
    #[serde(with = "decimal_serde")]
    pub target_percent: Decimal,
}

impl NewAssetSubClassTarget {
    pub fn validate(&self) -> Result<()> {
        if self.target_percent < Decimal::ZERO || self.target_percent > Decimal::ONE_HUNDRED {
            return Err(Error::Validation(ValidationError::InvalidInput(
                "Target percent must be between 0 and 100".to_string(),
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExclusion {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub strategy_id: String,
    pub symbol: String,
    pub data_source: String,
    pub exclude_from_calculation: bool,
    pub never_sell: bool,
    pub reason: Option<String>,
}

impl NewExclusion {
    pub fn validate(&self) -> Result<()> {
        if self.symbol.trim().is_empty() {
            return Err(Error::Validation(ValidationError::InvalidInput(
                "Exclusion symbol cannot be empty".to_string(),
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Portfolio Collaborator Models
// ============================================================================

/// One holding as reported by the portfolio aggregation service. Values are
/// already in the user's base currency.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldingData {
    pub symbol: String,
    pub data_source: String,
    pub name: Option<String>,
    pub asset_class: AssetClass,
    pub asset_sub_class: AssetSubClass,
    #[serde(with = "decimal_serde")]
    pub quantity: Decimal,
    #[serde(with = "decimal_serde")]
    pub market_price: Decimal,
    #[serde(with = "decimal_serde")]
    pub value: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioHoldings {
    pub holdings: Vec<HoldingData>,
    pub base_currency: String,
}

// ============================================================================
// Analysis Models
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DriftStatus {
    Ok,
    Warning,
    Critical,
    NoStrategy,
}

impl DriftStatus {
    /// Bands an absolute drift against the strategy threshold: below half
    /// the threshold is OK, below the threshold is WARNING, at or above is
    /// CRITICAL.
    pub fn from_drift(drift_abs: Decimal, threshold: Decimal) -> Self {
        let half = threshold / rust_decimal_macros::dec!(2);
        if drift_abs < half {
            DriftStatus::Ok
        } else if drift_abs < threshold {
            DriftStatus::Warning
        } else {
            DriftStatus::Critical
        }
    }
}

/// Drift of one sub-class target. Target and actual are carried both as
/// percent-of-total and percent-of-parent; drift is always percent-of-total.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubClassAllocation {
    pub asset_sub_class: AssetSubClass,
    #[serde(with = "decimal_serde")]
    pub target_percent_of_parent: Decimal,
    #[serde(with = "decimal_serde")]
    pub target_percent_of_total: Decimal,
    #[serde(with = "decimal_serde")]
    pub target_value: Decimal,
    #[serde(with = "decimal_serde")]
    pub actual_value: Decimal,
    #[serde(with = "decimal_serde")]
    pub actual_percent_of_total: Decimal,
    #[serde(with = "decimal_serde")]
    pub actual_percent_of_parent: Decimal,
    #[serde(with = "decimal_serde")]
    pub drift_percent: Decimal,
    #[serde(with = "decimal_serde")]
    pub drift_value: Decimal,
    pub drift_status: DriftStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassAllocation {
    pub asset_class: AssetClass,
    #[serde(with = "decimal_serde")]
    pub target_percent: Decimal,
    #[serde(with = "decimal_serde")]
    pub target_value: Decimal,
    #[serde(with = "decimal_serde")]
    pub actual_value: Decimal,
    #[serde(with = "decimal_serde")]
    pub actual_percent: Decimal,
    #[serde(with = "decimal_serde")]
    pub drift_percent: Decimal,
    #[serde(with = "decimal_serde")]
    pub drift_value: Decimal,
    pub drift_status: DriftStatus,
    pub sub_classes: Vec<SubClassAllocation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationAnalysis {
    pub strategy_id: String,
    pub strategy_name: String,
    #[serde(with = "decimal_serde")]
    pub drift_threshold: Decimal,
    /// Total value of the holdings included in the drift math.
    #[serde(with = "decimal_serde")]
    pub portfolio_value: Decimal,
    /// Value removed up-front by `exclude_from_calculation` exclusions.
    #[serde(with = "decimal_serde")]
    pub excluded_value: Decimal,
    #[serde(with = "decimal_serde")]
    pub max_drift: Decimal,
    pub overall_status: DriftStatus,
    pub classes: Vec<ClassAllocation>,
}

// ============================================================================
// Suggestion Models
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SuggestionAction {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RebalancingSuggestion {
    pub action: SuggestionAction,
    pub asset_class: AssetClass,
    pub asset_sub_class: AssetSubClass,
    /// SELL suggestions name a holding; BUY suggestions leave the symbol
    /// choice to the user.
    pub symbol: Option<String>,
    pub data_source: Option<String>,
    pub name: Option<String>,
    #[serde(with = "decimal_serde_option")]
    pub current_value: Option<Decimal>,
    #[serde(with = "decimal_serde_option")]
    pub current_quantity: Option<Decimal>,
    #[serde(with = "decimal_serde")]
    pub suggested_amount: Decimal,
    #[serde(with = "decimal_serde_option")]
    pub suggested_shares: Option<Decimal>,
    pub reason: String,
    pub priority: u32,
    /// Projected percent-of-total after an exact execution.
    #[serde(with = "decimal_serde")]
    pub target_percent_after: Decimal,
    #[serde(with = "decimal_serde")]
    pub drift_after: Decimal,
}

// ============================================================================
// Drift Summary (dashboard)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DriftDirection {
    Over,
    Under,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDrift {
    pub name: String,
    #[serde(with = "decimal_serde")]
    pub drift: Decimal,
    pub direction: DriftDirection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriftSummary {
    pub has_active_strategy: bool,
    pub overall_status: DriftStatus,
    #[serde(with = "decimal_serde")]
    pub max_drift: Decimal,
    #[serde(with = "decimal_serde")]
    pub drift_threshold: Decimal,
    pub categories_over_threshold: Vec<CategoryDrift>,
}

impl DriftSummary {
    pub fn no_strategy() -> Self {
        DriftSummary {
            has_active_strategy: false,
            overall_status: DriftStatus::NoStrategy,
            max_drift: Decimal::ZERO,
            drift_threshold: crate::constants::DEFAULT_DRIFT_THRESHOLD
                .parse()
                .unwrap_or(Decimal::ZERO),
            categories_over_threshold: Vec::new(),
        }
    }
}

// ============================================================================
// Conversions
// ============================================================================

impl From<NewRebalancingStrategy> for RebalancingStrategy {
    fn from(input: NewRebalancingStrategy) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: input.id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            user_id: String::new(),
            name: input.name,
            is_active: input.is_active,
            drift_threshold: input.drift_threshold,
            class_targets: Vec::new(),
            exclusions: Vec::new(),
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

impl From<NewAssetClassTarget> for AssetClassTarget {
    fn from(input: NewAssetClassTarget) -> Self {
        Self {
            id: input.id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            strategy_id: input.strategy_id,
            asset_class: input.asset_class,
            target_percent: input.target_percent,
            sub_class_targets: Vec::new(),
        }
    }
}

impl From<NewAssetSubClassTarget> for AssetSubClassTarget {
    fn from(input: NewAssetSubClassTarget) -> Self {
        Self {
            id: input.id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            class_target_id: input.class_target_id,
            asset_sub_class: input.asset_sub_class,
            target_percent: input.target_percent,
        }
    }
}

impl From<NewExclusion> for Exclusion {
    fn from(input: NewExclusion) -> Self {
        Self {
            id: input.id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            strategy_id: input.strategy_id,
            symbol: input.symbol,
            data_source: input.data_source,
            exclude_from_calculation: input.exclude_from_calculation,
            never_sell: input.never_sell,
            reason: input.reason,
        }
    }
}
