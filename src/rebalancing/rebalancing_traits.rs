//! Collaborator and service traits for the rebalancing feature.

use async_trait::async_trait;

use crate::errors::Result;

use super::rebalancing_model::{
    AllocationAnalysis, AssetClassTarget, AssetSubClassTarget, DriftSummary, Exclusion,
    NewAssetClassTarget, NewAssetSubClassTarget, NewExclusion, NewRebalancingStrategy,
    PortfolioHoldings, RebalancingStrategy, RebalancingSuggestion,
};

/// User-scoped persistence contract for strategies, targets, and exclusions.
///
/// Implementations own ID/timestamp generation on create and must guarantee
/// that `activate_strategy` leaves at most one active strategy per user.
#[async_trait]
pub trait RebalancingRepository: Send + Sync {
    async fn list_strategies(&self, user_id: &str) -> Result<Vec<RebalancingStrategy>>;
    async fn get_strategy(
        &self,
        user_id: &str,
        strategy_id: &str,
    ) -> Result<Option<RebalancingStrategy>>;
    async fn get_active_strategy(&self, user_id: &str) -> Result<Option<RebalancingStrategy>>;
    async fn create_strategy(
        &self,
        user_id: &str,
        strategy: NewRebalancingStrategy,
    ) -> Result<RebalancingStrategy>;
    async fn update_strategy(
        &self,
        user_id: &str,
        strategy: NewRebalancingStrategy,
    ) -> Result<RebalancingStrategy>;
    async fn delete_strategy(&self, user_id: &str, strategy_id: &str) -> Result<()>;
    async fn activate_strategy(
        &self,
        user_id: &str,
        strategy_id: &str,
    ) -> Result<RebalancingStrategy>;

    async fn get_class_target(
        &self,
        user_id: &str,
        target_id: &str,
    ) -> Result<Option<AssetClassTarget>>;
    async fn create_class_target(
        &self,
        user_id: &str,
        target: NewAssetClassTarget,
    ) -> Result<AssetClassTarget>;
    async fn update_class_target(
        &self,
        user_id: &str,
        target: NewAssetClassTarget,
    ) -> Result<AssetClassTarget>;
    async fn delete_class_target(&self, user_id: &str, target_id: &str) -> Result<()>;

    async fn create_sub_class_target(
        &self,
        user_id: &str,
        target: NewAssetSubClassTarget,
    ) -> Result<AssetSubClassTarget>;
    async fn update_sub_class_target(
        &self,
        user_id: &str,
        target: NewAssetSubClassTarget,
    ) -> Result<AssetSubClassTarget>;
    async fn delete_sub_class_target(&self, user_id: &str, target_id: &str) -> Result<()>;

    async fn list_exclusions(
        &self,
        user_id: &str,
        strategy_id: Option<&str>,
    ) -> Result<Vec<Exclusion>>;
    async fn upsert_exclusion(&self, user_id: &str, exclusion: NewExclusion) -> Result<Exclusion>;
    async fn delete_exclusion(&self, user_id: &str, exclusion_id: &str) -> Result<()>;
}

/// Read-only view of the user's current holdings, pre-valued in the base
/// currency by the portfolio aggregation service.
#[async_trait]
pub trait PortfolioProvider: Send + Sync {
    async fn get_holdings(&self, user_id: &str) -> Result<PortfolioHoldings>;
}

/// Public surface of the rebalancing feature.
#[async_trait]
pub trait RebalancingServiceTrait: Send + Sync {
    async fn analysis(
        &self,
        user_id: &str,
        strategy_id: Option<&str>,
    ) -> Result<AllocationAnalysis>;
    async fn drift_summary(&self, user_id: &str) -> Result<DriftSummary>;
    async fn suggestions(
        &self,
        user_id: &str,
        strategy_id: Option<&str>,
    ) -> Result<Vec<RebalancingSuggestion>>;

    async fn get_strategies(&self, user_id: &str) -> Result<Vec<RebalancingStrategy>>;
    async fn save_strategy(
        &self,
        user_id: &str,
        strategy: NewRebalancingStrategy,
    ) -> Result<RebalancingStrategy>;
    async fn delete_strategy(&self, user_id: &str, strategy_id: &str) -> Result<()>;
    async fn activate_strategy(
        &self,
        user_id: &str,
        strategy_id: &str,
    ) -> Result<RebalancingStrategy>;

    async fn save_class_target(
        &self,
        user_id: &str,
        target: NewAssetClassTarget,
    ) -> Result<AssetClassTarget>;
    async fn delete_class_target(&self, user_id: &str, target_id: &str) -> Result<()>;
    async fn save_sub_class_target(
        &self,
        user_id: &str,
        target: NewAssetSubClassTarget,
    ) -> Result<AssetSubClassTarget>;
    async fn delete_sub_class_target(&self, user_id: &str, target_id: &str) -> Result<()>;

    async fn list_exclusions(
        &self,
        user_id: &str,
        strategy_id: Option<&str>,
    ) -> Result<Vec<Exclusion>>;
    async fn upsert_exclusion(&self, user_id: &str, exclusion: NewExclusion) -> Result<Exclusion>;
    async fn delete_exclusion(&self, user_id: &str, exclusion_id: &str) -> Result<()>;
}
