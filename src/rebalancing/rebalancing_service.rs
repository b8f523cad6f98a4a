//! Rebalancing service: resolves the strategy, pulls holdings and
//! exclusions through the collaborator traits, and delegates the math to
//! the allocation analyzer. Mutations are validated here before they reach
//! the repository.

use async_trait::async_trait;
use log::debug;
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::errors::{Error, Result, ValidationError};

use super::allocation_analyzer::{analyze, generate_suggestions, summarize_drift};
use super::rebalancing_model::{
    AllocationAnalysis, AssetClassTarget, AssetSubClassTarget, DriftSummary, Exclusion,
    NewAssetClassTarget, NewAssetSubClassTarget, NewExclusion, NewRebalancingStrategy,
    RebalancingStrategy, RebalancingSuggestion,
};
use super::rebalancing_traits::{
    PortfolioProvider, RebalancingRepository, RebalancingServiceTrait,
};

pub struct RebalancingService {
    repository: Arc<dyn RebalancingRepository>,
    portfolio: Arc<dyn PortfolioProvider>,
}

impl RebalancingService {
    pub fn new(
        repository: Arc<dyn RebalancingRepository>,
        portfolio: Arc<dyn PortfolioProvider>,
    ) -> Self {
        Self {
            repository,
            portfolio,
        }
    }

    /// Explicit strategy by ID, or the user's active one.
    async fn resolve_strategy(
        &self,
        user_id: &str,
        strategy_id: Option<&str>,
    ) -> Result<RebalancingStrategy> {
        match strategy_id {
            Some(id) => self
                .repository
                .get_strategy(user_id, id)
                .await?
                .ok_or_else(|| Error::NotFound(format!("Strategy {}", id))),
            None => self
                .repository
                .get_active_strategy(user_id)
                .await?
                .ok_or(Error::NoActiveStrategy),
        }
    }

    async fn run_analysis(
        &self,
        user_id: &str,
        strategy_id: Option<&str>,
    ) -> Result<(AllocationAnalysis, RebalancingStrategy, Vec<super::HoldingData>)> {
        let strategy = self.resolve_strategy(user_id, strategy_id).await?;
        let portfolio = self.portfolio.get_holdings(user_id).await?;
        debug!(
            "Running allocation analysis for user {} with strategy '{}'",
            user_id, strategy.name
        );
        let analysis = analyze(&strategy, &portfolio.holdings, &strategy.exclusions);
        Ok((analysis, strategy, portfolio.holdings))
    }
}

#[async_trait]
impl RebalancingServiceTrait for RebalancingService {
    async fn analysis(
        &self,
        user_id: &str,
        strategy_id: Option<&str>,
    ) -> Result<AllocationAnalysis> {
        let (analysis, _, _) = self.run_analysis(user_id, strategy_id).await?;
        Ok(analysis)
    }

    async fn drift_summary(&self, user_id: &str) -> Result<DriftSummary> {
        let strategy = match self.repository.get_active_strategy(user_id).await? {
            Some(strategy) => strategy,
            None => return Ok(DriftSummary::no_strategy()),
        };
        let portfolio = self.portfolio.get_holdings(user_id).await?;
        let analysis = analyze(&strategy, &portfolio.holdings, &strategy.exclusions);
        Ok(summarize_drift(&analysis))
    }

    async fn suggestions(
        &self,
        user_id: &str,
        strategy_id: Option<&str>,
    ) -> Result<Vec<RebalancingSuggestion>> {
        let (analysis, strategy, holdings) = self.run_analysis(user_id, strategy_id).await?;
        Ok(generate_suggestions(
            &analysis,
            &holdings,
            &strategy.exclusions,
        ))
    }

    async fn get_strategies(&self, user_id: &str) -> Result<Vec<RebalancingStrategy>> {
        self.repository.list_strategies(user_id).await
    }

    async fn save_strategy(
        &self,
        user_id: &str,
        strategy: NewRebalancingStrategy,
    ) -> Result<RebalancingStrategy> {
        strategy.validate()?;
        if strategy.id.is_some() {
            self.repository.update_strategy(user_id, strategy).await
        } else {
            self.repository.create_strategy(user_id, strategy).await
        }
    }

    async fn delete_strategy(&self, user_id: &str, strategy_id: &str) -> Result<()> {
        self.repository
            .get_strategy(user_id, strategy_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Strategy {}", strategy_id)))?;
        self.repository.delete_strategy(user_id, strategy_id).await
    }

    async fn activate_strategy(
        &self,
        user_id: &str,
        strategy_id: &str,
    ) -> Result<RebalancingStrategy> {
        self.repository
            .get_strategy(user_id, strategy_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Strategy {}", strategy_id)))?;
        self.repository.activate_strategy(user_id, strategy_id).await
    }

    async fn save_class_target(
        &self,
        user_id: &str,
        target: NewAssetClassTarget,
    ) -> Result<AssetClassTarget> {
        target.validate()?;

        let strategy = self
            .repository
            .get_strategy(user_id, &target.strategy_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Strategy {}", target.strategy_id)))?;

        let duplicate = strategy.class_targets.iter().any(|existing| {
            existing.asset_class == target.asset_class && Some(&existing.id) != target.id.as_ref()
        });
        if duplicate {
            return Err(Error::Validation(ValidationError::InvalidInput(format!(
                "Asset class {} is already targeted in this strategy",
                target.asset_class
            ))));
        }

        let other_sum: Decimal = strategy
            .class_targets
            .iter()
            .filter(|existing| Some(&existing.id) != target.id.as_ref())
            .map(|existing| existing.target_percent)
            .sum();
        if other_sum + target.target_percent > Decimal::ONE_HUNDRED {
            return Err(Error::Validation(ValidationError::InvalidInput(format!(
                "Class targets would sum to {}, exceeding 100",
                other_sum + target.target_percent
            ))));
        }

        if target.id.is_some() {
            self.repository.update_class_target(user_id, target).await
        } else {
            self.repository.create_class_target(user_id, target).await
        }
    }

    async fn delete_class_target(&self, user_id: &str, target_id: &str) -> Result<()> {
        self.repository.delete_class_target(user_id, target_id).await
    }

    async fn save_sub_class_target(
        &self,
        user_id: &str,
        target: NewAssetSubClassTarget,
    ) -> Result<AssetSubClassTarget> {
        target.validate()?;

        let parent = self
            .repository
            .get_class_target(user_id, &target.class_target_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Class target {}", target.class_target_id)))?;

        if !parent.asset_class.is_valid_sub_class(&target.asset_sub_class) {
            return Err(Error::Validation(ValidationError::InvalidInput(format!(
                "{} is not a valid sub-class of {}",
                target.asset_sub_class, parent.asset_class
            ))));
        }

        let duplicate = parent.sub_class_targets.iter().any(|existing| {
            existing.asset_sub_class == target.asset_sub_class
                && Some(&existing.id) != target.id.as_ref()
        });
        if duplicate {
            return Err(Error::Validation(ValidationError::InvalidInput(format!(
                "Sub-class {} is already targeted under {}",
                target.asset_sub_class, parent.asset_class
            ))));
        }

        let other_sum: Decimal = parent
            .sub_class_targets
            .iter()
            .filter(|existing| Some(&existing.id) != target.id.as_ref())
            .map(|existing| existing.target_percent)
            .sum();
        if other_sum + target.target_percent > Decimal::ONE_HUNDRED {
            return Err(Error::Validation(ValidationError::InvalidInput(format!(
                "Sub-class targets would sum to {}, exceeding 100",
                other_sum + target.target_percent
            ))));
        }

        if target.id.is_some() {
            self.repository.update_sub_class_target(user_id, target).await
        } else {
            self.repository.create_sub_class_target(user_id, target).await
        }
    }

    async fn delete_sub_class_target(&self, user_id: &str, target_id: &str) -> Result<()> {
        self.repository
            .delete_sub_class_target(user_id, target_id)
            .await
    }

    async fn list_exclusions(
        &self,
        user_id: &str,
        strategy_id: Option<&str>,
    ) -> Result<Vec<Exclusion>> {
        self.repository.list_exclusions(user_id, strategy_id).await
    }

    async fn upsert_exclusion(&self, user_id: &str, exclusion: NewExclusion) -> Result<Exclusion> {
        exclusion.validate()?;
        self.repository
            .get_strategy(user_id, &exclusion.strategy_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Strategy {}", exclusion.strategy_id)))?;
        self.repository.upsert_exclusion(user_id, exclusion).await
    }

    async fn delete_exclusion(&self, user_id: &str, exclusion_id: &str) -> Result<()> {
        self.repository.delete_exclusion(user_id, exclusion_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rebalancing::rebalancing_model::{HoldingData, PortfolioHoldings};
    use crate::rebalancing::DriftStatus;
    use crate::taxonomies::{AssetClass, AssetSubClass};
    use rust_decimal_macros::dec;
    use std::sync::Mutex;
    use tokio_test::block_on;

    // In-memory repository for exercising the service layer.
    #[derive(Default)]
    struct InMemoryRepository {
        strategies: Mutex<Vec<RebalancingStrategy>>,
    }

    impl InMemoryRepository {
        fn with_strategies(strategies: Vec<RebalancingStrategy>) -> Self {
            Self {
                strategies: Mutex::new(strategies),
            }
        }
    }

    #[async_trait]
    impl RebalancingRepository for InMemoryRepository {
        async fn list_strategies(&self, user_id: &str) -> Result<Vec<RebalancingStrategy>> {
            Ok(self
                .strategies
                .lock()
                .unwrap()
                .iter()
                .filter(|s| s.user_id == user_id)
                .cloned()
                .collect())
        }

        async fn get_strategy(
            &self,
            user_id: &str,
            strategy_id: &str,
        ) -> Result<Option<RebalancingStrategy>> {
            Ok(self
                .strategies
                .lock()
                .unwrap()
                .iter()
                .find(|s| s.user_id == user_id && s.id == strategy_id)
                .cloned())
        }

        async fn get_active_strategy(
            &self,
            user_id: &str,
        ) -> Result<Option<RebalancingStrategy>> {
            Ok(self
                .strategies
                .lock()
                .unwrap()
                .iter()
                .find(|s| s.user_id == user_id && s.is_active)
                .cloned())
        }

        async fn create_strategy(
            &self,
            user_id: &str,
            strategy: NewRebalancingStrategy,
        ) -> Result<RebalancingStrategy> {
            let mut created: RebalancingStrategy = strategy.into();
            created.user_id = user_id.to_string();
            self.strategies.lock().unwrap().push(created.clone());
            Ok(created)
        }

        async fn update_strategy(
            &self,
            user_id: &str,
            strategy: NewRebalancingStrategy,
        ) -> Result<RebalancingStrategy> {
            let id = strategy.id.clone().unwrap_or_default();
            let mut strategies = self.strategies.lock().unwrap();
            let existing = strategies
                .iter_mut()
                .find(|s| s.user_id == user_id && s.id == id)
                .ok_or_else(|| Error::NotFound(format!("Strategy {}", id)))?;
            existing.name = strategy.name;
            existing.drift_threshold = strategy.drift_threshold;
            Ok(existing.clone())
        }

        async fn delete_strategy(&self, user_id: &str, strategy_id: &str) -> Result<()> {
            self.strategies
                .lock()
                .unwrap()
                .retain(|s| !(s.user_id == user_id && s.id == strategy_id));
            Ok(())
        }

        async fn activate_strategy(
            &self,
            user_id: &str,
            strategy_id: &str,
        ) -> Result<RebalancingStrategy> {
            let mut strategies = self.strategies.lock().unwrap();
            let mut activated = None;
            for strategy in strategies.iter_mut().filter(|s| s.user_id == user_id) {
                strategy.is_active = strategy.id == strategy_id;
                if strategy.is_active {
                    activated = Some(strategy.clone());
                }
            }
            activated.ok_or_else(|| Error::NotFound(format!("Strategy {}", strategy_id)))
        }

        async fn get_class_target(
            &self,
            user_id: &str,
            target_id: &str,
        ) -> Result<Option<AssetClassTarget>> {
            Ok(self
                .strategies
                .lock()
                .unwrap()
                .iter()
                .filter(|s| s.user_id == user_id)
                .flat_map(|s| s.class_targets.iter())
                .find(|t| t.id == target_id)
                .cloned())
        }

        async fn create_class_target(
            &self,
            user_id: &str,
            target: NewAssetClassTarget,
        ) -> Result<AssetClassTarget> {
            let created: AssetClassTarget = target.into();
            let mut strategies = self.strategies.lock().unwrap();
            let strategy = strategies
                .iter_mut()
                .find(|s| s.user_id == user_id && s.id == created.strategy_id)
                .ok_or_else(|| Error::NotFound(format!("Strategy {}", created.strategy_id)))?;
            strategy.class_targets.push(created.clone());
            Ok(created)
        }

        async fn update_class_target(
            &self,
            user_id: &str,
            target: NewAssetClassTarget,
        ) -> Result<AssetClassTarget> {
            let id = target.id.clone().unwrap_or_default();
            let mut strategies = self.strategies.lock().unwrap();
            let existing = strategies
                .iter_mut()
                .filter(|s| s.user_id == user_id)
                .flat_map(|s| s.class_targets.iter_mut())
                .find(|t| t.id == id)
                .ok_or_else(|| Error::NotFound(format!("Class target {}", id)))?;
            existing.asset_class = target.asset_class;
            existing.target_percent = target.target_percent;
            Ok(existing.clone())
        }

        async fn delete_class_target(&self, user_id: &str, target_id: &str) -> Result<()> {
            let mut strategies = self.strategies.lock().unwrap();
            for strategy in strategies.iter_mut().filter(|s| s.user_id == user_id) {
                strategy.class_targets.retain(|t| t.id != target_id);
            }
            Ok(())
        }

        async fn create_sub_class_target(
            &self,
            user_id: &str,
            target: NewAssetSubClassTarget,
        ) -> Result<AssetSubClassTarget> {
            let created: AssetSubClassTarget = target.into();
            let mut strategies = self.strategies.lock().unwrap();
            let parent = strategies
                .iter_mut()
                .filter(|s| s.user_id == user_id)
                .flat_map(|s| s.class_targets.iter_mut())
                .find(|t| t.id == created.class_target_id)
                .ok_or_else(|| {
                    Error::NotFound(format!("Class target {}", created.class_target_id))
                })?;
            parent.sub_class_targets.push(created.clone());
            Ok(created)
        }

        async fn update_sub_class_target(
            &self,
            user_id: &str,
            target: NewAssetSubClassTarget,
        ) -> Result<AssetSubClassTarget> {
            let id = target.id.clone().unwrap_or_default();
            let mut strategies = self.strategies.lock().unwrap();
            let existing = strategies
                .iter_mut()
                .filter(|s| s.user_id == user_id)
                .flat_map(|s| s.class_targets.iter_mut())
                .flat_map(|t| t.sub_class_targets.iter_mut())
                .find(|t| t.id == id)
                .ok_or_else(|| Error::NotFound(format!("Sub-class target {}", id)))?;
            existing.asset_sub_class = target.asset_sub_class;
            existing.target_percent = target.target_percent;
            Ok(existing.clone())
        }

        async fn delete_sub_class_target(&self, user_id: &str, target_id: &str) -> Result<()> {
            let mut strategies = self.strategies.lock().unwrap();
            for strategy in strategies.iter_mut().filter(|s| s.user_id == user_id) {
                for class_target in strategy.class_targets.iter_mut() {
                    class_target.sub_class_targets.retain(|t| t.id != target_id);
                }
            }
            Ok(())
        }

        async fn list_exclusions(
            &self,
            user_id: &str,
            strategy_id: Option<&str>,
        ) -> Result<Vec<Exclusion>> {
            Ok(self
                .strategies
                .lock()
                .unwrap()
                .iter()
                .filter(|s| s.user_id == user_id)
                .filter(|s| strategy_id.map_or(true, |id| s.id == id))
                .flat_map(|s| s.exclusions.iter().cloned())
                .collect())
        }

        async fn upsert_exclusion(
            &self,
            user_id: &str,
            exclusion: NewExclusion,
        ) -> Result<Exclusion> {
            let created: Exclusion = exclusion.into();
            let mut strategies = self.strategies.lock().unwrap();
            let strategy = strategies
                .iter_mut()
                .find(|s| s.user_id == user_id && s.id == created.strategy_id)
                .ok_or_else(|| Error::NotFound(format!("Strategy {}", created.strategy_id)))?;
            strategy
                .exclusions
                .retain(|e| e.key() != created.key());
            strategy.exclusions.push(created.clone());
            Ok(created)
        }

        async fn delete_exclusion(&self, user_id: &str, exclusion_id: &str) -> Result<()> {
            let mut strategies = self.strategies.lock().unwrap();
            for strategy in strategies.iter_mut().filter(|s| s.user_id == user_id) {
                strategy.exclusions.retain(|e| e.id != exclusion_id);
            }
            Ok(())
        }
    }

    struct StaticPortfolio {
        holdings: Vec<HoldingData>,
    }

    #[async_trait]
    impl PortfolioProvider for StaticPortfolio {
        async fn get_holdings(&self, _user_id: &str) -> Result<PortfolioHoldings> {
            Ok(PortfolioHoldings {
                holdings: self.holdings.clone(),
                base_currency: "USD".to_string(),
            })
        }
    }

    fn holding(symbol: &str, class: AssetClass, sub: AssetSubClass, value: Decimal) -> HoldingData {
        HoldingData {
            symbol: symbol.to_string(),
            data_source: "YAHOO".to_string(),
            name: None,
            asset_class: class,
            asset_sub_class: sub,
            quantity: dec!(10),
            market_price: value / dec!(10),
            value,
        }
    }

    fn sixty_forty_strategy(user_id: &str, active: bool) -> RebalancingStrategy {
        RebalancingStrategy {
            id: "s1".to_string(),
            user_id: user_id.to_string(),
            name: "60/40".to_string(),
            is_active: active,
            drift_threshold: dec!(5),
            class_targets: vec![
                AssetClassTarget {
                    id: "t1".to_string(),
                    strategy_id: "s1".to_string(),
                    asset_class: AssetClass::Equity,
                    target_percent: dec!(60),
                    sub_class_targets: vec![AssetSubClassTarget {
                        id: "st1".to_string(),
                        class_target_id: "t1".to_string(),
                        asset_sub_class: AssetSubClass::Stock,
                        target_percent: dec!(100),
                    }],
                },
                AssetClassTarget {
                    id: "t2".to_string(),
                    strategy_id: "s1".to_string(),
                    asset_class: AssetClass::Debt,
                    target_percent: dec!(40),
                    sub_class_targets: vec![AssetSubClassTarget {
                        id: "st2".to_string(),
                        class_target_id: "t2".to_string(),
                        asset_sub_class: AssetSubClass::Bond,
                        target_percent: dec!(100),
                    }],
                },
            ],
            exclusions: Vec::new(),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    fn service_with(
        strategies: Vec<RebalancingStrategy>,
        holdings: Vec<HoldingData>,
    ) -> RebalancingService {
        RebalancingService::new(
            Arc::new(InMemoryRepository::with_strategies(strategies)),
            Arc::new(StaticPortfolio { holdings }),
        )
    }

    #[test]
    fn test_analysis_resolves_active_strategy() {
        let service = service_with(
            vec![sixty_forty_strategy("u1", true)],
            vec![
                holding("VTI", AssetClass::Equity, AssetSubClass::Stock, dec!(7000)),
                holding("BND", AssetClass::Debt, AssetSubClass::Bond, dec!(3000)),
            ],
        );

        let analysis = block_on(service.analysis("u1", None)).unwrap();
        assert_eq!(analysis.overall_status, DriftStatus::Critical);
        assert_eq!(analysis.max_drift, dec!(10));
    }

    #[test]
    fn test_analysis_without_active_strategy_errors() {
        let service = service_with(vec![sixty_forty_strategy("u1", false)], vec![]);
        let result = block_on(service.analysis("u1", None));
        assert!(matches!(result, Err(Error::NoActiveStrategy)));
    }

    #[test]
    fn test_analysis_with_unknown_strategy_id_is_not_found() {
        let service = service_with(vec![sixty_forty_strategy("u1", true)], vec![]);
        let result = block_on(service.analysis("u1", Some("missing")));
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_drift_summary_without_strategy_is_no_strategy() {
        let service = service_with(vec![], vec![]);
        let summary = block_on(service.drift_summary("u1")).unwrap();
        assert!(!summary.has_active_strategy);
        assert_eq!(summary.overall_status, DriftStatus::NoStrategy);
        assert_eq!(summary.max_drift, Decimal::ZERO);
    }

    #[test]
    fn test_suggestions_path_produces_sell_then_buy() {
        let service = service_with(
            vec![sixty_forty_strategy("u1", true)],
            vec![
                holding("VTI", AssetClass::Equity, AssetSubClass::Stock, dec!(7000)),
                holding("BND", AssetClass::Debt, AssetSubClass::Bond, dec!(3000)),
            ],
        );

        let suggestions = block_on(service.suggestions("u1", None)).unwrap();
        assert_eq!(suggestions.len(), 2);
        assert_eq!(suggestions[0].priority, 1);
        assert_eq!(suggestions[1].priority, 2);
    }

    #[test]
    fn test_class_target_sum_over_100_is_rejected() {
        let service = service_with(vec![sixty_forty_strategy("u1", true)], vec![]);

        let result = block_on(service.save_class_target(
            "u1",
            NewAssetClassTarget {
                id: None,
                strategy_id: "s1".to_string(),
                asset_class: AssetClass::Liquidity,
                target_percent: dec!(10),
            },
        ));
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn test_duplicate_class_target_is_rejected() {
        let mut strategy = sixty_forty_strategy("u1", true);
        strategy.class_targets[1].target_percent = dec!(20);
        let service = service_with(vec![strategy], vec![]);

        let result = block_on(service.save_class_target(
            "u1",
            NewAssetClassTarget {
                id: None,
                strategy_id: "s1".to_string(),
                asset_class: AssetClass::Equity,
                target_percent: dec!(10),
            },
        ));
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn test_updating_a_class_target_does_not_double_count_it() {
        let service = service_with(vec![sixty_forty_strategy("u1", true)], vec![]);

        // raising the 40% debt target to 40% (unchanged sum) stays legal
        let updated = block_on(service.save_class_target(
            "u1",
            NewAssetClassTarget {
                id: Some("t2".to_string()),
                strategy_id: "s1".to_string(),
                asset_class: AssetClass::Debt,
                target_percent: dec!(40),
            },
        ));
        assert!(updated.is_ok());
    }

    #[test]
    fn test_invalid_sub_class_for_class_is_rejected() {
        let service = service_with(vec![sixty_forty_strategy("u1", true)], vec![]);

        let result = block_on(service.save_sub_class_target(
            "u1",
            NewAssetSubClassTarget {
                id: None,
                class_target_id: "t1".to_string(),
                asset_sub_class: AssetSubClass::Bond,
                target_percent: dec!(10),
            },
        ));
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn test_sub_class_sum_within_class_is_enforced() {
        let service = service_with(vec![sixty_forty_strategy("u1", true)], vec![]);

        // STOCK already takes 100% of the equity sleeve
        let result = block_on(service.save_sub_class_target(
            "u1",
            NewAssetSubClassTarget {
                id: None,
                class_target_id: "t1".to_string(),
                asset_sub_class: AssetSubClass::Etf,
                target_percent: dec!(1),
            },
        ));
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn test_activation_leaves_one_active_strategy() {
        let mut second = sixty_forty_strategy("u1", false);
        second.id = "s2".to_string();
        let service = service_with(
            vec![sixty_forty_strategy("u1", true), second],
            vec![],
        );

        let activated = block_on(service.activate_strategy("u1", "s2")).unwrap();
        assert!(activated.is_active);

        let strategies = block_on(service.get_strategies("u1")).unwrap();
        let active: Vec<_> = strategies.iter().filter(|s| s.is_active).collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, "s2");
    }

    #[test]
    fn test_save_strategy_validates_threshold() {
        let service = service_with(vec![], vec![]);
        let result = block_on(service.save_strategy(
            "u1",
            NewRebalancingStrategy {
                id: None,
                name: "Bad".to_string(),
                drift_threshold: dec!(75),
                is_active: false,
            },
        ));
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn test_exclusion_upsert_requires_existing_strategy() {
        let service = service_with(vec![], vec![]);
        let result = block_on(service.upsert_exclusion(
            "u1",
            NewExclusion {
                id: None,
                strategy_id: "missing".to_string(),
                symbol: "AAPL".to_string(),
                data_source: "YAHOO".to_string(),
                exclude_from_calculation: true,
                never_sell: false,
                reason: None,
            },
        ));
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_exclusion_upsert_replaces_existing_key() {
        let service = service_with(vec![sixty_forty_strategy("u1", true)], vec![]);
        let exclusion = NewExclusion {
            id: None,
            strategy_id: "s1".to_string(),
            symbol: "AAPL".to_string(),
            data_source: "YAHOO".to_string(),
            exclude_from_calculation: false,
            never_sell: true,
            reason: Some("employer stock".to_string()),
        };

        block_on(service.upsert_exclusion("u1", exclusion.clone())).unwrap();
        let mut updated = exclusion;
        updated.never_sell = false;
        block_on(service.upsert_exclusion("u1", updated)).unwrap();

        let exclusions = block_on(service.list_exclusions("u1", Some("s1"))).unwrap();
        assert_eq!(exclusions.len(), 1);
        assert!(!exclusions[0].never_sell);
    }
}
