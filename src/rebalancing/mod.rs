pub mod allocation_analyzer;
pub mod rebalancing_model;
pub mod rebalancing_service;
pub mod rebalancing_traits;

pub use allocation_analyzer::*;
pub use rebalancing_model::*;
pub use rebalancing_service::*;
pub use rebalancing_traits::*;
