pub mod cost_basis_ledger;
pub mod cost_basis_model;

pub use cost_basis_ledger::*;
pub use cost_basis_model::*;
