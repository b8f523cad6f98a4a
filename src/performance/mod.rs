pub mod irr;
pub mod performance_model;
pub mod performance_service;
pub mod twr;

pub use irr::*;
pub use performance_model::*;
pub use performance_service::*;
pub use twr::*;
