pub mod activities_model;

pub use activities_model::*;
