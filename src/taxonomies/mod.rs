pub mod taxonomy_model;

pub use taxonomy_model::*;
