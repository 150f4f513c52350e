//! Live population ownership and its knowledge-graph side effects

pub mod store;

pub use store::PopulationStore;
