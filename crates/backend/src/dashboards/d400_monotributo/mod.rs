pub mod aggregator;
pub mod evaluator;
pub mod service;
pub mod snapshot;
pub mod state;
