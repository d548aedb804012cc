//! Ensemble regressor: CART regression trees bagged into a random forest.
//!
//! Models are plain values: `fit` returns a new fitted model, `predict` borrows it.

pub mod forest;
pub mod tree;

pub use forest::*;
pub use tree::*;
