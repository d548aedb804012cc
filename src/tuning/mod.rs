//! Hyperparameter tuning: the search prior, walk-forward folds, and the
//! randomized search that ties them together.

pub mod cv;
pub mod prior;
pub mod search;

pub use cv::*;
pub use prior::*;
pub use search::*;
