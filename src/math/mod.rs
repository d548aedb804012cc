//! Mathematical utilities: lagged/rolling series statistics and error metrics.

pub mod stats;

pub use stats::*;
