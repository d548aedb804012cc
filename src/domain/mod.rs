//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the dataset schema contract (`Column`, `ColumnKind`) and raw rows (`PriceRecord`)
//! - the hyperparameter search space types (`HyperparameterCandidate`, `MaxFeatures`)
//! - run configuration (`ForecastConfig`, `TunerConfig`, `DcfAssumptions`)
//! - stage outputs (`ForecastOutput`, `Valuation`, `Recommendation`, etc.)

pub mod types;

pub use types::*;
