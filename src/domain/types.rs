//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - passed between pipeline stages by value
//! - exported to JSON/CSV
//! - printed by the report module

use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Semantic kind of a dataset column.
///
/// The schema is fixed at ingest time; later stages never re-derive it from
/// the values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    /// Calendar date stored as a day ordinal.
    Date,
    /// The value being forecast.
    Target,
    /// Any other numeric column (raw inputs, indicators, engineered features).
    Numeric,
}

/// A named, typed column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

impl Column {
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// One trading day of cleaned input.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceRecord {
    pub date: NaiveDate,
    pub close_price: f64,
    /// Additional numeric columns, aligned with the schema's extra columns.
    pub extras: Vec<f64>,
}

/// Feature-subset strategy evaluated at every split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaxFeatures {
    Sqrt,
    Log2,
    All,
}

impl MaxFeatures {
    pub const ALL: [MaxFeatures; 3] = [MaxFeatures::Sqrt, MaxFeatures::Log2, MaxFeatures::All];

    /// Number of features drawn per split for `n_features` columns (at least 1).
    pub fn resolve(self, n_features: usize) -> usize {
        let n = n_features as f64;
        let k = match self {
            MaxFeatures::Sqrt => n.sqrt().floor() as usize,
            MaxFeatures::Log2 => {
                if n_features == 0 {
                    0
                } else {
                    n.log2().floor() as usize
                }
            }
            MaxFeatures::All => n_features,
        };
        k.clamp(1, n_features.max(1))
    }

    pub fn label(self) -> &'static str {
        match self {
            MaxFeatures::Sqrt => "sqrt",
            MaxFeatures::Log2 => "log2",
            MaxFeatures::All => "all",
        }
    }
}

/// One sampled assignment of the ensemble's hyperparameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HyperparameterCandidate {
    pub n_estimators: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: MaxFeatures,
    pub bootstrap: bool,
    pub max_leaf_nodes: usize,
}

/// Settings for the randomized walk-forward search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TunerConfig {
    /// Number of walk-forward validation folds.
    pub n_splits: usize,
    /// Number of random candidates to evaluate.
    pub n_iter: usize,
    /// Base seed for candidate sampling and forest fitting.
    pub seed: u64,
}

impl Default for TunerConfig {
    fn default() -> Self {
        Self {
            n_splits: 5,
            n_iter: 40,
            seed: 1,
        }
    }
}

/// A full forecast run's configuration, derived from CLI flags.
#[derive(Debug, Clone)]
pub struct ForecastConfig {
    pub target: String,
    pub date_column: String,
    pub tuner: TunerConfig,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            target: "close_price".to_string(),
            date_column: "date".to_string(),
            tuner: TunerConfig::default(),
        }
    }
}

/// Output of the forecasting side.
#[derive(Debug, Clone, Serialize)]
pub struct ForecastOutput {
    pub predicted_next_price: f64,
    /// `ln(predicted_next_price / last_actual)`.
    pub drift: f64,
    /// Out-of-sample MAE on the held-out test partition.
    pub held_out_mae: f64,
    /// Mean walk-forward validation MAE of the winning candidate.
    pub cv_mae: f64,
    pub last_actual: f64,
    pub best_candidate: HyperparameterCandidate,
    pub feature_names: Vec<String>,
    pub train_rows: usize,
    pub test_rows: usize,
}

/// Scalar assumptions for the DCF projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DcfAssumptions {
    pub revenues: Vec<f64>,
    pub ebitda_margins: Vec<f64>,
    pub wacc: f64,
    pub terminal_growth_rate: f64,
    pub tax_rate: f64,
    pub d_a_percent_revenue: f64,
    pub nwc_percent_revenue: f64,
    pub capex_percent_revenue: f64,
    pub net_debt: f64,
    pub shares_outstanding: f64,
}

impl DcfAssumptions {
    /// Illustrative five-year projection (10% revenue growth).
    ///
    /// Only the `demo` command uses it; real runs must supply their own file.
    pub fn example() -> Self {
        Self {
            revenues: vec![
                1_000_000_000.0,
                1_100_000_000.0,
                1_210_000_000.0,
                1_331_000_000.0,
                1_464_100_000.0,
            ],
            ebitda_margins: vec![0.60, 0.68, 0.70, 0.70, 0.70],
            wacc: 0.09,
            terminal_growth_rate: 0.025,
            tax_rate: 0.21,
            d_a_percent_revenue: 0.03,
            nwc_percent_revenue: 0.06,
            capex_percent_revenue: 0.05,
            net_debt: 1000.0,
            shares_outstanding: 100_000_000.0,
        }
    }
}

/// One projected year of the DCF.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CashFlowRow {
    pub year: usize,
    pub revenue: f64,
    pub ebitda_margin: f64,
    pub ebitda: f64,
    pub d_and_a: f64,
    pub ebit: f64,
    pub nopat: f64,
    pub capex: f64,
    pub nwc: f64,
    pub change_in_nwc: f64,
    pub fcff: f64,
    pub discount_factor: f64,
    pub pv_fcff: f64,
}

/// Headline valuation numbers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValuationResult {
    pub enterprise_value: f64,
    pub equity_value: f64,
    pub implied_price: f64,
}

/// Full DCF output: the projection table plus terminal value and headline numbers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Valuation {
    pub rows: Vec<CashFlowRow>,
    pub terminal_value: f64,
    pub pv_terminal_value: f64,
    pub result: ValuationResult,
}

/// Directional trading signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Long,
    Short,
    Hold,
}

impl Signal {
    pub fn label(self) -> &'static str {
        match self {
            Signal::Long => "LONG",
            Signal::Short => "SHORT",
            Signal::Hold => "HOLD",
        }
    }
}

/// Comparator output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Recommendation {
    pub signal: Signal,
    /// Absolute difference between the implied and the predicted price.
    pub delta: f64,
    pub implied_price: f64,
    pub predicted_price: f64,
}

/// Optional output files for a run.
#[derive(Debug, Clone, Default)]
pub struct ExportPaths {
    pub json: Option<PathBuf>,
    pub cashflows: Option<PathBuf>,
    pub debug_bundle: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_features_resolves_like_common_heuristics() {
        assert_eq!(MaxFeatures::Sqrt.resolve(9), 3);
        assert_eq!(MaxFeatures::Sqrt.resolve(10), 3);
        assert_eq!(MaxFeatures::Log2.resolve(8), 3);
        assert_eq!(MaxFeatures::Log2.resolve(9), 3);
        assert_eq!(MaxFeatures::All.resolve(9), 9);
        // Never zero, never more than available.
        assert_eq!(MaxFeatures::Log2.resolve(1), 1);
        assert_eq!(MaxFeatures::Sqrt.resolve(1), 1);
    }

    #[test]
    fn assumptions_reject_unknown_fields() {
        let mut json = serde_json::to_value(DcfAssumptions::example()).unwrap();
        json["discount"] = serde_json::json!(0.1);
        let parsed: Result<DcfAssumptions, _> = serde_json::from_value(json);
        assert!(parsed.is_err());
    }
}
