//! Lagged price features.
//!
//! Every feature is computed over a trailing window and then shifted forward
//! one period, so the value attached to date `t` only uses closes up to `t - 1`.
//! Rows whose window is incomplete are dropped rather than imputed.

use tracing::info;

use crate::data::Dataset;
use crate::domain::{Column, ColumnKind};
use crate::error::DataError;
use crate::math::{pct_change, rolling_mean, rolling_std, shift};

/// Trading days in a week / month window.
pub const WEEK: usize = 5;
pub const MONTH: usize = 20;

/// Leading rows lost to the longest lookback (20-period change, shifted once).
pub const WARMUP_ROWS: usize = MONTH + 1;

pub const FEATURE_NAMES: [&str; 7] = [
    "yday_return",
    "return_week",
    "return_month",
    "mean_week",
    "mean_month",
    "vol_week",
    "vol_month",
];

/// Appends the lagged return/mean/volatility features to a price dataset.
#[derive(Debug, Clone)]
pub struct FeatureBuilder {
    date_column: String,
    target: String,
}

impl FeatureBuilder {
    pub fn new(date_column: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            date_column: date_column.into(),
            target: target.into(),
        }
    }

    /// Return a new dataset, sorted by date, with the seven features appended
    /// and the warm-up rows removed. The input is left untouched.
    pub fn build(&self, dataset: &Dataset) -> Result<Dataset, DataError> {
        let sorted = dataset.sorted_by(&self.date_column)?;

        let dates = sorted.column_values(&self.date_column)?;
        if let Some(w) = dates.windows(2).find(|w| w[0] == w[1]) {
            return Err(DataError::DuplicateDate(w[0] as i64));
        }

        let close = sorted.column_values(&self.target)?;
        if let Some((row, &value)) = close.iter().enumerate().find(|(_, v)| **v <= 0.0) {
            return Err(DataError::NonPositivePrice { row, value });
        }

        let values = price_features(&close);
        let columns = FEATURE_NAMES
            .iter()
            .map(|name| Column::new(*name, ColumnKind::Numeric))
            .collect();
        let out = sorted.with_derived_columns(columns, &values)?;

        if out.is_empty() {
            return Err(DataError::TooFewRows {
                rows: dataset.n_rows(),
                required: WARMUP_ROWS + 1,
            });
        }

        info!(
            rows_in = dataset.n_rows(),
            rows_out = out.n_rows(),
            "engineered lagged price features"
        );
        Ok(out)
    }
}

/// Feature columns for a chronologically ordered close series, in
/// [`FEATURE_NAMES`] order.
pub fn price_features(close: &[f64]) -> Vec<Vec<Option<f64>>> {
    vec![
        shift(&pct_change(close, 1), 1),
        shift(&pct_change(close, WEEK), 1),
        shift(&pct_change(close, MONTH), 1),
        shift(&rolling_mean(close, WEEK), 1),
        shift(&rolling_mean(close, MONTH), 1),
        shift(&rolling_std(close, WEEK), 1),
        shift(&rolling_std(close, MONTH), 1),
    ]
}
