//! Forecast runner: split, tune, refit, score out-of-sample, predict next close.
//!
//! The input must already carry the lagged features (see `features`). The
//! runner never touches the test partition until the tuned model is final,
//! and the next-step prediction is a separate call whose output never feeds
//! the held-out MAE.

use tracing::info;

use crate::data::{Dataset, chrono_split};
use crate::domain::{ForecastConfig, ForecastOutput};
use crate::error::{AppError, DataError};
use crate::math::mean_absolute_error;
use crate::models::RandomForest;
use crate::tuning::{TrialResult, tune};

/// Forecast outputs plus the search trace (for reporting / debug bundles).
#[derive(Debug, Clone)]
pub struct ForecastRun {
    pub output: ForecastOutput,
    pub trials: Vec<TrialResult>,
    pub winning_trial: usize,
    pub dataset_rows: usize,
}

pub fn run_forecast(features: &Dataset, config: &ForecastConfig) -> Result<ForecastRun, AppError> {
    features.require_column(&config.target).map_err(|e| e.in_stage("forecast"))?;
    let split = chrono_split(features, &config.date_column, &config.target).map_err(|e| e.in_stage("split"))?;

    let tuned = tune(&split.train_x, &split.train_y, &config.tuner)?;

    // Refit on the full training partition; the search's own refit is discarded.
    let model = RandomForest::fit(&tuned.forest_params(), &split.train_x, &split.train_y)?;

    let test_pred = model.predict(&split.test_x)?;
    let held_out_mae = mean_absolute_error(&split.test_y, &test_pred)
        .filter(|m| m.is_finite())
        .ok_or_else(|| AppError::new(4, "forecast: held-out MAE is undefined"))?;

    // Most recent row of the full (sorted) feature matrix, not of the test slice.
    let full = features
        .sorted_by(&config.date_column)
        .and_then(|sorted| sorted.feature_matrix(&config.target))
        .map_err(|e| e.in_stage("forecast"))?;
    let (last_row, last_actual) = match (full.x.last(), full.y.last()) {
        (Some(row), Some(&y)) => (row, y),
        _ => return Err(DataError::TooFewRows { rows: 0, required: 2 }.in_stage("forecast")),
    };

    let predicted_next_price = model.predict_one(last_row)?;
    if !(predicted_next_price > 0.0 && last_actual > 0.0) || !predicted_next_price.is_finite() {
        return Err(DataError::NonPositiveForecast(predicted_next_price).in_stage("forecast"));
    }
    let drift = (predicted_next_price / last_actual).ln();

    info!(
        predicted_next_price,
        drift,
        held_out_mae,
        cv_mae = tuned.cv_mae,
        "forecast complete"
    );

    Ok(ForecastRun {
        output: ForecastOutput {
            predicted_next_price,
            drift,
            held_out_mae,
            cv_mae: tuned.cv_mae,
            last_actual,
            best_candidate: tuned.candidate,
            feature_names: split.feature_names,
            train_rows: split.train_y.len(),
            test_rows: split.test_y.len(),
        },
        trials: tuned.trials,
        winning_trial: tuned.trial,
        dataset_rows: features.n_rows(),
    })
}
