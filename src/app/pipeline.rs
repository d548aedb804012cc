//! Shared pipeline logic used by every subcommand.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! raw dataset -> lagged features -> split/tune/forecast -> DCF -> decision
//!
//! The command handlers can then focus on presentation (printing vs exports).

use crate::data::{Dataset, SeriesSpec, generate_series};
use crate::decision::compare;
use crate::domain::{DcfAssumptions, ForecastConfig, Recommendation, Valuation};
use crate::error::AppError;
use crate::features::FeatureBuilder;
use crate::forecast::{ForecastRun, run_forecast};
use crate::valuation::{calculate_dcf, validate};

/// All computed outputs of a full run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub forecast: ForecastRun,
    pub valuation: Valuation,
    pub recommendation: Recommendation,
}

/// Engineer features on a raw price dataset and run the forecaster.
pub fn forecast_from_prices(prices: &Dataset, config: &ForecastConfig) -> Result<ForecastRun, AppError> {
    let features = FeatureBuilder::new(&config.date_column, &config.target)
        .build(prices)
        .map_err(|e| e.in_stage("features"))?;
    run_forecast(&features, config)
}

/// Execute the full pipeline: forecast, valuation, decision.
///
/// Assumptions are validated before any model is fitted, so a bad
/// assumptions file fails fast and never yields a recommendation.
pub fn run_full(
    prices: &Dataset,
    assumptions: &DcfAssumptions,
    config: &ForecastConfig,
) -> Result<RunOutput, AppError> {
    validate(assumptions)?;

    let forecast = forecast_from_prices(prices, config)?;
    let valuation = calculate_dcf(assumptions)?;
    let recommendation = compare(forecast.output.predicted_next_price, valuation.result.implied_price);

    Ok(RunOutput {
        forecast,
        valuation,
        recommendation,
    })
}

/// Synthetic price dataset for the `demo` command.
pub fn demo_prices(spec: &SeriesSpec, config: &ForecastConfig) -> Result<Dataset, AppError> {
    let records = generate_series(spec)?;
    Dataset::from_records(&config.date_column, &config.target, &[], &records)
        .map_err(|e| e.in_stage("demo"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Signal, TunerConfig};

    fn config() -> ForecastConfig {
        ForecastConfig {
            tuner: TunerConfig {
                n_splits: 3,
                n_iter: 2,
                seed: 3,
            },
            ..ForecastConfig::default()
        }
    }

    fn prices(n_days: usize) -> Dataset {
        let spec = SeriesSpec {
            n_days,
            ..SeriesSpec::default()
        };
        demo_prices(&spec, &config()).unwrap()
    }

    #[test]
    fn full_run_compares_forecast_with_dcf() {
        let out = run_full(&prices(80), &DcfAssumptions::example(), &config()).unwrap();
        let rec = out.recommendation;

        assert_eq!(rec.implied_price, out.valuation.result.implied_price);
        assert_eq!(rec.predicted_price, out.forecast.output.predicted_next_price);
        let expected = if rec.implied_price < rec.predicted_price {
            Signal::Short
        } else if rec.implied_price > rec.predicted_price {
            Signal::Long
        } else {
            Signal::Hold
        };
        assert_eq!(rec.signal, expected);
    }

    #[test]
    fn bad_assumptions_fail_before_forecasting() {
        let mut a = DcfAssumptions::example();
        a.terminal_growth_rate = 0.2;
        // Too short to forecast: the valuation error must surface first.
        let err = run_full(&prices(5), &a, &config()).unwrap_err();
        assert!(err.message().starts_with("valuation:"), "{}", err.message());
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn short_history_is_reported_as_a_feature_error() {
        let err = forecast_from_prices(&prices(10), &config()).unwrap_err();
        assert_eq!(err.exit_code(), 3);
        assert!(err.message().starts_with("features:"), "{}", err.message());
    }

    #[test]
    fn walk_forward_shortfall_is_reported_by_the_tuner() {
        let cfg = ForecastConfig {
            tuner: TunerConfig {
                n_splits: 5,
                ..config().tuner
            },
            ..config()
        };
        // 26 closes leave 5 feature rows and 4 training rows.
        let err = forecast_from_prices(&prices(26), &cfg).unwrap_err();
        assert_eq!(err.exit_code(), 3);
        assert_eq!(err.message(), "tuning: 4 training row(s) cannot form 5 walk-forward folds");
    }
}
