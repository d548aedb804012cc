//! Error types.
//!
//! Each pipeline stage reports a typed error. At the binary boundary every
//! stage error collapses into an [`AppError`] carrying a process exit code and
//! a message that names the failing stage.
//!
//! Exit codes:
//! - `2`: invalid input or configuration
//! - `3`: insufficient data
//! - `4`: numerical / model failure

use thiserror::Error;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// Dataset precondition violations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    #[error("dataset has {rows} row(s); at least {required} are required")]
    TooFewRows { rows: usize, required: usize },

    #[error("missing column `{0}`")]
    MissingColumn(String),

    #[error("row {row} has {got} value(s), expected {expected}")]
    RaggedRow { row: usize, got: usize, expected: usize },

    #[error("column `{column}` is undefined at row {row}")]
    UndefinedFeature { column: String, row: usize },

    #[error("duplicate date ordinal {0} (dates must be unique)")]
    DuplicateDate(i64),

    #[error("non-positive price {value} at row {row}")]
    NonPositivePrice { row: usize, value: f64 },

    #[error("non-finite value in column `{column}` at row {row}")]
    NonFinite { column: String, row: usize },

    #[error("{rows} training row(s) cannot form {splits} walk-forward folds")]
    InsufficientHistory { rows: usize, splits: usize },

    #[error("forecast of {0} cannot be converted to a log drift")]
    NonPositiveForecast(f64),
}

/// A single hyperparameter trial that could not be fitted or scored.
///
/// Absorbed inside the search: the trial is logged and excluded from selection.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("trial {trial} failed on fold {fold}: {source}")]
pub struct SearchTrialError {
    pub trial: usize,
    pub fold: usize,
    #[source]
    pub source: FitError,
}

/// Fatal search failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SearchError {
    #[error("all {0} hyperparameter trial(s) failed; no usable model")]
    AllTrialsFailed(usize),

    #[error("invalid search configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error("refit of the winning candidate failed: {0}")]
    Refit(FitError),
}

/// DCF inputs that make the valuation undefined.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValuationPreconditionError {
    #[error("WACC ({wacc}) must exceed the terminal growth rate ({growth})")]
    RateOrdering { wacc: f64, growth: f64 },

    #[error("revenues ({revenues}) and EBITDA margins ({margins}) differ in length")]
    LengthMismatch { revenues: usize, margins: usize },

    #[error("projection has no forecast years")]
    EmptyProjection,

    #[error("revenue for year {year} must be strictly positive (got {value})")]
    NonPositiveRevenue { year: usize, value: f64 },

    #[error("shares outstanding must be strictly positive (got {0})")]
    NonPositiveShares(f64),

    #[error("assumption `{0}` is not a finite number")]
    NonFinite(&'static str),
}

/// Tree / forest fitting failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    #[error("training set is empty")]
    EmptyTrainingSet,

    #[error("row {row} has {got} feature(s), expected {expected}")]
    WidthMismatch { row: usize, got: usize, expected: usize },

    #[error("non-finite value in training data at row {0}")]
    NonFinite(usize),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

impl DataError {
    pub fn exit_code(&self) -> u8 {
        match self {
            DataError::TooFewRows { .. } | DataError::InsufficientHistory { .. } => 3,
            DataError::NonPositiveForecast(_) => 4,
            _ => 2,
        }
    }

    /// Convert into an [`AppError`] whose message names `stage`.
    pub fn in_stage(&self, stage: &str) -> AppError {
        AppError::new(self.exit_code(), format!("{stage}: {self}"))
    }
}

impl From<SearchError> for AppError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::Data(inner) => inner.in_stage("tuning"),
            SearchError::InvalidConfig(_) => AppError::new(2, format!("tuning: {err}")),
            SearchError::AllTrialsFailed(_) | SearchError::Refit(_) => {
                AppError::new(4, format!("tuning: {err}"))
            }
        }
    }
}

impl From<ValuationPreconditionError> for AppError {
    fn from(err: ValuationPreconditionError) -> Self {
        AppError::new(2, format!("valuation: {err}"))
    }
}

impl From<FitError> for AppError {
    fn from(err: FitError) -> Self {
        AppError::new(4, format!("forecast: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_errors_map_to_exit_codes() {
        let e = DataError::TooFewRows { rows: 1, required: 2 }.in_stage("split");
        assert_eq!(e.exit_code(), 3);
        assert!(e.message().starts_with("split:"));

        let e: AppError = ValuationPreconditionError::RateOrdering { wacc: 0.02, growth: 0.03 }.into();
        assert_eq!(e.exit_code(), 2);
        assert!(e.message().contains("WACC"));

        let e: AppError = SearchError::AllTrialsFailed(3).into();
        assert_eq!(e.exit_code(), 4);
        assert!(e.message().starts_with("tuning:"));

        let e = DataError::DuplicateDate(738_000).in_stage("features");
        assert_eq!(e.exit_code(), 2);
        assert!(e.message().starts_with("features: duplicate date"));

        let e: AppError = SearchError::Data(DataError::InsufficientHistory { rows: 3, splits: 5 }).into();
        assert_eq!(e.exit_code(), 3);
        assert_eq!(e.message(), "tuning: 3 training row(s) cannot form 5 walk-forward folds");
    }
}
