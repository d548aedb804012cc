//! Run exports.
//!
//! - the per-year cash-flow table as CSV (spreadsheet friendly)
//! - the whole run result as pretty JSON

use std::fs::File;
use std::path::Path;

use serde::Serialize;

use crate::decision::recommendation_message;
use crate::domain::{CashFlowRow, ForecastOutput, Recommendation, Valuation, ValuationResult};
use crate::error::AppError;

/// JSON view of a run. Sections a subcommand did not compute are omitted.
#[derive(Debug, Serialize)]
pub struct RunExport<'a> {
    pub tool: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forecast: Option<&'a ForecastOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valuation: Option<ValuationExport<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<RecommendationExport<'a>>,
}

#[derive(Debug, Serialize)]
pub struct ValuationExport<'a> {
    #[serde(flatten)]
    pub result: &'a ValuationResult,
    pub terminal_value: f64,
    pub pv_terminal_value: f64,
    pub cash_flows: &'a [CashFlowRow],
}

#[derive(Debug, Serialize)]
pub struct RecommendationExport<'a> {
    #[serde(flatten)]
    pub recommendation: &'a Recommendation,
    pub message: String,
}

impl<'a> RunExport<'a> {
    pub fn new(
        forecast: Option<&'a ForecastOutput>,
        valuation: Option<&'a Valuation>,
        recommendation: Option<&'a Recommendation>,
    ) -> Self {
        Self {
            tool: "dsig",
            forecast,
            valuation: valuation.map(|v| ValuationExport {
                result: &v.result,
                terminal_value: v.terminal_value,
                pv_terminal_value: v.pv_terminal_value,
                cash_flows: &v.rows,
            }),
            recommendation: recommendation.map(|r| RecommendationExport {
                recommendation: r,
                message: recommendation_message(r),
            }),
        }
    }
}

/// Write the run result as pretty JSON.
pub fn write_result_json(path: &Path, export: &RunExport<'_>) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create result JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, export)
        .map_err(|e| AppError::new(2, format!("Failed to write result JSON: {e}")))?;
    Ok(())
}

/// Write the per-year cash-flow table to a CSV file.
pub fn write_cashflows_csv(path: &Path, rows: &[CashFlowRow]) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::new(2, format!("Failed to create cash-flow CSV '{}': {e}", path.display())))?;
    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| AppError::new(2, format!("Failed to write cash-flow CSV row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush cash-flow CSV: {e}")))?;
    Ok(())
}
