//! DCF assumptions file (JSON).
//!
//! The file is a single object whose fields mirror `domain::DcfAssumptions`.
//! Unknown fields are rejected and nothing is defaulted: a missing field is an
//! error rather than a silent fallback to example numbers.

use std::fs::File;
use std::path::Path;

use crate::domain::DcfAssumptions;
use crate::error::AppError;
use crate::valuation::validate;

/// Read and validate an assumptions JSON file.
pub fn read_assumptions(path: &Path) -> Result<DcfAssumptions, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to open assumptions JSON '{}': {e}", path.display()),
        )
    })?;
    let assumptions: DcfAssumptions = serde_json::from_reader(file)
        .map_err(|e| AppError::new(2, format!("Invalid assumptions JSON '{}': {e}", path.display())))?;
    validate(&assumptions)?;
    Ok(assumptions)
}

/// Write assumptions as pretty JSON (handy as a template for real runs).
pub fn write_assumptions(path: &Path, assumptions: &DcfAssumptions) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to create assumptions JSON '{}': {e}", path.display()),
        )
    })?;
    serde_json::to_writer_pretty(file, assumptions)
        .map_err(|e| AppError::new(2, format!("Failed to write assumptions JSON: {e}")))?;
    Ok(())
}
