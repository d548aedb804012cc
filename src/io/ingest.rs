//! CSV ingest for cleaned price tables.
//!
//! The input is expected to be already cleaned: one row per trading date,
//! numeric columns only, no missing values. This module only enforces that
//! contract and builds the typed schema; it never imputes or drops rows.
//!
//! - headers are trimmed, BOM-stripped, lower-cased
//! - the date column accepts a few common date layouts or an integer day ordinal
//!   (compact `YYYYMMDD` wins over the ordinal reading)
//! - any bad row fails the load, reported with its CSV line number

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::ops::RangeInclusive;
use std::path::Path;

use chrono::{Datelike, NaiveDate};
use csv::StringRecord;
use tracing::info;

use crate::data::Dataset;
use crate::domain::{ForecastConfig, PriceRecord};
use crate::error::AppError;

/// Row errors listed in the failure message before truncating.
const MAX_REPORTED_ERRORS: usize = 5;

/// Years a bare integer date may land in when read as a day ordinal.
const ORDINAL_YEARS: RangeInclusive<i32> = 1800..=2200;

/// A row-level error encountered during ingest.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: the typed dataset plus a little provenance for the report.
#[derive(Debug, Clone)]
pub struct IngestedData {
    pub dataset: Dataset,
    pub extra_columns: Vec<String>,
    pub rows_read: usize,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
}

/// Load a cleaned price CSV from disk.
pub fn load_price_table(path: &Path, config: &ForecastConfig) -> Result<IngestedData, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;
    let data = read_price_table(file, config)?;
    info!(
        path = %path.display(),
        rows = data.rows_read,
        extra_columns = data.extra_columns.len(),
        "loaded price table"
    );
    Ok(data)
}

/// Parse a cleaned price table from any reader.
pub fn read_price_table<R: Read>(reader: R, config: &ForecastConfig) -> Result<IngestedData, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers)?;

    let date_name = normalize_header_name(&config.date_column);
    let target_name = normalize_header_name(&config.target);
    let date_idx = require_header(&header_map, &date_name)?;
    let target_idx = require_header(&header_map, &target_name)?;

    // Every other column is a numeric feature, kept in file order.
    let extra: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != date_idx && *i != target_idx)
        .map(|(i, name)| (i, normalize_header_name(name)))
        .collect();

    let mut records = Vec::new();
    let mut row_errors = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // Line 1 is the header.
        let line = idx + 2;
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };
        match parse_row(&record, headers.len(), date_idx, (target_idx, target_name.as_str()), &extra) {
            Ok(r) => records.push(r),
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    if !row_errors.is_empty() {
        return Err(AppError::new(2, format_row_errors(&row_errors)));
    }

    let (first_date, last_date) = match (
        records.iter().map(|r| r.date).min(),
        records.iter().map(|r| r.date).max(),
    ) {
        (Some(a), Some(b)) => (a, b),
        _ => return Err(AppError::new(3, "CSV contains no data rows.")),
    };

    let extra_columns: Vec<String> = extra.into_iter().map(|(_, name)| name).collect();
    let dataset = Dataset::from_records(&date_name, &target_name, &extra_columns, &records)
        .map_err(|e| e.in_stage("ingest"))?;

    Ok(IngestedData {
        dataset,
        extra_columns,
        rows_read: records.len(),
        first_date,
        last_date,
    })
}

fn build_header_map(headers: &StringRecord) -> Result<HashMap<String, usize>, AppError> {
    let mut map = HashMap::with_capacity(headers.len());
    for (idx, name) in headers.iter().enumerate() {
        let name = normalize_header_name(name);
        if name.is_empty() {
            return Err(AppError::new(2, format!("CSV header {} is empty.", idx + 1)));
        }
        if map.insert(name.clone(), idx).is_some() {
            return Err(AppError::new(2, format!("Duplicate CSV column `{name}`.")));
        }
    }
    Ok(map)
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn require_header(header_map: &HashMap<String, usize>, name: &str) -> Result<usize, AppError> {
    header_map
        .get(name)
        .copied()
        .ok_or_else(|| AppError::new(2, format!("Missing required column: `{name}`")))
}

fn parse_row(
    record: &StringRecord,
    width: usize,
    date_idx: usize,
    (target_idx, target_name): (usize, &str),
    extra: &[(usize, String)],
) -> Result<PriceRecord, String> {
    if record.len() != width {
        return Err(format!("expected {width} field(s), found {}", record.len()));
    }
    let field = |idx: usize| record.get(idx).map(str::trim).unwrap_or_default();

    let date = parse_date(field(date_idx))?;
    let close_price = parse_number(field(target_idx), target_name)?;
    let extras = extra
        .iter()
        .map(|(idx, name)| parse_number(field(*idx), name))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(PriceRecord {
        date,
        close_price,
        extras,
    })
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    const FMTS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d-%m-%Y"];
    for fmt in FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d);
        }
    }
    if s.len() == 8 && s.bytes().all(|b| b.is_ascii_digit()) {
        return parse_compact_date(s).ok_or_else(|| format!("Invalid date '{s}' (read as YYYYMMDD)."));
    }
    // Already-converted day ordinal.
    if let Some(d) = s
        .parse::<i32>()
        .ok()
        .and_then(NaiveDate::from_num_days_from_ce_opt)
        .filter(|d| ORDINAL_YEARS.contains(&d.year()))
    {
        return Ok(d);
    }
    Err(format!(
        "Invalid date '{s}'. Expected one of: YYYY-MM-DD, YYYY/MM/DD, DD/MM/YYYY, DD-MM-YYYY, YYYYMMDD, \
         or a day ordinal between years {} and {}.",
        ORDINAL_YEARS.start(),
        ORDINAL_YEARS.end()
    ))
}

fn parse_compact_date(s: &str) -> Option<NaiveDate> {
    let year = s.get(0..4)?.parse().ok()?;
    let month = s.get(4..6)?.parse().ok()?;
    let day = s.get(6..8)?.parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn parse_number(s: &str, column: &str) -> Result<f64, String> {
    if s.is_empty() {
        return Err(format!("missing value in column `{column}`"));
    }
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(format!("invalid number '{s}' in column `{column}`")),
    }
}

fn format_row_errors(errors: &[RowError]) -> String {
    let mut msg = format!("CSV has {} invalid row(s):", errors.len());
    for e in errors.iter().take(MAX_REPORTED_ERRORS) {
        msg.push_str(&format!("\n  line {}: {}", e.line, e.message));
    }
    if errors.len() > MAX_REPORTED_ERRORS {
        msg.push_str(&format!("\n  ... and {} more", errors.len() - MAX_REPORTED_ERRORS));
    }
    msg
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::date_ordinal;
    use std::io::Write;

    fn write_csv(body: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(body.as_bytes()).unwrap();
        f
    }

    #[test]
    fn loads_schema_and_converts_dates() {
        let f = write_csv("\u{feff}Date, Close_Price ,Volume\n2024-01-03,101.5,10\n02/01/2024,100,12\n");
        let data = load_price_table(f.path(), &ForecastConfig::default()).unwrap();

        assert_eq!(data.rows_read, 2);
        assert_eq!(data.extra_columns, vec!["volume".to_string()]);
        assert_eq!(data.first_date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());

        let ds = &data.dataset;
        let names: Vec<&str> = ds.columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["date", "close_price", "volume"]);
        // File order is preserved; sorting happens downstream.
        assert_eq!(
            ds.column_values("date").unwrap()[0],
            date_ordinal(NaiveDate::from_ymd_opt(2024, 1, 3).unwrap())
        );
        assert_eq!(ds.column_values("volume").unwrap(), vec![10.0, 12.0]);
    }

    #[test]
    fn accepts_integer_day_ordinals() {
        let d = NaiveDate::from_ymd_opt(2023, 6, 1).unwrap();
        let ordinal = date_ordinal(d) as i64;
        let csv = format!("date,close_price\n{ordinal},50\n");
        let data = read_price_table(csv.as_bytes(), &ForecastConfig::default()).unwrap();
        assert_eq!(data.first_date, d);
    }

    #[test]
    fn compact_dates_are_not_read_as_ordinals() {
        let csv = "date,close_price\n20240102,50\n20240103,51\n";
        let data = read_price_table(csv.as_bytes(), &ForecastConfig::default()).unwrap();
        assert_eq!(data.first_date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(data.last_date, NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());

        let err = read_price_table("date,close_price\n20241332,50\n".as_bytes(), &ForecastConfig::default())
            .unwrap_err();
        assert!(err.message().contains("YYYYMMDD"), "{}", err.message());

        // Other integers are day ordinals, but only for plausible years.
        let err = read_price_table("date,close_price\n5000,50\n".as_bytes(), &ForecastConfig::default())
            .unwrap_err();
        assert!(err.message().contains("line 2: Invalid date '5000'"), "{}", err.message());
    }

    #[test]
    fn bad_rows_fail_with_line_numbers() {
        let csv = "date,close_price,volume\n2024-01-02,100,1\n2024-01-03,abc,1\n2024-13-40,101,1\n2024-01-05,102\n";
        let err = read_price_table(csv.as_bytes(), &ForecastConfig::default()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        let msg = err.message();
        assert!(msg.contains("3 invalid row(s)"), "{msg}");
        assert!(msg.contains("line 3: invalid number 'abc'"), "{msg}");
        assert!(msg.contains("line 4: Invalid date"), "{msg}");
        assert!(msg.contains("line 5: expected 3 field(s)"), "{msg}");
    }

    #[test]
    fn missing_values_are_not_imputed() {
        let csv = "date,close_price,volume\n2024-01-02,100,\n";
        let err = read_price_table(csv.as_bytes(), &ForecastConfig::default()).unwrap_err();
        assert!(err.message().contains("missing value in column `volume`"));
    }

    #[test]
    fn schema_problems_are_reported() {
        let err = read_price_table("date,price\n2024-01-02,1\n".as_bytes(), &ForecastConfig::default())
            .unwrap_err();
        assert!(err.message().contains("`close_price`"));

        let err = read_price_table("date,close_price,Date\n".as_bytes(), &ForecastConfig::default())
            .unwrap_err();
        assert!(err.message().contains("Duplicate"));

        let err = read_price_table("date,close_price\n".as_bytes(), &ForecastConfig::default()).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn custom_column_names_are_case_insensitive() {
        let cfg = ForecastConfig {
            target: "Adj_Close".into(),
            date_column: "Day".into(),
            ..ForecastConfig::default()
        };
        let data = read_price_table("day,adj_close\n2024-01-02,9.5\n".as_bytes(), &cfg).unwrap();
        assert_eq!(data.dataset.column_values("adj_close").unwrap(), vec![9.5]);
    }
}
