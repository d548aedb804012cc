//! Immutable, schema-typed numeric table.
//!
//! Every stage takes a `&Dataset` and returns a new one; nothing mutates a
//! caller-owned table. Construction validates shape and finiteness once, so a
//! `Dataset` can never carry an undefined value into the splitter or the model.

use chrono::{Datelike, NaiveDate};

use crate::domain::{Column, ColumnKind, PriceRecord};
use crate::error::DataError;

/// Convert a calendar date into the day ordinal used by the date column.
pub fn date_ordinal(date: NaiveDate) -> f64 {
    f64::from(date.num_days_from_ce())
}

/// Inverse of [`date_ordinal`].
pub fn ordinal_date(ordinal: f64) -> Option<NaiveDate> {
    if !ordinal.is_finite() || ordinal.fract() != 0.0 {
        return None;
    }
    let days = i32::try_from(ordinal as i64).ok()?;
    NaiveDate::from_num_days_from_ce_opt(days)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    columns: Vec<Column>,
    rows: Vec<Vec<f64>>,
}

/// Feature matrix + target vector extracted from a dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    pub names: Vec<String>,
    pub x: Vec<Vec<f64>>,
    pub y: Vec<f64>,
}

impl Dataset {
    pub fn new(columns: Vec<Column>, rows: Vec<Vec<f64>>) -> Result<Self, DataError> {
        let width = columns.len();
        for (i, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(DataError::RaggedRow {
                    row: i,
                    got: row.len(),
                    expected: width,
                });
            }
            for (value, col) in row.iter().zip(&columns) {
                if value.is_nan() {
                    return Err(DataError::UndefinedFeature {
                        column: col.name.clone(),
                        row: i,
                    });
                }
                if !value.is_finite() {
                    return Err(DataError::NonFinite {
                        column: col.name.clone(),
                        row: i,
                    });
                }
            }
        }
        Ok(Self { columns, rows })
    }

    /// Build a dataset with schema `[date, target, extras...]` from raw records.
    pub fn from_records(
        date_column: &str,
        target: &str,
        extra_columns: &[String],
        records: &[PriceRecord],
    ) -> Result<Self, DataError> {
        let mut columns = Vec::with_capacity(2 + extra_columns.len());
        columns.push(Column::new(date_column, ColumnKind::Date));
        columns.push(Column::new(target, ColumnKind::Target));
        columns.extend(extra_columns.iter().map(|name| Column::new(name.as_str(), ColumnKind::Numeric)));

        let rows = records
            .iter()
            .map(|r| {
                let mut row = Vec::with_capacity(columns.len());
                row.push(date_ordinal(r.date));
                row.push(r.close_price);
                row.extend_from_slice(&r.extras);
                row
            })
            .collect();

        Self::new(columns, rows)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn require_column(&self, name: &str) -> Result<usize, DataError> {
        self.column_index(name)
            .ok_or_else(|| DataError::MissingColumn(name.to_string()))
    }

    pub fn column_values(&self, name: &str) -> Result<Vec<f64>, DataError> {
        let idx = self.require_column(name)?;
        Ok(self.rows.iter().map(|r| r[idx]).collect())
    }

    /// Copy of this dataset sorted ascending by `column`.
    ///
    /// The sort is stable: rows with equal keys keep their original order.
    pub fn sorted_by(&self, column: &str) -> Result<Dataset, DataError> {
        let idx = self.require_column(column)?;
        let mut rows = self.rows.clone();
        rows.sort_by(|a, b| a[idx].total_cmp(&b[idx]));
        Ok(Dataset {
            columns: self.columns.clone(),
            rows,
        })
    }

    /// Append derived columns, dropping every row where any new value is undefined.
    ///
    /// `values[j][i]` is the value of new column `j` at existing row `i`.
    pub fn with_derived_columns(
        &self,
        new_columns: Vec<Column>,
        values: &[Vec<Option<f64>>],
    ) -> Result<Dataset, DataError> {
        let n = self.n_rows();
        if let Some(bad) = values.iter().find(|v| v.len() != n) {
            return Err(DataError::RaggedRow {
                row: 0,
                got: bad.len(),
                expected: n,
            });
        }

        let mut columns = self.columns.clone();
        columns.extend(new_columns);

        let rows = self
            .rows
            .iter()
            .enumerate()
            .filter_map(|(i, row)| {
                let derived: Option<Vec<f64>> = values.iter().map(|col| col[i]).collect();
                derived.map(|d| {
                    let mut out = row.clone();
                    out.extend(d);
                    out
                })
            })
            .collect();

        Dataset::new(columns, rows)
    }

    /// Split into a feature matrix (every column except `target`) and the target vector.
    pub fn feature_matrix(&self, target: &str) -> Result<FeatureMatrix, DataError> {
        let t = self.require_column(target)?;
        let names = self
            .columns
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != t)
            .map(|(_, c)| c.name.clone())
            .collect();
        let x = self
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .filter(|(i, _)| *i != t)
                    .map(|(_, v)| *v)
                    .collect()
            })
            .collect();
        let y = self.rows.iter().map(|row| row[t]).collect();
        Ok(FeatureMatrix { names, x, y })
    }
}
