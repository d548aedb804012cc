//! Chronological train/test partitioning.
//!
//! A shuffled split would mix future rows into training and leak information
//! backwards. Instead the dataset is sorted by date (stable) and cut once by
//! position: the earliest 90% of rows train, the latest 10% test.

use std::ops::Range;

use tracing::debug;

use crate::data::dataset::Dataset;
use crate::error::DataError;

/// Train share numerator/denominator (`floor(9n / 10)` rows train).
const TRAIN_NUM: usize = 9;
const TRAIN_DEN: usize = 10;

/// Number of training rows for a dataset of `n` rows.
pub fn split_point(n: usize) -> usize {
    n * TRAIN_NUM / TRAIN_DEN
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainTestSplit {
    pub feature_names: Vec<String>,
    pub train_x: Vec<Vec<f64>>,
    pub test_x: Vec<Vec<f64>>,
    pub train_y: Vec<f64>,
    pub test_y: Vec<f64>,
    /// Positions (after sorting) that ended up in each partition.
    pub train_range: Range<usize>,
    pub test_range: Range<usize>,
    /// Date-column values of each partition, in order.
    pub train_dates: Vec<f64>,
    pub test_dates: Vec<f64>,
}

/// Sort `dataset` by `date_column` and cut it at `floor(0.9 * n)`.
///
/// Features are every column except `target` (the date column included).
pub fn chrono_split(dataset: &Dataset, date_column: &str, target: &str) -> Result<TrainTestSplit, DataError> {
    let n = dataset.n_rows();
    if n < 2 {
        return Err(DataError::TooFewRows { rows: n, required: 2 });
    }
    dataset.require_column(target)?;

    let sorted = dataset.sorted_by(date_column)?;
    let dates = sorted.column_values(date_column)?;
    let fm = sorted.feature_matrix(target)?;

    let cut = split_point(n);
    let mut x = fm.x;
    let mut y = fm.y;
    let test_x = x.split_off(cut);
    let test_y = y.split_off(cut);

    debug!(rows = n, train = cut, test = n - cut, "chronological split");

    Ok(TrainTestSplit {
        feature_names: fm.names,
        train_x: x,
        test_x,
        train_y: y,
        test_y,
        train_range: 0..cut,
        test_range: cut..n,
        train_dates: dates[..cut].to_vec(),
        test_dates: dates[cut..].to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Column, ColumnKind};

    fn shuffled(n: usize) -> Dataset {
        // Deliberately out of order so the split has to sort.
        let rows = (0..n)
            .map(|i| {
                let day = ((i * 7) % n) as f64;
                vec![day, 100.0 + day, day * 2.0]
            })
            .collect();
        Dataset::new(
            vec![
                Column::new("date", ColumnKind::Date),
                Column::new("close_price", ColumnKind::Target),
                Column::new("x", ColumnKind::Numeric),
            ],
            rows,
        )
        .unwrap()
    }

    #[test]
    fn split_is_ordered_for_all_small_sizes() {
        for n in 2..60 {
            if n % 7 == 0 {
                continue; // `i * 7 % n` would not be a permutation
            }
            let split = chrono_split(&shuffled(n), "date", "close_price").unwrap();
            assert_eq!(split.train_y.len(), n * 9 / 10, "n={n}");
            assert_eq!(split.train_y.len() + split.test_y.len(), n);
            assert!(!split.test_y.is_empty());
            assert!(split.train_range.end <= split.test_range.start);

            let last_train = split.train_dates.iter().cloned().fold(f64::MIN, f64::max);
            let first_test = split.test_dates.iter().cloned().fold(f64::MAX, f64::min);
            assert!(last_train < first_test, "n={n}");
        }
    }

    #[test]
    fn features_keep_date_and_drop_target() {
        let split = chrono_split(&shuffled(10), "date", "close_price").unwrap();
        assert_eq!(split.feature_names, vec!["date".to_string(), "x".to_string()]);
        assert_eq!(split.train_x[0], vec![0.0, 0.0]);
        assert_eq!(split.test_y, vec![109.0]);
    }

    #[test]
    fn ties_keep_original_order() {
        let ds = Dataset::new(
            vec![
                Column::new("date", ColumnKind::Date),
                Column::new("close_price", ColumnKind::Target),
            ],
            vec![vec![1.0, 10.0], vec![0.0, 5.0], vec![1.0, 11.0]],
        )
        .unwrap();
        let split = chrono_split(&ds, "date", "close_price").unwrap();
        assert_eq!(split.train_y, vec![5.0, 10.0]);
        assert_eq!(split.test_y, vec![11.0]);
    }

    #[test]
    fn degenerate_inputs_fail() {
        let one = Dataset::new(
            vec![
                Column::new("date", ColumnKind::Date),
                Column::new("close_price", ColumnKind::Target),
            ],
            vec![vec![0.0, 1.0]],
        )
        .unwrap();
        assert_eq!(
            chrono_split(&one, "date", "close_price").unwrap_err(),
            DataError::TooFewRows { rows: 1, required: 2 }
        );
        assert_eq!(
            chrono_split(&shuffled(5), "date", "price").unwrap_err(),
            DataError::MissingColumn("price".to_string())
        );
    }
}
