//! Walk-forward (forward-chaining) cross-validation folds.
//!
//! The training partition is cut into `n_splits + 1` chronological blocks.
//! Fold `j` validates on block `j` and trains on every row before it, so no
//! fold ever validates on data that precedes its own training data. When the
//! row count does not divide evenly, the remainder goes to the first block.

use std::ops::Range;

use crate::error::DataError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    /// 1-based fold number.
    pub index: usize,
    pub train: Range<usize>,
    pub validation: Range<usize>,
}

pub fn walk_forward_folds(n_rows: usize, n_splits: usize) -> Result<Vec<Fold>, DataError> {
    let block = if n_splits == 0 { 0 } else { n_rows / (n_splits + 1) };
    if block == 0 {
        return Err(DataError::InsufficientHistory {
            rows: n_rows,
            splits: n_splits,
        });
    }

    Ok((1..=n_splits)
        .map(|j| {
            let start = n_rows - (n_splits - j + 1) * block;
            Fold {
                index: j,
                train: 0..start,
                validation: start..start + block,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_chain_forward_and_tile_the_tail() {
        let folds = walk_forward_folds(17, 5).unwrap();
        assert_eq!(folds.len(), 5);
        assert_eq!(folds[0].train, 0..7);
        assert_eq!(folds[0].validation, 7..9);
        assert_eq!(folds[4].validation, 15..17);

        for pair in folds.windows(2) {
            assert_eq!(pair[0].validation.end, pair[1].validation.start);
            assert!(pair[0].train.end < pair[1].train.end);
        }
    }

    #[test]
    fn validation_always_follows_training() {
        for n in 6..120 {
            for k in 1..=5 {
                let Ok(folds) = walk_forward_folds(n, k) else {
                    continue;
                };
                for f in &folds {
                    assert!(!f.train.is_empty());
                    assert!(!f.validation.is_empty());
                    assert_eq!(f.train.end, f.validation.start);
                    assert!(f.validation.end <= n);
                }
                assert_eq!(folds.last().unwrap().validation.end, n);
            }
        }
    }

    #[test]
    fn validation_dates_are_later_than_training_dates() {
        use crate::data::{Dataset, chrono_split, linear_series};
        use chrono::NaiveDate;

        let start = NaiveDate::from_ymd_opt(2023, 3, 1).unwrap();
        let mut records = linear_series(start, 50.0, 0.25, 60);
        records.reverse();
        let ds = Dataset::from_records("date", "close_price", &[], &records).unwrap();
        let split = chrono_split(&ds, "date", "close_price").unwrap();
        let dates = &split.train_dates;

        for f in walk_forward_folds(dates.len(), 5).unwrap() {
            let last_train = dates[f.train.clone()].iter().cloned().fold(f64::MIN, f64::max);
            let first_valid = dates[f.validation.clone()].iter().cloned().fold(f64::MAX, f64::min);
            assert!(last_train < first_valid, "fold {}", f.index);
        }
    }

    #[test]
    fn too_few_rows_fail() {
        assert_eq!(
            walk_forward_folds(5, 5).unwrap_err(),
            DataError::InsufficientHistory { rows: 5, splits: 5 }
        );
        assert!(walk_forward_folds(10, 0).is_err());
    }
}
