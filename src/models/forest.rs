//! Bagged regression-tree ensemble (random forest).
//!
//! Trees are grown in parallel. Each tree owns its RNG seeded with
//! `seed + tree_index`, so the fitted forest is identical for a given seed no
//! matter how rayon schedules the work.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::domain::{HyperparameterCandidate, MaxFeatures};
use crate::error::FitError;
use crate::models::tree::{RegressionTree, TreeParams};

/// Forest configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: MaxFeatures,
    pub bootstrap: bool,
    pub max_leaf_nodes: Option<usize>,
    pub seed: u64,
}

impl ForestParams {
    pub fn from_candidate(candidate: &HyperparameterCandidate, seed: u64) -> Self {
        Self {
            n_estimators: candidate.n_estimators,
            max_depth: candidate.max_depth,
            min_samples_split: candidate.min_samples_split,
            min_samples_leaf: candidate.min_samples_leaf,
            max_features: candidate.max_features,
            bootstrap: candidate.bootstrap,
            max_leaf_nodes: Some(candidate.max_leaf_nodes),
            seed,
        }
    }

    fn tree_params(&self, n_features: usize) -> TreeParams {
        TreeParams {
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            min_samples_leaf: self.min_samples_leaf,
            max_features: self.max_features.resolve(n_features),
            max_leaf_nodes: self.max_leaf_nodes,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RandomForest {
    trees: Vec<RegressionTree>,
    n_features: usize,
}

impl RandomForest {
    /// Validate the training data and grow `n_estimators` trees.
    pub fn fit(params: &ForestParams, x: &[Vec<f64>], y: &[f64]) -> Result<Self, FitError> {
        if x.is_empty() || y.is_empty() {
            return Err(FitError::EmptyTrainingSet);
        }
        if x.len() != y.len() {
            return Err(FitError::WidthMismatch {
                row: x.len().min(y.len()),
                got: y.len(),
                expected: x.len(),
            });
        }
        if params.n_estimators == 0 {
            return Err(FitError::InvalidParameter("n_estimators must be >= 1".into()));
        }

        let n_features = x[0].len();
        for (i, row) in x.iter().enumerate() {
            if row.len() != n_features {
                return Err(FitError::WidthMismatch {
                    row: i,
                    got: row.len(),
                    expected: n_features,
                });
            }
            if !row.iter().all(|v| v.is_finite()) || !y[i].is_finite() {
                return Err(FitError::NonFinite(i));
            }
        }

        let tree_params = params.tree_params(n_features);
        tree_params.validate()?;

        let n = x.len();
        let trees = (0..params.n_estimators)
            .into_par_iter()
            .map(|i| {
                let mut rng = StdRng::seed_from_u64(params.seed.wrapping_add(i as u64));
                let sample: Vec<usize> = if params.bootstrap {
                    (0..n).map(|_| rng.gen_range(0..n)).collect()
                } else {
                    (0..n).collect()
                };
                RegressionTree::fit(x, y, &sample, &tree_params, &mut rng)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { trees, n_features })
    }

    /// Mean of the per-tree predictions for one feature row.
    pub fn predict_one(&self, row: &[f64]) -> Result<f64, FitError> {
        if row.len() != self.n_features {
            return Err(FitError::WidthMismatch {
                row: 0,
                got: row.len(),
                expected: self.n_features,
            });
        }
        let total: f64 = self.trees.iter().map(|t| t.predict_one(row)).sum();
        Ok(total / self.trees.len() as f64)
    }

    pub fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<f64>, FitError> {
        x.iter()
            .enumerate()
            .map(|(i, row)| {
                self.predict_one(row).map_err(|e| match e {
                    FitError::WidthMismatch { got, expected, .. } => FitError::WidthMismatch { row: i, got, expected },
                    other => other,
                })
            })
            .collect()
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(seed: u64) -> ForestParams {
        ForestParams {
            n_estimators: 25,
            max_depth: 8,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::All,
            bootstrap: true,
            max_leaf_nodes: Some(64),
            seed,
        }
    }

    fn data() -> (Vec<Vec<f64>>, Vec<f64>) {
        let x: Vec<Vec<f64>> = (0..60)
            .map(|i| {
                let a = i as f64 / 10.0;
                vec![a, (i % 7) as f64]
            })
            .collect();
        let y = x.iter().map(|r| 2.0 * r[0] + 0.1 * r[1]).collect();
        (x, y)
    }

    #[test]
    fn fitting_is_reproducible_per_seed() {
        let (x, y) = data();
        let a = RandomForest::fit(&params(11), &x, &y).unwrap();
        let b = RandomForest::fit(&params(11), &x, &y).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.predict(&x).unwrap(), b.predict(&x).unwrap());

        let c = RandomForest::fit(&params(12), &x, &y).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn fits_in_sample_closely() {
        let (x, y) = data();
        let forest = RandomForest::fit(&params(3), &x, &y).unwrap();
        let pred = forest.predict(&x).unwrap();
        let mae = crate::math::mean_absolute_error(&y, &pred).unwrap();
        assert!(mae < 0.3, "in-sample MAE too high: {mae}");
        assert_eq!(forest.n_trees(), 25);
    }

    #[test]
    fn without_bootstrap_and_all_features_trees_agree() {
        let (x, y) = data();
        let p = ForestParams {
            bootstrap: false,
            n_estimators: 3,
            ..params(5)
        };
        let forest = RandomForest::fit(&p, &x, &y).unwrap();
        let single = RandomForest::fit(&ForestParams { n_estimators: 1, ..p }, &x, &y).unwrap();
        for row in &x {
            assert!((forest.predict_one(row).unwrap() - single.predict_one(row).unwrap()).abs() < 1e-12);
        }
    }

    #[test]
    fn rejects_bad_training_data() {
        let (x, mut y) = data();
        assert_eq!(
            RandomForest::fit(&params(1), &[], &[]).unwrap_err(),
            FitError::EmptyTrainingSet
        );
        y[4] = f64::INFINITY;
        assert_eq!(RandomForest::fit(&params(1), &x, &y).unwrap_err(), FitError::NonFinite(4));

        let forest = RandomForest::fit(&params(1), &x, &data().1).unwrap();
        assert!(matches!(
            forest.predict(&[vec![1.0]]),
            Err(FitError::WidthMismatch { row: 0, got: 1, expected: 2 })
        ));
    }
}
