//! Randomized hyperparameter search under walk-forward validation.
//!
//! For every trial:
//! - draw a candidate from the prior with the trial's own RNG
//! - fit a forest on each fold's training rows, score MAE on its validation block
//! - record the mean validation MAE (or the failure)
//!
//! Trials are evaluated in parallel. Selection is deterministic: minimum mean
//! MAE, ties broken by the lowest trial index. The winner is refit on the
//! whole training partition.

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::{HyperparameterCandidate, TunerConfig};
use crate::error::{FitError, SearchError, SearchTrialError};
use crate::math::mean_absolute_error;
use crate::models::{ForestParams, RandomForest};
use crate::tuning::cv::{Fold, walk_forward_folds};
use crate::tuning::prior::candidate_for_trial;

/// Outcome of a single trial.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum TrialOutcome {
    Scored { fold_mae: Vec<f64>, mean_mae: f64 },
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrialResult {
    pub index: usize,
    pub candidate: HyperparameterCandidate,
    pub outcome: TrialOutcome,
}

impl TrialResult {
    pub fn mean_mae(&self) -> Option<f64> {
        match self.outcome {
            TrialOutcome::Scored { mean_mae, .. } => Some(mean_mae),
            TrialOutcome::Failed { .. } => None,
        }
    }
}

/// Winning model of a search.
#[derive(Debug, Clone)]
pub struct TunedModel {
    /// Winner refit on the full training partition.
    pub model: RandomForest,
    pub candidate: HyperparameterCandidate,
    pub trial: usize,
    /// Mean walk-forward validation MAE (non-negative).
    pub cv_mae: f64,
    pub seed: u64,
    pub trials: Vec<TrialResult>,
}

impl TunedModel {
    pub fn forest_params(&self) -> ForestParams {
        ForestParams::from_candidate(&self.candidate, self.seed)
    }
}

/// Run the randomized search on the training partition only.
pub fn tune(x: &[Vec<f64>], y: &[f64], config: &TunerConfig) -> Result<TunedModel, SearchError> {
    if config.n_iter == 0 {
        return Err(SearchError::InvalidConfig("number of trials must be >= 1".into()));
    }
    if config.n_splits < 2 {
        return Err(SearchError::InvalidConfig("number of folds must be >= 2".into()));
    }

    let candidates = (0..config.n_iter)
        .map(|trial| candidate_for_trial(config.seed, trial))
        .collect();
    search_candidates(x, y, candidates, config)
}

/// Evaluate an explicit candidate list. `tune` feeds it from the prior.
pub(crate) fn search_candidates(
    x: &[Vec<f64>],
    y: &[f64],
    candidates: Vec<HyperparameterCandidate>,
    config: &TunerConfig,
) -> Result<TunedModel, SearchError> {
    if x.len() != y.len() {
        return Err(SearchError::InvalidConfig(format!(
            "feature rows ({}) and targets ({}) differ in length",
            x.len(),
            y.len()
        )));
    }
    let folds = walk_forward_folds(x.len(), config.n_splits)?;

    info!(
        trials = candidates.len(),
        folds = folds.len(),
        rows = x.len(),
        "starting randomized search"
    );

    let trials: Vec<TrialResult> = candidates
        .into_par_iter()
        .enumerate()
        .map(|(index, candidate)| {
            let outcome = match evaluate_trial(index, &candidate, x, y, &folds, config.seed) {
                Ok((fold_mae, mean_mae)) => {
                    debug!(trial = index, mean_mae, "trial scored");
                    TrialOutcome::Scored { fold_mae, mean_mae }
                }
                Err(err) => {
                    warn!(trial = index, error = %err, "trial failed; excluded from selection");
                    TrialOutcome::Failed {
                        reason: err.to_string(),
                    }
                }
            };
            TrialResult {
                index,
                candidate,
                outcome,
            }
        })
        .collect();

    let best = select_best(&trials).ok_or(SearchError::AllTrialsFailed(trials.len()))?;
    let cv_mae = best.mean_mae().unwrap_or_default().abs();
    let candidate = best.candidate.clone();
    let trial = best.index;

    let params = ForestParams::from_candidate(&candidate, config.seed);
    let model = RandomForest::fit(&params, x, y).map_err(SearchError::Refit)?;

    info!(trial, cv_mae, ?candidate, "selected best candidate");

    Ok(TunedModel {
        model,
        candidate,
        trial,
        cv_mae,
        seed: config.seed,
        trials,
    })
}

fn evaluate_trial(
    index: usize,
    candidate: &HyperparameterCandidate,
    x: &[Vec<f64>],
    y: &[f64],
    folds: &[Fold],
    seed: u64,
) -> Result<(Vec<f64>, f64), SearchTrialError> {
    let params = ForestParams::from_candidate(candidate, seed);
    let fail = |fold: usize, source: FitError| SearchTrialError {
        trial: index,
        fold,
        source,
    };

    let mut fold_mae = Vec::with_capacity(folds.len());
    for fold in folds {
        let forest = RandomForest::fit(&params, &x[fold.train.clone()], &y[fold.train.clone()])
            .map_err(|e| fail(fold.index, e))?;
        let predicted = forest
            .predict(&x[fold.validation.clone()])
            .map_err(|e| fail(fold.index, e))?;
        let mae = mean_absolute_error(&y[fold.validation.clone()], &predicted)
            .filter(|m| m.is_finite())
            .ok_or_else(|| fail(fold.index, FitError::NonFinite(fold.validation.start)))?;
        fold_mae.push(mae);
    }

    let mean_mae = fold_mae.iter().sum::<f64>() / fold_mae.len() as f64;
    Ok((fold_mae, mean_mae))
}

/// Lowest mean MAE among scored trials; ties go to the lowest trial index.
pub fn select_best(trials: &[TrialResult]) -> Option<&TrialResult> {
    trials
        .iter()
        .filter_map(|t| t.mean_mae().map(|m| (t, m)))
        .min_by(|(a, ma), (b, mb)| ma.total_cmp(mb).then(a.index.cmp(&b.index)))
        .map(|(t, _)| t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MaxFeatures;

    fn data(n: usize) -> (Vec<Vec<f64>>, Vec<f64>) {
        let x: Vec<Vec<f64>> = (0..n).map(|i| vec![i as f64, ((i * 3) % 5) as f64]).collect();
        let y = x.iter().map(|r| 10.0 + 0.5 * r[0]).collect();
        (x, y)
    }

    fn small_candidate(n_estimators: usize) -> HyperparameterCandidate {
        HyperparameterCandidate {
            n_estimators,
            max_depth: 5,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::All,
            bootstrap: false,
            max_leaf_nodes: 32,
        }
    }

    fn config(seed: u64) -> TunerConfig {
        TunerConfig {
            n_splits: 3,
            n_iter: 3,
            seed,
        }
    }

    #[test]
    fn search_is_reproducible_for_a_seed() {
        let (x, y) = data(40);
        let a = tune(&x, &y, &config(9)).unwrap();
        let b = tune(&x, &y, &config(9)).unwrap();
        assert_eq!(a.candidate, b.candidate);
        assert_eq!(a.cv_mae.to_bits(), b.cv_mae.to_bits());
        assert_eq!(a.trials, b.trials);
        assert_eq!(a.model, b.model);
        assert!(a.cv_mae >= 0.0);
        assert_eq!(a.trials.len(), 3);
    }

    #[test]
    fn failed_trials_are_excluded_not_fatal() {
        let (x, y) = data(30);
        let broken = HyperparameterCandidate {
            min_samples_split: 0,
            ..small_candidate(5)
        };
        let tuned = search_candidates(&x, &y, vec![broken, small_candidate(5)], &config(1)).unwrap();
        assert_eq!(tuned.trial, 1);
        assert!(matches!(tuned.trials[0].outcome, TrialOutcome::Failed { .. }));
    }

    #[test]
    fn all_failed_trials_abort_the_search() {
        let (x, y) = data(30);
        let broken = HyperparameterCandidate {
            min_samples_leaf: 0,
            ..small_candidate(5)
        };
        let err = search_candidates(&x, &y, vec![broken.clone(), broken], &config(1)).unwrap_err();
        assert_eq!(err, SearchError::AllTrialsFailed(2));
    }

    #[test]
    fn ties_go_to_the_lowest_trial_index() {
        let (x, y) = data(30);
        // Identical candidates score identically.
        let tuned = search_candidates(&x, &y, vec![small_candidate(4); 3], &config(2)).unwrap();
        assert_eq!(tuned.trial, 0);
    }

    #[test]
    fn selection_prefers_lower_mae() {
        let trials = vec![
            TrialResult {
                index: 0,
                candidate: small_candidate(1),
                outcome: TrialOutcome::Scored {
                    fold_mae: vec![2.0],
                    mean_mae: 2.0,
                },
            },
            TrialResult {
                index: 1,
                candidate: small_candidate(2),
                outcome: TrialOutcome::Failed {
                    reason: "boom".into(),
                },
            },
            TrialResult {
                index: 2,
                candidate: small_candidate(3),
                outcome: TrialOutcome::Scored {
                    fold_mae: vec![1.0],
                    mean_mae: 1.0,
                },
            },
        ];
        assert_eq!(select_best(&trials).map(|t| t.index), Some(2));
    }

    #[test]
    fn rejects_bad_configuration_and_short_history() {
        let (x, y) = data(30);
        let cfg = TunerConfig {
            n_iter: 0,
            ..config(1)
        };
        assert!(matches!(tune(&x, &y, &cfg), Err(SearchError::InvalidConfig(_))));

        let (x, y) = data(3);
        assert!(matches!(
            tune(&x, &y, &config(1)),
            Err(SearchError::Data(crate::error::DataError::InsufficientHistory { .. }))
        ));
    }
}
