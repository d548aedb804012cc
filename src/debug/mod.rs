//! Debug bundle writer for inspecting the hyperparameter search.
//!
//! The bundle is a markdown file listing every trial: the sampled candidate,
//! its per-fold validation MAE, and the mean MAE or failure reason.

use std::fmt::Write as _;
use std::fs::{File, create_dir_all};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::domain::ForecastConfig;
use crate::error::AppError;
use crate::forecast::ForecastRun;
use crate::tuning::TrialOutcome;

/// Write the bundle under `dir` and return its path.
pub fn write_debug_bundle(dir: &Path, run: &ForecastRun, config: &ForecastConfig) -> Result<PathBuf, AppError> {
    create_dir_all(dir).map_err(|e| AppError::new(4, format!("Failed to create debug dir: {e}")))?;

    let ts = Local::now().format("%Y%m%d_%H%M%S");
    let path = dir.join(format!("dsig_debug_seed{}_{}.md", config.tuner.seed, ts));

    let mut file = File::create(&path)
        .map_err(|e| AppError::new(4, format!("Failed to create debug file: {e}")))?;
    file.write_all(render_bundle(run, config).as_bytes())
        .map_err(|e| AppError::new(4, format!("Failed to write debug: {e}")))?;

    Ok(path)
}

/// Markdown body of the bundle.
pub fn render_bundle(run: &ForecastRun, config: &ForecastConfig) -> String {
    let out = &run.output;
    let mut md = String::new();

    // Writing into a String cannot fail.
    let _ = writeln!(md, "# dsig debug bundle");
    let _ = writeln!(md, "- generated: {}", Local::now().to_rfc3339());
    let _ = writeln!(md, "- target: {} | date column: {}", config.target, config.date_column);
    let _ = writeln!(
        md,
        "- search: trials={} folds={} seed={}",
        config.tuner.n_iter, config.tuner.n_splits, config.tuner.seed
    );
    let _ = writeln!(
        md,
        "- rows: {} (train={} test={})",
        run.dataset_rows, out.train_rows, out.test_rows
    );
    let _ = writeln!(
        md,
        "- winner: trial {} | cv_mae={:.6} | held_out_mae={:.6}",
        run.winning_trial, out.cv_mae, out.held_out_mae
    );

    let _ = writeln!(md, "\n## Trials");
    let _ = writeln!(
        md,
        "| trial | trees | depth | min_split | min_leaf | max_features | bootstrap | max_leaves | fold_mae | mean_mae |"
    );
    let _ = writeln!(md, "| - | - | - | - | - | - | - | - | - | - |");

    for t in &run.trials {
        let c = &t.candidate;
        let (folds, mean) = match &t.outcome {
            TrialOutcome::Scored { fold_mae, mean_mae } => (fmt_vec(fold_mae), format!("{mean_mae:.6}")),
            TrialOutcome::Failed { reason } => ("-".to_string(), format!("failed: {reason}")),
        };
        let marker = if t.index == run.winning_trial { " *" } else { "" };
        let _ = writeln!(
            md,
            "| {}{} | {} | {} | {} | {} | {} | {} | {} | {} | {} |",
            t.index,
            marker,
            c.n_estimators,
            c.max_depth,
            c.min_samples_split,
            c.min_samples_leaf,
            c.max_features.label(),
            c.bootstrap,
            c.max_leaf_nodes,
            folds,
            mean
        );
    }

    md
}

fn fmt_vec(values: &[f64]) -> String {
    let parts: Vec<String> = values.iter().map(|v| format!("{v:.4}")).collect();
    format!("[{}]", parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ForecastOutput, HyperparameterCandidate, MaxFeatures};
    use crate::tuning::TrialResult;

    fn run() -> ForecastRun {
        let candidate = HyperparameterCandidate {
            n_estimators: 300,
            max_depth: 6,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::Sqrt,
            bootstrap: true,
            max_leaf_nodes: 50,
        };
        ForecastRun {
            output: ForecastOutput {
                predicted_next_price: 101.0,
                drift: 0.01,
                held_out_mae: 0.5,
                cv_mae: 0.4,
                last_actual: 100.0,
                best_candidate: candidate.clone(),
                feature_names: vec!["date".into()],
                train_rows: 9,
                test_rows: 1,
            },
            trials: vec![
                TrialResult {
                    index: 0,
                    candidate: candidate.clone(),
                    outcome: TrialOutcome::Scored {
                        fold_mae: vec![0.3, 0.5],
                        mean_mae: 0.4,
                    },
                },
                TrialResult {
                    index: 1,
                    candidate,
                    outcome: TrialOutcome::Failed {
                        reason: "invalid parameter".into(),
                    },
                },
            ],
            winning_trial: 0,
            dataset_rows: 10,
        }
    }

    #[test]
    fn bundle_lists_every_trial() {
        let md = render_bundle(&run(), &ForecastConfig::default());
        assert!(md.contains("| 0 * | 300 |"));
        assert!(md.contains("[0.3000, 0.5000] | 0.400000 |"));
        assert!(md.contains("failed: invalid parameter"));
    }

    #[test]
    fn bundle_is_written_under_the_given_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_debug_bundle(&dir.path().join("debug"), &run(), &ForecastConfig::default()).unwrap();
        assert!(path.starts_with(dir.path()));
        let text = std::fs::read_to_string(path).unwrap();
        assert!(text.starts_with("# dsig debug bundle"));
    }
}
