//! Fixed hyperparameter prior for the randomized search.
//!
//! Integer ranges are half-open (`lo..hi`) and sampled uniformly; categorical
//! choices are sampled uniformly from their sets.

use std::ops::Range;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::{HyperparameterCandidate, MaxFeatures};

pub const N_ESTIMATORS: Range<usize> = 200..1200;
pub const MAX_DEPTH: Range<usize> = 3..30;
pub const MIN_SAMPLES_SPLIT: Range<usize> = 2..20;
pub const MIN_SAMPLES_LEAF: Range<usize> = 1..10;
pub const MAX_LEAF_NODES: Range<usize> = 10..10_000;
pub const BOOTSTRAP: [bool; 2] = [true, false];

/// Draw one candidate from the prior.
pub fn sample_candidate<R: Rng>(rng: &mut R) -> HyperparameterCandidate {
    HyperparameterCandidate {
        n_estimators: rng.gen_range(N_ESTIMATORS),
        max_depth: rng.gen_range(MAX_DEPTH),
        min_samples_split: rng.gen_range(MIN_SAMPLES_SPLIT),
        min_samples_leaf: rng.gen_range(MIN_SAMPLES_LEAF),
        max_features: MaxFeatures::ALL[rng.gen_range(0..MaxFeatures::ALL.len())],
        bootstrap: BOOTSTRAP[rng.gen_range(0..BOOTSTRAP.len())],
        max_leaf_nodes: rng.gen_range(MAX_LEAF_NODES),
    }
}

/// Seed of the generator that draws trial `trial`'s candidate.
///
/// Each trial gets its own stream, so candidates do not depend on evaluation order.
pub fn trial_seed(base_seed: u64, trial: usize) -> u64 {
    base_seed.wrapping_add((trial as u64).wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

/// The candidate evaluated by trial `trial` for a given base seed.
pub fn candidate_for_trial(base_seed: u64, trial: usize) -> HyperparameterCandidate {
    let mut rng = StdRng::seed_from_u64(trial_seed(base_seed, trial));
    sample_candidate(&mut rng)
}

/// Whether `candidate` lies inside the prior's support.
pub fn in_prior(candidate: &HyperparameterCandidate) -> bool {
    N_ESTIMATORS.contains(&candidate.n_estimators)
        && MAX_DEPTH.contains(&candidate.max_depth)
        && MIN_SAMPLES_SPLIT.contains(&candidate.min_samples_split)
        && MIN_SAMPLES_LEAF.contains(&candidate.min_samples_leaf)
        && MAX_LEAF_NODES.contains(&candidate.max_leaf_nodes)
}
