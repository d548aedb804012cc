//! CART regression tree (squared-error criterion).
//!
//! Growth is best-first: the open leaf whose best split removes the most
//! squared error is expanded next. With `max_leaf_nodes = None` every
//! splittable leaf is eventually expanded, which yields the same tree as
//! depth-first growth.
//!
//! Nodes live in a flat arena; children are referenced by index.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::error::FitError;

/// Resolved per-tree growth limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeParams {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features drawn (without replacement) at every split.
    pub max_features: usize,
    pub max_leaf_nodes: Option<usize>,
}

impl TreeParams {
    pub fn validate(&self) -> Result<(), FitError> {
        if self.max_depth == 0 {
            return Err(FitError::InvalidParameter("max_depth must be >= 1".into()));
        }
        if self.min_samples_split < 2 {
            return Err(FitError::InvalidParameter("min_samples_split must be >= 2".into()));
        }
        if self.min_samples_leaf == 0 {
            return Err(FitError::InvalidParameter("min_samples_leaf must be >= 1".into()));
        }
        if self.max_features == 0 {
            return Err(FitError::InvalidParameter("max_features must be >= 1".into()));
        }
        if matches!(self.max_leaf_nodes, Some(n) if n < 2) {
            return Err(FitError::InvalidParameter("max_leaf_nodes must be >= 2".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

#[derive(Debug, Clone)]
struct SplitChoice {
    feature: usize,
    threshold: f64,
    improvement: f64,
    left: Vec<usize>,
    right: Vec<usize>,
}

/// An open leaf waiting to be expanded.
#[derive(Debug)]
struct Frontier {
    node: usize,
    depth: usize,
    split: SplitChoice,
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Frontier {}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Frontier {
    // Max-heap on improvement; equal improvements expand the older node first.
    fn cmp(&self, other: &Self) -> Ordering {
        self.split
            .improvement
            .total_cmp(&other.split.improvement)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl RegressionTree {
    /// Fit on the rows listed in `sample` (indices into `x`/`y`; repeats allowed).
    ///
    /// Inputs are assumed validated by the caller (see `RandomForest::fit`).
    pub fn fit(
        x: &[Vec<f64>],
        y: &[f64],
        sample: &[usize],
        params: &TreeParams,
        rng: &mut StdRng,
    ) -> Result<Self, FitError> {
        params.validate()?;
        if sample.is_empty() {
            return Err(FitError::EmptyTrainingSet);
        }
        let n_features = x.first().map(Vec::len).unwrap_or(0);

        let mut nodes = vec![Node::Leaf {
            value: mean_of(y, sample),
        }];
        let mut heap = BinaryHeap::new();
        if let Some(split) = best_split(x, y, sample, 0, n_features, params, rng) {
            heap.push(Frontier {
                node: 0,
                depth: 0,
                split,
            });
        }

        let mut leaves = 1usize;
        while let Some(open) = heap.pop() {
            if matches!(params.max_leaf_nodes, Some(limit) if leaves >= limit) {
                break;
            }

            let left_id = nodes.len();
            let right_id = left_id + 1;
            nodes.push(Node::Leaf {
                value: mean_of(y, &open.split.left),
            });
            nodes.push(Node::Leaf {
                value: mean_of(y, &open.split.right),
            });
            nodes[open.node] = Node::Split {
                feature: open.split.feature,
                threshold: open.split.threshold,
                left: left_id,
                right: right_id,
            };
            leaves += 1;

            let depth = open.depth + 1;
            for (id, rows) in [(left_id, &open.split.left), (right_id, &open.split.right)] {
                if let Some(split) = best_split(x, y, rows, depth, n_features, params, rng) {
                    heap.push(Frontier {
                        node: id,
                        depth,
                        split,
                    });
                }
            }
        }

        Ok(Self { nodes })
    }

    pub fn predict_one(&self, row: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], idx: usize) -> usize {
            match &nodes[idx] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        walk(&self.nodes, 0)
    }
}

fn mean_of(y: &[f64], rows: &[usize]) -> f64 {
    rows.iter().map(|&i| y[i]).sum::<f64>() / rows.len() as f64
}

fn sse_of(y: &[f64], rows: &[usize]) -> f64 {
    let m = mean_of(y, rows);
    rows.iter().map(|&i| (y[i] - m) * (y[i] - m)).sum()
}

/// Best squared-error split of `rows`, or `None` if the node must stay a leaf.
fn best_split(
    x: &[Vec<f64>],
    y: &[f64],
    rows: &[usize],
    depth: usize,
    n_features: usize,
    params: &TreeParams,
    rng: &mut StdRng,
) -> Option<SplitChoice> {
    let n = rows.len();
    if depth >= params.max_depth
        || n < params.min_samples_split
        || n < 2 * params.min_samples_leaf
        || n_features == 0
    {
        return None;
    }
    let parent_mean = mean_of(y, rows);
    let parent_sse = sse_of(y, rows);
    if parent_sse <= 1e-12 {
        return None;
    }

    let mut features: Vec<usize> = (0..n_features).collect();
    features.shuffle(rng);
    features.truncate(params.max_features.min(n_features));

    let min_leaf = params.min_samples_leaf;
    let mut best: Option<(usize, f64, f64)> = None; // (feature, threshold, improvement)

    let mut order: Vec<usize> = rows.to_vec();
    for &f in &features {
        order.sort_by(|&a, &b| x[a][f].total_cmp(&x[b][f]));

        // Centered targets keep the running sums well conditioned for price-scale values.
        let total_sum: f64 = order.iter().map(|&i| y[i] - parent_mean).sum();
        let total_sq: f64 = order.iter().map(|&i| (y[i] - parent_mean).powi(2)).sum();

        let mut left_sum = 0.0;
        let mut left_sq = 0.0;
        for k in 1..n {
            let yi = y[order[k - 1]] - parent_mean;
            left_sum += yi;
            left_sq += yi * yi;

            if k < min_leaf || n - k < min_leaf {
                continue;
            }
            let lo = x[order[k - 1]][f];
            let hi = x[order[k]][f];
            if lo == hi {
                continue;
            }

            let nl = k as f64;
            let nr = (n - k) as f64;
            let right_sum = total_sum - left_sum;
            let right_sq = total_sq - left_sq;
            let child_sse = (left_sq - left_sum * left_sum / nl) + (right_sq - right_sum * right_sum / nr);
            let improvement = parent_sse - child_sse;

            if improvement > 0.0 && best.is_none_or(|(_, _, b)| improvement > b) {
                let mut threshold = 0.5 * (lo + hi);
                if threshold >= hi {
                    threshold = lo;
                }
                best = Some((f, threshold, improvement));
            }
        }
    }

    best.map(|(feature, threshold, improvement)| {
        let (left, right): (Vec<usize>, Vec<usize>) = rows.iter().partition(|&&i| x[i][feature] <= threshold);
        SplitChoice {
            feature,
            threshold,
            improvement,
            left,
            right,
        }
    })
}
