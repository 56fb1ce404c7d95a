use loto_db::models::Draw;
use rand::prelude::*;
use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::Predictor;
use crate::config::ForestConfig;
use crate::error::{PipelineError, Result};
use crate::features::{self, FeatureRow, FEATURE_NAMES};

/// Bagged regression trees over per-number statistics.
///
/// Labels are 0/1 ("number drawn at the target"), so every leaf holds a
/// frequency and the averaged output stays in [0, 1].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    pub config: ForestConfig,
    pub seed: u64,
    trees: Vec<TreeNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum TreeNode {
    Leaf { value: f64 },
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

impl RandomForest {
    /// Walk-forward training: every draw `t` among the last
    /// `training_draws` becomes a target, with features from `history[..t]`.
    pub fn train(history: &[Draw], config: &ForestConfig) -> Result<Self> {
        if history.len() < 2 {
            return Err(PipelineError::InsufficientHistory { required: 2, actual: history.len() });
        }
        let first_target = history.len().saturating_sub(config.training_draws).max(1);

        let rows: Vec<FeatureRow> = (first_target..history.len())
            .into_par_iter()
            .flat_map_iter(|t| features::rows_for_target(history, t))
            .collect();
        let samples: Vec<&[f64]> = rows.iter().map(|r| r.features.as_slice()).collect();
        let labels: Vec<f64> = rows.iter().map(|r| r.label).collect();

        let seed = config.seed.unwrap_or_else(|| rand::rng().random());
        let features_per_split = (FEATURE_NAMES.len() as f64).sqrt().ceil() as usize;
        let n_trees = config.n_trees.max(1);

        // One RNG per tree keeps the result independent of thread scheduling.
        let trees: Vec<TreeNode> = (0..n_trees)
            .into_par_iter()
            .map(|i| {
                let mut rng = StdRng::seed_from_u64(seed.wrapping_add(i as u64));
                let n = samples.len();
                let indices: Vec<usize> = (0..n).map(|_| rng.random_range(0..n)).collect();
                let boot_samples: Vec<&[f64]> = indices.iter().map(|&i| samples[i]).collect();
                let boot_labels: Vec<f64> = indices.iter().map(|&i| labels[i]).collect();
                let params = TreeParams {
                    max_depth: config.max_depth,
                    min_samples_split: config.min_samples_split.max(2),
                    features_per_split,
                };
                build_tree(&boot_samples, &boot_labels, params.max_depth, &params, &mut rng)
            })
            .collect();

        log::info!(
            "Random forest trained: {} trees on {} rows ({} target draws)",
            trees.len(),
            rows.len(),
            history.len() - first_target,
        );

        Ok(Self { config: config.clone(), seed, trees })
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    fn score(&self, sample: &[f64]) -> f64 {
        let sum: f64 = self.trees.iter().map(|tree| predict_tree(tree, sample)).sum();
        sum / self.trees.len().max(1) as f64
    }
}

impl Predictor for RandomForest {
    fn name(&self) -> &str {
        "random_forest"
    }

    fn predict(&self, history: &[Draw]) -> Result<Vec<f64>> {
        Ok(features::number_features(history)
            .iter()
            .map(|f| self.score(&f.to_vec()))
            .collect())
    }
}

struct TreeParams {
    max_depth: usize,
    min_samples_split: usize,
    features_per_split: usize,
}

fn mean(labels: &[f64]) -> f64 {
    labels.iter().sum::<f64>() / labels.len().max(1) as f64
}

fn build_tree(
    samples: &[&[f64]],
    labels: &[f64],
    depth_left: usize,
    params: &TreeParams,
    rng: &mut StdRng,
) -> TreeNode {
    if depth_left == 0 || labels.len() < params.min_samples_split {
        return TreeNode::Leaf { value: mean(labels) };
    }

    let first = labels[0];
    if labels.iter().all(|&l| (l - first).abs() < 1e-10) {
        return TreeNode::Leaf { value: first };
    }

    let mut candidates: Vec<usize> = (0..samples[0].len()).collect();
    candidates.shuffle(rng);
    candidates.truncate(params.features_per_split);

    let mut best_gini = f64::MAX;
    let mut best_feature = 0;
    let mut best_threshold = 0.0;

    for &feat_idx in &candidates {
        let mut values: Vec<f64> = samples.iter().map(|s| s[feat_idx]).collect();
        values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        values.dedup();
        if values.len() < 2 {
            continue;
        }

        // At most ~10 thresholds per feature.
        let step = (values.len() / 10).max(1);
        for i in (0..values.len() - 1).step_by(step) {
            let threshold = (values[i] + values[i + 1]) / 2.0;
            let gini = split_gini(samples, labels, feat_idx, threshold);
            if gini < best_gini {
                best_gini = gini;
                best_feature = feat_idx;
                best_threshold = threshold;
            }
        }
    }

    if best_gini >= gini_impurity(labels) {
        return TreeNode::Leaf { value: mean(labels) };
    }

    let (mut left_samples, mut left_labels) = (Vec::new(), Vec::new());
    let (mut right_samples, mut right_labels) = (Vec::new(), Vec::new());
    for (sample, &label) in samples.iter().zip(labels) {
        if sample[best_feature] <= best_threshold {
            left_samples.push(*sample);
            left_labels.push(label);
        } else {
            right_samples.push(*sample);
            right_labels.push(label);
        }
    }

    if left_samples.is_empty() || right_samples.is_empty() {
        return TreeNode::Leaf { value: mean(labels) };
    }

    TreeNode::Split {
        feature_idx: best_feature,
        threshold: best_threshold,
        left: Box::new(build_tree(&left_samples, &left_labels, depth_left - 1, params, rng)),
        right: Box::new(build_tree(&right_samples, &right_labels, depth_left - 1, params, rng)),
    }
}

fn gini_impurity(labels: &[f64]) -> f64 {
    if labels.is_empty() {
        return 0.0;
    }
    let p = mean(labels);
    2.0 * p * (1.0 - p)
}

fn split_gini(samples: &[&[f64]], labels: &[f64], feature_idx: usize, threshold: f64) -> f64 {
    let (mut n_left, mut sum_left) = (0.0, 0.0);
    let (mut n_right, mut sum_right) = (0.0, 0.0);
    for (sample, &label) in samples.iter().zip(labels) {
        if sample[feature_idx] <= threshold {
            n_left += 1.0;
            sum_left += label;
        } else {
            n_right += 1.0;
            sum_right += label;
        }
    }
    if n_left == 0.0 || n_right == 0.0 {
        return f64::MAX;
    }
    let gini = |n: f64, sum: f64| {
        let p = sum / n;
        2.0 * p * (1.0 - p)
    };
    let n = n_left + n_right;
    (n_left / n) * gini(n_left, sum_left) + (n_right / n) * gini(n_right, sum_right)
}

fn predict_tree(node: &TreeNode, sample: &[f64]) -> f64 {
    match node {
        TreeNode::Leaf { value } => *value,
        TreeNode::Split { feature_idx, threshold, left, right } => {
            if sample[*feature_idx] <= *threshold {
                predict_tree(left, sample)
            } else {
                predict_tree(right, sample)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{make_test_draws, validate_scores};

    fn config() -> ForestConfig {
        ForestConfig {
            n_trees: 12,
            max_depth: 4,
            min_samples_split: 4,
            training_draws: 40,
            seed: Some(42),
        }
    }

    #[test]
    fn test_scores_in_unit_interval() {
        let draws = make_test_draws(60);
        let forest = RandomForest::train(&draws, &config()).unwrap();
        assert_eq!(forest.n_trees(), 12);
        let scores = forest.predict(&draws).unwrap();
        assert!(validate_scores(&scores));
        assert!(scores.iter().all(|&s| s <= 1.0), "{scores:?}");
    }

    #[test]
    fn test_never_drawn_numbers_score_low() {
        let draws = make_test_draws(60);
        let forest = RandomForest::train(&draws, &config()).unwrap();
        let scores = forest.predict(&draws).unwrap();
        // 46..=49 never appear in the fixture
        assert!(scores[48] < 0.05, "score(49)={}", scores[48]);
    }

    #[test]
    fn test_pinned_seed_is_reproducible() {
        let draws = make_test_draws(50);
        let a = RandomForest::train(&draws, &config()).unwrap().predict(&draws).unwrap();
        let b = RandomForest::train(&draws, &config()).unwrap().predict(&draws).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_too_short_history() {
        let err = RandomForest::train(&make_test_draws(1), &config()).unwrap_err();
        assert_eq!(err, PipelineError::InsufficientHistory { required: 2, actual: 1 });
    }

    #[test]
    fn test_serde_roundtrip() {
        let draws = make_test_draws(40);
        let forest = RandomForest::train(&draws, &config()).unwrap();
        let json = serde_json::to_string(&forest).unwrap();
        let back: RandomForest = serde_json::from_str(&json).unwrap();
        let a = forest.predict(&draws).unwrap();
        let b = back.predict(&draws).unwrap();
        for (x, y) in a.iter().zip(&b) {
            assert!((x - y).abs() < 1e-12);
        }
    }
}
