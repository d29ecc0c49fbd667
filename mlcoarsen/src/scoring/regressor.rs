use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::features::NUM_EDGE_FEATURES;

pub type FeatureRow = [f64; NUM_EDGE_FEATURES];

/// A regression model over edge feature rows.
///
/// This is the only surface the learned scorer needs, so any model family can stand in.
pub trait Regressor {
    fn fit(&mut self, features: &[FeatureRow], labels: &[f64]);

    fn predict(&self, features: &[FeatureRow]) -> Vec<f64>;
}

/// Shuffles `0..count` and splits it into `(train, validation)` index lists.
///
/// The validation part holds `ceil(count * validation_fraction)` indices, but never so many that
/// the training part would be empty.
pub fn train_validation_split(
    count: usize,
    validation_fraction: f64,
    rng: &mut oorandom::Rand32,
) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..count).collect();

    shuffle(&mut indices, rng);

    let validation_fraction = validation_fraction.clamp(0.0, 1.0);
    let validation_count = ((count as f64) * validation_fraction).ceil() as usize;
    let validation_count = validation_count.min(count.saturating_sub(1));

    let validation = indices.split_off(count - validation_count);

    (indices, validation)
}

/// In-place Fisher-Yates shuffle.
pub(crate) fn shuffle<T>(items: &mut [T], rng: &mut oorandom::Rand32) {
    for i in (1..items.len()).rev() {
        let j = rng.rand_range(0..(i as u32 + 1)) as usize;

        items.swap(i, j);
    }
}

pub fn mean_squared_error(predictions: &[f64], labels: &[f64]) -> f64 {
    if labels.is_empty() {
        return 0.0;
    }

    let sum: f64 = predictions
        .iter()
        .zip(labels)
        .map(|(p, l)| (p - l) * (p - l))
        .sum();

    sum / labels.len() as f64
}

#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomForestConfig {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub prng_seed: u32,
}

impl Default for RandomForestConfig {
    fn default() -> Self {
        RandomForestConfig {
            n_estimators: 50,
            max_depth: None,
            min_samples_split: 2,
            prng_seed: 0,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Debug)]
enum TreeNode {
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

#[derive(Clone, PartialEq, Debug)]
struct RegressionTree {
    nodes: Vec<TreeNode>,
}

impl RegressionTree {
    fn predict(&self, row: &FeatureRow) -> f64 {
        let mut current = 0;

        loop {
            match self.nodes[current] {
                TreeNode::Leaf { value } => return value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    current = if row[feature] <= threshold { left } else { right };
                }
            }
        }
    }
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    position: usize,
    sse: f64,
}

struct TreeGrower<'a> {
    features: &'a [FeatureRow],
    labels: &'a [f64],
    max_depth: Option<usize>,
    min_samples_split: usize,
    nodes: Vec<TreeNode>,
}

impl<'a> TreeGrower<'a> {
    fn grow(mut self, mut samples: Vec<usize>) -> RegressionTree {
        self.grow_node(&mut samples, 0);

        RegressionTree { nodes: self.nodes }
    }

    fn grow_node(&mut self, samples: &mut [usize], depth: usize) -> usize {
        let index = self.nodes.len();
        let value = self.mean(samples);

        self.nodes.push(TreeNode::Leaf { value });

        let depth_exhausted = self.max_depth.map_or(false, |max| depth >= max);

        if samples.len() < self.min_samples_split.max(2) || depth_exhausted {
            return index;
        }

        let Some(split) = self.best_split(samples) else {
            return index;
        };

        let feature = split.feature;

        samples.sort_by(|a, b| self.features[*a][feature].total_cmp(&self.features[*b][feature]));

        let (left_samples, right_samples) = samples.split_at_mut(split.position);
        let left = self.grow_node(left_samples, depth + 1);
        let right = self.grow_node(right_samples, depth + 1);

        self.nodes[index] = TreeNode::Split {
            feature,
            threshold: split.threshold,
            left,
            right,
        };

        index
    }

    fn mean(&self, samples: &[usize]) -> f64 {
        if samples.is_empty() {
            return 0.0;
        }

        samples.iter().map(|s| self.labels[*s]).sum::<f64>() / samples.len() as f64
    }

    /// Finds the split that minimizes the summed squared error of the two children.
    ///
    /// For every feature the samples are sorted by that feature, after which the squared error of
    /// every prefix/suffix partition can be read off running sums of `y` and `y^2`. Only positions
    /// between two distinct feature values are valid split points. Returns `None` when no split
    /// strictly reduces the error (e.g. all labels are equal, or all rows are identical).
    fn best_split(&self, samples: &[usize]) -> Option<SplitCandidate> {
        let count = samples.len() as f64;
        let total_sum: f64 = samples.iter().map(|s| self.labels[*s]).sum();
        let total_sq: f64 = samples.iter().map(|s| self.labels[*s].powi(2)).sum();
        let parent_sse = total_sq - total_sum * total_sum / count;

        let mut best: Option<SplitCandidate> = None;
        let mut order = samples.to_vec();

        for feature in 0..NUM_EDGE_FEATURES {
            order.sort_by(|a, b| self.features[*a][feature].total_cmp(&self.features[*b][feature]));

            let mut left_sum = 0.0;
            let mut left_sq = 0.0;

            for position in 1..order.len() {
                let label = self.labels[order[position - 1]];

                left_sum += label;
                left_sq += label * label;

                let previous_value = self.features[order[position - 1]][feature];
                let value = self.features[order[position]][feature];

                if previous_value == value {
                    continue;
                }

                let left_count = position as f64;
                let right_count = count - left_count;
                let right_sum = total_sum - left_sum;
                let right_sq = total_sq - left_sq;

                let sse = (left_sq - left_sum * left_sum / left_count)
                    + (right_sq - right_sum * right_sum / right_count);

                if best.as_ref().map_or(true, |b| sse < b.sse) {
                    best = Some(SplitCandidate {
                        feature,
                        threshold: (previous_value + value) / 2.0,
                        position,
                        sse,
                    });
                }
            }
        }

        best.filter(|candidate| candidate.sse < parent_sse - 1e-12)
    }
}

/// Bagged ensemble of CART regression trees.
///
/// Each tree is grown on a bootstrap sample drawn with a seeded PRNG and considers every feature
/// at every split; the prediction is the mean of the tree predictions. An unfitted forest (or one
/// fitted on no samples) predicts `0.0` for every row.
#[derive(Clone, PartialEq, Debug)]
pub struct RandomForestRegressor {
    config: RandomForestConfig,
    trees: Vec<RegressionTree>,
}

impl RandomForestRegressor {
    pub fn new(config: RandomForestConfig) -> Self {
        RandomForestRegressor {
            config,
            trees: Vec::new(),
        }
    }

    pub fn config(&self) -> &RandomForestConfig {
        &self.config
    }

    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }
}

impl Default for RandomForestRegressor {
    fn default() -> Self {
        RandomForestRegressor::new(RandomForestConfig::default())
    }
}

impl Regressor for RandomForestRegressor {
    fn fit(&mut self, features: &[FeatureRow], labels: &[f64]) {
        self.trees.clear();

        let sample_count = features.len().min(labels.len());

        if sample_count == 0 {
            return;
        }

        let mut rng = oorandom::Rand32::new(self.config.prng_seed as u64);

        for _ in 0..self.config.n_estimators {
            let bootstrap: Vec<usize> = (0..sample_count)
                .map(|_| rng.rand_range(0..sample_count as u32) as usize)
                .collect();

            let grower = TreeGrower {
                features,
                labels,
                max_depth: self.config.max_depth,
                min_samples_split: self.config.min_samples_split,
                nodes: Vec::new(),
            };

            self.trees.push(grower.grow(bootstrap));
        }

        debug!(
            trees = self.trees.len(),
            samples = sample_count,
            "fitted random forest"
        );
    }

    fn predict(&self, features: &[FeatureRow]) -> Vec<f64> {
        if self.trees.is_empty() {
            return vec![0.0; features.len()];
        }

        let tree_count = self.trees.len() as f64;

        features
            .iter()
            .map(|row| self.trees.iter().map(|tree| tree.predict(row)).sum::<f64>() / tree_count)
            .collect()
    }
}
