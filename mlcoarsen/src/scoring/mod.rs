mod regressor;
pub use self::regressor::{
    mean_squared_error, train_validation_split, FeatureRow, RandomForestConfig,
    RandomForestRegressor, Regressor,
};
pub(crate) use self::regressor::shuffle;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CoarsenError, CoarsenResult};
use crate::features::extract_edge_features;
use crate::graph::{Graph, NodeId};

/// Assigns one score per edge, index-aligned with the graph's edge order. Higher scores mark
/// edges that are better candidates for contraction.
pub trait EdgeScorer {
    fn score_edges<N: NodeId>(&self, graph: &Graph<N>) -> Vec<f64>;
}

impl<T: EdgeScorer> EdgeScorer for &T {
    fn score_edges<N: NodeId>(&self, graph: &Graph<N>) -> Vec<f64> {
        (**self).score_edges(graph)
    }
}

/// Scores every edge by its weight.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct WeightScorer;

impl EdgeScorer for WeightScorer {
    fn score_edges<N: NodeId>(&self, graph: &Graph<N>) -> Vec<f64> {
        graph.edges().map(|edge| edge.weight).collect()
    }
}

#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LearnedScorerConfig {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    /// Fraction of the edges held out from training to report a validation error.
    pub validation_fraction: f64,
    pub prng_seed: u32,
}

impl Default for LearnedScorerConfig {
    fn default() -> Self {
        LearnedScorerConfig {
            n_estimators: 50,
            max_depth: None,
            min_samples_split: 2,
            validation_fraction: 0.25,
            prng_seed: 0,
        }
    }
}

impl LearnedScorerConfig {
    fn forest_config(&self) -> RandomForestConfig {
        RandomForestConfig {
            n_estimators: self.n_estimators,
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            prng_seed: self.prng_seed,
        }
    }
}

/// Scores edges with a regression model over their structural features.
#[derive(Clone, Debug)]
pub struct LearnedScorer<R = RandomForestRegressor> {
    model: R,
    validation_error: Option<f64>,
}

impl LearnedScorer<RandomForestRegressor> {
    /// Trains a random forest scorer on `graph`.
    ///
    /// `labels` holds one target per edge in edge order. Without labels the model is trained to
    /// reproduce the edge weights, which makes it a learned proxy for heavy-edge scoring.
    pub fn train<N: NodeId>(
        graph: &Graph<N>,
        labels: Option<&[f64]>,
        config: &LearnedScorerConfig,
    ) -> CoarsenResult<Self> {
        Self::train_model(
            RandomForestRegressor::new(config.forest_config()),
            graph,
            labels,
            config.validation_fraction,
            config.prng_seed,
        )
    }
}

impl<R: Regressor> LearnedScorer<R> {
    /// Wraps an already fitted model.
    pub fn from_model(model: R) -> Self {
        LearnedScorer {
            model,
            validation_error: None,
        }
    }

    pub fn train_model<N: NodeId>(
        mut model: R,
        graph: &Graph<N>,
        labels: Option<&[f64]>,
        validation_fraction: f64,
        prng_seed: u32,
    ) -> CoarsenResult<Self> {
        let table = extract_edge_features(graph);
        let rows = table.rows();

        let labels: Vec<f64> = match labels {
            Some(labels) if labels.len() != rows.len() => {
                return Err(CoarsenError::LabelCountMismatch {
                    expected: rows.len(),
                    found: labels.len(),
                });
            }
            Some(labels) => labels.to_vec(),
            None => table.edges.iter().map(|edge| edge.weight).collect(),
        };

        let mut rng = oorandom::Rand32::new(prng_seed as u64);
        let (train, validation) = train_validation_split(rows.len(), validation_fraction, &mut rng);

        let train_rows: Vec<FeatureRow> = train.iter().map(|i| rows[*i]).collect();
        let train_labels: Vec<f64> = train.iter().map(|i| labels[*i]).collect();

        model.fit(&train_rows, &train_labels);

        let validation_error = if validation.is_empty() {
            None
        } else {
            let validation_rows: Vec<FeatureRow> = validation.iter().map(|i| rows[*i]).collect();
            let validation_labels: Vec<f64> = validation.iter().map(|i| labels[*i]).collect();

            Some(mean_squared_error(
                &model.predict(&validation_rows),
                &validation_labels,
            ))
        };

        debug!(
            train = train.len(),
            validation = validation.len(),
            validation_mse = ?validation_error,
            "trained learned edge scorer"
        );

        Ok(LearnedScorer {
            model,
            validation_error,
        })
    }

    /// Mean squared error on the held-out edges, if any were held out.
    pub fn validation_error(&self) -> Option<f64> {
        self.validation_error
    }

    pub fn model(&self) -> &R {
        &self.model
    }

    pub fn predict<N: NodeId>(&self, graph: &Graph<N>) -> Vec<f64> {
        let rows = extract_edge_features(graph).rows();

        self.model.predict(&rows)
    }
}

impl<R: Regressor> EdgeScorer for LearnedScorer<R> {
    fn score_edges<N: NodeId>(&self, graph: &Graph<N>) -> Vec<f64> {
        self.predict(graph)
    }
}
