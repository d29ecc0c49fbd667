//! Pipeline configuration.
//!
//! A pipeline is a list of coarsening levels, each with its own matching policy, followed by
//! local refinement on the way back up. Configurations can be built in code or parsed from TOML:
//!
//! ```toml
//! [[levels]]
//! policy = "ml_guided"
//! top_k = 0.3
//!
//! [levels.scorer]
//! n_estimators = 20
//! prng_seed = 7
//!
//! [[levels]]
//! policy = "random"
//! prng_seed = 1
//!
//! [refine]
//! max_iter = 50
//! prng_seed = 3
//! ```

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{CoarsenError, CoarsenResult};
use crate::graph::{Graph, NodeId};
use crate::matching::{
    AggregateByDegree, AggregateByDegreeConfig, MatchPairsByEdgeScore,
    MatchPairsByEdgeScoreConfig, MatchPairsByEdgeWeight, MatchPairsRandomly,
    MatchPairsRandomlyConfig, Matching, MatchingStrategy, TopK,
};
use crate::refinement::RefineConfig;
use crate::scoring::{LearnedScorer, LearnedScorerConfig, WeightScorer};

/// A matching policy selected by configuration.
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum MatchingPolicy {
    Random(MatchPairsRandomlyConfig),
    HeavyEdge,
    MlGuided {
        #[serde(default)]
        top_k: TopK,
        #[serde(default)]
        scorer: LearnedScorerConfig,
    },
    AggregateByDegree(AggregateByDegreeConfig),
}

impl Default for MatchingPolicy {
    fn default() -> Self {
        MatchingPolicy::HeavyEdge
    }
}

impl MatchingPolicy {
    fn validate(&self) -> CoarsenResult<()> {
        match self {
            MatchingPolicy::MlGuided { scorer, .. } => {
                if scorer.n_estimators == 0 {
                    return Err(CoarsenError::Config(
                        "scorer.n_estimators must be at least 1".to_string(),
                    ));
                }

                if !(0.0..1.0).contains(&scorer.validation_fraction) {
                    return Err(CoarsenError::Config(format!(
                        "scorer.validation_fraction must be in [0, 1), found {}",
                        scorer.validation_fraction
                    )));
                }
            }
            MatchingPolicy::AggregateByDegree(config) => {
                if config.max_aggregate_size == 0 {
                    return Err(CoarsenError::Config(
                        "max_aggregate_size must be at least 1".to_string(),
                    ));
                }
            }
            MatchingPolicy::Random(_) | MatchingPolicy::HeavyEdge => {}
        }

        Ok(())
    }
}

impl MatchingStrategy for MatchingPolicy {
    fn select<N: NodeId>(&self, graph: &Graph<N>) -> Matching {
        match *self {
            MatchingPolicy::Random(config) => MatchPairsRandomly::new(config).select(graph),
            MatchingPolicy::HeavyEdge => MatchPairsByEdgeWeight.select(graph),
            MatchingPolicy::MlGuided { top_k, scorer } => {
                let config = MatchPairsByEdgeScoreConfig { top_k };

                // The scorer is trained on the graph it is about to score.
                match LearnedScorer::train(graph, None, &scorer) {
                    Ok(scorer) => MatchPairsByEdgeScore::new(scorer, config).select(graph),
                    Err(err) => {
                        warn!(%err, "failed to train edge scorer, scoring by weight");

                        MatchPairsByEdgeScore::new(WeightScorer, config).select(graph)
                    }
                }
            }
            MatchingPolicy::AggregateByDegree(config) => {
                AggregateByDegree::new(config).select(graph)
            }
        }
    }
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// One matching policy per coarsening level, finest level first.
    pub levels: Vec<MatchingPolicy>,
    pub refine: RefineConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            levels: vec![MatchingPolicy::HeavyEdge],
            refine: RefineConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_toml_str(content: &str) -> CoarsenResult<Self> {
        let config: PipelineConfig = toml::from_str(content)?;

        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> CoarsenResult<()> {
        self.levels.iter().try_for_each(MatchingPolicy::validate)
    }
}
