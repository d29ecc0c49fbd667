use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::graph::{Graph, NodeId};
use crate::matching::{edges_by_descending_score, match_greedily, Matching, MatchingStrategy};
use crate::scoring::{EdgeScorer, LearnedScorer};

/// How many of the best-scoring edges are eligible for matching.
///
/// Serializes as a plain number, read back with [TopK::from_value].
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub enum TopK {
    /// A fraction in `(0, 1)` of the edge count, rounded to the nearest integer.
    Fraction(f64),
    Count(usize),
}

impl TopK {
    /// Interprets a raw value: values strictly between `0` and `1` are fractions, anything else
    /// is an absolute count (negative and non-finite values read as `0`).
    pub fn from_value(value: f64) -> Self {
        if value > 0.0 && value < 1.0 {
            TopK::Fraction(value)
        } else if value.is_finite() && value > 0.0 {
            TopK::Count(value as usize)
        } else {
            TopK::Count(0)
        }
    }

    /// The number of edges to keep out of `edge_count`.
    ///
    /// A request that resolves to no edges at all is raised to `1` when there are edges to
    /// choose from; a count larger than the edge count keeps every edge.
    pub fn resolve(&self, edge_count: usize) -> usize {
        if edge_count == 0 {
            return 0;
        }

        let requested = match *self {
            TopK::Fraction(fraction) if fraction > 0.0 && fraction < 1.0 => {
                (fraction * edge_count as f64).round() as usize
            }
            TopK::Fraction(fraction) if fraction >= 1.0 => edge_count,
            TopK::Fraction(_) => 0,
            TopK::Count(count) => count,
        };

        if requested == 0 {
            warn!(top_k = ?self, edge_count, "top-k selects no edges, clamping to 1");

            return 1;
        }

        requested.min(edge_count)
    }
}

impl From<f64> for TopK {
    fn from(value: f64) -> Self {
        TopK::from_value(value)
    }
}

impl From<TopK> for f64 {
    fn from(top_k: TopK) -> Self {
        match top_k {
            TopK::Fraction(fraction) => fraction,
            TopK::Count(count) => count as f64,
        }
    }
}

impl Default for TopK {
    fn default() -> Self {
        TopK::Fraction(0.2)
    }
}

#[derive(Clone, Copy, PartialEq, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchPairsByEdgeScoreConfig {
    pub top_k: TopK,
}

/// Score-guided matching: the `top_k` best-scoring edges are matched greedily, best first.
///
/// Edges outside of the top `k` are never matched, even when they would not conflict with any
/// accepted edge. Nodes left over become singletons. With a [LearnedScorer] this is the
/// ML-guided coarsening policy.
#[derive(Clone, Debug)]
pub struct MatchPairsByEdgeScore<S = LearnedScorer> {
    scorer: S,
    config: MatchPairsByEdgeScoreConfig,
}

impl<S: EdgeScorer> MatchPairsByEdgeScore<S> {
    pub fn new(scorer: S, config: MatchPairsByEdgeScoreConfig) -> Self {
        MatchPairsByEdgeScore { scorer, config }
    }

    pub fn scorer(&self) -> &S {
        &self.scorer
    }

    pub fn config(&self) -> &MatchPairsByEdgeScoreConfig {
        &self.config
    }

    /// The indices of the edges eligible for matching, best first.
    pub fn top_edges<N: NodeId>(&self, graph: &Graph<N>) -> Vec<usize> {
        let scores = self.scorer.score_edges(graph);
        let k = self.config.top_k.resolve(graph.edge_count());

        let mut order = edges_by_descending_score(graph, &scores);

        order.truncate(k);

        order
    }
}

impl<S: EdgeScorer> MatchingStrategy for MatchPairsByEdgeScore<S> {
    fn select<N: NodeId>(&self, graph: &Graph<N>) -> Matching {
        match_greedily(graph, self.top_edges(graph))
    }
}
