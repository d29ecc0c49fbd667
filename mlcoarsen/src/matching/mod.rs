mod aggregate_by_degree;
mod match_pairs_by_edge_score;
mod match_pairs_by_edge_weight;
mod match_pairs_randomly;
mod match_state;

pub use self::aggregate_by_degree::{AggregateByDegree, AggregateByDegreeConfig};
pub use self::match_pairs_by_edge_score::{
    MatchPairsByEdgeScore, MatchPairsByEdgeScoreConfig, TopK,
};
pub use self::match_pairs_by_edge_weight::MatchPairsByEdgeWeight;
pub use self::match_pairs_randomly::{MatchPairsRandomly, MatchPairsRandomlyConfig};
pub use self::match_state::{MatchState, MatchStatus};

use std::cmp::Ordering;

use crate::error::{CoarsenError, CoarsenResult};
use crate::graph::{Graph, NodeId};

/// A partition of a graph's nodes into disjoint groups, addressed by node index.
///
/// Pair selectors only emit groups of 1 or 2 nodes; aggregating selectors may emit larger groups.
/// Either way every node of the graph appears in exactly one group, which is what makes the
/// contraction of a matching well-defined.
#[derive(Clone, PartialEq, Eq, Default, Debug)]
pub struct Matching {
    groups: Vec<Vec<usize>>,
}

impl Matching {
    /// Validates that `groups` partitions `0..node_count` before accepting it.
    pub fn from_groups(groups: Vec<Vec<usize>>, node_count: usize) -> CoarsenResult<Self> {
        let matching = Matching { groups };

        if matching.is_partition_of(node_count) {
            Ok(matching)
        } else {
            Err(CoarsenError::InvalidMatching { node_count })
        }
    }

    pub(crate) fn from_groups_unchecked(groups: Vec<Vec<usize>>) -> Self {
        Matching { groups }
    }

    pub fn groups(&self) -> &[Vec<usize>] {
        &self.groups
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.groups
            .iter()
            .filter(|group| group.len() == 2)
            .map(|group| (group[0], group[1]))
    }

    pub fn singleton_count(&self) -> usize {
        self.groups.iter().filter(|group| group.len() == 1).count()
    }

    pub fn max_group_size(&self) -> usize {
        self.groups.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Returns `true` if every index in `0..node_count` appears in exactly one non-empty group.
    pub fn is_partition_of(&self, node_count: usize) -> bool {
        let mut seen = vec![false; node_count];

        for group in &self.groups {
            if group.is_empty() {
                return false;
            }

            for node in group {
                match seen.get_mut(*node) {
                    Some(seen) if !*seen => *seen = true,
                    _ => return false,
                }
            }
        }

        seen.into_iter().all(|seen| seen)
    }

    /// For every node, the index of the group that contains it.
    pub fn nodes_match(&self, node_count: usize) -> Vec<usize> {
        let mut nodes_match = vec![0; node_count];

        for (index, group) in self.groups.iter().enumerate() {
            for node in group {
                nodes_match[*node] = index;
            }
        }

        nodes_match
    }

    /// The groups with node indices resolved to identifiers of `graph`.
    pub fn groups_by_id<'a, N: NodeId>(&self, graph: &'a Graph<N>) -> Vec<Vec<&'a N>> {
        self.groups
            .iter()
            .map(|group| group.iter().map(|node| graph.node(*node)).collect())
            .collect()
    }
}

/// An edge selection policy: decides which nodes of a graph are merged by the next contraction.
pub trait MatchingStrategy {
    fn select<N: NodeId>(&self, graph: &Graph<N>) -> Matching;
}

impl<T: MatchingStrategy> MatchingStrategy for &T {
    fn select<N: NodeId>(&self, graph: &Graph<N>) -> Matching {
        (**self).select(graph)
    }
}

/// Accepts candidate edges in the given order as long as neither endpoint has been matched yet,
/// then turns the remaining nodes into singletons.
pub(crate) fn match_greedily<N: NodeId>(
    graph: &Graph<N>,
    candidate_edges: impl IntoIterator<Item = usize>,
) -> Matching {
    let mut state = MatchState::new(graph.node_count());

    for edge_index in candidate_edges {
        let edge = graph.edge(edge_index);

        state.try_match_pair(edge.source_index, edge.target_index);
    }

    state.finalize_matching()
}

/// Edge indices ordered by descending score.
///
/// Equal scores are ordered by the edge's endpoint identifiers (smaller endpoint first, then the
/// larger one), so the order does not depend on how the edges happen to be stored.
pub(crate) fn edges_by_descending_score<N: NodeId>(graph: &Graph<N>, scores: &[f64]) -> Vec<usize> {
    let endpoint_key = |index: usize| {
        let edge = graph.edge(index);

        if edge.source <= edge.target {
            (edge.source, edge.target)
        } else {
            (edge.target, edge.source)
        }
    };

    let mut order: Vec<usize> = (0..graph.edge_count().min(scores.len())).collect();

    order.sort_by(|a, b| match scores[*b].total_cmp(&scores[*a]) {
        Ordering::Equal => endpoint_key(*a).cmp(&endpoint_key(*b)),
        ordering => ordering,
    });

    order
}
