use serde::{Deserialize, Serialize};

use crate::graph::{Graph, NodeId};
use crate::matching::{MatchState, Matching, MatchingStrategy};

#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregateByDegreeConfig {
    pub max_aggregate_size: usize,
}

impl Default for AggregateByDegreeConfig {
    fn default() -> Self {
        AggregateByDegreeConfig {
            max_aggregate_size: 3,
        }
    }
}

/// Grows aggregates around high-degree seeds.
///
/// Nodes are visited by descending degree (equal degrees in node order). Every node that is not
/// yet part of an aggregate seeds a new one and pulls in its unaggregated neighbors, in adjacency
/// order, until the aggregate holds `max_aggregate_size` nodes. Unlike the pair selectors this
/// can merge more than 2 nodes into one coarse node.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct AggregateByDegree {
    config: AggregateByDegreeConfig,
}

impl AggregateByDegree {
    pub fn new(config: AggregateByDegreeConfig) -> Self {
        AggregateByDegree { config }
    }

    pub fn config(&self) -> &AggregateByDegreeConfig {
        &self.config
    }
}

impl MatchingStrategy for AggregateByDegree {
    fn select<N: NodeId>(&self, graph: &Graph<N>) -> Matching {
        let max_size = self.config.max_aggregate_size.max(1);
        let mut state = MatchState::new(graph.node_count());

        let mut seeds: Vec<usize> = (0..graph.node_count()).collect();

        // Stable, so equal degrees keep node order.
        seeds.sort_by(|a, b| graph.degree(*b).cmp(&graph.degree(*a)));

        for seed in seeds {
            if state.is_matched(seed) {
                continue;
            }

            let mut group = vec![seed];

            for (neighbor, _) in graph.neighbors(seed) {
                if group.len() >= max_size {
                    break;
                }

                if !state.is_matched(neighbor) && !group.contains(&neighbor) {
                    group.push(neighbor);
                }
            }

            state.push_group(group);
        }

        state.finalize_matching()
    }
}
