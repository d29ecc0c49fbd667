use serde::{Deserialize, Serialize};

use crate::graph::{Graph, NodeId};
use crate::matching::{MatchState, Matching, MatchingStrategy};
use crate::scoring::shuffle;

#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchPairsRandomlyConfig {
    pub prng_seed: u32,
}

impl Default for MatchPairsRandomlyConfig {
    fn default() -> Self {
        MatchPairsRandomlyConfig { prng_seed: 0 }
    }
}

/// Pairs every node with a uniformly chosen unmatched neighbor.
///
/// Nodes are visited in an order shuffled by the seeded PRNG. A visited node that is still
/// unmatched is paired with one of its unmatched neighbors (chosen uniformly with the same PRNG),
/// or becomes a singleton if it has none. The same seed and graph always produce the same
/// matching.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct MatchPairsRandomly {
    config: MatchPairsRandomlyConfig,
}

impl MatchPairsRandomly {
    pub fn new(config: MatchPairsRandomlyConfig) -> Self {
        MatchPairsRandomly { config }
    }

    pub fn config(&self) -> &MatchPairsRandomlyConfig {
        &self.config
    }
}

impl MatchingStrategy for MatchPairsRandomly {
    fn select<N: NodeId>(&self, graph: &Graph<N>) -> Matching {
        let mut rng = oorandom::Rand32::new(self.config.prng_seed as u64);
        let mut state = MatchState::new(graph.node_count());

        let mut visit_order: Vec<usize> = (0..graph.node_count()).collect();

        shuffle(&mut visit_order, &mut rng);

        let mut candidates = Vec::new();

        for node in visit_order {
            if state.is_matched(node) {
                continue;
            }

            candidates.clear();
            candidates.extend(
                graph
                    .neighbors(node)
                    .map(|(neighbor, _)| neighbor)
                    .filter(|neighbor| !state.is_matched(*neighbor)),
            );

            if candidates.is_empty() {
                state.push_group(vec![node]);
            } else {
                let choice = rng.rand_range(0..candidates.len() as u32) as usize;

                state.try_match_pair(node, candidates[choice]);
            }
        }

        state.finalize_matching()
    }
}
