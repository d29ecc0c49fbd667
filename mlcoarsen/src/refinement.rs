use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::assignment::Assignment;
use crate::coarsen_graph::{CoarseLabel, ContractionMap};
use crate::graph::{Graph, NodeId};
use crate::scoring::shuffle;

/// Expands an assignment over coarse nodes to the fine nodes they aggregate.
///
/// Every fine node receives the value of its coarse node. A coarse node without a value lifts
/// as `0`; this points at a bug in the caller and is logged, but does not fail the lift.
pub fn lift_solution<N: NodeId>(
    coarse_solution: &Assignment<CoarseLabel>,
    contraction_map: &ContractionMap<N>,
) -> Assignment<N> {
    let mut fine_solution = Assignment::new();

    for (label, members) in contraction_map.iter() {
        let value = match coarse_solution.get(&label) {
            Some(value) => value,
            None => {
                warn!(%label, members = members.len(), "coarse node has no value, lifting as 0");

                false
            }
        };

        for node in members {
            fine_solution.insert(node.clone(), value);
        }
    }

    fine_solution
}

#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RefineConfig {
    /// Upper bound on the number of passes over all nodes.
    pub max_iter: usize,
    pub prng_seed: u32,
}

impl Default for RefineConfig {
    fn default() -> Self {
        RefineConfig {
            max_iter: 100,
            prng_seed: 0,
        }
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct RefineOutcome<N> {
    pub assignment: Assignment<N>,
    pub passes: usize,
    pub accepted_flips: usize,
}

/// Greedy single-node-flip local search for MaxCut.
///
/// Each pass visits every node once, in an order shuffled by the seeded PRNG, and flips a node
/// only if doing so strictly increases the cut. Refinement stops after the first pass without an
/// accepted flip (a local optimum) or after `max_iter` passes.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct LocalRefiner {
    config: RefineConfig,
}

impl LocalRefiner {
    pub fn new(config: RefineConfig) -> Self {
        LocalRefiner { config }
    }

    pub fn config(&self) -> &RefineConfig {
        &self.config
    }

    pub fn refine<N: NodeId>(&self, graph: &Graph<N>, initial: &Assignment<N>) -> Assignment<N> {
        self.refine_with_stats(graph, initial).assignment
    }

    pub fn refine_with_stats<N: NodeId>(
        &self,
        graph: &Graph<N>,
        initial: &Assignment<N>,
    ) -> RefineOutcome<N> {
        if graph.is_empty() {
            return RefineOutcome {
                assignment: initial.clone(),
                passes: 0,
                accepted_flips: 0,
            };
        }

        let mut rng = oorandom::Rand32::new(self.config.prng_seed as u64);
        let mut sides: Vec<bool> = graph.nodes().iter().map(|node| initial.is_set(node)).collect();
        let mut visit_order: Vec<usize> = (0..graph.node_count()).collect();

        let mut passes = 0;
        let mut accepted_flips = 0;

        while passes < self.config.max_iter {
            passes += 1;
            shuffle(&mut visit_order, &mut rng);

            let mut accepted_this_pass = 0;

            for node in visit_order.iter().copied() {
                if flip_gain(graph, &sides, node) > 0.0 {
                    sides[node] = !sides[node];
                    accepted_this_pass += 1;
                }
            }

            accepted_flips += accepted_this_pass;

            trace!(pass = passes, flips = accepted_this_pass, "refinement pass");

            if accepted_this_pass == 0 {
                break;
            }
        }

        debug!(
            passes,
            accepted_flips,
            cut = graph.cut_value_by_index(&sides),
            "refinement finished"
        );

        let mut assignment = initial.clone();

        for (node, side) in graph.nodes().iter().zip(sides) {
            assignment.insert(node.clone(), side);
        }

        RefineOutcome {
            assignment,
            passes,
            accepted_flips,
        }
    }
}

/// The change in cut weight caused by flipping `node`: edges to same-side neighbors start
/// crossing the cut, edges to other-side neighbors stop crossing it.
fn flip_gain<N: NodeId>(graph: &Graph<N>, sides: &[bool], node: usize) -> f64 {
    graph
        .neighbors(node)
        .map(|(neighbor, weight)| {
            if sides[neighbor] == sides[node] {
                weight
            } else {
                -weight
            }
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::graph::tests::{arb_graph, path_graph, triangle};
    use crate::graph::GraphBuilder;

    #[test]
    fn test_lift_copies_aggregate_value() {
        let map = ContractionMap::new(vec![vec!["a", "b"], vec!["c"]]);
        let coarse: Assignment<CoarseLabel> =
            [(CoarseLabel(0), true), (CoarseLabel(1), false)].into_iter().collect();

        let fine = lift_solution(&coarse, &map);

        assert_eq!(fine.get(&"a"), Some(true));
        assert_eq!(fine.get(&"b"), Some(true));
        assert_eq!(fine.get(&"c"), Some(false));
    }

    #[test]
    fn test_lift_defaults_missing_labels_to_zero() {
        let map = ContractionMap::new(vec![vec![0, 1], vec![2]]);
        let coarse: Assignment<CoarseLabel> = [(CoarseLabel(0), true)].into_iter().collect();

        let fine = lift_solution(&coarse, &map);

        assert_eq!(fine.len(), 3);
        assert_eq!(fine.get(&2), Some(false));
    }

    #[test]
    fn test_refine_path_reaches_local_optimum() {
        let graph = path_graph(6);
        let outcome = LocalRefiner::default().refine_with_stats(&graph, &Assignment::new());
        let sides: Vec<bool> = graph
            .nodes()
            .iter()
            .map(|node| outcome.assignment.is_set(node))
            .collect();

        assert_eq!(outcome.assignment.len(), 6);
        assert!(outcome.accepted_flips > 0);
        assert!(graph.cut_value(&outcome.assignment) >= 3.0);

        for node in 0..graph.node_count() {
            assert!(flip_gain(&graph, &sides, node) <= 0.0);
        }
    }

    #[test]
    fn test_refine_triangle() {
        let graph = triangle();
        let refined = LocalRefiner::default().refine(&graph, &Assignment::new());

        assert_eq!(graph.cut_value(&refined), 2.0);
    }

    #[test]
    fn test_ties_are_not_taken() {
        // Path 0-1-2-3 with sides 1 0 0 1: flipping 1 or 2 leaves the cut unchanged, flipping 0
        // or 3 shrinks it. Nothing may be flipped.
        let graph = path_graph(4);
        let initial: Assignment<u32> = [(0, true), (1, false), (2, false), (3, true)]
            .into_iter()
            .collect();
        let outcome = LocalRefiner::default().refine_with_stats(&graph, &initial);

        assert_eq!(outcome.assignment, initial);
        assert_eq!(outcome.passes, 1);
        assert_eq!(outcome.accepted_flips, 0);
    }

    #[test]
    fn test_max_iter_bounds_passes() {
        let graph = path_graph(8);
        let refiner = LocalRefiner::new(RefineConfig {
            max_iter: 1,
            prng_seed: 3,
        });

        assert_eq!(refiner.refine_with_stats(&graph, &Assignment::new()).passes, 1);
    }

    #[test]
    fn test_empty_graph_returns_input() {
        let graph: Graph<u32> = GraphBuilder::new().build();
        let initial: Assignment<u32> = [(9, true)].into_iter().collect();
        let outcome = LocalRefiner::default().refine_with_stats(&graph, &initial);

        assert_eq!(outcome.assignment, initial);
        assert_eq!(outcome.passes, 0);
    }

    #[test]
    fn test_same_seed_same_result() {
        let graph = path_graph(9);
        let refiner = LocalRefiner::new(RefineConfig {
            max_iter: 100,
            prng_seed: 11,
        });

        assert_eq!(
            refiner.refine(&graph, &Assignment::new()),
            refiner.refine(&graph, &Assignment::new())
        );
    }

    proptest! {
        #[test]
        fn test_refinement_never_decreases_cut(graph in arb_graph(10), bits in any::<u16>(), seed in any::<u32>()) {
            let initial: Assignment<u32> = graph
                .nodes()
                .iter()
                .enumerate()
                .map(|(i, node)| (*node, (bits >> i) & 1 == 1))
                .collect();
            let refiner = LocalRefiner::new(RefineConfig { max_iter: 100, prng_seed: seed });
            let refined = refiner.refine(&graph, &initial);

            prop_assert!(graph.cut_value(&refined) >= graph.cut_value(&initial));
        }

        #[test]
        fn test_refinement_is_idempotent_at_local_optimum(graph in arb_graph(10), seed in any::<u32>()) {
            let refiner = LocalRefiner::new(RefineConfig { max_iter: 1000, prng_seed: seed });
            let first = refiner.refine_with_stats(&graph, &Assignment::new());
            let second = refiner.refine_with_stats(&graph, &first.assignment);

            prop_assert_eq!(second.accepted_flips, 0);
            prop_assert_eq!(second.assignment, first.assignment);
        }
    }
}
