use tracing::debug;

use crate::assignment::Assignment;
use crate::coarsen_graph::{
    CoarseLabel, CoarsenGraph, CoarsenGraphInput, CoarsenGraphOutput, ContractionMap,
};
use crate::config::{MatchingPolicy, PipelineConfig};
use crate::error::{CoarsenError, CoarsenResult};
use crate::graph::{Graph, NodeId};
use crate::matching::{Matching, MatchingStrategy};
use crate::qubo::{maxcut_to_qubo, QuboMatrix};
use crate::refinement::{lift_solution, LocalRefiner};

/// Solves the QUBO of the coarsest graph.
///
/// This is the hand-off point to an external optimizer (an annealer, a QAOA run, a classical
/// heuristic). The returned vector holds one binary value per row of the matrix, in
/// [QuboMatrix::node_order].
pub trait QuboSolver {
    fn solve<N: NodeId>(&mut self, qubo: &QuboMatrix<N>) -> CoarsenResult<Vec<u8>>;
}

impl<T: QuboSolver> QuboSolver for &mut T {
    fn solve<N: NodeId>(&mut self, qubo: &QuboMatrix<N>) -> CoarsenResult<Vec<u8>> {
        (**self).solve(qubo)
    }
}

/// Pairs a matching strategy with graph contraction: one call selects a matching and contracts
/// the graph along it.
pub struct Coarsener<S> {
    strategy: S,
    coarsen_graph: CoarsenGraph,
}

impl<S: MatchingStrategy> Coarsener<S> {
    pub fn new(strategy: S) -> Self {
        Coarsener {
            strategy,
            coarsen_graph: CoarsenGraph::new(),
        }
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    pub fn coarsen<N: NodeId>(&mut self, graph: &Graph<N>) -> CoarsenGraphOutput<N> {
        let matching = self.strategy.select(graph);

        self.coarsen_graph.coarsen(CoarsenGraphInput {
            fine_graph: graph,
            fine_nodes_matching: &matching,
        })
    }
}

/// One level of a coarsening hierarchy.
#[derive(Clone, Debug)]
pub struct CoarseLevel<N> {
    pub graph: Graph<CoarseLabel>,
    /// Maps the nodes of `graph` to the nodes of the level below it.
    pub contraction_map: ContractionMap<N>,
}

impl<N> From<CoarsenGraphOutput<N>> for CoarseLevel<N> {
    fn from(output: CoarsenGraphOutput<N>) -> Self {
        CoarseLevel {
            graph: output.coarse_graph,
            contraction_map: output.contraction_map,
        }
    }
}

/// The coarse levels produced from one input graph, finest first.
///
/// The first level is labeled by the input graph's node identifiers, every level above it by the
/// [CoarseLabel]s of the level below.
#[derive(Clone, Debug)]
pub struct Hierarchy<N> {
    first: CoarseLevel<N>,
    upper: Vec<CoarseLevel<CoarseLabel>>,
}

impl<N: NodeId> Hierarchy<N> {
    /// The number of coarse levels; always at least `1`.
    pub fn depth(&self) -> usize {
        1 + self.upper.len()
    }

    pub fn first_level(&self) -> &CoarseLevel<N> {
        &self.first
    }

    pub fn upper_levels(&self) -> &[CoarseLevel<CoarseLabel>] {
        &self.upper
    }

    pub fn coarsest_graph(&self) -> &Graph<CoarseLabel> {
        match self.upper.last() {
            Some(level) => &level.graph,
            None => &self.first.graph,
        }
    }

    /// The graph of coarse level `level`, where `0` is the first level.
    pub fn graph(&self, level: usize) -> Option<&Graph<CoarseLabel>> {
        match level {
            0 => Some(&self.first.graph),
            _ => self.upper.get(level - 1).map(|level| &level.graph),
        }
    }

    /// Node counts of every coarse level, finest first.
    pub fn level_sizes(&self) -> Vec<usize> {
        (0..self.depth())
            .filter_map(|level| self.graph(level))
            .map(Graph::node_count)
            .collect()
    }

    /// The map from the coarsest level's nodes straight to the input graph's nodes.
    pub fn contraction_map(&self) -> ContractionMap<N> {
        self.upper
            .iter()
            .fold(self.first.contraction_map.clone(), |map, level| {
                map.compose(&level.contraction_map)
            })
    }
}

/// The result of solving a graph through its coarsening hierarchy.
#[derive(Clone, Debug)]
pub struct MultilevelOutcome<N> {
    /// Node counts of the input graph followed by every coarse level.
    pub level_sizes: Vec<usize>,
    pub coarsest_qubo: QuboMatrix<CoarseLabel>,
    pub coarse_solution: Assignment<CoarseLabel>,
    /// The coarse solution lifted straight to the input graph, without refinement.
    pub lifted: Assignment<N>,
    /// The coarse solution after lifting and refinement at every level.
    pub assignment: Assignment<N>,
    pub cut_value: f64,
}

/// Coarsens a graph level by level, hands the coarsest QUBO to a solver and carries the solution
/// back down, refining it at every level on the way.
pub struct MultilevelPipeline<S = MatchingPolicy> {
    levels: Vec<S>,
    refiner: LocalRefiner,
    coarsen_graph: CoarsenGraph,
}

impl MultilevelPipeline {
    pub fn from_config(config: &PipelineConfig) -> CoarsenResult<Self> {
        config.validate()?;

        Ok(MultilevelPipeline::new(
            config.levels.clone(),
            LocalRefiner::new(config.refine),
        ))
    }
}

impl<S: MatchingStrategy> MultilevelPipeline<S> {
    /// Creates a pipeline that coarsens once per strategy in `levels`, finest level first.
    pub fn new(levels: Vec<S>, refiner: LocalRefiner) -> Self {
        MultilevelPipeline {
            levels,
            refiner,
            coarsen_graph: CoarsenGraph::new(),
        }
    }

    pub fn levels(&self) -> &[S] {
        &self.levels
    }

    pub fn refiner(&self) -> &LocalRefiner {
        &self.refiner
    }

    /// Builds the coarsening hierarchy of `graph`.
    ///
    /// Coarsening stops early once a level no longer reduces the node count, since every further
    /// level would be a copy of it. Without any strategies the hierarchy holds a single level
    /// that relabels every node on its own.
    pub fn coarsen<N: NodeId>(&mut self, graph: &Graph<N>) -> Hierarchy<N> {
        let first_matching = match self.levels.first() {
            Some(strategy) => strategy.select(graph),
            None => singletons(graph.node_count()),
        };

        let first: CoarseLevel<N> = self
            .coarsen_graph
            .coarsen(CoarsenGraphInput {
                fine_graph: graph,
                fine_nodes_matching: &first_matching,
            })
            .into();

        let mut upper: Vec<CoarseLevel<CoarseLabel>> = Vec::new();

        for (index, strategy) in self.levels.iter().enumerate().skip(1) {
            let current = match upper.last() {
                Some(level) => &level.graph,
                None => &first.graph,
            };

            let matching = strategy.select(current);

            if matching.len() == current.node_count() {
                debug!(
                    level = index,
                    nodes = current.node_count(),
                    "matching merges no nodes, stopping coarsening"
                );

                break;
            }

            let output = self.coarsen_graph.coarsen(CoarsenGraphInput {
                fine_graph: current,
                fine_nodes_matching: &matching,
            });

            upper.push(output.into());
        }

        Hierarchy { first, upper }
    }

    /// Runs the full V-cycle on `graph`.
    ///
    /// The solver receives the QUBO of the coarsest graph; its solution is then lifted one level
    /// at a time and refined on each level's graph, ending with a refinement pass on `graph`
    /// itself.
    pub fn solve<N: NodeId, Q: QuboSolver>(
        &mut self,
        graph: &Graph<N>,
        mut solver: Q,
    ) -> CoarsenResult<MultilevelOutcome<N>> {
        let hierarchy = self.coarsen(graph);
        let coarsest_qubo = maxcut_to_qubo(hierarchy.coarsest_graph());
        let bits = solver.solve(&coarsest_qubo)?;

        if bits.len() != coarsest_qubo.dimension() {
            return Err(CoarsenError::SolutionLength {
                expected: coarsest_qubo.dimension(),
                found: bits.len(),
            });
        }

        let coarse_solution = coarsest_qubo.to_assignment(&bits);
        let lifted = lift_solution(&coarse_solution, &hierarchy.contraction_map());

        // Walk back down the upper levels. The solution for level `i + 1` is lifted onto the
        // graph of level `i` (the first level when `i == 0`) and refined there.
        let mut current = coarse_solution.clone();

        for (index, level) in hierarchy.upper_levels().iter().enumerate().rev() {
            let below = match index {
                0 => &hierarchy.first_level().graph,
                _ => &hierarchy.upper_levels()[index - 1].graph,
            };

            current = self
                .refiner
                .refine(below, &lift_solution(&current, &level.contraction_map));
        }

        let fine_solution = lift_solution(&current, &hierarchy.first_level().contraction_map);
        let assignment = self.refiner.refine(graph, &fine_solution);
        let cut_value = graph.cut_value(&assignment);

        let mut level_sizes = vec![graph.node_count()];

        level_sizes.extend(hierarchy.level_sizes());

        debug!(
            ?level_sizes,
            lifted_cut = graph.cut_value(&lifted),
            cut_value,
            "multilevel solve finished"
        );

        Ok(MultilevelOutcome {
            level_sizes,
            coarsest_qubo,
            coarse_solution,
            lifted,
            assignment,
            cut_value,
        })
    }
}

/// Coarsens `graph` once with `strategy`.
pub fn coarsen<N: NodeId, S: MatchingStrategy>(
    graph: &Graph<N>,
    strategy: S,
) -> CoarsenGraphOutput<N> {
    Coarsener::new(strategy).coarsen(graph)
}

/// Builds a pipeline from `config` and runs it on `graph`.
pub fn solve_multilevel<N: NodeId, Q: QuboSolver>(
    graph: &Graph<N>,
    config: &PipelineConfig,
    solver: Q,
) -> CoarsenResult<MultilevelOutcome<N>> {
    MultilevelPipeline::from_config(config)?.solve(graph, solver)
}

fn singletons(node_count: usize) -> Matching {
    Matching::from_groups_unchecked((0..node_count).map(|node| vec![node]).collect())
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::graph::tests::{arb_graph, path_graph};
    use crate::graph::GraphBuilder;
    use crate::matching::{MatchPairsByEdgeWeight, MatchPairsRandomly, MatchPairsRandomlyConfig};
    use crate::refinement::RefineConfig;

    fn heavy_edge_pipeline(depth: usize) -> MultilevelPipeline<MatchPairsByEdgeWeight> {
        MultilevelPipeline::new(vec![MatchPairsByEdgeWeight; depth], LocalRefiner::default())
    }

    /// Enumerates every assignment of a small QUBO and keeps the one with the largest cut,
    /// reading the edge weights back off the matrix (`Q[i, j] = -2 w(i, j)`).
    struct BruteForceMaxCut;

    impl QuboSolver for BruteForceMaxCut {
        fn solve<N: NodeId>(&mut self, qubo: &QuboMatrix<N>) -> CoarsenResult<Vec<u8>> {
            let n = qubo.dimension();
            let matrix = qubo.matrix();

            let cut = |mask: u32| -> f64 {
                let mut cut = 0.0;

                for i in 0..n {
                    for j in (i + 1)..n {
                        if (mask >> i) & 1 != (mask >> j) & 1 {
                            cut -= matrix[[i, j]] / 2.0;
                        }
                    }
                }

                cut
            };

            let best = (0..(1u32 << n))
                .max_by(|a, b| cut(*a).total_cmp(&cut(*b)))
                .unwrap_or(0);

            Ok((0..n).map(|i| ((best >> i) & 1) as u8).collect())
        }
    }

    /// Always answers with all zeros.
    struct ZeroSolver;

    impl QuboSolver for ZeroSolver {
        fn solve<N: NodeId>(&mut self, qubo: &QuboMatrix<N>) -> CoarsenResult<Vec<u8>> {
            Ok(vec![0; qubo.dimension()])
        }
    }

    #[test]
    fn test_coarsener() {
        let output = coarsen(&path_graph(4), MatchPairsByEdgeWeight);

        assert_eq!(output.coarse_graph.node_count(), 2);
        assert_eq!(output.contraction_map.fine_node_count(), 4);
    }

    #[test]
    fn test_hierarchy_shrinks_per_level() {
        let graph = path_graph(16);
        let hierarchy = heavy_edge_pipeline(3).coarsen(&graph);

        assert_eq!(hierarchy.depth(), 3);
        assert_eq!(hierarchy.level_sizes(), vec![8, 4, 2]);
        assert!(hierarchy.contraction_map().is_partition_of(graph.nodes()));
        assert_eq!(hierarchy.contraction_map().len(), 2);
    }

    #[test]
    fn test_coarsening_stops_when_nothing_merges() {
        // Two isolated nodes never merge.
        let mut builder = GraphBuilder::new();

        builder.add_node('a');
        builder.add_node('b');

        let graph = builder.build();
        let hierarchy = heavy_edge_pipeline(4).coarsen(&graph);

        assert_eq!(hierarchy.depth(), 1);
        assert_eq!(hierarchy.level_sizes(), vec![2]);
    }

    #[test]
    fn test_no_levels_keeps_every_node() {
        let graph = path_graph(5);
        let hierarchy = heavy_edge_pipeline(0).coarsen(&graph);

        assert_eq!(hierarchy.level_sizes(), vec![5]);
        assert_eq!(hierarchy.coarsest_graph().edge_count(), 4);
    }

    #[test]
    fn test_solve_path() {
        let graph = path_graph(8);
        let outcome = heavy_edge_pipeline(2)
            .solve(&graph, BruteForceMaxCut)
            .unwrap();

        assert_eq!(outcome.level_sizes, vec![8, 4, 2]);
        assert_eq!(outcome.coarsest_qubo.dimension(), 2);
        assert_eq!(outcome.assignment.len(), 8);
        assert_eq!(outcome.cut_value, graph.cut_value(&outcome.assignment));
        assert!(outcome.cut_value >= graph.cut_value(&outcome.lifted));
    }

    #[test]
    fn test_refinement_repairs_a_poor_coarse_solution() {
        let graph = path_graph(6);
        let outcome = heavy_edge_pipeline(1).solve(&graph, ZeroSolver).unwrap();

        assert_eq!(graph.cut_value(&outcome.lifted), 0.0);
        assert!(outcome.cut_value > 0.0);
    }

    #[test]
    fn test_solution_length_is_checked() {
        struct ShortSolver;

        impl QuboSolver for ShortSolver {
            fn solve<N: NodeId>(&mut self, _qubo: &QuboMatrix<N>) -> CoarsenResult<Vec<u8>> {
                Ok(vec![1])
            }
        }

        assert!(matches!(
            heavy_edge_pipeline(1).solve(&path_graph(6), ShortSolver),
            Err(CoarsenError::SolutionLength {
                expected: 3,
                found: 1
            })
        ));
    }

    #[test]
    fn test_empty_graph() {
        let graph: Graph<u32> = GraphBuilder::new().build();
        let outcome = heavy_edge_pipeline(2)
            .solve(&graph, BruteForceMaxCut)
            .unwrap();

        assert!(outcome.assignment.is_empty());
        assert_eq!(outcome.cut_value, 0.0);
    }

    #[test]
    fn test_from_config() {
        let config = PipelineConfig::from_toml_str(
            r#"
            [[levels]]
            policy = "heavy_edge"

            [[levels]]
            policy = "random"
            prng_seed = 2
            "#,
        )
        .unwrap();
        let graph = path_graph(10);
        let outcome = solve_multilevel(&graph, &config, BruteForceMaxCut).unwrap();

        assert_eq!(outcome.level_sizes[0], 10);
        assert_eq!(outcome.level_sizes[1], 5);
        assert_eq!(outcome.assignment.len(), 10);
    }

    proptest! {
        #[test]
        fn test_solution_covers_every_node(graph in arb_graph(10), seed in any::<u32>()) {
            let strategy = MatchPairsRandomly::new(MatchPairsRandomlyConfig { prng_seed: seed });
            let mut pipeline = MultilevelPipeline::new(
                vec![strategy; 2],
                LocalRefiner::new(RefineConfig { max_iter: 100, prng_seed: seed }),
            );
            let outcome = pipeline.solve(&graph, BruteForceMaxCut).unwrap();

            prop_assert_eq!(outcome.assignment.len(), graph.node_count());
            prop_assert!(outcome.cut_value >= graph.cut_value(&outcome.lifted));
        }
    }
}
