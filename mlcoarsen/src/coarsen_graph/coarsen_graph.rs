use std::collections::HashMap;

use tracing::debug;

use crate::coarsen_graph::{CoarseLabel, ContractionMap};
use crate::graph::{Graph, IndexedEdge, NodeId};
use crate::matching::Matching;

pub struct CoarsenGraphInput<'a, N> {
    pub fine_graph: &'a Graph<N>,
    pub fine_nodes_matching: &'a Matching,
}

pub struct CoarsenGraphOutput<N> {
    pub coarse_graph: Graph<CoarseLabel>,
    pub contraction_map: ContractionMap<N>,
    /// For every fine node index, the index of the coarse node it was merged into.
    pub fine_nodes_mapping: Vec<usize>,
}

/// Contracts a graph along a matching.
///
/// Keeps its scratch storage between calls, so a single instance can be reused to coarsen
/// several levels (or several graphs) without reallocating.
#[derive(Default)]
pub struct CoarsenGraph {
    coarse_edge_slots: HashMap<(usize, usize), usize>,
}

impl CoarsenGraph {
    pub fn new() -> Self {
        CoarsenGraph::default()
    }

    pub fn coarsen<N: NodeId>(&mut self, input: CoarsenGraphInput<N>) -> CoarsenGraphOutput<N> {
        let CoarsenGraphInput {
            fine_graph,
            fine_nodes_matching,
        } = input;

        debug_assert!(
            fine_nodes_matching.is_partition_of(fine_graph.node_count()),
            "matching does not partition the fine graph"
        );

        // Every group in the matching becomes one coarse node, and the coarse nodes are labeled
        // in group order. This gives us both directions of the mapping at once: the group list
        // itself is the coarse-to-fine mapping (once node indices are resolved to identifiers)
        // and `fine_nodes_mapping` is the fine-to-coarse mapping.
        let fine_nodes_mapping = fine_nodes_matching.nodes_match(fine_graph.node_count());

        let coarse_nodes: Vec<CoarseLabel> = (0..fine_nodes_matching.len() as u32)
            .map(CoarseLabel)
            .collect();

        let contraction_map = ContractionMap::new(
            fine_nodes_matching
                .groups()
                .iter()
                .map(|group| group.iter().map(|node| fine_graph.node(*node).clone()).collect())
                .collect(),
        );

        // We now construct the coarse edge list by mapping both endpoints of every fine edge to
        // their coarse nodes. Two things can happen to a mapped edge:
        //
        // - Both endpoints map to the same coarse node. The edge ran between two fine nodes that
        //   were merged, it is internal to the aggregate and is dropped (it would otherwise become
        //   a self-loop).
        // - The pair of coarse endpoints has been seen before. Two or more fine edges run between
        //   the same two aggregates; their weights are summed into the one coarse edge.
        //
        // Summing (rather than e.g. taking the maximum) is what makes the weight of any cut of
        // the coarse graph equal the weight of the corresponding cut of the fine graph. Coarse
        // edges are stored in order of their first occurrence in the fine edge list, with the
        // smaller coarse index as the source.
        self.coarse_edge_slots.clear();

        let mut coarse_edges: Vec<IndexedEdge> = Vec::new();
        let mut dropped_edge_count = 0;

        for edge in fine_graph.indexed_edges() {
            let source = fine_nodes_mapping[edge.source];
            let target = fine_nodes_mapping[edge.target];

            if source == target {
                dropped_edge_count += 1;

                continue;
            }

            let key = (source.min(target), source.max(target));

            match self.coarse_edge_slots.get(&key) {
                Some(slot) => coarse_edges[*slot].weight += edge.weight,
                None => {
                    self.coarse_edge_slots.insert(key, coarse_edges.len());
                    coarse_edges.push(IndexedEdge {
                        source: key.0,
                        target: key.1,
                        weight: edge.weight,
                    });
                }
            }
        }

        let coarse_graph = Graph::from_parts(coarse_nodes, coarse_edges);

        debug!(
            fine_nodes = fine_graph.node_count(),
            fine_edges = fine_graph.edge_count(),
            coarse_nodes = coarse_graph.node_count(),
            coarse_edges = coarse_graph.edge_count(),
            internal_edges = dropped_edge_count,
            "coarsened graph"
        );

        CoarsenGraphOutput {
            coarse_graph,
            contraction_map,
            fine_nodes_mapping,
        }
    }
}
