//! Edge feature extraction for learned edge scoring.
//!
//! Every edge `(u, v)` is described by a fixed vector of 7 structural features:
//!
//! 1. degree of `u`
//! 2. degree of `v`
//! 3. local clustering coefficient of `u`
//! 4. local clustering coefficient of `v`
//! 5. the edge weight
//! 6. the number of common neighbors of `u` and `v`
//! 7. the Jaccard similarity of the neighbor sets of `u` and `v`
//!
//! Features are computed fresh for each graph; coarse graphs get their own extraction pass.

use std::collections::HashSet;

use crate::graph::{EdgeRef, Graph, NodeId};

pub const NUM_EDGE_FEATURES: usize = 7;

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct EdgeFeatures {
    pub source_degree: f64,
    pub target_degree: f64,
    pub source_clustering: f64,
    pub target_clustering: f64,
    pub weight: f64,
    pub common_neighbors: f64,
    pub jaccard: f64,
}

impl EdgeFeatures {
    pub fn to_array(&self) -> [f64; NUM_EDGE_FEATURES] {
        [
            self.source_degree,
            self.target_degree,
            self.source_clustering,
            self.target_clustering,
            self.weight,
            self.common_neighbors,
            self.jaccard,
        ]
    }
}

/// The edges of a graph paired with their features, index-aligned.
#[derive(Clone, Debug)]
pub struct EdgeFeatureTable<'a, N> {
    pub edges: Vec<EdgeRef<'a, N>>,
    pub features: Vec<EdgeFeatures>,
}

impl<'a, N> EdgeFeatureTable<'a, N> {
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Row-major feature matrix, one row per edge.
    pub fn rows(&self) -> Vec<[f64; NUM_EDGE_FEATURES]> {
        self.features.iter().map(EdgeFeatures::to_array).collect()
    }
}

pub fn extract_edge_features<N: NodeId>(graph: &Graph<N>) -> EdgeFeatureTable<N> {
    let neighbor_sets: Vec<HashSet<usize>> = (0..graph.node_count())
        .map(|index| graph.neighbors(index).map(|(neighbor, _)| neighbor).collect())
        .collect();
    let clustering: Vec<f64> = (0..graph.node_count())
        .map(|index| clustering_coefficient(&neighbor_sets, index))
        .collect();

    let mut edges = Vec::with_capacity(graph.edge_count());
    let mut features = Vec::with_capacity(graph.edge_count());

    for edge in graph.edges() {
        let u = edge.source_index;
        let v = edge.target_index;
        let neighbors_u = &neighbor_sets[u];
        let neighbors_v = &neighbor_sets[v];

        let common = neighbors_u.intersection(neighbors_v).count();
        let union = neighbors_u.len() + neighbors_v.len() - common;
        let jaccard = if union == 0 {
            0.0
        } else {
            common as f64 / union as f64
        };

        features.push(EdgeFeatures {
            source_degree: neighbors_u.len() as f64,
            target_degree: neighbors_v.len() as f64,
            source_clustering: clustering[u],
            target_clustering: clustering[v],
            weight: edge.weight,
            common_neighbors: common as f64,
            jaccard,
        });
        edges.push(edge);
    }

    EdgeFeatureTable { edges, features }
}

/// Unweighted local clustering coefficient: the fraction of neighbor pairs that are themselves
/// connected. Nodes with fewer than 2 neighbors have coefficient `0`.
fn clustering_coefficient(neighbor_sets: &[HashSet<usize>], index: usize) -> f64 {
    let neighbors = &neighbor_sets[index];
    let degree = neighbors.len();

    if degree < 2 {
        return 0.0;
    }

    // Each triangle through `index` is seen twice, once from each of its other two corners.
    let links: usize = neighbors
        .iter()
        .map(|neighbor| neighbor_sets[*neighbor].intersection(neighbors).count())
        .sum();
    let possible = degree * (degree - 1);

    links as f64 / possible as f64
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::graph::tests::{path_graph, triangle};
    use crate::graph::GraphBuilder;

    #[test]
    fn test_triangle_features() {
        let graph = triangle();
        let table = extract_edge_features(&graph);

        assert_eq!(table.len(), 3);

        for features in &table.features {
            assert_eq!(features.source_degree, 2.0);
            assert_eq!(features.target_degree, 2.0);
            assert_relative_eq!(features.source_clustering, 1.0);
            assert_relative_eq!(features.target_clustering, 1.0);
            assert_eq!(features.weight, 1.0);
            assert_eq!(features.common_neighbors, 1.0);
            // N(u) = {v, w}, N(v) = {u, w}: one shared neighbor out of three distinct nodes.
            assert_relative_eq!(features.jaccard, 1.0 / 3.0);
        }
    }

    #[test]
    fn test_path_features_follow_edge_order() {
        let graph = path_graph(4);
        let table = extract_edge_features(&graph);

        let endpoints: Vec<(u32, u32)> = table
            .edges
            .iter()
            .map(|edge| (*edge.source, *edge.target))
            .collect();

        assert_eq!(endpoints, vec![(0, 1), (1, 2), (2, 3)]);
        assert_eq!(table.features[0].source_degree, 1.0);
        assert_eq!(table.features[0].target_degree, 2.0);
        assert_eq!(table.features[1].common_neighbors, 0.0);
        assert_eq!(table.features[1].jaccard, 0.0);
        assert_eq!(table.features[1].source_clustering, 0.0);
    }

    #[test]
    fn test_clustering_of_star_with_one_chord() {
        let mut builder = GraphBuilder::new();

        builder.add_edge(0, 1).unwrap();
        builder.add_edge(0, 2).unwrap();
        builder.add_edge(0, 3).unwrap();
        builder.add_weighted_edge(1, 2, 4.0).unwrap();

        let graph = builder.build();
        let table = extract_edge_features(&graph);

        // Node 0 has 3 neighbor pairs, one of which (1-2) is connected.
        assert_relative_eq!(table.features[0].source_clustering, 1.0 / 3.0);
        assert_eq!(table.features[3].weight, 4.0);
        assert_eq!(table.rows()[3][4], 4.0);
    }

    #[test]
    fn test_edgeless_graph_yields_empty_table() {
        let mut builder = GraphBuilder::new();

        builder.add_node(0);

        let graph = builder.build();

        assert!(extract_edge_features(&graph).is_empty());
    }
}
