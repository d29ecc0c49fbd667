use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use crate::assignment::Assignment;
use crate::error::{CoarsenError, CoarsenResult};

pub const DEFAULT_EDGE_WEIGHT: f64 = 1.0;

/// Bound for node identifiers: opaque, comparable and cheap enough to clone into maps.
pub trait NodeId: Clone + Eq + Hash + Ord + fmt::Debug {}

impl<T> NodeId for T where T: Clone + Eq + Hash + Ord + fmt::Debug {}

#[derive(PartialEq, Debug)]
pub struct EdgeRef<'a, N> {
    pub source: &'a N,
    pub target: &'a N,
    pub source_index: usize,
    pub target_index: usize,
    pub weight: f64,
}

impl<N> Clone for EdgeRef<'_, N> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<N> Copy for EdgeRef<'_, N> {}

#[derive(Clone, Copy, PartialEq, Debug)]
pub(crate) struct IndexedEdge {
    pub source: usize,
    pub target: usize,
    pub weight: f64,
}

/// An immutable, weighted, undirected graph.
///
/// Nodes keep the order in which they were added and are addressed either by their identifier or
/// by their dense index into that order. Edges are stored once in an edge list (insertion order,
/// parallel edges already merged) and twice in a compressed adjacency layout, where the edges of
/// node `i` occupy `nodes_edges[nodes_edge_offset[i]..nodes_edge_offset[i + 1]]`.
#[derive(Clone)]
pub struct Graph<N> {
    nodes: Vec<N>,
    node_index: HashMap<N, usize>,
    edges: Vec<IndexedEdge>,
    nodes_edge_offset: Vec<usize>,
    nodes_edges: Vec<usize>,
    nodes_edge_weights: Vec<f64>,
}

impl<N: NodeId> Graph<N> {
    pub fn builder() -> GraphBuilder<N> {
        GraphBuilder::new()
    }

    /// Builds a graph from a node list and a list of `(u, v, weight)` edges. A `None` weight
    /// defaults to `1.0`; edges may introduce nodes not present in `nodes`.
    pub fn from_edges<I, E>(nodes: I, edges: E) -> CoarsenResult<Self>
    where
        I: IntoIterator<Item = N>,
        E: IntoIterator<Item = (N, N, Option<f64>)>,
    {
        let mut builder = GraphBuilder::new();

        for node in nodes {
            builder.add_node(node);
        }

        for (u, v, weight) in edges {
            builder.add_weighted_edge(u, v, weight.unwrap_or(DEFAULT_EDGE_WEIGHT))?;
        }

        Ok(builder.build())
    }

    /// Assembles a graph from parts that are already known to satisfy the graph invariants.
    pub(crate) fn from_parts(nodes: Vec<N>, edges: Vec<IndexedEdge>) -> Self {
        let node_index = nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (node.clone(), index))
            .collect();

        let node_count = nodes.len();
        let mut degrees = vec![0usize; node_count];

        for edge in &edges {
            degrees[edge.source] += 1;
            degrees[edge.target] += 1;
        }

        let mut nodes_edge_offset = Vec::with_capacity(node_count + 1);
        let mut current_offset = 0;

        nodes_edge_offset.push(0);

        for degree in &degrees {
            current_offset += degree;
            nodes_edge_offset.push(current_offset);
        }

        let mut cursor = nodes_edge_offset[..node_count].to_vec();
        let mut nodes_edges = vec![0; current_offset];
        let mut nodes_edge_weights = vec![0.0; current_offset];

        for edge in &edges {
            let mut push = |owner: usize, other: usize| {
                let position = cursor[owner];

                nodes_edges[position] = other;
                nodes_edge_weights[position] = edge.weight;
                cursor[owner] += 1;
            };

            push(edge.source, edge.target);
            push(edge.target, edge.source);
        }

        Graph {
            nodes,
            node_index,
            edges,
            nodes_edge_offset,
            nodes_edges,
            nodes_edge_weights,
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[N] {
        &self.nodes
    }

    pub fn node(&self, index: usize) -> &N {
        &self.nodes[index]
    }

    pub fn index_of(&self, node: &N) -> Option<usize> {
        self.node_index.get(node).copied()
    }

    pub fn contains_node(&self, node: &N) -> bool {
        self.node_index.contains_key(node)
    }

    /// Iterates over the edges in a stable order (the order in which they were first added).
    pub fn edges(&self) -> impl ExactSizeIterator<Item = EdgeRef<N>> + '_ {
        self.edges.iter().map(move |edge| self.edge_ref(edge))
    }

    pub fn edge(&self, index: usize) -> EdgeRef<N> {
        self.edge_ref(&self.edges[index])
    }

    pub(crate) fn indexed_edges(&self) -> &[IndexedEdge] {
        &self.edges
    }

    fn edge_ref<'a>(&'a self, edge: &IndexedEdge) -> EdgeRef<'a, N> {
        EdgeRef {
            source: &self.nodes[edge.source],
            target: &self.nodes[edge.target],
            source_index: edge.source,
            target_index: edge.target,
            weight: edge.weight,
        }
    }

    /// Iterates over `(neighbor_index, weight)` pairs for the node at `index`.
    pub fn neighbors(&self, index: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let start = self.nodes_edge_offset[index];
        let end = self.nodes_edge_offset[index + 1];

        self.nodes_edges[start..end]
            .iter()
            .copied()
            .zip(self.nodes_edge_weights[start..end].iter().copied())
    }

    pub fn degree(&self, index: usize) -> usize {
        self.nodes_edge_offset[index + 1] - self.nodes_edge_offset[index]
    }

    pub fn weighted_degree(&self, index: usize) -> f64 {
        self.neighbors(index).map(|(_, weight)| weight).sum()
    }

    pub fn weight_between(&self, a: usize, b: usize) -> Option<f64> {
        // Scan the shorter of the two adjacency lists.
        let (owner, other) = if self.degree(a) <= self.degree(b) {
            (a, b)
        } else {
            (b, a)
        };

        self.neighbors(owner)
            .find(|(neighbor, _)| *neighbor == other)
            .map(|(_, weight)| weight)
    }

    pub fn total_weight(&self) -> f64 {
        self.edges.iter().map(|edge| edge.weight).sum()
    }

    /// Total weight of the edges whose endpoints receive different values. Nodes missing from
    /// `assignment` count as `0`.
    pub fn cut_value(&self, assignment: &Assignment<N>) -> f64 {
        let sides: Vec<bool> = self.nodes.iter().map(|node| assignment.is_set(node)).collect();

        self.cut_value_by_index(&sides)
    }

    pub(crate) fn cut_value_by_index(&self, sides: &[bool]) -> f64 {
        self.edges
            .iter()
            .filter(|edge| sides[edge.source] != sides[edge.target])
            .map(|edge| edge.weight)
            .sum()
    }
}

impl<N: NodeId> fmt::Debug for Graph<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let edges: Vec<_> = self
            .edges()
            .map(|edge| (edge.source, edge.target, edge.weight))
            .collect();

        f.debug_struct("Graph")
            .field("nodes", &self.nodes)
            .field("edges", &edges)
            .finish()
    }
}

/// Incrementally collects nodes and edges, merging parallel edges by summing their weights.
pub struct GraphBuilder<N> {
    nodes: Vec<N>,
    node_index: HashMap<N, usize>,
    edge_slots: HashMap<(usize, usize), usize>,
    edges: Vec<IndexedEdge>,
    strict: bool,
}

impl<N: NodeId> GraphBuilder<N> {
    /// A builder that implicitly adds the endpoints of every edge.
    pub fn new() -> Self {
        GraphBuilder {
            nodes: Vec::new(),
            node_index: HashMap::new(),
            edge_slots: HashMap::new(),
            edges: Vec::new(),
            strict: false,
        }
    }

    /// A builder that rejects edges between nodes that were not added first.
    pub fn strict() -> Self {
        GraphBuilder {
            strict: true,
            ..GraphBuilder::new()
        }
    }

    pub fn add_node(&mut self, node: N) -> usize {
        if let Some(index) = self.node_index.get(&node) {
            return *index;
        }

        let index = self.nodes.len();

        self.node_index.insert(node.clone(), index);
        self.nodes.push(node);

        index
    }

    pub fn add_edge(&mut self, u: N, v: N) -> CoarsenResult<()> {
        self.add_weighted_edge(u, v, DEFAULT_EDGE_WEIGHT)
    }

    pub fn add_weighted_edge(&mut self, u: N, v: N, weight: f64) -> CoarsenResult<()> {
        if u == v {
            return Err(CoarsenError::SelfLoop {
                node: format!("{:?}", u),
            });
        }

        if !weight.is_finite() || weight < 0.0 {
            return Err(CoarsenError::InvalidWeight {
                source_node: format!("{:?}", u),
                target_node: format!("{:?}", v),
                weight,
            });
        }

        let source = self.resolve(u)?;
        let target = self.resolve(v)?;
        let key = (source.min(target), source.max(target));

        if let Some(slot) = self.edge_slots.get(&key) {
            self.edges[*slot].weight += weight;
        } else {
            self.edge_slots.insert(key, self.edges.len());
            self.edges.push(IndexedEdge {
                source,
                target,
                weight,
            });
        }

        Ok(())
    }

    fn resolve(&mut self, node: N) -> CoarsenResult<usize> {
        if let Some(index) = self.node_index.get(&node) {
            Ok(*index)
        } else if self.strict {
            Err(CoarsenError::UnknownNode {
                node: format!("{:?}", node),
            })
        } else {
            Ok(self.add_node(node))
        }
    }

    pub fn build(self) -> Graph<N> {
        Graph::from_parts(self.nodes, self.edges)
    }
}

impl<N: NodeId> Default for GraphBuilder<N> {
    fn default() -> Self {
        GraphBuilder::new()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use proptest::prelude::*;

    use super::*;

    pub fn path_graph(n: u32) -> Graph<u32> {
        let mut builder = GraphBuilder::new();

        for i in 0..n {
            builder.add_node(i);
        }

        for i in 1..n {
            builder.add_edge(i - 1, i).unwrap();
        }

        builder.build()
    }

    pub fn triangle() -> Graph<u32> {
        Graph::from_edges(0..3, [(0, 1, None), (1, 2, None), (0, 2, None)]).unwrap()
    }

    /// Strategy for small simple graphs with integral weights, so that weight sums stay exact.
    pub fn arb_graph(max_nodes: u32) -> impl Strategy<Value = Graph<u32>> {
        (1..=max_nodes).prop_flat_map(|n| {
            let pairs: Vec<(u32, u32)> = (0..n)
                .flat_map(|u| ((u + 1)..n).map(move |v| (u, v)))
                .collect();
            let pair_count = pairs.len();

            prop::collection::vec(prop::option::of(0u8..8), pair_count).prop_map(move |weights| {
                let mut builder = GraphBuilder::new();

                for i in 0..n {
                    builder.add_node(i);
                }

                for (&(u, v), weight) in pairs.iter().zip(weights) {
                    if let Some(weight) = weight {
                        builder.add_weighted_edge(u, v, weight as f64).unwrap();
                    }
                }

                builder.build()
            })
        })
    }

    #[test]
    fn test_parallel_edges_are_summed() {
        let mut builder = GraphBuilder::new();

        builder.add_weighted_edge("a", "b", 2.0).unwrap();
        builder.add_weighted_edge("b", "a", 3.0).unwrap();
        builder.add_edge("b", "c").unwrap();

        let graph = builder.build();

        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.edge(0).weight, 5.0);
        assert_eq!(graph.weight_between(0, 1), Some(5.0));
        assert_eq!(graph.weight_between(1, 2), Some(1.0));
        assert_eq!(graph.weight_between(0, 2), None);
    }

    #[test]
    fn test_self_loop_rejected() {
        let mut builder = GraphBuilder::new();

        assert!(matches!(
            builder.add_edge(1, 1),
            Err(CoarsenError::SelfLoop { .. })
        ));
    }

    #[test]
    fn test_invalid_weights_rejected() {
        let mut builder = GraphBuilder::new();

        assert!(builder.add_weighted_edge(0, 1, -1.0).is_err());
        assert!(builder.add_weighted_edge(0, 1, f64::NAN).is_err());
        assert!(builder.add_weighted_edge(0, 1, f64::INFINITY).is_err());
        assert!(builder.add_weighted_edge(0, 1, 0.0).is_ok());
    }

    #[test]
    fn test_strict_builder_rejects_unknown_nodes() {
        let mut builder = GraphBuilder::strict();

        builder.add_node(0);

        assert!(matches!(
            builder.add_edge(0, 1),
            Err(CoarsenError::UnknownNode { .. })
        ));
    }

    #[test]
    fn test_adjacency_matches_edge_list() {
        let graph = path_graph(4);

        assert_eq!(graph.degree(0), 1);
        assert_eq!(graph.degree(1), 2);
        assert_eq!(graph.degree(3), 1);

        let neighbors: Vec<usize> = graph.neighbors(1).map(|(n, _)| n).collect();

        assert_eq!(neighbors, vec![0, 2]);
        assert_eq!(graph.weighted_degree(2), 2.0);
        assert_eq!(graph.total_weight(), 3.0);
    }

    #[test]
    fn test_cut_value() {
        let graph = triangle();
        let assignment: Assignment<u32> = [(0, true), (1, false), (2, false)].into_iter().collect();

        assert_eq!(graph.cut_value(&assignment), 2.0);
        assert_eq!(graph.cut_value(&Assignment::new()), 0.0);
    }

    #[test]
    fn test_empty_graph() {
        let graph: Graph<u32> = GraphBuilder::new().build();

        assert!(graph.is_empty());
        assert_eq!(graph.edges().len(), 0);
        assert_eq!(graph.total_weight(), 0.0);
    }
}
