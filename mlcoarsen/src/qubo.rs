//! MaxCut as a quadratic unconstrained binary optimization problem.
//!
//! Every edge `(i, j)` with weight `w` contributes `w` to both diagonal entries `Q[i, i]` and
//! `Q[j, j]` and `-2w` to both off-diagonal entries `Q[i, j]` and `Q[j, i]`, so `Q` is symmetric
//! by construction. For a binary vector `x` (where `x_i^2 = x_i`) each edge adds
//! `w (x_i + x_j - 4 x_i x_j)` to `x^T Q x`, which works out to
//!
//! ```text
//! x^T Q x = cut(x) - 2 * W11(x)
//! ```
//!
//! where `W11(x)` is the weight of the edges with both endpoints set to `1`.

use ndarray::Array2;

use crate::assignment::Assignment;
use crate::graph::{Graph, NodeId};

/// A QUBO matrix together with the node order that indexes its rows and columns.
#[derive(Clone, PartialEq, Debug)]
pub struct QuboMatrix<N> {
    matrix: Array2<f64>,
    node_order: Vec<N>,
}

impl<N: NodeId> QuboMatrix<N> {
    pub fn matrix(&self) -> &Array2<f64> {
        &self.matrix
    }

    /// `node_order()[i]` is the node represented by row and column `i`.
    pub fn node_order(&self) -> &[N] {
        &self.node_order
    }

    pub fn dimension(&self) -> usize {
        self.node_order.len()
    }

    pub fn is_symmetric(&self) -> bool {
        self.matrix == self.matrix.t()
    }

    /// Evaluates `x^T Q x` for a binary vector indexed like the matrix. Any non-zero entry is
    /// read as `1`.
    ///
    /// # Panics
    ///
    /// Panics if `x` does not have exactly one entry per node.
    pub fn energy(&self, x: &[u8]) -> f64 {
        assert_eq!(
            x.len(),
            self.dimension(),
            "binary vector length does not match the QUBO dimension"
        );

        let set: Vec<usize> = x
            .iter()
            .enumerate()
            .filter(|(_, bit)| **bit != 0)
            .map(|(index, _)| index)
            .collect();

        set.iter()
            .flat_map(|i| set.iter().map(move |j| (*i, *j)))
            .map(|(i, j)| self.matrix[[i, j]])
            .sum()
    }

    /// Evaluates `x^T Q x` for an assignment; nodes missing from the assignment read as `0`.
    pub fn energy_of(&self, assignment: &Assignment<N>) -> f64 {
        self.energy(&assignment.to_bits(&self.node_order))
    }

    /// Pairs a binary vector indexed like the matrix with the nodes it belongs to.
    pub fn to_assignment(&self, x: &[u8]) -> Assignment<N> {
        Assignment::from_bits(&self.node_order, x)
    }
}

/// Builds the MaxCut QUBO for `graph`, indexed in the graph's node order.
pub fn maxcut_to_qubo<N: NodeId>(graph: &Graph<N>) -> QuboMatrix<N> {
    let n = graph.node_count();
    let mut matrix = Array2::<f64>::zeros((n, n));

    for edge in graph.edges() {
        let i = edge.source_index;
        let j = edge.target_index;
        let w = edge.weight;

        matrix[[i, i]] += w;
        matrix[[j, j]] += w;
        matrix[[i, j]] -= 2.0 * w;
        matrix[[j, i]] -= 2.0 * w;
    }

    QuboMatrix {
        matrix,
        node_order: graph.nodes().to_vec(),
    }
}
