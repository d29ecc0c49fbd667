use std::collections::btree_map;
use std::collections::BTreeMap;

use crate::graph::NodeId;

/// A binary value per node, as produced by a solver and consumed by lifting and refinement.
///
/// Values are stored as `bool` (`true` is `1`). Iteration is ordered by node identifier.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Assignment<N> {
    values: BTreeMap<N, bool>,
}

impl<N: NodeId> Assignment<N> {
    pub fn new() -> Self {
        Assignment {
            values: BTreeMap::new(),
        }
    }

    /// Pairs `nodes[i]` with `bits[i]`; any non-zero bit is read as `1`.
    pub fn from_bits(nodes: &[N], bits: &[u8]) -> Self {
        nodes
            .iter()
            .cloned()
            .zip(bits.iter().map(|bit| *bit != 0))
            .collect()
    }

    pub fn insert(&mut self, node: N, value: bool) -> Option<bool> {
        self.values.insert(node, value)
    }

    pub fn get(&self, node: &N) -> Option<bool> {
        self.values.get(node).copied()
    }

    /// The value of `node` as `0` or `1`, with missing nodes reading as `0`.
    pub fn bit(&self, node: &N) -> u8 {
        self.is_set(node) as u8
    }

    pub fn is_set(&self, node: &N) -> bool {
        self.get(node).unwrap_or(false)
    }

    pub fn contains(&self, node: &N) -> bool {
        self.values.contains_key(node)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&N, bool)> + '_ {
        self.values.iter().map(|(node, value)| (node, *value))
    }

    /// The values for `nodes`, in that order, as `0`/`1`.
    pub fn to_bits(&self, nodes: &[N]) -> Vec<u8> {
        nodes.iter().map(|node| self.bit(node)).collect()
    }
}

impl<N: NodeId> Default for Assignment<N> {
    fn default() -> Self {
        Assignment::new()
    }
}

impl<N: NodeId> FromIterator<(N, bool)> for Assignment<N> {
    fn from_iter<T: IntoIterator<Item = (N, bool)>>(iter: T) -> Self {
        Assignment {
            values: iter.into_iter().collect(),
        }
    }
}

impl<N: NodeId> IntoIterator for Assignment<N> {
    type Item = (N, bool);
    type IntoIter = btree_map::IntoIter<N, bool>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bits_round_trip_with_missing_nodes() {
        let nodes = ["a", "b", "c"];
        let assignment = Assignment::from_bits(&nodes[..2], &[1, 0]);

        assert_eq!(assignment.len(), 2);
        assert_eq!(assignment.get(&"a"), Some(true));
        assert_eq!(assignment.get(&"c"), None);
        assert_eq!(assignment.to_bits(&nodes), vec![1, 0, 0]);
    }
}
