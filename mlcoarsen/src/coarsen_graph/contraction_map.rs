use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::graph::NodeId;

/// The label of a coarse node. Labels are dense: a coarse graph with `n` nodes uses the labels
/// `c0` to `c{n - 1}`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CoarseLabel(pub u32);

impl CoarseLabel {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for CoarseLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

impl fmt::Display for CoarseLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// Maps every coarse node to the ordered list of finer nodes it aggregates.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct ContractionMap<N> {
    groups: Vec<Vec<N>>,
}

impl<N: NodeId> ContractionMap<N> {
    /// Creates a map where `groups[i]` lists the members of coarse node `c{i}`.
    pub fn new(groups: Vec<Vec<N>>) -> Self {
        ContractionMap { groups }
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn labels(&self) -> impl ExactSizeIterator<Item = CoarseLabel> {
        (0..self.groups.len() as u32).map(CoarseLabel)
    }

    pub fn members(&self, label: CoarseLabel) -> Option<&[N]> {
        self.groups.get(label.index()).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (CoarseLabel, &[N])> + '_ {
        self.groups
            .iter()
            .enumerate()
            .map(|(index, members)| (CoarseLabel(index as u32), members.as_slice()))
    }

    /// The total number of fine nodes across all coarse nodes.
    pub fn fine_node_count(&self) -> usize {
        self.groups.iter().map(Vec::len).sum()
    }

    /// Returns `true` if the member lists are non-empty, pairwise disjoint, and together contain
    /// exactly the nodes in `nodes`.
    pub fn is_partition_of(&self, nodes: &[N]) -> bool {
        let expected: HashSet<&N> = nodes.iter().collect();

        if expected.len() != nodes.len() || self.fine_node_count() != nodes.len() {
            return false;
        }

        let mut seen = HashSet::with_capacity(nodes.len());

        self.groups.iter().all(|members| {
            !members.is_empty()
                && members
                    .iter()
                    .all(|node| expected.contains(node) && seen.insert(node))
        })
    }

    /// Chains this map with the map of the next, coarser level, producing the map from the
    /// coarser level's labels directly to this map's fine nodes.
    ///
    /// Coarser-level members that do not name a label of this map are skipped.
    pub fn compose(&self, coarser: &ContractionMap<CoarseLabel>) -> ContractionMap<N> {
        let groups = coarser
            .groups
            .iter()
            .map(|members| {
                members
                    .iter()
                    .filter_map(|label| self.members(*label))
                    .flat_map(|fine| fine.iter().cloned())
                    .collect()
            })
            .collect();

        ContractionMap { groups }
    }

    pub fn into_groups(self) -> Vec<Vec<N>> {
        self.groups
    }
}
