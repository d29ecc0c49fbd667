use crate::matching::Matching;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MatchStatus {
    Unmatched,
    Matched { group: usize },
}

/// Tracks which nodes have been claimed by a group while a selector runs.
///
/// Selectors claim nodes by forming groups; `finalize_matching` then turns every node that was
/// never claimed into a singleton group, so the resulting [Matching] covers every node exactly
/// once.
#[derive(Clone, Debug)]
pub struct MatchState {
    nodes_status: Vec<MatchStatus>,
    groups: Vec<Vec<usize>>,
}

impl MatchState {
    pub fn new(node_count: usize) -> Self {
        MatchState {
            nodes_status: vec![MatchStatus::Unmatched; node_count],
            groups: Vec::new(),
        }
    }

    pub fn status(&self, node: usize) -> MatchStatus {
        self.nodes_status[node]
    }

    pub fn is_matched(&self, node: usize) -> bool {
        self.nodes_status[node] != MatchStatus::Unmatched
    }

    /// Claims `a` and `b` as a pair if neither is claimed yet.
    pub fn try_match_pair(&mut self, a: usize, b: usize) -> bool {
        if a == b || self.is_matched(a) || self.is_matched(b) {
            return false;
        }

        self.push_group(vec![a, b]);

        true
    }

    /// Claims every node of `group`. The caller guarantees the nodes are distinct and unclaimed.
    pub fn push_group(&mut self, group: Vec<usize>) {
        let index = self.groups.len();

        for node in &group {
            debug_assert!(!self.is_matched(*node), "node {} claimed twice", node);

            self.nodes_status[*node] = MatchStatus::Matched { group: index };
        }

        self.groups.push(group);
    }

    pub fn finalize_matching(mut self) -> Matching {
        for node in 0..self.nodes_status.len() {
            if !self.is_matched(node) {
                self.push_group(vec![node]);
            }
        }

        Matching::from_groups_unchecked(self.groups)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pairs_are_disjoint() {
        let mut state = MatchState::new(4);

        assert!(state.try_match_pair(0, 1));
        assert!(!state.try_match_pair(1, 2));
        assert!(!state.try_match_pair(2, 2));
        assert_eq!(state.status(1), MatchStatus::Matched { group: 0 });
        assert_eq!(state.status(2), MatchStatus::Unmatched);

        let matching = state.finalize_matching();

        assert_eq!(matching.groups(), &[vec![0, 1], vec![2], vec![3]]);
    }
}
