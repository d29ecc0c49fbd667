use crate::graph::{Graph, NodeId};
use crate::matching::{edges_by_descending_score, match_greedily, Matching, MatchingStrategy};
use crate::scoring::{EdgeScorer, WeightScorer};

/// Heavy-edge matching: edges are considered from heaviest to lightest, and an edge is accepted
/// when neither of its endpoints has been matched yet. Edges of equal weight are considered in
/// order of their endpoint identifiers.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct MatchPairsByEdgeWeight;

impl MatchingStrategy for MatchPairsByEdgeWeight {
    fn select<N: NodeId>(&self, graph: &Graph<N>) -> Matching {
        let weights = WeightScorer.score_edges(graph);

        match_greedily(graph, edges_by_descending_score(graph, &weights))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphBuilder;

    #[test]
    fn test_heaviest_edge_is_matched_first() {
        let mut builder = GraphBuilder::new();

        builder.add_weighted_edge(0, 1, 5.0).unwrap();
        builder.add_weighted_edge(1, 2, 1.0).unwrap();

        let graph = builder.build();
        let matching = MatchPairsByEdgeWeight.select(&graph);

        assert_eq!(matching.groups_by_id(&graph), vec![vec![&0, &1], vec![&2]]);
    }

    #[test]
    fn test_greedy_over_all_edges() {
        // 0 -9- 1 -8- 2 -7- 3: the 8 edge conflicts with the 9 edge, the 7 edge is still taken.
        let mut builder = GraphBuilder::new();

        builder.add_weighted_edge(1, 2, 8.0).unwrap();
        builder.add_weighted_edge(2, 3, 7.0).unwrap();
        builder.add_weighted_edge(0, 1, 9.0).unwrap();

        let graph = builder.build();
        let matching = MatchPairsByEdgeWeight.select(&graph);

        assert_eq!(
            matching.groups_by_id(&graph),
            vec![vec![&0, &1], vec![&2, &3]]
        );
    }

    #[test]
    fn test_ties_are_deterministic() {
        // A unit-weight square: insertion order differs, the matching does not.
        let mut a = GraphBuilder::new();
        let mut b = GraphBuilder::new();

        for (u, v) in [("a", "b"), ("b", "c"), ("c", "d"), ("d", "a")] {
            a.add_edge(u, v).unwrap();
        }

        for (u, v) in [("d", "a"), ("c", "d"), ("b", "c"), ("a", "b")] {
            b.add_edge(u, v).unwrap();
        }

        let a = a.build();
        let b = b.build();

        let mut groups_a = MatchPairsByEdgeWeight.select(&a).groups_by_id(&a);
        let mut groups_b = MatchPairsByEdgeWeight.select(&b).groups_by_id(&b);

        for group in groups_a.iter_mut().chain(groups_b.iter_mut()) {
            group.sort();
        }

        groups_a.sort();
        groups_b.sort();

        assert_eq!(groups_a, groups_b);
        assert_eq!(groups_a, vec![vec![&"a", &"b"], vec![&"c", &"d"]]);
    }
}
