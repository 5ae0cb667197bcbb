//! Natural loop detection.
//!
//! A back edge is an edge `n -> h` whose target `h` dominates its source `n`. The natural
//! loop of `h` is `h` together with every node that reaches a back edge source without
//! passing through `h`. Back edges sharing a header are merged into one loop.
//!
//! ```text
//!     [header] <------+
//!          |          |
//!          v          |
//!     [body ...]      |
//!          |          |
//!          v          |
//!     [latch] --------+
//! ```
//!
//! Detection works on any graph implementing the traversal traits; the control flow graph
//! passes its normal-flow view so that handler edges never form loops.

use std::collections::BTreeSet;

use crate::utils::graph::{algorithms::DominatorTree, NodeId, Predecessors, Successors};

/// A loop identified through a dominance back edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NaturalLoop {
    /// The single entry node, dominating every node of the body
    pub header: NodeId,
    /// All nodes of the loop, header included
    pub body: BTreeSet<NodeId>,
    /// Sources of the back edges into the header
    pub back_edges: Vec<NodeId>,
    /// Number of other loops enclosing this one
    pub depth: usize,
}

impl NaturalLoop {
    fn new(header: NodeId) -> Self {
        NaturalLoop {
            header,
            body: BTreeSet::from([header]),
            back_edges: Vec::new(),
            depth: 0,
        }
    }

    /// Returns `true` if `node` belongs to the loop
    #[must_use]
    pub fn contains(&self, node: NodeId) -> bool {
        self.body.contains(&node)
    }

    /// Number of nodes in the loop
    #[must_use]
    pub fn size(&self) -> usize {
        self.body.len()
    }

    /// Lowest and highest node index of the body
    #[must_use]
    pub fn span(&self) -> (usize, usize) {
        let first = self.body.first().map_or(self.header.index(), |n| n.index());
        let last = self.body.last().map_or(self.header.index(), |n| n.index());
        (first, last)
    }

    /// Returns `true` if the body occupies a gap-free index range.
    ///
    /// Control flow graph nodes are numbered in offset order, so this is the question of
    /// whether the loop is laid out contiguously in the method body.
    #[must_use]
    pub fn is_contiguous(&self) -> bool {
        let (first, last) = self.span();
        last - first + 1 == self.body.len()
    }
}

/// Finds the natural loops of `graph`, sorted by header index.
pub fn detect_loops<G>(graph: &G, dominators: &DominatorTree) -> Vec<NaturalLoop>
where
    G: Successors + Predecessors,
{
    let mut loops: Vec<NaturalLoop> = Vec::new();

    for node in graph.node_ids() {
        for succ in graph.successors(node) {
            if !dominators.dominates(succ, node) {
                continue;
            }

            let position = match loops.iter().position(|l| l.header == succ) {
                Some(position) => position,
                None => {
                    loops.push(NaturalLoop::new(succ));
                    loops.len() - 1
                }
            };

            let natural_loop = &mut loops[position];
            if !natural_loop.back_edges.contains(&node) {
                natural_loop.back_edges.push(node);
            }
            expand_loop_body(graph, dominators, natural_loop, node);
        }
    }

    compute_loop_depths(&mut loops);
    loops.sort_by_key(|l| l.header.index());
    loops
}

fn expand_loop_body<G: Predecessors>(
    graph: &G,
    dominators: &DominatorTree,
    natural_loop: &mut NaturalLoop,
    source: NodeId,
) {
    let header = natural_loop.header;
    let mut worklist = vec![source];

    while let Some(node) = worklist.pop() {
        if natural_loop.body.insert(node) {
            for pred in graph.predecessors(node) {
                // Unreachable code may branch into a loop without being part of it
                if !natural_loop.body.contains(&pred) && dominators.dominates(header, pred) {
                    worklist.push(pred);
                }
            }
        }
    }
}

fn compute_loop_depths(loops: &mut [NaturalLoop]) {
    for i in 0..loops.len() {
        let header = loops[i].header;
        let depth = loops
            .iter()
            .enumerate()
            .filter(|(j, other)| *j != i && other.contains(header))
            .count();
        loops[i].depth = depth;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::graph::{algorithms::compute_dominators, DirectedGraph};

    fn graph(nodes: usize, edges: &[(usize, usize)]) -> DirectedGraph<(), ()> {
        let mut graph = DirectedGraph::new();
        for _ in 0..nodes {
            graph.add_node(());
        }
        for &(source, target) in edges {
            graph
                .add_edge(NodeId::new(source), NodeId::new(target), ())
                .unwrap();
        }
        graph
    }

    #[test]
    fn simple_loop() {
        // 0 -> 1 -> 2 -> 1, 1 -> 3
        let g = graph(4, &[(0, 1), (1, 2), (2, 1), (1, 3)]);
        let loops = detect_loops(&g, &compute_dominators(&g, NodeId::new(0)));

        assert_eq!(loops.len(), 1);
        assert_eq!(loops[0].header, NodeId::new(1));
        assert_eq!(loops[0].back_edges, vec![NodeId::new(2)]);
        assert_eq!(loops[0].size(), 2);
        assert!(loops[0].is_contiguous());
        assert!(!loops[0].contains(NodeId::new(3)));
    }

    #[test]
    fn self_loop() {
        let g = graph(2, &[(0, 0), (0, 1)]);
        let loops = detect_loops(&g, &compute_dominators(&g, NodeId::new(0)));

        assert_eq!(loops.len(), 1);
        assert_eq!(loops[0].size(), 1);
        assert_eq!(loops[0].span(), (0, 0));
    }

    #[test]
    fn nested_loops() {
        // outer: 1..=4, inner: 2..=3
        let g = graph(6, &[(0, 1), (1, 2), (2, 3), (3, 2), (3, 4), (4, 1), (1, 5)]);
        let loops = detect_loops(&g, &compute_dominators(&g, NodeId::new(0)));

        assert_eq!(loops.len(), 2);
        assert_eq!(loops[0].header, NodeId::new(1));
        assert_eq!(loops[0].depth, 0);
        assert_eq!(loops[1].header, NodeId::new(2));
        assert_eq!(loops[1].depth, 1);
    }

    #[test]
    fn non_contiguous_body() {
        // Header 1, body node 3 is laid out after exit block 2
        let g = graph(4, &[(0, 1), (1, 3), (3, 1), (1, 2)]);
        let loops = detect_loops(&g, &compute_dominators(&g, NodeId::new(0)));

        assert_eq!(loops.len(), 1);
        assert!(!loops[0].is_contiguous());
    }

    #[test]
    fn irreducible_cycle_has_no_natural_loop() {
        let g = graph(3, &[(0, 1), (0, 2), (1, 2), (2, 1)]);
        let loops = detect_loops(&g, &compute_dominators(&g, NodeId::new(0)));
        assert!(loops.is_empty());
    }
}
