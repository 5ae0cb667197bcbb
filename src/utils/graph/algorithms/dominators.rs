//! Dominator tree computation.
//!
//! A node `d` **dominates** `n` if every path from the entry to `n` passes through `d`. The
//! immediate dominator of `n` is its closest strict dominator; linking every node to its
//! immediate dominator yields the dominator tree.
//!
//! The tree is computed with the iterative algorithm of Cooper, Harvey and Kennedy
//! ("A Simple, Fast Dominance Algorithm"): immediate dominators are refined in reverse
//! postorder until a fixed point is reached. Method bodies are small, and the iterative
//! formulation handles unreachable nodes without sentinels: they simply have no dominator.
//!
//! Post-dominators are the dominators of the reversed graph rooted at a virtual exit; see
//! [`crate::analysis::ControlFlowGraph::post_dominators`].

use crate::utils::graph::{
    algorithms::traversal::reverse_postorder, NodeId, Predecessors, RootedGraph, Successors,
};

/// Result of dominator tree computation.
///
/// # Examples
///
/// ```rust
/// use ilscope::utils::graph::{algorithms::compute_dominators, DirectedGraph};
///
/// // entry -> a, entry -> b, a -> exit, b -> exit
/// let mut graph: DirectedGraph<&str, ()> = DirectedGraph::new();
/// let entry = graph.add_node("entry");
/// let a = graph.add_node("a");
/// let b = graph.add_node("b");
/// let exit = graph.add_node("exit");
/// graph.add_edge(entry, a, ())?;
/// graph.add_edge(entry, b, ())?;
/// graph.add_edge(a, exit, ())?;
/// graph.add_edge(b, exit, ())?;
///
/// let dom_tree = compute_dominators(&graph, entry);
/// assert_eq!(dom_tree.immediate_dominator(exit), Some(entry));
/// assert!(!dom_tree.strictly_dominates(a, exit));
/// # Ok::<(), ilscope::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct DominatorTree {
    entry: NodeId,
    /// `None` for the entry and for unreachable nodes
    idom: Vec<Option<NodeId>>,
}

impl DominatorTree {
    /// The root of the tree
    #[inline]
    #[must_use]
    pub fn entry(&self) -> NodeId {
        self.entry
    }

    /// Number of nodes covered by the tree, reachable or not
    #[inline]
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.idom.len()
    }

    /// Returns `true` if `node` is reachable from the entry
    #[must_use]
    pub fn is_reachable(&self, node: NodeId) -> bool {
        node == self.entry || self.idom.get(node.index()).copied().flatten().is_some()
    }

    /// The immediate dominator of `node`, `None` for the entry and unreachable nodes
    #[must_use]
    pub fn immediate_dominator(&self, node: NodeId) -> Option<NodeId> {
        if node == self.entry {
            return None;
        }

        self.idom.get(node.index()).copied().flatten()
    }

    /// Checks if `a` dominates `b`. Every reachable node dominates itself; nothing dominates
    /// an unreachable node.
    #[must_use]
    pub fn dominates(&self, a: NodeId, b: NodeId) -> bool {
        if !self.is_reachable(b) {
            return false;
        }

        self.dominators(b).any(|dominator| dominator == a)
    }

    /// Checks if `a` dominates `b` and `a != b`
    #[inline]
    #[must_use]
    pub fn strictly_dominates(&self, a: NodeId, b: NodeId) -> bool {
        a != b && self.dominates(a, b)
    }

    /// Iterates the dominators of `node`, from the node itself up to the entry
    #[must_use]
    pub fn dominators(&self, node: NodeId) -> DominatorIterator<'_> {
        DominatorIterator {
            tree: self,
            current: self.is_reachable(node).then_some(node),
        }
    }

    /// Depth of `node` in the tree, the entry (and any unreachable node) has depth 0
    #[must_use]
    pub fn depth(&self, node: NodeId) -> usize {
        self.dominators(node).count().saturating_sub(1)
    }

    /// Nodes whose immediate dominator is `node`, in index order
    #[must_use]
    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.idom
            .iter()
            .enumerate()
            .filter(|(i, idom)| **idom == Some(node) && NodeId::new(*i) != self.entry)
            .map(|(i, _)| NodeId::new(i))
            .collect()
    }
}

/// Iterator over the dominators of a node, from the node up to the entry.
pub struct DominatorIterator<'a> {
    tree: &'a DominatorTree,
    current: Option<NodeId>,
}

impl Iterator for DominatorIterator<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.current?;
        self.current = self.tree.immediate_dominator(current);
        Some(current)
    }
}

/// Computes the dominator tree of `graph` rooted at `entry`.
///
/// Nodes that cannot be reached from `entry` are part of the tree but have no immediate
/// dominator and are dominated by nothing.
pub fn compute_dominators<G>(graph: &G, entry: NodeId) -> DominatorTree
where
    G: Successors,
{
    let node_count = graph.node_count();
    let mut idom: Vec<Option<NodeId>> = vec![None; node_count];
    if entry.index() >= node_count {
        return DominatorTree { entry, idom };
    }

    let rpo = reverse_postorder(graph, entry);
    let mut order = vec![usize::MAX; node_count];
    for (position, node) in rpo.iter().enumerate() {
        order[node.index()] = position;
    }

    // Predecessors restricted to reachable nodes
    let mut predecessors: Vec<Vec<NodeId>> = vec![Vec::new(); node_count];
    for &node in &rpo {
        for succ in graph.successors(node) {
            predecessors[succ.index()].push(node);
        }
    }

    idom[entry.index()] = Some(entry);
    let mut changed = true;
    while changed {
        changed = false;
        for &node in rpo.iter().skip(1) {
            let mut new_idom: Option<NodeId> = None;
            for &pred in &predecessors[node.index()] {
                if idom[pred.index()].is_none() {
                    continue;
                }

                new_idom = Some(match new_idom {
                    None => pred,
                    Some(current) => intersect(&idom, &order, pred, current),
                });
            }

            if new_idom.is_some() && idom[node.index()] != new_idom {
                idom[node.index()] = new_idom;
                changed = true;
            }
        }
    }

    idom[entry.index()] = None;
    DominatorTree { entry, idom }
}

/// Computes the dominator tree of a [`RootedGraph`] from its entry.
pub fn compute_dominators_rooted<G>(graph: &G) -> DominatorTree
where
    G: RootedGraph + Predecessors,
{
    compute_dominators(graph, graph.entry())
}

/// Walks two fingers up the partially built tree until they meet.
fn intersect(idom: &[Option<NodeId>], order: &[usize], mut a: NodeId, mut b: NodeId) -> NodeId {
    while a != b {
        while order[a.index()] > order[b.index()] {
            match idom[a.index()] {
                Some(next) => a = next,
                None => return b,
            }
        }
        while order[b.index()] > order[a.index()] {
            match idom[b.index()] {
                Some(next) => b = next,
                None => return a,
            }
        }
    }

    a
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::graph::DirectedGraph;

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

    fn n(index: usize) -> NodeId {
        NodeId::new(index)
    }

    #[test]
    fn linear_chain() {
        let g = graph(3, &[(0, 1), (1, 2)]);
        let tree = compute_dominators(&g, n(0));

        assert_eq!(tree.immediate_dominator(n(0)), None);
        assert_eq!(tree.immediate_dominator(n(2)), Some(n(1)));
        assert_eq!(tree.dominators(n(2)).collect::<Vec<_>>(), vec![n(2), n(1), n(0)]);
        assert_eq!(tree.depth(n(2)), 2);
    }

    #[test]
    fn diamond_join() {
        let g = graph(4, &[(0, 1), (0, 2), (1, 3), (2, 3)]);
        let tree = compute_dominators(&g, n(0));

        assert_eq!(tree.immediate_dominator(n(3)), Some(n(0)));
        assert!(!tree.dominates(n(1), n(3)));
        assert_eq!(tree.children(n(0)), vec![n(1), n(2), n(3)]);
    }

    #[test]
    fn loop_header_dominates_body() {
        // 0 -> 1 -> 2 -> 1, 1 -> 3
        let g = graph(4, &[(0, 1), (1, 2), (2, 1), (1, 3)]);
        let tree = compute_dominators(&g, n(0));

        assert!(tree.dominates(n(1), n(2)));
        assert!(tree.strictly_dominates(n(1), n(3)));
        assert!(!tree.strictly_dominates(n(2), n(1)));
    }

    #[test]
    fn irreducible_entries() {
        // 0 -> 1, 0 -> 2, 1 <-> 2: neither loop node dominates the other
        let g = graph(3, &[(0, 1), (0, 2), (1, 2), (2, 1)]);
        let tree = compute_dominators(&g, n(0));

        assert_eq!(tree.immediate_dominator(n(1)), Some(n(0)));
        assert_eq!(tree.immediate_dominator(n(2)), Some(n(0)));
    }

    #[test]
    fn unreachable_nodes() {
        let g = graph(3, &[(0, 1), (2, 1)]);
        let tree = compute_dominators(&g, n(0));

        assert!(!tree.is_reachable(n(2)));
        assert_eq!(tree.immediate_dominator(n(2)), None);
        assert!(!tree.dominates(n(0), n(2)));
        assert_eq!(tree.immediate_dominator(n(1)), Some(n(0)));
        assert_eq!(tree.depth(n(2)), 0);
    }

    #[test]
    fn empty_graph() {
        let g = graph(0, &[]);
        let tree = compute_dominators(&g, n(0));
        assert_eq!(tree.node_count(), 0);
        assert!(!tree.dominates(n(0), n(0)) || tree.is_reachable(n(0)));
    }
}
