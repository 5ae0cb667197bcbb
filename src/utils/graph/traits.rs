//! Trait definitions for graph abstractions.
//!
//! The graph algorithms are written against these traits rather than a concrete graph type,
//! so they run on the control flow graph as well as on the reversed graph used for
//! post-dominance.
//!
//! - [`GraphBase`] - Node count and node iteration
//! - [`Successors`] - Forward edge traversal
//! - [`Predecessors`] - Backward edge traversal
//! - [`RootedGraph`] - Graphs with a designated entry node

use crate::utils::graph::NodeId;

/// Core properties every graph provides.
pub trait GraphBase {
    /// Total number of nodes
    fn node_count(&self) -> usize;

    /// All node identifiers in index order
    fn node_ids(&self) -> impl Iterator<Item = NodeId>;
}

/// Forward adjacency.
pub trait Successors: GraphBase {
    /// Targets of the outgoing edges of `node`, in edge insertion order
    fn successors(&self, node: NodeId) -> impl Iterator<Item = NodeId>;
}

/// Backward adjacency.
pub trait Predecessors: GraphBase {
    /// Sources of the incoming edges of `node`, in edge insertion order
    fn predecessors(&self, node: NodeId) -> impl Iterator<Item = NodeId>;
}

/// A graph with a single designated entry node.
pub trait RootedGraph: Successors + Predecessors {
    /// The entry node
    fn entry(&self) -> NodeId;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EdgeList {
        nodes: usize,
        edges: Vec<(usize, usize)>,
    }

    impl GraphBase for EdgeList {
        fn node_count(&self) -> usize {
            self.nodes
        }

        fn node_ids(&self) -> impl Iterator<Item = NodeId> {
            (0..self.nodes).map(NodeId::new)
        }
    }

    impl Successors for EdgeList {
        fn successors(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
            self.edges
                .iter()
                .filter(move |(src, _)| *src == node.index())
                .map(|(_, dst)| NodeId::new(*dst))
        }
    }

    impl Predecessors for EdgeList {
        fn predecessors(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
            self.edges
                .iter()
                .filter(move |(_, dst)| *dst == node.index())
                .map(|(src, _)| NodeId::new(*src))
        }
    }

    impl RootedGraph for EdgeList {
        fn entry(&self) -> NodeId {
            NodeId::new(0)
        }
    }

    #[test]
    fn adjacency_through_traits() {
        let graph = EdgeList {
            nodes: 3,
            edges: vec![(0, 1), (0, 2), (1, 2)],
        };

        assert_eq!(graph.node_ids().count(), 3);
        assert_eq!(graph.successors(graph.entry()).count(), 2);

        let preds: Vec<NodeId> = graph.predecessors(NodeId::new(2)).collect();
        assert_eq!(preds, vec![NodeId::new(0), NodeId::new(1)]);
    }
}
