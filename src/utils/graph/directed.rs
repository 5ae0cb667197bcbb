//! Adjacency-list directed graph.
//!
//! [`DirectedGraph`] stores node and edge payloads in dense vectors and keeps per-node
//! lists of outgoing and incoming edge ids, which makes both successor and predecessor
//! queries proportional to the node's degree.

use crate::{
    utils::graph::{
        ids::{EdgeId, NodeId},
        traits::{GraphBase, Predecessors, Successors},
    },
    Error, Result,
};

#[derive(Debug, Clone)]
struct EdgeData<E> {
    source: NodeId,
    target: NodeId,
    data: E,
}

/// A directed graph with typed node and edge data.
///
/// Parallel edges are allowed; the control flow graph relies on that when a conditional
/// branch targets its own fall-through block. Edges keep their insertion order in the
/// adjacency lists.
///
/// # Examples
///
/// ```rust
/// use ilscope::utils::graph::DirectedGraph;
///
/// let mut graph: DirectedGraph<&str, ()> = DirectedGraph::new();
/// let a = graph.add_node("A");
/// let b = graph.add_node("B");
/// graph.add_edge(a, b, ())?;
///
/// assert_eq!(graph.successors(a).collect::<Vec<_>>(), vec![b]);
/// assert_eq!(graph.in_degree(b), 1);
/// # Ok::<(), ilscope::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct DirectedGraph<N, E> {
    nodes: Vec<N>,
    edges: Vec<EdgeData<E>>,
    outgoing: Vec<Vec<EdgeId>>,
    incoming: Vec<Vec<EdgeId>>,
}

impl<N, E> Default for DirectedGraph<N, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N, E> DirectedGraph<N, E> {
    /// Creates an empty graph
    #[must_use]
    pub fn new() -> Self {
        DirectedGraph {
            nodes: Vec::new(),
            edges: Vec::new(),
            outgoing: Vec::new(),
            incoming: Vec::new(),
        }
    }

    /// Creates an empty graph with preallocated storage
    #[must_use]
    pub fn with_capacity(node_capacity: usize, edge_capacity: usize) -> Self {
        DirectedGraph {
            nodes: Vec::with_capacity(node_capacity),
            edges: Vec::with_capacity(edge_capacity),
            outgoing: Vec::with_capacity(node_capacity),
            incoming: Vec::with_capacity(node_capacity),
        }
    }

    /// Adds a node and returns its id
    pub fn add_node(&mut self, data: N) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(data);
        self.outgoing.push(Vec::new());
        self.incoming.push(Vec::new());
        id
    }

    /// Adds an edge from `source` to `target`
    ///
    /// # Errors
    /// Returns [`crate::Error::GraphError`] if either endpoint does not exist.
    pub fn add_edge(&mut self, source: NodeId, target: NodeId, data: E) -> Result<EdgeId> {
        for (role, node) in [("source", source), ("target", target)] {
            if node.index() >= self.nodes.len() {
                return Err(Error::GraphError(format!(
                    "{} node {} does not exist in graph with {} nodes",
                    role,
                    node,
                    self.nodes.len()
                )));
            }
        }

        let id = EdgeId::new(self.edges.len());
        self.edges.push(EdgeData {
            source,
            target,
            data,
        });
        self.outgoing[source.index()].push(id);
        self.incoming[target.index()].push(id);

        Ok(id)
    }

    /// The payload of `node`
    #[must_use]
    pub fn node(&self, node: NodeId) -> Option<&N> {
        self.nodes.get(node.index())
    }

    /// Number of nodes
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the graph has no nodes
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All node ids in index order
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId::new)
    }

    /// All nodes with their payloads, in index order
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &N)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, data)| (NodeId::new(i), data))
    }

    /// The payload of `edge`
    #[must_use]
    pub fn edge(&self, edge: EdgeId) -> Option<&E> {
        self.edges.get(edge.index()).map(|e| &e.data)
    }

    /// The `(source, target)` pair of `edge`
    #[must_use]
    pub fn edge_endpoints(&self, edge: EdgeId) -> Option<(NodeId, NodeId)> {
        self.edges.get(edge.index()).map(|e| (e.source, e.target))
    }

    /// Number of edges
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// All edges with their payloads, in insertion order
    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &E)> + '_ {
        self.edges
            .iter()
            .enumerate()
            .map(|(i, e)| (EdgeId::new(i), &e.data))
    }

    /// Targets of the outgoing edges of `node`
    pub fn successors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.outgoing[node.index()]
            .iter()
            .map(|&edge_id| self.edges[edge_id.index()].target)
    }

    /// Sources of the incoming edges of `node`
    pub fn predecessors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.incoming[node.index()]
            .iter()
            .map(|&edge_id| self.edges[edge_id.index()].source)
    }

    /// Outgoing edges of `node` with their target and payload
    pub fn outgoing_edges(&self, node: NodeId) -> impl Iterator<Item = (NodeId, &E)> + '_ {
        self.outgoing[node.index()].iter().map(|&edge_id| {
            let edge = &self.edges[edge_id.index()];
            (edge.target, &edge.data)
        })
    }

    /// Incoming edges of `node` with their source and payload
    pub fn incoming_edges(&self, node: NodeId) -> impl Iterator<Item = (NodeId, &E)> + '_ {
        self.incoming[node.index()].iter().map(|&edge_id| {
            let edge = &self.edges[edge_id.index()];
            (edge.source, &edge.data)
        })
    }

    /// Number of outgoing edges of `node`
    #[must_use]
    pub fn out_degree(&self, node: NodeId) -> usize {
        self.outgoing[node.index()].len()
    }

    /// Number of incoming edges of `node`
    #[must_use]
    pub fn in_degree(&self, node: NodeId) -> usize {
        self.incoming[node.index()].len()
    }

    /// Builds a graph with the same nodes and every edge reversed, mapping payloads with `map`
    #[must_use]
    pub fn reversed<F, E2>(&self, mut map: F) -> DirectedGraph<(), E2>
    where
        F: FnMut(&E) -> Option<E2>,
    {
        let mut reversed = DirectedGraph::with_capacity(self.nodes.len() + 1, self.edges.len());
        for _ in 0..self.nodes.len() {
            reversed.add_node(());
        }

        for edge in &self.edges {
            if let Some(data) = map(&edge.data) {
                reversed.edges.push(EdgeData {
                    source: edge.target,
                    target: edge.source,
                    data,
                });
                let id = EdgeId::new(reversed.edges.len() - 1);
                reversed.outgoing[edge.target.index()].push(id);
                reversed.incoming[edge.source.index()].push(id);
            }
        }

        reversed
    }
}

impl<N, E> GraphBase for DirectedGraph<N, E> {
    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(NodeId::new)
    }
}

impl<N, E> Successors for DirectedGraph<N, E> {
    fn successors(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
        DirectedGraph::successors(self, node)
    }
}

impl<N, E> Predecessors for DirectedGraph<N, E> {
    fn predecessors(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
        DirectedGraph::predecessors(self, node)
    }
}
