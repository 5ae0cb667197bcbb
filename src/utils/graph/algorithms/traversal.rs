//! Depth-first traversal orders.
//!
//! - [`postorder`] - Nodes after all of their DFS descendants
//! - [`reverse_postorder`] - The reverse, the iteration order for dominator computation
//! - [`reachable`] - Reachability bitmap from a start node

use crate::utils::graph::{NodeId, Successors};

/// Computes the postorder of the nodes reachable from `start`.
///
/// Successors are explored in adjacency order, so for a control flow graph the fall-through
/// successor of a conditional block is visited after its branch target. Out of range start
/// nodes produce an empty order.
///
/// # Examples
///
/// ```rust
/// use ilscope::utils::graph::{algorithms::postorder, DirectedGraph};
///
/// let mut graph: DirectedGraph<&str, ()> = DirectedGraph::new();
/// let a = graph.add_node("A");
/// let b = graph.add_node("B");
/// let c = graph.add_node("C");
/// graph.add_edge(a, b, ())?;
/// graph.add_edge(b, c, ())?;
///
/// assert_eq!(postorder(&graph, a), vec![c, b, a]);
/// # Ok::<(), ilscope::Error>(())
/// ```
#[allow(clippy::items_after_statements)]
pub fn postorder<G: Successors>(graph: &G, start: NodeId) -> Vec<NodeId> {
    let node_count = graph.node_count();
    if start.index() >= node_count {
        return Vec::new();
    }

    #[derive(Clone, Copy)]
    enum State {
        Enter,
        Exit,
    }

    let mut visited = vec![false; node_count];
    let mut result = Vec::with_capacity(node_count);
    let mut stack = vec![(start, State::Enter)];

    while let Some((node, state)) = stack.pop() {
        match state {
            State::Enter => {
                if visited[node.index()] {
                    continue;
                }
                visited[node.index()] = true;
                stack.push((node, State::Exit));

                let successors: Vec<NodeId> = graph.successors(node).collect();
                for &succ in successors.iter().rev() {
                    if !visited[succ.index()] {
                        stack.push((succ, State::Enter));
                    }
                }
            }
            State::Exit => result.push(node),
        }
    }

    result
}

/// Computes the reverse postorder of the nodes reachable from `start`.
pub fn reverse_postorder<G: Successors>(graph: &G, start: NodeId) -> Vec<NodeId> {
    let mut result = postorder(graph, start);
    result.reverse();
    result
}

/// Marks every node reachable from `start`, indexed by node index.
pub fn reachable<G: Successors>(graph: &G, start: NodeId) -> Vec<bool> {
    let mut visited = vec![false; graph.node_count()];
    if start.index() >= visited.len() {
        return visited;
    }

    let mut stack = vec![start];
    visited[start.index()] = true;
    while let Some(node) = stack.pop() {
        for succ in graph.successors(node) {
            if !visited[succ.index()] {
                visited[succ.index()] = true;
                stack.push(succ);
            }
        }
    }

    visited
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::graph::DirectedGraph;

    fn diamond() -> DirectedGraph<(), ()> {
        let mut graph = DirectedGraph::new();
        let nodes: Vec<NodeId> = (0..4).map(|_| graph.add_node(())).collect();
        graph.add_edge(nodes[0], nodes[1], ()).unwrap();
        graph.add_edge(nodes[0], nodes[2], ()).unwrap();
        graph.add_edge(nodes[1], nodes[3], ()).unwrap();
        graph.add_edge(nodes[2], nodes[3], ()).unwrap();
        graph
    }

    #[test]
    fn postorder_diamond() {
        let order = postorder(&diamond(), NodeId::new(0));
        assert_eq!(
            order,
            vec![NodeId::new(3), NodeId::new(1), NodeId::new(2), NodeId::new(0)]
        );
    }

    #[test]
    fn reverse_postorder_starts_at_entry() {
        let order = reverse_postorder(&diamond(), NodeId::new(0));
        assert_eq!(order[0], NodeId::new(0));
        assert_eq!(order[3], NodeId::new(3));
    }

    #[test]
    fn cycles_terminate() {
        let mut graph: DirectedGraph<(), ()> = DirectedGraph::new();
        let a = graph.add_node(());
        let b = graph.add_node(());
        graph.add_edge(a, b, ()).unwrap();
        graph.add_edge(b, a, ()).unwrap();

        assert_eq!(postorder(&graph, a), vec![b, a]);
    }

    #[test]
    fn reachability() {
        let mut graph = diamond();
        let island = graph.add_node(());

        let seen = reachable(&graph, NodeId::new(0));
        assert!(seen[3]);
        assert!(!seen[island.index()]);
        assert!(postorder(&graph, NodeId::new(10)).is_empty());
    }
}
