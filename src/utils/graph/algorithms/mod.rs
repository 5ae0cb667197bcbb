//! Graph algorithms used by control flow analysis.
//!
//! ## Traversal
//!
//! - [`postorder`] / [`reverse_postorder`] - DFS orders
//! - [`reachable`] - Reachability from a start node
//!
//! ## Dominator Analysis
//!
//! - [`compute_dominators`] - Dominator tree of a rooted graph
//! - [`DominatorTree`] - Result of dominator computation
//!
//! | Algorithm | Time Complexity | Use Case |
//! |-----------|-----------------|----------|
//! | Postorder | O(V + E) | Iteration order, reachability |
//! | Dominators | O(V + E) per pass, few passes in practice | Loop detection, conditional joins |

mod dominators;
mod traversal;

pub use dominators::{compute_dominators, compute_dominators_rooted, DominatorIterator, DominatorTree};
pub use traversal::{postorder, reachable, reverse_postorder};
