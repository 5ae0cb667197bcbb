//! Generic directed graph infrastructure.
//!
//! The control flow graph of a method body is a [`DirectedGraph`] of basic blocks; the
//! algorithms in [`algorithms`] operate on the traits in this module so they can also run on
//! derived graphs such as the reversed graph used for post-dominance.

mod directed;
mod ids;
mod traits;

pub mod algorithms;

pub use directed::DirectedGraph;
pub use ids::{EdgeId, NodeId};
pub use traits::{GraphBase, Predecessors, RootedGraph, Successors};
