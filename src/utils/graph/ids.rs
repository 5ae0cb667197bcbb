//! Strongly-typed node and edge identifiers.
//!
//! Both identifiers wrap a dense `usize` index assigned in insertion order, so analysis
//! results can be stored in plain vectors indexed by [`NodeId::index`].

use std::fmt;

macro_rules! graph_id {
    ($(#[$meta:meta])* $name:ident, $debug:literal, $short:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub(crate) usize);

        impl $name {
            /// Wraps a raw index
            #[must_use]
            #[inline]
            pub const fn new(index: usize) -> Self {
                $name(index)
            }

            /// The raw index
            #[must_use]
            #[inline]
            pub const fn index(self) -> usize {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($debug, "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($short, "{}"), self.0)
            }
        }

        impl From<usize> for $name {
            #[inline]
            fn from(index: usize) -> Self {
                $name(index)
            }
        }

        impl From<$name> for usize {
            #[inline]
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

graph_id!(
    /// Identifies a node of a [`crate::utils::graph::DirectedGraph`].
    ///
    /// In a control flow graph the node index equals the basic block index, and blocks are
    /// numbered in ascending offset order.
    NodeId,
    "NodeId",
    "n"
);

graph_id!(
    /// Identifies an edge of a [`crate::utils::graph::DirectedGraph`].
    EdgeId,
    "EdgeId",
    "e"
);
