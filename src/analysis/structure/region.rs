//! The region tree produced by structural reduction.

use std::fmt;

use crate::{analysis::exceptions::ExceptionRegion, utils::graph::NodeId};

/// A span of blocks that could not be reduced to nested regions.
///
/// The span is rendered as flat, labeled instructions; everything around it stays
/// structured. A warning is a diagnostic value, never an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IrreducibleRegionWarning {
    /// Offset of the first instruction of the span
    pub start_offset: u32,
    /// Offset just past the last instruction of the span
    pub end_offset: u32,
    /// What prevented the reduction
    pub reason: String,
}

impl fmt::Display for IrreducibleRegionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "irreducible control flow IL_{:04x} to IL_{:04x}: {}",
            self.start_offset, self.end_offset, self.reason
        )
    }
}

/// One handler of a [`Region::TryHandler`].
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerRegion {
    /// The clause, with its kind and offsets
    pub clause: ExceptionRegion,
    /// The filter expression blocks of a filter clause
    pub filter: Option<Region>,
    /// The handler blocks
    pub body: Region,
}

/// A node of the structured representation of a method body.
///
/// Leaves reference blocks of the [`crate::analysis::ControlFlowGraph`] the tree was built
/// from. Every block appears in exactly one leaf, and a pre-order walk of the tree visits
/// the blocks in ascending offset order.
#[derive(Debug, Clone, PartialEq)]
pub enum Region {
    /// A single basic block
    Block(NodeId),
    /// Regions executed one after another
    Sequence(Vec<Region>),
    /// A natural loop laid out contiguously
    Loop {
        /// The block every iteration starts at
        header: NodeId,
        /// All blocks of the loop, header included
        body: Box<Region>,
    },
    /// A two-way branch whose arms reconverge at a common continuation
    Conditional {
        /// The block ending with the conditional branch
        condition: NodeId,
        /// The fall-through arm
        then_branch: Box<Region>,
        /// The arm starting at the branch target, if the fall-through arm jumps over it
        else_branch: Option<Box<Region>>,
    },
    /// A protected range with its handlers in declaration order
    TryHandler {
        /// The protected blocks
        try_body: Box<Region>,
        /// The handlers of the protected range
        handlers: Vec<HandlerRegion>,
    },
    /// Blocks rendered flat because their control flow has no nested form
    Fallback {
        /// The blocks of the span, in offset order
        blocks: Vec<NodeId>,
        /// Why the span could not be reduced
        warning: IrreducibleRegionWarning,
    },
}

impl Region {
    /// Wraps `children` in a [`Region::Sequence`] unless there is exactly one
    pub(crate) fn sequence(mut children: Vec<Region>) -> Region {
        if children.len() == 1 {
            if let Some(only) = children.pop() {
                return only;
            }
        }
        Region::Sequence(children)
    }

    /// The blocks of all leaves, in pre-order
    #[must_use]
    pub fn blocks(&self) -> Vec<NodeId> {
        let mut blocks = Vec::new();
        self.collect_blocks(&mut blocks);
        blocks
    }

    fn collect_blocks(&self, out: &mut Vec<NodeId>) {
        match self {
            Region::Block(id) => out.push(*id),
            Region::Sequence(children) => children.iter().for_each(|c| c.collect_blocks(out)),
            Region::Loop { body, .. } => body.collect_blocks(out),
            Region::Conditional {
                condition,
                then_branch,
                else_branch,
            } => {
                out.push(*condition);
                then_branch.collect_blocks(out);
                if let Some(else_branch) = else_branch {
                    else_branch.collect_blocks(out);
                }
            }
            Region::TryHandler { try_body, handlers } => {
                try_body.collect_blocks(out);
                for handler in handlers {
                    if let Some(filter) = &handler.filter {
                        filter.collect_blocks(out);
                    }
                    handler.body.collect_blocks(out);
                }
            }
            Region::Fallback { blocks, .. } => out.extend_from_slice(blocks),
        }
    }

    /// Number of nested constructs on the deepest path, leaves and sequences excluded
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            Region::Block(_) | Region::Fallback { .. } => 0,
            Region::Sequence(children) => children.iter().map(Region::depth).max().unwrap_or(0),
            Region::Loop { body, .. } => body.depth() + 1,
            Region::Conditional {
                then_branch,
                else_branch,
                ..
            } => {
                let else_depth = else_branch.as_ref().map_or(0, |e| e.depth());
                then_branch.depth().max(else_depth) + 1
            }
            Region::TryHandler { try_body, handlers } => {
                let handler_depth = handlers
                    .iter()
                    .map(|h| {
                        let filter = h.filter.as_ref().map_or(0, Region::depth);
                        filter.max(h.body.depth())
                    })
                    .max()
                    .unwrap_or(0);
                try_body.depth().max(handler_depth) + 1
            }
        }
    }
}

/// The result of reducing one method body.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionTree {
    /// The root region, a sequence over the whole body
    pub root: Region,
    /// One warning per [`Region::Fallback`], in offset order
    pub warnings: Vec<IrreducibleRegionWarning>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(index: usize) -> NodeId {
        NodeId::new(index)
    }

    #[test]
    fn sequence_collapses_singletons() {
        assert_eq!(Region::sequence(vec![Region::Block(n(1))]), Region::Block(n(1)));
        assert_eq!(Region::sequence(vec![]), Region::Sequence(vec![]));
    }

    #[test]
    fn blocks_in_preorder() {
        let tree = Region::Sequence(vec![
            Region::Conditional {
                condition: n(0),
                then_branch: Box::new(Region::Block(n(1))),
                else_branch: Some(Box::new(Region::Block(n(2)))),
            },
            Region::Loop {
                header: n(3),
                body: Box::new(Region::Sequence(vec![Region::Block(n(3)), Region::Block(n(4))])),
            },
        ]);

        assert_eq!(tree.blocks(), vec![n(0), n(1), n(2), n(3), n(4)]);
        assert_eq!(tree.depth(), 1);
    }

    #[test]
    fn warning_display() {
        let warning = IrreducibleRegionWarning {
            start_offset: 4,
            end_offset: 0x12,
            reason: "loop body is not contiguous".to_string(),
        };
        assert_eq!(
            warning.to_string(),
            "irreducible control flow IL_0004 to IL_0012: loop body is not contiguous"
        );
    }
}
