//! Control flow graph edge types.
//!
//! Edges carry their classification so the structure reducer can tell the taken arm of a
//! conditional from its fall-through, and normal flow from exceptional flow.

/// The kind of control transfer an edge represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CfgEdgeKind {
    /// Fall-through or unconditional branch
    Unconditional,
    /// Taken arm of a conditional branch
    ConditionalTrue,
    /// Fall-through arm of a conditional branch
    ConditionalFalse,
    /// A switch case, `None` for the default fall-through
    Switch {
        /// Index in the switch table
        case_value: Option<u32>,
    },
    /// A `leave` out of a protected region or handler
    Leave,
    /// Transfer to a handler or filter entry when an exception is raised
    ExceptionHandler {
        /// Position of the region in the region table
        region: usize,
    },
}

impl CfgEdgeKind {
    /// Returns `true` for the arms of a conditional branch
    #[must_use]
    pub const fn is_conditional(&self) -> bool {
        matches!(self, Self::ConditionalTrue | Self::ConditionalFalse)
    }

    /// Returns `true` for edges into handlers
    #[must_use]
    pub const fn is_exceptional(&self) -> bool {
        matches!(self, Self::ExceptionHandler { .. })
    }

    /// Returns `true` for switch edges
    #[must_use]
    pub const fn is_switch(&self) -> bool {
        matches!(self, Self::Switch { .. })
    }
}

/// An edge of the control flow graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CfgEdge {
    target: usize,
    kind: CfgEdgeKind,
}

impl CfgEdge {
    /// Creates an edge into block `target`
    #[must_use]
    pub const fn new(target: usize, kind: CfgEdgeKind) -> Self {
        Self { target, kind }
    }

    /// Index of the target block
    #[must_use]
    pub const fn target(&self) -> usize {
        self.target
    }

    /// Classification of the edge
    #[must_use]
    pub const fn kind(&self) -> CfgEdgeKind {
        self.kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        assert!(CfgEdgeKind::ConditionalTrue.is_conditional());
        assert!(!CfgEdgeKind::Leave.is_conditional());
        assert!(CfgEdgeKind::ExceptionHandler { region: 0 }.is_exceptional());
        assert!(!CfgEdgeKind::Leave.is_exceptional());
        assert!(CfgEdgeKind::Switch { case_value: None }.is_switch());
    }

    #[test]
    fn accessors() {
        let edge = CfgEdge::new(3, CfgEdgeKind::ConditionalFalse);
        assert_eq!(edge.target(), 3);
        assert_eq!(edge.kind(), CfgEdgeKind::ConditionalFalse);
    }
}
