//! Control flow analysis of CIL method bodies.
//!
//! This module turns decoded instructions and raw exception clauses into the data the
//! structured output mode renders. It builds upon the generic graph infrastructure in
//! [`crate::utils::graph`].
//!
//! # Architecture
//!
//! - [`exceptions`] - Normalized and validated exception regions
//! - [`cfg`] - Control flow graph construction, dominators and loops
//! - [`structure`] - Reduction of the graph into a tree of nested regions
//!
//! # Usage
//!
//! ```rust
//! use ilscope::{
//!     analysis::{reduce, ControlFlowGraph, ExceptionRegionTable, Region},
//!     disassembler::decode_stream,
//!     metadata::resolver::NullResolver,
//! };
//!
//! // ldarg.0; brfalse.s +1; nop; ret
//! let instructions = decode_stream(&[0x02, 0x2C, 0x01, 0x00, 0x2A], &NullResolver)?;
//! let cfg = ControlFlowGraph::build(instructions, ExceptionRegionTable::default())?;
//! let tree = reduce(&cfg);
//!
//! assert!(tree.warnings.is_empty());
//! assert!(matches!(tree.root, Region::Sequence(_)));
//! # Ok::<(), ilscope::Error>(())
//! ```

pub mod cfg;
pub mod exceptions;
pub mod structure;

pub use cfg::{
    BasicBlock, CfgEdge, CfgEdgeKind, ControlFlowGraph, NaturalLoop, NormalFlow,
    PostDominatorTree,
};
pub use exceptions::{ExceptionRegion, ExceptionRegionTable, HandlerKind, RegionGroup};
pub use structure::{reduce, HandlerRegion, IrreducibleRegionWarning, Region, RegionTree};
