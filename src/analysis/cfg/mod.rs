//! Control Flow Graph (CFG) construction and analysis.
//!
//! This module partitions a decoded method body into basic blocks and connects them with
//! typed edges. It builds on the generic [`crate::utils::graph::DirectedGraph`]
//! infrastructure and reuses the shared dominator and traversal algorithms.
//!
//! # Key Components
//!
//! - [`ControlFlowGraph`] - The main CFG structure owning the basic blocks
//! - [`BasicBlock`] - A maximal single-entry run of instructions
//! - [`CfgEdge`] - Edge representation with control flow semantics
//! - [`CfgEdgeKind`] - Classification of edge types (unconditional, conditional, etc.)
//! - [`NaturalLoop`] - A loop found through dominance back edges
//! - [`PostDominatorTree`] - Post-dominance over normal edges
//!
//! # Edge Types
//!
//! - **Unconditional**: Direct jumps or fall-through to a single successor
//! - **Conditional True/False**: The taken target and the fall-through of a conditional branch
//! - **Switch**: Multi-way branches with case values, the default carries no value
//! - **Leave**: Exits from a protected region or handler
//! - **ExceptionHandler**: Edges from protected blocks to handler and filter entries
//!
//! # Lazy Computation
//!
//! Dominator trees, post-dominator trees and loop information are computed lazily on
//! first access and cached using [`std::sync::OnceLock`].
//!
//! # Examples
//!
//! ```rust
//! use ilscope::{
//!     analysis::{ControlFlowGraph, ExceptionRegionTable},
//!     disassembler::decode_stream,
//!     metadata::resolver::NullResolver,
//! };
//!
//! // 0: nop; 1: br.s -3
//! let instructions = decode_stream(&[0x00, 0x2B, 0xFD], &NullResolver)?;
//! let cfg = ControlFlowGraph::build(instructions, ExceptionRegionTable::default())?;
//!
//! assert_eq!(cfg.loops().len(), 1);
//! assert!(cfg.dominators().dominates(cfg.entry(), cfg.entry()));
//! # Ok::<(), ilscope::Error>(())
//! ```
//!
//! # Thread Safety
//!
//! [`ControlFlowGraph`] is [`Send`] and [`Sync`], enabling concurrent read access after
//! construction.

mod block;
mod edge;
mod graph;
mod loops;

pub use block::BasicBlock;
pub use edge::{CfgEdge, CfgEdgeKind};
pub use graph::{ControlFlowGraph, NormalFlow, PostDominatorTree};
pub use loops::{detect_loops, NaturalLoop};
