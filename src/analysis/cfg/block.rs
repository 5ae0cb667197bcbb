//! Basic blocks of a method body.

use crate::disassembler::{FlowType, Instruction};

/// A maximal run of instructions with a single entry at its first instruction.
///
/// Blocks are numbered in ascending offset order, so `id` doubles as the position of the
/// block in the method's layout. A block is never modified once the
/// [`crate::analysis::ControlFlowGraph`] that owns it has been built.
#[derive(Debug, Clone, PartialEq)]
pub struct BasicBlock {
    /// Position of the block in offset order
    pub id: usize,
    /// Offset of the first instruction
    pub offset: u32,
    /// Encoded size of all instructions in bytes
    pub size: u32,
    /// The instructions, in offset order
    pub instructions: Vec<Instruction>,
    /// Normal successors: taken target first for conditionals, switch cases in table
    /// order followed by the default
    pub successors: Vec<usize>,
    /// Blocks with a normal or exceptional edge into this block
    pub predecessors: Vec<usize>,
    /// Positions in the region table of the try ranges containing this block, outermost first
    pub exceptions: Vec<usize>,
    /// Handler and filter entry blocks reachable through an exception raised in this block
    pub handler_successors: Vec<usize>,
}

impl BasicBlock {
    pub(crate) fn new(id: usize, instructions: Vec<Instruction>) -> Self {
        let offset = instructions.first().map_or(0, |i| i.offset);
        let size = instructions.iter().map(|i| i.size).sum();

        BasicBlock {
            id,
            offset,
            size,
            instructions,
            successors: Vec::new(),
            predecessors: Vec::new(),
            exceptions: Vec::new(),
            handler_successors: Vec::new(),
        }
    }

    /// Offset just past the last instruction
    #[must_use]
    pub fn end_offset(&self) -> u32 {
        self.offset + self.size
    }

    /// The instruction that decides where control goes next
    #[must_use]
    pub fn terminator(&self) -> Option<&Instruction> {
        self.instructions.last()
    }

    /// Flow type of the terminator, [`FlowType::Sequential`] for an empty block
    #[must_use]
    pub fn flow_type(&self) -> FlowType {
        self.terminator()
            .map_or(FlowType::Sequential, |instruction| instruction.flow_type)
    }

    /// Returns `true` if `offset` falls inside this block
    #[must_use]
    pub fn contains(&self, offset: u32) -> bool {
        (self.offset..self.end_offset()).contains(&offset)
    }

    /// Returns `true` if control leaves the method (or the handler) from this block
    #[must_use]
    pub fn is_exit(&self) -> bool {
        self.successors.is_empty()
    }
}
