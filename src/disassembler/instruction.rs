//! Decoded CIL instructions and their operands.

use std::fmt;

use crate::metadata::{
    resolver::{FieldRef, MethodRef, TypeRef},
    token::Token,
};

/// The encoded operand layout of an opcode, as listed in the opcode tables.
///
/// Token operands are split by the kind of reference the opcode requires, so that the
/// decoder can ask the resolver for exactly that kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandType {
    /// No operand
    None,
    /// Signed 8-bit immediate (`ldc.i4.s`)
    Int8,
    /// Unsigned 8-bit immediate (`unaligned.`, `no.`)
    UInt8,
    /// Signed 32-bit immediate
    Int32,
    /// Signed 64-bit immediate
    Int64,
    /// 32-bit float
    Float32,
    /// 64-bit float
    Float64,
    /// Signed 8-bit branch displacement
    ShortBranch,
    /// Signed 32-bit branch displacement
    Branch,
    /// `u32` count followed by that many `i32` displacements
    Switch,
    /// Unsigned 8-bit local index
    ShortLocal,
    /// Unsigned 16-bit local index
    Local,
    /// Unsigned 8-bit argument index
    ShortArgument,
    /// Unsigned 16-bit argument index
    Argument,
    /// Type token
    Type,
    /// Method token
    Method,
    /// Field token
    Field,
    /// User string token
    String,
    /// Type, method or field token (`ldtoken`)
    Token,
    /// Standalone signature token (`calli`)
    Signature,
}

impl OperandType {
    /// Fixed encoded size of this operand in bytes, `None` for variable-sized switch tables
    #[must_use]
    pub fn size(&self) -> Option<usize> {
        match self {
            OperandType::None => Some(0),
            OperandType::Int8
            | OperandType::UInt8
            | OperandType::ShortBranch
            | OperandType::ShortLocal
            | OperandType::ShortArgument => Some(1),
            OperandType::Local | OperandType::Argument => Some(2),
            OperandType::Int32
            | OperandType::Float32
            | OperandType::Branch
            | OperandType::Type
            | OperandType::Method
            | OperandType::Field
            | OperandType::String
            | OperandType::Token
            | OperandType::Signature => Some(4),
            OperandType::Int64 | OperandType::Float64 => Some(8),
            OperandType::Switch => None,
        }
    }
}

/// How control leaves an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowType {
    /// Falls through to the next instruction
    Sequential,
    /// Branches to its target or falls through
    ConditionalBranch,
    /// Always branches to its target
    UnconditionalBranch,
    /// Calls another method and falls through
    Call,
    /// Leaves the method (`ret`, `jmp`)
    Return,
    /// Branches to one of a table of targets or falls through
    Switch,
    /// Raises an exception (`throw`, `rethrow`)
    Throw,
    /// Ends a finally or fault handler
    EndFinally,
    /// Ends a filter block
    EndFilter,
    /// Leaves a protected region to its target
    Leave,
}

impl FlowType {
    /// Returns `true` if control can continue with the next instruction
    #[must_use]
    pub fn falls_through(&self) -> bool {
        matches!(
            self,
            FlowType::Sequential | FlowType::ConditionalBranch | FlowType::Call | FlowType::Switch
        )
    }

    /// Returns `true` if this instruction ends a basic block
    #[must_use]
    pub fn ends_block(&self) -> bool {
        !matches!(self, FlowType::Sequential | FlowType::Call)
    }
}

/// A decoded operand.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// No operand
    None,
    /// 8-bit signed immediate
    Int8(i8),
    /// 8-bit unsigned immediate
    UInt8(u8),
    /// 32-bit signed immediate
    Int32(i32),
    /// 64-bit signed immediate
    Int64(i64),
    /// 32-bit float
    Float32(f32),
    /// 64-bit float
    Float64(f64),
    /// A user string literal, together with its token
    String(Token, String),
    /// A resolved type
    Type(TypeRef),
    /// A resolved method
    Method(MethodRef),
    /// A resolved field
    Field(FieldRef),
    /// An unresolved standalone signature
    Signature(Token),
    /// Absolute branch target offset
    Target(i64),
    /// Absolute switch target offsets
    Switch(Vec<i64>),
    /// Local variable index
    Local(u16),
    /// Argument index
    Argument(u16),
}

impl Operand {
    /// The metadata token this operand was decoded from, if any
    #[must_use]
    pub fn token(&self) -> Option<Token> {
        match self {
            Operand::String(token, _) | Operand::Signature(token) => Some(*token),
            Operand::Type(type_ref) => Some(type_ref.token),
            Operand::Method(method_ref) => Some(method_ref.token),
            Operand::Field(field_ref) => Some(field_ref.token),
            _ => None,
        }
    }
}

/// A single decoded instruction.
#[derive(Clone, PartialEq)]
pub struct Instruction {
    /// Offset from the start of the method's code
    pub offset: u32,
    /// Encoded size, including prefix and operand
    pub size: u32,
    /// The opcode byte
    pub opcode: u8,
    /// `0xFE` for two-byte opcodes, `0` otherwise
    pub prefix: u8,
    /// The ilasm mnemonic
    pub mnemonic: &'static str,
    /// How control leaves this instruction
    pub flow_type: FlowType,
    /// The decoded operand
    pub operand: Operand,
    /// Absolute branch targets, in encoding order
    pub branch_targets: Vec<i64>,
}

impl Instruction {
    /// Offset of the instruction that follows this one
    #[must_use]
    pub fn next_offset(&self) -> u32 {
        self.offset + self.size
    }

    /// Returns `true` for conditional, unconditional, switch and leave instructions
    #[must_use]
    pub fn is_branch(&self) -> bool {
        matches!(
            self.flow_type,
            FlowType::ConditionalBranch
                | FlowType::UnconditionalBranch
                | FlowType::Switch
                | FlowType::Leave
        )
    }

    /// Returns `true` if control never falls through to the next instruction
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !self.flow_type.falls_through()
    }

    /// Returns `true` for the prefix opcodes (`volatile.`, `tail.`, `constrained.`, ...)
    #[must_use]
    pub fn is_prefix(&self) -> bool {
        self.prefix == 0xFE && matches!(self.opcode, 0x12 | 0x13 | 0x14 | 0x16 | 0x19 | 0x1E)
    }
}

impl fmt::Debug for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IL_{:04x}: {}", self.offset, self.mnemonic)?;
        match &self.operand {
            Operand::None => Ok(()),
            Operand::Target(target) => write!(f, " IL_{target:04x}"),
            Operand::Switch(targets) => write!(f, " [{} targets]", targets.len()),
            operand => write!(f, " {operand:?}"),
        }
    }
}
