//! CIL (Common Intermediate Language) instruction decoding.
//!
//! This module turns the raw code section of a method body into a sequence of
//! [`Instruction`]s. It is the bottom layer of the disassembler: the control flow graph,
//! the structure reducer and both output modes work exclusively on decoded instructions.
//!
//! # Key Types
//! - [`Instruction`] - A decoded CIL instruction
//! - [`Operand`] - Instruction operands (immediates, resolved tokens, targets)
//! - [`FlowType`] - How instructions affect control flow
//! - [`CilInstruction`] - A row of the opcode tables
//!
//! # Main Functions
//! - [`decode_instruction`] - Decode a single instruction
//! - [`decode_stream`] - Decode a whole code section
//! - [`documentation`] - One-line description of an opcode
//!
//! # Example
//! ```rust
//! use ilscope::{disassembler::decode_instruction, metadata::resolver::NullResolver, Parser};
//! let bytecode = &[0x00, 0x2A]; // nop, ret
//! let mut parser = Parser::new(bytecode);
//! let instruction = decode_instruction(&mut parser, &NullResolver)?;
//! assert_eq!(instruction.mnemonic, "nop");
//! # Ok::<(), ilscope::Error>(())
//! ```

mod decoder;
mod instruction;
mod instructions;

pub use decoder::{decode_instruction, decode_stream, decode_stream_cancellable};
pub use instruction::{FlowType, Instruction, Operand, OperandType};
pub use instructions::{
    documentation, lookup, CilInstruction, INSTRUCTIONS, INSTRUCTIONS_FE, INSTRUCTION_COUNT,
    INSTRUCTION_FE_COUNT,
};
