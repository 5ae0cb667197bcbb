//! Linear CIL instruction decoding.
//!
//! Method bodies are decoded front to back: every byte of the code section must belong to
//! exactly one instruction, so a linear sweep is sufficient and yields the instructions in
//! ascending offset order. Token operands are resolved while decoding, which means a token
//! that does not resolve to the kind its opcode requires is a decode failure.
//!
//! # Example: Decoding a Single Instruction
//!
//! ```rust
//! use ilscope::{Parser, disassembler::decode_instruction, metadata::resolver::NullResolver};
//! let code = [0x2A]; // ret
//! let mut parser = Parser::new(&code);
//! let instr = decode_instruction(&mut parser, &NullResolver)?;
//! assert_eq!(instr.mnemonic, "ret");
//! # Ok::<(), ilscope::Error>(())
//! ```
//!
//! # Example: Decoding a Stream of Instructions
//!
//! ```rust
//! use ilscope::{disassembler::decode_stream, metadata::resolver::NullResolver};
//! let code = [0x00, 0x2A]; // nop, ret
//! let instrs = decode_stream(&code, &NullResolver)?;
//! assert_eq!(instrs.len(), 2);
//! # Ok::<(), ilscope::Error>(())
//! ```

use crate::{
    disassembler::{instructions::lookup, Instruction, Operand, OperandType},
    file::parser::Parser,
    metadata::{
        resolver::{ResolvedToken, TokenResolver},
        token::Token,
    },
    CancellationToken, Error, Result,
};

/// Decodes a single instruction at the parser's current position.
///
/// On success the parser is positioned at the next instruction. Branch and switch
/// displacements are converted to absolute offsets relative to the start of the parser's
/// buffer, which must therefore be the first byte of the method's code.
///
/// # Errors
/// Returns [`crate::Error::Decode`] for reserved opcodes, truncated operands and token
/// operands the `resolver` cannot resolve to the required kind.
pub fn decode_instruction(parser: &mut Parser, resolver: &dyn TokenResolver) -> Result<Instruction> {
    let start = parser.pos();
    let offset = u32::try_from(start)
        .map_err(|_| malformed_error!("Instruction offset {} exceeds u32", start))?;

    let first_byte = parser
        .read_le::<u8>()
        .map_err(|_| decode_error!(offset, "truncated instruction"))?;
    let (prefix, opcode) = if first_byte == 0xFE {
        let second_byte = parser
            .read_le::<u8>()
            .map_err(|_| decode_error!(offset, "truncated two-byte opcode"))?;
        (0xFE, second_byte)
    } else {
        (0, first_byte)
    };

    let Some(cil_instruction) = lookup(prefix, opcode) else {
        parser.seek(start)?;
        return Err(if prefix == 0xFE {
            decode_error!(offset, "reserved opcode FE {:02X}", opcode)
        } else {
            decode_error!(offset, "reserved opcode {:02X}", opcode)
        });
    };

    let operand = match decode_operand(parser, cil_instruction.op_type, offset, resolver) {
        Ok(operand) => operand,
        Err(error) => {
            parser.seek(start)?;
            return Err(match error {
                Error::OutOfBounds => {
                    decode_error!(offset, "truncated operand of '{}'", cil_instruction.instr)
                }
                other => other,
            });
        }
    };

    #[allow(clippy::cast_possible_truncation)]
    let size = (parser.pos() - start) as u32;
    let next = i64::from(offset) + i64::from(size);

    // Displacements are relative to the next instruction
    let (operand, branch_targets) = match operand {
        Operand::Target(displacement) => {
            let target = next + displacement;
            (Operand::Target(target), vec![target])
        }
        Operand::Switch(displacements) => {
            let targets: Vec<i64> = displacements.iter().map(|rel| next + rel).collect();
            (Operand::Switch(targets.clone()), targets)
        }
        other => (other, Vec::new()),
    };

    Ok(Instruction {
        offset,
        size,
        opcode,
        prefix,
        mnemonic: cil_instruction.instr,
        flow_type: cil_instruction.flow,
        operand,
        branch_targets,
    })
}

/// Reads the operand of an instruction. Branch operands are returned as raw displacements.
fn decode_operand(
    parser: &mut Parser,
    op_type: OperandType,
    offset: u32,
    resolver: &dyn TokenResolver,
) -> Result<Operand> {
    let operand = match op_type {
        OperandType::None => Operand::None,
        OperandType::Int8 => Operand::Int8(parser.read_le::<i8>()?),
        OperandType::UInt8 => Operand::UInt8(parser.read_le::<u8>()?),
        OperandType::Int32 => Operand::Int32(parser.read_le::<i32>()?),
        OperandType::Int64 => Operand::Int64(parser.read_le::<i64>()?),
        OperandType::Float32 => Operand::Float32(parser.read_le::<f32>()?),
        OperandType::Float64 => Operand::Float64(parser.read_le::<f64>()?),
        OperandType::ShortBranch => Operand::Target(i64::from(parser.read_le::<i8>()?)),
        OperandType::Branch => Operand::Target(i64::from(parser.read_le::<i32>()?)),
        OperandType::Switch => {
            let case_count = parser.read_le::<u32>()? as usize;
            if case_count.saturating_mul(4) > parser.remaining() {
                return Err(Error::OutOfBounds);
            }

            let mut targets = Vec::with_capacity(case_count);
            for _ in 0..case_count {
                targets.push(i64::from(parser.read_le::<i32>()?));
            }

            Operand::Switch(targets)
        }
        OperandType::ShortLocal => Operand::Local(u16::from(parser.read_le::<u8>()?)),
        OperandType::Local => Operand::Local(parser.read_le::<u16>()?),
        OperandType::ShortArgument => Operand::Argument(u16::from(parser.read_le::<u8>()?)),
        OperandType::Argument => Operand::Argument(parser.read_le::<u16>()?),
        OperandType::Type => {
            let token = Token::new(parser.read_le::<u32>()?);
            Operand::Type(
                resolver
                    .resolve_type(token)
                    .ok_or_else(|| decode_error!(offset, "unresolved type token {}", token))?,
            )
        }
        OperandType::Method => {
            let token = Token::new(parser.read_le::<u32>()?);
            Operand::Method(
                resolver
                    .resolve_method(token)
                    .ok_or_else(|| decode_error!(offset, "unresolved method token {}", token))?,
            )
        }
        OperandType::Field => {
            let token = Token::new(parser.read_le::<u32>()?);
            Operand::Field(
                resolver
                    .resolve_field(token)
                    .ok_or_else(|| decode_error!(offset, "unresolved field token {}", token))?,
            )
        }
        OperandType::String => {
            let token = Token::new(parser.read_le::<u32>()?);
            let value = resolver
                .resolve_string(token)
                .ok_or_else(|| decode_error!(offset, "unresolved string token {}", token))?;
            Operand::String(token, value)
        }
        OperandType::Token => {
            let token = Token::new(parser.read_le::<u32>()?);
            match resolver.resolve(token) {
                Some(ResolvedToken::Type(type_ref)) => Operand::Type(type_ref),
                Some(ResolvedToken::Method(method_ref)) => Operand::Method(method_ref),
                Some(ResolvedToken::Field(field_ref)) => Operand::Field(field_ref),
                _ => return Err(decode_error!(offset, "unresolved member token {}", token)),
            }
        }
        OperandType::Signature => Operand::Signature(Token::new(parser.read_le::<u32>()?)),
    };

    Ok(operand)
}

/// Decodes an entire code section into instructions in ascending offset order.
///
/// # Errors
/// Returns [`crate::Error::Decode`] if any instruction fails to decode.
pub fn decode_stream(code: &[u8], resolver: &dyn TokenResolver) -> Result<Vec<Instruction>> {
    decode_stream_cancellable(code, resolver, &CancellationToken::new(), usize::MAX)
}

/// Decodes an entire code section, polling `cancel` every `batch` instructions.
///
/// # Errors
/// Returns [`crate::Error::Decode`] if any instruction fails to decode and
/// [`crate::Error::Cancelled`] once `cancel` has been triggered.
pub fn decode_stream_cancellable(
    code: &[u8],
    resolver: &dyn TokenResolver,
    cancel: &CancellationToken,
    batch: usize,
) -> Result<Vec<Instruction>> {
    let batch = batch.max(1);
    let mut parser = Parser::new(code);
    let mut instructions = Vec::new();

    while parser.has_more_data() {
        if instructions.len() % batch == 0 {
            cancel.check()?;
        }

        instructions.push(decode_instruction(&mut parser, resolver)?);
    }

    Ok(instructions)
}
