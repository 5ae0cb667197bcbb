//! The CIL opcode tables (ECMA-335 Partition III).
//!
//! [`INSTRUCTIONS`] is indexed by the first opcode byte, [`INSTRUCTIONS_FE`] by the byte that
//! follows a `0xFE` prefix. Unassigned slots carry an empty mnemonic and are rejected by the
//! decoder. Each entry also carries the one-line description shown by the opcode
//! documentation annotation.

use crate::disassembler::{FlowType, Instruction, OperandType};

/// A row of the opcode tables.
#[derive(Debug, Clone, Copy)]
pub struct CilInstruction {
    /// Mnemonic, empty for reserved slots
    pub instr: &'static str,
    /// Encoded operand layout
    pub op_type: OperandType,
    /// Control flow behaviour
    pub flow: FlowType,
    /// One-line description
    pub doc: &'static str,
}

impl CilInstruction {
    /// Returns `true` for unassigned opcode slots
    #[must_use]
    pub const fn is_reserved(&self) -> bool {
        self.instr.is_empty()
    }
}

const RESERVED: CilInstruction = CilInstruction {
    instr: "",
    op_type: OperandType::None,
    flow: FlowType::Sequential,
    doc: "",
};

macro_rules! op {
    ($code:expr, $name:expr, $op:ident, $flow:ident, $doc:expr) => {
        (
            $code,
            CilInstruction {
                instr: $name,
                op_type: OperandType::$op,
                flow: FlowType::$flow,
                doc: $doc,
            },
        )
    };
}

const fn build(entries: &[(u8, CilInstruction)]) -> [CilInstruction; 256] {
    let mut table = [RESERVED; 256];
    let mut i = 0;
    while i < entries.len() {
        table[entries[i].0 as usize] = entries[i].1;
        i += 1;
    }
    table
}

#[rustfmt::skip]
const ONE_BYTE: &[(u8, CilInstruction)] = &[
    op!(0x00, "nop", None, Sequential, "Do nothing."),
    op!(0x01, "break", None, Sequential, "Inform a debugger that a breakpoint has been reached."),
    op!(0x02, "ldarg.0", None, Sequential, "Load argument 0 onto the stack."),
    op!(0x03, "ldarg.1", None, Sequential, "Load argument 1 onto the stack."),
    op!(0x04, "ldarg.2", None, Sequential, "Load argument 2 onto the stack."),
    op!(0x05, "ldarg.3", None, Sequential, "Load argument 3 onto the stack."),
    op!(0x06, "ldloc.0", None, Sequential, "Load local variable 0 onto stack."),
    op!(0x07, "ldloc.1", None, Sequential, "Load local variable 1 onto stack."),
    op!(0x08, "ldloc.2", None, Sequential, "Load local variable 2 onto stack."),
    op!(0x09, "ldloc.3", None, Sequential, "Load local variable 3 onto stack."),
    op!(0x0A, "stloc.0", None, Sequential, "Pop a value from stack into local variable 0."),
    op!(0x0B, "stloc.1", None, Sequential, "Pop a value from stack into local variable 1."),
    op!(0x0C, "stloc.2", None, Sequential, "Pop a value from stack into local variable 2."),
    op!(0x0D, "stloc.3", None, Sequential, "Pop a value from stack into local variable 3."),
    op!(0x0E, "ldarg.s", ShortArgument, Sequential, "Load argument numbered num onto the stack, short form."),
    op!(0x0F, "ldarga.s", ShortArgument, Sequential, "Fetch the address of argument argNum, short form."),
    op!(0x10, "starg.s", ShortArgument, Sequential, "Store value to the argument numbered num, short form."),
    op!(0x11, "ldloc.s", ShortLocal, Sequential, "Load local variable of index indx onto stack, short form."),
    op!(0x12, "ldloca.s", ShortLocal, Sequential, "Load address of local variable with index indx, short form."),
    op!(0x13, "stloc.s", ShortLocal, Sequential, "Pop a value from stack into local variable indx, short form."),
    op!(0x14, "ldnull", None, Sequential, "Push a null reference on the stack."),
    op!(0x15, "ldc.i4.m1", None, Sequential, "Push -1 onto the stack as int32."),
    op!(0x16, "ldc.i4.0", None, Sequential, "Push 0 onto the stack as int32."),
    op!(0x17, "ldc.i4.1", None, Sequential, "Push 1 onto the stack as int32."),
    op!(0x18, "ldc.i4.2", None, Sequential, "Push 2 onto the stack as int32."),
    op!(0x19, "ldc.i4.3", None, Sequential, "Push 3 onto the stack as int32."),
    op!(0x1A, "ldc.i4.4", None, Sequential, "Push 4 onto the stack as int32."),
    op!(0x1B, "ldc.i4.5", None, Sequential, "Push 5 onto the stack as int32."),
    op!(0x1C, "ldc.i4.6", None, Sequential, "Push 6 onto the stack as int32."),
    op!(0x1D, "ldc.i4.7", None, Sequential, "Push 7 onto the stack as int32."),
    op!(0x1E, "ldc.i4.8", None, Sequential, "Push 8 onto the stack as int32."),
    op!(0x1F, "ldc.i4.s", Int8, Sequential, "Push num onto the stack as int32, short form."),
    op!(0x20, "ldc.i4", Int32, Sequential, "Push num of type int32 onto the stack as int32."),
    op!(0x21, "ldc.i8", Int64, Sequential, "Push num of type int64 onto the stack as int64."),
    op!(0x22, "ldc.r4", Float32, Sequential, "Push num of type float32 onto the stack as F."),
    op!(0x23, "ldc.r8", Float64, Sequential, "Push num of type float64 onto the stack as F."),
    op!(0x25, "dup", None, Sequential, "Duplicate the value on the top of the stack."),
    op!(0x26, "pop", None, Sequential, "Pop value from the stack."),
    op!(0x27, "jmp", Method, Return, "Exit current method and jump to the specified method."),
    op!(0x28, "call", Method, Call, "Call method described by method."),
    op!(0x29, "calli", Signature, Call, "Call method indicated on the stack with arguments described by callsitedescr."),
    op!(0x2A, "ret", None, Return, "Return from method, possibly with a value."),
    op!(0x2B, "br.s", ShortBranch, UnconditionalBranch, "Branch to target, short form."),
    op!(0x2C, "brfalse.s", ShortBranch, ConditionalBranch, "Branch to target if value is zero (false), short form."),
    op!(0x2D, "brtrue.s", ShortBranch, ConditionalBranch, "Branch to target if value is non-zero (true), short form."),
    op!(0x2E, "beq.s", ShortBranch, ConditionalBranch, "Branch to target if equal, short form."),
    op!(0x2F, "bge.s", ShortBranch, ConditionalBranch, "Branch to target if greater than or equal to, short form."),
    op!(0x30, "bgt.s", ShortBranch, ConditionalBranch, "Branch to target if greater than, short form."),
    op!(0x31, "ble.s", ShortBranch, ConditionalBranch, "Branch to target if less than or equal to, short form."),
    op!(0x32, "blt.s", ShortBranch, ConditionalBranch, "Branch to target if less than, short form."),
    op!(0x33, "bne.un.s", ShortBranch, ConditionalBranch, "Branch to target if unequal or unordered, short form."),
    op!(0x34, "bge.un.s", ShortBranch, ConditionalBranch, "Branch to target if greater than or equal to (unsigned or unordered), short form."),
    op!(0x35, "bgt.un.s", ShortBranch, ConditionalBranch, "Branch to target if greater than (unsigned or unordered), short form."),
    op!(0x36, "ble.un.s", ShortBranch, ConditionalBranch, "Branch to target if less than or equal to (unsigned or unordered), short form."),
    op!(0x37, "blt.un.s", ShortBranch, ConditionalBranch, "Branch to target if less than (unsigned or unordered), short form."),
    op!(0x38, "br", Branch, UnconditionalBranch, "Branch to target."),
    op!(0x39, "brfalse", Branch, ConditionalBranch, "Branch to target if value is zero (false)."),
    op!(0x3A, "brtrue", Branch, ConditionalBranch, "Branch to target if value is non-zero (true)."),
    op!(0x3B, "beq", Branch, ConditionalBranch, "Branch to target if equal."),
    op!(0x3C, "bge", Branch, ConditionalBranch, "Branch to target if greater than or equal to."),
    op!(0x3D, "bgt", Branch, ConditionalBranch, "Branch to target if greater than."),
    op!(0x3E, "ble", Branch, ConditionalBranch, "Branch to target if less than or equal to."),
    op!(0x3F, "blt", Branch, ConditionalBranch, "Branch to target if less than."),
    op!(0x40, "bne.un", Branch, ConditionalBranch, "Branch to target if unequal or unordered."),
    op!(0x41, "bge.un", Branch, ConditionalBranch, "Branch to target if greater than or equal to (unsigned or unordered)."),
    op!(0x42, "bgt.un", Branch, ConditionalBranch, "Branch to target if greater than (unsigned or unordered)."),
    op!(0x43, "ble.un", Branch, ConditionalBranch, "Branch to target if less than or equal to (unsigned or unordered)."),
    op!(0x44, "blt.un", Branch, ConditionalBranch, "Branch to target if less than (unsigned or unordered)."),
    op!(0x45, "switch", Switch, Switch, "Jump to one of n values."),
    op!(0x46, "ldind.i1", None, Sequential, "Indirect load value of type int8 as int32 on the stack."),
    op!(0x47, "ldind.u1", None, Sequential, "Indirect load value of type unsigned int8 as int32 on the stack."),
    op!(0x48, "ldind.i2", None, Sequential, "Indirect load value of type int16 as int32 on the stack."),
    op!(0x49, "ldind.u2", None, Sequential, "Indirect load value of type unsigned int16 as int32 on the stack."),
    op!(0x4A, "ldind.i4", None, Sequential, "Indirect load value of type int32 as int32 on the stack."),
    op!(0x4B, "ldind.u4", None, Sequential, "Indirect load value of type unsigned int32 as int32 on the stack."),
    op!(0x4C, "ldind.i8", None, Sequential, "Indirect load value of type int64 as int64 on the stack."),
    op!(0x4D, "ldind.i", None, Sequential, "Indirect load value of type native int as native int on the stack."),
    op!(0x4E, "ldind.r4", None, Sequential, "Indirect load value of type float32 as F on the stack."),
    op!(0x4F, "ldind.r8", None, Sequential, "Indirect load value of type float64 as F on the stack."),
    op!(0x50, "ldind.ref", None, Sequential, "Indirect load value of type object ref as O on the stack."),
    op!(0x51, "stind.ref", None, Sequential, "Store value of type object ref (type O) into memory at address."),
    op!(0x52, "stind.i1", None, Sequential, "Store value of type int8 into memory at address."),
    op!(0x53, "stind.i2", None, Sequential, "Store value of type int16 into memory at address."),
    op!(0x54, "stind.i4", None, Sequential, "Store value of type int32 into memory at address."),
    op!(0x55, "stind.i8", None, Sequential, "Store value of type int64 into memory at address."),
    op!(0x56, "stind.r4", None, Sequential, "Store value of type float32 into memory at address."),
    op!(0x57, "stind.r8", None, Sequential, "Store value of type float64 into memory at address."),
    op!(0x58, "add", None, Sequential, "Add two values, returning a new value."),
    op!(0x59, "sub", None, Sequential, "Subtract value2 from value1, returning a new value."),
    op!(0x5A, "mul", None, Sequential, "Multiply values."),
    op!(0x5B, "div", None, Sequential, "Divide two values to return a quotient or floating-point result."),
    op!(0x5C, "div.un", None, Sequential, "Divide two values, unsigned, returning a quotient."),
    op!(0x5D, "rem", None, Sequential, "Remainder when dividing one value by another."),
    op!(0x5E, "rem.un", None, Sequential, "Remainder when dividing one unsigned value by another."),
    op!(0x5F, "and", None, Sequential, "Bitwise AND of two integral values, returns an integral value."),
    op!(0x60, "or", None, Sequential, "Bitwise OR of two integer values, returns an integer."),
    op!(0x61, "xor", None, Sequential, "Bitwise XOR of integer values, returns an integer."),
    op!(0x62, "shl", None, Sequential, "Shift an integer left (shifting in zeros), return an integer."),
    op!(0x63, "shr", None, Sequential, "Shift an integer right (shift in sign), return an integer."),
    op!(0x64, "shr.un", None, Sequential, "Shift an integer right (shift in zero), return an integer."),
    op!(0x65, "neg", None, Sequential, "Negate value."),
    op!(0x66, "not", None, Sequential, "Bitwise complement."),
    op!(0x67, "conv.i1", None, Sequential, "Convert to int8, pushing int32 on stack."),
    op!(0x68, "conv.i2", None, Sequential, "Convert to int16, pushing int32 on stack."),
    op!(0x69, "conv.i4", None, Sequential, "Convert to int32, pushing int32 on stack."),
    op!(0x6A, "conv.i8", None, Sequential, "Convert to int64, pushing int64 on stack."),
    op!(0x6B, "conv.r4", None, Sequential, "Convert to float32, pushing F on stack."),
    op!(0x6C, "conv.r8", None, Sequential, "Convert to float64, pushing F on stack."),
    op!(0x6D, "conv.u4", None, Sequential, "Convert to unsigned int32, pushing int32 on stack."),
    op!(0x6E, "conv.u8", None, Sequential, "Convert to unsigned int64, pushing int64 on stack."),
    op!(0x6F, "callvirt", Method, Call, "Call a method associated with an object."),
    op!(0x70, "cpobj", Type, Sequential, "Copy a value type from src to dest."),
    op!(0x71, "ldobj", Type, Sequential, "Copy the value stored at address src to the stack."),
    op!(0x72, "ldstr", String, Sequential, "Push a string object for the literal string."),
    op!(0x73, "newobj", Method, Call, "Allocate an uninitialized object or value type and call ctor."),
    op!(0x74, "castclass", Type, Sequential, "Cast obj to class."),
    op!(0x75, "isinst", Type, Sequential, "Test if obj is an instance of class, returning null or an instance of that class or interface."),
    op!(0x76, "conv.r.un", None, Sequential, "Convert unsigned integer to floating-point, pushing F on stack."),
    op!(0x79, "unbox", Type, Sequential, "Extract a value-type from obj, its boxed representation."),
    op!(0x7A, "throw", None, Throw, "Throw an exception."),
    op!(0x7B, "ldfld", Field, Sequential, "Push the value of field of object (or value type) obj, onto the stack."),
    op!(0x7C, "ldflda", Field, Sequential, "Push the address of field of object obj on the stack."),
    op!(0x7D, "stfld", Field, Sequential, "Replace the value of field of the object obj with value."),
    op!(0x7E, "ldsfld", Field, Sequential, "Push the value of field on the stack."),
    op!(0x7F, "ldsflda", Field, Sequential, "Push the address of the static field, field, on the stack."),
    op!(0x80, "stsfld", Field, Sequential, "Replace the value of field with val."),
    op!(0x81, "stobj", Type, Sequential, "Store a value of type typeTok at an address."),
    op!(0x82, "conv.ovf.i1.un", None, Sequential, "Convert unsigned to an int8 (on the stack as int32) and throw an exception on overflow."),
    op!(0x83, "conv.ovf.i2.un", None, Sequential, "Convert unsigned to an int16 (on the stack as int32) and throw an exception on overflow."),
    op!(0x84, "conv.ovf.i4.un", None, Sequential, "Convert unsigned to an int32 (on the stack as int32) and throw an exception on overflow."),
    op!(0x85, "conv.ovf.i8.un", None, Sequential, "Convert unsigned to an int64 (on the stack as int64) and throw an exception on overflow."),
    op!(0x86, "conv.ovf.u1.un", None, Sequential, "Convert unsigned to an unsigned int8 (on the stack as int32) and throw an exception on overflow."),
    op!(0x87, "conv.ovf.u2.un", None, Sequential, "Convert unsigned to an unsigned int16 (on the stack as int32) and throw an exception on overflow."),
    op!(0x88, "conv.ovf.u4.un", None, Sequential, "Convert unsigned to an unsigned int32 (on the stack as int32) and throw an exception on overflow."),
    op!(0x89, "conv.ovf.u8.un", None, Sequential, "Convert unsigned to an unsigned int64 (on the stack as int64) and throw an exception on overflow."),
    op!(0x8A, "conv.ovf.i.un", None, Sequential, "Convert unsigned to a native int (on the stack as native int) and throw an exception on overflow."),
    op!(0x8B, "conv.ovf.u.un", None, Sequential, "Convert unsigned to a native unsigned int (on the stack as native int) and throw an exception on overflow."),
    op!(0x8C, "box", Type, Sequential, "Convert a boxable value to its boxed form."),
    op!(0x8D, "newarr", Type, Sequential, "Create a new array with elements of type etype."),
    op!(0x8E, "ldlen", None, Sequential, "Push the length (of type native unsigned int) of array on the stack."),
    op!(0x8F, "ldelema", Type, Sequential, "Load the address of element at index onto the top of the stack."),
    op!(0x90, "ldelem.i1", None, Sequential, "Load the element with type int8 at index onto the top of the stack as an int32."),
    op!(0x91, "ldelem.u1", None, Sequential, "Load the element with type unsigned int8 at index onto the top of the stack as an int32."),
    op!(0x92, "ldelem.i2", None, Sequential, "Load the element with type int16 at index onto the top of the stack as an int32."),
    op!(0x93, "ldelem.u2", None, Sequential, "Load the element with type unsigned int16 at index onto the top of the stack as an int32."),
    op!(0x94, "ldelem.i4", None, Sequential, "Load the element with type int32 at index onto the top of the stack as an int32."),
    op!(0x95, "ldelem.u4", None, Sequential, "Load the element with type unsigned int32 at index onto the top of the stack as an int32."),
    op!(0x96, "ldelem.i8", None, Sequential, "Load the element with type int64 at index onto the top of the stack as an int64."),
    op!(0x97, "ldelem.i", None, Sequential, "Load the element with type native int at index onto the top of the stack as a native int."),
    op!(0x98, "ldelem.r4", None, Sequential, "Load the element with type float32 at index onto the top of the stack as an F."),
    op!(0x99, "ldelem.r8", None, Sequential, "Load the element with type float64 at index onto the top of the stack as an F."),
    op!(0x9A, "ldelem.ref", None, Sequential, "Load the element at index onto the top of the stack as an O."),
    op!(0x9B, "stelem.i", None, Sequential, "Replace array element at index with the native int value on the stack."),
    op!(0x9C, "stelem.i1", None, Sequential, "Replace array element at index with the int8 value on the stack."),
    op!(0x9D, "stelem.i2", None, Sequential, "Replace array element at index with the int16 value on the stack."),
    op!(0x9E, "stelem.i4", None, Sequential, "Replace array element at index with the int32 value on the stack."),
    op!(0x9F, "stelem.i8", None, Sequential, "Replace array element at index with the int64 value on the stack."),
    op!(0xA0, "stelem.r4", None, Sequential, "Replace array element at index with the float32 value on the stack."),
    op!(0xA1, "stelem.r8", None, Sequential, "Replace array element at index with the float64 value on the stack."),
    op!(0xA2, "stelem.ref", None, Sequential, "Replace array element at index with the ref value on the stack."),
    op!(0xA3, "ldelem", Type, Sequential, "Load the element at index onto the top of the stack."),
    op!(0xA4, "stelem", Type, Sequential, "Replace array element at index with the value on the stack."),
    op!(0xA5, "unbox.any", Type, Sequential, "Extract a value-type from obj, its boxed representation, and copy to the top of the stack."),
    op!(0xB3, "conv.ovf.i1", None, Sequential, "Convert to an int8 (on the stack as int32) and throw an exception on overflow."),
    op!(0xB4, "conv.ovf.u1", None, Sequential, "Convert to an unsigned int8 (on the stack as int32) and throw an exception on overflow."),
    op!(0xB5, "conv.ovf.i2", None, Sequential, "Convert to an int16 (on the stack as int32) and throw an exception on overflow."),
    op!(0xB6, "conv.ovf.u2", None, Sequential, "Convert to an unsigned int16 (on the stack as int32) and throw an exception on overflow."),
    op!(0xB7, "conv.ovf.i4", None, Sequential, "Convert to an int32 (on the stack as int32) and throw an exception on overflow."),
    op!(0xB8, "conv.ovf.u4", None, Sequential, "Convert to an unsigned int32 (on the stack as int32) and throw an exception on overflow."),
    op!(0xB9, "conv.ovf.i8", None, Sequential, "Convert to an int64 (on the stack as int64) and throw an exception on overflow."),
    op!(0xBA, "conv.ovf.u8", None, Sequential, "Convert to an unsigned int64 (on the stack as int64) and throw an exception on overflow."),
    op!(0xC2, "refanyval", Type, Sequential, "Push the address stored in a typed reference."),
    op!(0xC3, "ckfinite", None, Sequential, "Throw ArithmeticException if value is not a finite number."),
    op!(0xC6, "mkrefany", Type, Sequential, "Push a typed reference to ptr of type class onto the stack."),
    op!(0xD0, "ldtoken", Token, Sequential, "Convert metadata token to its runtime representation."),
    op!(0xD1, "conv.u2", None, Sequential, "Convert to unsigned int16, pushing int32 on stack."),
    op!(0xD2, "conv.u1", None, Sequential, "Convert to unsigned int8, pushing int32 on stack."),
    op!(0xD3, "conv.i", None, Sequential, "Convert to native int, pushing native int on stack."),
    op!(0xD4, "conv.ovf.i", None, Sequential, "Convert to a native int (on the stack as native int) and throw an exception on overflow."),
    op!(0xD5, "conv.ovf.u", None, Sequential, "Convert to a native unsigned int (on the stack as native int) and throw an exception on overflow."),
    op!(0xD6, "add.ovf", None, Sequential, "Add signed integer values with overflow check."),
    op!(0xD7, "add.ovf.un", None, Sequential, "Add unsigned integer values with overflow check."),
    op!(0xD8, "mul.ovf", None, Sequential, "Multiply signed integer values. Signed result shall fit in same size."),
    op!(0xD9, "mul.ovf.un", None, Sequential, "Multiply unsigned integer values. Unsigned result shall fit in same size."),
    op!(0xDA, "sub.ovf", None, Sequential, "Subtract native int from a native int. Signed result shall fit in same size."),
    op!(0xDB, "sub.ovf.un", None, Sequential, "Subtract native unsigned int from a native unsigned int. Unsigned result shall fit in same size."),
    op!(0xDC, "endfinally", None, EndFinally, "End finally clause of an exception block."),
    op!(0xDD, "leave", Branch, Leave, "Exit a protected region of code."),
    op!(0xDE, "leave.s", ShortBranch, Leave, "Exit a protected region of code, short form."),
    op!(0xDF, "stind.i", None, Sequential, "Store value of type native int into memory at address."),
    op!(0xE0, "conv.u", None, Sequential, "Convert to native unsigned int, pushing native int on stack."),
];

#[rustfmt::skip]
const TWO_BYTE: &[(u8, CilInstruction)] = &[
    op!(0x00, "arglist", None, Sequential, "Return argument list handle for the current method."),
    op!(0x01, "ceq", None, Sequential, "Push 1 (of type int32) if value1 equals value2, else push 0."),
    op!(0x02, "cgt", None, Sequential, "Push 1 (of type int32) if value1 greater that value2, else push 0."),
    op!(0x03, "cgt.un", None, Sequential, "Push 1 (of type int32) if value1 greater that value2, unsigned or unordered, else push 0."),
    op!(0x04, "clt", None, Sequential, "Push 1 (of type int32) if value1 lower than value2, else push 0."),
    op!(0x05, "clt.un", None, Sequential, "Push 1 (of type int32) if value1 lower than value2, unsigned or unordered, else push 0."),
    op!(0x06, "ldftn", Method, Sequential, "Push a pointer to a method referenced by method, on the stack."),
    op!(0x07, "ldvirtftn", Method, Sequential, "Push address of virtual method on the stack."),
    op!(0x09, "ldarg", Argument, Sequential, "Load argument numbered num onto the stack."),
    op!(0x0A, "ldarga", Argument, Sequential, "Fetch the address of argument argNum."),
    op!(0x0B, "starg", Argument, Sequential, "Store value to the argument numbered num."),
    op!(0x0C, "ldloc", Local, Sequential, "Load local variable of index indx onto stack."),
    op!(0x0D, "ldloca", Local, Sequential, "Load address of local variable with index indx."),
    op!(0x0E, "stloc", Local, Sequential, "Pop a value from stack into local variable indx."),
    op!(0x0F, "localloc", None, Sequential, "Allocate space from the local memory pool."),
    op!(0x11, "endfilter", None, EndFilter, "End an exception handling filter clause."),
    op!(0x12, "unaligned.", UInt8, Sequential, "Subsequent pointer instruction might be unaligned."),
    op!(0x13, "volatile.", None, Sequential, "Subsequent pointer reference is volatile."),
    op!(0x14, "tail.", None, Sequential, "Subsequent call terminates current method."),
    op!(0x15, "initobj", Type, Sequential, "Initialize the value at address dest."),
    op!(0x16, "constrained.", Type, Sequential, "Call a virtual method on a type constrained to be type T."),
    op!(0x17, "cpblk", None, Sequential, "Copy data from memory to memory."),
    op!(0x18, "initblk", None, Sequential, "Set all bytes in a block of memory to a given byte value."),
    op!(0x19, "no.", UInt8, Sequential, "The specified fault check(s) normally performed as part of the execution of the subsequent instruction can/shall be skipped."),
    op!(0x1A, "rethrow", None, Throw, "Rethrow the current exception."),
    op!(0x1C, "sizeof", Type, Sequential, "Push the size, in bytes, of a type as an unsigned int32."),
    op!(0x1D, "refanytype", None, Sequential, "Push the type token stored in a typed reference."),
    op!(0x1E, "readonly.", None, Sequential, "Specify that the subsequent array address operation performs no type check at runtime, and that it returns a controlled-mutability managed pointer."),
];

/// One-byte opcodes, indexed by opcode
pub static INSTRUCTIONS: [CilInstruction; 256] = build(ONE_BYTE);

/// Two-byte opcodes, indexed by the byte following `0xFE`
pub static INSTRUCTIONS_FE: [CilInstruction; 256] = build(TWO_BYTE);

/// Number of assigned one-byte opcodes
pub const INSTRUCTION_COUNT: usize = ONE_BYTE.len();

/// Number of assigned two-byte opcodes
pub const INSTRUCTION_FE_COUNT: usize = TWO_BYTE.len();

/// Look up the table entry of an opcode, `None` for reserved slots
#[must_use]
pub fn lookup(prefix: u8, opcode: u8) -> Option<&'static CilInstruction> {
    let entry = if prefix == 0xFE {
        &INSTRUCTIONS_FE[opcode as usize]
    } else {
        &INSTRUCTIONS[opcode as usize]
    };

    (!entry.is_reserved()).then_some(entry)
}

/// The one-line description of a decoded instruction's opcode
#[must_use]
pub fn documentation(instruction: &Instruction) -> Option<&'static str> {
    lookup(instruction.prefix, instruction.opcode).map(|entry| entry.doc)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn table_sizes() {
        // 0x00..=0xE0 minus 0x24, 0x77, 0x78, 0xA6..=0xB2, 0xBB..=0xC1, 0xC4, 0xC5, 0xC7..=0xCF
        assert_eq!(INSTRUCTION_COUNT, 225 - 1 - 2 - 13 - 7 - 2 - 9);
        // 0x00..=0x1E minus 0x08, 0x10, 0x1B
        assert_eq!(INSTRUCTION_FE_COUNT, 31 - 3);

        let assigned = INSTRUCTIONS.iter().filter(|i| !i.is_reserved()).count();
        assert_eq!(assigned, INSTRUCTION_COUNT);
    }

    #[test]
    fn no_duplicate_slots() {
        let mut seen = HashSet::new();
        for (code, _) in ONE_BYTE {
            assert!(seen.insert(*code), "duplicate opcode {code:#04x}");
        }

        let mut seen = HashSet::new();
        for (code, _) in TWO_BYTE {
            assert!(seen.insert(*code), "duplicate opcode FE {code:#04x}");
        }
    }

    #[test]
    fn reserved_slots() {
        assert!(lookup(0, 0x24).is_none());
        assert!(lookup(0, 0xA6).is_none());
        assert!(lookup(0, 0xFF).is_none());
        assert!(lookup(0xFE, 0x08).is_none());
        assert!(lookup(0xFE, 0x1F).is_none());
    }

    #[test]
    fn lookups() {
        let add = lookup(0, 0x58).unwrap();
        assert_eq!(add.instr, "add");
        assert_eq!(add.flow, FlowType::Sequential);

        let ceq = lookup(0xFE, 0x01).unwrap();
        assert_eq!(ceq.instr, "ceq");

        let leave = lookup(0, 0xDE).unwrap();
        assert_eq!(leave.flow, FlowType::Leave);
        assert_eq!(leave.op_type, OperandType::ShortBranch);
    }

    #[test]
    fn every_opcode_is_documented() {
        for entry in INSTRUCTIONS.iter().chain(INSTRUCTIONS_FE.iter()) {
            if !entry.is_reserved() {
                assert!(!entry.doc.is_empty(), "{} lacks a description", entry.instr);
            }
        }
    }
}
