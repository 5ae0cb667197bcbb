//! Textual forms of labels, operands and literals.

use std::fmt::Write;

use crate::{
    disassembler::{Instruction, Operand},
    metadata::members::{LocalDef, ParamDef},
    output::{TextTag, TextWriter},
};

/// The label of the instruction at `offset`, e.g. `IL_001a`
#[must_use]
pub fn label(offset: u32) -> String {
    format!("IL_{offset:04x}")
}

/// The label of a branch target, which may lie outside the code section
#[must_use]
pub fn target_label(target: i64) -> String {
    if target < 0 {
        format!("IL_-{:04x}", target.unsigned_abs())
    } else {
        format!("IL_{target:04x}")
    }
}

/// Quotes and escapes a user string literal.
#[must_use]
pub fn escape_string(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len() + 2);
    escaped.push('"');
    for c in value.chars() {
        match c {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\0' => escaped.push_str("\\0"),
            '\u{7}' => escaped.push_str("\\a"),
            '\u{8}' => escaped.push_str("\\b"),
            '\u{c}' => escaped.push_str("\\f"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            '\u{b}' => escaped.push_str("\\v"),
            c if c.is_control() => {
                let _ = write!(escaped, "\\u{:04x}", u32::from(c));
            }
            c => escaped.push(c),
        }
    }
    escaped.push('"');
    escaped
}

fn byte_list(bytes: &[u8]) -> String {
    let mut text = String::from("(");
    for (i, byte) in bytes.iter().enumerate() {
        if i > 0 {
            text.push(' ');
        }
        let _ = write!(text, "{byte:02X}");
    }
    text.push(')');
    text
}

/// `ldc.r4` operand; values without an exact decimal form are written as their bytes
#[must_use]
pub fn float32(value: f32) -> String {
    if value.is_finite() && !(value == 0.0 && value.is_sign_negative()) {
        value.to_string()
    } else {
        byte_list(&value.to_le_bytes())
    }
}

/// `ldc.r8` operand; values without an exact decimal form are written as their bytes
#[must_use]
pub fn float64(value: f64) -> String {
    if value.is_finite() && !(value == 0.0 && value.is_sign_negative()) {
        value.to_string()
    } else {
        byte_list(&value.to_le_bytes())
    }
}

/// Names of the arguments and locals of the method being rendered.
#[derive(Debug, Clone, Copy, Default)]
pub struct OperandNames<'a> {
    /// Declared parameters, excluding `this`
    pub params: &'a [ParamDef],
    /// Local variable slots
    pub locals: &'a [LocalDef],
    /// `true` if argument 0 is `this`
    pub has_this: bool,
}

impl OperandNames<'_> {
    /// Name of argument `index`, `A_<index>` when it has none
    #[must_use]
    pub fn argument(&self, index: u16) -> String {
        let param = if self.has_this {
            usize::from(index)
                .checked_sub(1)
                .and_then(|i| self.params.get(i))
        } else {
            self.params.get(usize::from(index))
        };

        match param {
            Some(param) if !param.name.is_empty() => param.name.clone(),
            _ => format!("A_{index}"),
        }
    }

    /// Name of local `index`, `V_<index>` when it has none
    #[must_use]
    pub fn local(&self, index: u16) -> String {
        match self
            .locals
            .get(usize::from(index))
            .and_then(|local| local.name.as_deref())
        {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("V_{index}"),
        }
    }
}

/// Writes `IL_xxxx: mnemonic operand` without ending the line.
pub fn write_instruction(
    out: &mut TextWriter<'_>,
    instruction: &Instruction,
    names: &OperandNames<'_>,
) {
    out.write(&label(instruction.offset), TextTag::Label);
    out.write(": ", TextTag::Punctuation);
    out.write(instruction.mnemonic, TextTag::Opcode);

    if !matches!(instruction.operand, Operand::None) {
        out.space();
        write_operand(out, &instruction.operand, names);
    }
}

/// Writes the text of an operand.
pub fn write_operand(out: &mut TextWriter<'_>, operand: &Operand, names: &OperandNames<'_>) {
    match operand {
        Operand::None => {}
        Operand::Int8(value) => out.write(&value.to_string(), TextTag::Number),
        Operand::UInt8(value) => out.write(&value.to_string(), TextTag::Number),
        Operand::Int32(value) => out.write(&value.to_string(), TextTag::Number),
        Operand::Int64(value) => out.write(&value.to_string(), TextTag::Number),
        Operand::Float32(value) => out.write(&float32(*value), TextTag::Number),
        Operand::Float64(value) => out.write(&float64(*value), TextTag::Number),
        Operand::String(_, value) => out.write(&escape_string(value), TextTag::String),
        Operand::Type(type_ref) => out.write(&type_ref.name, TextTag::Type),
        Operand::Method(method) => {
            if method.has_this {
                out.write("instance ", TextTag::Keyword);
            }
            out.write(&method.return_type, TextTag::Type);
            out.space();
            out.write(&method.declaring_type, TextTag::Type);
            out.write("::", TextTag::Punctuation);
            out.write(&method.name, TextTag::Member);
            out.write("(", TextTag::Punctuation);
            for (i, parameter) in method.parameter_types.iter().enumerate() {
                if i > 0 {
                    out.write(", ", TextTag::Punctuation);
                }
                out.write(parameter, TextTag::Type);
            }
            out.write(")", TextTag::Punctuation);
        }
        Operand::Field(field) => {
            out.write(&field.field_type, TextTag::Type);
            out.space();
            out.write(&field.declaring_type, TextTag::Type);
            out.write("::", TextTag::Punctuation);
            out.write(&field.name, TextTag::Member);
        }
        Operand::Signature(token) => out.write(&token.to_string(), TextTag::Number),
        Operand::Target(target) => out.write(&target_label(*target), TextTag::Label),
        Operand::Switch(targets) => {
            out.write("(", TextTag::Punctuation);
            for (i, target) in targets.iter().enumerate() {
                if i > 0 {
                    out.write(", ", TextTag::Punctuation);
                }
                out.write(&target_label(*target), TextTag::Label);
            }
            out.write(")", TextTag::Punctuation);
        }
        Operand::Local(index) => out.write(&names.local(*index), TextTag::Local),
        Operand::Argument(index) => out.write(&names.argument(*index), TextTag::Local),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        disassembler::decode_stream,
        metadata::{
            resolver::{FieldRef, MapResolver},
            token::Token,
        },
        output::StringSink,
    };

    fn render(code: &[u8], resolver: &MapResolver, names: &OperandNames<'_>) -> Vec<String> {
        let instructions = decode_stream(code, resolver).unwrap();
        let mut sink = StringSink::new();
        let mut out = TextWriter::new(&mut sink);
        for instruction in &instructions {
            write_instruction(&mut out, instruction, names);
            out.write_line();
        }
        sink.lines().map(str::to_string).collect()
    }

    #[test]
    fn labels() {
        assert_eq!(label(0), "IL_0000");
        assert_eq!(label(0x1a), "IL_001a");
        assert_eq!(label(0x12345), "IL_12345");
        assert_eq!(target_label(-3), "IL_-0003");
    }

    #[test]
    fn string_escapes() {
        assert_eq!(escape_string("a\"b\\c\n\t"), r#""a\"b\\c\n\t""#);
        assert_eq!(escape_string("\u{1}"), r#""\u0001""#);
        assert_eq!(escape_string("héllo"), "\"héllo\"");
    }

    #[test]
    fn floats() {
        assert_eq!(float32(1.5), "1.5");
        assert_eq!(float64(2.0), "2");
        assert_eq!(float32(f32::NAN), "(00 00 C0 7F)");
        assert_eq!(float64(f64::INFINITY), "(00 00 00 00 00 00 F0 7F)");
        assert_eq!(float64(-0.0), "(00 00 00 00 00 00 00 80)");
    }

    #[test]
    fn operands() {
        let resolver = MapResolver::new()
            .with_string(Token::new(0x7000_0001), "hi")
            .with_type(Token::new(0x0100_0002), "[mscorlib]System.Int32")
            .with_field(FieldRef {
                token: Token::new(0x0400_0001),
                declaring_type: "Program".to_string(),
                name: "count".to_string(),
                field_type: "int32".to_string(),
            });

        #[rustfmt::skip]
        let code = [
            0x72, 0x01, 0x00, 0x00, 0x70,       // ldstr "hi"
            0x8C, 0x02, 0x00, 0x00, 0x01,       // box int32
            0x7E, 0x01, 0x00, 0x00, 0x04,       // ldsfld
            0x1F, 0xFE,                         // ldc.i4.s -2
            0x2B, 0x00,                         // br.s IL_0013
            0x45, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // switch (IL_001c)
            0x2A,                               // ret
        ];

        let lines = render(&code, &resolver, &OperandNames::default());
        assert_eq!(
            lines,
            vec![
                "IL_0000: ldstr \"hi\"",
                "IL_0005: box [mscorlib]System.Int32",
                "IL_000a: ldsfld int32 Program::count",
                "IL_000f: ldc.i4.s -2",
                "IL_0011: br.s IL_0013",
                "IL_0013: switch (IL_001c)",
                "IL_001c: ret",
            ]
        );
    }

    #[test]
    fn argument_and_local_names() {
        let params = [
            ParamDef::new("x", "int32", "System.Int32"),
            ParamDef::new("", "int32", "System.Int32"),
        ];
        let locals = [
            LocalDef {
                type_name: "int32".to_string(),
                name: Some("sum".to_string()),
            },
            LocalDef {
                type_name: "int32".to_string(),
                name: None,
            },
        ];
        let names = OperandNames {
            params: &params,
            locals: &locals,
            has_this: true,
        };

        assert_eq!(names.argument(0), "A_0");
        assert_eq!(names.argument(1), "x");
        assert_eq!(names.argument(2), "A_2");
        assert_eq!(names.local(0), "sum");
        assert_eq!(names.local(1), "V_1");
        assert_eq!(names.local(7), "V_7");

        // ldarg.s 1; stloc.s 0
        let lines = render(&[0x0E, 0x01, 0x13, 0x00], &MapResolver::new(), &names);
        assert_eq!(lines, vec!["IL_0000: ldarg.s x", "IL_0002: stloc.s sum"]);
    }
}
