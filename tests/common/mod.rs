//! Shared helpers for the integration tests.
//!
//! Members are described through the public model only, the same way a host feeding
//! `ilscope` from its own metadata reader would.

#![allow(dead_code)]

use std::sync::Arc;

use ilscope::prelude::*;

/// `public hidebysig static`
pub const PUBLIC_STATIC: u16 = 0x0096;

/// TypeRef token of `[mscorlib]System.Exception` in [`exception_resolver`]
pub const EXCEPTION_TOKEN: u32 = 0x0100_0001;

/// A static void method `Program::<name>` with bare code and exception clauses.
pub fn method(name: &str, code: Vec<u8>, clauses: Vec<ExceptionHandler>) -> Arc<MethodDef> {
    Arc::new(MethodDef {
        token: Token::new(0x0600_0001),
        rva: 0x2050,
        name: name.to_string(),
        declaring_type: "Program".to_string(),
        flags: PUBLIC_STATIC,
        return_type: "void".to_string(),
        body: Some(MethodIl::Code {
            code,
            max_stack: 8,
            init_locals: false,
            clauses,
        }),
        ..MethodDef::default()
    })
}

/// A typed catch clause.
pub fn catch(try_range: (u32, u32), handler_range: (u32, u32), class_token: u32) -> ExceptionHandler {
    ExceptionHandler {
        flags: ExceptionHandlerFlags::EXCEPTION,
        try_offset: try_range.0,
        try_length: try_range.1 - try_range.0,
        handler_offset: handler_range.0,
        handler_length: handler_range.1 - handler_range.0,
        filter_offset: class_token,
    }
}

/// A finally clause.
pub fn finally(try_range: (u32, u32), handler_range: (u32, u32)) -> ExceptionHandler {
    ExceptionHandler {
        flags: ExceptionHandlerFlags::FINALLY,
        try_offset: try_range.0,
        try_length: try_range.1 - try_range.0,
        handler_offset: handler_range.0,
        handler_length: handler_range.1 - handler_range.0,
        filter_offset: 0,
    }
}

/// Resolves [`EXCEPTION_TOKEN`] to `[mscorlib]System.Exception`.
pub fn exception_resolver() -> Arc<MapResolver> {
    Arc::new(MapResolver::new().with_type(Token::new(EXCEPTION_TOKEN), "[mscorlib]System.Exception"))
}

/// Disassembles `member` with `language`, returning the text and the report.
pub fn render(
    language: IlLanguage,
    member: &MemberDef,
    context: &DecompilationContext,
) -> (String, DisassemblyReport) {
    let mut sink = StringSink::new();
    let report = language.decompile(member, &mut sink, context);
    (sink.into_string(), report)
}

/// The instruction lines of a listing, without indentation or annotations.
pub fn instruction_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim_start)
        .filter(|line| line.starts_with("IL_"))
        .map(|line| match line.find("  // ") {
            Some(comment) => line[..comment].to_string(),
            None => line.to_string(),
        })
        .collect()
}

/// The labels of the instruction lines of a listing, in output order.
pub fn labels(text: &str) -> Vec<String> {
    instruction_lines(text)
        .iter()
        .filter_map(|line| line.split(':').next().map(str::to_string))
        .collect()
}

/// The labels of every instruction `code` decodes to.
pub fn decoded_labels(code: &[u8]) -> Vec<String> {
    decode_stream(code, &NullResolver)
        .unwrap()
        .iter()
        .map(|instruction| format!("IL_{:04x}", instruction.offset))
        .collect()
}

/// Bodies exercising straight-line code, branches, loops and exception handling.
pub fn corpus() -> Vec<(&'static str, Vec<u8>, Vec<ExceptionHandler>)> {
    vec![
        // ldarg.0; ldc.i4.1; add; ret
        ("straight", vec![0x02, 0x17, 0x58, 0x2A], Vec::new()),
        // ldarg.0; brfalse.s IL_0004; nop; ret
        ("if_then", vec![0x02, 0x2C, 0x01, 0x00, 0x2A], Vec::new()),
        // ldarg.0; brfalse.s IL_0006; nop; br.s IL_0007; nop; ret
        (
            "if_else",
            vec![0x02, 0x2C, 0x03, 0x00, 0x2B, 0x01, 0x00, 0x2A],
            Vec::new(),
        ),
        // nop; ldarg.0; brfalse.s IL_0007; nop; br.s IL_0001; ret
        (
            "while",
            vec![0x00, 0x02, 0x2C, 0x03, 0x00, 0x2B, 0xFA, 0x2A],
            Vec::new(),
        ),
        // ldarg.0; brtrue.s IL_0004; nop; nop; br.s IL_0003; ret
        (
            "irreducible",
            vec![0x02, 0x2D, 0x01, 0x00, 0x00, 0x2B, 0xFC, 0x2A],
            Vec::new(),
        ),
        // ldarg.0; switch (IL_000e, IL_000f); nop; ret
        (
            "switch",
            vec![
                0x02, 0x45, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00,
                0x00, 0x00, 0x2A,
            ],
            Vec::new(),
        ),
        // .try { nop; leave.s IL_0006 } catch { pop; leave.s IL_0006 } ret
        (
            "try_catch",
            vec![0x00, 0xDE, 0x03, 0x26, 0xDE, 0x00, 0x2A],
            vec![catch((0, 3), (3, 6), EXCEPTION_TOKEN)],
        ),
        // .try { nop; leave.s IL_0004 } finally { endfinally } ret
        (
            "try_finally",
            vec![0x00, 0xDE, 0x01, 0xDC, 0x2A],
            vec![finally((0, 3), (3, 4))],
        ),
    ]
}
