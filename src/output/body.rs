//! Rendering method bodies, flat or structured.

use crate::{
    analysis::{
        reduce, ControlFlowGraph, ExceptionRegion, ExceptionRegionTable, HandlerKind,
        IrreducibleRegionWarning, Region,
    },
    annotations::AnnotationMerger,
    disassembler::{decode_stream_cancellable, Instruction},
    metadata::{members::MethodDef, resolver::TokenResolver},
    output::{
        format::{label, write_instruction, OperandNames},
        TextTag, TextWriter,
    },
    utils::graph::NodeId,
    CancellationToken, Error, Result,
};

/// The code and names instructions are rendered with.
struct Listing<'m> {
    code: &'m [u8],
    names: OperandNames<'m>,
}

/// Writes the body of methods: the prologue directives followed by the instructions.
///
/// In flat mode every instruction is one line and the exception clauses are listed as
/// comments at the end. In structured mode the body is reduced to a
/// [`crate::analysis::RegionTree`] first and every nested region adds one indentation
/// level. The cancellation token is polled every
/// [`crate::language::DisassemblerOptions::cancellation_batch`] instructions.
pub struct BodyWriter<'a> {
    merger: AnnotationMerger<'a>,
    resolver: &'a dyn TokenResolver,
    cancel: &'a CancellationToken,
    rendered: usize,
}

impl<'a> BodyWriter<'a> {
    /// Creates a writer decoding operands through `resolver`
    pub fn new(
        merger: AnnotationMerger<'a>,
        resolver: &'a dyn TokenResolver,
        cancel: &'a CancellationToken,
    ) -> Self {
        BodyWriter {
            merger,
            resolver,
            cancel,
            rendered: 0,
        }
    }

    /// Number of instructions rendered so far
    #[must_use]
    pub fn rendered(&self) -> usize {
        self.rendered
    }

    /// Disassembles the body of `method` and writes it, without the enclosing braces.
    ///
    /// Methods without IL write nothing. The body is decoded and analyzed completely before
    /// anything is written.
    ///
    /// # Errors
    /// Returns the decoding, exception table and control flow errors of the body, and
    /// [`crate::Error::Cancelled`] once the token is cancelled.
    pub fn write_method(
        &mut self,
        out: &mut TextWriter<'_>,
        method: &MethodDef,
        entry_point: bool,
    ) -> Result<Vec<IrreducibleRegionWarning>> {
        let Some(il) = &method.body else {
            return Ok(Vec::new());
        };

        let (header, code) = il.parse()?;
        let code_size = u32::try_from(code.len())
            .map_err(|_| malformed_error!("Code size {} exceeds u32", code.len()))?;

        let options = *self.merger.options();
        let instructions =
            decode_stream_cancellable(code, self.resolver, self.cancel, options.cancellation_batch)?;
        let regions =
            ExceptionRegionTable::build(&header.exception_handlers, code_size, self.resolver)?;

        let cfg = ControlFlowGraph::build(instructions, regions)?;
        let tree = options.detect_control_structure.then(|| reduce(&cfg));

        if method.rva != 0 {
            out.comment_line(&format!("Method begins at RVA 0x{:x}", method.rva));
        }
        out.comment_line(&format!("Code size {code_size} (0x{code_size:x})"));
        out.write(".maxstack", TextTag::Keyword);
        out.space();
        out.write(&header.max_stack.to_string(), TextTag::Number);
        out.write_line();
        if entry_point {
            out.write(".entrypoint", TextTag::Keyword);
            out.write_line();
        }
        Self::write_locals(out, method, header.is_init_local);
        out.write_line();

        let listing = Listing {
            code,
            names: OperandNames {
                params: &method.params,
                locals: &method.locals,
                has_this: !method.is_static(),
            },
        };

        match tree {
            Some(tree) => {
                self.write_region(out, &listing, &cfg, &tree.root)?;
                Ok(tree.warnings)
            }
            None => {
                self.write_flat(out, &listing, &cfg)?;
                Ok(Vec::new())
            }
        }
    }

    fn write_locals(out: &mut TextWriter<'_>, method: &MethodDef, init: bool) {
        if method.locals.is_empty() {
            return;
        }

        out.write(".locals", TextTag::Keyword);
        if init {
            out.write(" init", TextTag::Keyword);
        }
        out.write(" (", TextTag::Punctuation);
        out.write_line();
        out.indent();

        let names = OperandNames {
            locals: &method.locals,
            ..OperandNames::default()
        };
        for (index, local) in method.locals.iter().enumerate() {
            out.write(&format!("[{index}]"), TextTag::Punctuation);
            out.space();
            out.write(&local.type_name, TextTag::Type);
            out.space();
            #[allow(clippy::cast_possible_truncation)]
            out.write(&names.local(index as u16), TextTag::Local);
            if index + 1 < method.locals.len() {
                out.write(",", TextTag::Punctuation);
            }
            out.write_line();
        }

        out.unindent();
        out.write(")", TextTag::Punctuation);
        out.write_line();
    }

    fn write_flat(
        &mut self,
        out: &mut TextWriter<'_>,
        listing: &Listing<'_>,
        cfg: &ControlFlowGraph,
    ) -> Result<()> {
        for instruction in cfg.instructions() {
            self.write_instruction(out, listing, instruction)?;
        }

        let regions = cfg.regions();
        if !regions.is_empty() {
            let mut clauses: Vec<&ExceptionRegion> = regions.regions().iter().collect();
            clauses.sort_by_key(|region| region.index);

            out.write_line();
            for clause in clauses {
                out.comment_line(&describe_clause(clause));
            }
        }

        Ok(())
    }

    fn write_instruction(
        &mut self,
        out: &mut TextWriter<'_>,
        listing: &Listing<'_>,
        instruction: &Instruction,
    ) -> Result<()> {
        let batch = self.merger.options().cancellation_batch.max(1);
        if self.rendered % batch == 0 {
            self.cancel.check()?;
        }
        self.rendered += 1;

        write_instruction(out, instruction, &listing.names);

        let mut separator = "  // ";
        for annotation in self.merger.instruction_annotations(instruction, listing.code) {
            out.write(separator, TextTag::Comment);
            out.write(&annotation.text, TextTag::Comment);
            separator = "; ";
        }
        out.write_line();

        Ok(())
    }

    fn write_block(
        &mut self,
        out: &mut TextWriter<'_>,
        listing: &Listing<'_>,
        cfg: &ControlFlowGraph,
        node: NodeId,
    ) -> Result<()> {
        let block = cfg
            .block(node)
            .ok_or_else(|| Error::GraphError(format!("region references missing block {node}")))?;
        for instruction in &block.instructions {
            self.write_instruction(out, listing, instruction)?;
        }
        Ok(())
    }

    fn write_region(
        &mut self,
        out: &mut TextWriter<'_>,
        listing: &Listing<'_>,
        cfg: &ControlFlowGraph,
        region: &Region,
    ) -> Result<()> {
        match region {
            Region::Block(node) => self.write_block(out, listing, cfg, *node)?,
            Region::Sequence(children) => {
                for child in children {
                    self.write_region(out, listing, cfg, child)?;
                }
            }
            Region::Loop { header, body } => {
                let head = cfg.block(*header).map_or(0, |block| block.offset);
                out.write(".loop", TextTag::Keyword);
                out.write(" // head: ", TextTag::Comment);
                out.write(&label(head), TextTag::Comment);
                out.write_line();
                out.open_brace();
                self.write_region(out, listing, cfg, body)?;
                out.close_brace(Some("end .loop"));
            }
            Region::Conditional {
                condition,
                then_branch,
                else_branch,
            } => {
                self.write_block(out, listing, cfg, *condition)?;
                self.write_construct(out, ".if", "end .if", |writer, out| {
                    writer.write_region(out, listing, cfg, then_branch)
                })?;
                if let Some(else_branch) = else_branch {
                    self.write_construct(out, ".else", "end .else", |writer, out| {
                        writer.write_region(out, listing, cfg, else_branch)
                    })?;
                }
            }
            Region::TryHandler { try_body, handlers } => {
                self.write_construct(out, ".try", "end .try", |writer, out| {
                    writer.write_region(out, listing, cfg, try_body)
                })?;

                for handler in handlers {
                    match (&handler.clause.kind, &handler.filter) {
                        (HandlerKind::Catch(catch_type), _) => {
                            out.write("catch", TextTag::Keyword);
                            out.space();
                            out.write(&catch_type.name, TextTag::Type);
                            out.write_line();
                        }
                        (HandlerKind::Filter { .. }, Some(filter)) => {
                            self.write_construct(out, "filter", "end filter", |writer, out| {
                                writer.write_region(out, listing, cfg, filter)
                            })?;
                        }
                        (kind, _) => {
                            out.write(kind.keyword(), TextTag::Keyword);
                            out.write_line();
                        }
                    }

                    out.write("{", TextTag::Punctuation);
                    out.write(" // handler", TextTag::Comment);
                    out.write_line();
                    out.indent();
                    self.write_region(out, listing, cfg, &handler.body)?;
                    out.close_brace(Some("end handler"));
                }
            }
            Region::Fallback { blocks, warning } => {
                out.comment_line(&warning.to_string());
                for node in blocks {
                    self.write_block(out, listing, cfg, *node)?;
                }
            }
        }

        Ok(())
    }

    fn write_construct<F>(
        &mut self,
        out: &mut TextWriter<'_>,
        keyword: &str,
        end: &str,
        body: F,
    ) -> Result<()>
    where
        F: FnOnce(&mut Self, &mut TextWriter<'_>) -> Result<()>,
    {
        out.write(keyword, TextTag::Keyword);
        out.write_line();
        out.open_brace();
        body(self, out)?;
        out.close_brace(Some(end));
        Ok(())
    }
}

impl std::fmt::Debug for BodyWriter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BodyWriter")
            .field("merger", &self.merger)
            .field("rendered", &self.rendered)
            .finish_non_exhaustive()
    }
}

/// `Try IL_0000-IL_000a Catch [mscorlib]System.Exception IL_000a-IL_0014`
fn describe_clause(clause: &ExceptionRegion) -> String {
    let range = |start: u32, end: u32| format!("{}-{}", label(start), label(end));
    let protected = range(clause.try_start, clause.try_end);
    let handler = range(clause.handler_start, clause.handler_end);

    match &clause.kind {
        HandlerKind::Catch(catch_type) => format!("Try {protected} Catch {catch_type} {handler}"),
        HandlerKind::Filter { filter_start } => format!(
            "Try {protected} Filter {} Handler {handler}",
            range(*filter_start, clause.handler_start)
        ),
        HandlerKind::Finally => format!("Try {protected} Finally {handler}"),
        HandlerKind::Fault => format!("Try {protected} Fault {handler}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        language::DisassemblerOptions,
        metadata::{
            members::MethodIl,
            method::ExceptionHandler,
            resolver::{MapResolver, NullResolver},
            token::Token,
        },
        output::StringSink,
        test::create_catch,
    };

    fn method(code: Vec<u8>, clauses: Vec<ExceptionHandler>) -> MethodDef {
        MethodDef {
            token: Token::new(0x0600_0001),
            rva: 0x2050,
            name: "Run".to_string(),
            declaring_type: "Program".to_string(),
            // static
            flags: 0x0016,
            return_type: "void".to_string(),
            body: Some(MethodIl::Code {
                code,
                max_stack: 8,
                init_locals: true,
                clauses,
            }),
            ..MethodDef::default()
        }
    }

    fn render(
        method: &MethodDef,
        options: DisassemblerOptions,
        resolver: &dyn TokenResolver,
    ) -> Result<(String, Vec<IrreducibleRegionWarning>)> {
        let cancel = CancellationToken::new();
        let mut sink = StringSink::new();
        let mut out = TextWriter::new(&mut sink);
        let mut writer = BodyWriter::new(AnnotationMerger::new(options), resolver, &cancel);
        let warnings = writer.write_method(&mut out, method, false)?;
        Ok((sink.into_string(), warnings))
    }

    fn catch_clause() -> ExceptionHandler {
        create_catch(0, 2, 2, 3, 0x0100_0001)
    }

    fn exception_resolver() -> MapResolver {
        MapResolver::new().with_type(Token::new(0x0100_0001), "[mscorlib]System.Exception")
    }

    #[test]
    fn flat_body_checks_branch_targets() {
        // br.s into the operand of ldc.i4.s
        let method = method(vec![0x2B, 0x01, 0x1F, 0x05, 0x2A], Vec::new());
        let result = render(&method, DisassemblerOptions::flat(), &NullResolver);
        assert!(matches!(result, Err(crate::Error::UnresolvedBranchTarget { .. })));
    }

    #[test]
    fn flat_body() {
        // ldarg.0; ldc.i4.1; add; ret
        let method = method(vec![0x02, 0x17, 0x58, 0x2A], Vec::new());
        let (text, warnings) = render(&method, DisassemblerOptions::flat(), &NullResolver).unwrap();

        assert!(warnings.is_empty());
        assert_eq!(
            text,
            "// Method begins at RVA 0x2050\n\
             // Code size 4 (0x4)\n\
             .maxstack 8\n\
             \n\
             IL_0000: ldarg.0\n\
             IL_0001: ldc.i4.1\n\
             IL_0002: add\n\
             IL_0003: ret\n"
        );
    }

    // leave.s IL_0005 | pop; leave.s IL_0005 | ret
    const TRY_CATCH: [u8; 6] = [0xDE, 0x03, 0x26, 0xDE, 0x00, 0x2A];

    #[test]
    fn flat_exception_clauses() {
        let method = method(TRY_CATCH.to_vec(), vec![catch_clause()]);
        let (text, _) =
            render(&method, DisassemblerOptions::flat(), &exception_resolver()).unwrap();

        assert!(text.ends_with(
            "IL_0005: ret\n\n// Try IL_0000-IL_0002 Catch [mscorlib]System.Exception IL_0002-IL_0005\n"
        ));
    }

    #[test]
    fn structured_try_catch() {
        let method = method(TRY_CATCH.to_vec(), vec![catch_clause()]);
        let (text, warnings) =
            render(&method, DisassemblerOptions::structured(), &exception_resolver()).unwrap();

        assert!(warnings.is_empty());
        let body: Vec<&str> = text.lines().skip(4).collect();
        assert_eq!(
            body,
            vec![
                ".try",
                "{",
                "\tIL_0000: leave.s IL_0005",
                "} // end .try",
                "catch [mscorlib]System.Exception",
                "{ // handler",
                "\tIL_0002: pop",
                "\tIL_0003: leave.s IL_0005",
                "} // end handler",
                "IL_0005: ret",
            ]
        );
    }

    #[test]
    fn structured_loop() {
        // nop | ldarg.0; brfalse.s IL_0007 | nop; br.s IL_0001 | ret
        let code = vec![0x00, 0x02, 0x2C, 0x03, 0x00, 0x2B, 0xFA, 0x2A];
        let method = method(code, Vec::new());
        let (text, _) = render(&method, DisassemblerOptions::structured(), &NullResolver).unwrap();

        assert!(text.contains(".loop // head: IL_0001\n{\n\tIL_0001: ldarg.0\n"));
        assert!(text.contains("} // end .loop\nIL_0007: ret\n"));
    }

    #[test]
    fn annotations_follow_the_instruction() {
        let method = method(vec![0x00, 0x2A], Vec::new());
        let options = DisassemblerOptions::flat().with_raw_bytes(true);
        let (text, _) = render(&method, options, &NullResolver).unwrap();

        assert!(text.contains("IL_0000: nop  // 00\n"));
        assert!(text.contains("IL_0001: ret  // 2A\n"));
    }

    #[test]
    fn locals_and_entry_point() {
        let mut method = method(vec![0x2A], Vec::new());
        method.locals = vec![
            crate::metadata::members::LocalDef {
                type_name: "int32".to_string(),
                name: None,
            },
            crate::metadata::members::LocalDef {
                type_name: "string".to_string(),
                name: Some("s".to_string()),
            },
        ];

        let cancel = CancellationToken::new();
        let mut sink = StringSink::new();
        let mut out = TextWriter::new(&mut sink);
        let mut writer = BodyWriter::new(
            AnnotationMerger::new(DisassemblerOptions::flat()),
            &NullResolver,
            &cancel,
        );
        writer.write_method(&mut out, &method, true).unwrap();

        assert!(sink.as_str().contains(
            ".maxstack 8\n.entrypoint\n.locals init (\n\t[0] int32 V_0,\n\t[1] string s\n)\n\n"
        ));
    }

    #[test]
    fn body_errors_write_nothing() {
        let method = method(vec![0x00, 0x24], Vec::new());
        let cancel = CancellationToken::new();
        let mut sink = StringSink::new();
        let mut out = TextWriter::new(&mut sink);
        let mut writer = BodyWriter::new(
            AnnotationMerger::new(DisassemblerOptions::structured()),
            &NullResolver,
            &cancel,
        );

        let error = writer.write_method(&mut out, &method, false).unwrap_err();
        assert!(matches!(error, Error::Decode { offset: 1, .. }));
        assert!(sink.as_str().is_empty());
    }

    #[test]
    fn cancelled_bodies() {
        let method = method(vec![0x00; 600], Vec::new());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let mut sink = StringSink::new();
        let mut out = TextWriter::new(&mut sink);
        let mut writer = BodyWriter::new(
            AnnotationMerger::new(DisassemblerOptions::flat()),
            &NullResolver,
            &cancel,
        );

        assert!(writer.write_method(&mut out, &method, false).unwrap_err().is_cancelled());
        assert_eq!(writer.rendered(), 0);
    }

    #[test]
    fn clause_descriptions() {
        let region = |kind| ExceptionRegion {
            try_start: 0,
            try_end: 4,
            handler_start: 8,
            handler_end: 12,
            kind,
            index: 0,
        };

        assert_eq!(
            describe_clause(&region(HandlerKind::Finally)),
            "Try IL_0000-IL_0004 Finally IL_0008-IL_000c"
        );
        assert_eq!(
            describe_clause(&region(HandlerKind::Filter { filter_start: 4 })),
            "Try IL_0000-IL_0004 Filter IL_0004-IL_0008 Handler IL_0008-IL_000c"
        );
    }
}
