//! The IL language and its two variants.

use rayon::prelude::*;

use crate::{
    language::{DecompilationContext, DisassemblyReport, MemberFailure},
    metadata::members::MemberDef,
    output::{write_reference, MemberWriter, OutputSink, StringSink, TextWriter},
};

/// The IL language, in its flat or structured variant.
///
/// Both variants share every option of the [`DecompilationContext`] except
/// [`crate::language::DisassemblerOptions::detect_control_structure`], which is fixed by
/// the variant.
///
/// # Examples
///
/// ```rust
/// use ilscope::prelude::*;
///
/// let method = MethodDef {
///     name: "Add".to_string(),
///     declaring_type: "Program".to_string(),
///     flags: 0x0096,
///     return_type: "int32".to_string(),
///     body: Some(MethodIl::Raw(vec![0x12, 0x02, 0x17, 0x58, 0x2A])),
///     ..MethodDef::default()
/// };
///
/// let mut sink = StringSink::new();
/// let report = IlLanguage::flat().decompile(
///     &MemberDef::from(method),
///     &mut sink,
///     &DecompilationContext::default(),
/// );
///
/// assert!(report.is_clean());
/// assert!(sink.as_str().contains("IL_0001: ldc.i4.1"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IlLanguage {
    structured: bool,
}

impl IlLanguage {
    /// Plain instruction listings with exception clauses as trailing comments
    #[must_use]
    pub const fn flat() -> Self {
        IlLanguage { structured: false }
    }

    /// Listings with `.try`, `.loop` and `.if` blocks recovered from control flow
    #[must_use]
    pub const fn structured() -> Self {
        IlLanguage { structured: true }
    }

    /// Name shown to users
    #[must_use]
    pub const fn name(&self) -> &'static str {
        "IL"
    }

    /// Extension of files holding this language's output
    #[must_use]
    pub const fn file_extension(&self) -> &'static str {
        ".il"
    }

    /// Returns `true` for the structured variant
    #[must_use]
    pub const fn is_structured(&self) -> bool {
        self.structured
    }

    /// Disassembles `member` into `sink`.
    ///
    /// Members that fail are replaced by a comment and listed in the report. When the
    /// context's token is cancelled the report's status is
    /// [`crate::language::DisassemblyStatus::Cancelled`] and whatever reached `sink` must
    /// be discarded.
    pub fn decompile(
        &self,
        member: &MemberDef,
        sink: &mut dyn OutputSink,
        context: &DecompilationContext,
    ) -> DisassemblyReport {
        log::debug!(
            "disassembling {} '{}' (structured: {})",
            member.kind(),
            member.name(),
            self.structured
        );

        let options = context
            .options()
            .with_control_structure(self.structured);
        let mut writer = MemberWriter::new(
            context.merger(options),
            context.resolver(),
            context.cancellation(),
        )
        .with_entry_point(context.entry_point());

        let result = {
            let mut out = TextWriter::new(sink);
            writer.write_member(&mut out, member)
        };

        let mut report = writer.into_report();
        match result {
            Ok(()) => report.finish(false),
            Err(error) if error.is_cancelled() => {
                log::debug!("disassembly of '{}' cancelled", member.name());
                report.finish(true);
            }
            Err(error) => {
                log::warn!("failed to disassemble '{}': {error}", member.name());
                report
                    .failures
                    .push(MemberFailure::new(member.kind(), member.name(), &error));
                report.finish(false);
            }
        }

        log::debug!(
            "{} members written, {} failed, {} irreducible spans",
            report.members_written,
            report.failures.len(),
            report.warnings.len()
        );
        report
    }

    /// Disassembles independent members in parallel, one private sink each.
    ///
    /// Results are returned in the order of `members`.
    #[must_use]
    pub fn decompile_parallel(
        &self,
        members: &[MemberDef],
        context: &DecompilationContext,
    ) -> Vec<(String, DisassemblyReport)> {
        members
            .par_iter()
            .map(|member| {
                let mut sink = StringSink::new();
                let report = self.decompile(member, &mut sink, context);
                (sink.into_string(), report)
            })
            .collect()
    }

    /// Writes the one-line IL signature of `member`
    pub fn write_tooltip(&self, member: &MemberDef, sink: &mut dyn OutputSink) {
        let mut out = TextWriter::new(sink);
        write_reference(&mut out, member);
    }
}

impl Default for IlLanguage {
    fn default() -> Self {
        Self::structured()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        language::{DisassemblerOptions, DisassemblyStatus},
        metadata::members::ModuleDef,
        test::{create_method, create_type},
        CancellationToken,
    };

    #[test]
    fn variants() {
        assert!(IlLanguage::structured().is_structured());
        assert!(!IlLanguage::flat().is_structured());
        assert_eq!(IlLanguage::default().name(), "IL");
        assert_eq!(IlLanguage::flat().file_extension(), ".il");
    }

    #[test]
    fn variant_overrides_options() {
        // ldc.i4.0; brfalse.s IL_0004; nop; ret
        let member = MemberDef::Method(create_method("Run", vec![0x16, 0x2C, 0x01, 0x00, 0x2A]));
        let context = DecompilationContext::new(DisassemblerOptions::structured());

        let mut flat = StringSink::new();
        IlLanguage::flat().decompile(&member, &mut flat, &context);
        assert!(!flat.as_str().contains(".if"));

        let mut structured = StringSink::new();
        IlLanguage::structured().decompile(&member, &mut structured, &context);
        assert!(structured.as_str().contains(".if"));
    }

    #[test]
    fn failures_are_isolated() {
        let ty = create_type(
            "Program",
            vec![create_method("Broken", vec![0x24]), create_method("Fine", vec![0x2A])],
        );

        let mut sink = StringSink::new();
        let report = IlLanguage::flat().decompile(
            &MemberDef::Type(ty),
            &mut sink,
            &DecompilationContext::default(),
        );

        assert_eq!(report.status, DisassemblyStatus::CompletedWithFailures);
        assert_eq!(report.members_written, 1);
        assert_eq!(report.failures[0].name, "Broken");
        assert!(sink
            .as_str()
            .contains("\t// Failed to disassemble method 'Broken': invalid instruction encoding\n"));
        assert!(sink.as_str().contains("} // end of method Program::Fine"));
    }

    #[test]
    fn cancelled_before_start() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let context = DecompilationContext::default().with_cancellation(cancel);

        let mut sink = StringSink::new();
        let member = MemberDef::Method(create_method("Main", vec![0x2A]));
        let report = IlLanguage::structured().decompile(&member, &mut sink, &context);

        assert!(report.is_cancelled());
        assert_eq!(report.members_written, 0);
    }

    #[test]
    fn parallel_matches_sequential() {
        let members: Vec<MemberDef> = (0..8)
            .map(|i| MemberDef::Method(create_method(&format!("M{i}"), vec![0x00, 0x2A])))
            .collect();
        let context = DecompilationContext::default();
        let language = IlLanguage::structured();

        let parallel = language.decompile_parallel(&members, &context);
        assert_eq!(parallel.len(), members.len());
        for (member, (text, report)) in members.iter().zip(&parallel) {
            let mut sink = StringSink::new();
            language.decompile(member, &mut sink, &context);
            assert_eq!(text, sink.as_str());
            assert!(report.is_clean());
        }
    }

    #[test]
    fn module_entry_point() {
        let main = create_method("Main", vec![0x2A]);
        let module = ModuleDef {
            name: "a.exe".to_string(),
            location: "a.exe".to_string(),
            mvid: uguid::Guid::ZERO,
            entry_point: Some(Arc::clone(&main)),
            types: vec![create_type("Program", vec![main])],
        };

        let mut sink = StringSink::new();
        let report = IlLanguage::flat().decompile(
            &MemberDef::from(module),
            &mut sink,
            &DecompilationContext::default(),
        );

        assert!(report.is_clean());
        assert!(sink.as_str().contains("// Entry point: Program.Main\n"));
        assert!(sink.as_str().contains(".entrypoint"));
    }

    #[test]
    fn tooltips() {
        let mut sink = StringSink::new();
        let member = MemberDef::Method(create_method("Main", vec![0x2A]));
        IlLanguage::flat().write_tooltip(&member, &mut sink);
        assert_eq!(sink.as_str(), "void Program::Main()");
    }
}
