//! Headers and bodies of members: methods, fields, properties, events, types, modules and
//! assemblies.
//!
//! Every leaf member (a method, a field, a property or event block) is written into a
//! [`BufferedSink`] first. It only reaches the real sink once it has been written
//! completely; a member that fails is replaced by a single `// Failed to disassemble ...`
//! comment and the run continues with the next one.

use std::sync::Arc;

use uguid::Guid;

use crate::{
    annotations::{AnnotationKind, AnnotationMerger},
    language::{DisassemblyReport, MemberFailure},
    metadata::{
        members::{
            AssemblyDef, EventDef, FieldAttributes, FieldDef, MemberDef, MemberKind, MethodDef,
            ModuleDef, ParamDef, PropertyDef, TypeAttributes, TypeDef,
        },
        method::{MethodImplCodeType, MethodImplOptions, MethodModifiers},
        resolver::TokenResolver,
        token::Token,
    },
    output::{BodyWriter, BufferedSink, TextTag, TextWriter},
    CancellationToken, Result,
};

const METHOD_FLAGS: [(MethodModifiers, &str); 10] = [
    (MethodModifiers::FINAL, "final"),
    (MethodModifiers::HIDE_BY_SIG, "hidebysig"),
    (MethodModifiers::SPECIAL_NAME, "specialname"),
    (MethodModifiers::PINVOKE_IMPL, "pinvokeimpl"),
    (MethodModifiers::RTSPECIAL_NAME, "rtspecialname"),
    (MethodModifiers::NEW_SLOT, "newslot"),
    (MethodModifiers::STRICT, "strict"),
    (MethodModifiers::ABSTRACT, "abstract"),
    (MethodModifiers::VIRTUAL, "virtual"),
    (MethodModifiers::STATIC, "static"),
];

const METHOD_IMPL_FLAGS: [(MethodImplOptions, &str); 7] = [
    (MethodImplOptions::FORWARD_REF, "forwardref"),
    (MethodImplOptions::PRESERVE_SIG, "preservesig"),
    (MethodImplOptions::INTERNAL_CALL, "internalcall"),
    (MethodImplOptions::SYNCHRONIZED, "synchronized"),
    (MethodImplOptions::NO_INLINING, "noinlining"),
    (MethodImplOptions::AGGRESSIVE_INLINING, "aggressiveinlining"),
    (MethodImplOptions::NO_OPTIMIZATION, "nooptimization"),
];

const FIELD_FLAGS: [(u16, &str); 6] = [
    (FieldAttributes::STATIC, "static"),
    (FieldAttributes::LITERAL, "literal"),
    (FieldAttributes::INIT_ONLY, "initonly"),
    (FieldAttributes::SPECIAL_NAME, "specialname"),
    (FieldAttributes::RTSPECIAL_NAME, "rtspecialname"),
    (FieldAttributes::NOT_SERIALIZED, "notserialized"),
];

const TYPE_FLAGS: [(u32, &str); 6] = [
    (TypeAttributes::ABSTRACT, "abstract"),
    (TypeAttributes::SEALED, "sealed"),
    (TypeAttributes::SPECIAL_NAME, "specialname"),
    (TypeAttributes::IMPORT, "import"),
    (TypeAttributes::SERIALIZABLE, "serializable"),
    (TypeAttributes::BEFORE_FIELD_INIT, "beforefieldinit"),
];

fn field_access(flags: u16) -> &'static str {
    match flags & FieldAttributes::FIELD_ACCESS_MASK {
        FieldAttributes::PRIVATE => "private",
        FieldAttributes::FAM_AND_ASSEM => "famandassem",
        FieldAttributes::ASSEMBLY => "assembly",
        FieldAttributes::FAMILY => "family",
        FieldAttributes::FAM_OR_ASSEM => "famorassem",
        FieldAttributes::PUBLIC => "public",
        _ => "privatescope",
    }
}

fn type_visibility(flags: u32) -> &'static str {
    match flags & TypeAttributes::VISIBILITY_MASK {
        TypeAttributes::PUBLIC => "public",
        TypeAttributes::NESTED_PUBLIC => "nested public",
        TypeAttributes::NESTED_PRIVATE => "nested private",
        TypeAttributes::NESTED_FAMILY => "nested family",
        TypeAttributes::NESTED_ASSEMBLY => "nested assembly",
        TypeAttributes::NESTED_FAM_AND_ASSEM => "nested famandassem",
        TypeAttributes::NESTED_FAM_OR_ASSEM => "nested famorassem",
        _ => "private",
    }
}

fn type_layout(flags: u32) -> &'static str {
    match flags & TypeAttributes::LAYOUT_MASK {
        TypeAttributes::SEQUENTIAL_LAYOUT => "sequential",
        TypeAttributes::EXPLICIT_LAYOUT => "explicit",
        _ => "auto",
    }
}

fn type_string_format(flags: u32) -> &'static str {
    match flags & TypeAttributes::STRING_FORMAT_MASK {
        TypeAttributes::UNICODE_CLASS => "unicode",
        TypeAttributes::AUTO_CLASS => "autochar",
        _ => "ansi",
    }
}

fn code_type_keyword(impl_flags: u16) -> &'static str {
    let code_type = MethodImplCodeType::from_impl_flags(impl_flags);
    if code_type == MethodImplCodeType::NATIVE {
        "native"
    } else if code_type == MethodImplCodeType::OPTIL {
        "optil"
    } else if code_type == MethodImplCodeType::RUNTIME {
        "runtime"
    } else {
        "cil"
    }
}

/// Writes `(type name, type name)`, or `(type, type)` without names.
fn write_params(out: &mut TextWriter<'_>, params: &[ParamDef], with_names: bool) {
    out.write("(", TextTag::Punctuation);
    for (i, param) in params.iter().enumerate() {
        if i > 0 {
            out.write(", ", TextTag::Punctuation);
        }
        out.write(&param.type_name, TextTag::Type);
        if with_names && !param.name.is_empty() {
            out.space();
            out.write(&param.name, TextTag::Local);
        }
    }
    out.write(")", TextTag::Punctuation);
}

/// Writes a method reference: `instance void Program::Run(int32)`
fn write_method_reference(out: &mut TextWriter<'_>, method: &MethodDef) {
    if !method.is_static() {
        out.write("instance ", TextTag::Keyword);
    }
    out.write(&method.return_type, TextTag::Type);
    out.space();
    out.write(&method.declaring_type, TextTag::Type);
    out.write("::", TextTag::Punctuation);
    out.write(&method.name, TextTag::Member);
    write_params(out, &method.params, false);
}

/// Writes the one-line IL signature of `member`.
///
/// Methods, fields, properties and events are written the way instructions reference
/// them; types, modules and assemblies by name.
pub fn write_reference(out: &mut TextWriter<'_>, member: &MemberDef) {
    match member {
        MemberDef::Method(method) => write_method_reference(out, method),
        MemberDef::Field(field) => {
            out.write(&field.field_type, TextTag::Type);
            out.space();
            out.write(&field.declaring_type, TextTag::Type);
            out.write("::", TextTag::Punctuation);
            out.write(&field.name, TextTag::Member);
        }
        MemberDef::Property(property) => {
            if property.has_this {
                out.write("instance ", TextTag::Keyword);
            }
            out.write(&property.property_type, TextTag::Type);
            out.space();
            out.write(&property.declaring_type, TextTag::Type);
            out.write("::", TextTag::Punctuation);
            out.write(&property.name, TextTag::Member);
            write_params(out, &property.params, false);
        }
        MemberDef::Event(event) => {
            out.write(&event.event_type, TextTag::Type);
            out.space();
            out.write(&event.declaring_type, TextTag::Type);
            out.write("::", TextTag::Punctuation);
            out.write(&event.name, TextTag::Member);
        }
        MemberDef::Type(ty) => out.write(&ty.full_name, TextTag::Type),
        MemberDef::Module(module) => out.write(&module.name, TextTag::Text),
        MemberDef::Assembly(assembly) => out.write(&assembly.name, TextTag::Text),
    }
}

/// Writes members with their annotations, isolating the failures of leaf members.
pub struct MemberWriter<'a> {
    merger: AnnotationMerger<'a>,
    body: BodyWriter<'a>,
    cancel: &'a CancellationToken,
    entry_point: Option<Token>,
    report: DisassemblyReport,
    /// A blank line is owed before the next member
    separator: bool,
}

impl<'a> MemberWriter<'a> {
    /// Creates a writer; operand tokens are resolved through `resolver`
    pub fn new(
        merger: AnnotationMerger<'a>,
        resolver: &'a dyn TokenResolver,
        cancel: &'a CancellationToken,
    ) -> Self {
        MemberWriter {
            merger,
            body: BodyWriter::new(merger, resolver, cancel),
            cancel,
            entry_point: None,
            report: DisassemblyReport::default(),
            separator: false,
        }
    }

    /// Marks the method with token `entry_point` with `.entrypoint`
    #[must_use]
    pub fn with_entry_point(mut self, entry_point: Option<Token>) -> Self {
        self.entry_point = entry_point;
        self
    }

    /// The report accumulated so far
    #[must_use]
    pub fn report(&self) -> &DisassemblyReport {
        &self.report
    }

    /// Consumes the writer, returning its report
    #[must_use]
    pub fn into_report(self) -> DisassemblyReport {
        self.report
    }

    /// Writes `member` and everything it contains.
    ///
    /// # Errors
    /// Returns [`crate::Error::Cancelled`] once the token is cancelled. Other failures are
    /// recorded in the report and written as comments.
    pub fn write_member(&mut self, out: &mut TextWriter<'_>, member: &MemberDef) -> Result<()> {
        self.cancel.check()?;
        match member {
            MemberDef::Method(method) => self.write_method(out, method),
            MemberDef::Field(field) => self.write_field(out, field),
            MemberDef::Property(property) => {
                self.write_property(out, property)?;
                let accessors = property
                    .getter
                    .iter()
                    .chain(property.setter.iter())
                    .chain(property.other.iter());
                self.write_accessors(out, accessors)
            }
            MemberDef::Event(event) => {
                self.write_event(out, event)?;
                let accessors = event
                    .add
                    .iter()
                    .chain(event.remove.iter())
                    .chain(event.other.iter());
                self.write_accessors(out, accessors)
            }
            MemberDef::Type(ty) => self.write_type(out, ty),
            MemberDef::Module(module) => {
                write_location(out, &module.location, module.entry_point.as_deref());
                self.write_module_header(out, module);
                self.write_types(out, module)
            }
            MemberDef::Assembly(assembly) => {
                let module = &assembly.manifest_module;
                write_location(out, &module.location, module.entry_point.as_deref());
                self.write_assembly_header(out, assembly);
                self.write_types(out, module)
            }
        }
    }

    fn write_accessors<'m>(
        &mut self,
        out: &mut TextWriter<'_>,
        accessors: impl Iterator<Item = &'m Arc<MethodDef>>,
    ) -> Result<()> {
        for accessor in accessors {
            self.separator = true;
            self.write_method(out, accessor)?;
        }
        Ok(())
    }

    /// Runs `write` against a staging buffer, committing its output only on success
    fn isolated<F>(
        &mut self,
        out: &mut TextWriter<'_>,
        kind: MemberKind,
        name: &str,
        write: F,
    ) -> Result<()>
    where
        F: FnOnce(&mut Self, &mut TextWriter<'_>) -> Result<()>,
    {
        self.cancel.check()?;
        let separator = std::mem::take(&mut self.separator);

        let mut buffer = BufferedSink::new();
        let result = {
            let mut staged = TextWriter::with_indent(&mut buffer, out.indentation());
            if separator {
                staged.write_line();
            }
            write(self, &mut staged)
        };

        match result {
            Ok(()) => {
                buffer.commit(out.sink());
                self.report.members_written += 1;
                Ok(())
            }
            Err(error) if error.is_cancelled() => Err(error),
            Err(error) => {
                log::warn!("failed to disassemble {kind} '{name}': {error}");
                if separator {
                    out.write_line();
                }
                out.comment_line(&format!(
                    "Failed to disassemble {kind} '{name}': {}",
                    error.failure_class()
                ));
                self.report
                    .failures
                    .push(MemberFailure::new(kind, name, &error));
                Ok(())
            }
        }
    }

    fn write_member_annotations(&self, out: &mut TextWriter<'_>, member: &MemberDef) {
        for annotation in self.merger.member_annotations(member) {
            match annotation.kind {
                AnnotationKind::XmlDoc => {
                    out.write("///", TextTag::Comment);
                    out.write(&annotation.text, TextTag::Comment);
                    out.write_line();
                }
                _ => out.comment_line(&annotation.text),
            }
        }
    }

    fn write_method(&mut self, out: &mut TextWriter<'_>, method: &Arc<MethodDef>) -> Result<()> {
        self.isolated(out, MemberKind::Method, &method.name, |this, out| {
            log::debug!("disassembling method {}", method.full_name());
            this.write_member_annotations(out, &MemberDef::Method(Arc::clone(method)));

            out.write(".method", TextTag::Keyword);
            out.space();
            out.write(method.access().keyword(), TextTag::Keyword);
            let modifiers = method.modifiers();
            for (flag, keyword) in METHOD_FLAGS {
                if modifiers.contains(flag) {
                    out.space();
                    out.write(keyword, TextTag::Keyword);
                }
            }
            if !method.is_static() {
                out.write(" instance", TextTag::Keyword);
            }
            out.space();
            out.write(&method.return_type, TextTag::Type);
            out.space();
            out.write(&method.name, TextTag::Member);
            write_params(out, &method.params, true);

            out.space();
            out.write(code_type_keyword(method.impl_flags), TextTag::Keyword);
            let options = MethodImplOptions::from_bits_truncate(method.impl_flags);
            if options.contains(MethodImplOptions::UNMANAGED) {
                out.write(" unmanaged", TextTag::Keyword);
            } else {
                out.write(" managed", TextTag::Keyword);
            }
            for (flag, keyword) in METHOD_IMPL_FLAGS {
                if options.contains(flag) {
                    out.space();
                    out.write(keyword, TextTag::Keyword);
                }
            }
            out.write_line();

            out.open_brace();
            let entry_point = this.entry_point == Some(method.token) && !method.token.is_null();
            let warnings = this.body.write_method(out, method, entry_point)?;
            out.close_brace(Some(&format!("end of method {}", method.full_name())));

            this.report.warnings.extend(warnings);
            Ok(())
        })
    }

    fn write_field(&mut self, out: &mut TextWriter<'_>, field: &Arc<FieldDef>) -> Result<()> {
        self.isolated(out, MemberKind::Field, &field.name, |this, out| {
            this.write_member_annotations(out, &MemberDef::Field(Arc::clone(field)));

            out.write(".field", TextTag::Keyword);
            out.space();
            out.write(field_access(field.flags), TextTag::Keyword);
            for (flag, keyword) in FIELD_FLAGS {
                if field.flags & flag != 0 {
                    out.space();
                    out.write(keyword, TextTag::Keyword);
                }
            }
            out.space();
            out.write(&field.field_type, TextTag::Type);
            out.space();
            out.write(&field.name, TextTag::Member);

            if let Some(rva) = field.rva {
                out.write(" at ", TextTag::Keyword);
                out.write(&format!("I_{rva:08X}"), TextTag::Label);
            }
            if let Some(constant) = &field.constant {
                out.write(" = ", TextTag::Punctuation);
                out.write(constant, TextTag::Number);
            }
            out.write_line();
            Ok(())
        })
    }

    fn write_property(&mut self, out: &mut TextWriter<'_>, property: &Arc<PropertyDef>) -> Result<()> {
        self.isolated(out, MemberKind::Property, &property.name, |this, out| {
            this.write_member_annotations(out, &MemberDef::Property(Arc::clone(property)));

            out.write(".property", TextTag::Keyword);
            out.space();
            if property.has_this {
                out.write("instance ", TextTag::Keyword);
            }
            out.write(&property.property_type, TextTag::Type);
            out.space();
            out.write(&property.name, TextTag::Member);
            write_params(out, &property.params, true);
            out.write_line();

            out.open_brace();
            let accessors = [(".get", &property.getter), (".set", &property.setter)];
            for (directive, accessor) in accessors {
                if let Some(accessor) = accessor {
                    write_semantics(out, directive, accessor);
                }
            }
            for accessor in &property.other {
                write_semantics(out, ".other", accessor);
            }
            out.close_brace(Some(&format!(
                "end of property {}::{}",
                property.declaring_type, property.name
            )));
            Ok(())
        })
    }

    fn write_event(&mut self, out: &mut TextWriter<'_>, event: &Arc<EventDef>) -> Result<()> {
        self.isolated(out, MemberKind::Event, &event.name, |this, out| {
            this.write_member_annotations(out, &MemberDef::Event(Arc::clone(event)));

            out.write(".event", TextTag::Keyword);
            out.space();
            out.write(&event.event_type, TextTag::Type);
            out.space();
            out.write(&event.name, TextTag::Member);
            out.write_line();

            out.open_brace();
            let accessors = [(".addon", &event.add), (".removeon", &event.remove)];
            for (directive, accessor) in accessors {
                if let Some(accessor) = accessor {
                    write_semantics(out, directive, accessor);
                }
            }
            for accessor in &event.other {
                write_semantics(out, ".other", accessor);
            }
            out.close_brace(Some(&format!(
                "end of event {}::{}",
                event.declaring_type, event.name
            )));
            Ok(())
        })
    }

    fn write_type(&mut self, out: &mut TextWriter<'_>, ty: &Arc<TypeDef>) -> Result<()> {
        self.cancel.check()?;
        if std::mem::take(&mut self.separator) {
            out.write_line();
        }
        log::debug!("disassembling type {}", ty.full_name);

        self.write_member_annotations(out, &MemberDef::Type(Arc::clone(ty)));

        out.write(".class", TextTag::Keyword);
        if ty.is_interface() {
            out.write(" interface", TextTag::Keyword);
        }
        for keyword in [
            type_visibility(ty.flags),
            type_layout(ty.flags),
            type_string_format(ty.flags),
        ] {
            out.space();
            out.write(keyword, TextTag::Keyword);
        }
        for (flag, keyword) in TYPE_FLAGS {
            if ty.flags & flag != 0 {
                out.space();
                out.write(keyword, TextTag::Keyword);
            }
        }
        out.space();
        out.write(if ty.is_nested() { &ty.name } else { &ty.full_name }, TextTag::Type);
        out.write_line();

        out.indent();
        if let Some(extends) = &ty.extends {
            out.write("extends ", TextTag::Keyword);
            out.write(extends, TextTag::Type);
            out.write_line();
        }
        if !ty.implements.is_empty() {
            out.write("implements ", TextTag::Keyword);
            for (i, interface) in ty.implements.iter().enumerate() {
                if i > 0 {
                    out.write(", ", TextTag::Punctuation);
                }
                out.write(interface, TextTag::Type);
            }
            out.write_line();
        }
        out.unindent();

        out.open_brace();
        let sort = self.merger.options().sort_members;
        for field in ordered(&ty.fields, sort, |f| &f.name) {
            self.write_field(out, field)?;
            self.separator = true;
        }
        for method in ordered(&ty.methods, sort, |m| &m.name) {
            self.write_method(out, method)?;
            self.separator = true;
        }
        for property in ordered(&ty.properties, sort, |p| &p.name) {
            self.write_property(out, property)?;
            self.separator = true;
        }
        for event in ordered(&ty.events, sort, |e| &e.name) {
            self.write_event(out, event)?;
            self.separator = true;
        }
        for nested in ordered(&ty.nested_types, sort, |t| &t.name) {
            self.write_type(out, nested)?;
            self.separator = true;
        }
        self.separator = false;

        out.close_brace(Some(&format!("end of class {}", ty.full_name)));
        Ok(())
    }

    fn write_types(&mut self, out: &mut TextWriter<'_>, module: &ModuleDef) -> Result<()> {
        let previous = self.entry_point;
        self.entry_point = module.entry_point.as_ref().map(|method| method.token);

        let result = module.types.iter().try_for_each(|ty| {
            self.separator = true;
            self.write_type(out, ty)
        });

        self.entry_point = previous;
        result
    }

    fn write_module_header(&mut self, out: &mut TextWriter<'_>, module: &ModuleDef) {
        out.write(".module", TextTag::Keyword);
        out.space();
        out.write(&module.name, TextTag::Text);
        out.write_line();
        out.comment_line(&format!("MVID: {{{}}}", guid_text(module.mvid)));
        self.report.members_written += 1;
    }

    fn write_assembly_header(&mut self, out: &mut TextWriter<'_>, assembly: &AssemblyDef) {
        out.write(".assembly", TextTag::Keyword);
        out.space();
        out.write(&assembly.name, TextTag::Text);
        out.write_line();

        out.open_brace();
        if let Some(token) = &assembly.public_key_token {
            out.write(".publickeytoken", TextTag::Keyword);
            out.write(" = (", TextTag::Punctuation);
            let bytes: Vec<String> = token.iter().map(|b| format!("{b:02X}")).collect();
            out.write(&bytes.join(" "), TextTag::Number);
            out.write(")", TextTag::Punctuation);
            out.write_line();
        }
        let [major, minor, build, revision] = assembly.version;
        out.write(".ver", TextTag::Keyword);
        out.space();
        out.write(&format!("{major}:{minor}:{build}:{revision}"), TextTag::Number);
        out.write_line();
        if let Some(culture) = &assembly.culture {
            out.write(".locale", TextTag::Keyword);
            out.space();
            out.write(&format!("'{culture}'"), TextTag::String);
            out.write_line();
        }
        out.close_brace(None);
        self.report.members_written += 1;
    }
}

impl std::fmt::Debug for MemberWriter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemberWriter")
            .field("entry_point", &self.entry_point)
            .field("report", &self.report)
            .finish_non_exhaustive()
    }
}

/// `// location` and `// Entry point: Type.Method`, followed by a blank line
fn write_location(out: &mut TextWriter<'_>, location: &str, entry_point: Option<&MethodDef>) {
    out.comment_line(location);
    if let Some(entry_point) = entry_point {
        out.comment_line(&format!(
            "Entry point: {}.{}",
            entry_point.declaring_type, entry_point.name
        ));
    }
    out.write_line();
}

/// `.get instance int32 Program::get_Count()`
fn write_semantics(out: &mut TextWriter<'_>, directive: &str, accessor: &MethodDef) {
    out.write(directive, TextTag::Keyword);
    out.space();
    write_method_reference(out, accessor);
    out.write_line();
}

/// Members in declaration order, or sorted by name
fn ordered<'t, T>(
    members: &'t [Arc<T>],
    sort: bool,
    name: impl Fn(&T) -> &str,
) -> Vec<&'t Arc<T>> {
    let mut members: Vec<&Arc<T>> = members.iter().collect();
    if sort {
        members.sort_by(|&a, &b| name(&**a).cmp(name(&**b)));
    }
    members
}

fn guid_text(guid: Guid) -> String {
    guid.to_string().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        language::DisassemblerOptions,
        metadata::resolver::NullResolver,
        output::StringSink,
        test::{create_method, create_type},
    };

    fn write(member: &MemberDef, options: DisassemblerOptions) -> (String, DisassemblyReport) {
        let cancel = CancellationToken::new();
        let mut sink = StringSink::new();
        let mut writer = MemberWriter::new(AnnotationMerger::new(options), &NullResolver, &cancel);
        {
            let mut out = TextWriter::new(&mut sink);
            writer.write_member(&mut out, member).unwrap();
        }
        (sink.into_string(), writer.into_report())
    }

    #[test]
    fn method_header() {
        let member = MemberDef::Method(create_method("Main", vec![0x2A]));
        let (text, report) = write(&member, DisassemblerOptions::flat());

        assert_eq!(
            text,
            ".method public hidebysig static void Main() cil managed\n\
             {\n\
             \t// Code size 1 (0x1)\n\
             \t.maxstack 8\n\
             \n\
             \tIL_0000: ret\n\
             } // end of method Program::Main\n"
        );
        assert_eq!(report.members_written, 1);
    }

    #[test]
    fn failed_method_becomes_a_comment() {
        let member = MemberDef::Method(create_method("Broken", vec![0x00, 0x24]));
        let (text, report) = write(&member, DisassemblerOptions::structured());

        assert_eq!(
            text,
            "// Failed to disassemble method 'Broken': invalid instruction encoding\n"
        );
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.members_written, 0);
    }

    #[test]
    fn property_with_accessors() {
        let getter = Arc::new(MethodDef {
            name: "get_Count".to_string(),
            return_type: "int32".to_string(),
            // public hidebysig specialname
            flags: 0x0886,
            ..(*create_method("get_Count", vec![0x16, 0x2A])).clone()
        });
        let property = PropertyDef {
            name: "Count".to_string(),
            declaring_type: "Program".to_string(),
            property_type: "int32".to_string(),
            has_this: true,
            getter: Some(getter),
            ..PropertyDef::default()
        };

        let (text, report) = write(&MemberDef::from(property), DisassemblerOptions::flat());
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], ".property instance int32 Count()");
        assert_eq!(lines[2], "\t.get instance int32 Program::get_Count()");
        assert_eq!(lines[3], "} // end of property Program::Count");
        assert_eq!(lines[4], "");
        assert_eq!(
            lines[5],
            ".method public hidebysig specialname instance int32 get_Count() cil managed"
        );
        assert_eq!(report.members_written, 2);
    }

    #[test]
    fn type_members_sorted() {
        let ty = TypeDef {
            token: Token::new(0x0200_0002),
            name: "Program".to_string(),
            full_name: "Ns.Program".to_string(),
            flags: TypeAttributes::PUBLIC | TypeAttributes::BEFORE_FIELD_INIT,
            extends: Some("[mscorlib]System.Object".to_string()),
            methods: vec![create_method("b", vec![0x2A]), create_method("a", vec![0x2A])],
            fields: vec![Arc::new(FieldDef {
                name: "count".to_string(),
                declaring_type: "Ns.Program".to_string(),
                flags: FieldAttributes::PRIVATE | FieldAttributes::STATIC,
                field_type: "int32".to_string(),
                ..FieldDef::default()
            })],
            ..TypeDef::default()
        };

        let options = DisassemblerOptions::flat().with_sorted_members(true);
        let (text, _) = write(&MemberDef::from(ty), options);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], ".class public auto ansi beforefieldinit Ns.Program");
        assert_eq!(lines[1], "\textends [mscorlib]System.Object");
        assert_eq!(lines[2], "{");
        assert_eq!(lines[3], "\t.field private static int32 count");
        assert_eq!(lines[4], "");
        assert!(lines[5].ends_with("void a() cil managed"));
        assert!(text.contains("} // end of method Program::b\n} // end of class Ns.Program\n"));
    }

    #[test]
    fn module_header_and_entry_point() {
        let main = create_method("Main", vec![0x2A]);
        let module = ModuleDef {
            name: "Program.exe".to_string(),
            location: "/bin/Program.exe".to_string(),
            mvid: Guid::ZERO,
            entry_point: Some(Arc::clone(&main)),
            types: vec![create_type("Program", vec![main])],
        };

        let (text, _) = write(&MemberDef::from(module), DisassemblerOptions::flat());
        assert!(text.starts_with(
            "// /bin/Program.exe\n\
             // Entry point: Program.Main\n\
             \n\
             .module Program.exe\n\
             // MVID: {00000000-0000-0000-0000-000000000000}\n\
             \n\
             .class private auto ansi Program\n"
        ));
        assert!(text.contains("\t\t.maxstack 8\n\t\t.entrypoint\n"));
    }

    #[test]
    fn assembly_header() {
        let assembly = AssemblyDef {
            name: "Lib".to_string(),
            version: [1, 2, 3, 4],
            culture: None,
            public_key_token: Some([0xB7, 0x7A, 0x5C, 0x56, 0x19, 0x34, 0xE0, 0x89]),
            manifest_module: Arc::new(ModuleDef {
                name: "Lib.dll".to_string(),
                location: "/bin/Lib.dll".to_string(),
                mvid: Guid::ZERO,
                entry_point: None,
                types: Vec::new(),
            }),
        };

        let (text, _) = write(&MemberDef::from(assembly), DisassemblerOptions::flat());
        assert_eq!(
            text,
            "// /bin/Lib.dll\n\
             \n\
             .assembly Lib\n\
             {\n\
             \t.publickeytoken = (B7 7A 5C 56 19 34 E0 89)\n\
             \t.ver 1:2:3:4\n\
             }\n"
        );
    }

    #[test]
    fn references() {
        let mut sink = StringSink::new();
        {
            let mut out = TextWriter::new(&mut sink);
            write_reference(&mut out, &MemberDef::Method(create_method("Main", vec![0x2A])));
        }
        assert_eq!(sink.as_str(), "void Program::Main()");
    }
}
