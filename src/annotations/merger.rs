//! Producing the annotations of instructions and members.

use std::{fmt::Write, vec};

use crate::{
    annotations::{
        doc_lines, Annotation, AnnotationKind, AnnotationTarget, DocumentationCache,
        DocumentationSource, MemberSignatureKey,
    },
    disassembler::{documentation, Instruction},
    language::DisassemblerOptions,
    metadata::{members::MemberDef, members::ModuleIdentity, token::Token},
};

/// Where member documentation comes from.
#[derive(Clone, Copy)]
struct DocumentationAccess<'a> {
    cache: &'a DocumentationCache,
    source: &'a dyn DocumentationSource,
    module: &'a ModuleIdentity,
}

/// Attaches the enabled annotations to instructions and members.
///
/// Nothing is computed up front: both [`InstructionAnnotations`] and [`MemberAnnotations`]
/// produce their items on demand, and documentation is only loaded when a member's
/// annotations are iterated with [`DisassemblerOptions::show_xml_docs`] enabled. Both
/// iterators are `Clone`, so a writer can restart them.
#[derive(Clone, Copy)]
pub struct AnnotationMerger<'a> {
    options: DisassemblerOptions,
    docs: Option<DocumentationAccess<'a>>,
}

impl<'a> AnnotationMerger<'a> {
    /// A merger without a documentation source
    #[must_use]
    pub fn new(options: DisassemblerOptions) -> Self {
        AnnotationMerger {
            options,
            docs: None,
        }
    }

    /// Looks up member documentation of `module` through `cache` and `source`
    #[must_use]
    pub fn with_documentation(
        mut self,
        cache: &'a DocumentationCache,
        source: &'a dyn DocumentationSource,
        module: &'a ModuleIdentity,
    ) -> Self {
        self.docs = Some(DocumentationAccess {
            cache,
            source,
            module,
        });
        self
    }

    /// The options this merger honours
    #[must_use]
    pub fn options(&self) -> &DisassemblerOptions {
        &self.options
    }

    /// The annotations of `instruction`, whose bytes are taken from `code`
    #[must_use]
    pub fn instruction_annotations<'i>(
        &self,
        instruction: &'i Instruction,
        code: &'i [u8],
    ) -> InstructionAnnotations<'i> {
        InstructionAnnotations {
            instruction,
            code,
            options: self.options,
            stage: InstructionStage::RawBytes,
        }
    }

    /// The annotations written above the header of `member`
    #[must_use]
    pub fn member_annotations<'m>(&self, member: &'m MemberDef) -> MemberAnnotations<'m>
    where
        'a: 'm,
    {
        MemberAnnotations {
            member,
            options: self.options,
            docs: self.docs,
            stage: MemberStage::XmlDoc,
            lines: None,
        }
    }
}

impl std::fmt::Debug for AnnotationMerger<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnnotationMerger")
            .field("options", &self.options)
            .field("documentation", &self.docs.map(|docs| docs.module))
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InstructionStage {
    RawBytes,
    TokenOrRva,
    OpcodeDoc,
    Done,
}

/// Annotations of one instruction: raw bytes, operand token, opcode description.
#[derive(Debug, Clone)]
pub struct InstructionAnnotations<'i> {
    instruction: &'i Instruction,
    code: &'i [u8],
    options: DisassemblerOptions,
    stage: InstructionStage,
}

impl InstructionAnnotations<'_> {
    fn annotation(&self, kind: AnnotationKind, text: String) -> Annotation {
        Annotation::new(AnnotationTarget::Instruction(self.instruction.offset), kind, text)
    }

    fn raw_bytes(&self) -> Option<String> {
        let start = self.instruction.offset as usize;
        let bytes = self.code.get(start..start + self.instruction.size as usize)?;

        let mut text = String::with_capacity(bytes.len() * 3);
        for (i, byte) in bytes.iter().enumerate() {
            if i > 0 {
                text.push(' ');
            }
            let _ = write!(text, "{byte:02X}");
        }
        Some(text)
    }
}

impl Iterator for InstructionAnnotations<'_> {
    type Item = Annotation;

    fn next(&mut self) -> Option<Annotation> {
        loop {
            match self.stage {
                InstructionStage::RawBytes => {
                    self.stage = InstructionStage::TokenOrRva;
                    if self.options.show_raw_bytes {
                        if let Some(text) = self.raw_bytes() {
                            return Some(self.annotation(AnnotationKind::RawBytes, text));
                        }
                    }
                }
                InstructionStage::TokenOrRva => {
                    self.stage = InstructionStage::OpcodeDoc;
                    if self.options.show_token_and_rva_comments {
                        if let Some(token) = self.instruction.operand.token() {
                            return Some(
                                self.annotation(AnnotationKind::TokenOrRva, format!("Token: {token}")),
                            );
                        }
                    }
                }
                InstructionStage::OpcodeDoc => {
                    self.stage = InstructionStage::Done;
                    if self.options.show_opcode_docs {
                        if let Some(doc) = documentation(self.instruction) {
                            return Some(Annotation::new(
                                AnnotationTarget::Instruction(self.instruction.offset),
                                AnnotationKind::OpcodeDoc,
                                doc,
                            ));
                        }
                    }
                }
                InstructionStage::Done => return None,
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MemberStage {
    XmlDoc,
    TokenOrRva,
    Done,
}

/// Annotations above a member header: documentation lines, then the token comment.
#[derive(Clone)]
pub struct MemberAnnotations<'m> {
    member: &'m MemberDef,
    options: DisassemblerOptions,
    docs: Option<DocumentationAccess<'m>>,
    stage: MemberStage,
    lines: Option<vec::IntoIter<String>>,
}

impl MemberAnnotations<'_> {
    fn load_lines(&self) -> Vec<String> {
        let Some(docs) = self.docs else {
            return Vec::new();
        };
        let Some(key) = MemberSignatureKey::of(self.member) else {
            return Vec::new();
        };
        let Some(document) = docs.cache.get_or_load(docs.module, docs.source) else {
            return Vec::new();
        };
        let Some(text) = document.documentation(&key) else {
            return Vec::new();
        };

        doc_lines(text)
            .into_iter()
            .map(|line| {
                if line.is_empty() {
                    line
                } else {
                    format!(" {line}")
                }
            })
            .collect()
    }
}

impl Iterator for MemberAnnotations<'_> {
    type Item = Annotation;

    fn next(&mut self) -> Option<Annotation> {
        loop {
            match self.stage {
                MemberStage::XmlDoc => {
                    if !self.options.show_xml_docs {
                        self.stage = MemberStage::TokenOrRva;
                        continue;
                    }
                    if self.lines.is_none() {
                        self.lines = Some(self.load_lines().into_iter());
                    }
                    match self.lines.as_mut().and_then(Iterator::next) {
                        Some(line) => {
                            return Some(Annotation::new(
                                AnnotationTarget::Member,
                                AnnotationKind::XmlDoc,
                                line,
                            ))
                        }
                        None => self.stage = MemberStage::TokenOrRva,
                    }
                }
                MemberStage::TokenOrRva => {
                    self.stage = MemberStage::Done;
                    if self.options.show_token_and_rva_comments {
                        if let Some(text) = member_token_comment(self.member) {
                            return Some(Annotation::new(
                                AnnotationTarget::Member,
                                AnnotationKind::TokenOrRva,
                                text,
                            ));
                        }
                    }
                }
                MemberStage::Done => return None,
            }
        }
    }
}

impl std::fmt::Debug for MemberAnnotations<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemberAnnotations")
            .field("member", &self.member.name())
            .field("stage", &self.stage)
            .finish_non_exhaustive()
    }
}

fn token_and_row(token: Token) -> String {
    format!("Token: {token} RID: {}", token.row())
}

/// `Token: 0x06000001 RID: 1 RVA: 0x00002050 File Offset: 0x00000250`
fn member_token_comment(member: &MemberDef) -> Option<String> {
    match member {
        MemberDef::Method(method) => {
            let mut text = token_and_row(method.token);
            if method.rva != 0 {
                let _ = write!(text, " RVA: 0x{:08X}", method.rva);
                if let Some(file_offset) = method.file_offset {
                    let _ = write!(text, " File Offset: 0x{file_offset:08X}");
                }
            }
            Some(text)
        }
        MemberDef::Field(field) => {
            let mut text = token_and_row(field.token);
            if let Some(rva) = field.rva {
                let _ = write!(text, " RVA: 0x{rva:08X}");
            }
            Some(text)
        }
        MemberDef::Property(property) => Some(token_and_row(property.token)),
        MemberDef::Event(event) => Some(token_and_row(event.token)),
        MemberDef::Type(ty) => Some(token_and_row(ty.token)),
        MemberDef::Module(_) | MemberDef::Assembly(_) => None,
    }
}
