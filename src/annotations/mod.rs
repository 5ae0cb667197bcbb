//! Comments interleaved with the disassembly.
//!
//! Four kinds of commentary can be attached to the output, each gated by its own
//! [`crate::language::DisassemblerOptions`] flag:
//!
//! - opcode descriptions and raw instruction bytes, per instruction
//! - metadata tokens, rows and RVAs, per instruction operand and per member
//! - XML documentation, per member
//!
//! The [`AnnotationMerger`] produces them lazily. Member documentation is looked up by
//! [`MemberSignatureKey`] in a [`DocumentationDocument`], loaded once per module from a
//! [`DocumentationSource`] and held in a [`DocumentationCache`].
//!
//! # Examples
//!
//! ```rust
//! use ilscope::annotations::{AnnotationKind, AnnotationMerger};
//! use ilscope::disassembler::decode_stream;
//! use ilscope::language::DisassemblerOptions;
//! use ilscope::metadata::resolver::NullResolver;
//!
//! let code = [0x17, 0x2A]; // ldc.i4.1; ret
//! let instructions = decode_stream(&code, &NullResolver)?;
//!
//! let merger = AnnotationMerger::new(DisassemblerOptions::default().with_raw_bytes(true));
//! let bytes: Vec<_> = merger.instruction_annotations(&instructions[0], &code).collect();
//!
//! assert_eq!(bytes[0].kind, AnnotationKind::RawBytes);
//! assert_eq!(bytes[0].text, "17");
//! # Ok::<(), ilscope::Error>(())
//! ```

mod annotation;
mod key;
mod merger;
pub mod xmldoc;

pub use annotation::{Annotation, AnnotationKind, AnnotationTarget};
pub use key::MemberSignatureKey;
pub use merger::{AnnotationMerger, InstructionAnnotations, MemberAnnotations};
pub use xmldoc::{
    doc_lines, DocumentationCache, DocumentationDocument, DocumentationSource,
    XmlDocumentation, XmlFileDocumentationSource,
};
