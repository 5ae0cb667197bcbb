use std::{borrow::Cow, fmt};

use strum::Display;

/// What an annotation decorates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnnotationTarget {
    /// The instruction at this offset
    Instruction(u32),
    /// The member whose header is being written
    Member,
}

/// The source of an annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum AnnotationKind {
    /// A line of the member's XML documentation
    XmlDoc,
    /// Metadata token, row and RVA details
    TokenOrRva,
    /// The encoded bytes of an instruction
    RawBytes,
    /// The one-line description of an opcode
    OpcodeDoc,
}

/// Commentary attached to an instruction or member.
///
/// Annotations are rendered as comments and never change what they decorate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    /// What is annotated
    pub target: AnnotationTarget,
    /// Where the text came from
    pub kind: AnnotationKind,
    /// The comment text, without comment markers
    pub text: Cow<'static, str>,
}

impl Annotation {
    /// Create a new annotation
    pub fn new(
        target: AnnotationTarget,
        kind: AnnotationKind,
        text: impl Into<Cow<'static, str>>,
    ) -> Self {
        Annotation {
            target,
            kind,
            text: text.into(),
        }
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
