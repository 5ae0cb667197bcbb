//! XML documentation support.
//!
//! - [`DocumentationSource`] finds and loads the documentation of a module
//! - [`DocumentationDocument`] answers lookups by [`crate::annotations::MemberSignatureKey`]
//! - [`DocumentationCache`] loads each module's documentation once and shares it
//! - [`doc_lines`] turns documentation text into comment lines

mod cache;
mod document;
mod lines;
mod source;

pub use cache::DocumentationCache;
pub use document::{DocumentationDocument, XmlDocumentation};
pub use lines::doc_lines;
pub use source::{DocumentationSource, XmlFileDocumentationSource};
