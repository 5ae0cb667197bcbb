//! The IL language: options, request context and the member dispatcher.
//!
//! [`IlLanguage`] is the entry point. It comes in a flat and a structured variant and
//! renders any [`crate::metadata::members::MemberDef`] into an
//! [`crate::output::OutputSink`], returning a [`DisassemblyReport`].

mod context;
mod il;
mod options;
mod report;

pub use context::DecompilationContext;
pub use il::IlLanguage;
pub use options::{DisassemblerOptions, DEFAULT_CANCELLATION_BATCH};
pub use report::{DisassemblyReport, DisassemblyStatus, MemberFailure};
