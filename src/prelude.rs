//! # ilscope Prelude
//!
//! The types needed to describe members and disassemble them, importable with a single
//! glob.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all ilscope operations
pub use crate::Error;

/// The result type used throughout ilscope
pub use crate::Result;

/// Cooperative cancellation
pub use crate::CancellationToken;

// ================================================================================================
// Member Model
// ================================================================================================

/// Metadata token type for referencing table entries
pub use crate::metadata::token::Token;

/// Members a request can target
pub use crate::metadata::members::{
    AssemblyDef, EventDef, FieldDef, LocalDef, MemberDef, MemberKind, MethodDef, MethodIl,
    ModuleDef, ModuleIdentity, ParamDef, PropertyDef, TypeDef,
};

/// Raw method bodies and exception clauses
pub use crate::metadata::method::{ExceptionHandler, ExceptionHandlerFlags, MethodBody};

/// Operand token resolution
pub use crate::metadata::resolver::{
    FieldRef, MapResolver, MethodRef, NullResolver, TokenResolver, TypeRef,
};

// ================================================================================================
// Disassembly
// ================================================================================================

/// Instruction decoding
pub use crate::disassembler::{decode_stream, FlowType, Instruction, Operand};

/// Control flow and structure recovery
pub use crate::analysis::{
    reduce, ControlFlowGraph, ExceptionRegionTable, IrreducibleRegionWarning, Region, RegionTree,
};

// ================================================================================================
// Annotations and Output
// ================================================================================================

/// Documentation sources and caching
pub use crate::annotations::{
    DocumentationCache, DocumentationDocument, DocumentationSource, XmlDocumentation,
    XmlFileDocumentationSource,
};

/// Sinks receiving rendered text
pub use crate::output::{OutputSink, StringSink, TextTag};

/// The language entry point and its configuration
pub use crate::language::{
    DecompilationContext, DisassemblerOptions, DisassemblyReport, DisassemblyStatus, IlLanguage,
    MemberFailure,
};
