// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]

//! # ilscope
//!
//! A disassembler for CIL (Common Intermediate Language) method bodies, rendering members
//! of .NET modules as IL text in two modes:
//!
//! - **flat** - one line per instruction, exception clauses listed as trailing comments
//! - **structured** - the same instructions nested into `.try`, `catch`, `filter`,
//!   `finally`, `fault`, `.loop`, `.if` and `.else` blocks recovered from the control flow
//!   graph, with spans that cannot be structured written flat under a warning comment
//!
//! Instructions and member headers can be annotated with raw bytes, metadata tokens and
//! RVAs, opcode descriptions and XML documentation.
//!
//! ## Quick Start
//!
//! ```rust
//! use ilscope::prelude::*;
//!
//! // ldarg.0; ldc.i4.1; add; ret
//! let method = MethodDef {
//!     name: "Increment".to_string(),
//!     declaring_type: "Program".to_string(),
//!     flags: 0x0096,
//!     return_type: "int32".to_string(),
//!     params: vec![ParamDef::new("x", "int32", "System.Int32")],
//!     body: Some(MethodIl::Raw(vec![0x12, 0x02, 0x17, 0x58, 0x2A])),
//!     ..MethodDef::default()
//! };
//!
//! let mut sink = StringSink::new();
//! let report = IlLanguage::structured().decompile(
//!     &MemberDef::from(method),
//!     &mut sink,
//!     &DecompilationContext::default(),
//! );
//!
//! assert!(report.is_clean());
//! assert!(sink.as_str().contains("IL_0002: add"));
//! ```
//!
//! ## Architecture
//!
//! A request runs through a fixed pipeline:
//!
//! 1. [`metadata`] - the member model, method header parsing and token resolution
//! 2. [`disassembler`] - decoding of the byte stream into [`disassembler::Instruction`]s
//! 3. [`analysis`] - exception regions, the control flow graph and structure recovery
//! 4. [`annotations`] - per-instruction and per-member comments
//! 5. [`output`] - rendering into an [`output::OutputSink`]
//!
//! [`language::IlLanguage`] drives the pipeline for any member, isolating failures per
//! member and honouring a [`CancellationToken`].

#[macro_use]
pub(crate) mod error;
pub(crate) mod file;

/// Shared functionality which is used in unit-tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types.
///
/// ```rust
/// use ilscope::prelude::*;
///
/// let language = IlLanguage::flat();
/// assert_eq!(language.file_extension(), ".il");
/// ```
pub mod prelude;

pub mod analysis;
pub mod annotations;
pub mod disassembler;
pub mod language;
pub mod metadata;
pub mod output;
pub mod utils;

/// `ilscope` Result type
///
/// A type alias for `std::result::Result<T, Error>` where the error type is always [`Error`].
///
/// # Examples
///
/// ```rust
/// use ilscope::{Error, Result};
///
/// fn check(code: &[u8]) -> Result<()> {
///     if code.is_empty() {
///         return Err(Error::OutOfBounds);
///     }
///     Ok(())
/// }
///
/// assert!(check(&[]).is_err());
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// `ilscope` Error type
///
/// Every fallible operation of the crate returns this error. See [`Error::failure_class`]
/// for the short description written into failure comments.
pub use error::Error;

/// Cooperative cancellation of running requests
pub use utils::CancellationToken;

/// Cursor over raw bytes, used to decode single instructions
pub use file::parser::Parser;
