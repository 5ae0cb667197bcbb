//! The metadata side of disassembly.
//!
//! This crate does not parse metadata tables. Hosts describe the members they want
//! disassembled with the plain data types in [`members`], and resolve operand tokens through
//! a [`resolver::TokenResolver`]. What *is* parsed here is the method body itself: the
//! tiny/fat header and the exception handling sections ([`method`]).

/// The member model: methods, fields, properties, events, types, modules and assemblies
pub mod members;
/// Method body headers and raw exception handling clauses
pub mod method;
/// Token resolution into display-ready references
pub mod resolver;
/// Commonly used metadata token type
pub mod token;
