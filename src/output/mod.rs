//! Text rendering of disassembled members.
//!
//! Output flows through three layers:
//!
//! - [`OutputSink`] receives tagged text fragments. [`StringSink`] collects them into a
//!   string, [`BufferedSink`] stages one member's output until it is complete.
//! - [`TextWriter`] tracks indentation on top of a sink and knows braces and comments.
//! - [`BodyWriter`] and [`MemberWriter`] render method bodies and member headers.
//!
//! Labels are written as `IL_` followed by at least four lowercase hex digits, and every
//! nested block adds one tab of indentation.

mod body;
mod format;
mod members;
mod sink;
mod writer;

pub use body::BodyWriter;
pub use format::{
    escape_string, float32, float64, label, target_label, write_instruction, write_operand,
    OperandNames,
};
pub use members::{write_reference, MemberWriter};
pub use sink::{BufferedSink, OutputSink, StringSink, TextTag};
pub use writer::{TextWriter, INDENT};
