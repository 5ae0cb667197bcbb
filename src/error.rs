use thiserror::Error;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

macro_rules! decode_error {
    ($offset:expr, $msg:expr) => {
        crate::Error::Decode {
            offset: $offset,
            message: $msg.to_string(),
        }
    };

    ($offset:expr, $fmt:expr, $($arg:tt)*) => {
        crate::Error::Decode {
            offset: $offset,
            message: format!($fmt, $($arg)*),
        }
    };
}

macro_rules! eh_table_error {
    ($msg:expr) => {
        crate::Error::MalformedExceptionTable($msg.to_string())
    };

    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::MalformedExceptionTable(format!($fmt, $($arg)*))
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// The variants fall into two groups. The *member-level* failures ([`Error::Decode`],
/// [`Error::MalformedExceptionTable`], [`Error::UnresolvedBranchTarget`]) describe a single
/// method body that cannot be disassembled; the dispatcher catches them, discards the
/// member's partial output and keeps going with the next member. [`Error::Cancelled`] aborts
/// the whole request and is reported as a status rather than a failure.
///
/// # Error Categories
///
/// ## Bytecode Errors
/// - [`Error::Decode`] - An opcode or operand could not be decoded
/// - [`Error::MalformedExceptionTable`] - Exception clauses violate ordering or nesting rules
/// - [`Error::UnresolvedBranchTarget`] - A branch lands between instruction boundaries
///
/// ## Parsing Errors
/// - [`Error::Malformed`] - Corrupted method header or data section
/// - [`Error::OutOfBounds`] - Attempted to read beyond the end of a buffer
///
/// ## External Errors
/// - [`Error::FileError`] - Filesystem I/O errors
/// - [`Error::XmlError`] - Documentation files that are not well-formed XML
///
/// # Examples
///
/// ```rust
/// use ilscope::{disassembler::decode_stream, metadata::resolver::NullResolver, Error};
///
/// // 0x24 is a reserved opcode slot
/// match decode_stream(&[0x00, 0x24], &NullResolver) {
///     Err(Error::Decode { offset, .. }) => assert_eq!(offset, 1),
///     other => panic!("unexpected result: {other:?}"),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The instruction stream could not be decoded.
    ///
    /// Raised for byte sequences that match no opcode (including reserved slots of both
    /// opcode tables), for token operands the resolver cannot resolve to the required kind
    /// and for buffers that end in the middle of an instruction.
    #[error("Invalid instruction encoding at IL_{offset:04x} - {message}")]
    Decode {
        /// Offset of the instruction that failed to decode
        offset: u32,
        /// Description of the failure
        message: String,
    },

    /// The exception handler table of a method body is inconsistent.
    ///
    /// Raised when a clause violates `try_start < try_end <= handler_start < handler_end`,
    /// two protected ranges partially overlap, a range exceeds the code size or does not
    /// start on an instruction boundary, or a catch type cannot be resolved.
    #[error("Malformed exception handler table - {0}")]
    MalformedExceptionTable(String),

    /// A branch or switch target does not land on an instruction boundary.
    #[error("Branch at IL_{offset:04x} targets {target:#x}, which is not an instruction boundary")]
    UnresolvedBranchTarget {
        /// Offset of the branching instruction
        offset: u32,
        /// The computed target offset
        target: i64,
    },

    /// The request was cancelled through its [`crate::CancellationToken`].
    #[error("The operation was cancelled")]
    Cancelled,

    /// The data is damaged and could not be parsed.
    ///
    /// The error includes the source location where the malformation was detected
    /// for debugging purposes.
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An out of bound access was attempted while parsing a buffer.
    #[error("Out of Bound read would have occurred!")]
    OutOfBounds,

    /// File I/O error.
    ///
    /// Wraps standard I/O errors that can occur while reading documentation files.
    #[error("{0}")]
    FileError(#[from] std::io::Error),

    /// XML parsing error from the quick-xml crate.
    #[error("{0}")]
    XmlError(#[from] quick_xml::Error),

    /// Graph construction error.
    #[error("{0}")]
    GraphError(String),
}

impl Error {
    /// Short human readable class of this error, used in failure comments.
    #[must_use]
    pub fn failure_class(&self) -> &'static str {
        match self {
            Error::Decode { .. } | Error::OutOfBounds => "invalid instruction encoding",
            Error::MalformedExceptionTable(_) => "malformed exception handler table",
            Error::UnresolvedBranchTarget { .. } => "unresolved branch target",
            Error::Cancelled => "cancelled",
            Error::Malformed { .. } => "malformed method body",
            Error::FileError(_) | Error::XmlError(_) => "unreadable input",
            Error::GraphError(_) => "invalid control flow graph",
        }
    }

    /// Returns `true` for [`Error::Cancelled`].
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_macro_captures_location() {
        let error = malformed_error!("bad header {}", 3);
        match error {
            Error::Malformed {
                message, file, line, ..
            } => {
                assert_eq!(message, "bad header 3");
                assert!(file.ends_with("error.rs"));
                assert!(line > 0);
            }
            other => panic!("unexpected variant {other:?}"),
        }
    }

    #[test]
    fn failure_classes() {
        assert_eq!(
            decode_error!(4, "reserved opcode").failure_class(),
            "invalid instruction encoding"
        );
        assert_eq!(
            eh_table_error!("overlap").failure_class(),
            "malformed exception handler table"
        );
        assert_eq!(
            Error::UnresolvedBranchTarget {
                offset: 0,
                target: 3
            }
            .failure_class(),
            "unresolved branch target"
        );
        assert!(Error::Cancelled.is_cancelled());
    }

    #[test]
    fn display_formats_offsets() {
        let error = decode_error!(0x1a, "truncated operand");
        assert_eq!(
            error.to_string(),
            "Invalid instruction encoding at IL_001a - truncated operand"
        );
    }
}
