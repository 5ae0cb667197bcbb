use bitflags::bitflags;

use crate::metadata::token::Token;

bitflags! {
    /// Exception handler flags defining the kind of exception handling clause.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ExceptionHandlerFlags: u16 {
        /// A typed exception clause.
        ///
        /// The `filter_offset` field holds the metadata token of the caught type.
        const EXCEPTION = 0x0000;
        /// An exception filter and handler clause.
        ///
        /// The `filter_offset` field holds the offset of the filter block.
        const FILTER = 0x0001;
        /// A finally clause
        const FINALLY = 0x0002;
        /// A fault clause (finally that runs only on exception)
        const FAULT = 0x0004;
    }
}

/// A raw exception handling clause, as stored in a method body's data sections.
///
/// No validation happens at this level; see
/// [`crate::analysis::ExceptionRegionTable`] for the normalized form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExceptionHandler {
    /// Clause kind
    pub flags: ExceptionHandlerFlags,
    /// Offset in bytes of the try block from the start of the code
    pub try_offset: u32,
    /// Length in bytes of the try block
    pub try_length: u32,
    /// Location of the handler for this try block
    pub handler_offset: u32,
    /// Size of the handler code in bytes
    pub handler_length: u32,
    /// Class token for typed clauses, filter offset for filter clauses
    pub filter_offset: u32,
}

impl ExceptionHandler {
    /// The caught type of a typed clause
    #[must_use]
    pub fn class_token(&self) -> Token {
        Token(self.filter_offset)
    }

    /// Returns `true` for typed (`catch`) clauses
    #[must_use]
    pub fn is_catch(&self) -> bool {
        !self.flags.intersects(
            ExceptionHandlerFlags::FILTER
                | ExceptionHandlerFlags::FINALLY
                | ExceptionHandlerFlags::FAULT,
        )
    }
}
