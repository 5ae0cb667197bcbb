//! Cursor-style reader over a byte slice.
//!
//! [`Parser`] tracks a position into a borrowed buffer and exposes bounds-checked
//! little-endian reads, alignment and seeking. The instruction decoder and the method body
//! parser are both built on top of it.
//!
//! # Examples
//!
//! ```rust
//! use ilscope::Parser;
//!
//! let data = [0x2A, 0x10, 0x00, 0x00, 0x00];
//! let mut parser = Parser::new(&data);
//! assert_eq!(parser.read_le::<u8>()?, 0x2A);
//! assert_eq!(parser.read_le::<u32>()?, 0x10);
//! assert!(!parser.has_more_data());
//! # Ok::<(), ilscope::Error>(())
//! ```

use crate::{
    file::io::{read_le_at, CilIO},
    Error::OutOfBounds,
    Result,
};

/// A position-tracking reader over a borrowed byte slice.
///
/// All reads are bounds-checked; a failed read leaves the position unchanged.
pub struct Parser<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> Parser<'a> {
    /// Create a new `Parser` positioned at the start of `data`
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Parser { data, position: 0 }
    }

    /// Total length of the underlying buffer
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the underlying buffer is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns `true` while the position is before the end of the buffer
    #[must_use]
    pub fn has_more_data(&self) -> bool {
        self.position < self.data.len()
    }

    /// Number of bytes left to read
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Move the position to `pos`
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if `pos` is past the end of the buffer.
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.data.len() {
            return Err(OutOfBounds);
        }

        self.position = pos;
        Ok(())
    }

    /// Skip `step` bytes
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if fewer than `step` bytes remain.
    pub fn advance_by(&mut self, step: usize) -> Result<()> {
        if step > self.remaining() {
            return Err(OutOfBounds);
        }

        self.position += step;
        Ok(())
    }

    /// The current position
    #[must_use]
    pub fn pos(&self) -> usize {
        self.position
    }

    /// The underlying buffer
    #[must_use]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Read the byte at the current position without advancing
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] at the end of the buffer.
    pub fn peek_byte(&self) -> Result<u8> {
        self.data.get(self.position).copied().ok_or(OutOfBounds)
    }

    /// Advance the position to the next multiple of `alignment`
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the padding runs past the end of the buffer.
    pub fn align(&mut self, alignment: usize) -> Result<()> {
        let padding = (alignment - (self.position % alignment)) % alignment;
        self.advance_by(padding)
    }

    /// Read a little-endian `T` and advance past it
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the buffer is too short.
    pub fn read_le<T: CilIO>(&mut self) -> Result<T> {
        read_le_at::<T>(self.data, &mut self.position)
    }

    /// Borrow the next `length` bytes and advance past them
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if fewer than `length` bytes remain.
    pub fn read_bytes(&mut self, length: usize) -> Result<&'a [u8]> {
        if length > self.remaining() {
            return Err(OutOfBounds);
        }

        let slice = &self.data[self.position..self.position + length];
        self.position += length;
        Ok(slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_sequence() {
        let data = [0x01, 0x02, 0x00, 0x03, 0x00, 0x00, 0x00];
        let mut parser = Parser::new(&data);

        assert_eq!(parser.read_le::<u8>().unwrap(), 1);
        assert_eq!(parser.read_le::<u16>().unwrap(), 2);
        assert_eq!(parser.read_le::<u32>().unwrap(), 3);
        assert!(!parser.has_more_data());
        assert!(parser.read_le::<u8>().is_err());
    }

    #[test]
    fn seek_and_peek() {
        let data = [0xAA, 0xBB, 0xCC];
        let mut parser = Parser::new(&data);

        parser.seek(2).unwrap();
        assert_eq!(parser.peek_byte().unwrap(), 0xCC);
        assert_eq!(parser.pos(), 2);

        parser.seek(3).unwrap();
        assert!(parser.peek_byte().is_err());
        assert!(parser.seek(4).is_err());
    }

    #[test]
    fn align_to_four() {
        let data = [0u8; 12];
        let mut parser = Parser::new(&data);

        parser.advance_by(5).unwrap();
        parser.align(4).unwrap();
        assert_eq!(parser.pos(), 8);

        parser.align(4).unwrap();
        assert_eq!(parser.pos(), 8);
    }

    #[test]
    fn read_bytes_borrows() {
        let data = [1, 2, 3, 4];
        let mut parser = Parser::new(&data);

        assert_eq!(parser.read_bytes(3).unwrap(), &[1, 2, 3]);
        assert_eq!(parser.remaining(), 1);
        assert!(parser.read_bytes(2).is_err());
        assert_eq!(parser.pos(), 3);
    }
}
