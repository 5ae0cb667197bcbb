//! Metadata tokens.
//!
//! A token is a 32-bit value whose top byte names a metadata table and whose low 24 bits
//! are a 1-based row index. CIL operands reference types, members, signatures and user
//! strings exclusively through tokens.

use std::fmt;

/// Table id of user string tokens (`ldstr`)
pub const TABLE_USER_STRING: u8 = 0x70;
/// Table id of standalone signature tokens (`calli`, local signatures)
pub const TABLE_STANDALONE_SIG: u8 = 0x11;

/// A metadata token: `table << 24 | row`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Token(pub u32);

impl Token {
    /// Create a token from its raw value
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Token(value)
    }

    /// The raw 32-bit value
    #[must_use]
    pub const fn value(&self) -> u32 {
        self.0
    }

    /// The metadata table this token indexes
    #[must_use]
    pub const fn table(&self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// The 1-based row within [`Token::table`]
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.0 & 0x00FF_FFFF
    }

    /// Returns `true` for the all-zero token
    #[must_use]
    pub const fn is_null(&self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if this token references the user string heap
    #[must_use]
    pub const fn is_user_string(&self) -> bool {
        self.table() == TABLE_USER_STRING
    }
}

impl From<u32> for Token {
    fn from(value: u32) -> Self {
        Token(value)
    }
}

impl From<Token> for u32 {
    fn from(token: Token) -> Self {
        token.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Token(0x{:08x}, table: 0x{:02x}, row: {})",
            self.0,
            self.table(),
            self.row()
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_and_row() {
        let token = Token(0x0600_0001);
        assert_eq!(token.table(), 0x06);
        assert_eq!(token.row(), 1);

        let token = Token(0x06FF_FFFF);
        assert_eq!(token.row(), 0x00FF_FFFF);
    }

    #[test]
    fn null_and_user_string() {
        assert!(Token(0).is_null());
        assert!(!Token(0x0A00_0003).is_null());
        assert!(Token(0x7000_0001).is_user_string());
        assert!(!Token(0x0200_0001).is_user_string());
    }

    #[test]
    fn display_is_uppercase_hex() {
        assert_eq!(Token(0x0a00_000c).to_string(), "0x0A00000C");
        assert_eq!(
            format!("{:?}", Token(0x0200_0005)),
            "Token(0x02000005, table: 0x02, row: 5)"
        );
    }

    #[test]
    fn conversions() {
        let token: Token = 0x0400_0002_u32.into();
        let raw: u32 = token.into();
        assert_eq!(raw, 0x0400_0002);
    }
}
