//! Method flags and method body header flags.
//!
//! # Key Types
//! - [`MethodAccessFlags`], [`MethodModifiers`]: `MethodAttributes` split into access and modifiers
//! - [`MethodImplCodeType`], [`MethodImplOptions`]: `MethodImplAttributes`
//! - [`MethodBodyFlags`], [`SectionFlags`]: method body header and data section flags

use bitflags::bitflags;

/// Bitmask for `CODE_TYPE` extraction
pub const METHOD_IMPL_CODE_TYPE_MASK: u16 = 0x0003;
/// Bitmask for `ACCESS` state extraction
pub const METHOD_ACCESS_MASK: u16 = 0x0007;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    /// Method implementation code type flags
    pub struct MethodImplCodeType: u16 {
        /// Method impl is IL
        const IL = 0x0000;
        /// Method impl is native
        const NATIVE = 0x0001;
        /// Method impl is OPTIL
        const OPTIL = 0x0002;
        /// Method impl is provided by the runtime
        const RUNTIME = 0x0003;
    }
}

impl MethodImplCodeType {
    /// Extract the code type from raw `MethodImplAttributes`
    #[must_use]
    pub fn from_impl_flags(flags: u16) -> Self {
        Self::from_bits_truncate(flags & METHOD_IMPL_CODE_TYPE_MASK)
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    /// Method implementation options
    pub struct MethodImplOptions: u16 {
        /// Method is unmanaged
        const UNMANAGED = 0x0004;
        /// Method may not be inlined
        const NO_INLINING = 0x0008;
        /// Method is defined elsewhere
        const FORWARD_REF = 0x0010;
        /// Method is single threaded through the body
        const SYNCHRONIZED = 0x0020;
        /// Method signature is exported exactly as declared
        const PRESERVE_SIG = 0x0080;
        /// Method is implemented by the runtime
        const INTERNAL_CALL = 0x1000;
        /// Method may not be optimized
        const NO_OPTIMIZATION = 0x0040;
        /// Method should be inlined aggressively
        const AGGRESSIVE_INLINING = 0x0100;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    /// Method member access
    pub struct MethodAccessFlags: u16 {
        /// Member not referenceable
        const COMPILER_CONTROLLED = 0x0000;
        /// Accessible only by the parent type
        const PRIVATE = 0x0001;
        /// Accessible by sub-types only in this Assembly
        const FAM_AND_ASSEM = 0x0002;
        /// Accessibly by anyone in the Assembly
        const ASSEM = 0x0003;
        /// Accessible only by type and sub-types
        const FAMILY = 0x0004;
        /// Accessibly by sub-types anywhere, plus anyone in assembly
        const FAM_OR_ASSEM = 0x0005;
        /// Accessibly by anyone who has visibility to this scope
        const PUBLIC = 0x0006;
    }
}

impl MethodAccessFlags {
    /// Extract the access level from raw `MethodAttributes`
    #[must_use]
    pub fn from_method_flags(flags: u16) -> Self {
        Self::from_bits_truncate(flags & METHOD_ACCESS_MASK)
    }

    /// The ilasm keyword for this access level
    #[must_use]
    pub fn keyword(self) -> &'static str {
        match self.bits() {
            0x0001 => "private",
            0x0002 => "famandassem",
            0x0003 => "assembly",
            0x0004 => "family",
            0x0005 => "famorassem",
            0x0006 => "public",
            _ => "privatescope",
        }
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    /// Method modifiers and properties
    pub struct MethodModifiers: u16 {
        /// Defined on type, else per instance
        const STATIC = 0x0010;
        /// Method may not be overridden
        const FINAL = 0x0020;
        /// Method is virtual
        const VIRTUAL = 0x0040;
        /// Method hides by name+sig, else just by name
        const HIDE_BY_SIG = 0x0080;
        /// Method always gets a new slot in the vtable
        const NEW_SLOT = 0x0100;
        /// Method can only be overriden if also accessible
        const STRICT = 0x0200;
        /// Method does not provide an implementation
        const ABSTRACT = 0x0400;
        /// Method is special
        const SPECIAL_NAME = 0x0800;
        /// CLI provides 'special' behavior, depending upon the name of the method
        const RTSPECIAL_NAME = 0x1000;
        /// Implementation is forwarded through PInvoke
        const PINVOKE_IMPL = 0x2000;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    /// Flags of the first header byte(s) of a method body
    pub struct MethodBodyFlags: u16 {
        /// Tiny method header
        const TINY_FORMAT = 0x2;
        /// Fat method header
        const FAT_FORMAT = 0x3;
        /// Extra data sections follow the code
        const MORE_SECTS = 0x8;
        /// Locals are zero-initialized
        const INIT_LOCALS = 0x10;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    /// Flags of a method data section header
    pub struct SectionFlags: u8 {
        /// Exception handling data
        const EHTABLE = 0x1;
        /// Reserved, must be zero
        const OPT_ILTABLE = 0x2;
        /// Clauses use the 24-byte fat layout
        const FAT_FORMAT = 0x40;
        /// Another data section follows this one
        const MORE_SECTS = 0x80;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_extraction() {
        // public static hidebysig
        let raw = 0x0096;
        assert_eq!(
            MethodAccessFlags::from_method_flags(raw),
            MethodAccessFlags::PUBLIC
        );
        assert_eq!(MethodAccessFlags::from_method_flags(raw).keyword(), "public");
        let modifiers = MethodModifiers::from_bits_truncate(raw);
        assert!(modifiers.contains(MethodModifiers::STATIC | MethodModifiers::HIDE_BY_SIG));
        assert!(!modifiers.contains(MethodModifiers::VIRTUAL));
    }

    #[test]
    fn code_type_extraction() {
        assert_eq!(
            MethodImplCodeType::from_impl_flags(0x0003),
            MethodImplCodeType::RUNTIME
        );
        assert_eq!(
            MethodImplCodeType::from_impl_flags(0x0080),
            MethodImplCodeType::IL
        );
    }
}
