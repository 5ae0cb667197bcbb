//! Token resolution.
//!
//! The disassembler never reads metadata tables itself. Every token operand is handed to a
//! [`TokenResolver`], supplied by the host that owns the metadata model, which turns it into
//! a display-ready reference. [`MapResolver`] is a simple table-backed implementation for
//! hosts that pre-compute their references, and [`NullResolver`] resolves nothing.

use std::{collections::HashMap, fmt};

use crate::metadata::token::Token;

/// A resolved type reference, e.g. `[mscorlib]System.Exception`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRef {
    /// The token this reference was resolved from
    pub token: Token,
    /// Fully qualified IL name, including the resolution scope when external
    pub name: String,
}

impl TypeRef {
    /// Create a new type reference
    pub fn new(token: Token, name: impl Into<String>) -> Self {
        TypeRef {
            token,
            name: name.into(),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A resolved method reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodRef {
    /// The token this reference was resolved from
    pub token: Token,
    /// IL name of the declaring type
    pub declaring_type: String,
    /// Method name
    pub name: String,
    /// IL name of the return type
    pub return_type: String,
    /// IL names of the parameter types
    pub parameter_types: Vec<String>,
    /// `true` for instance methods
    pub has_this: bool,
}

impl fmt::Display for MethodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.has_this {
            f.write_str("instance ")?;
        }
        write!(
            f,
            "{} {}::{}({})",
            self.return_type,
            self.declaring_type,
            self.name,
            self.parameter_types.join(", ")
        )
    }
}

/// A resolved field reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRef {
    /// The token this reference was resolved from
    pub token: Token,
    /// IL name of the declaring type
    pub declaring_type: String,
    /// Field name
    pub name: String,
    /// IL name of the field type
    pub field_type: String,
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}::{}", self.field_type, self.declaring_type, self.name)
    }
}

/// The result of resolving a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedToken {
    /// TypeDef, TypeRef or TypeSpec
    Type(TypeRef),
    /// MethodDef, MemberRef to a method, or MethodSpec
    Method(MethodRef),
    /// Field or MemberRef to a field
    Field(FieldRef),
    /// A user string literal
    String(String),
}

/// Maps metadata tokens to references.
///
/// Implementations must be usable from several threads at once, since independent
/// disassembly requests may run in parallel against the same module.
pub trait TokenResolver: Send + Sync {
    /// Resolve `token`, returning `None` if it does not name anything
    fn resolve(&self, token: Token) -> Option<ResolvedToken>;

    /// Resolve `token` and require a type
    fn resolve_type(&self, token: Token) -> Option<TypeRef> {
        match self.resolve(token)? {
            ResolvedToken::Type(type_ref) => Some(type_ref),
            _ => None,
        }
    }

    /// Resolve `token` and require a method
    fn resolve_method(&self, token: Token) -> Option<MethodRef> {
        match self.resolve(token)? {
            ResolvedToken::Method(method_ref) => Some(method_ref),
            _ => None,
        }
    }

    /// Resolve `token` and require a field
    fn resolve_field(&self, token: Token) -> Option<FieldRef> {
        match self.resolve(token)? {
            ResolvedToken::Field(field_ref) => Some(field_ref),
            _ => None,
        }
    }

    /// Resolve `token` and require a user string
    fn resolve_string(&self, token: Token) -> Option<String> {
        match self.resolve(token)? {
            ResolvedToken::String(value) => Some(value),
            _ => None,
        }
    }
}

/// A resolver that knows no tokens.
///
/// Useful for bodies without token operands, and for tooltips.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullResolver;

impl TokenResolver for NullResolver {
    fn resolve(&self, _token: Token) -> Option<ResolvedToken> {
        None
    }
}

/// A resolver backed by a pre-computed token table.
///
/// ```rust
/// use ilscope::metadata::{resolver::{MapResolver, TokenResolver}, token::Token};
///
/// let resolver = MapResolver::new()
///     .with_type(Token(0x0100_0001), "[mscorlib]System.Object")
///     .with_string(Token(0x7000_0001), "hello");
///
/// assert_eq!(resolver.resolve_string(Token(0x7000_0001)).as_deref(), Some("hello"));
/// assert!(resolver.resolve_method(Token(0x0100_0001)).is_none());
/// ```
#[derive(Debug, Default, Clone)]
pub struct MapResolver {
    entries: HashMap<Token, ResolvedToken>,
}

impl MapResolver {
    /// Create an empty resolver
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an arbitrary resolution
    pub fn insert(&mut self, token: Token, resolved: ResolvedToken) {
        self.entries.insert(token, resolved);
    }

    /// Register a type name
    #[must_use]
    pub fn with_type(mut self, token: Token, name: &str) -> Self {
        self.insert(token, ResolvedToken::Type(TypeRef::new(token, name)));
        self
    }

    /// Register a method reference
    #[must_use]
    pub fn with_method(mut self, method: MethodRef) -> Self {
        self.insert(method.token, ResolvedToken::Method(method));
        self
    }

    /// Register a field reference
    #[must_use]
    pub fn with_field(mut self, field: FieldRef) -> Self {
        self.insert(field.token, ResolvedToken::Field(field));
        self
    }

    /// Register a user string
    #[must_use]
    pub fn with_string(mut self, token: Token, value: &str) -> Self {
        self.insert(token, ResolvedToken::String(value.to_string()));
        self
    }

    /// Number of registered tokens
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no tokens are registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl TokenResolver for MapResolver {
    fn resolve(&self, token: Token) -> Option<ResolvedToken> {
        self.entries.get(&token).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn console_writeline() -> MethodRef {
        MethodRef {
            token: Token(0x0A00_0001),
            declaring_type: "[mscorlib]System.Console".to_string(),
            name: "WriteLine".to_string(),
            return_type: "void".to_string(),
            parameter_types: vec!["string".to_string()],
            has_this: false,
        }
    }

    #[test]
    fn method_display() {
        assert_eq!(
            console_writeline().to_string(),
            "void [mscorlib]System.Console::WriteLine(string)"
        );

        let mut instance = console_writeline();
        instance.has_this = true;
        instance.parameter_types.push("int32".to_string());
        assert_eq!(
            instance.to_string(),
            "instance void [mscorlib]System.Console::WriteLine(string, int32)"
        );
    }

    #[test]
    fn field_display() {
        let field = FieldRef {
            token: Token(0x0400_0001),
            declaring_type: "Program".to_string(),
            name: "counter".to_string(),
            field_type: "int32".to_string(),
        };
        assert_eq!(field.to_string(), "int32 Program::counter");
    }

    #[test]
    fn typed_lookups() {
        let resolver = MapResolver::new()
            .with_method(console_writeline())
            .with_type(Token(0x0100_0002), "[mscorlib]System.Exception");

        assert!(resolver.resolve_method(Token(0x0A00_0001)).is_some());
        assert!(resolver.resolve_type(Token(0x0A00_0001)).is_none());
        assert_eq!(
            resolver.resolve_type(Token(0x0100_0002)).unwrap().name,
            "[mscorlib]System.Exception"
        );
        assert!(NullResolver.resolve(Token(0x0100_0002)).is_none());
        assert_eq!(resolver.len(), 2);
    }
}
