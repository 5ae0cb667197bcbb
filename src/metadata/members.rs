//! The member model handed to the disassembler.
//!
//! These are plain data types a host fills in from whatever metadata reader it uses. Type
//! names are carried as ready-to-print IL names (`int32`, `class [mscorlib]System.Object`,
//! `Outer/Inner`), parameter types additionally carry their documentation name
//! (`System.Int32`) so that documentation keys can be derived without a type system.
//!
//! [`MemberDef`] is the closed set of things a disassembly request can target.

use std::{fmt, sync::Arc};

use strum::{Display, EnumIter};
use uguid::Guid;

use crate::{
    metadata::{
        method::{ExceptionHandler, MethodAccessFlags, MethodBody, MethodModifiers},
        token::Token,
    },
    Result,
};

#[allow(non_snake_case)]
/// All possible flags for `FieldAttributes`
pub mod FieldAttributes {
    /// These 3 bits contain one of the following values:
    pub const FIELD_ACCESS_MASK: u16 = 0x0007;
    /// Member not referenceable
    pub const COMPILER_CONTROLLED: u16 = 0x0000;
    /// Accessible only by the parent type
    pub const PRIVATE: u16 = 0x0001;
    /// Accessible by sub-types only in this Assembly
    pub const FAM_AND_ASSEM: u16 = 0x0002;
    /// Accessibly by anyone in the Assembly
    pub const ASSEMBLY: u16 = 0x0003;
    /// Accessible only by type and sub-types
    pub const FAMILY: u16 = 0x0004;
    /// Accessibly by sub-types anywhere, plus anyone in assembly
    pub const FAM_OR_ASSEM: u16 = 0x0005;
    /// Accessibly by anyone who has visibility to this scope
    pub const PUBLIC: u16 = 0x0006;
    /// Defined on type, else per instance
    pub const STATIC: u16 = 0x0010;
    /// Field can only be initialized, not written to after init
    pub const INIT_ONLY: u16 = 0x0020;
    /// Value is compile time constant
    pub const LITERAL: u16 = 0x0040;
    /// Field should not be serialized when type is remoted
    pub const NOT_SERIALIZED: u16 = 0x0080;
    /// Field has RVA
    pub const HAS_FIELD_RVA: u16 = 0x0100;
    /// Field is special
    pub const SPECIAL_NAME: u16 = 0x0200;
    /// CLI provides 'special' behavior, depending upon the name of the field
    pub const RTSPECIAL_NAME: u16 = 0x0400;
}

#[allow(non_snake_case)]
/// All possible flags for `TypeAttributes`
pub mod TypeAttributes {
    /// Mask for extracting type visibility information
    pub const VISIBILITY_MASK: u32 = 0x0000_0007;
    /// Type has no public scope
    pub const NOT_PUBLIC: u32 = 0x0000_0000;
    /// Type has public scope
    pub const PUBLIC: u32 = 0x0000_0001;
    /// Nested type with public visibility
    pub const NESTED_PUBLIC: u32 = 0x0000_0002;
    /// Nested type with private visibility
    pub const NESTED_PRIVATE: u32 = 0x0000_0003;
    /// Nested type with family visibility
    pub const NESTED_FAMILY: u32 = 0x0000_0004;
    /// Nested type with assembly visibility
    pub const NESTED_ASSEMBLY: u32 = 0x0000_0005;
    /// Nested type with family and assembly visibility
    pub const NESTED_FAM_AND_ASSEM: u32 = 0x0000_0006;
    /// Nested type with family or assembly visibility
    pub const NESTED_FAM_OR_ASSEM: u32 = 0x0000_0007;
    /// Mask for extracting class layout information
    pub const LAYOUT_MASK: u32 = 0x0000_0018;
    /// Fields are laid out sequentially
    pub const SEQUENTIAL_LAYOUT: u32 = 0x0000_0008;
    /// Fields are laid out with explicit offsets
    pub const EXPLICIT_LAYOUT: u32 = 0x0000_0010;
    /// Type is an interface
    pub const INTERFACE: u32 = 0x0000_0020;
    /// Class is abstract
    pub const ABSTRACT: u32 = 0x0000_0080;
    /// Class is sealed
    pub const SEALED: u32 = 0x0000_0100;
    /// Class name is special
    pub const SPECIAL_NAME: u32 = 0x0000_0400;
    /// Class is imported
    pub const IMPORT: u32 = 0x0000_1000;
    /// Class is serializable
    pub const SERIALIZABLE: u32 = 0x0000_2000;
    /// Mask for the string format of native interop
    pub const STRING_FORMAT_MASK: u32 = 0x0003_0000;
    /// Strings are marshalled as UNICODE
    pub const UNICODE_CLASS: u32 = 0x0001_0000;
    /// Strings are marshalled automatically
    pub const AUTO_CLASS: u32 = 0x0002_0000;
    /// Type initializer may run before first static field access
    pub const BEFORE_FIELD_INIT: u32 = 0x0010_0000;
}

/// Identity of a loaded module, used as the documentation cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleIdentity {
    /// Path of the module on disk, empty for in-memory modules
    pub location: String,
    /// The module version id
    pub mvid: [u8; 16],
}

impl ModuleIdentity {
    /// Create the identity of a module at `location`
    pub fn new(location: impl Into<String>, mvid: Guid) -> Self {
        ModuleIdentity {
            location: location.into(),
            mvid: mvid.to_bytes(),
        }
    }
}

impl fmt::Display for ModuleIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.location, Guid::from_bytes(self.mvid))
    }
}

/// A method or property parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamDef {
    /// Parameter name
    pub name: String,
    /// IL type name, e.g. `int32`
    pub type_name: String,
    /// Documentation type name, e.g. `System.Int32`
    pub doc_type_name: String,
}

impl ParamDef {
    /// Create a new parameter
    pub fn new(
        name: impl Into<String>,
        type_name: impl Into<String>,
        doc_type_name: impl Into<String>,
    ) -> Self {
        ParamDef {
            name: name.into(),
            type_name: type_name.into(),
            doc_type_name: doc_type_name.into(),
        }
    }
}

/// A local variable slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalDef {
    /// IL type name
    pub type_name: String,
    /// Debug name, when symbols provide one
    pub name: Option<String>,
}

/// The IL of a method, either as stored in the image or already split up by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodIl {
    /// Header, code and data sections exactly as stored at the method's RVA
    Raw(Vec<u8>),
    /// Bare code with the raw exception clauses
    Code {
        /// The IL code
        code: Vec<u8>,
        /// Maximum evaluation stack depth
        max_stack: usize,
        /// Are locals zero-initialized
        init_locals: bool,
        /// Exception clauses in declaration order
        clauses: Vec<ExceptionHandler>,
    },
}

impl MethodIl {
    /// Splits the IL into its header and code.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] or [`crate::Error::OutOfBounds`] if a raw body
    /// has an invalid header or is truncated.
    pub fn parse(&self) -> Result<(MethodBody, &[u8])> {
        match self {
            MethodIl::Raw(data) => {
                let body = MethodBody::from(data)?;
                let code = body.code(data)?;
                Ok((body, code))
            }
            MethodIl::Code {
                code,
                max_stack,
                init_locals,
                clauses,
            } => Ok((
                MethodBody {
                    size_code: code.len(),
                    size_header: 0,
                    local_var_sig_token: Token::default(),
                    max_stack: *max_stack,
                    is_fat: true,
                    is_init_local: *init_locals,
                    is_exception_data: !clauses.is_empty(),
                    exception_handlers: clauses.clone(),
                },
                code,
            )),
        }
    }
}

/// A method definition with its IL.
#[derive(Debug, Clone, Default)]
pub struct MethodDef {
    /// MethodDef token
    pub token: Token,
    /// RVA of the method body, 0 for abstract and runtime methods
    pub rva: u32,
    /// File offset of the method body, when known
    pub file_offset: Option<u32>,
    /// Method name
    pub name: String,
    /// IL name of the declaring type
    pub declaring_type: String,
    /// Raw `MethodAttributes`
    pub flags: u16,
    /// Raw `MethodImplAttributes`
    pub impl_flags: u16,
    /// IL name of the return type
    pub return_type: String,
    /// Parameters, excluding `this`
    pub params: Vec<ParamDef>,
    /// Local variables, as described by the local signature
    pub locals: Vec<LocalDef>,
    /// The IL, `None` for abstract, runtime and P/Invoke methods
    pub body: Option<MethodIl>,
}

impl MethodDef {
    /// The access level of this method
    #[must_use]
    pub fn access(&self) -> MethodAccessFlags {
        MethodAccessFlags::from_method_flags(self.flags)
    }

    /// The modifiers of this method
    #[must_use]
    pub fn modifiers(&self) -> MethodModifiers {
        MethodModifiers::from_bits_truncate(self.flags)
    }

    /// Returns `true` for static methods
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.modifiers().contains(MethodModifiers::STATIC)
    }

    /// Returns `true` for instance and static constructors
    #[must_use]
    pub fn is_constructor(&self) -> bool {
        self.modifiers().contains(MethodModifiers::RTSPECIAL_NAME)
            && (self.name == ".ctor" || self.name == ".cctor")
    }

    /// `DeclaringType::Name`
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}::{}", self.declaring_type, self.name)
    }
}

/// A field definition.
#[derive(Debug, Clone, Default)]
pub struct FieldDef {
    /// Field token
    pub token: Token,
    /// Field name
    pub name: String,
    /// IL name of the declaring type
    pub declaring_type: String,
    /// Raw `FieldAttributes`
    pub flags: u16,
    /// IL name of the field type
    pub field_type: String,
    /// Rendered constant value of literal fields, e.g. `int32(5)`
    pub constant: Option<String>,
    /// RVA of the initial data of fields with `HAS_FIELD_RVA`
    pub rva: Option<u32>,
}

impl FieldDef {
    /// Returns `true` for static fields
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.flags & FieldAttributes::STATIC != 0
    }
}

/// A property with its accessors.
#[derive(Debug, Clone, Default)]
pub struct PropertyDef {
    /// Property token
    pub token: Token,
    /// Property name
    pub name: String,
    /// IL name of the declaring type
    pub declaring_type: String,
    /// IL name of the property type
    pub property_type: String,
    /// `true` for instance properties
    pub has_this: bool,
    /// Indexer parameters
    pub params: Vec<ParamDef>,
    /// The `get` accessor
    pub getter: Option<Arc<MethodDef>>,
    /// The `set` accessor
    pub setter: Option<Arc<MethodDef>>,
    /// Other associated methods
    pub other: Vec<Arc<MethodDef>>,
}

/// An event with its accessors.
#[derive(Debug, Clone, Default)]
pub struct EventDef {
    /// Event token
    pub token: Token,
    /// Event name
    pub name: String,
    /// IL name of the declaring type
    pub declaring_type: String,
    /// IL name of the delegate type
    pub event_type: String,
    /// The `add` accessor
    pub add: Option<Arc<MethodDef>>,
    /// The `remove` accessor
    pub remove: Option<Arc<MethodDef>>,
    /// Other associated methods
    pub other: Vec<Arc<MethodDef>>,
}

/// A type definition with its members.
#[derive(Debug, Clone, Default)]
pub struct TypeDef {
    /// TypeDef token
    pub token: Token,
    /// Namespace, empty for nested types and the global namespace
    pub namespace: String,
    /// Simple name
    pub name: String,
    /// IL name, e.g. `Ns.Outer/Inner`
    pub full_name: String,
    /// Raw `TypeAttributes`
    pub flags: u32,
    /// IL name of the base type
    pub extends: Option<String>,
    /// IL names of the implemented interfaces
    pub implements: Vec<String>,
    /// Fields in declaration order
    pub fields: Vec<Arc<FieldDef>>,
    /// Methods in declaration order
    pub methods: Vec<Arc<MethodDef>>,
    /// Properties in declaration order
    pub properties: Vec<Arc<PropertyDef>>,
    /// Events in declaration order
    pub events: Vec<Arc<EventDef>>,
    /// Nested types in declaration order
    pub nested_types: Vec<Arc<TypeDef>>,
}

impl TypeDef {
    /// Returns `true` for interfaces
    #[must_use]
    pub fn is_interface(&self) -> bool {
        self.flags & TypeAttributes::INTERFACE != 0
    }

    /// Returns `true` for nested types
    #[must_use]
    pub fn is_nested(&self) -> bool {
        self.flags & TypeAttributes::VISIBILITY_MASK > TypeAttributes::PUBLIC
    }
}

/// A module and the types it defines.
#[derive(Debug, Clone)]
pub struct ModuleDef {
    /// Module name, e.g. `Program.exe`
    pub name: String,
    /// Path of the module on disk
    pub location: String,
    /// The module version id
    pub mvid: Guid,
    /// The managed entry point
    pub entry_point: Option<Arc<MethodDef>>,
    /// Types defined in this module, in declaration order
    pub types: Vec<Arc<TypeDef>>,
}

impl ModuleDef {
    /// Identity of this module for documentation caching
    #[must_use]
    pub fn identity(&self) -> ModuleIdentity {
        ModuleIdentity::new(self.location.clone(), self.mvid)
    }
}

/// An assembly and its manifest module.
#[derive(Debug, Clone)]
pub struct AssemblyDef {
    /// Assembly name
    pub name: String,
    /// `major.minor.build.revision`
    pub version: [u16; 4],
    /// Culture, `None` for neutral assemblies
    pub culture: Option<String>,
    /// Public key token, when strong-named
    pub public_key_token: Option<[u8; 8]>,
    /// The manifest module
    pub manifest_module: Arc<ModuleDef>,
}

/// Kind of a [`MemberDef`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum MemberKind {
    /// A method
    Method,
    /// A field
    Field,
    /// A property
    Property,
    /// An event
    Event,
    /// A type
    Type,
    /// A module
    Module,
    /// An assembly
    Assembly,
}

/// Anything a disassembly request can target.
#[derive(Debug, Clone)]
pub enum MemberDef {
    /// A single method
    Method(Arc<MethodDef>),
    /// A single field
    Field(Arc<FieldDef>),
    /// A property and its accessors
    Property(Arc<PropertyDef>),
    /// An event and its accessors
    Event(Arc<EventDef>),
    /// A type and all of its members
    Type(Arc<TypeDef>),
    /// A module header and all of its types
    Module(Arc<ModuleDef>),
    /// An assembly header and the types of its manifest module
    Assembly(Arc<AssemblyDef>),
}

impl MemberDef {
    /// The kind of this member
    #[must_use]
    pub fn kind(&self) -> MemberKind {
        match self {
            MemberDef::Method(_) => MemberKind::Method,
            MemberDef::Field(_) => MemberKind::Field,
            MemberDef::Property(_) => MemberKind::Property,
            MemberDef::Event(_) => MemberKind::Event,
            MemberDef::Type(_) => MemberKind::Type,
            MemberDef::Module(_) => MemberKind::Module,
            MemberDef::Assembly(_) => MemberKind::Assembly,
        }
    }

    /// The simple name of this member
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            MemberDef::Method(method) => &method.name,
            MemberDef::Field(field) => &field.name,
            MemberDef::Property(property) => &property.name,
            MemberDef::Event(event) => &event.name,
            MemberDef::Type(ty) => &ty.name,
            MemberDef::Module(module) => &module.name,
            MemberDef::Assembly(assembly) => &assembly.name,
        }
    }

    /// The name used when sorting members of a type
    #[must_use]
    pub fn sort_key(&self) -> &str {
        self.name()
    }
}

impl From<Arc<MethodDef>> for MemberDef {
    fn from(method: Arc<MethodDef>) -> Self {
        MemberDef::Method(method)
    }
}

impl From<MethodDef> for MemberDef {
    fn from(method: MethodDef) -> Self {
        MemberDef::Method(Arc::new(method))
    }
}

impl From<FieldDef> for MemberDef {
    fn from(field: FieldDef) -> Self {
        MemberDef::Field(Arc::new(field))
    }
}

impl From<PropertyDef> for MemberDef {
    fn from(property: PropertyDef) -> Self {
        MemberDef::Property(Arc::new(property))
    }
}

impl From<EventDef> for MemberDef {
    fn from(event: EventDef) -> Self {
        MemberDef::Event(Arc::new(event))
    }
}

impl From<TypeDef> for MemberDef {
    fn from(ty: TypeDef) -> Self {
        MemberDef::Type(Arc::new(ty))
    }
}

impl From<ModuleDef> for MemberDef {
    fn from(module: ModuleDef) -> Self {
        MemberDef::Module(Arc::new(module))
    }
}

impl From<AssemblyDef> for MemberDef {
    fn from(assembly: AssemblyDef) -> Self {
        MemberDef::Assembly(Arc::new(assembly))
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn method_flags() {
        let method = MethodDef {
            name: ".ctor".to_string(),
            declaring_type: "Program".to_string(),
            // public hidebysig specialname rtspecialname
            flags: 0x1886,
            ..MethodDef::default()
        };

        assert!(method.is_constructor());
        assert!(!method.is_static());
        assert_eq!(method.access(), MethodAccessFlags::PUBLIC);
        assert_eq!(method.full_name(), "Program::.ctor");
    }

    #[test]
    fn raw_and_split_bodies() {
        let raw = MethodIl::Raw(vec![0x12, 0x02, 0x17, 0x58, 0x2A]);
        let (header, code) = raw.parse().unwrap();
        assert_eq!(header.size_header, 1);
        assert_eq!(code, &[0x02, 0x17, 0x58, 0x2A]);

        let split = MethodIl::Code {
            code: vec![0x2A],
            max_stack: 2,
            init_locals: true,
            clauses: Vec::new(),
        };
        let (header, code) = split.parse().unwrap();
        assert_eq!(header.max_stack, 2);
        assert!(header.is_init_local);
        assert!(!header.is_exception_data);
        assert_eq!(code, &[0x2A]);

        assert!(MethodIl::Raw(vec![0x12, 0x02]).parse().is_err());
    }

    #[test]
    fn member_kinds() {
        let member = MemberDef::from(FieldDef {
            name: "count".to_string(),
            flags: FieldAttributes::PRIVATE | FieldAttributes::STATIC,
            ..FieldDef::default()
        });

        assert_eq!(member.kind(), MemberKind::Field);
        assert_eq!(member.name(), "count");
        assert_eq!(MemberKind::Property.to_string(), "property");
        assert_eq!(MemberKind::iter().count(), 7);
    }

    #[test]
    fn type_visibility() {
        let nested = TypeDef {
            flags: TypeAttributes::NESTED_PRIVATE,
            ..TypeDef::default()
        };
        let top = TypeDef {
            flags: TypeAttributes::PUBLIC | TypeAttributes::INTERFACE,
            ..TypeDef::default()
        };

        assert!(nested.is_nested());
        assert!(!top.is_nested());
        assert!(top.is_interface());
    }

    #[test]
    fn module_identity() {
        let module = ModuleDef {
            name: "a.dll".to_string(),
            location: "/tmp/a.dll".to_string(),
            mvid: Guid::ZERO,
            entry_point: None,
            types: Vec::new(),
        };

        assert_eq!(module.identity(), ModuleIdentity::new("/tmp/a.dll", Guid::ZERO));
    }
}
