//! Documentation ids of members.
//!
//! XML documentation files key their `<member name="...">` entries by the ECMA-335 doc id
//! of the member: a one-letter kind prefix, the dotted name of the declaring type and the
//! member name, followed by the parameter types for methods and indexers.
//!
//! ```text
//! T:Ns.Outer.Inner
//! M:Ns.Program.Main(System.String[])
//! M:Ns.Program.#ctor
//! F:Ns.Program.count
//! P:Ns.List.Item(System.Int32)
//! E:Ns.Button.Click
//! ```

use std::fmt;

use crate::metadata::members::{
    EventDef, FieldDef, MemberDef, MethodDef, ParamDef, PropertyDef, TypeDef,
};

/// The documentation id of a member, used to look up its XML documentation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemberSignatureKey(String);

impl MemberSignatureKey {
    /// Wraps an already formatted doc id
    pub fn new(id: impl Into<String>) -> Self {
        MemberSignatureKey(id.into())
    }

    /// The key of `member`, `None` for modules and assemblies
    #[must_use]
    pub fn of(member: &MemberDef) -> Option<Self> {
        match member {
            MemberDef::Method(method) => Some(Self::of_method(method)),
            MemberDef::Field(field) => Some(Self::of_field(field)),
            MemberDef::Property(property) => Some(Self::of_property(property)),
            MemberDef::Event(event) => Some(Self::of_event(event)),
            MemberDef::Type(ty) => Some(Self::of_type(ty)),
            MemberDef::Module(_) | MemberDef::Assembly(_) => None,
        }
    }

    /// `T:` key of a type
    #[must_use]
    pub fn of_type(ty: &TypeDef) -> Self {
        MemberSignatureKey(format!("T:{}", doc_type_name(&ty.full_name)))
    }

    /// `M:` key of a method
    #[must_use]
    pub fn of_method(method: &MethodDef) -> Self {
        let name = method.name.replace('.', "#");
        MemberSignatureKey(format!(
            "M:{}.{}{}",
            doc_type_name(&method.declaring_type),
            name,
            parameter_list(&method.params)
        ))
    }

    /// `F:` key of a field
    #[must_use]
    pub fn of_field(field: &FieldDef) -> Self {
        MemberSignatureKey(format!(
            "F:{}.{}",
            doc_type_name(&field.declaring_type),
            field.name
        ))
    }

    /// `P:` key of a property, with the parameter list of indexers
    #[must_use]
    pub fn of_property(property: &PropertyDef) -> Self {
        MemberSignatureKey(format!(
            "P:{}.{}{}",
            doc_type_name(&property.declaring_type),
            property.name,
            parameter_list(&property.params)
        ))
    }

    /// `E:` key of an event
    #[must_use]
    pub fn of_event(event: &EventDef) -> Self {
        MemberSignatureKey(format!(
            "E:{}.{}",
            doc_type_name(&event.declaring_type),
            event.name
        ))
    }

    /// The doc id
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MemberSignatureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for MemberSignatureKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Converts an IL type name (`[asm]Ns.Outer/Inner`) into its dotted doc form
fn doc_type_name(il_name: &str) -> String {
    let name = il_name
        .strip_prefix("class ")
        .or_else(|| il_name.strip_prefix("valuetype "))
        .unwrap_or(il_name);
    let name = match name.find(']') {
        Some(end) if name.starts_with('[') => &name[end + 1..],
        _ => name,
    };

    name.replace('/', ".")
}

fn parameter_list(params: &[ParamDef]) -> String {
    if params.is_empty() {
        return String::new();
    }

    let types: Vec<&str> = params.iter().map(|p| p.doc_type_name.as_str()).collect();
    format!("({})", types.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_keys() {
        let method = MethodDef {
            name: "Main".to_string(),
            declaring_type: "Ns.Program".to_string(),
            params: vec![ParamDef::new("args", "string[]", "System.String[]")],
            ..MethodDef::default()
        };
        assert_eq!(
            MemberSignatureKey::of_method(&method).as_str(),
            "M:Ns.Program.Main(System.String[])"
        );

        let ctor = MethodDef {
            name: ".ctor".to_string(),
            declaring_type: "Ns.Outer/Inner".to_string(),
            ..MethodDef::default()
        };
        assert_eq!(
            MemberSignatureKey::of_method(&ctor).as_str(),
            "M:Ns.Outer.Inner.#ctor"
        );
    }

    #[test]
    fn type_and_member_keys() {
        let ty = TypeDef {
            full_name: "Ns.Outer/Inner`1".to_string(),
            ..TypeDef::default()
        };
        assert_eq!(MemberSignatureKey::of_type(&ty).as_str(), "T:Ns.Outer.Inner`1");

        let field = FieldDef {
            name: "count".to_string(),
            declaring_type: "[lib]Ns.Program".to_string(),
            ..FieldDef::default()
        };
        assert_eq!(MemberSignatureKey::of_field(&field).as_str(), "F:Ns.Program.count");

        let indexer = PropertyDef {
            name: "Item".to_string(),
            declaring_type: "Ns.List".to_string(),
            params: vec![ParamDef::new("index", "int32", "System.Int32")],
            ..PropertyDef::default()
        };
        assert_eq!(
            MemberSignatureKey::of_property(&indexer).as_str(),
            "P:Ns.List.Item(System.Int32)"
        );

        let event = EventDef {
            name: "Click".to_string(),
            declaring_type: "Ns.Button".to_string(),
            ..EventDef::default()
        };
        assert_eq!(
            MemberSignatureKey::of(&MemberDef::from(event)).unwrap().to_string(),
            "E:Ns.Button.Click"
        );
    }
}
