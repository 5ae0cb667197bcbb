//! Parsed XML documentation files.

use std::{collections::HashMap, fmt, path::Path};

use quick_xml::{events::Event, Reader};

use crate::{annotations::MemberSignatureKey, file::Physical, Result};

/// Documentation of the members of one module.
pub trait DocumentationDocument: Send + Sync + fmt::Debug {
    /// The raw documentation of the member with `key`, `None` if it is undocumented
    fn documentation(&self, key: &MemberSignatureKey) -> Option<&str>;
}

/// A compiler-generated XML documentation file.
///
/// Only the `<member name="...">` entries are kept; their inner markup is stored verbatim
/// and split into comment lines when rendered.
///
/// # Examples
///
/// ```rust
/// use ilscope::annotations::{DocumentationDocument, MemberSignatureKey, XmlDocumentation};
///
/// let xml = br#"<?xml version="1.0"?>
/// <doc>
///     <members>
///         <member name="M:Program.Main">
///             <summary>Entry point.</summary>
///         </member>
///     </members>
/// </doc>"#;
///
/// let document = XmlDocumentation::parse(xml)?;
/// let text = document.documentation(&MemberSignatureKey::new("M:Program.Main"));
/// assert!(text.unwrap().contains("<summary>Entry point.</summary>"));
/// # Ok::<(), ilscope::Error>(())
/// ```
#[derive(Debug, Default)]
pub struct XmlDocumentation {
    members: HashMap<String, String>,
}

impl XmlDocumentation {
    /// Parses the documentation file content in `data`
    ///
    /// # Errors
    /// Returns [`crate::Error::XmlError`] if `data` is not well-formed XML.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(data);
        let mut members = HashMap::new();

        loop {
            match reader.read_event()? {
                Event::Start(start) if start.local_name().as_ref() == b"member" => {
                    let mut name = None;
                    for attribute in start.attributes() {
                        let attribute = attribute.map_err(quick_xml::Error::from)?;
                        if attribute.key.as_ref() == b"name" {
                            name = Some(attribute.unescape_value()?.into_owned());
                        }
                    }

                    let text = reader.read_text(start.name())?;
                    if let Some(name) = name {
                        members.insert(name, text.into_owned());
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(XmlDocumentation { members })
    }

    /// Maps and parses the documentation file at `path`
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the file cannot be read and
    /// [`crate::Error::XmlError`] if it is not well-formed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let file = Physical::new(path)?;
        Self::parse(file.data())
    }

    /// Number of documented members
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns `true` if no member is documented
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl DocumentationDocument for XmlDocumentation {
    fn documentation(&self, key: &MemberSignatureKey) -> Option<&str> {
        self.members.get(key.as_str()).map(String::as_str)
    }
}
