//! Locating documentation for a module.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    annotations::xmldoc::{DocumentationDocument, XmlDocumentation},
    metadata::members::ModuleIdentity,
    Result,
};

/// Loads the documentation of a module.
///
/// A [`crate::annotations::DocumentationCache`] consults its source at most once per
/// module. A missing document is `Ok(None)`; the cache logs errors and treats them as
/// missing documents.
pub trait DocumentationSource: Send + Sync {
    /// Loads the documentation of `module`
    ///
    /// # Errors
    /// Implementation specific; the cache never propagates them.
    fn load(&self, module: &ModuleIdentity) -> Result<Option<Arc<dyn DocumentationDocument>>>;
}

/// Finds `<module>.xml` files next to the module or in a list of reference directories.
#[derive(Debug, Clone, Default)]
pub struct XmlFileDocumentationSource {
    search_paths: Vec<PathBuf>,
}

impl XmlFileDocumentationSource {
    /// A source that only looks next to the module
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a directory searched after the module's own directory
    #[must_use]
    pub fn with_search_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.search_paths.push(path.into());
        self
    }

    /// The documentation file for the module at `location`, if one exists
    #[must_use]
    pub fn locate(&self, location: &str) -> Option<PathBuf> {
        if location.is_empty() {
            return None;
        }

        let module = Path::new(location);
        let beside = module.with_extension("xml");
        if beside.is_file() {
            return Some(beside);
        }

        let file_name = Path::new(module.file_stem()?).with_extension("xml");
        self.search_paths
            .iter()
            .map(|dir| dir.join(&file_name))
            .find(|candidate| candidate.is_file())
    }
}

impl DocumentationSource for XmlFileDocumentationSource {
    fn load(&self, module: &ModuleIdentity) -> Result<Option<Arc<dyn DocumentationDocument>>> {
        let Some(path) = self.locate(&module.location) else {
            log::debug!("no documentation file for {module}");
            return Ok(None);
        };

        log::debug!("loading documentation from {}", path.display());
        let document = XmlDocumentation::from_file(&path)?;
        Ok(Some(Arc::new(document)))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use uguid::Guid;

    use super::*;
    use crate::annotations::MemberSignatureKey;

    const DOC: &str =
        r#"<doc><members><member name="T:Lib.Widget"><summary>W</summary></member></members></doc>"#;

    #[test]
    fn beside_the_module() {
        let dir = tempfile::tempdir().unwrap();
        let module = dir.path().join("Lib.dll");
        fs::write(&module, b"MZ").unwrap();
        fs::write(dir.path().join("Lib.xml"), DOC).unwrap();

        let source = XmlFileDocumentationSource::new();
        let identity = ModuleIdentity::new(module.to_string_lossy(), Guid::ZERO);
        let document = source.load(&identity).unwrap().unwrap();

        assert!(document
            .documentation(&MemberSignatureKey::new("T:Lib.Widget"))
            .is_some());
    }

    #[test]
    fn in_search_path() {
        let modules = tempfile::tempdir().unwrap();
        let reference = tempfile::tempdir().unwrap();
        fs::write(reference.path().join("Lib.xml"), DOC).unwrap();

        let source = XmlFileDocumentationSource::new().with_search_path(reference.path());
        let location = modules.path().join("Lib.dll");
        assert_eq!(
            source.locate(&location.to_string_lossy()),
            Some(reference.path().join("Lib.xml"))
        );
    }

    #[test]
    fn missing_documentation() {
        let source = XmlFileDocumentationSource::new();
        assert!(source.locate("").is_none());

        let identity = ModuleIdentity::new("/nonexistent/ilscope/Lib.dll", Guid::ZERO);
        assert!(source.load(&identity).unwrap().is_none());
    }

    #[test]
    fn unreadable_documentation() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Lib.xml"), "<doc><member name=\"a\">").unwrap();

        let identity = ModuleIdentity::new(dir.path().join("Lib.dll").to_string_lossy(), Guid::ZERO);
        assert!(XmlFileDocumentationSource::new().load(&identity).is_err());
    }
}
