//! Per-module documentation cache.

use std::sync::{Arc, OnceLock};

use dashmap::DashMap;

use crate::{
    annotations::xmldoc::{DocumentationDocument, DocumentationSource},
    metadata::members::ModuleIdentity,
};

type Slot = Arc<OnceLock<Option<Arc<dyn DocumentationDocument>>>>;

/// Loaded documentation, keyed by module identity.
///
/// Each module's documentation is loaded at most once, even when many requests ask for it
/// concurrently: the first caller loads while the others wait on the same slot. A failed
/// or missing load is cached as "no documentation". The cache lives as long as its owner
/// (usually one [`crate::language::DecompilationContext`] shared by many requests) and is
/// emptied with [`DocumentationCache::teardown`].
///
/// # Examples
///
/// ```rust
/// use ilscope::annotations::{DocumentationCache, XmlFileDocumentationSource};
/// use ilscope::metadata::members::ModuleIdentity;
/// use uguid::Guid;
///
/// let cache = DocumentationCache::new();
/// let module = ModuleIdentity::new("/nonexistent/Lib.dll", Guid::ZERO);
///
/// assert!(cache.get_or_load(&module, &XmlFileDocumentationSource::new()).is_none());
/// assert_eq!(cache.len(), 1);
///
/// cache.teardown();
/// assert!(cache.is_empty());
/// ```
#[derive(Default)]
pub struct DocumentationCache {
    entries: DashMap<ModuleIdentity, Slot>,
}

impl DocumentationCache {
    /// Creates an empty cache
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The documentation of `module`, loading it from `source` on first use
    pub fn get_or_load(
        &self,
        module: &ModuleIdentity,
        source: &dyn DocumentationSource,
    ) -> Option<Arc<dyn DocumentationDocument>> {
        // Clone the slot out so the shard lock is not held while loading
        let slot = self.entries.entry(module.clone()).or_default().clone();

        slot.get_or_init(|| match source.load(module) {
            Ok(document) => document,
            Err(error) => {
                log::warn!("failed to load documentation for {module}: {error}");
                None
            }
        })
        .clone()
    }

    /// Returns `true` once a load for `module` has completed
    #[must_use]
    pub fn is_loaded(&self, module: &ModuleIdentity) -> bool {
        self.entries
            .get(module)
            .is_some_and(|slot| slot.value().get().is_some())
    }

    /// Drops the documentation of `module`, returning `true` if it was cached
    pub fn evict(&self, module: &ModuleIdentity) -> bool {
        self.entries.remove(module).is_some()
    }

    /// Drops all cached documentation
    pub fn teardown(&self) {
        log::debug!("dropping documentation of {} modules", self.entries.len());
        self.entries.clear();
    }

    /// Number of modules with a cache slot
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is cached
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for DocumentationCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentationCache")
            .field("modules", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        thread,
    };

    use uguid::Guid;

    use super::*;
    use crate::{
        annotations::{MemberSignatureKey, XmlDocumentation},
        Error, Result,
    };

    #[derive(Default)]
    struct CountingSource {
        loads: AtomicUsize,
        fail: bool,
    }

    impl DocumentationSource for CountingSource {
        fn load(&self, _module: &ModuleIdentity) -> Result<Option<Arc<dyn DocumentationDocument>>> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(Error::FileError(std::io::Error::other("boom")));
            }
            let document = XmlDocumentation::parse(
                br#"<doc><member name="T:A"><summary>A</summary></member></doc>"#,
            )?;
            Ok(Some(Arc::new(document)))
        }
    }

    fn module(name: &str) -> ModuleIdentity {
        ModuleIdentity::new(name, Guid::ZERO)
    }

    #[test]
    fn loads_once() {
        let cache = DocumentationCache::new();
        let source = CountingSource::default();

        let first = cache.get_or_load(&module("a.dll"), &source).unwrap();
        let second = cache.get_or_load(&module("a.dll"), &source).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert!(first.documentation(&MemberSignatureKey::new("T:A")).is_some());
        assert_eq!(source.loads.load(Ordering::SeqCst), 1);
        assert!(cache.is_loaded(&module("a.dll")));
        assert!(!cache.is_loaded(&module("b.dll")));
    }

    #[test]
    fn concurrent_loads_once() {
        let cache = DocumentationCache::new();
        let source = CountingSource::default();

        thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| cache.get_or_load(&module("a.dll"), &source));
            }
        });

        assert_eq!(source.loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failures_are_cached_as_missing() {
        let cache = DocumentationCache::new();
        let source = CountingSource {
            fail: true,
            ..CountingSource::default()
        };

        assert!(cache.get_or_load(&module("a.dll"), &source).is_none());
        assert!(cache.get_or_load(&module("a.dll"), &source).is_none());
        assert_eq!(source.loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn evict_and_teardown() {
        let cache = DocumentationCache::new();
        let source = CountingSource::default();

        cache.get_or_load(&module("a.dll"), &source);
        cache.get_or_load(&module("b.dll"), &source);
        assert_eq!(cache.len(), 2);

        assert!(cache.evict(&module("a.dll")));
        assert!(!cache.evict(&module("a.dll")));
        cache.get_or_load(&module("a.dll"), &source);
        assert_eq!(source.loads.load(Ordering::SeqCst), 3);

        cache.teardown();
        assert!(cache.is_empty());
    }
}
