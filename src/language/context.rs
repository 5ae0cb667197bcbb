//! Everything a disassembly request needs besides the member itself.

use std::sync::Arc;

use crate::{
    annotations::{AnnotationMerger, DocumentationCache, DocumentationSource},
    language::DisassemblerOptions,
    metadata::{
        members::ModuleIdentity,
        resolver::{NullResolver, TokenResolver},
        token::Token,
    },
    CancellationToken,
};

/// The environment of one request.
///
/// A context is cheap to clone; the resolver, the documentation cache and the source are
/// shared. Requests running in parallel should share one cache so that a module's
/// documentation is loaded once.
///
/// # Examples
///
/// ```rust
/// use ilscope::language::{DecompilationContext, DisassemblerOptions};
///
/// let context = DecompilationContext::new(DisassemblerOptions::flat());
/// assert!(!context.options().detect_control_structure);
/// assert!(!context.cancellation().is_cancelled());
/// ```
#[derive(Clone)]
pub struct DecompilationContext {
    options: DisassemblerOptions,
    cancel: CancellationToken,
    resolver: Arc<dyn TokenResolver>,
    documentation: Option<Documentation>,
    entry_point: Option<Token>,
}

#[derive(Clone)]
struct Documentation {
    cache: Arc<DocumentationCache>,
    source: Arc<dyn DocumentationSource>,
    module: ModuleIdentity,
}

impl DecompilationContext {
    /// A context with `options`, no resolver and no documentation
    #[must_use]
    pub fn new(options: DisassemblerOptions) -> Self {
        DecompilationContext {
            options,
            cancel: CancellationToken::new(),
            resolver: Arc::new(NullResolver),
            documentation: None,
            entry_point: None,
        }
    }

    /// Resolves operand tokens through `resolver`
    #[must_use]
    pub fn with_resolver(mut self, resolver: Arc<dyn TokenResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Polls `cancel` while disassembling
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Reads member documentation of `module` from `source`, caching it in `cache`
    #[must_use]
    pub fn with_documentation(
        mut self,
        cache: Arc<DocumentationCache>,
        source: Arc<dyn DocumentationSource>,
        module: ModuleIdentity,
    ) -> Self {
        self.documentation = Some(Documentation {
            cache,
            source,
            module,
        });
        self
    }

    /// Marks the method with token `entry_point` with `.entrypoint`
    #[must_use]
    pub fn with_entry_point(mut self, entry_point: Token) -> Self {
        self.entry_point = Some(entry_point);
        self
    }

    /// The rendering options
    #[must_use]
    pub fn options(&self) -> &DisassemblerOptions {
        &self.options
    }

    /// The token polled for cancellation
    #[must_use]
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// The operand resolver
    #[must_use]
    pub fn resolver(&self) -> &dyn TokenResolver {
        self.resolver.as_ref()
    }

    /// The identity of the module documentation is read for, if any
    #[must_use]
    pub fn module(&self) -> Option<&ModuleIdentity> {
        self.documentation.as_ref().map(|docs| &docs.module)
    }

    /// The entry point token, if one was set
    #[must_use]
    pub fn entry_point(&self) -> Option<Token> {
        self.entry_point
    }

    /// A merger honouring `options` and this context's documentation
    pub(crate) fn merger(&self, options: DisassemblerOptions) -> AnnotationMerger<'_> {
        let merger = AnnotationMerger::new(options);
        match &self.documentation {
            Some(docs) => {
                merger.with_documentation(&docs.cache, docs.source.as_ref(), &docs.module)
            }
            None => merger,
        }
    }
}

impl Default for DecompilationContext {
    fn default() -> Self {
        Self::new(DisassemblerOptions::default())
    }
}

impl std::fmt::Debug for DecompilationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecompilationContext")
            .field("options", &self.options)
            .field("cancelled", &self.cancel.is_cancelled())
            .field("module", &self.module())
            .field("entry_point", &self.entry_point)
            .finish_non_exhaustive()
    }
}
