//! Displayer façade.

use std::fmt;
use std::sync::Arc;

use vellum_config::DisplaySettings;
use vellum_store::{Document, DocumentStore};
use vellum_tree::{ContentTree, ParserRegistry};

use crate::collab::{ExpressionEvaluator, TransformRequest, Transformer};
use crate::content::ContentResolver;
use crate::context::{RenderContext, SecurityContext, SecurityScope};
use crate::error::DisplayError;
use crate::executor::AsyncExecutor;
use crate::isolation::with_isolated_context;
use crate::key::{RenderKey, build_key, transformation_id};
use crate::namespace::{EngineScope, MacroNamespace};
use crate::params::DisplayParameters;
use crate::title::{TitleExtractors, TitleResolver};

/// Renders document content and titles.
///
/// Holds only immutable collaborators and settings; all per-request state
/// lives in the [`RenderContext`] passed to each call, so one displayer can
/// serve concurrent requests.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use vellum_display::{
///     DisplayParameters, Displayer, IdentityTransformer, LiteralEvaluator, RenderContext,
/// };
/// use vellum_store::{Document, DocumentReference, MockStore};
///
/// let displayer = Displayer::new(
///     Arc::new(MockStore::new()),
///     Arc::new(IdentityTransformer),
///     Arc::new(LiteralEvaluator),
/// );
/// let document = Document::new(DocumentReference::new("main", ["Home"], "WebHome"));
/// let mut ctx = RenderContext::new("main", "en");
///
/// let title = displayer
///     .display(&mut ctx, &document, &DisplayParameters::title())
///     .unwrap();
/// assert_eq!(title.plain_text(), "WebHome");
/// ```
#[derive(Clone)]
pub struct Displayer {
    store: Arc<dyn DocumentStore>,
    parsers: ParserRegistry,
    transformer: Arc<dyn Transformer>,
    evaluator: Arc<dyn ExpressionEvaluator>,
    settings: DisplaySettings,
    title_extractors: TitleExtractors,
}

impl Displayer {
    /// Create a displayer with the default parsers and settings.
    #[must_use]
    pub fn new(
        store: Arc<dyn DocumentStore>,
        transformer: Arc<dyn Transformer>,
        evaluator: Arc<dyn ExpressionEvaluator>,
    ) -> Self {
        Self {
            store,
            parsers: ParserRegistry::with_defaults(),
            transformer,
            evaluator,
            settings: DisplaySettings::default(),
            title_extractors: TitleExtractors::default(),
        }
    }

    #[must_use]
    pub fn with_parsers(mut self, parsers: ParserRegistry) -> Self {
        self.parsers = parsers;
        self
    }

    #[must_use]
    pub fn with_settings(mut self, settings: DisplaySettings) -> Self {
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn with_title_extractors(mut self, extractors: TitleExtractors) -> Self {
        self.title_extractors = extractors;
        self
    }

    /// Store documents are loaded from.
    #[must_use]
    pub fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }

    /// Display compatibility settings.
    #[must_use]
    pub fn settings(&self) -> &DisplaySettings {
        &self.settings
    }

    pub(crate) fn parsers(&self) -> &ParserRegistry {
        &self.parsers
    }

    pub(crate) fn transformer(&self) -> &dyn Transformer {
        self.transformer.as_ref()
    }

    pub(crate) fn evaluator(&self) -> &dyn ExpressionEvaluator {
        self.evaluator.as_ref()
    }

    pub(crate) fn title_extractors(&self) -> &TitleExtractors {
        &self.title_extractors
    }

    /// Render the title or the content of `document`, per
    /// [`DisplayParameters::title_displayed`].
    ///
    /// # Errors
    ///
    /// Returns [`DisplayError::SectionNotFound`] for a missing section, and
    /// the wrapped failure of the primary content path (parse,
    /// transformation) that has no fallback.
    pub fn display(
        &self,
        ctx: &mut RenderContext,
        document: &Document,
        params: &DisplayParameters,
    ) -> Result<ContentTree, DisplayError> {
        tracing::debug!(
            document = %document.reference(),
            title = params.title_displayed,
            section = params.section_id.as_deref(),
            "Displaying document"
        );

        if params.title_displayed {
            self.resolve_title(ctx, document, params)
        } else {
            let tid = transformation_id(ctx, document, params);
            self.render_content(ctx, document, params, &tid)
        }
    }

    /// [`display`](Self::display) with `security` applied for the duration
    /// of the call.
    ///
    /// # Errors
    ///
    /// Same as [`display`](Self::display).
    pub fn display_with_security(
        &self,
        ctx: &mut RenderContext,
        document: &Document,
        params: &DisplayParameters,
        security: SecurityContext,
    ) -> Result<ContentTree, DisplayError> {
        let mut scope = SecurityScope::enter(ctx, security);
        self.display(&mut scope, document, params)
    }

    /// Resolve the title of `document` as a one-line tree.
    ///
    /// Evaluation and extraction failures fall back to the next step under
    /// the lenient policy; the document name is always available.
    ///
    /// # Errors
    ///
    /// Only under [`FallbackPolicy::Strict`](crate::FallbackPolicy::Strict).
    pub fn resolve_title(
        &self,
        ctx: &mut RenderContext,
        document: &Document,
        params: &DisplayParameters,
    ) -> Result<ContentTree, DisplayError> {
        TitleResolver::new(self).resolve(ctx, document, params)
    }

    /// Key identifying the content render of `document` with `params`.
    #[must_use]
    pub fn build_render_key(
        &self,
        ctx: &RenderContext,
        document: &Document,
        params: &DisplayParameters,
    ) -> Option<RenderKey> {
        build_key(document, params, &transformation_id(ctx, document, params))
    }

    /// Capture everything needed to run the render later by reference.
    #[must_use]
    pub fn async_executor(
        &self,
        ctx: &RenderContext,
        document: &Document,
        params: DisplayParameters,
    ) -> AsyncExecutor {
        AsyncExecutor::new(self, ctx, document, params)
    }

    /// Content pipeline: namespace, isolation, resolution, transformation.
    ///
    /// Guards are released in reverse order on every path.
    pub(crate) fn render_content(
        &self,
        ctx: &mut RenderContext,
        document: &Document,
        params: &DisplayParameters,
        transformation_id: &str,
    ) -> Result<ContentTree, DisplayError> {
        let _namespace = MacroNamespace::open(
            self.evaluator(),
            params.isolates_namespace(),
            ctx.in_rendering_engine(),
            transformation_id,
        );

        if params.execution_context_isolated {
            with_isolated_context(ctx, document, |ctx| {
                self.resolve_and_transform(ctx, document, params, transformation_id)
            })
        } else {
            self.resolve_and_transform(ctx, document, params, transformation_id)
        }
    }

    fn resolve_and_transform(
        &self,
        ctx: &mut RenderContext,
        document: &Document,
        params: &DisplayParameters,
        transformation_id: &str,
    ) -> Result<ContentTree, DisplayError> {
        let resolver = ContentResolver::new(self.store(), &self.parsers, self.settings.fallback);
        let mut tree = resolver.resolve(ctx, document, params)?;

        if params.content_transformed {
            let request = TransformRequest {
                syntax: document.syntax().clone(),
                restricted: params.transformation_context_restricted || document.is_restricted(),
                target_syntax: params.target_syntax.clone(),
                transformation_id: transformation_id.to_owned(),
            };
            let mut engine = EngineScope::enter(ctx);
            self.transformer.transform(&mut engine, &mut tree, &request)?;
        }

        Ok(tree)
    }
}

impl fmt::Debug for Displayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Displayer")
            .field("parsers", &self.parsers)
            .field("settings", &self.settings)
            .field("title_extractors", &self.title_extractors)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use pretty_assertions::assert_eq;
    use vellum_store::{DocumentReference, MockStore};
    use vellum_tree::{Block, IdGenerator, Syntax};

    use super::*;
    use crate::collab::{IdentityTransformer, LiteralEvaluator, TransformError};
    use crate::isolation::ContextSnapshot;
    use crate::namespace::tests::RecordingEvaluator;

    fn reference() -> DocumentReference {
        DocumentReference::new("main", ["Space"], "Page")
    }

    /// Records requests and the context each transformation ran in.
    #[derive(Default)]
    struct RecordingTransformer {
        seen: Mutex<Vec<(TransformRequest, String, bool, Option<String>)>>,
        fail: bool,
    }

    impl Transformer for RecordingTransformer {
        fn transform(
            &self,
            ctx: &mut RenderContext,
            tree: &mut ContentTree,
            request: &TransformRequest,
        ) -> Result<(), TransformError> {
            self.seen.lock().unwrap().push((
                request.clone(),
                ctx.current_document_id(),
                ctx.in_rendering_engine(),
                ctx.security.as_ref().map(|s| s.author.clone()),
            ));
            if self.fail {
                return Err(TransformError::new("macro exploded"));
            }
            tree.children.push(Block::word("transformed"));
            Ok(())
        }
    }

    fn displayer_with(transformer: Arc<RecordingTransformer>) -> Displayer {
        Displayer::new(Arc::new(MockStore::new()), transformer, Arc::new(LiteralEvaluator))
    }

    #[test]
    fn test_content_is_transformed() {
        let transformer = Arc::new(RecordingTransformer::default());
        let displayer = displayer_with(Arc::clone(&transformer));
        let document = Document::new(reference())
            .with_syntax(Syntax::plain())
            .with_content("hello")
            .with_restricted(true);
        let mut ctx = RenderContext::new("main", "en");

        let tree = displayer
            .display(&mut ctx, &document, &DisplayParameters::default())
            .unwrap();

        assert_eq!(
            tree.children,
            vec![Block::word("hello"), Block::word("transformed")]
        );
        let seen = transformer.seen.lock().unwrap();
        let (request, current, in_engine, _) = &seen[0];
        assert_eq!(request.transformation_id, "main:Space.Page");
        assert!(request.restricted);
        assert_eq!(current, "");
        assert!(*in_engine);
        assert!(!ctx.in_rendering_engine());
    }

    #[test]
    fn test_untransformed_content() {
        let transformer = Arc::new(RecordingTransformer::default());
        let displayer = displayer_with(Arc::clone(&transformer));
        let document = Document::new(reference())
            .with_syntax(Syntax::plain())
            .with_content("hello");
        let mut ctx = RenderContext::new("main", "en");

        let tree = displayer
            .display(
                &mut ctx,
                &document,
                &DisplayParameters::default().with_content_transformed(false),
            )
            .unwrap();

        assert_eq!(tree.children, vec![Block::word("hello")]);
        assert!(transformer.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_isolated_render_sees_target_and_restores() {
        let transformer = Arc::new(RecordingTransformer::default());
        let displayer = displayer_with(Arc::clone(&transformer));
        let document = Document::new(DocumentReference::new("dev", ["Space"], "Page"));
        let mut ctx = RenderContext::new("main", "en")
            .with_current_document(DocumentReference::new("main", ["Home"], "WebHome"));
        let before = ContextSnapshot::capture(&ctx);

        displayer
            .display(
                &mut ctx,
                &document,
                &DisplayParameters::default().with_execution_context_isolated(true),
            )
            .unwrap();

        assert_eq!(transformer.seen.lock().unwrap()[0].1, "dev:Space.Page");
        assert_eq!(ContextSnapshot::capture(&ctx), before);
    }

    #[test]
    fn test_transformation_failure_is_wrapped_when_isolated() {
        let transformer = Arc::new(RecordingTransformer {
            fail: true,
            ..RecordingTransformer::default()
        });
        let displayer = displayer_with(transformer);
        let document = Document::new(reference());
        let mut ctx = RenderContext::new("main", "en");
        let before = ContextSnapshot::capture(&ctx);

        let err = displayer
            .display(
                &mut ctx,
                &document,
                &DisplayParameters::default().with_execution_context_isolated(true),
            )
            .unwrap_err();

        assert!(matches!(err, DisplayError::Rendering { .. }));
        assert!(err.to_string().contains("macro exploded"));
        assert_eq!(ContextSnapshot::capture(&ctx), before);
    }

    #[test]
    fn test_security_scope_applies_and_reverts() {
        let transformer = Arc::new(RecordingTransformer::default());
        let displayer = displayer_with(Arc::clone(&transformer));
        let document = Document::new(reference());
        let mut ctx = RenderContext::new("main", "en");

        displayer
            .display_with_security(
                &mut ctx,
                &document,
                &DisplayParameters::default(),
                SecurityContext::new("alice").with_document(reference()),
            )
            .unwrap();

        assert_eq!(
            transformer.seen.lock().unwrap()[0].3.as_deref(),
            Some("alice")
        );
        assert!(ctx.security.is_none());
    }

    #[test]
    fn test_namespace_opened_around_render() {
        let evaluator = Arc::new(RecordingEvaluator::default());
        let displayer = Displayer::new(
            Arc::new(MockStore::new()),
            Arc::new(IdentityTransformer),
            Arc::clone(&evaluator) as Arc<dyn ExpressionEvaluator>,
        );
        let document = Document::new(reference());
        let mut ctx = RenderContext::new("main", "en");

        displayer
            .display(&mut ctx, &document, &DisplayParameters::default())
            .unwrap();
        displayer
            .display(
                &mut ctx,
                &document,
                &DisplayParameters::default().with_transformation_context_isolated(false),
            )
            .unwrap();

        assert_eq!(
            evaluator.calls(),
            vec!["start main:Space.Page", "stop main:Space.Page"]
        );
    }

    #[test]
    fn test_unique_ids_applied() {
        let displayer = displayer_with(Arc::new(RecordingTransformer::default()));
        let document = Document::new(reference()).with_content("# Intro\n\n# Intro");
        let generator = IdGenerator::new();
        let mut ctx = RenderContext::new("main", "en");

        let tree = displayer
            .display(
                &mut ctx,
                &document,
                &DisplayParameters::default()
                    .with_content_transformed(false)
                    .with_id_generator(generator.clone()),
            )
            .unwrap();

        let ids: Vec<_> = tree
            .find_all(Block::is_heading)
            .into_iter()
            .filter_map(|b| b.id.clone())
            .collect();
        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);
        assert!(ids.iter().all(|id| generator.contains(id)));
    }

    #[test]
    fn test_render_key_uses_transformation_id() {
        let displayer = displayer_with(Arc::new(RecordingTransformer::default()));
        let document = Document::new(reference()).with_async_properties(
            vellum_store::AsyncProperties {
                cache_allowed: true,
                ..vellum_store::AsyncProperties::default()
            },
        );
        let ctx = RenderContext::new("main", "en");

        let key = displayer
            .build_render_key(&ctx, &document, &DisplayParameters::default())
            .unwrap();
        assert_eq!(key.transformation_id, "main:Space.Page");

        let key = displayer
            .build_render_key(
                &ctx,
                &document,
                &DisplayParameters::default().with_transformation_context_isolated(false),
            )
            .unwrap();
        assert_eq!(key.transformation_id, "");
    }
}
