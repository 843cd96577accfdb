//! End-to-end properties of the display pipeline.

use std::sync::{Arc, Mutex, OnceLock};

use pretty_assertions::assert_eq;
use vellum_cache::MemoryCache;
use vellum_display::{
    CachingDisplayer, ContextSnapshot, DisplayError, DisplayParameters, DisplaySettings,
    Displayer, EvaluationError, ExpressionEvaluator, FallbackPolicy, IdentityTransformer,
    LiteralEvaluator, RenderContext, TITLE, TransformError, TransformRequest, Transformer,
};
use vellum_store::{AsyncProperties, Document, DocumentReference, DocumentStore, MockStore};
use vellum_tree::{Block, ContentTree, IdGenerator, MetaData, Syntax};

fn page(name: &str) -> DocumentReference {
    DocumentReference::new("main", ["Space"], name)
}

/// Evaluator whose title expressions display the title of the same document.
#[derive(Default)]
struct SelfTitleEvaluator {
    displayer: OnceLock<Displayer>,
    document: OnceLock<Document>,
    calls: Mutex<usize>,
}

impl ExpressionEvaluator for SelfTitleEvaluator {
    fn evaluate(
        &self,
        ctx: &mut RenderContext,
        _expression: &str,
        _namespace: &str,
    ) -> Result<String, EvaluationError> {
        *self.calls.lock().unwrap() += 1;
        let (Some(displayer), Some(document)) = (self.displayer.get(), self.document.get()) else {
            return Err(EvaluationError::new("not wired"));
        };
        let title = displayer
            .resolve_title(ctx, document, &DisplayParameters::title())
            .map_err(|e| EvaluationError::new("nested title failed").with_source(e))?;
        Ok(format!("Title of {}", title.plain_text()))
    }

    fn start_namespace(&self, _id: &str) -> Result<(), EvaluationError> {
        Ok(())
    }

    fn stop_namespace(&self, _id: &str) -> Result<(), EvaluationError> {
        Ok(())
    }
}

#[test]
fn test_recursive_title_terminates_with_static_title() {
    let evaluator = Arc::new(SelfTitleEvaluator::default());
    let displayer = Displayer::new(
        Arc::new(MockStore::new()),
        Arc::new(IdentityTransformer),
        Arc::clone(&evaluator) as Arc<dyn ExpressionEvaluator>,
    );
    let document = Document::new(page("Loop")).with_title("$self.title");
    evaluator.displayer.set(displayer.clone()).ok();
    evaluator.document.set(document.clone()).ok();
    let mut ctx = RenderContext::new("main", "en");

    let title = displayer
        .display(&mut ctx, &document, &DisplayParameters::title())
        .unwrap();

    assert_eq!(title.plain_text(), "Title of Loop");
    assert_eq!(*evaluator.calls.lock().unwrap(), 1);
    assert_eq!(ctx.recursion().depth(TITLE), 0);
}

/// Records the ambient state seen by each transformation, optionally failing.
struct ObservingTransformer {
    seen: Mutex<Vec<String>>,
    fail: bool,
}

impl Transformer for ObservingTransformer {
    fn transform(
        &self,
        ctx: &mut RenderContext,
        _tree: &mut ContentTree,
        _request: &TransformRequest,
    ) -> Result<(), TransformError> {
        self.seen.lock().unwrap().push(ctx.current_document_id());
        if self.fail {
            return Err(TransformError::new("macro failed"));
        }
        Ok(())
    }
}

#[test]
fn test_isolation_round_trip_on_success_and_failure() {
    for fail in [false, true] {
        let transformer = Arc::new(ObservingTransformer {
            seen: Mutex::new(Vec::new()),
            fail,
        });
        let displayer = Displayer::new(
            Arc::new(MockStore::new()),
            Arc::clone(&transformer) as Arc<dyn Transformer>,
            Arc::new(LiteralEvaluator),
        );
        let document = Document::new(DocumentReference::new("dev", ["Space"], "Target"));
        let mut ctx = RenderContext::new("main", "en").with_current_document(page("Caller"));
        let before = ContextSnapshot::capture(&ctx);

        let result = displayer.display(
            &mut ctx,
            &document,
            &DisplayParameters::default().with_execution_context_isolated(true),
        );

        assert_eq!(result.is_err(), fail);
        assert_eq!(ContextSnapshot::capture(&ctx), before);
        assert_eq!(
            transformer.seen.lock().unwrap().as_slice(),
            ["dev:Space.Target".to_owned()]
        );
    }
}

/// Evaluator counting namespace starts and stops.
#[derive(Default)]
struct CountingEvaluator {
    events: Mutex<Vec<String>>,
}

impl ExpressionEvaluator for CountingEvaluator {
    fn evaluate(
        &self,
        _ctx: &mut RenderContext,
        expression: &str,
        _namespace: &str,
    ) -> Result<String, EvaluationError> {
        Ok(expression.to_owned())
    }

    fn start_namespace(&self, id: &str) -> Result<(), EvaluationError> {
        self.events.lock().unwrap().push(format!("start {id}"));
        Ok(())
    }

    fn stop_namespace(&self, id: &str) -> Result<(), EvaluationError> {
        self.events.lock().unwrap().push(format!("stop {id}"));
        Ok(())
    }
}

/// Transformer that includes the document being transformed once more.
#[derive(Default)]
struct IncludingTransformer {
    displayer: OnceLock<Displayer>,
    document: OnceLock<Document>,
    depth: Mutex<usize>,
}

impl Transformer for IncludingTransformer {
    fn transform(
        &self,
        ctx: &mut RenderContext,
        tree: &mut ContentTree,
        _request: &TransformRequest,
    ) -> Result<(), TransformError> {
        {
            let mut depth = self.depth.lock().unwrap();
            if *depth > 0 {
                return Ok(());
            }
            *depth += 1;
        }
        let (Some(displayer), Some(document)) = (self.displayer.get(), self.document.get()) else {
            return Err(TransformError::new("not wired"));
        };
        let included = displayer
            .display(ctx, document, &DisplayParameters::default())
            .map_err(|e| TransformError::new("include failed").with_source(e))?;
        tree.children.extend(included.children);
        Ok(())
    }
}

#[test]
fn test_nested_render_opens_namespace_once() {
    let evaluator = Arc::new(CountingEvaluator::default());
    let transformer = Arc::new(IncludingTransformer::default());
    let displayer = Displayer::new(
        Arc::new(MockStore::new()),
        Arc::clone(&transformer) as Arc<dyn Transformer>,
        Arc::clone(&evaluator) as Arc<dyn ExpressionEvaluator>,
    );
    let document = Document::new(page("Include"))
        .with_syntax(Syntax::plain())
        .with_content("x");
    transformer.displayer.set(displayer.clone()).ok();
    transformer.document.set(document.clone()).ok();
    let mut ctx = RenderContext::new("main", "en");

    let tree = displayer
        .display(&mut ctx, &document, &DisplayParameters::default())
        .unwrap();

    assert_eq!(tree.children, vec![Block::word("x"), Block::word("x")]);
    assert_eq!(
        evaluator.events.lock().unwrap().as_slice(),
        ["start main:Space.Include", "stop main:Space.Include"]
    );
    assert!(!ctx.in_rendering_engine());
}

#[test]
fn test_render_key_is_deterministic_and_complete() {
    let displayer = Displayer::new(
        Arc::new(MockStore::new()),
        Arc::new(IdentityTransformer),
        Arc::new(LiteralEvaluator),
    );
    let document = Document::new(page("Keyed")).with_async_properties(AsyncProperties {
        async_allowed: true,
        ..AsyncProperties::default()
    });
    let ctx = RenderContext::new("main", "en").with_current_document(page("Caller"));
    let base = DisplayParameters::default();
    let key = |params: &DisplayParameters| displayer.build_render_key(&ctx, &document, params);

    assert_eq!(key(&base), key(&base.clone()));

    let variants = [
        base.clone().with_section("H1"),
        base.clone().with_target_syntax(Syntax::plain()),
        base.clone().with_content_transformed(false),
        base.clone().with_restricted(true),
        base.clone().with_transformation_context_isolated(false),
    ];
    for variant in &variants {
        assert_ne!(key(variant), key(&base));
    }

    let static_document = Document::new(page("Static"));
    assert!(
        displayer
            .build_render_key(&ctx, &static_document, &base)
            .is_none()
    );
}

#[test]
fn test_section_round_trip() {
    let displayer = Displayer::new(
        Arc::new(MockStore::new()),
        Arc::new(IdentityTransformer),
        Arc::new(LiteralEvaluator),
    );
    let a = Block::paragraph(vec![Block::word("A")]);
    let b = Block::paragraph(vec![Block::word("B")]);
    let heading = Block::heading(1, "H1", vec![Block::word("One")]);
    let metadata = MetaData::new().with(MetaData::BASE, "main:Space.Sections");
    let document = Document::new(page("Sections")).with_tree(ContentTree::with_metadata(
        metadata.clone(),
        vec![Block::section(vec![heading.clone(), a.clone(), b.clone()])],
    ));
    let mut ctx = RenderContext::new("main", "en");

    let section = displayer
        .display(
            &mut ctx,
            &document,
            &DisplayParameters::default().with_section("H1"),
        )
        .unwrap();
    assert_eq!(section.metadata, metadata);
    assert_eq!(section.children, vec![heading, a, b]);

    let err = displayer
        .display(
            &mut ctx,
            &document,
            &DisplayParameters::default().with_section("H99"),
        )
        .unwrap_err();
    assert!(err.is_section_not_found());
}

#[test]
fn test_ids_unique_across_renders_sharing_generator() {
    let displayer = Displayer::new(
        Arc::new(MockStore::new()),
        Arc::new(IdentityTransformer),
        Arc::new(LiteralEvaluator),
    );
    let document = Document::new(page("Ids")).with_tree(ContentTree::new(vec![
        Block::heading(2, "intro", vec![]),
        Block::heading(2, "intro", vec![]),
    ]));
    let params = DisplayParameters::default().with_id_generator(IdGenerator::new());
    let mut ctx = RenderContext::new("main", "en");

    let first = displayer.display(&mut ctx, &document, &params).unwrap();
    let second = displayer
        .display(&mut ctx, &document, &params.clone())
        .unwrap();

    let mut ids: Vec<String> = [first, second]
        .iter()
        .flat_map(|tree| tree.find_all(Block::is_heading))
        .filter_map(|block| block.id.clone())
        .collect();
    assert!(ids.iter().all(|id| !id.trim().is_empty()));
    let count = ids.len();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), count);
    assert_eq!(count, 4);
}

#[test]
fn test_static_title_for_blank_title() {
    let displayer = Displayer::new(
        Arc::new(MockStore::new()),
        Arc::new(IdentityTransformer),
        Arc::new(LiteralEvaluator),
    );
    let document = Document::new(page("WebHome")).with_content("# Welcome");
    let mut ctx = RenderContext::new("main", "en");

    let title = displayer
        .display(&mut ctx, &document, &DisplayParameters::title())
        .unwrap();

    assert_eq!(title.children, vec![Block::word("WebHome")]);
}

#[test]
fn test_translated_content_through_store() {
    let reference = page("Guide");
    let original = Document::new(reference.clone())
        .with_syntax(Syntax::plain())
        .with_content("hello");
    let store = Arc::new(
        MockStore::new()
            .with_document(original.clone())
            .with_translation(
                Document::new(reference.clone())
                    .with_syntax(Syntax::plain())
                    .with_locale("de")
                    .with_content("hallo"),
            ),
    );
    let displayer = Displayer::new(
        Arc::clone(&store) as Arc<dyn DocumentStore>,
        Arc::new(IdentityTransformer),
        Arc::new(LiteralEvaluator),
    );
    let params = DisplayParameters::default().with_content_translated(true);

    let german = displayer
        .display(&mut RenderContext::new("main", "de"), &original, &params)
        .unwrap();
    let english = displayer
        .display(&mut RenderContext::new("main", "en"), &original, &params)
        .unwrap();

    assert_eq!(german.plain_text(), "hallo");
    assert_eq!(english.plain_text(), "hello");
}

#[test]
fn test_strict_policy_surfaces_translation_failure() {
    let reference = page("Broken");
    let document = Document::new(reference.clone()).with_content("text");
    let store = MockStore::new()
        .with_document(document.clone())
        .with_failing_translation(reference, "fr");
    let params = DisplayParameters::default().with_content_translated(true);
    let lenient = Displayer::new(
        Arc::new(store),
        Arc::new(IdentityTransformer),
        Arc::new(LiteralEvaluator),
    );
    let strict = lenient
        .clone()
        .with_settings(DisplaySettings::default().with_fallback(FallbackPolicy::Strict));

    assert!(
        lenient
            .display(&mut RenderContext::new("main", "fr"), &document, &params)
            .is_ok()
    );
    assert!(matches!(
        strict.display(&mut RenderContext::new("main", "fr"), &document, &params),
        Err(DisplayError::Store(_))
    ));
}

#[test]
fn test_caching_displayer_round_trip() {
    let displayer = Displayer::new(
        Arc::new(MockStore::new()),
        Arc::new(IdentityTransformer),
        Arc::new(LiteralEvaluator),
    );
    let caching = CachingDisplayer::new(displayer, &MemoryCache::new());
    let document = |content: &str| {
        Document::new(page("Cached"))
            .with_content(content)
            .with_async_properties(AsyncProperties {
                cache_allowed: true,
                ..AsyncProperties::default()
            })
    };
    let mut ctx = RenderContext::new("main", "en");

    let first = caching
        .display(&mut ctx, &document("# Cached\n\nbody"), &DisplayParameters::default())
        .unwrap();
    let second = caching
        .display(&mut ctx, &document("other"), &DisplayParameters::default())
        .unwrap();

    assert_eq!(first, second);
    assert!(first.find_heading("Hcached").is_some());
}
