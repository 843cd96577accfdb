//! Title resolution.
//!
//! A title is computed by an ordered fallback chain, first success wins:
//!
//! 1. recursion check, short-circuiting to the static title,
//! 2. the evaluated `title` field,
//! 3. extraction from the first heading (only when enabled in settings),
//! 4. the document name as plain text.
//!
//! Extraction in step 3 is dispatched per syntax through [`TitleExtractors`].

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use vellum_store::Document;
use vellum_tree::{ContentTree, Syntax, parse_inline};

use crate::collab::TransformRequest;
use crate::context::RenderContext;
use crate::display::Displayer;
use crate::error::{DisplayError, recover};
use crate::isolation::with_isolated_context;
use crate::key::transformation_id;
use crate::namespace::{EngineScope, MacroNamespace};
use crate::params::DisplayParameters;
use crate::recursion::{Recursion, TITLE};

/// `1 Title`, `1.1 Title`, ... lines of the legacy syntax.
static LEGACY_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(1(?:\.1)*)[ \t]+(.+?)[ \t]*$").expect("invalid legacy heading regex")
});

/// Strategy used to extract a title from content.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TitleExtractor {
    /// First heading of the parsed tree, run through the transformation pass.
    Heading,
    /// First `1 Title` style line of the raw content.
    LegacyHeadingScan,
}

/// Title extraction strategy per syntax.
#[derive(Clone, Debug)]
pub struct TitleExtractors {
    fallback: TitleExtractor,
    by_syntax: HashMap<Syntax, TitleExtractor>,
}

impl Default for TitleExtractors {
    fn default() -> Self {
        Self::new(TitleExtractor::Heading).with(Syntax::legacy(), TitleExtractor::LegacyHeadingScan)
    }
}

impl TitleExtractors {
    /// Table using `fallback` for every syntax.
    #[must_use]
    pub fn new(fallback: TitleExtractor) -> Self {
        Self {
            fallback,
            by_syntax: HashMap::new(),
        }
    }

    /// Use `extractor` for `syntax`.
    #[must_use]
    pub fn with(mut self, syntax: Syntax, extractor: TitleExtractor) -> Self {
        self.by_syntax.insert(syntax, extractor);
        self
    }

    /// Strategy for `syntax`.
    #[must_use]
    pub fn get(&self, syntax: &Syntax) -> TitleExtractor {
        self.by_syntax.get(syntax).copied().unwrap_or(self.fallback)
    }
}

pub(crate) struct TitleResolver<'a> {
    displayer: &'a Displayer,
}

impl<'a> TitleResolver<'a> {
    pub(crate) fn new(displayer: &'a Displayer) -> Self {
        Self { displayer }
    }

    pub(crate) fn resolve(
        &self,
        ctx: &mut RenderContext,
        document: &Document,
        params: &DisplayParameters,
    ) -> Result<ContentTree, DisplayError> {
        let reference = document.reference();
        let Recursion::Entered(_token) = ctx.recursion().enter(TITLE, reference) else {
            tracing::warn!(document = %reference, "Recursive title display, using static title");
            return Ok(static_title(document));
        };

        let policy = self.displayer.settings().fallback;

        if !document.title().trim().is_empty() {
            let evaluated = self.evaluate_title(ctx, document, params);
            if let Some(title) = recover(policy, evaluated, "Title evaluation", reference)?.flatten()
            {
                return Ok(title);
            }
        }

        if self.displayer.settings().title_from_heading {
            let extracted = self.extract_title(ctx, document, params);
            if let Some(title) = recover(policy, extracted, "Title extraction", reference)?.flatten()
            {
                return Ok(title);
            }
        }

        Ok(static_title(document))
    }

    fn evaluate_title(
        &self,
        ctx: &mut RenderContext,
        document: &Document,
        params: &DisplayParameters,
    ) -> Result<Option<ContentTree>, DisplayError> {
        let namespace = if params.transformation_context_isolated {
            document.reference().to_string()
        } else {
            ctx.current_document_id()
        };
        let evaluator = self.displayer.evaluator();
        let evaluate = |ctx: &mut RenderContext| -> Result<String, DisplayError> {
            Ok(evaluator.evaluate(ctx, document.title(), &namespace)?)
        };

        let evaluated = if params.execution_context_isolated {
            with_isolated_context(ctx, document, evaluate)?
        } else {
            evaluate(ctx)?
        };

        let evaluated = evaluated.trim();
        if evaluated.is_empty() {
            return Ok(None);
        }
        Ok(Some(self.parse_plain(evaluated, document)?))
    }

    fn extract_title(
        &self,
        ctx: &mut RenderContext,
        document: &Document,
        params: &DisplayParameters,
    ) -> Result<Option<ContentTree>, DisplayError> {
        match self.displayer.title_extractors().get(document.syntax()) {
            TitleExtractor::Heading => self.title_from_heading(ctx, document, params),
            TitleExtractor::LegacyHeadingScan => self.title_from_legacy_heading(document),
        }
    }

    fn title_from_heading(
        &self,
        ctx: &mut RenderContext,
        document: &Document,
        params: &DisplayParameters,
    ) -> Result<Option<ContentTree>, DisplayError> {
        let tree = document.tree(self.displayer.parsers())?;
        let max_depth = self.displayer.settings().title_heading_depth;
        let Some(heading) = tree.first_heading() else {
            return Ok(None);
        };
        if heading.heading_level().is_none_or(|level| level > max_depth) {
            return Ok(None);
        }

        let mut title = ContentTree::with_metadata(tree.metadata.clone(), vec![heading.clone()]);
        let tid = transformation_id(ctx, document, params);
        let request = TransformRequest {
            syntax: document.syntax().clone(),
            restricted: params.transformation_context_restricted || document.is_restricted(),
            target_syntax: params.target_syntax.clone(),
            transformation_id: tid,
        };

        let _namespace = MacroNamespace::open(
            self.displayer.evaluator(),
            params.isolates_namespace(),
            ctx.in_rendering_engine(),
            &request.transformation_id,
        );
        {
            let mut engine = EngineScope::enter(ctx);
            self.displayer
                .transformer()
                .transform(&mut engine, &mut title, &request)?;
        }

        match title.children.into_iter().next() {
            Some(block) if block.is_heading() => Ok(Some(ContentTree::new(block.children))),
            _ => Ok(None),
        }
    }

    fn title_from_legacy_heading(
        &self,
        document: &Document,
    ) -> Result<Option<ContentTree>, DisplayError> {
        let Some(captures) = LEGACY_HEADING.captures(document.content()) else {
            return Ok(None);
        };
        let (Some(marker), Some(text)) = (captures.get(1), captures.get(2)) else {
            return Ok(None);
        };

        let depth = marker.as_str().matches('1').count();
        if depth > usize::from(self.displayer.settings().title_heading_depth) {
            return Ok(None);
        }
        let text = text.as_str().trim();
        if text.is_empty() {
            return Ok(None);
        }
        Ok(Some(self.parse_plain(text, document)?))
    }

    /// Parse `text` as a one-line title tree.
    fn parse_plain(&self, text: &str, document: &Document) -> Result<ContentTree, DisplayError> {
        let parsed = self.displayer.parsers().parse(
            text,
            &Syntax::plain(),
            &document.reference().to_string(),
        )?;
        Ok(ContentTree::new(parsed.children))
    }
}

/// The document name as plain inline text.
pub(crate) fn static_title(document: &Document) -> ContentTree {
    ContentTree::new(parse_inline(document.reference().name()))
}
