//! Selection of the content tree to render.

use vellum_config::FallbackPolicy;
use vellum_store::{Document, DocumentStore};
use vellum_tree::{ContentTree, IdGenerator, ParserRegistry};

use crate::context::RenderContext;
use crate::error::{DisplayError, recover};
use crate::params::DisplayParameters;

/// Picks own, translated or section content and makes its ids unique.
pub(crate) struct ContentResolver<'a> {
    store: &'a dyn DocumentStore,
    parsers: &'a ParserRegistry,
    fallback: FallbackPolicy,
}

impl<'a> ContentResolver<'a> {
    pub(crate) fn new(
        store: &'a dyn DocumentStore,
        parsers: &'a ParserRegistry,
        fallback: FallbackPolicy,
    ) -> Self {
        Self {
            store,
            parsers,
            fallback,
        }
    }

    /// Resolve the tree `params` ask for.
    ///
    /// # Errors
    ///
    /// Returns [`DisplayError::SectionNotFound`] when the requested section
    /// does not exist, or the parse failure of the document's own content.
    pub(crate) fn resolve(
        &self,
        ctx: &RenderContext,
        document: &Document,
        params: &DisplayParameters,
    ) -> Result<ContentTree, DisplayError> {
        let mut tree = if params.content_translated {
            self.translated_tree(ctx, document)?
        } else {
            document.tree(self.parsers)?
        };

        if let Some(section_id) = &params.section_id {
            tree = tree
                .section(section_id)
                .ok_or_else(|| DisplayError::SectionNotFound {
                    document: document.reference().to_string(),
                    section: section_id.clone(),
                })?;
        }

        if let Some(generator) = &params.id_generator {
            uniquify_ids(&mut tree, generator);
        }

        Ok(tree)
    }

    /// Tree of the translation for the request locale, or the document's own
    /// tree when the translation can't be used.
    fn translated_tree(
        &self,
        ctx: &RenderContext,
        document: &Document,
    ) -> Result<ContentTree, DisplayError> {
        let translated = self.load_translation(ctx, document);
        match recover(
            self.fallback,
            translated,
            "Translation lookup",
            document.reference(),
        )? {
            Some(tree) => Ok(tree),
            None => Ok(document.tree(self.parsers)?),
        }
    }

    fn load_translation(
        &self,
        ctx: &RenderContext,
        document: &Document,
    ) -> Result<ContentTree, DisplayError> {
        let translation = self.store.get_translation(document, &ctx.locale)?;

        // Same language: keep the caller's document so in-memory edits show.
        if translation.real_locale() == document.real_locale() {
            return Ok(document.tree(self.parsers)?);
        }

        if translation.syntax() == document.syntax() {
            Ok(translation.tree(self.parsers)?)
        } else {
            Ok(self.parsers.parse(
                translation.content(),
                document.syntax(),
                &translation.reference().to_string(),
            )?)
        }
    }
}

/// Rewrite every non-blank heading and image id through `generator`.
///
/// The first character is kept as the prefix and the rest is the hint.
pub(crate) fn uniquify_ids(tree: &mut ContentTree, generator: &IdGenerator) {
    tree.for_each_mut(|block| {
        if !block.carries_id() {
            return;
        }
        let Some(id) = block.id.as_deref().filter(|id| !id.trim().is_empty()) else {
            return;
        };
        let mut chars = id.chars();
        let prefix = chars.next().map(String::from).unwrap_or_default();
        let unique = generator.generate_unique_id(&prefix, chars.as_str());
        block.id = Some(unique);
    });
}
