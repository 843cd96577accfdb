//! Deferred rendering by reference.

use std::collections::BTreeSet;

use vellum_store::{Document, DocumentReference};
use vellum_tree::ContentTree;

use crate::context::RenderContext;
use crate::display::Displayer;
use crate::error::DisplayError;
use crate::isolation::with_isolated_reference;
use crate::key::{RenderKey, build_key, is_async_allowed, is_cache_allowed, transformation_id};
use crate::params::DisplayParameters;

/// A render captured by document identity, to be executed later.
///
/// Only the reference is kept: the document is reloaded from the store on
/// execution, inside an isolated context where it is current. The
/// transformation id is fixed at capture time so the deferred render uses
/// the same namespace and key as an immediate one would have.
#[derive(Debug)]
pub struct AsyncExecutor {
    displayer: Displayer,
    reference: DocumentReference,
    params: DisplayParameters,
    transformation_id: String,
    key: Option<RenderKey>,
    async_allowed: bool,
    cache_allowed: bool,
    context_elements: BTreeSet<String>,
}

impl AsyncExecutor {
    pub(crate) fn new(
        displayer: &Displayer,
        ctx: &RenderContext,
        document: &Document,
        params: DisplayParameters,
    ) -> Self {
        let tid = transformation_id(ctx, document, &params);
        let key = build_key(document, &params, &tid);
        Self {
            displayer: displayer.clone(),
            reference: document.reference().clone(),
            async_allowed: is_async_allowed(document, &params),
            cache_allowed: is_cache_allowed(document),
            context_elements: document.async_properties().context_elements.clone(),
            params,
            transformation_id: tid,
            key,
        }
    }

    #[must_use]
    pub fn reference(&self) -> &DocumentReference {
        &self.reference
    }

    /// Render key; `None` means the render must run synchronously.
    #[must_use]
    pub fn key(&self) -> Option<&RenderKey> {
        self.key.as_ref()
    }

    #[must_use]
    pub fn transformation_id(&self) -> &str {
        &self.transformation_id
    }

    #[must_use]
    pub fn is_async_allowed(&self) -> bool {
        self.key.is_some() && self.async_allowed
    }

    #[must_use]
    pub fn is_cache_allowed(&self) -> bool {
        self.key.is_some() && self.cache_allowed
    }

    /// Context elements the caller must snapshot before deferring.
    #[must_use]
    pub fn context_elements(&self) -> &BTreeSet<String> {
        &self.context_elements
    }

    /// Load the document and render it with the captured parameters.
    ///
    /// # Errors
    ///
    /// Returns [`DisplayError::Rendering`] wrapping the store or render
    /// failure.
    pub fn execute(&self, ctx: &mut RenderContext) -> Result<ContentTree, DisplayError> {
        tracing::debug!(document = %self.reference, "Executing deferred render");
        with_isolated_reference(ctx, &self.reference, |ctx| {
            let document = self.displayer.store().get_document(&self.reference)?;
            if self.params.title_displayed {
                self.displayer.resolve_title(ctx, &document, &self.params)
            } else {
                self.displayer
                    .render_content(ctx, &document, &self.params, &self.transformation_id)
            }
        })
    }
}
