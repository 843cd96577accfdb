//! Rendering "as if" another document were current.
//!
//! [`IsolatedContext`] captures the ambient state of a [`RenderContext`],
//! switches it to the target document and restores the capture when dropped,
//! whether the wrapped render returned, failed or panicked.

use std::ops::{Deref, DerefMut};

use vellum_store::{Document, DocumentReference};

use crate::context::{RenderContext, SecurityContext};
use crate::error::DisplayError;

/// Backup of the ambient state an isolated render may change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContextSnapshot {
    current_document: Option<DocumentReference>,
    current_wiki: String,
    in_rendering_engine: bool,
    security: Option<SecurityContext>,
}

impl ContextSnapshot {
    /// Capture the ambient state of `ctx`.
    #[must_use]
    pub fn capture(ctx: &RenderContext) -> Self {
        Self {
            current_document: ctx.current_document.clone(),
            current_wiki: ctx.current_wiki.clone(),
            in_rendering_engine: ctx.in_rendering_engine(),
            security: ctx.security.clone(),
        }
    }

    /// Put the captured state back into `ctx`.
    pub fn restore(self, ctx: &mut RenderContext) {
        ctx.current_document = self.current_document;
        ctx.current_wiki = self.current_wiki;
        ctx.set_in_rendering_engine(self.in_rendering_engine);
        ctx.security = self.security;
    }
}

/// A context switched to another document; restored when dropped.
pub struct IsolatedContext<'a> {
    ctx: &'a mut RenderContext,
    snapshot: Option<ContextSnapshot>,
}

impl<'a> IsolatedContext<'a> {
    /// Make `reference` current in `ctx` until the guard is dropped.
    pub fn enter(ctx: &'a mut RenderContext, reference: &DocumentReference) -> Self {
        let snapshot = ContextSnapshot::capture(ctx);
        ctx.set_current_document(reference.clone());
        Self {
            ctx,
            snapshot: Some(snapshot),
        }
    }
}

impl Deref for IsolatedContext<'_> {
    type Target = RenderContext;

    fn deref(&self) -> &RenderContext {
        self.ctx
    }
}

impl DerefMut for IsolatedContext<'_> {
    fn deref_mut(&mut self) -> &mut RenderContext {
        self.ctx
    }
}

impl Drop for IsolatedContext<'_> {
    fn drop(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            snapshot.restore(self.ctx);
        }
    }
}

/// Run `f` with `document` current, wrapping any failure.
///
/// # Errors
///
/// Returns [`DisplayError::Rendering`] carrying whatever `f` failed with.
pub fn with_isolated_context<T>(
    ctx: &mut RenderContext,
    document: &Document,
    f: impl FnOnce(&mut RenderContext) -> Result<T, DisplayError>,
) -> Result<T, DisplayError> {
    with_isolated_reference(ctx, document.reference(), f)
}

/// Run `f` with the document identified by `reference` current.
///
/// Used when only an identity is available, e.g. deferred execution.
///
/// # Errors
///
/// Returns [`DisplayError::Rendering`] carrying whatever `f` failed with.
pub fn with_isolated_reference<T>(
    ctx: &mut RenderContext,
    reference: &DocumentReference,
    f: impl FnOnce(&mut RenderContext) -> Result<T, DisplayError>,
) -> Result<T, DisplayError> {
    let mut isolated = IsolatedContext::enter(ctx, reference);
    f(&mut isolated).map_err(|source| DisplayError::Rendering {
        document: reference.to_string(),
        source: Box::new(source),
    })
}
