//! Per-request rendering context.

use std::ops::{Deref, DerefMut};

use vellum_store::{Document, DocumentReference};

use crate::recursion::RecursionGuard;

/// Privilege-delegation marker: whose rights apply while rendering.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SecurityContext {
    /// Author whose rights apply.
    pub author: String,
    /// Document granting the delegation, if any.
    pub document: Option<DocumentReference>,
}

impl SecurityContext {
    /// Delegate to `author`.
    #[must_use]
    pub fn new(author: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            document: None,
        }
    }

    /// Delegate to the author of `document`, granted by that document.
    ///
    /// `None` when the document records no author.
    #[must_use]
    pub fn of_author(document: &Document) -> Option<Self> {
        let author = document.author()?;
        Some(Self::new(author).with_document(document.reference().clone()))
    }

    /// Record the document granting the delegation.
    #[must_use]
    pub fn with_document(mut self, document: DocumentReference) -> Self {
        self.document = Some(document);
        self
    }
}

/// State of one logical render request.
///
/// Created once per request and threaded through every pipeline call.
/// Nothing in it is visible to other requests; clones share only the
/// recursion history so isolated sub-renders still detect recursion.
#[derive(Clone, Debug)]
pub struct RenderContext {
    /// Document rendering currently happens on behalf of.
    pub current_document: Option<DocumentReference>,
    /// Wiki (tenant) of the current document.
    pub current_wiki: String,
    /// Locale translations are resolved for.
    pub locale: String,
    /// Active privilege delegation.
    pub security: Option<SecurityContext>,
    in_rendering_engine: bool,
    recursion: RecursionGuard,
}

impl RenderContext {
    /// Create the context of a new request.
    #[must_use]
    pub fn new(wiki: impl Into<String>, locale: impl Into<String>) -> Self {
        Self {
            current_document: None,
            current_wiki: wiki.into(),
            locale: locale.into(),
            security: None,
            in_rendering_engine: false,
            recursion: RecursionGuard::new(),
        }
    }

    /// Set the current document and its wiki.
    #[must_use]
    pub fn with_current_document(mut self, reference: DocumentReference) -> Self {
        self.set_current_document(reference);
        self
    }

    /// Make `reference` the current document, switching to its wiki.
    pub fn set_current_document(&mut self, reference: DocumentReference) {
        reference.wiki().clone_into(&mut self.current_wiki);
        self.current_document = Some(reference);
    }

    /// Whether a transformation pass is running for this request.
    #[must_use]
    pub fn in_rendering_engine(&self) -> bool {
        self.in_rendering_engine
    }

    pub(crate) fn set_in_rendering_engine(&mut self, value: bool) {
        self.in_rendering_engine = value;
    }

    /// Recursion history of this request.
    #[must_use]
    pub fn recursion(&self) -> &RecursionGuard {
        &self.recursion
    }

    /// Serialized current document, empty when none is set.
    #[must_use]
    pub fn current_document_id(&self) -> String {
        self.current_document
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default()
    }

    /// Value of a context element a cached render depends on.
    ///
    /// Unknown elements have no value.
    #[must_use]
    pub fn element(&self, name: &str) -> Option<String> {
        match name {
            "locale" => Some(self.locale.clone()),
            "wiki" => Some(self.current_wiki.clone()),
            "document" => self.current_document.as_ref().map(ToString::to_string),
            "user" | "author" => self.security.as_ref().map(|s| s.author.clone()),
            _ => None,
        }
    }
}

/// Scoped privilege delegation; restores the previous one when dropped.
pub struct SecurityScope<'a> {
    ctx: &'a mut RenderContext,
    previous: Option<SecurityContext>,
}

impl<'a> SecurityScope<'a> {
    /// Apply `security` to `ctx` until the scope ends.
    pub fn enter(ctx: &'a mut RenderContext, security: SecurityContext) -> Self {
        let previous = ctx.security.replace(security);
        Self { ctx, previous }
    }
}

impl Deref for SecurityScope<'_> {
    type Target = RenderContext;

    fn deref(&self) -> &RenderContext {
        self.ctx
    }
}

impl DerefMut for SecurityScope<'_> {
    fn deref_mut(&mut self) -> &mut RenderContext {
        self.ctx
    }
}

impl Drop for SecurityScope<'_> {
    fn drop(&mut self) {
        self.ctx.security = self.previous.take();
    }
}
