//! Render keys and async eligibility.

use std::fmt;

use vellum_store::Document;

use crate::context::RenderContext;
use crate::params::DisplayParameters;

/// Fixed prefix of every content render key.
pub const DISCRIMINATOR: [&str; 3] = ["display", "document", "content"];

/// Namespace and cache identity of a render.
///
/// The target document when the render isolates its macro namespace, the
/// ambient current document otherwise. Compute it once per render and reuse
/// it for both the namespace and the key.
#[must_use]
pub fn transformation_id(
    ctx: &RenderContext,
    document: &Document,
    params: &DisplayParameters,
) -> String {
    if params.isolates_namespace() {
        document.reference().to_string()
    } else {
        ctx.current_document_id()
    }
}

/// Identity of a content render, used for deferred execution and caching.
///
/// Two keys are equal exactly when every input that influences the output
/// is equal.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RenderKey {
    pub document: String,
    pub section: String,
    pub target_syntax: String,
    pub transformation_id: String,
    pub content_transformed: bool,
    pub transformation_context_restricted: bool,
    pub transformation_context_isolated: bool,
}

impl RenderKey {
    /// The key as an ordered tuple of strings, discriminator first.
    #[must_use]
    pub fn parts(&self) -> Vec<String> {
        let mut parts: Vec<String> = DISCRIMINATOR.iter().map(|&s| s.to_owned()).collect();
        parts.extend([
            self.document.clone(),
            self.section.clone(),
            self.target_syntax.clone(),
            self.transformation_id.clone(),
            self.content_transformed.to_string(),
            self.transformation_context_restricted.to_string(),
            self.transformation_context_isolated.to_string(),
        ]);
        parts
    }
}

impl fmt::Display for RenderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", serde_json::Value::from(self.parts()))
    }
}

/// Build the key of rendering `document` with `params`.
///
/// Returns `None` when the document allows neither deferred rendering nor
/// caching; such renders always run synchronously and are never cached.
#[must_use]
pub fn build_key(
    document: &Document,
    params: &DisplayParameters,
    transformation_id: &str,
) -> Option<RenderKey> {
    if document.async_properties().is_static() {
        return None;
    }

    Some(RenderKey {
        document: document.reference().to_string(),
        section: params.section_id.clone().unwrap_or_default(),
        target_syntax: params
            .target_syntax
            .as_ref()
            .map(|s| s.as_str().to_owned())
            .unwrap_or_default(),
        transformation_id: transformation_id.to_owned(),
        content_transformed: params.content_transformed,
        transformation_context_restricted: params.transformation_context_restricted,
        transformation_context_isolated: params.transformation_context_isolated,
    })
}

/// Whether the render may be deferred.
#[must_use]
pub fn is_async_allowed(document: &Document, params: &DisplayParameters) -> bool {
    document.async_properties().async_allowed && params.async_allowed
}

/// Whether the render result may be cached.
#[must_use]
pub fn is_cache_allowed(document: &Document) -> bool {
    document.async_properties().cache_allowed
}
