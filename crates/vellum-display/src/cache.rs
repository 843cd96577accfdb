//! Render cache.
//!
//! Content renders whose document opts into caching are stored in the
//! `display` bucket. The entry key is the render key extended with the
//! values of the context elements the document depends on; the etag is the
//! document version, so saving a new version invalidates old entries.
//! Translated renders also put the locale and version of the resolved
//! translation in the etag.

use vellum_cache::{Cache, CacheBucket, CacheBucketExt};
use vellum_store::Document;
use vellum_tree::ContentTree;

use crate::context::{RenderContext, SecurityContext, SecurityScope};
use crate::display::Displayer;
use crate::error::DisplayError;
use crate::key::{RenderKey, build_key, is_cache_allowed, transformation_id};
use crate::params::DisplayParameters;

/// Bucket rendered content is stored in.
pub const BUCKET: &str = "display";

/// [`Displayer`] that serves repeated content renders from a cache.
pub struct CachingDisplayer {
    displayer: Displayer,
    bucket: Box<dyn CacheBucket>,
}

impl CachingDisplayer {
    /// Wrap `displayer`, storing renders in `cache`.
    #[must_use]
    pub fn new(displayer: Displayer, cache: &dyn Cache) -> Self {
        Self {
            displayer,
            bucket: cache.bucket(BUCKET),
        }
    }

    /// The wrapped displayer.
    #[must_use]
    pub fn displayer(&self) -> &Displayer {
        &self.displayer
    }

    /// [`Displayer::display`], served from the cache when possible.
    ///
    /// Titles, renders that generate unique ids, documents that don't allow
    /// caching and documents whose tree was edited in memory always bypass
    /// the cache.
    ///
    /// # Errors
    ///
    /// Same as [`Displayer::display`]. Failed renders are not cached.
    pub fn display(
        &self,
        ctx: &mut RenderContext,
        document: &Document,
        params: &DisplayParameters,
    ) -> Result<ContentTree, DisplayError> {
        if params.title_displayed
            || params.id_generator.is_some()
            || document.is_tree_edited()
            || !is_cache_allowed(document)
        {
            return self.displayer.display(ctx, document, params);
        }

        let tid = transformation_id(ctx, document, params);
        let Some(key) = build_key(document, params, &tid) else {
            return self.displayer.display(ctx, document, params);
        };
        let Some(etag) = self.etag(ctx, document, params) else {
            return self.displayer.display(ctx, document, params);
        };
        let entry = entry_key(&key, ctx, document, params);

        if let Some(tree) = self.bucket.get_json::<ContentTree>(&entry, &etag) {
            tracing::debug!(document = %document.reference(), "Render cache hit");
            return Ok(tree);
        }

        tracing::debug!(document = %document.reference(), "Render cache miss");
        let tree = self.displayer.render_content(ctx, document, params, &tid)?;
        self.bucket.set_json(&entry, &etag, &tree);
        Ok(tree)
    }

    /// [`display`](Self::display) with `security` applied for the duration
    /// of the call.
    ///
    /// # Errors
    ///
    /// Same as [`Displayer::display`].
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

    /// Version the cached render of `document` depends on.
    ///
    /// `None` when the translation can't be resolved; the render then
    /// handles the failure itself and nothing is cached.
    fn etag(
        &self,
        ctx: &RenderContext,
        document: &Document,
        params: &DisplayParameters,
    ) -> Option<String> {
        if !params.content_translated {
            return Some(document.version().to_owned());
        }
        match self.displayer.store().get_translation(document, &ctx.locale) {
            Ok(translation) => Some(format!(
                "{}|{}@{}",
                document.version(),
                translation.real_locale(),
                translation.version()
            )),
            Err(e) => {
                tracing::debug!(
                    document = %document.reference(),
                    error = %e,
                    "Translation lookup failed, not caching"
                );
                None
            }
        }
    }
}

/// Render key plus `name=value` for every context element of `document`.
fn entry_key(
    key: &RenderKey,
    ctx: &RenderContext,
    document: &Document,
    params: &DisplayParameters,
) -> String {
    let elements = &document.async_properties().context_elements;
    let mut parts = key.parts();
    for name in elements {
        let value = ctx.element(name).unwrap_or_default();
        parts.push(format!("{name}={value}"));
    }
    if params.content_translated && !elements.contains("locale") {
        parts.push(format!("locale={}", ctx.locale));
    }
    serde_json::Value::from(parts).to_string()
}
