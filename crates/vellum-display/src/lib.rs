//! Document content and title rendering pipeline for Vellum.
//!
//! Given a stored [`Document`] and [`DisplayParameters`], the pipeline
//! produces a [`ContentTree`] of either the document's content or its title.
//!
//! # Architecture
//!
//! - [`Displayer`]: entry point, dispatching to the title or content pipeline
//! - content resolution: own, translated or section content, with ids made
//!   unique against a shared [`IdGenerator`]
//! - title resolution: evaluated title, first heading, then document name
//! - [`RenderContext`]: per-request state (current document, recursion
//!   history, rendering engine flag) threaded through every call
//! - scoped guards ([`MacroNamespace`], [`IsolatedContext`], [`EngineScope`],
//!   [`SecurityScope`]) releasing what they acquired on every exit path
//! - [`RenderKey`], [`CachingDisplayer`] and [`AsyncExecutor`] for cached and
//!   deferred renders
//!
//! Macro expansion and title expressions are delegated to a [`Transformer`]
//! and an [`ExpressionEvaluator`].
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use vellum_display::{
//!     DisplayParameters, Displayer, IdentityTransformer, LiteralEvaluator, RenderContext,
//! };
//! use vellum_store::{Document, DocumentReference, MockStore};
//!
//! let displayer = Displayer::new(
//!     Arc::new(MockStore::new()),
//!     Arc::new(IdentityTransformer),
//!     Arc::new(LiteralEvaluator),
//! );
//! let document = Document::new(DocumentReference::new("main", ["Guide"], "Install"))
//!     .with_content("# Setup\n\nRun the installer.\n\n# Usage\n\nStart it.");
//! let mut ctx = RenderContext::new("main", "en");
//!
//! let section = displayer
//!     .display(&mut ctx, &document, &DisplayParameters::default().with_section("Hsetup"))
//!     .unwrap();
//! assert!(section.plain_text().contains("Run the installer."));
//! assert!(!section.plain_text().contains("Start it."));
//! ```
//!
//! [`Document`]: vellum_store::Document
//! [`ContentTree`]: vellum_tree::ContentTree
//! [`IdGenerator`]: vellum_tree::IdGenerator

mod cache;
mod collab;
mod content;
mod context;
mod display;
mod error;
mod executor;
mod isolation;
mod key;
mod namespace;
mod params;
mod recursion;
mod title;

pub use cache::{BUCKET, CachingDisplayer};
pub use collab::{
    EvaluationError, ExpressionEvaluator, IdentityTransformer, LiteralEvaluator, TransformError,
    TransformRequest, Transformer,
};
pub use context::{RenderContext, SecurityContext, SecurityScope};
pub use display::Displayer;
pub use error::DisplayError;
pub use executor::AsyncExecutor;
pub use isolation::{
    ContextSnapshot, IsolatedContext, with_isolated_context, with_isolated_reference,
};
pub use key::{
    DISCRIMINATOR, RenderKey, build_key, is_async_allowed, is_cache_allowed, transformation_id,
};
pub use namespace::{EngineScope, MacroNamespace};
pub use params::DisplayParameters;
pub use recursion::{Recursion, RecursionGuard, RecursionToken, TITLE};
pub use title::{TitleExtractor, TitleExtractors};
pub use vellum_config::{DisplaySettings, FallbackPolicy};
