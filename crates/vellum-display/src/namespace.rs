//! Macro namespace lifecycle and the "inside rendering engine" flag.
//!
//! A namespace is opened only by the outermost render of a request: nested
//! renders run while the rendering engine flag is set and must not close a
//! namespace their caller still uses.

use std::ops::{Deref, DerefMut};

use crate::collab::ExpressionEvaluator;
use crate::context::RenderContext;

/// Scoped macro namespace, stopped when dropped.
///
/// Open and close failures are logged and ignored.
#[must_use = "dropping the namespace closes it immediately"]
pub struct MacroNamespace<'a> {
    evaluator: &'a dyn ExpressionEvaluator,
    id: Option<String>,
}

impl<'a> MacroNamespace<'a> {
    /// Start namespace `id` if `isolated` and not already in the rendering engine.
    pub fn open(
        evaluator: &'a dyn ExpressionEvaluator,
        isolated: bool,
        in_rendering_engine: bool,
        id: &str,
    ) -> Self {
        if !isolated || in_rendering_engine {
            return Self {
                evaluator,
                id: None,
            };
        }

        if let Err(e) = evaluator.start_namespace(id) {
            tracing::warn!(namespace = id, error = %e, "Failed to start macro namespace");
        } else {
            tracing::debug!(namespace = id, "Started macro namespace");
        }
        Self {
            evaluator,
            id: Some(id.to_owned()),
        }
    }

    /// Whether this scope owns the namespace.
    #[must_use]
    pub fn is_owner(&self) -> bool {
        self.id.is_some()
    }
}

impl Drop for MacroNamespace<'_> {
    fn drop(&mut self) {
        let Some(id) = self.id.take() else {
            return;
        };
        if let Err(e) = self.evaluator.stop_namespace(&id) {
            tracing::warn!(namespace = %id, error = %e, "Failed to stop macro namespace");
        } else {
            tracing::debug!(namespace = %id, "Stopped macro namespace");
        }
    }
}

/// Marks the request as inside the rendering engine; restores the previous
/// value when dropped.
pub struct EngineScope<'a> {
    ctx: &'a mut RenderContext,
    previous: bool,
}

impl<'a> EngineScope<'a> {
    /// Set the flag on `ctx`, remembering its previous value.
    pub fn enter(ctx: &'a mut RenderContext) -> Self {
        let previous = ctx.in_rendering_engine();
        ctx.set_in_rendering_engine(true);
        Self { ctx, previous }
    }

    /// Value of the flag before this scope.
    #[must_use]
    pub fn previous(&self) -> bool {
        self.previous
    }
}

impl Deref for EngineScope<'_> {
    type Target = RenderContext;

    fn deref(&self) -> &RenderContext {
        self.ctx
    }
}

impl DerefMut for EngineScope<'_> {
    fn deref_mut(&mut self) -> &mut RenderContext {
        self.ctx
    }
}

impl Drop for EngineScope<'_> {
    fn drop(&mut self) {
        self.ctx.set_in_rendering_engine(self.previous);
    }
}
