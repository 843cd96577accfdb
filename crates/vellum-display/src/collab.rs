//! Collaborators the pipeline delegates to.
//!
//! The transformation engine expands macros in place and the expression
//! evaluator computes dynamic titles. Both receive the request's
//! [`RenderContext`] so they can re-enter the pipeline (includes, scripted
//! "display this document" calls) on the same request state.

use vellum_tree::{ContentTree, Syntax};

use crate::context::RenderContext;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failure of the transformation pass.
#[derive(Debug, thiserror::Error)]
#[error("Transformation failed: {message}")]
pub struct TransformError {
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl TransformError {
    /// Create an error with a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Attach the underlying cause.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Failure of the expression evaluator.
#[derive(Debug, thiserror::Error)]
#[error("Evaluation failed: {message}")]
pub struct EvaluationError {
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl EvaluationError {
    /// Create an error with a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Attach the underlying cause.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Parameters of one transformation pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransformRequest {
    /// Syntax the tree was parsed from.
    pub syntax: Syntax,
    /// Forbid transformations that are unsafe for untrusted content.
    pub restricted: bool,
    /// Syntax the output is destined for.
    pub target_syntax: Option<Syntax>,
    /// Namespace and cache identity of the render.
    pub transformation_id: String,
}

/// Transformation engine expanding dynamic constructs in place.
pub trait Transformer: Send + Sync {
    /// Transform `tree` in place.
    fn transform(
        &self,
        ctx: &mut RenderContext,
        tree: &mut ContentTree,
        request: &TransformRequest,
    ) -> Result<(), TransformError>;
}

/// Evaluator for dynamic title expressions.
pub trait ExpressionEvaluator: Send + Sync {
    /// Evaluate `expression` within macro `namespace`.
    fn evaluate(
        &self,
        ctx: &mut RenderContext,
        expression: &str,
        namespace: &str,
    ) -> Result<String, EvaluationError>;

    /// Start using the macro namespace `id`.
    fn start_namespace(&self, id: &str) -> Result<(), EvaluationError>;

    /// Stop using the macro namespace `id`, discarding what it defined.
    fn stop_namespace(&self, id: &str) -> Result<(), EvaluationError>;
}

/// Transformer that leaves trees untouched.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdentityTransformer;

impl Transformer for IdentityTransformer {
    fn transform(
        &self,
        _ctx: &mut RenderContext,
        _tree: &mut ContentTree,
        _request: &TransformRequest,
    ) -> Result<(), TransformError> {
        Ok(())
    }
}

/// Evaluator that returns expressions unchanged and has no namespaces.
#[derive(Clone, Copy, Debug, Default)]
pub struct LiteralEvaluator;

impl ExpressionEvaluator for LiteralEvaluator {
    fn evaluate(
        &self,
        _ctx: &mut RenderContext,
        expression: &str,
        _namespace: &str,
    ) -> Result<String, EvaluationError> {
        Ok(expression.to_owned())
    }

    fn start_namespace(&self, _id: &str) -> Result<(), EvaluationError> {
        Ok(())
    }

    fn stop_namespace(&self, _id: &str) -> Result<(), EvaluationError> {
        Ok(())
    }
}
