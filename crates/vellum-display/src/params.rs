//! Display parameters.

use vellum_tree::{IdGenerator, Syntax};

/// Options of one display call.
///
/// Cloning copies every flag but shares the [`IdGenerator`], so ids generated
/// by nested renders are unique across the whole rendering session.
#[derive(Clone, Debug)]
pub struct DisplayParameters {
    /// Restrict rendering to the section introduced by this heading id.
    pub section_id: Option<String>,
    /// Render the title instead of the content.
    pub title_displayed: bool,
    /// Make the document current while rendering it.
    pub execution_context_isolated: bool,
    /// Render in a private macro namespace.
    pub transformation_context_isolated: bool,
    /// Forbid unsafe transformations.
    pub transformation_context_restricted: bool,
    /// Run the transformation pass.
    pub content_transformed: bool,
    /// Render the translation for the request locale.
    pub content_translated: bool,
    /// Syntax the output is destined for.
    pub target_syntax: Option<Syntax>,
    /// Allow deferred rendering.
    pub async_allowed: bool,
    /// Rewrite heading and image ids to be unique against this generator.
    pub id_generator: Option<IdGenerator>,
}

impl Default for DisplayParameters {
    fn default() -> Self {
        Self {
            section_id: None,
            title_displayed: false,
            execution_context_isolated: false,
            transformation_context_isolated: true,
            transformation_context_restricted: false,
            content_transformed: true,
            content_translated: false,
            target_syntax: None,
            async_allowed: true,
            id_generator: None,
        }
    }
}

impl DisplayParameters {
    /// Parameters requesting the title instead of the content.
    #[must_use]
    pub fn title() -> Self {
        Self {
            title_displayed: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_section(mut self, section_id: impl Into<String>) -> Self {
        self.section_id = Some(section_id.into());
        self
    }

    #[must_use]
    pub fn with_execution_context_isolated(mut self, isolated: bool) -> Self {
        self.execution_context_isolated = isolated;
        self
    }

    #[must_use]
    pub fn with_transformation_context_isolated(mut self, isolated: bool) -> Self {
        self.transformation_context_isolated = isolated;
        self
    }

    #[must_use]
    pub fn with_restricted(mut self, restricted: bool) -> Self {
        self.transformation_context_restricted = restricted;
        self
    }

    #[must_use]
    pub fn with_content_transformed(mut self, transformed: bool) -> Self {
        self.content_transformed = transformed;
        self
    }

    #[must_use]
    pub fn with_content_translated(mut self, translated: bool) -> Self {
        self.content_translated = translated;
        self
    }

    #[must_use]
    pub fn with_target_syntax(mut self, syntax: Syntax) -> Self {
        self.target_syntax = Some(syntax);
        self
    }

    #[must_use]
    pub fn with_async_allowed(mut self, allowed: bool) -> Self {
        self.async_allowed = allowed;
        self
    }

    #[must_use]
    pub fn with_id_generator(mut self, generator: IdGenerator) -> Self {
        self.id_generator = Some(generator);
        self
    }

    /// Whether the render gets its own macro namespace.
    ///
    /// Only a transformed render has macros to isolate.
    #[must_use]
    pub fn isolates_namespace(&self) -> bool {
        self.content_transformed && self.transformation_context_isolated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static_assertions::assert_impl_all!(DisplayParameters: Send, Sync, Clone);

    #[test]
    fn test_defaults() {
        let params = DisplayParameters::default();
        assert!(params.transformation_context_isolated);
        assert!(params.content_transformed);
        assert!(params.async_allowed);
        assert!(!params.title_displayed);
        assert!(!params.execution_context_isolated);
        assert!(!params.transformation_context_restricted);
        assert!(!params.content_translated);
        assert!(params.section_id.is_none());
        assert!(params.target_syntax.is_none());
        assert!(params.id_generator.is_none());
    }

    #[test]
    fn test_clone_shares_id_generator() {
        let params = DisplayParameters::default().with_id_generator(IdGenerator::new());
        let clone = params.clone().with_section("Hintro");

        let original = params.id_generator.as_ref().unwrap();
        let cloned = clone.id_generator.as_ref().unwrap();
        assert!(original.same_session(cloned));

        original.reserve("Hintro");
        assert!(cloned.contains("Hintro"));
        assert!(params.section_id.is_none());
    }

    #[test]
    fn test_isolates_namespace_requires_transformation() {
        assert!(DisplayParameters::default().isolates_namespace());
        assert!(
            !DisplayParameters::default()
                .with_content_transformed(false)
                .isolates_namespace()
        );
        assert!(
            !DisplayParameters::default()
                .with_transformation_context_isolated(false)
                .isolates_namespace()
        );
    }
}
