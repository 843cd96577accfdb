//! Document model.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use vellum_tree::{ContentTree, ParseError, ParserRegistry, Syntax};

use crate::reference::DocumentReference;

/// Capabilities a document declares for deferred rendering and caching.
///
/// All flags default to `false`: a document must opt in explicitly.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AsyncProperties {
    /// Rendering may be deferred to a later request.
    pub async_allowed: bool,
    /// Rendered output may be cached.
    pub cache_allowed: bool,
    /// Context entries the rendered output depends on (e.g. "user", "locale").
    pub context_elements: BTreeSet<String>,
}

impl AsyncProperties {
    /// Whether neither deferred rendering nor caching is allowed.
    #[must_use]
    pub fn is_static(&self) -> bool {
        !self.async_allowed && !self.cache_allowed
    }
}

/// A stored document.
///
/// The parsed tree is computed on first access and cached; callers receive
/// clones so they can mutate freely without affecting other readers.
#[derive(Clone, Debug)]
pub struct Document {
    reference: DocumentReference,
    syntax: Syntax,
    title: String,
    content: String,
    version: String,
    restricted: bool,
    locale: Option<String>,
    default_locale: String,
    author: Option<String>,
    async_properties: AsyncProperties,
    tree: OnceLock<ContentTree>,
    tree_edited: bool,
}

impl Document {
    /// Create a markdown document with empty content.
    #[must_use]
    pub fn new(reference: DocumentReference) -> Self {
        Self {
            reference,
            syntax: Syntax::markdown(),
            title: String::new(),
            content: String::new(),
            version: "1.1".to_owned(),
            restricted: false,
            locale: None,
            default_locale: "en".to_owned(),
            author: None,
            async_properties: AsyncProperties::default(),
            tree: OnceLock::new(),
            tree_edited: false,
        }
    }

    /// Set the raw content.
    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.set_content(content);
        self
    }

    /// Set the content syntax.
    #[must_use]
    pub fn with_syntax(mut self, syntax: Syntax) -> Self {
        self.syntax = syntax;
        self.tree = OnceLock::new();
        self.tree_edited = false;
        self
    }

    /// Set the static title (may contain expressions).
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the version string.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Mark the document as restricted.
    #[must_use]
    pub fn with_restricted(mut self, restricted: bool) -> Self {
        self.restricted = restricted;
        self
    }

    /// Set the locale of this translation.
    #[must_use]
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    /// Set the default locale of the document.
    #[must_use]
    pub fn with_default_locale(mut self, locale: impl Into<String>) -> Self {
        self.default_locale = locale.into();
        self
    }

    /// Set the author.
    #[must_use]
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Set the async/cache capabilities.
    #[must_use]
    pub fn with_async_properties(mut self, properties: AsyncProperties) -> Self {
        self.async_properties = properties;
        self
    }

    /// Use a pre-built tree instead of parsing the content.
    #[must_use]
    pub fn with_tree(mut self, tree: ContentTree) -> Self {
        self.set_tree(tree);
        self
    }

    /// Replace the raw content, discarding any cached tree.
    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.tree = OnceLock::new();
        self.tree_edited = false;
    }

    /// Replace the cached tree.
    ///
    /// The tree then no longer follows from the stored content and version,
    /// see [`is_tree_edited`](Self::is_tree_edited).
    pub fn set_tree(&mut self, tree: ContentTree) {
        self.tree = OnceLock::from(tree);
        self.tree_edited = true;
    }

    /// Whether the tree was supplied in memory instead of parsed from content.
    #[must_use]
    pub fn is_tree_edited(&self) -> bool {
        self.tree_edited
    }

    /// Reference of the document.
    #[must_use]
    pub fn reference(&self) -> &DocumentReference {
        &self.reference
    }

    /// Content syntax.
    #[must_use]
    pub fn syntax(&self) -> &Syntax {
        &self.syntax
    }

    /// Static title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Raw content.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Version string.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Whether the document is restricted.
    #[must_use]
    pub fn is_restricted(&self) -> bool {
        self.restricted
    }

    /// Locale of this translation, `None` for the default translation.
    #[must_use]
    pub fn locale(&self) -> Option<&str> {
        self.locale.as_deref()
    }

    /// Default locale of the document.
    #[must_use]
    pub fn default_locale(&self) -> &str {
        &self.default_locale
    }

    /// Author, if known.
    #[must_use]
    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    /// Async/cache capabilities.
    #[must_use]
    pub fn async_properties(&self) -> &AsyncProperties {
        &self.async_properties
    }

    /// Locale the content is actually written in.
    ///
    /// The translation locale when set, the default locale otherwise.
    #[must_use]
    pub fn real_locale(&self) -> &str {
        self.locale.as_deref().unwrap_or(&self.default_locale)
    }

    /// Parsed content tree.
    ///
    /// Parses on first call and caches the result; every call returns an
    /// independent copy.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] if no parser supports the document syntax or
    /// the content is rejected.
    pub fn tree(&self, parsers: &ParserRegistry) -> Result<ContentTree, ParseError> {
        if let Some(tree) = self.tree.get() {
            return Ok(tree.clone());
        }
        let tree = parsers.parse(&self.content, &self.syntax, &self.reference.to_string())?;
        // A concurrent reader may have won the race; both trees are identical.
        Ok(self.tree.get_or_init(|| tree).clone())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use vellum_tree::Block;

    use super::*;

    fn reference() -> DocumentReference {
        DocumentReference::new("main", ["Space"], "Page")
    }

    #[test]
    fn test_real_locale_falls_back_to_default() {
        let doc = Document::new(reference()).with_default_locale("fr");
        assert_eq!(doc.real_locale(), "fr");

        let doc = doc.with_locale("de");
        assert_eq!(doc.real_locale(), "de");
    }

    #[test]
    fn test_tree_returns_independent_copies() {
        let doc = Document::new(reference()).with_content("# Title\n\nBody");
        let parsers = ParserRegistry::with_defaults();

        let mut first = doc.tree(&parsers).unwrap();
        first.children.clear();

        let second = doc.tree(&parsers).unwrap();
        assert!(!second.children.is_empty());
    }

    #[test]
    fn test_set_content_invalidates_tree() {
        let mut doc = Document::new(reference())
            .with_syntax(Syntax::plain())
            .with_content("one");
        let parsers = ParserRegistry::with_defaults();
        assert_eq!(doc.tree(&parsers).unwrap().children, vec![Block::word("one")]);

        doc.set_content("two");
        assert_eq!(doc.tree(&parsers).unwrap().children, vec![Block::word("two")]);
    }

    #[test]
    fn test_set_tree_marks_tree_edited() {
        let mut doc = Document::new(reference())
            .with_syntax(Syntax::plain())
            .with_content("stored");
        assert!(!doc.is_tree_edited());

        doc.set_tree(ContentTree::new(vec![Block::word("edited")]));
        assert!(doc.is_tree_edited());
        assert!(doc.clone().is_tree_edited());

        doc.set_content("stored again");
        assert!(!doc.is_tree_edited());
    }

    #[test]
    fn test_with_tree_skips_parsing() {
        let tree = ContentTree::new(vec![Block::word("prebuilt")]);
        let doc = Document::new(reference())
            .with_syntax(Syntax::new("unknown/1.0"))
            .with_tree(tree.clone());
        assert_eq!(doc.tree(&ParserRegistry::new()).unwrap(), tree);
    }

    #[test]
    fn test_unsupported_syntax() {
        let doc = Document::new(reference()).with_syntax(Syntax::new("unknown/1.0"));
        assert!(matches!(
            doc.tree(&ParserRegistry::with_defaults()),
            Err(ParseError::UnsupportedSyntax(_))
        ));
    }

    #[test]
    fn test_async_properties_default_static() {
        assert!(AsyncProperties::default().is_static());
    }
}
