//! Parser trait and registry.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::markdown::MarkdownParser;
use crate::plain::PlainTextParser;
use crate::syntax::Syntax;
use crate::tree::ContentTree;

/// Error returned when raw content cannot be turned into a [`ContentTree`].
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// No parser is registered for the syntax.
    #[error("Unsupported syntax: {0}")]
    UnsupportedSyntax(Syntax),
    /// The parser rejected the content.
    #[error("Failed to parse {source_id} as {syntax}: {message}")]
    Invalid {
        /// Syntax the content was parsed with.
        syntax: Syntax,
        /// Reference of the parsed document.
        source_id: String,
        /// Parser-specific message.
        message: String,
    },
}

/// Parser for one syntax.
pub trait SyntaxParser: Send + Sync {
    /// Syntax handled by this parser.
    fn syntax(&self) -> Syntax;

    /// Parse `text` into a content tree.
    ///
    /// # Arguments
    ///
    /// * `text` - Raw document content
    /// * `source` - Serialized reference of the document, stored as metadata
    fn parse(&self, text: &str, source: &str) -> Result<ContentTree, ParseError>;
}

/// Parsers keyed by syntax id.
#[derive(Clone, Default)]
pub struct ParserRegistry {
    parsers: HashMap<Syntax, Arc<dyn SyntaxParser>>,
}

impl ParserRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the markdown and plain text parsers.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new()
            .with_parser(MarkdownParser::new())
            .with_parser(PlainTextParser)
    }

    /// Register a parser, replacing any parser for the same syntax.
    #[must_use]
    pub fn with_parser<P: SyntaxParser + 'static>(mut self, parser: P) -> Self {
        self.parsers.insert(parser.syntax(), Arc::new(parser));
        self
    }

    /// Whether a parser exists for `syntax`.
    #[must_use]
    pub fn supports(&self, syntax: &Syntax) -> bool {
        self.parsers.contains_key(syntax)
    }

    /// Parse `text` with the parser registered for `syntax`.
    pub fn parse(
        &self,
        text: &str,
        syntax: &Syntax,
        source: &str,
    ) -> Result<ContentTree, ParseError> {
        let parser = self
            .parsers
            .get(syntax)
            .ok_or_else(|| ParseError::UnsupportedSyntax(syntax.clone()))?;
        parser.parse(text, source)
    }
}

impl fmt::Debug for ParserRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut syntaxes: Vec<_> = self.parsers.keys().collect();
        syntaxes.sort();
        f.debug_struct("ParserRegistry")
            .field("syntaxes", &syntaxes)
            .finish()
    }
}
