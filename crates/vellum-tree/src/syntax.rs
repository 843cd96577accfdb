//! Syntax identifiers.

use std::fmt;

/// Identifier of a markup syntax (e.g. `markdown/1.0`).
///
/// Syntax ids are opaque strings compared by value. The well-known ids used
/// by the bundled parsers have dedicated constructors.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Syntax(String);

impl Syntax {
    /// `CommonMark` with GFM extensions.
    pub const MARKDOWN: &'static str = "markdown/1.0";
    /// Plain text, parsed into inline words.
    pub const PLAIN: &'static str = "plain/1.0";
    /// Legacy wiki syntax with `1 Title` / `1.1 Title` headings.
    pub const LEGACY: &'static str = "legacy/1.0";

    /// Create a syntax id from any string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The markdown syntax.
    #[must_use]
    pub fn markdown() -> Self {
        Self::new(Self::MARKDOWN)
    }

    /// The plain text syntax.
    #[must_use]
    pub fn plain() -> Self {
        Self::new(Self::PLAIN)
    }

    /// The legacy wiki syntax.
    #[must_use]
    pub fn legacy() -> Self {
        Self::new(Self::LEGACY)
    }

    /// Syntax id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Syntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_known_ids() {
        assert_eq!(Syntax::markdown().as_str(), "markdown/1.0");
        assert_eq!(Syntax::plain().to_string(), "plain/1.0");
        assert_eq!(Syntax::legacy(), Syntax::new("legacy/1.0"));
    }
}
