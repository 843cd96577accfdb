//! Hierarchical document references.

use std::fmt;

use crate::store::{StoreError, StoreErrorKind};

/// Stable, comparable identity of a document.
///
/// Serialized as `wiki:Space.Sub.Name`. The serialized form is used as the
/// macro namespace and transformation id of a render, so two references are
/// equal exactly when their serialized forms are equal.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentReference {
    wiki: String,
    spaces: Vec<String>,
    name: String,
}

impl DocumentReference {
    /// Create a reference from its parts.
    #[must_use]
    pub fn new<S: Into<String>>(
        wiki: impl Into<String>,
        spaces: impl IntoIterator<Item = S>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            wiki: wiki.into(),
            spaces: spaces.into_iter().map(Into::into).collect(),
            name: name.into(),
        }
    }

    /// Parse `wiki:Space.Name`, using `default_wiki` when no wiki is given.
    ///
    /// # Example
    ///
    /// ```
    /// use vellum_store::DocumentReference;
    ///
    /// let reference = DocumentReference::parse("Guide.Install", "main").unwrap();
    /// assert_eq!(reference.to_string(), "main:Guide.Install");
    /// assert_eq!(reference.name(), "Install");
    /// ```
    pub fn parse(value: &str, default_wiki: &str) -> Result<Self, StoreError> {
        let (wiki, path) = match value.split_once(':') {
            Some((wiki, path)) => (wiki, path),
            None => (default_wiki, value),
        };

        let mut segments: Vec<String> = path.split('.').map(ToOwned::to_owned).collect();
        let name = segments.pop().unwrap_or_default();
        if wiki.is_empty() || name.is_empty() || segments.iter().any(String::is_empty) {
            return Err(StoreError::new(StoreErrorKind::InvalidReference).with_reference(value));
        }

        Ok(Self {
            wiki: wiki.to_owned(),
            spaces: segments,
            name,
        })
    }

    /// Wiki (tenant) owning the document.
    #[must_use]
    pub fn wiki(&self) -> &str {
        &self.wiki
    }

    /// Space path, outermost first.
    #[must_use]
    pub fn spaces(&self) -> &[String] {
        &self.spaces
    }

    /// Bare document name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for DocumentReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.wiki)?;
        for space in &self.spaces {
            write!(f, "{space}.")?;
        }
        f.write_str(&self.name)
    }
}
