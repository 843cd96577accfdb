//! Filesystem store implementation.
//!
//! Provides [`FsStore`] for reading documents from a directory tree. A
//! reference `wiki:Space.Sub.Name` maps to `<root>/Space/Sub/Name.md`, its
//! translation for `fr` to `Name.fr.md`, and optional metadata lives in a
//! `Name.meta.yaml` sidecar next to the content file.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use vellum_tree::Syntax;

use crate::document::{AsyncProperties, Document};
use crate::reference::DocumentReference;
use crate::store::{DocumentStore, StoreError, StoreErrorKind};

/// Backend identifier for error messages.
const BACKEND: &str = "Fs";

/// Sidecar metadata for a document or one of its translations.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Sidecar {
    title: Option<String>,
    syntax: Option<String>,
    version: Option<String>,
    author: Option<String>,
    default_locale: Option<String>,
    restricted: bool,
    #[serde(rename = "async")]
    async_allowed: bool,
    #[serde(rename = "cache")]
    cache_allowed: bool,
    context: BTreeSet<String>,
}

/// Filesystem document store.
///
/// Serves a single wiki; references to other wikis are reported as not found.
///
/// # Example
///
/// ```ignore
/// use std::path::PathBuf;
/// use vellum_store::{DocumentReference, DocumentStore, FsStore};
///
/// let store = FsStore::new(PathBuf::from("docs"), "main");
/// let doc = store.get_document(&DocumentReference::parse("Guide.Install", "main")?)?;
/// ```
#[derive(Debug)]
pub struct FsStore {
    /// Root directory for document storage.
    source_dir: PathBuf,
    /// Wiki served by this store.
    wiki: String,
}

impl FsStore {
    /// Create a new filesystem store.
    ///
    /// # Arguments
    ///
    /// * `source_dir` - Root directory containing markdown files
    /// * `wiki` - Wiki identifier the directory belongs to
    #[must_use]
    pub fn new(source_dir: PathBuf, wiki: impl Into<String>) -> Self {
        Self {
            source_dir,
            wiki: wiki.into(),
        }
    }

    /// Root directory of the store.
    #[must_use]
    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    /// Reject segments and locales that would escape the source directory.
    fn validate(reference: &DocumentReference, locale: Option<&str>) -> Result<(), StoreError> {
        let invalid = reference
            .spaces()
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(reference.name()))
            .any(|segment| segment == ".." || segment.contains(['/', '\\']))
            || locale.is_some_and(|l| l.contains("..") || l.contains(['/', '\\']));

        if invalid {
            return Err(StoreError::new(StoreErrorKind::InvalidReference)
                .with_reference(reference)
                .with_backend(BACKEND));
        }
        Ok(())
    }

    /// Directory and file stem for a reference.
    fn stem(&self, reference: &DocumentReference, locale: Option<&str>) -> PathBuf {
        let mut path = self.source_dir.clone();
        for space in reference.spaces() {
            path.push(space);
        }
        match locale {
            Some(locale) => path.push(format!("{}.{locale}", reference.name())),
            None => path.push(reference.name()),
        }
        path
    }

    fn read_sidecar(path: &Path, reference: &DocumentReference) -> Result<Sidecar, StoreError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Sidecar::default()),
            Err(e) => return Err(StoreError::io(e, reference).with_backend(BACKEND)),
        };
        if text.trim().is_empty() {
            return Ok(Sidecar::default());
        }
        serde_yaml::from_str(&text).map_err(|e| {
            StoreError::new(StoreErrorKind::Corrupt)
                .with_reference(reference)
                .with_backend(BACKEND)
                .with_source(e)
        })
    }

    /// Load the default translation or the translation for `locale`.
    fn load(
        &self,
        reference: &DocumentReference,
        locale: Option<&str>,
    ) -> Result<Document, StoreError> {
        if reference.wiki() != self.wiki {
            return Err(StoreError::not_found(reference).with_backend(BACKEND));
        }
        Self::validate(reference, locale)?;

        let stem = self.stem(reference, locale);
        let content = fs::read_to_string(with_suffix(&stem, "md"))
            .map_err(|e| StoreError::io(e, reference).with_backend(BACKEND))?;
        let sidecar = Self::read_sidecar(&with_suffix(&stem, "meta.yaml"), reference)?;

        let mut document = Document::new(reference.clone())
            .with_content(content)
            .with_restricted(sidecar.restricted)
            .with_async_properties(AsyncProperties {
                async_allowed: sidecar.async_allowed,
                cache_allowed: sidecar.cache_allowed,
                context_elements: sidecar.context,
            });
        if let Some(syntax) = sidecar.syntax {
            document = document.with_syntax(Syntax::new(syntax));
        }
        if let Some(title) = sidecar.title {
            document = document.with_title(title);
        }
        if let Some(version) = sidecar.version {
            document = document.with_version(version);
        }
        if let Some(author) = sidecar.author {
            document = document.with_author(author);
        }
        if let Some(default_locale) = sidecar.default_locale {
            document = document.with_default_locale(default_locale);
        }
        if let Some(locale) = locale {
            document = document.with_locale(locale);
        }

        tracing::debug!(reference = %reference, locale = ?locale, "Loaded document");
        Ok(document)
    }
}

/// `stem` with `.suffix` appended, keeping dots already in the name.
fn with_suffix(stem: &Path, suffix: &str) -> PathBuf {
    let mut os = stem.as_os_str().to_owned();
    os.push(".");
    os.push(suffix);
    PathBuf::from(os)
}

impl DocumentStore for FsStore {
    fn get_document(&self, reference: &DocumentReference) -> Result<Arc<Document>, StoreError> {
        self.load(reference, None).map(Arc::new)
    }

    fn get_translation(
        &self,
        document: &Document,
        locale: &str,
    ) -> Result<Arc<Document>, StoreError> {
        if locale.is_empty() || locale == document.default_locale() {
            return self.get_document(document.reference());
        }
        match self.load(document.reference(), Some(locale)) {
            Ok(translation) => {
                // Translations inherit document-level settings from the default.
                let mut translation = translation
                    .with_default_locale(document.default_locale())
                    .with_restricted(document.is_restricted())
                    .with_async_properties(document.async_properties().clone());
                if translation.title().is_empty() {
                    translation = translation.with_title(document.title());
                }
                Ok(Arc::new(translation))
            }
            Err(e) if e.kind == StoreErrorKind::NotFound => {
                tracing::debug!(
                    reference = %document.reference(),
                    locale,
                    "No translation, using default"
                );
                self.get_document(document.reference())
            }
            Err(e) => Err(e),
        }
    }
}
