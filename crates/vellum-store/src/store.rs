//! The [`DocumentStore`] seam and its error type.
//!
//! Every backend reports failures as a [`StoreError`], so the display
//! pipeline can tell a missing document from an unreadable one.

use std::sync::Arc;

use crate::document::Document;
use crate::reference::DocumentReference;

/// What went wrong, independent of the backend.
#[derive(Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum StoreErrorKind {
    /// No document under the reference.
    NotFound,
    /// The reference is malformed or has no place in the backend.
    InvalidReference,
    /// A stored document or its metadata cannot be decoded.
    Corrupt,
    /// The backend refused access.
    PermissionDenied,
    /// The backend cannot be reached right now.
    Unavailable,
    /// Anything else.
    Other,
}

impl StoreErrorKind {
    fn label(&self) -> &'static str {
        match self {
            Self::NotFound => "Not found",
            Self::InvalidReference => "Invalid reference",
            Self::Corrupt => "Corrupt data",
            Self::PermissionDenied => "Permission denied",
            Self::Unavailable => "Unavailable",
            Self::Other => "Error",
        }
    }
}

/// Whether repeating the call may succeed.
#[derive(Debug, PartialEq, Eq, Default)]
pub enum ErrorStatus {
    /// The same call fails again.
    #[default]
    Permanent,
    /// The failure was transient.
    Temporary,
}

/// Failure reported by a [`DocumentStore`].
#[derive(Debug)]
pub struct StoreError {
    /// Category.
    pub kind: StoreErrorKind,
    /// Whether a retry may help.
    pub status: ErrorStatus,
    /// Document the failure concerns.
    pub reference: Option<String>,
    /// Short backend name, `Fs` or `Mock`.
    pub backend: Option<&'static str>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl StoreError {
    /// Error of `kind` with no context.
    #[must_use]
    pub fn new(kind: StoreErrorKind) -> Self {
        Self {
            kind,
            status: ErrorStatus::Permanent,
            reference: None,
            backend: None,
            source: None,
        }
    }

    /// Name the affected document.
    #[must_use]
    pub fn with_reference(mut self, reference: impl ToString) -> Self {
        self.reference = Some(reference.to_string());
        self
    }

    /// Name the reporting backend.
    #[must_use]
    pub fn with_backend(mut self, backend: &'static str) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Mark the failure as transient or not.
    #[must_use]
    pub fn with_status(mut self, status: ErrorStatus) -> Self {
        self.status = status;
        self
    }

    /// Keep the backend's own error as the source.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// `reference` does not exist.
    #[must_use]
    pub fn not_found(reference: &DocumentReference) -> Self {
        Self::new(StoreErrorKind::NotFound).with_reference(reference)
    }

    /// Classify a filesystem failure while reading `reference`.
    #[must_use]
    pub fn io(err: std::io::Error, reference: &DocumentReference) -> Self {
        use std::io::ErrorKind as Io;

        let (kind, status) = match err.kind() {
            Io::NotFound => (StoreErrorKind::NotFound, ErrorStatus::Permanent),
            Io::PermissionDenied => (StoreErrorKind::PermissionDenied, ErrorStatus::Permanent),
            Io::TimedOut | Io::Interrupted => (StoreErrorKind::Other, ErrorStatus::Temporary),
            _ => (StoreErrorKind::Other, ErrorStatus::Permanent),
        };
        Self::new(kind)
            .with_status(status)
            .with_reference(reference)
            .with_source(err)
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // [Fs] Not found: <source> (reference: main:Space.Page)
        if let Some(name) = self.backend {
            write!(f, "[{name}] ")?;
        }
        f.write_str(self.kind.label())?;
        if let Some(cause) = &self.source {
            write!(f, ": {cause}")?;
        }
        match &self.reference {
            Some(reference) => write!(f, " (reference: {reference})"),
            None => Ok(()),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|cause| cause as &(dyn std::error::Error + 'static))
    }
}

/// Document store consumed by the display pipeline.
pub trait DocumentStore: Send + Sync {
    /// Load a document by reference.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] with [`StoreErrorKind::NotFound`] if the document
    /// doesn't exist, or another kind if it can't be read.
    fn get_document(&self, reference: &DocumentReference) -> Result<Arc<Document>, StoreError>;

    /// Load the translation of `document` for `locale`.
    ///
    /// Returns the default (untranslated) document when no translation exists
    /// for `locale`; callers compare [`Document::real_locale`] to tell the two
    /// apart.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the translation exists but can't be read.
    fn get_translation(
        &self,
        document: &Document,
        locale: &str,
    ) -> Result<Arc<Document>, StoreError>;

    /// Whether `reference` can be loaded. Read failures count as absent.
    fn exists(&self, reference: &DocumentReference) -> bool {
        self.get_document(reference).is_ok()
    }
}
