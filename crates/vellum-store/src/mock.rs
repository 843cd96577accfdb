//! Mock store implementation for testing.
//!
//! Provides [`MockStore`] for unit testing without filesystem access.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::document::Document;
use crate::reference::DocumentReference;
use crate::store::{DocumentStore, ErrorStatus, StoreError, StoreErrorKind};

/// Backend identifier for error messages.
const BACKEND: &str = "Mock";

type TranslationKey = (DocumentReference, String);

/// Mock store for testing.
///
/// Stores documents and translations in memory. Use the builder methods
/// to configure the mock with test data.
///
/// # Example
///
/// ```ignore
/// use vellum_store::{Document, DocumentReference, DocumentStore, MockStore};
///
/// let reference = DocumentReference::new("main", ["Space"], "Page");
/// let store = MockStore::new()
///     .with_document(Document::new(reference.clone()).with_content("# Hello"));
///
/// let doc = store.get_document(&reference).unwrap();
/// ```
#[derive(Debug, Default)]
pub struct MockStore {
    documents: RwLock<HashMap<DocumentReference, Arc<Document>>>,
    translations: RwLock<HashMap<TranslationKey, Arc<Document>>>,
    failing_translations: RwLock<HashSet<TranslationKey>>,
    loads: AtomicUsize,
}

impl MockStore {
    /// Create a new empty mock store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document, keyed by its reference.
    #[must_use]
    pub fn with_document(self, document: Document) -> Self {
        self.insert(document);
        self
    }

    /// Add a translation of the document sharing `translation`'s reference.
    ///
    /// The translation locale is taken from [`Document::real_locale`].
    #[must_use]
    pub fn with_translation(self, translation: Document) -> Self {
        let key = (
            translation.reference().clone(),
            translation.real_locale().to_owned(),
        );
        self.translations
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, Arc::new(translation));
        self
    }

    /// Make loading the `locale` translation of `reference` fail.
    #[must_use]
    pub fn with_failing_translation(
        self,
        reference: DocumentReference,
        locale: impl Into<String>,
    ) -> Self {
        self.failing_translations
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((reference, locale.into()));
        self
    }

    /// Add or replace a document after construction.
    pub fn insert(&self, document: Document) {
        self.documents
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(document.reference().clone(), Arc::new(document));
    }

    /// Number of successful and failed `get_document` calls so far.
    #[must_use]
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl DocumentStore for MockStore {
    fn get_document(&self, reference: &DocumentReference) -> Result<Arc<Document>, StoreError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(reference)
            .cloned()
            .ok_or_else(|| StoreError::not_found(reference).with_backend(BACKEND))
    }

    fn get_translation(
        &self,
        document: &Document,
        locale: &str,
    ) -> Result<Arc<Document>, StoreError> {
        let key = (document.reference().clone(), locale.to_owned());

        if self
            .failing_translations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&key)
        {
            return Err(StoreError::new(StoreErrorKind::Unavailable)
                .with_status(ErrorStatus::Temporary)
                .with_reference(document.reference())
                .with_backend(BACKEND));
        }

        if let Some(translation) = self
            .translations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Ok(Arc::clone(translation));
        }

        self.get_document(document.reference())
    }
}
