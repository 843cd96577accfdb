//! Unique identifier generation.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

/// Shared generator of identifiers unique within one rendering session.
///
/// Cloning an `IdGenerator` yields a handle to the same set of taken ids, so
/// nested renders that receive a clone judge uniqueness against everything
/// generated so far.
///
/// # Example
///
/// ```
/// use vellum_tree::IdGenerator;
///
/// let generator = IdGenerator::new();
/// let shared = generator.clone();
///
/// assert_eq!(generator.generate_unique_id("H", "intro"), "Hintro");
/// assert_eq!(shared.generate_unique_id("H", "intro"), "Hintro-1");
/// ```
#[derive(Clone, Debug, Default)]
pub struct IdGenerator {
    taken: Arc<Mutex<HashSet<String>>>,
}

impl IdGenerator {
    /// Create a generator with no ids taken.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate an id from `prefix` and a `text` hint, unique within this
    /// generator.
    ///
    /// Characters of `text` outside ASCII alphanumerics and `-_.:` are
    /// dropped. When the candidate is taken, `-1`, `-2`, ... is appended
    /// until a free id is found.
    pub fn generate_unique_id(&self, prefix: &str, text: &str) -> String {
        let cleaned: String = text
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':'))
            .collect();
        let mut base = format!("{prefix}{cleaned}");
        if base.is_empty() {
            base.push_str("id");
        }

        let mut taken = self.taken.lock().unwrap_or_else(PoisonError::into_inner);
        let mut candidate = base.clone();
        let mut index = 1;
        while taken.contains(&candidate) {
            candidate = format!("{base}-{index}");
            index += 1;
        }
        taken.insert(candidate.clone());
        candidate
    }

    /// Mark `id` as taken. Returns `false` if it already was.
    pub fn reserve(&self, id: impl Into<String>) -> bool {
        self.taken
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.into())
    }

    /// Whether `id` has been generated or reserved.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.taken
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(id)
    }

    /// Whether two handles share the same underlying set.
    #[must_use]
    pub fn same_session(&self, other: &IdGenerator) -> bool {
        Arc::ptr_eq(&self.taken, &other.taken)
    }
}
