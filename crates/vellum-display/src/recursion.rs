//! Recursion detection for self-referencing renders.
//!
//! A [`RecursionGuard`] keeps, per displayer kind, the stack of documents
//! currently being rendered. It lives in the [`RenderContext`] and clones
//! share the same stacks, so a render entered in an isolated sub-context is
//! still visible to the code that isolated it.
//!
//! [`RenderContext`]: crate::RenderContext

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use vellum_store::DocumentReference;

/// Displayer kind used by title resolution.
pub const TITLE: &str = "title";

type Stacks = HashMap<String, Vec<DocumentReference>>;

/// Per-request stacks of documents being rendered, keyed by displayer kind.
#[derive(Clone, Debug, Default)]
pub struct RecursionGuard {
    stacks: Arc<Mutex<Stacks>>,
}

/// Outcome of [`RecursionGuard::enter`].
#[derive(Debug)]
#[must_use]
pub enum Recursion {
    /// The document was pushed; it is popped when the token is dropped.
    Entered(RecursionToken),
    /// The document is already being rendered by this kind of displayer.
    AlreadyPresent,
}

impl RecursionGuard {
    /// Create an empty guard.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Push `reference` on the `kind` stack unless it is already there.
    ///
    /// The stack for `kind` is created on first use. When the reference is
    /// present the stack is left untouched.
    pub fn enter(&self, kind: &str, reference: &DocumentReference) -> Recursion {
        let mut stacks = self.stacks.lock().unwrap_or_else(PoisonError::into_inner);
        let stack = stacks.entry(kind.to_owned()).or_default();
        if stack.contains(reference) {
            return Recursion::AlreadyPresent;
        }
        stack.push(reference.clone());

        Recursion::Entered(RecursionToken {
            guard: self.clone(),
            kind: kind.to_owned(),
            reference: reference.clone(),
        })
    }

    /// Whether `reference` is currently on the `kind` stack.
    #[must_use]
    pub fn contains(&self, kind: &str, reference: &DocumentReference) -> bool {
        self.stacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(kind)
            .is_some_and(|stack| stack.contains(reference))
    }

    /// Number of documents on the `kind` stack.
    #[must_use]
    pub fn depth(&self, kind: &str) -> usize {
        self.stacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(kind)
            .map_or(0, Vec::len)
    }

    fn exit(&self, kind: &str, reference: &DocumentReference) {
        let mut stacks = self.stacks.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(stack) = stacks.get_mut(kind)
            && let Some(index) = stack.iter().rposition(|entry| entry == reference)
        {
            stack.remove(index);
        }
    }
}

/// Proof that a document was pushed; pops it when dropped.
#[derive(Debug)]
#[must_use = "dropping the token immediately pops the document"]
pub struct RecursionToken {
    guard: RecursionGuard,
    kind: String,
    reference: DocumentReference,
}

impl RecursionToken {
    /// Pop the document now instead of at end of scope.
    pub fn exit(self) {}
}

impl Drop for RecursionToken {
    fn drop(&mut self) {
        self.guard.exit(&self.kind, &self.reference);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(name: &str) -> DocumentReference {
        DocumentReference::new("main", ["Space"], name)
    }

    #[test]
    fn test_enter_twice_is_already_present() {
        let guard = RecursionGuard::new();
        let token = guard.enter(TITLE, &page("A"));
        assert!(matches!(token, Recursion::Entered(_)));

        assert!(matches!(
            guard.enter(TITLE, &page("A")),
            Recursion::AlreadyPresent
        ));
        assert_eq!(guard.depth(TITLE), 1);
    }

    #[test]
    fn test_drop_pops() {
        let guard = RecursionGuard::new();
        {
            let _token = guard.enter(TITLE, &page("A"));
            assert!(guard.contains(TITLE, &page("A")));
        }
        assert!(!guard.contains(TITLE, &page("A")));
        assert!(matches!(guard.enter(TITLE, &page("A")), Recursion::Entered(_)));
    }

    #[test]
    fn test_explicit_exit() {
        let guard = RecursionGuard::new();
        let Recursion::Entered(token) = guard.enter(TITLE, &page("A")) else {
            panic!("expected entry");
        };
        token.exit();
        assert_eq!(guard.depth(TITLE), 0);
    }

    #[test]
    fn test_kinds_are_independent() {
        let guard = RecursionGuard::new();
        let _title = guard.enter(TITLE, &page("A"));
        assert!(matches!(
            guard.enter("content", &page("A")),
            Recursion::Entered(_)
        ));
    }

    #[test]
    fn test_clones_share_stacks() {
        let guard = RecursionGuard::new();
        let clone = guard.clone();
        let _token = guard.enter(TITLE, &page("A"));

        assert!(matches!(
            clone.enter(TITLE, &page("A")),
            Recursion::AlreadyPresent
        ));
    }

    #[test]
    fn test_nested_entries_pop_in_order() {
        let guard = RecursionGuard::new();
        let outer = guard.enter(TITLE, &page("A"));
        let inner = guard.enter(TITLE, &page("B"));
        assert_eq!(guard.depth(TITLE), 2);

        drop(inner);
        assert!(guard.contains(TITLE, &page("A")));
        assert!(!guard.contains(TITLE, &page("B")));

        drop(outer);
        assert_eq!(guard.depth(TITLE), 0);
    }

    #[test]
    fn test_pop_survives_panic() {
        let guard = RecursionGuard::new();
        let clone = guard.clone();
        let result = std::panic::catch_unwind(move || {
            let _token = clone.enter(TITLE, &page("A"));
            panic!("render failed");
        });

        assert!(result.is_err());
        assert_eq!(guard.depth(TITLE), 0);
    }
}
