//! Document model and store abstraction for Vellum.
//!
//! This crate provides the [`Document`] the display pipeline renders and a
//! [`DocumentStore`] trait for loading documents and their translations from
//! the underlying backend. This enables:
//!
//! - **Unit testing** of the display pipeline without touching the filesystem
//! - **Backend flexibility** (filesystem today, anything behind the trait later)
//!
//! # Architecture
//!
//! The crate provides:
//! - [`DocumentReference`]: hierarchical, comparable document identity
//! - [`Document`]: syntax, title, raw content, lazily parsed [`ContentTree`]
//!   and the [`AsyncProperties`] capability bag
//! - [`DocumentStore`] trait with `get_document()` and `get_translation()`
//! - [`FsStore`] implementation reading markdown files and YAML sidecars
//! - [`MockStore`] for testing (behind `mock` feature flag)
//!
//! # Example
//!
//! ```ignore
//! use std::path::PathBuf;
//! use vellum_store::{DocumentReference, DocumentStore, FsStore};
//!
//! let store = FsStore::new(PathBuf::from("docs"), "main");
//! let reference = DocumentReference::parse("main:Guide.Install", "main")?;
//! let document = store.get_document(&reference)?;
//! ```
//!
//! [`ContentTree`]: vellum_tree::ContentTree

mod document;
mod fs;
#[cfg(feature = "mock")]
mod mock;
mod reference;
mod store;

pub use document::{AsyncProperties, Document};
pub use fs::FsStore;
#[cfg(feature = "mock")]
pub use mock::MockStore;
pub use reference::DocumentReference;
pub use store::{DocumentStore, ErrorStatus, StoreError, StoreErrorKind};
