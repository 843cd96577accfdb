//! Content tree model for Vellum.
//!
//! This crate provides the structural representation of a document body and
//! the tools the display pipeline needs to work with it:
//!
//! - [`ContentTree`] / [`Block`]: a mutable tree of typed blocks with root
//!   [`MetaData`]
//! - Descendant-axis queries and section extraction ([`ContentTree::section`])
//! - [`IdGenerator`]: shared uniqueness generator for block identifiers
//! - [`SyntaxParser`] / [`ParserRegistry`]: parsers keyed by [`Syntax`]
//! - [`PlainTextParser`]: inline-only parser used for titles
//! - [`MarkdownParser`]: `CommonMark` parser built on pulldown-cmark
//!
//! # Example
//!
//! ```
//! use vellum_tree::{ParserRegistry, Syntax};
//!
//! let parsers = ParserRegistry::with_defaults();
//! let tree = parsers
//!     .parse("# Intro\n\nHello", &Syntax::markdown(), "main:Space.Page")
//!     .unwrap();
//!
//! let section = tree.section("Hintro").unwrap();
//! assert_eq!(section.plain_text(), "IntroHello");
//! ```

mod block;
mod id;
mod markdown;
mod parser;
mod plain;
mod syntax;
mod tree;

pub use block::{Block, BlockKind};
pub use id::IdGenerator;
pub use markdown::{MarkdownParser, slugify};
pub use parser::{ParseError, ParserRegistry, SyntaxParser};
pub use plain::{PlainTextParser, parse_inline};
pub use syntax::Syntax;
pub use tree::{ContentTree, MetaData};
