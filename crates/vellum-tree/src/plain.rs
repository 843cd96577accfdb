//! Plain text parser.
//!
//! Produces inline blocks only (words, spaces, special symbols and line
//! breaks), never a paragraph wrapper. Titles are parsed with it.

use crate::block::{Block, BlockKind};
use crate::parser::{ParseError, SyntaxParser};
use crate::syntax::Syntax;
use crate::tree::{ContentTree, MetaData};

/// Parser for the `plain/1.0` syntax.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlainTextParser;

impl SyntaxParser for PlainTextParser {
    fn syntax(&self) -> Syntax {
        Syntax::plain()
    }

    fn parse(&self, text: &str, source: &str) -> Result<ContentTree, ParseError> {
        let metadata = MetaData::new()
            .with(MetaData::SOURCE, source)
            .with(MetaData::SYNTAX, Syntax::PLAIN);
        Ok(ContentTree::with_metadata(metadata, parse_inline(text)))
    }
}

/// Split `text` into inline blocks.
///
/// # Example
///
/// ```
/// use vellum_tree::{Block, parse_inline};
///
/// assert_eq!(parse_inline("WebHome"), vec![Block::word("WebHome")]);
/// ```
#[must_use]
pub fn parse_inline(text: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut word = String::new();

    for c in text.chars() {
        let block = match c {
            '\r' => continue,
            '\n' => Block::new(BlockKind::NewLine),
            c if c.is_whitespace() => Block::space(),
            c if c.is_ascii_punctuation() => Block::new(BlockKind::SpecialSymbol { symbol: c }),
            c => {
                word.push(c);
                continue;
            }
        };
        if !word.is_empty() {
            blocks.push(Block::word(std::mem::take(&mut word)));
        }
        blocks.push(block);
    }
    if !word.is_empty() {
        blocks.push(Block::word(word));
    }
    blocks
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_single_word() {
        assert_eq!(parse_inline("WebHome"), vec![Block::word("WebHome")]);
    }

    #[test]
    fn test_words_spaces_symbols() {
        assert_eq!(
            parse_inline("Hello, World"),
            vec![
                Block::word("Hello"),
                Block::new(BlockKind::SpecialSymbol { symbol: ',' }),
                Block::space(),
                Block::word("World"),
            ]
        );
    }

    #[test]
    fn test_line_breaks() {
        assert_eq!(
            parse_inline("a\r\nb"),
            vec![
                Block::word("a"),
                Block::new(BlockKind::NewLine),
                Block::word("b"),
            ]
        );
    }

    #[test]
    fn test_empty() {
        assert!(parse_inline("").is_empty());
    }

    #[test]
    fn test_parser_sets_metadata() {
        let tree = PlainTextParser.parse("x", "main:A.B").unwrap();
        assert_eq!(tree.metadata.get(MetaData::SOURCE), Some("main:A.B"));
        assert_eq!(tree.metadata.get(MetaData::SYNTAX), Some("plain/1.0"));
        assert_eq!(tree.children, vec![Block::word("x")]);
    }
}
