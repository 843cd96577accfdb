//! Typed tree nodes.

use std::collections::BTreeMap;

/// Node type of a [`Block`].
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "snake_case"))]
pub enum BlockKind {
    /// A heading together with the content it introduces.
    ///
    /// The first child is the [`BlockKind::Heading`], the remaining children
    /// form the section body (including nested sections).
    Section,
    /// Heading of the given level (1-6).
    Heading { level: u8 },
    Paragraph,
    Image { url: String },
    Link { url: String },
    Word { text: String },
    Space,
    SpecialSymbol { symbol: char },
    NewLine,
    HorizontalLine,
    Emphasis,
    Strong,
    Code { text: String },
    CodeBlock {
        language: Option<String>,
        content: String,
    },
    List { ordered: bool },
    ListItem,
    Quote,
    /// Unexpanded macro call, expanded by the transformation pass.
    Macro {
        name: String,
        params: BTreeMap<String, String>,
        content: Option<String>,
    },
    Raw { content: String },
    /// Generic container for constructs without a dedicated kind.
    Group,
}

/// A node of a [`ContentTree`](crate::ContentTree).
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Block {
    /// Node type.
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub kind: BlockKind,
    /// Identifier (headings and images).
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub id: Option<String>,
    /// Child blocks.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Vec::is_empty"))]
    pub children: Vec<Block>,
}

impl Block {
    /// Create a block without id or children.
    #[must_use]
    pub fn new(kind: BlockKind) -> Self {
        Self {
            kind,
            id: None,
            children: Vec::new(),
        }
    }

    /// Set the identifier.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the children.
    #[must_use]
    pub fn with_children(mut self, children: Vec<Block>) -> Self {
        self.children = children;
        self
    }

    /// A word.
    #[must_use]
    pub fn word(text: impl Into<String>) -> Self {
        Self::new(BlockKind::Word { text: text.into() })
    }

    /// A single space.
    #[must_use]
    pub fn space() -> Self {
        Self::new(BlockKind::Space)
    }

    /// A paragraph.
    #[must_use]
    pub fn paragraph(children: Vec<Block>) -> Self {
        Self::new(BlockKind::Paragraph).with_children(children)
    }

    /// A heading with an identifier.
    #[must_use]
    pub fn heading(level: u8, id: impl Into<String>, children: Vec<Block>) -> Self {
        Self::new(BlockKind::Heading { level })
            .with_id(id)
            .with_children(children)
    }

    /// A section; `children` should start with its heading.
    #[must_use]
    pub fn section(children: Vec<Block>) -> Self {
        Self::new(BlockKind::Section).with_children(children)
    }

    /// Whether this block is a heading.
    #[must_use]
    pub fn is_heading(&self) -> bool {
        matches!(self.kind, BlockKind::Heading { .. })
    }

    /// Heading level, if this block is a heading.
    #[must_use]
    pub fn heading_level(&self) -> Option<u8> {
        match self.kind {
            BlockKind::Heading { level } => Some(level),
            _ => None,
        }
    }

    /// Whether this block kind carries a rewritable identifier.
    #[must_use]
    pub fn carries_id(&self) -> bool {
        matches!(
            self.kind,
            BlockKind::Heading { .. } | BlockKind::Image { .. }
        )
    }

    /// Concatenated text of this block and its descendants.
    #[must_use]
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        self.write_plain_text(&mut out);
        out
    }

    pub(crate) fn write_plain_text(&self, out: &mut String) {
        match &self.kind {
            BlockKind::Word { text } | BlockKind::Code { text } => out.push_str(text),
            BlockKind::Space => out.push(' '),
            BlockKind::SpecialSymbol { symbol } => out.push(*symbol),
            BlockKind::NewLine => out.push('\n'),
            BlockKind::CodeBlock { content, .. } | BlockKind::Raw { content } => {
                out.push_str(content);
            }
            _ => {}
        }
        for child in &self.children {
            child.write_plain_text(out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_level() {
        let heading = Block::heading(2, "Hintro", vec![Block::word("Intro")]);
        assert!(heading.is_heading());
        assert_eq!(heading.heading_level(), Some(2));
        assert_eq!(Block::paragraph(Vec::new()).heading_level(), None);
    }

    #[test]
    fn test_carries_id() {
        assert!(Block::heading(1, "H", Vec::new()).carries_id());
        assert!(
            Block::new(BlockKind::Image {
                url: "a.png".to_owned()
            })
            .carries_id()
        );
        assert!(!Block::paragraph(Vec::new()).carries_id());
    }

    #[test]
    fn test_plain_text_nested() {
        let block = Block::paragraph(vec![
            Block::word("Hello"),
            Block::space(),
            Block::new(BlockKind::Strong).with_children(vec![Block::word("World")]),
            Block::new(BlockKind::SpecialSymbol { symbol: '!' }),
        ]);
        assert_eq!(block.plain_text(), "Hello World!");
    }
}
