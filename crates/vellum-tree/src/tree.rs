//! Content tree and root metadata.

use std::collections::BTreeMap;

use crate::block::{Block, BlockKind};

/// Key/value bag attached to the root of a [`ContentTree`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct MetaData(BTreeMap<String, String>);

impl MetaData {
    /// Reference used to resolve relative links.
    pub const BASE: &'static str = "base";
    /// Reference of the document the content was parsed from.
    pub const SOURCE: &'static str = "source";
    /// Syntax the content was parsed with.
    pub const SYNTAX: &'static str = "syntax";

    /// Create empty metadata.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace a value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Look up a value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Whether no entries are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Parsed, mutable representation of a document body.
///
/// Queries walk the descendant axis in document order: a block is visited
/// before its children, and children before following siblings.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContentTree {
    /// Root metadata.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "MetaData::is_empty"))]
    pub metadata: MetaData,
    /// Top-level blocks.
    pub children: Vec<Block>,
}

impl ContentTree {
    /// Create a tree without metadata.
    #[must_use]
    pub fn new(children: Vec<Block>) -> Self {
        Self {
            metadata: MetaData::new(),
            children,
        }
    }

    /// Create a tree with the given metadata.
    #[must_use]
    pub fn with_metadata(metadata: MetaData, children: Vec<Block>) -> Self {
        Self { metadata, children }
    }

    /// First block matching `predicate`.
    pub fn find_first(&self, predicate: impl Fn(&Block) -> bool) -> Option<&Block> {
        find_in(&self.children, &predicate)
    }

    /// All blocks matching `predicate`, in document order.
    pub fn find_all(&self, predicate: impl Fn(&Block) -> bool) -> Vec<&Block> {
        let mut found = Vec::new();
        collect_in(&self.children, &predicate, &mut found);
        found
    }

    /// First heading in the tree.
    #[must_use]
    pub fn first_heading(&self) -> Option<&Block> {
        self.find_first(Block::is_heading)
    }

    /// First heading with the given identifier.
    #[must_use]
    pub fn find_heading(&self, id: &str) -> Option<&Block> {
        self.find_first(|block| block.is_heading() && block.id.as_deref() == Some(id))
    }

    /// Call `f` on every block exactly once.
    pub fn for_each_mut(&mut self, mut f: impl FnMut(&mut Block)) {
        visit_mut(&mut self.children, &mut f);
    }

    /// Rebuild a tree from the section introduced by heading `id`.
    ///
    /// The result keeps this tree's metadata so relative references still
    /// resolve against the original document. Returns `None` when no heading
    /// carries `id`.
    #[must_use]
    pub fn section(&self, id: &str) -> Option<ContentTree> {
        let children = section_in(&self.children, id)?;
        Some(Self::with_metadata(self.metadata.clone(), children))
    }

    /// Concatenated text of all blocks.
    #[must_use]
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        for block in &self.children {
            block.write_plain_text(&mut out);
        }
        out
    }
}

fn find_in<'a>(blocks: &'a [Block], predicate: &dyn Fn(&Block) -> bool) -> Option<&'a Block> {
    for block in blocks {
        if predicate(block) {
            return Some(block);
        }
        if let Some(found) = find_in(&block.children, predicate) {
            return Some(found);
        }
    }
    None
}

fn collect_in<'a>(
    blocks: &'a [Block],
    predicate: &dyn Fn(&Block) -> bool,
    found: &mut Vec<&'a Block>,
) {
    for block in blocks {
        if predicate(block) {
            found.push(block);
        }
        collect_in(&block.children, predicate, found);
    }
}

fn visit_mut(blocks: &mut [Block], f: &mut dyn FnMut(&mut Block)) {
    for block in blocks {
        f(block);
        visit_mut(&mut block.children, f);
    }
}

/// Children of the section owning heading `id`.
///
/// A heading wrapped in a [`BlockKind::Section`] yields the section's
/// children. A bare heading yields itself and the following siblings up to
/// the next heading of the same or a higher level.
fn section_in(blocks: &[Block], id: &str) -> Option<Vec<Block>> {
    for (index, block) in blocks.iter().enumerate() {
        if block.kind == BlockKind::Section
            && block
                .children
                .first()
                .is_some_and(|first| is_heading_with_id(first, id))
        {
            return Some(block.children.clone());
        }

        if is_heading_with_id(block, id) {
            let level = block.heading_level().unwrap_or(1);
            let end = blocks[index + 1..]
                .iter()
                .position(|next| next.heading_level().is_some_and(|l| l <= level))
                .map_or(blocks.len(), |offset| index + 1 + offset);
            return Some(blocks[index..end].to_vec());
        }

        if let Some(found) = section_in(&block.children, id) {
            return Some(found);
        }
    }
    None
}

fn is_heading_with_id(block: &Block, id: &str) -> bool {
    block.is_heading() && block.id.as_deref() == Some(id)
}
