//! Markdown parser built on pulldown-cmark.
//!
//! Events are first collected into a flat list of blocks, then top-level
//! headings are grouped into nested [`BlockKind::Section`] blocks so that
//! section extraction can lift a heading together with its body.
//!
//! Fenced code blocks whose info string starts with `macro:` become
//! [`BlockKind::Macro`] blocks, e.g.
//!
//! ````text
//! ```macro:include reference=main:Space.Page
//! ```
//! ````

use std::collections::{BTreeMap, HashSet};

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag};

use crate::block::{Block, BlockKind};
use crate::parser::{ParseError, SyntaxParser};
use crate::plain::parse_inline;
use crate::syntax::Syntax;
use crate::tree::{ContentTree, MetaData};

const MACRO_PREFIX: &str = "macro:";

/// Parser for the `markdown/1.0` syntax.
#[derive(Clone, Copy, Debug, Default)]
pub struct MarkdownParser;

impl MarkdownParser {
    /// Create a markdown parser.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn options() -> Options {
        Options::ENABLE_TABLES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_HEADING_ATTRIBUTES
    }
}

impl SyntaxParser for MarkdownParser {
    fn syntax(&self) -> Syntax {
        Syntax::markdown()
    }

    fn parse(&self, text: &str, source: &str) -> Result<ContentTree, ParseError> {
        let mut builder = TreeBuilder::default();
        for event in Parser::new_ext(text, Self::options()) {
            builder.process_event(event);
        }

        let metadata = MetaData::new()
            .with(MetaData::BASE, source)
            .with(MetaData::SOURCE, source)
            .with(MetaData::SYNTAX, Syntax::MARKDOWN);
        Ok(ContentTree::with_metadata(
            metadata,
            nest_sections(builder.finish()),
        ))
    }
}

/// Collects pulldown-cmark events into blocks.
#[derive(Default)]
struct TreeBuilder {
    /// Open container blocks, innermost last.
    stack: Vec<Block>,
    /// Completed top-level blocks.
    root: Vec<Block>,
    /// Heading ids already issued within this document.
    issued_ids: HashSet<String>,
}

impl TreeBuilder {
    fn process_event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(_) => self.end_tag(),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => self.push(Block::new(BlockKind::Code {
                text: code.to_string(),
            })),
            Event::Html(html) | Event::InlineHtml(html) => self.push(Block::new(BlockKind::Raw {
                content: html.to_string(),
            })),
            Event::SoftBreak | Event::HardBreak => self.push(Block::new(BlockKind::NewLine)),
            Event::Rule => self.push(Block::new(BlockKind::HorizontalLine)),
            Event::TaskListMarker(checked) => self.push(Block::new(BlockKind::SpecialSymbol {
                symbol: if checked { 'x' } else { ' ' },
            })),
            Event::FootnoteReference(_) | Event::InlineMath(_) | Event::DisplayMath(_) => {
                // Not supported
            }
        }
    }

    fn start_tag(&mut self, tag: Tag<'_>) {
        let block = match tag {
            Tag::Paragraph => Block::new(BlockKind::Paragraph),
            Tag::Heading { level, id, .. } => {
                let mut block = Block::new(BlockKind::Heading {
                    level: heading_depth(level),
                });
                block.id = id.map(|id| id.to_string());
                block
            }
            Tag::BlockQuote(_) => Block::new(BlockKind::Quote),
            Tag::CodeBlock(kind) => code_block(&kind),
            Tag::List(start) => Block::new(BlockKind::List {
                ordered: start.is_some(),
            }),
            Tag::Item => Block::new(BlockKind::ListItem),
            Tag::Emphasis => Block::new(BlockKind::Emphasis),
            Tag::Strong => Block::new(BlockKind::Strong),
            Tag::Link { dest_url, .. } => Block::new(BlockKind::Link {
                url: dest_url.to_string(),
            }),
            Tag::Image { dest_url, .. } => {
                let name = dest_url.rsplit('/').next().unwrap_or_default();
                Block::new(BlockKind::Image {
                    url: dest_url.to_string(),
                })
                .with_id(format!("I{}", slugify(name)))
            }
            _ => Block::new(BlockKind::Group),
        };
        self.stack.push(block);
    }

    fn end_tag(&mut self) {
        let Some(mut block) = self.stack.pop() else {
            return;
        };
        if block.is_heading() && block.id.is_none() {
            block.id = Some(self.generate_heading_id(&block.plain_text()));
        }
        self.push(block);
    }

    fn text(&mut self, text: &str) {
        if let Some(top) = self.stack.last_mut() {
            match &mut top.kind {
                BlockKind::CodeBlock { content, .. } => {
                    content.push_str(text);
                    return;
                }
                BlockKind::Macro { content, .. } => {
                    content.get_or_insert_with(String::new).push_str(text);
                    return;
                }
                _ => {}
            }
        }
        for block in parse_inline(text) {
            self.push(block);
        }
    }

    fn push(&mut self, block: Block) {
        match self.stack.last_mut() {
            Some(parent) => parent.children.push(block),
            None => self.root.push(block),
        }
    }

    /// Generate a unique heading id (`H` + slug) within this document.
    fn generate_heading_id(&mut self, text: &str) -> String {
        let base_id = format!("H{}", slugify(text));
        let mut id = base_id.clone();
        let mut n = 0;
        // A suffixed id may already belong to a heading titled like it.
        while self.issued_ids.contains(&id) {
            n += 1;
            id = format!("{base_id}-{n}");
        }
        self.issued_ids.insert(id.clone());
        id
    }

    fn finish(mut self) -> Vec<Block> {
        // Unbalanced events should not happen, but never drop content.
        while !self.stack.is_empty() {
            self.end_tag();
        }
        self.root
    }
}

fn code_block(kind: &CodeBlockKind<'_>) -> Block {
    let info = match kind {
        CodeBlockKind::Fenced(info) => info.trim(),
        CodeBlockKind::Indented => "",
    };

    if let Some(invocation) = info.strip_prefix(MACRO_PREFIX) {
        let mut parts = invocation.split_whitespace();
        let name = parts.next().unwrap_or_default().to_owned();
        let params: BTreeMap<String, String> = parts
            .filter_map(|part| part.split_once('='))
            .map(|(k, v)| (k.to_owned(), v.trim_matches('"').to_owned()))
            .collect();
        return Block::new(BlockKind::Macro {
            name,
            params,
            content: None,
        });
    }

    let language = info
        .split_whitespace()
        .next()
        .filter(|lang| !lang.is_empty())
        .map(ToOwned::to_owned);
    Block::new(BlockKind::CodeBlock {
        language,
        content: String::new(),
    })
}

/// Group top-level headings with the blocks that follow them.
fn nest_sections(blocks: Vec<Block>) -> Vec<Block> {
    let mut root = Vec::new();
    let mut open: Vec<(u8, Block)> = Vec::new();

    for block in blocks {
        if let Some(level) = block.heading_level() {
            while open.last().is_some_and(|(l, _)| *l >= level) {
                close_section(&mut open, &mut root);
            }
            open.push((level, Block::section(vec![block])));
        } else if let Some((_, section)) = open.last_mut() {
            section.children.push(block);
        } else {
            root.push(block);
        }
    }
    while !open.is_empty() {
        close_section(&mut open, &mut root);
    }
    root
}

fn close_section(open: &mut Vec<(u8, Block)>, root: &mut Vec<Block>) {
    if let Some((_, section)) = open.pop() {
        match open.last_mut() {
            Some((_, parent)) => parent.children.push(section),
            None => root.push(section),
        }
    }
}

fn heading_depth(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// Lowercase ASCII words of `text` joined by dashes.
///
/// Everything but ASCII letters and digits separates words.
///
/// ```
/// use vellum_tree::slugify;
///
/// assert_eq!(slugify("Getting Started!"), "getting-started");
/// ```
#[must_use]
pub fn slugify(text: &str) -> String {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}
