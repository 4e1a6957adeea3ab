//! Markdown block tree parsing and heading-aware splitting.
//!
//! The segmenter only cares about the ordered sequence of top-level block
//! nodes. Each block keeps its source byte range, so section text is always a
//! verbatim slice of the input rather than a re-rendered approximation.

use std::ops::Range;

use pulldown_cmark::{Event, Options, Parser, Tag};

/// A top-level block node with its source range.
///
/// `heading` is `Some` exactly when the block is a heading; it holds the
/// heading's inline text with markup stripped.
#[derive(Debug, Clone)]
pub(crate) struct Block {
    pub range: Range<usize>,
    pub heading: Option<String>,
}

/// A contiguous group of blocks led by (at most) one heading.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RawSection {
    pub content: String,
    pub heading: Option<String>,
}

fn parser_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_FOOTNOTES
}

/// Parses `content` into its ordered top-level block sequence.
///
/// For `Start` events the offset iterator reports the source range of the
/// whole element, which is exactly the block span we need. Nested events are
/// tracked only to know when the walk returns to the top level.
pub(crate) fn parse_blocks(content: &str) -> Vec<Block> {
    let mut blocks: Vec<Block> = Vec::new();
    let mut depth = 0usize;
    // Inline text accumulator, active while inside a top-level heading.
    let mut heading_text: Option<String> = None;

    for (event, range) in Parser::new_ext(content, parser_options()).into_offset_iter() {
        match event {
            Event::Start(tag) => {
                if depth == 0 {
                    let is_heading = matches!(tag, Tag::Heading { .. });
                    blocks.push(Block {
                        range: range.clone(),
                        heading: None,
                    });
                    heading_text = is_heading.then(String::new);
                }
                depth += 1;
            }
            Event::End(_) => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    if let (Some(text), Some(block)) = (heading_text.take(), blocks.last_mut()) {
                        block.heading = Some(text);
                    }
                }
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some(buffer) = heading_text.as_mut() {
                    buffer.push_str(&text);
                }
            }
            // Standalone top-level events (thematic breaks, loose HTML) are
            // blocks of their own.
            _ if depth == 0 => {
                blocks.push(Block {
                    range: range.clone(),
                    heading: None,
                });
            }
            _ => {}
        }
    }

    blocks
}

/// Partitions the top-level block sequence into heading-led groups.
///
/// A new group starts exactly at each heading block, with the heading as its
/// first element. Blocks before the first heading accumulate into the first
/// group. A document with no headings yields exactly one group; empty input
/// yields none.
pub(crate) fn split_by_heading(content: &str) -> Vec<RawSection> {
    let mut groups: Vec<(Range<usize>, Option<String>)> = Vec::new();

    for block in parse_blocks(content) {
        match groups.last_mut() {
            Some((range, _)) if block.heading.is_none() => range.end = block.range.end,
            _ => groups.push((block.range.clone(), block.heading)),
        }
    }

    groups
        .into_iter()
        .map(|(range, heading)| RawSection {
            content: content[range].trim_end().to_string(),
            heading,
        })
        .collect()
}
