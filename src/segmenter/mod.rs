//! Deterministic markdown segmentation.
//!
//! [`segment`] turns a markdown document into an ordered sequence of
//! bounded-size [`Section`]s in three passes:
//!
//! 1. split the top-level block sequence at heading boundaries ([`tree`]);
//! 2. merge undersized sections left to right so tiny fragments do not become
//!    retrieval units of their own;
//! 3. cut oversized sections into even character-sized chunks tagged with
//!    `part`/`total`.
//!
//! The whole pipeline is pure: `&str` in, owned sections out, no hidden
//! state, safe to run in parallel across documents.

mod tree;

use serde::{Deserialize, Serialize};

use tree::RawSection;

/// A bounded, heading-tagged fragment of a document, the unit persisted for
/// later retrieval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Markdown source for this section. Never empty.
    pub content: String,
    /// Nearest preceding heading text, inherited across merges and splits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<String>,
    /// 1-based chunk index, present only when an oversized section was
    /// subdivided.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part: Option<usize>,
    /// Number of chunks the parent section was cut into.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
}

/// Size bounds for [`segment`], in characters (Unicode scalar values).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentOptions {
    /// Sections longer than this are cut into even chunks.
    pub max_section_len: usize,
    /// Sections shorter than this are folded into the next one.
    pub min_section_len: usize,
}

impl Default for SegmentOptions {
    fn default() -> Self {
        Self {
            max_section_len: 2500,
            min_section_len: 200,
        }
    }
}

/// Segments a markdown document into bounded [`Section`]s.
///
/// Empty input yields an empty sequence; a document without headings yields
/// sections cut only by the size passes. Segmentation itself has no failure
/// path: every input string has a defined output.
///
/// Chunk boundaries are character-based, not token- or word-aware, so a cut
/// may fall inside a word. That is an accepted simplification.
pub fn segment(content: &str, options: &SegmentOptions) -> Vec<Section> {
    let raw = tree::split_by_heading(content);
    let merged = merge_undersized(raw, options.min_section_len);
    split_oversized(merged, options.max_section_len)
}

/// Folds sections below `min_len` into their successor with a blank-line
/// join. The accumulator's heading wins; the incoming section's heading is
/// taken only when the accumulator has none. The final accumulator is always
/// emitted, even below the threshold.
fn merge_undersized(raw: Vec<RawSection>, min_len: usize) -> Vec<RawSection> {
    let mut merged: Vec<RawSection> = Vec::new();
    let mut current: Option<RawSection> = None;

    for section in raw {
        let Some(acc) = current.as_mut() else {
            current = Some(section);
            continue;
        };

        if acc.content.chars().count() < min_len {
            acc.content.push_str("\n\n");
            acc.content.push_str(&section.content);
            if acc.heading.is_none() {
                acc.heading = section.heading;
            }
        } else {
            merged.push(std::mem::replace(acc, section));
        }
    }

    if let Some(acc) = current {
        merged.push(acc);
    }

    merged
}

/// Cuts sections longer than `max_len` into `ceil(len / max_len)` contiguous
/// chunks of `ceil(len / number_chunks)` characters each (the last may be
/// shorter). The rounding is a pinned contract; chunk boundaries must stay
/// bit-identical across reimplementations.
fn split_oversized(merged: Vec<RawSection>, max_len: usize) -> Vec<Section> {
    let mut sections = Vec::with_capacity(merged.len());

    for section in merged {
        let len = section.content.chars().count();
        if len <= max_len {
            sections.push(Section {
                content: section.content,
                heading: section.heading,
                part: None,
                total: None,
            });
            continue;
        }

        let number_chunks = len.div_ceil(max_len);
        let chunk_size = len.div_ceil(number_chunks);
        for (index, chunk) in split_even(&section.content, number_chunks, chunk_size)
            .into_iter()
            .enumerate()
        {
            sections.push(Section {
                content: chunk,
                heading: section.heading.clone(),
                part: Some(index + 1),
                total: Some(number_chunks),
            });
        }
    }

    sections
}

/// Cuts `content` into `number_chunks` substrings of `chunk_size` characters,
/// clamped to the end of the string. Cuts always land on char boundaries.
fn split_even(content: &str, number_chunks: usize, chunk_size: usize) -> Vec<String> {
    let mut boundaries: Vec<usize> = content.char_indices().map(|(offset, _)| offset).collect();
    boundaries.push(content.len());
    let clamp = |chars: usize| boundaries[chars.min(boundaries.len() - 1)];

    (0..number_chunks)
        .map(|index| content[clamp(index * chunk_size)..clamp((index + 1) * chunk_size)].to_string())
        .collect()
}
