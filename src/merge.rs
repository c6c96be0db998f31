//! Overlap deduplication and reassembly.
//!
//! ## The Problem
//!
//! Overlap injection duplicates context into neighbouring chunks. After the
//! rewriter runs, that context may come back twice, once at the end of one
//! chunk and once at the start of the next, but paraphrased, so there is no
//! exact duplicate to look for and no offset to cut at.
//!
//! ## Best-Effort Dedup
//!
//! The merger compares the tail of the previous chunk's content with the
//! head of the current one and looks for the longest exact suffix/prefix
//! match:
//!
//! ```text
//! prev tail (≤ 200 chars):  "...团队决定把明年的预算集中投入到研发方向。"
//! curr head (≤ 200 chars):  "团队决定把明年的预算集中投入到研发方向。另外..."
//!                            └──────── match ≥ threshold ────────┘
//! kept:                     "另外..."
//! ```
//!
//! A match shorter than the threshold (50 chars by default) is treated as
//! coincidence, not overlap, and nothing is removed. Paraphrased overlap
//! survives; the heuristic never deletes content it is unsure about.
//!
//! ## Speaker Grouping
//!
//! A chunk whose first line is nothing but a `【speaker】` tag belongs to
//! that speaker. Chunks with the same tag as the previous one are appended
//! to the same block under a single tag; a different tag starts a new block
//! after a blank line. Untagged content continues whatever block is open,
//! including a tagged one. A bracket that merely opens a line of content,
//! such as `【注】预算…`, is content, not a tag.

use crate::chunk::RewrittenChunk;
use crate::config::ChunkConfig;
use crate::speaker::format_speaker;

const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// Joins rewritten chunks into one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Merger {
    threshold: usize,
    window: usize,
}

/// A run of paragraphs under one speaker tag (or none).
struct Block {
    tag: Option<String>,
    paragraphs: Vec<String>,
}

impl Block {
    fn render(&self) -> String {
        let body = self.paragraphs.join(PARAGRAPH_SEPARATOR);
        match &self.tag {
            Some(tag) if body.is_empty() => tag.clone(),
            Some(tag) => format!("{tag}\n{body}"),
            None => body,
        }
    }
}

impl Merger {
    /// Create a merger stripping overlaps of at least `threshold` chars
    /// found within `window` chars of each seam.
    #[must_use]
    pub const fn new(threshold: usize, window: usize) -> Self {
        Self { threshold, window }
    }

    /// The merger described by `config`.
    #[must_use]
    pub fn from_config(config: &ChunkConfig) -> Self {
        Self::new(config.dedup_threshold, config.dedup_window)
    }

    /// Merge rewritten chunks, in order, into a single document.
    ///
    /// ## Example
    ///
    /// ```rust
    /// use seams::{Merger, RewrittenChunk};
    ///
    /// let chunks = vec![
    ///     RewrittenChunk::detached("First part.", Some("Alice".into())),
    ///     RewrittenChunk::detached("Second part.", Some("Alice".into())),
    ///     RewrittenChunk::detached("Reply.", Some("Bob".into())),
    /// ];
    /// let doc = Merger::default().merge(&chunks);
    ///
    /// assert_eq!(doc, "【Alice】\nFirst part.\n\nSecond part.\n\n【Bob】\nReply.");
    /// ```
    #[must_use]
    pub fn merge(&self, chunks: &[RewrittenChunk]) -> String {
        let mut blocks: Vec<Block> = Vec::new();
        let mut previous_speaker: Option<String> = None;
        let mut previous_content = String::new();

        for chunk in chunks {
            let text = with_speaker_tag(chunk);
            let text = text.trim();
            if text.is_empty() {
                continue;
            }

            match split_tag(text) {
                Some((tag, content)) if previous_speaker.as_deref() == Some(tag) => {
                    let deduped = self.deduplicate(&previous_content, content);
                    if !deduped.is_empty() {
                        push_paragraph(&mut blocks, deduped);
                        previous_content = deduped.to_string();
                    }
                }
                Some((tag, content)) => {
                    let paragraphs = if content.is_empty() {
                        Vec::new()
                    } else {
                        vec![content.to_string()]
                    };
                    blocks.push(Block {
                        tag: Some(tag.to_string()),
                        paragraphs,
                    });
                    previous_speaker = Some(tag.to_string());
                    previous_content = content.to_string();
                }
                None => {
                    let deduped = self.deduplicate(&previous_content, text);
                    if !deduped.is_empty() {
                        push_paragraph(&mut blocks, deduped);
                        previous_content = deduped.to_string();
                    }
                }
            }
        }

        tracing::debug!(
            chunks = chunks.len(),
            blocks = blocks.len(),
            "merged chunks"
        );

        blocks
            .iter()
            .map(Block::render)
            .filter(|block| !block.is_empty())
            .collect::<Vec<_>>()
            .join(PARAGRAPH_SEPARATOR)
    }

    /// Strip from the start of `current` the longest suffix of `previous`
    /// that it repeats, if that overlap is at least the threshold long.
    ///
    /// ```rust
    /// use seams::Merger;
    ///
    /// let merger = Merger::new(5, 200);
    /// assert_eq!(merger.deduplicate("say hello world", "hello world again"), "again");
    /// assert_eq!(merger.deduplicate("say hi", "hi again"), "hi again");
    /// ```
    #[must_use]
    pub fn deduplicate<'a>(&self, previous: &str, current: &'a str) -> &'a str {
        if previous.is_empty() || current.is_empty() {
            return current;
        }

        // Char-start byte offsets of the compared regions.
        let tail: Vec<usize> = {
            let mut starts: Vec<usize> = previous
                .char_indices()
                .rev()
                .take(self.window)
                .map(|(i, _)| i)
                .collect();
            starts.reverse();
            starts
        };
        let head: Vec<usize> = current
            .char_indices()
            .map(|(i, _)| i)
            .skip(1)
            .chain(std::iter::once(current.len()))
            .take(self.window)
            .collect();

        let longest = tail.len().min(head.len());
        let shortest = self.threshold.max(1);
        for len in (shortest..=longest).rev() {
            let suffix = &previous[tail[tail.len() - len]..];
            let prefix_end = head[len - 1];
            if suffix == &current[..prefix_end] {
                return current[prefix_end..].trim();
            }
        }
        current
    }
}

impl Default for Merger {
    fn default() -> Self {
        Self::new(50, 200)
    }
}

/// The chunk text with its speaker tag on its own first line.
///
/// A chunk that opens with its own tag inline gets the tag moved onto its
/// own line; one that opens with some other bracket is left alone.
fn with_speaker_tag(chunk: &RewrittenChunk) -> String {
    let Some(speaker) = chunk.speaker.as_deref().filter(|s| !s.is_empty()) else {
        return chunk.text.clone();
    };
    let text = chunk.text.trim_start();
    let tag = format_speaker(speaker);
    if let Some(rest) = text.strip_prefix(tag.as_str()) {
        format!("{tag}\n{}", rest.trim_start())
    } else if text.starts_with('【') {
        chunk.text.clone()
    } else {
        format!("{tag}\n{text}")
    }
}

/// Split a leading tag line off `text`, returning the tag and the trimmed
/// remainder. The first line must be exactly one `【…】` tag.
fn split_tag(text: &str) -> Option<(&str, &str)> {
    let (first_line, rest) = text.split_once('\n').unwrap_or((text, ""));
    let tag = first_line.trim();
    let name = tag.strip_prefix('【')?.strip_suffix('】')?;
    if name.is_empty() || name.contains('】') {
        return None;
    }
    Some((tag, rest.trim()))
}

fn push_paragraph(blocks: &mut Vec<Block>, paragraph: &str) {
    match blocks.last_mut() {
        Some(block) => block.paragraphs.push(paragraph.to_string()),
        None => blocks.push(Block {
            tag: None,
            paragraphs: vec![paragraph.to_string()],
        }),
    }
}
