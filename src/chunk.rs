//! Units, chunks and rewritten chunks: text with provenance metadata.
//!
//! ## Byte Offsets
//!
//! `start` and `end` are byte offsets into the original transcript, matching
//! Rust's string slicing semantics. Before overlap injection a chunk's text
//! is exactly `&source[start..end]`:
//!
//! ```rust
//! use seams::Chunk;
//!
//! let source = "【Alice】Hello.\n\n【Bob】Hi.";
//! let chunk = Chunk::new(&source[0..17], 0, 17, Some("Alice".into()), 0);
//! assert_eq!(&source[chunk.span()], chunk.text);
//! ```
//!
//! ## After Overlap Injection
//!
//! Injection rewrites `text` only. The offsets keep pointing at the slice the
//! chunk was cut from, so they remain useful for tracing output back to the
//! transcript even though the text now carries neighbour context:
//!
//! ```text
//! Source:  [ chunk 0 ][ chunk 1 ][ chunk 2 ]
//! Chunk 1 text after injection:
//!          excerpt(0) ++ chunk 1 ++ excerpt(2)
//! Chunk 1 offsets: unchanged
//! ```

use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Granularity of a [`Unit`].
///
/// The assembler consumes all three the same way; the kind only decides
/// what happens when a unit alone exceeds the token budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitKind {
    /// A blank-line or speaker-delimited paragraph. Re-split into sentences
    /// when oversized.
    Paragraph,
    /// A punctuation-delimited sentence. Re-split when oversized.
    Sentence,
    /// A fixed-size window. Finest grain; emitted as-is when oversized.
    Window,
}

/// A contiguous piece of the source used as the packing grain.
///
/// Units borrow from the source text and are produced in source order. Their
/// spans tile the input: every byte belongs to exactly one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit<'a> {
    /// The unit text, `&source[start..end]`.
    pub text: &'a str,
    /// Byte offset where this unit starts in the source.
    pub start: usize,
    /// Byte offset where this unit ends (exclusive) in the source.
    pub end: usize,
    /// Speaker this unit is attributed to, if any.
    pub speaker: Option<String>,
    /// Granularity.
    pub kind: UnitKind,
}

impl<'a> Unit<'a> {
    /// Create a unit starting at byte `start` of the source.
    #[must_use]
    pub fn new(text: &'a str, start: usize, speaker: Option<String>, kind: UnitKind) -> Self {
        Self {
            text,
            start,
            end: start + text.len(),
            speaker,
            kind,
        }
    }

    /// The byte span of this unit in the source.
    #[must_use]
    pub fn span(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// A token-bounded slice of the transcript queued for rewriting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// The chunk text (extended with neighbour context after injection).
    pub text: String,
    /// Byte offset where this chunk starts in the source.
    pub start: usize,
    /// Byte offset where this chunk ends (exclusive) in the source.
    pub end: usize,
    /// Speaker shared by every unit in the chunk, if they all agree.
    pub speaker: Option<String>,
    /// Zero-based index of this chunk in the sequence.
    pub index: usize,
}

impl Chunk {
    /// Create a new chunk.
    #[must_use]
    pub fn new(
        text: impl Into<String>,
        start: usize,
        end: usize,
        speaker: Option<String>,
        index: usize,
    ) -> Self {
        Self {
            text: text.into(),
            start,
            end,
            speaker,
            index,
        }
    }

    /// The byte span of this chunk in the source.
    #[must_use]
    pub fn span(&self) -> Range<usize> {
        self.start..self.end
    }

    /// The length of the chunk text in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Whether the chunk text is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl std::fmt::Display for Chunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Chunk {{ index: {}, span: {}..{}, len: {}, speaker: {} }}",
            self.index,
            self.start,
            self.end,
            self.len(),
            self.speaker.as_deref().unwrap_or("-")
        )
    }
}

/// A chunk after the rewrite collaborator has processed it.
///
/// Provenance and speaker are carried over from the source chunk; the text
/// is no longer a substring of the transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewrittenChunk {
    /// The rewritten text.
    pub text: String,
    /// Byte offset of the source chunk's start.
    pub start: usize,
    /// Byte offset of the source chunk's end (exclusive).
    pub end: usize,
    /// Speaker of the source chunk.
    pub speaker: Option<String>,
}

impl RewrittenChunk {
    /// Pair rewritten text with the chunk it came from.
    #[must_use]
    pub fn from_chunk(chunk: &Chunk, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            start: chunk.start,
            end: chunk.end,
            speaker: chunk.speaker.clone(),
        }
    }

    /// A rewritten chunk with no provenance, mostly useful for merging text
    /// that did not come from [`TranscriptChunker`](crate::TranscriptChunker).
    #[must_use]
    pub fn detached(text: impl Into<String>, speaker: Option<String>) -> Self {
        Self {
            text: text.into(),
            start: 0,
            end: 0,
            speaker,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_end_from_text() {
        let unit = Unit::new("预算。", 6, None, UnitKind::Sentence);
        assert_eq!(unit.end, 6 + "预算。".len());
        assert_eq!(unit.span(), 6..15);
    }

    #[test]
    fn test_rewritten_keeps_provenance() {
        let chunk = Chunk::new("source", 10, 16, Some("Alice".into()), 3);
        let rewritten = RewrittenChunk::from_chunk(&chunk, "rewritten");
        assert_eq!(rewritten.start, 10);
        assert_eq!(rewritten.end, 16);
        assert_eq!(rewritten.speaker.as_deref(), Some("Alice"));
    }

    #[test]
    fn test_display() {
        let chunk = Chunk::new("abc", 0, 3, None, 0);
        assert_eq!(
            chunk.to_string(),
            "Chunk { index: 0, span: 0..3, len: 3, speaker: - }"
        );
    }
}
