//! # seams
//!
//! Token-bounded chunking, overlap injection and reassembly for speech
//! transcripts sent through a language model.
//!
//! ## The Problem
//!
//! A meeting transcript is often longer than a model's context window. To
//! clean it up (fix recognition errors, punctuate, drop fillers) you have to
//! cut it into pieces, rewrite each one, and stitch the results back
//! together. Every step can hurt:
//!
//! - A cut mid-sentence leaves the model half a thought to rewrite
//! - A cut mid-turn loses who was speaking
//! - Without context, each piece drifts in terminology and tone
//! - With context, the rewritten pieces repeat each other at the seams
//!
//! ## The Pipeline
//!
//! ```text
//!            ┌─────────────────────┐
//! text ────▶ │ TextCleaner         │  timestamps, confidence marks,
//!            └─────────┬───────────┘  punctuation runs, whitespace
//!                      ▼
//!            ┌─────────────────────┐
//!            │ ParagraphSegmenter  │  blank lines, speaker turns,
//!            └─────────┬───────────┘  sentences, windows
//!                      ▼ units
//!            ┌─────────────────────┐
//!            │ ChunkAssembler      │  greedy packing under max_tokens,
//!            └─────────┬───────────┘  recursive re-splitting
//!                      ▼ chunks (tile the input)
//!            ┌─────────────────────┐
//!            │ OverlapInjector     │  neighbour excerpts for context
//!            └─────────┬───────────┘
//!                      ▼ chunks'
//!            ┌─────────────────────┐
//!            │ Rewriter (yours)    │  one call per chunk
//!            └─────────┬───────────┘
//!                      ▼ rewritten
//!            ┌─────────────────────┐
//! doc  ◀──── │ Merger              │  seam dedup, speaker grouping
//!            └─────────────────────┘
//! ```
//!
//! ## Segmentation Levels
//!
//! | Level | Cut at | Used when |
//! |-------|--------|-----------|
//! | Lines | blank lines, speaker lines | the text has either |
//! | Markers | inline `【speaker】` / `name:` | a single run of turns |
//! | Sentences | `。！？.!?` | no structure at all |
//! | Windows | fixed size, nearest punctuation | no terminators either |
//!
//! ## Token Budgets
//!
//! Budgets are estimates. The default [`HeuristicEstimator`] counts CJK
//! ideographs at 1.3 chars per token and everything else at 3.5; plug in a
//! real tokenizer through [`TokenEstimator`], which any
//! `Fn(&str) -> usize` closure implements.
//!
//! ## Quick Start
//!
//! ```rust
//! use seams::{ChunkConfig, Chunker, TranscriptChunker};
//!
//! let transcript = "【主持人】大家好，今天讨论预算。\n\n【嘉宾】好的，我先说两点。";
//!
//! let chunker = TranscriptChunker::new(ChunkConfig::new(3000)).unwrap();
//! let chunks = chunker.chunk(transcript);
//!
//! assert_eq!(chunks.len(), 1);
//! assert_eq!(chunks[0].span(), 0..transcript.len());
//! ```
//!
//! ## Round Trip
//!
//! ```rust
//! use seams::{ChunkConfig, Refiner, Result, RewriteRequest, Rewriter};
//!
//! struct Echo;
//!
//! impl Rewriter for Echo {
//!     fn rewrite(&self, request: &RewriteRequest<'_>) -> Result<String> {
//!         Ok(request.text.to_string())
//!     }
//! }
//!
//! let refiner = Refiner::new(ChunkConfig::default()).unwrap();
//! let doc = refiner.refine("【Alice】Hello there.", &Echo);
//! assert_eq!(doc, "【Alice】\nHello there.");
//! ```

mod assembler;
mod chunk;
mod chunker;
mod cleaner;
mod config;
mod error;
mod merge;
mod overlap;
mod paragraph;
mod refine;
mod sentence;
mod speaker;
mod tokens;
mod window;

pub use assembler::ChunkAssembler;
pub use chunk::{Chunk, RewrittenChunk, Unit, UnitKind};
pub use chunker::TranscriptChunker;
pub use cleaner::TextCleaner;
pub use config::{default_speaker_patterns, ChunkConfig, DEFAULT_SYSTEM_PROMPT};
pub use error::{Error, Result};
pub use merge::Merger;
pub use overlap::OverlapInjector;
pub use paragraph::ParagraphSegmenter;
pub use refine::{Refiner, RewriteRequest, Rewriter};
pub use sentence::SentenceSplitter;
pub use speaker::{format_speaker, SpeakerDetector};
pub use tokens::{HeuristicEstimator, TokenEstimator};
pub use window::split_windows;

/// A transcript chunking strategy.
///
/// ```rust
/// use seams::{Chunk, ChunkConfig, Chunker, TranscriptChunker};
///
/// fn chunk_transcript(chunker: &dyn Chunker, text: &str) -> Vec<Chunk> {
///     chunker.chunk(text)
/// }
///
/// let chunker = TranscriptChunker::new(ChunkConfig::default()).unwrap();
/// let chunks = chunk_transcript(&chunker, "Hello. This is a test.");
/// assert_eq!(chunks.len(), 1);
/// ```
pub trait Chunker: Send + Sync {
    /// Split text into chunks ready for rewriting.
    ///
    /// Each [`Chunk`] carries the byte range of the transcript it was cut
    /// from; its text may include context from its neighbours.
    fn chunk(&self, text: &str) -> Vec<Chunk>;
}
