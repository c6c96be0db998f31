//! Token-bounded chunk assembly.
//!
//! Packs units greedily into chunks, recursing into units that are too big
//! on their own.
//!
//! ## The Algorithm
//!
//! Given `max_tokens = 100`:
//!
//! ```text
//! Units:   [P1: 40] [P2: 50] [P3: 30] [P4: 260] [P5: 20]
//!
//! 1. P1 + P2 = 90 ≤ 100           -> keep packing
//! 2. P1 + P2 + P3 = 120 > 100     -> close [P1 P2], start [P3]
//! 3. P4 alone is 260 > 100        -> close [P3]; split P4 into sentences
//!                                    and pack those as their own run
//! 4. P5                            -> starts a fresh chunk after P4's run
//! ```
//!
//! ## Why Recursive?
//!
//! A paragraph that blows the budget is re-split into sentences, a sentence
//! that still does into clauses or windows, following [`UnitKind`]. A window
//! is the finest grain there is: one that alone exceeds the budget becomes a
//! forced over-budget chunk rather than being cut mid-word. Text is never
//! dropped to satisfy the budget.
//!
//! ## Speakers
//!
//! A chunk carries a speaker only when every unit in it carries that same
//! speaker. A chunk spanning a turn change, or containing unattributed text,
//! has none.

use std::sync::Arc;

use crate::chunk::{Chunk, Unit, UnitKind};
use crate::sentence::SentenceSplitter;
use crate::tokens::TokenEstimator;

/// Greedy packer of units into token-bounded chunks.
#[derive(Clone)]
pub struct ChunkAssembler {
    splitter: SentenceSplitter,
    estimator: Arc<dyn TokenEstimator>,
    min_chunk_size: usize,
}

impl std::fmt::Debug for ChunkAssembler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkAssembler")
            .field("splitter", &self.splitter)
            .field("min_chunk_size", &self.min_chunk_size)
            .finish_non_exhaustive()
    }
}

/// A chunk under construction.
struct Draft {
    text: String,
    start: usize,
    end: usize,
    /// `Some` while every unit so far shares this speaker.
    speaker: Option<String>,
}

impl Draft {
    fn from_unit(unit: &Unit<'_>) -> Self {
        Self {
            text: unit.text.to_string(),
            start: unit.start,
            end: unit.end,
            speaker: unit.speaker.clone(),
        }
    }

    fn push(&mut self, text: &str, end: usize, speaker: Option<&str>) {
        self.text.push_str(text);
        self.end = end;
        if self.speaker.as_deref() != speaker {
            self.speaker = None;
        }
    }

    fn with(&self, text: &str) -> String {
        let mut candidate = String::with_capacity(self.text.len() + text.len());
        candidate.push_str(&self.text);
        candidate.push_str(text);
        candidate
    }
}

impl ChunkAssembler {
    /// Create an assembler. `min_chunk_size` is in tokens; `0` disables
    /// folding of a small trailing chunk.
    #[must_use]
    pub fn new(
        splitter: SentenceSplitter,
        estimator: Arc<dyn TokenEstimator>,
        min_chunk_size: usize,
    ) -> Self {
        Self {
            splitter,
            estimator,
            min_chunk_size,
        }
    }

    /// Pack `units` into chunks of at most `max_tokens` estimated tokens.
    ///
    /// Contiguous units produce contiguous chunks covering the same text.
    #[must_use]
    pub fn assemble(&self, units: &[Unit<'_>], max_tokens: usize) -> Vec<Chunk> {
        let mut drafts = Vec::new();
        self.pack(units, max_tokens, &mut drafts);
        self.fold_tail(&mut drafts, max_tokens);

        tracing::debug!(
            units = units.len(),
            chunks = drafts.len(),
            max_tokens,
            "assembled chunks"
        );

        drafts
            .into_iter()
            .enumerate()
            .map(|(index, d)| Chunk::new(d.text, d.start, d.end, d.speaker, index))
            .collect()
    }

    fn pack(&self, units: &[Unit<'_>], max_tokens: usize, out: &mut Vec<Draft>) {
        let mut current: Option<Draft> = None;

        for unit in units {
            if self.estimator.estimate(unit.text) > max_tokens {
                out.extend(current.take());
                self.split_oversized(unit, max_tokens, out);
                continue;
            }

            current = match current.take() {
                Some(mut draft) if self.fits(&draft.with(unit.text), max_tokens) => {
                    draft.push(unit.text, unit.end, unit.speaker.as_deref());
                    Some(draft)
                }
                Some(draft) => {
                    out.push(draft);
                    Some(Draft::from_unit(unit))
                }
                None => Some(Draft::from_unit(unit)),
            };
        }

        out.extend(current);
    }

    fn fits(&self, text: &str, max_tokens: usize) -> bool {
        self.estimator.estimate(text) <= max_tokens
    }

    fn split_oversized(&self, unit: &Unit<'_>, max_tokens: usize, out: &mut Vec<Draft>) {
        let pieces = match unit.kind {
            UnitKind::Paragraph | UnitKind::Sentence => {
                self.splitter
                    .split_units(unit.text, unit.start, unit.speaker.as_deref())
            }
            UnitKind::Window => Vec::new(),
        };

        if pieces.len() < 2 {
            tracing::debug!(
                start = unit.start,
                end = unit.end,
                max_tokens,
                "unit cannot be split further, emitting over budget"
            );
            out.push(Draft::from_unit(unit));
            return;
        }
        self.pack(&pieces, max_tokens, out);
    }

    /// Fold a trailing chunk smaller than `min_chunk_size` into its
    /// predecessor when the two still fit the budget together.
    fn fold_tail(&self, drafts: &mut Vec<Draft>, max_tokens: usize) {
        if self.min_chunk_size == 0 || drafts.len() < 2 {
            return;
        }
        let Some(last) = drafts.last() else {
            return;
        };
        if self.estimator.estimate(&last.text) >= self.min_chunk_size {
            return;
        }
        let prev = &drafts[drafts.len() - 2];
        if self.estimator.estimate(&prev.with(&last.text)) > max_tokens {
            return;
        }
        if let Some(last) = drafts.pop() {
            if let Some(prev) = drafts.last_mut() {
                prev.push(&last.text, last.end, last.speaker.as_deref());
            }
        }
    }
}
