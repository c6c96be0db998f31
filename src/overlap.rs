//! Overlap injection.
//!
//! Each chunk is rewritten independently, so the rewriter needs to see a
//! little of what surrounds it to keep terminology and references
//! consistent across the seam:
//!
//! ```text
//! Chunks:  [ A ] [ B ] [ C ]
//!
//! A' = A ++ head(B)
//! B' = head(A) ++ B ++ head(C)
//! C' = head(B) ++ C
//! ```
//!
//! `head(X)` is built the same way for both sides: whole sentences taken
//! from the start of `X` until the overlap budget would be exceeded. Using
//! one rule for both neighbours keeps the amount of duplicated text
//! predictable. A neighbour whose first sentence alone exceeds the budget
//! contributes nothing.
//!
//! Only `text` changes. Offsets keep describing the slice of the source the
//! chunk was cut from.

use std::sync::Arc;

use crate::chunk::Chunk;
use crate::sentence::SentenceSplitter;
use crate::tokens::TokenEstimator;

const SEPARATOR: &str = "\n\n";

/// Adds neighbour excerpts to chunks.
#[derive(Clone)]
pub struct OverlapInjector {
    splitter: SentenceSplitter,
    estimator: Arc<dyn TokenEstimator>,
}

impl std::fmt::Debug for OverlapInjector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlapInjector")
            .field("splitter", &self.splitter)
            .finish_non_exhaustive()
    }
}

impl OverlapInjector {
    /// Create an injector.
    #[must_use]
    pub fn new(splitter: SentenceSplitter, estimator: Arc<dyn TokenEstimator>) -> Self {
        Self {
            splitter,
            estimator,
        }
    }

    /// Extend every chunk with excerpts of its neighbours' original text.
    ///
    /// Returns the chunks unchanged when `overlap_tokens == 0` or there are
    /// fewer than two chunks.
    #[must_use]
    pub fn inject(&self, chunks: Vec<Chunk>, overlap_tokens: usize) -> Vec<Chunk> {
        if overlap_tokens == 0 || chunks.len() < 2 {
            return chunks;
        }

        let heads: Vec<String> = chunks
            .iter()
            .map(|chunk| self.excerpt(&chunk.text, overlap_tokens))
            .collect();

        let injected: Vec<Chunk> = chunks
            .into_iter()
            .enumerate()
            .map(|(i, mut chunk)| {
                let before = i.checked_sub(1).map_or("", |p| heads[p].as_str());
                let after = heads.get(i + 1).map_or("", String::as_str);
                chunk.text = [before, chunk.text.trim(), after]
                    .into_iter()
                    .filter(|part| !part.is_empty())
                    .collect::<Vec<_>>()
                    .join(SEPARATOR);
                chunk
            })
            .collect();

        tracing::debug!(chunks = injected.len(), overlap_tokens, "injected overlap");
        injected
    }

    /// Leading sentences of `text` fitting within `overlap_tokens`.
    #[must_use]
    pub fn excerpt(&self, text: &str, overlap_tokens: usize) -> String {
        let mut excerpt = String::new();
        for sentence in self.splitter.split(text) {
            let mut candidate = excerpt.clone();
            candidate.push_str(sentence);
            if self.estimator.estimate(&candidate) > overlap_tokens {
                break;
            }
            excerpt = candidate;
        }
        excerpt.trim().to_string()
    }
}
