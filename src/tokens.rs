//! Token estimation.
//!
//! Chunk budgets are expressed in model tokens, but the exact tokenizer is
//! usually behind the model collaborator. The pipeline therefore takes an
//! injected [`TokenEstimator`]: pass a closure that calls a real tokenizer
//! when one is available, or use the [`HeuristicEstimator`] default.
//!
//! ## The Heuristic
//!
//! ```text
//! tokens = floor(cjk_chars / 1.3 + other_chars / 3.5), at least 1
//!
//! "大家好"          -> 3 / 1.3           = 2
//! "hello world"    -> 11 / 3.5          = 3
//! "预算 budget"     -> 2 / 1.3 + 7 / 3.5 = 3
//! ```
//!
//! CJK ideographs carry far more information per character than Latin
//! script, so they are counted at a much denser ratio.

/// Maps a text span to an approximate model-token count.
pub trait TokenEstimator: Send + Sync {
    /// Estimate the number of tokens in `text`.
    fn estimate(&self, text: &str) -> usize;
}

impl<F> TokenEstimator for F
where
    F: Fn(&str) -> usize + Send + Sync,
{
    fn estimate(&self, text: &str) -> usize {
        self(text)
    }
}

/// Character-ratio token estimator.
///
/// ## Example
///
/// ```rust
/// use seams::{HeuristicEstimator, TokenEstimator};
///
/// let estimator = HeuristicEstimator::default();
/// assert_eq!(estimator.estimate(""), 0);
/// assert_eq!(estimator.estimate("a"), 1);
/// assert_eq!(estimator.estimate("hello world"), 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeuristicEstimator {
    cjk_chars_per_token: f64,
    other_chars_per_token: f64,
}

impl HeuristicEstimator {
    /// Create an estimator with explicit ratios.
    ///
    /// Ratios are validated by [`ChunkConfig::validate`](crate::ChunkConfig::validate);
    /// this constructor trusts its input.
    #[must_use]
    pub const fn new(cjk_chars_per_token: f64, other_chars_per_token: f64) -> Self {
        Self {
            cjk_chars_per_token,
            other_chars_per_token,
        }
    }
}

impl Default for HeuristicEstimator {
    fn default() -> Self {
        Self::new(1.3, 3.5)
    }
}

impl TokenEstimator for HeuristicEstimator {
    fn estimate(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        let (cjk, other) = text.chars().fold((0usize, 0usize), |(cjk, other), c| {
            if is_cjk_ideograph(c) {
                (cjk + 1, other)
            } else {
                (cjk, other + 1)
            }
        });
        let tokens =
            cjk as f64 / self.cjk_chars_per_token + other as f64 / self.other_chars_per_token;
        (tokens.floor() as usize).max(1)
    }
}

/// Whether `c` lies in the CJK Unified Ideographs block.
pub(crate) fn is_cjk_ideograph(c: char) -> bool {
    ('\u{4e00}'..='\u{9fff}').contains(&c)
}
