//! Pipeline configuration.
//!
//! ## Budgets
//!
//! Two sizes matter most:
//!
//! - `max_tokens`: the per-chunk budget the rewrite model can accept.
//! - `overlap_tokens`: how much neighbour context each side of a chunk
//!   borrows. Context is added on top of the budget, so a chunk sent to the
//!   model can reach `max_tokens + 2 * overlap_tokens`.
//!
//! Everything else tunes the fallbacks for text without structure and the
//! dedup heuristic on the way back.
//!
//! ## Loading
//!
//! The struct derives `serde` traits with `#[serde(default)]`, so a partial
//! document fills in the rest from [`ChunkConfig::default`]:
//!
//! ```rust
//! use seams::ChunkConfig;
//!
//! let config: ChunkConfig = serde_json::from_str(r#"{"max_tokens": 800}"#).unwrap();
//! assert_eq!(config.max_tokens, 800);
//! assert_eq!(config.dedup_threshold, 50);
//! assert!(config.validate().is_ok());
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default system prompt handed to the rewrite collaborator.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an editor turning speech-recognition \
transcripts into clean, formal written text. Correct recognition errors, typos and \
terminology, complete broken sentences, and remove verbal filler while keeping every \
speaker's meaning. Keep paragraph structure and speaker labels. Output the complete \
text without omitting or truncating anything.";

/// Configuration for chunking, overlap, rewriting and merging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkConfig {
    /// Token budget per chunk (before overlap).
    pub max_tokens: usize,

    /// Tokens of neighbour context injected on each side of a chunk.
    pub overlap_tokens: usize,

    /// A trailing chunk below this many tokens is folded into its
    /// predecessor when the result still fits the budget.
    pub min_chunk_size: usize,

    /// Detect speaker labels, cut on them and tag chunks with them.
    pub preserve_speakers: bool,

    /// Ordered speaker-label patterns (regex syntax).
    pub speaker_patterns: Vec<String>,

    /// Longest accepted speaker name, in chars.
    pub max_speaker_len: usize,

    /// A lone paragraph longer than this many chars means the text has no
    /// real structure, triggering the segmentation fallbacks.
    pub paragraph_threshold: usize,

    /// Window size in chars for the sentence splitter's last resort.
    pub sentence_window: usize,

    /// How far a sentence window end may walk back to find punctuation.
    pub window_backtrack: usize,

    /// Window size in chars for the paragraph segmenter's last resort.
    pub fallback_window: usize,

    /// How far a paragraph window end may walk back to find punctuation.
    pub fallback_backtrack: usize,

    /// Shortest suffix/prefix match, in chars, treated as duplicated overlap.
    pub dedup_threshold: usize,

    /// How many chars at each side of a chunk seam are compared for dedup.
    pub dedup_window: usize,

    /// CJK ideographs per token for the heuristic estimator.
    pub cjk_chars_per_token: f64,

    /// Other chars per token for the heuristic estimator.
    pub other_chars_per_token: f64,

    /// Concurrent rewrite calls (needs the `parallel` feature to exceed 1).
    pub workers: usize,

    /// System prompt passed to the rewrite collaborator.
    pub system_prompt: String,

    /// Strip recogniser debris (timestamps, confidence marks, punctuation
    /// runs, stray whitespace) before chunking.
    pub clean_input: bool,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            max_tokens: 3000,
            overlap_tokens: 500,
            min_chunk_size: 100,
            preserve_speakers: true,
            speaker_patterns: default_speaker_patterns(),
            max_speaker_len: 50,
            paragraph_threshold: 1000,
            sentence_window: 200,
            window_backtrack: 50,
            fallback_window: 1000,
            fallback_backtrack: 100,
            dedup_threshold: 50,
            dedup_window: 200,
            cjk_chars_per_token: 1.3,
            other_chars_per_token: 3.5,
            workers: 1,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            clean_input: true,
        }
    }
}

/// Bracketed labels (`【主持人】`) and line-leading `name:` / `name：` labels.
///
/// Neither pattern bounds the name length; `max_speaker_len` does.
#[must_use]
pub fn default_speaker_patterns() -> Vec<String> {
    vec![
        r"【[^】\n]+】".to_string(),
        r"(?m)^[^：:\n]+[：:]".to_string(),
    ]
}

impl ChunkConfig {
    /// Config with the given chunk budget and defaults elsewhere.
    ///
    /// Overlap defaults to a sixth of the budget so small budgets stay valid.
    #[must_use]
    pub fn new(max_tokens: usize) -> Self {
        Self {
            max_tokens,
            overlap_tokens: max_tokens / 6,
            ..Default::default()
        }
    }

    /// Set the overlap budget.
    #[must_use]
    pub fn with_overlap(mut self, overlap_tokens: usize) -> Self {
        self.overlap_tokens = overlap_tokens;
        self
    }

    /// Set the minimum trailing chunk size.
    #[must_use]
    pub fn with_min_chunk_size(mut self, min_chunk_size: usize) -> Self {
        self.min_chunk_size = min_chunk_size;
        self
    }

    /// Enable or disable speaker handling.
    #[must_use]
    pub fn with_speakers(mut self, preserve_speakers: bool) -> Self {
        self.preserve_speakers = preserve_speakers;
        self
    }

    /// Replace the speaker patterns.
    #[must_use]
    pub fn with_speaker_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.speaker_patterns = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Set the dedup threshold and scan window.
    #[must_use]
    pub fn with_dedup(mut self, threshold: usize, window: usize) -> Self {
        self.dedup_threshold = threshold;
        self.dedup_window = window;
        self
    }

    /// Enable or disable transcript cleanup before chunking.
    #[must_use]
    pub fn with_cleaning(mut self, clean_input: bool) -> Self {
        self.clean_input = clean_input;
        self
    }

    /// Set the number of concurrent rewrite calls.
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Check the configuration, failing fast on values the pipeline cannot
    /// honour. Speaker patterns are compiled (and checked) by
    /// [`SpeakerDetector::from_config`](crate::SpeakerDetector::from_config).
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.max_tokens == 0 {
            return Err(Error::InvalidMaxTokens(self.max_tokens));
        }
        if self.overlap_tokens >= self.max_tokens {
            return Err(Error::OverlapExceedsBudget {
                max_tokens: self.max_tokens,
                overlap: self.overlap_tokens,
            });
        }
        for (name, value) in [
            ("cjk_chars_per_token", self.cjk_chars_per_token),
            ("other_chars_per_token", self.other_chars_per_token),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(Error::InvalidRatio { name, value });
            }
        }
        for (name, value) in [
            ("sentence_window", self.sentence_window),
            ("fallback_window", self.fallback_window),
            ("dedup_window", self.dedup_window),
            ("max_speaker_len", self.max_speaker_len),
        ] {
            if value == 0 {
                return Err(Error::ZeroWindow(name));
            }
        }
        if self.dedup_threshold > self.dedup_window {
            return Err(Error::DedupThresholdExceedsWindow {
                threshold: self.dedup_threshold,
                window: self.dedup_window,
            });
        }
        if self.workers == 0 {
            return Err(Error::InvalidWorkers);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(ChunkConfig::default().validate().is_ok());
    }

    #[test]
    fn test_new_scales_overlap() {
        let config = ChunkConfig::new(60);
        assert_eq!(config.overlap_tokens, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_budget_rejected() {
        let err = ChunkConfig::new(0).validate().unwrap_err();
        assert!(matches!(err, Error::InvalidMaxTokens(0)));
    }

    #[test]
    fn test_overlap_exceeds_budget() {
        let err = ChunkConfig::new(100).with_overlap(100).validate().unwrap_err();
        assert!(matches!(
            err,
            Error::OverlapExceedsBudget {
                max_tokens: 100,
                overlap: 100
            }
        ));
    }

    #[test]
    fn test_bad_ratio() {
        let config = ChunkConfig {
            cjk_chars_per_token: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidRatio {
                name: "cjk_chars_per_token",
                ..
            })
        ));

        let config = ChunkConfig {
            other_chars_per_token: f64::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_dedup_threshold_above_window() {
        let err = ChunkConfig::default().with_dedup(300, 200).validate().unwrap_err();
        assert!(matches!(err, Error::DedupThresholdExceedsWindow { .. }));
    }

    #[test]
    fn test_zero_workers() {
        let err = ChunkConfig::default().with_workers(0).validate().unwrap_err();
        assert!(matches!(err, Error::InvalidWorkers));
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: ChunkConfig =
            serde_json::from_str(r#"{"overlap_tokens": 0, "preserve_speakers": false}"#).unwrap();
        assert_eq!(config.overlap_tokens, 0);
        assert!(!config.preserve_speakers);
        assert_eq!(config.max_tokens, 3000);
        assert_eq!(config.speaker_patterns, default_speaker_patterns());
    }
}
