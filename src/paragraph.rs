//! Paragraph segmentation.
//!
//! Transcripts arrive in every shape between "neatly paragraphed, one
//! speaker label per turn" and "a single line of 50,000 characters". The
//! segmenter tries the structure the text actually has, then degrades:
//!
//! ```text
//! primary  blank lines + speaker lines     "【A】...\n\n...\n【B】..."
//!    ↓ no units, or one unit > threshold chars
//! (a)      speaker markers anywhere        "...【A】......【B】......"
//!    ↓ none found
//! (b)      sentences packed to budget / 2  "...。...。...。"
//!    ↓ fewer than two sentences
//! (c)      punctuation-aware windows
//! ```
//!
//! Every strategy only chooses cut offsets; the units between consecutive
//! cuts tile the input, so coverage holds no matter which level runs.
//!
//! ## Speaker Attribution
//!
//! A unit that opens with a speaker label carries that speaker. A unit
//! without a label of its own inherits the speaker of the unit before it:
//! the speaker is still talking across the paragraph break.

use std::sync::Arc;

use crate::chunk::{Unit, UnitKind};
use crate::config::ChunkConfig;
use crate::error::Result;
use crate::sentence::SentenceSplitter;
use crate::speaker::SpeakerDetector;
use crate::tokens::TokenEstimator;
use crate::window::split_windows;

/// Groups transcript lines into paragraph units.
#[derive(Clone)]
pub struct ParagraphSegmenter {
    detector: SpeakerDetector,
    splitter: SentenceSplitter,
    estimator: Arc<dyn TokenEstimator>,
    max_tokens: usize,
    threshold: usize,
    fallback_window: usize,
    fallback_backtrack: usize,
}

impl std::fmt::Debug for ParagraphSegmenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParagraphSegmenter")
            .field("detector", &self.detector)
            .field("splitter", &self.splitter)
            .field("max_tokens", &self.max_tokens)
            .field("threshold", &self.threshold)
            .field("fallback_window", &self.fallback_window)
            .finish_non_exhaustive()
    }
}

impl ParagraphSegmenter {
    /// Create a segmenter with default thresholds for a `max_tokens` budget.
    #[must_use]
    pub fn new(
        detector: SpeakerDetector,
        splitter: SentenceSplitter,
        estimator: Arc<dyn TokenEstimator>,
        max_tokens: usize,
    ) -> Self {
        Self {
            detector,
            splitter,
            estimator,
            max_tokens,
            threshold: 1000,
            fallback_window: 1000,
            fallback_backtrack: 100,
        }
    }

    /// Build the segmenter described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if a speaker pattern fails to compile.
    pub fn from_config(config: &ChunkConfig, estimator: Arc<dyn TokenEstimator>) -> Result<Self> {
        Ok(Self {
            detector: SpeakerDetector::from_config(config)?,
            splitter: SentenceSplitter::new(config.sentence_window, config.window_backtrack),
            estimator,
            max_tokens: config.max_tokens,
            threshold: config.paragraph_threshold,
            fallback_window: config.fallback_window,
            fallback_backtrack: config.fallback_backtrack,
        })
    }

    /// Set the char length above which a lone paragraph triggers fallbacks.
    #[must_use]
    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set the last-resort window size and walk-back distance.
    #[must_use]
    pub fn with_fallback_window(mut self, window: usize, backtrack: usize) -> Self {
        self.fallback_window = window;
        self.fallback_backtrack = backtrack;
        self
    }

    /// Split `text` into ordered paragraph units covering it exactly.
    #[must_use]
    pub fn segment<'a>(&self, text: &'a str) -> Vec<Unit<'a>> {
        if text.is_empty() {
            return vec![];
        }

        let units = self.by_lines(text);
        let unstructured = units.is_empty()
            || (units.len() == 1 && units[0].text.chars().count() > self.threshold);
        if !unstructured {
            tracing::debug!(units = units.len(), "segmented on lines");
            return units;
        }

        if let Some(units) = self.by_markers(text) {
            tracing::debug!(units = units.len(), "segmented on inline speaker markers");
            return units;
        }
        if let Some(units) = self.by_sentences(text) {
            tracing::debug!(units = units.len(), "segmented on packed sentences");
            return units;
        }
        let units = self.by_windows(text);
        tracing::debug!(units = units.len(), "segmented on fixed windows");
        units
    }

    /// Primary strategy: cut before a paragraph that follows a blank line
    /// and before every speaker line.
    fn by_lines<'a>(&self, text: &'a str) -> Vec<Unit<'a>> {
        let mut cuts = vec![0];
        let mut offset = 0;
        let mut has_content = false;
        let mut after_blank = false;

        for line in text.split_inclusive('\n') {
            let line_start = offset;
            offset += line.len();

            if line.trim().is_empty() {
                after_blank = true;
                continue;
            }
            let speaker_line = self.detector.detect(line).is_some();
            if has_content && (after_blank || speaker_line) {
                cuts.push(line_start);
            }
            has_content = true;
            after_blank = false;
        }

        self.units_from_cuts(text, &cuts, UnitKind::Paragraph)
    }

    /// Fallback (a): cut at every speaker marker, wherever it occurs.
    fn by_markers<'a>(&self, text: &'a str) -> Option<Vec<Unit<'a>>> {
        let markers = self.detector.markers(text);
        if markers.iter().all(|&m| m == 0) {
            return None;
        }
        let cuts: Vec<usize> = std::iter::once(0)
            .chain(markers.into_iter().filter(|&m| m > 0))
            .collect();
        Some(self.units_from_cuts(text, &cuts, UnitKind::Paragraph))
    }

    /// Fallback (b): pack sentences into paragraphs of at most half the
    /// chunk budget. A sentence over that bound stands alone.
    fn by_sentences<'a>(&self, text: &'a str) -> Option<Vec<Unit<'a>>> {
        let sentences = self.splitter.split_units(text, 0, None);
        if sentences.len() < 2 {
            return None;
        }

        let bound = (self.max_tokens / 2).max(1);
        let mut cuts = vec![0];
        for sentence in &sentences[1..] {
            let current = cuts.last().copied().unwrap_or(0);
            if self.estimator.estimate(&text[current..sentence.end]) > bound {
                cuts.push(sentence.start);
            }
        }
        Some(self.units_from_cuts(text, &cuts, UnitKind::Paragraph))
    }

    /// Fallback (c): fixed windows walked back to punctuation.
    fn by_windows<'a>(&self, text: &'a str) -> Vec<Unit<'a>> {
        let windows = split_windows(text, self.fallback_window, self.fallback_backtrack);
        let cuts: Vec<usize> = windows
            .iter()
            .scan(0, |offset, window| {
                let start = *offset;
                *offset += window.len();
                Some(start)
            })
            .collect();
        self.units_from_cuts(text, &cuts, UnitKind::Window)
    }

    /// Slice `text` at ascending `cuts` (the first must be 0) and attribute
    /// speakers, inheriting across units without a label.
    fn units_from_cuts<'a>(&self, text: &'a str, cuts: &[usize], kind: UnitKind) -> Vec<Unit<'a>> {
        let ends = cuts.iter().skip(1).copied().chain(std::iter::once(text.len()));
        let mut speaker: Option<String> = None;

        cuts.iter()
            .copied()
            .zip(ends)
            .filter(|(start, end)| start < end)
            .map(|(start, end)| {
                let slice = &text[start..end];
                if let Some(own) = self.detector.detect(slice.trim_start()) {
                    speaker = Some(own);
                }
                Unit::new(slice, start, speaker.clone(), kind)
            })
            .collect()
    }
}
