//! The transcript chunking pipeline.
//!
//! ```text
//! text ─ ParagraphSegmenter ─▶ units ─ ChunkAssembler ─▶ chunks ─ OverlapInjector ─▶ chunks'
//! ```
//!
//! [`TranscriptChunker::split`] stops before injection and returns chunks
//! that tile the transcript exactly; [`Chunker::chunk`] runs all three
//! stages and returns chunks ready for rewriting.

use std::sync::Arc;

use crate::assembler::ChunkAssembler;
use crate::chunk::{Chunk, Unit};
use crate::config::ChunkConfig;
use crate::error::Result;
use crate::overlap::OverlapInjector;
use crate::paragraph::ParagraphSegmenter;
use crate::sentence::SentenceSplitter;
use crate::tokens::{HeuristicEstimator, TokenEstimator};
use crate::Chunker;

/// Segments, packs and overlaps transcripts.
///
/// ## Example
///
/// ```rust
/// use seams::{ChunkConfig, Chunker, TranscriptChunker};
///
/// let chunker = TranscriptChunker::new(ChunkConfig::new(3000)).unwrap();
/// let chunks = chunker.chunk("【主持人】大家好。\n\n今天我们讨论预算。");
///
/// assert_eq!(chunks.len(), 1);
/// assert_eq!(chunks[0].speaker.as_deref(), Some("主持人"));
/// ```
#[derive(Clone)]
pub struct TranscriptChunker {
    config: ChunkConfig,
    estimator: Arc<dyn TokenEstimator>,
    segmenter: ParagraphSegmenter,
    assembler: ChunkAssembler,
    injector: OverlapInjector,
}

impl std::fmt::Debug for TranscriptChunker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranscriptChunker")
            .field("config", &self.config)
            .field("segmenter", &self.segmenter)
            .field("assembler", &self.assembler)
            .field("injector", &self.injector)
            .finish_non_exhaustive()
    }
}

impl TranscriptChunker {
    /// Build a chunker using the heuristic token estimator.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` is invalid.
    pub fn new(config: ChunkConfig) -> Result<Self> {
        let estimator = HeuristicEstimator::new(
            config.cjk_chars_per_token,
            config.other_chars_per_token,
        );
        Self::with_estimator(config, Arc::new(estimator))
    }

    /// Build a chunker counting tokens with `estimator`, typically a
    /// closure over the target model's tokenizer.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` is invalid.
    pub fn with_estimator(config: ChunkConfig, estimator: Arc<dyn TokenEstimator>) -> Result<Self> {
        config.validate()?;
        let splitter = SentenceSplitter::new(config.sentence_window, config.window_backtrack);
        let segmenter = ParagraphSegmenter::from_config(&config, estimator.clone())?;
        let assembler = ChunkAssembler::new(splitter, estimator.clone(), config.min_chunk_size);
        let injector = OverlapInjector::new(splitter, estimator.clone());
        Ok(Self {
            config,
            estimator,
            segmenter,
            assembler,
            injector,
        })
    }

    /// The configuration this chunker was built from.
    #[must_use]
    pub fn config(&self) -> &ChunkConfig {
        &self.config
    }

    /// The token estimator in use.
    #[must_use]
    pub fn estimator(&self) -> &Arc<dyn TokenEstimator> {
        &self.estimator
    }

    /// Segment `text` into paragraph units.
    #[must_use]
    pub fn units<'a>(&self, text: &'a str) -> Vec<Unit<'a>> {
        self.segmenter.segment(text)
    }

    /// Chunk `text` without overlap. The chunks tile `text` exactly.
    #[must_use]
    pub fn split(&self, text: &str) -> Vec<Chunk> {
        if text.is_empty() {
            return vec![];
        }

        let units = self.segmenter.segment(text);
        if self.estimator.estimate(text) <= self.config.max_tokens {
            return vec![Chunk::new(text, 0, text.len(), shared_speaker(&units), 0)];
        }
        self.assembler.assemble(&units, self.config.max_tokens)
    }
}

impl Chunker for TranscriptChunker {
    fn chunk(&self, text: &str) -> Vec<Chunk> {
        let chunks = self.split(text);
        tracing::debug!(
            bytes = text.len(),
            chunks = chunks.len(),
            "chunked transcript"
        );
        self.injector.inject(chunks, self.config.overlap_tokens)
    }
}

/// The speaker every unit agrees on, if any.
fn shared_speaker(units: &[Unit<'_>]) -> Option<String> {
    let first = units.first()?.speaker.as_deref()?;
    units
        .iter()
        .all(|u| u.speaker.as_deref() == Some(first))
        .then(|| first.to_string())
}
