//! Rewriting chunks through an external collaborator.
//!
//! The language model sits behind the [`Rewriter`] trait. [`Refiner`] runs
//! the whole round trip:
//!
//! ```text
//! transcript ─ chunk ─▶ [c0, c1, c2] ─ rewrite each ─▶ [r0, r1, r2] ─ merge ─▶ document
//! ```
//!
//! With `clean_input` on (the default), the transcript first goes through
//! [`TextCleaner`], and chunk offsets refer to the cleaned text.
//!
//! ## Failure Isolation
//!
//! Chunks are rewritten independently. When the collaborator fails for one
//! chunk, that chunk's input text is used unchanged and the others carry on;
//! a flaky model degrades the document instead of aborting it.
//!
//! ## Parallelism
//!
//! Overlap is injected before any call, so no chunk's rewrite depends on
//! another's output. With the `parallel` feature and `workers > 1`, calls
//! run on a bounded rayon pool; results are collected in chunk order before
//! merging, which the dedup pass relies on.

use std::borrow::Cow;

use crate::chunk::{Chunk, RewrittenChunk};
use crate::chunker::TranscriptChunker;
use crate::cleaner::TextCleaner;
use crate::config::ChunkConfig;
use crate::error::Result;
use crate::merge::Merger;
use crate::Chunker;

/// What the rewrite collaborator receives for one chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewriteRequest<'a> {
    /// Chunk text, including injected neighbour context.
    pub text: &'a str,
    /// Speaker the chunk is attributed to.
    pub speaker: Option<&'a str>,
    /// Zero-based chunk index.
    pub index: usize,
    /// Number of chunks in the transcript.
    pub total: usize,
    /// System prompt to send with the text.
    pub system_prompt: &'a str,
}

impl RewriteRequest<'_> {
    /// A note telling the model where this chunk sits, for multi-chunk
    /// transcripts.
    ///
    /// ```rust
    /// use seams::RewriteRequest;
    ///
    /// let request = RewriteRequest {
    ///     text: "...",
    ///     speaker: None,
    ///     index: 1,
    ///     total: 3,
    ///     system_prompt: "",
    /// };
    /// assert_eq!(
    ///     request.context_note().as_deref(),
    ///     Some("This is part 2 of 3. Keep it consistent with the surrounding parts.")
    /// );
    /// ```
    #[must_use]
    pub fn context_note(&self) -> Option<String> {
        (self.total > 1).then(|| {
            format!(
                "This is part {} of {}. Keep it consistent with the surrounding parts.",
                self.index + 1,
                self.total
            )
        })
    }
}

/// The external rewrite collaborator.
///
/// Called exactly once per chunk. Implementations own retries, provider
/// selection and authentication; an `Err` makes the refiner keep the
/// chunk's original text.
pub trait Rewriter: Send + Sync {
    /// Rewrite one chunk.
    ///
    /// # Errors
    ///
    /// Any failure to produce rewritten text, usually [`Error::Rewrite`](crate::Error::Rewrite).
    fn rewrite(&self, request: &RewriteRequest<'_>) -> Result<String>;
}

/// Chunk, rewrite and merge a transcript.
#[derive(Debug, Clone)]
pub struct Refiner {
    chunker: TranscriptChunker,
    merger: Merger,
    cleaner: TextCleaner,
}

impl Refiner {
    /// Build a refiner from `config` with the heuristic token estimator.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` is invalid.
    pub fn new(config: ChunkConfig) -> Result<Self> {
        Self::with_chunker(TranscriptChunker::new(config)?)
    }

    /// Build a refiner around an existing chunker.
    ///
    /// # Errors
    ///
    /// Returns an error if the cleanup rules fail to compile.
    pub fn with_chunker(chunker: TranscriptChunker) -> Result<Self> {
        Ok(Self {
            merger: Merger::from_config(chunker.config()),
            cleaner: TextCleaner::new()?,
            chunker,
        })
    }

    /// The chunker in use.
    #[must_use]
    pub fn chunker(&self) -> &TranscriptChunker {
        &self.chunker
    }

    /// Chunk `text`, rewrite every chunk with `rewriter`, and merge the
    /// results into one document.
    pub fn refine(&self, text: &str, rewriter: &dyn Rewriter) -> String {
        let text = if self.chunker.config().clean_input {
            let cleaned = self.cleaner.clean(text);
            tracing::debug!(
                before = text.len(),
                after = cleaned.len(),
                "cleaned transcript"
            );
            Cow::Owned(cleaned)
        } else {
            Cow::Borrowed(text)
        };

        let chunks = self.chunker.chunk(&text);
        if chunks.is_empty() {
            return String::new();
        }
        tracing::info!(chunks = chunks.len(), "rewriting transcript");

        let rewritten = self.rewrite_all(&chunks, rewriter);
        let document = self.merger.merge(&rewritten);

        tracing::info!(
            chunks = rewritten.len(),
            bytes = document.len(),
            "transcript rewritten"
        );
        document
    }

    /// Rewrite every chunk, in order. Failed chunks keep their input text.
    pub fn rewrite_all(&self, chunks: &[Chunk], rewriter: &dyn Rewriter) -> Vec<RewrittenChunk> {
        let workers = self.chunker.config().workers;
        if workers > 1 && chunks.len() > 1 {
            #[cfg(feature = "parallel")]
            {
                match self.rewrite_parallel(chunks, rewriter, workers) {
                    Ok(rewritten) => return rewritten,
                    Err(err) => {
                        tracing::warn!(
                            error = %err,
                            "worker pool unavailable, rewriting sequentially"
                        );
                    }
                }
            }
            #[cfg(not(feature = "parallel"))]
            {
                tracing::debug!(workers, "parallel feature disabled, rewriting sequentially");
            }
        }

        chunks
            .iter()
            .map(|chunk| self.rewrite_one(chunk, chunks.len(), rewriter))
            .collect()
    }

    #[cfg(feature = "parallel")]
    fn rewrite_parallel(
        &self,
        chunks: &[Chunk],
        rewriter: &dyn Rewriter,
        workers: usize,
    ) -> Result<Vec<RewrittenChunk>> {
        use rayon::prelude::*;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()
            .map_err(|e| crate::Error::WorkerPool(e.to_string()))?;

        let total = chunks.len();
        Ok(pool.install(|| {
            chunks
                .par_iter()
                .map(|chunk| self.rewrite_one(chunk, total, rewriter))
                .collect()
        }))
    }

    fn rewrite_one(&self, chunk: &Chunk, total: usize, rewriter: &dyn Rewriter) -> RewrittenChunk {
        let request = RewriteRequest {
            text: &chunk.text,
            speaker: chunk.speaker.as_deref(),
            index: chunk.index,
            total,
            system_prompt: &self.chunker.config().system_prompt,
        };

        match rewriter.rewrite(&request) {
            Ok(output) => {
                let cleaned = self.clean_output(&output);
                tracing::info!(
                    chunk = chunk.index + 1,
                    total,
                    input_bytes = chunk.text.len(),
                    output_bytes = cleaned.len(),
                    "rewrote chunk"
                );
                RewrittenChunk::from_chunk(chunk, cleaned)
            }
            Err(err) => {
                tracing::warn!(
                    chunk = chunk.index + 1,
                    total,
                    error = %err,
                    "rewrite failed, keeping original text"
                );
                RewrittenChunk::from_chunk(chunk, chunk.text.clone())
            }
        }
    }

    /// Drop reasoning blocks and collapse the blank runs they leave behind.
    #[must_use]
    pub fn clean_output(&self, output: &str) -> String {
        self.cleaner.strip_reasoning(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Upper;

    impl Rewriter for Upper {
        fn rewrite(&self, request: &RewriteRequest<'_>) -> Result<String> {
            Ok(request.text.to_uppercase())
        }
    }

    /// Fails on one chunk index, echoes the rest.
    struct FailOn {
        index: usize,
        calls: AtomicUsize,
    }

    impl Rewriter for FailOn {
        fn rewrite(&self, request: &RewriteRequest<'_>) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if request.index == self.index {
                Err(Error::rewrite("model unavailable"))
            } else {
                Ok(format!("ok {}", request.index))
            }
        }
    }

    fn config() -> ChunkConfig {
        ChunkConfig::new(6).with_overlap(0).with_min_chunk_size(0)
    }

    const TEXT: &str = "first part here.\n\nsecond part here.\n\nthird part here.";

    #[test]
    fn test_refine_round_trip() {
        let refiner = Refiner::new(config()).unwrap();
        let doc = refiner.refine(TEXT, &Upper);
        assert_eq!(doc, "FIRST PART HERE.\n\nSECOND PART HERE.\n\nTHIRD PART HERE.");
    }

    #[test]
    fn test_failure_keeps_original_and_continues() {
        let refiner = Refiner::new(config()).unwrap();
        let rewriter = FailOn {
            index: 1,
            calls: AtomicUsize::new(0),
        };
        let doc = refiner.refine(TEXT, &rewriter);
        assert_eq!(rewriter.calls.load(Ordering::SeqCst), 3);
        assert_eq!(doc, "ok 0\n\nsecond part here.\n\nok 2");
    }

    #[test]
    fn test_empty_transcript() {
        let refiner = Refiner::new(config()).unwrap();
        assert_eq!(refiner.refine("", &Upper), "");
    }

    #[test]
    fn test_clean_output() {
        let refiner = Refiner::new(config()).unwrap();
        let output =
            "<think>\nplan\n</think>\n\n\n\nClean text.\n\n\n\nMore. <Reasoning>x</Reasoning>";
        assert_eq!(refiner.clean_output(output), "Clean text.\n\nMore.");
    }

    #[test]
    fn test_request_carries_position() {
        struct Record(std::sync::Mutex<Vec<(usize, usize)>>);
        impl Rewriter for Record {
            fn rewrite(&self, request: &RewriteRequest<'_>) -> Result<String> {
                if let Ok(mut seen) = self.0.lock() {
                    seen.push((request.index, request.total));
                }
                Ok(request.text.to_string())
            }
        }

        let refiner = Refiner::new(config()).unwrap();
        let record = Record(std::sync::Mutex::new(Vec::new()));
        let _ = refiner.refine(TEXT, &record);
        let seen = record.0.into_inner().unwrap();
        assert_eq!(seen, vec![(0, 3), (1, 3), (2, 3)]);
    }

    #[test]
    fn test_workers_preserve_order() {
        let refiner = Refiner::new(config().with_workers(4)).unwrap();
        let doc = refiner.refine(TEXT, &Upper);
        assert_eq!(doc, "FIRST PART HERE.\n\nSECOND PART HERE.\n\nTHIRD PART HERE.");
    }

    #[test]
    fn test_input_cleaned_before_chunking() {
        struct Echo;
        impl Rewriter for Echo {
            fn rewrite(&self, request: &RewriteRequest<'_>) -> Result<String> {
                Ok(request.text.to_string())
            }
        }

        let raw = "[00:00:01]大家好(0.91)。。。\n\n\n\n今天讨论预算！！";
        let refiner = Refiner::new(ChunkConfig::default()).unwrap();
        assert_eq!(refiner.refine(raw, &Echo), "大家好。\n\n今天讨论预算！");

        let raw = "大家好(0.91)。。。\n\n今天讨论预算！！";
        let refiner = Refiner::new(ChunkConfig::default().with_cleaning(false)).unwrap();
        assert_eq!(refiner.refine(raw, &Echo), raw);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_rewrites_merge_in_order() {
        use std::time::Duration;

        /// Earlier chunks finish last; tracks how many calls overlap.
        struct SlowFirst {
            in_flight: AtomicUsize,
            peak: AtomicUsize,
        }

        impl Rewriter for SlowFirst {
            fn rewrite(&self, request: &RewriteRequest<'_>) -> Result<String> {
                let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                self.peak.fetch_max(now, Ordering::SeqCst);
                let delay = (request.total - request.index) as u64 * 100;
                std::thread::sleep(Duration::from_millis(delay));
                self.in_flight.fetch_sub(1, Ordering::SeqCst);
                Ok(request.text.to_uppercase())
            }
        }

        let refiner = Refiner::new(config().with_workers(3)).unwrap();
        let rewriter = SlowFirst {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        };

        let chunks = refiner.chunker().chunk(TEXT);
        let rewritten = refiner.rewrite_all(&chunks, &rewriter);
        let starts: Vec<usize> = rewritten.iter().map(|r| r.start).collect();
        let expected: Vec<usize> = chunks.iter().map(|c| c.start).collect();
        assert_eq!(starts, expected);
        assert!(rewriter.peak.load(Ordering::SeqCst) > 1);

        let doc = refiner.refine(TEXT, &rewriter);
        assert_eq!(doc, "FIRST PART HERE.\n\nSECOND PART HERE.\n\nTHIRD PART HERE.");
    }

    #[test]
    fn test_context_note_single_chunk() {
        let request = RewriteRequest {
            text: "x",
            speaker: None,
            index: 0,
            total: 1,
            system_prompt: "",
        };
        assert_eq!(request.context_note(), None);
    }
}
