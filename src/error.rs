//! Error types for seams.
//!
//! Malformed transcript text is never an error: the segmentation fallbacks
//! always produce some output. Errors come from bad configuration (caught
//! when a chunker or refiner is built) and from the rewrite collaborator
//! (recovered per chunk by the refiner).

/// Errors that can occur while configuring or running the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid token budget (must be > 0).
    #[error("invalid max_tokens: {0} (must be > 0)")]
    InvalidMaxTokens(usize),

    /// Overlap is at least as large as the chunk budget.
    #[error("overlap_tokens {overlap} must be smaller than max_tokens {max_tokens}")]
    OverlapExceedsBudget {
        /// The chunk budget.
        max_tokens: usize,
        /// The overlap that exceeded it.
        overlap: usize,
    },

    /// A chars-per-token ratio that is not a positive finite number.
    #[error("invalid {name}: {value} (must be a positive finite number)")]
    InvalidRatio {
        /// Name of the offending option.
        name: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// A window size option set to zero.
    #[error("invalid {0}: must be > 0")]
    ZeroWindow(&'static str),

    /// Dedup threshold larger than the scan window.
    #[error("dedup_threshold {threshold} exceeds dedup_window {window}")]
    DedupThresholdExceedsWindow {
        /// Minimum overlap length.
        threshold: usize,
        /// Scan window length.
        window: usize,
    },

    /// A speaker pattern failed to compile.
    #[error("invalid speaker pattern {pattern:?}: {source}")]
    InvalidPattern {
        /// The pattern as configured.
        pattern: String,
        /// The regex compile error.
        #[source]
        source: regex::Error,
    },

    /// Worker count of zero.
    #[error("workers must be > 0")]
    InvalidWorkers,

    /// The worker pool could not be started.
    #[error("worker pool error: {0}")]
    WorkerPool(String),

    /// The rewrite collaborator failed for one chunk.
    #[error("rewrite failed: {0}")]
    Rewrite(String),
}

impl Error {
    /// Create a rewrite error from any message.
    pub fn rewrite(msg: impl Into<String>) -> Self {
        Self::Rewrite(msg.into())
    }
}

/// Result type for seams operations.
pub type Result<T> = std::result::Result<T, Error>;
