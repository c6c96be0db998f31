//! Property-based tests for transcript chunking.
//!
//! These tests verify that the pipeline maintains key invariants:
//! - Coverage: pre-overlap chunks tile the entire input
//! - Fidelity: each chunk's text is exactly its slice of the input
//! - Budget: chunks built from fitting sentences stay within budget
//! - Totality: the splitters never drop or duplicate text

use proptest::prelude::*;
use seams::{
    split_windows, Chunk, ChunkConfig, Chunker, HeuristicEstimator, Merger, RewrittenChunk,
    SentenceSplitter, TokenEstimator, TranscriptChunker,
};

// =============================================================================
// Test Generators
// =============================================================================

/// Transcript-like text: CJK, Latin, punctuation, speaker labels, blank lines.
fn transcript_text() -> impl Strategy<Value = String> {
    let piece = prop_oneof![
        prop::string::string_regex("[一-龥]{1,30}").unwrap(),
        prop::string::string_regex("[A-Za-z ]{1,30}").unwrap(),
        Just("。".to_string()),
        Just("，".to_string()),
        Just(". ".to_string()),
        Just("\n".to_string()),
        Just("\n\n".to_string()),
        Just("【主持人】".to_string()),
        Just("嘉宾：".to_string()),
        Just("Alice: ".to_string()),
    ];
    prop::collection::vec(piece, 0..60).prop_map(|pieces| pieces.concat())
}

/// Latin sentences of at most five short words each.
fn sentence_like_text() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::string::string_regex("[a-z]{2,12}").unwrap(), 3..60).prop_map(
        |words| {
            let mut result = String::new();
            for (i, word) in words.iter().enumerate() {
                result.push_str(word);
                if i % 5 == 4 {
                    result.push_str(". ");
                } else {
                    result.push(' ');
                }
            }
            result
        },
    )
}

// =============================================================================
// Invariant Helpers
// =============================================================================

fn chunks_tile_input(chunks: &[Chunk], text: &str) -> bool {
    if chunks.is_empty() {
        return text.is_empty();
    }
    if chunks[0].start != 0 || chunks.last().map(|c| c.end) != Some(text.len()) {
        return false;
    }
    let contiguous = chunks.windows(2).all(|pair| pair[0].end == pair[1].start);
    let faithful = chunks.iter().all(|c| text.get(c.span()) == Some(c.text.as_str()));
    let indexed = chunks.iter().enumerate().all(|(i, c)| c.index == i);
    contiguous && faithful && indexed
}

fn chunker(max_tokens: usize, min_chunk_size: usize) -> TranscriptChunker {
    let config = ChunkConfig::new(max_tokens)
        .with_overlap(max_tokens / 4)
        .with_min_chunk_size(min_chunk_size);
    TranscriptChunker::new(config).unwrap()
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn split_tiles_transcript(text in transcript_text(), max in 8usize..120) {
        let chunks = chunker(max, 0).split(&text);
        prop_assert!(chunks_tile_input(&chunks, &text));
    }

    #[test]
    fn folding_keeps_tiling(text in transcript_text(), max in 8usize..120) {
        let chunks = chunker(max, max / 3).split(&text);
        prop_assert!(chunks_tile_input(&chunks, &text));
    }

    #[test]
    fn overlap_keeps_spans(text in transcript_text(), max in 8usize..120) {
        let chunker = chunker(max, 0);
        let plain = chunker.split(&text);
        let overlapped = chunker.chunk(&text);
        prop_assert_eq!(plain.len(), overlapped.len());
        for (p, o) in plain.iter().zip(&overlapped) {
            prop_assert_eq!(p.span(), o.span());
            prop_assert_eq!(&p.speaker, &o.speaker);
        }
    }

    #[test]
    fn fitting_sentences_respect_budget(text in sentence_like_text(), max in 30usize..80) {
        let estimator = HeuristicEstimator::default();
        let chunks = chunker(max, 5).split(&text);
        for chunk in &chunks {
            prop_assert!(
                estimator.estimate(&chunk.text) <= max,
                "chunk of {} tokens over budget {}",
                estimator.estimate(&chunk.text),
                max
            );
        }
    }

    #[test]
    fn sentence_split_is_total(text in transcript_text()) {
        let pieces = SentenceSplitter::new(16, 4).split(&text);
        prop_assert_eq!(pieces.concat(), text.clone());
        prop_assert!(pieces.iter().all(|p| !p.is_empty()));
    }

    #[test]
    fn windows_are_total(text in ".{0,300}", size in 1usize..40, backtrack in 0usize..10) {
        let windows = split_windows(&text, size, backtrack);
        prop_assert_eq!(windows.concat(), text.clone());
        prop_assert!(windows.iter().all(|w| !w.is_empty()));
    }

    #[test]
    fn short_untagged_chunks_merge_verbatim(
        texts in prop::collection::vec("[a-z ]{0,40}", 0..10)
    ) {
        let chunks: Vec<RewrittenChunk> = texts
            .iter()
            .map(|t| RewrittenChunk::detached(t.as_str(), None))
            .collect();
        let expected: Vec<&str> = texts
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect();
        prop_assert_eq!(Merger::default().merge(&chunks), expected.join("\n\n"));
    }
}
