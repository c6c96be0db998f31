//! Punctuation-aware fixed-size windows.
//!
//! The last resort for text with no usable sentence or paragraph structure.
//! Windows are measured in grapheme clusters so a cut never separates a
//! base character from its combining marks, and each window end walks back
//! a bounded distance looking for punctuation to cut after:
//!
//! ```text
//! size = 10, backtrack = 4
//!
//! Text:   "我们先看预算，然后讨论人员安排的问题"
//! Window: "我们先看预算，然后讨"       raw end at 10
//!                     ↑ '，' within 4 of the end
//! Cut:    "我们先看预算，" | "然后讨论人员安排的问题"
//! ```
//!
//! When no punctuation lies within reach, the window is cut at its raw end.

use unicode_segmentation::UnicodeSegmentation;

/// Sentence-final punctuation, full- and half-width.
pub(crate) const TERMINATORS: &[char] = &['。', '！', '？', '.', '!', '?'];

/// Clause-level punctuation.
pub(crate) const SECONDARY: &[char] = &['，', '、', '；'];

/// Whether a window may end right after `c`.
pub(crate) fn is_boundary(c: char) -> bool {
    TERMINATORS.contains(&c) || SECONDARY.contains(&c) || c == '\n'
}

/// Split `text` into consecutive windows of at most `size` graphemes.
///
/// Non-final windows end just after the nearest punctuation mark found in
/// their last `backtrack` graphemes, or at the raw boundary. The pieces
/// concatenate back to `text` exactly. `size == 0` is treated as 1.
#[must_use]
pub fn split_windows(text: &str, size: usize, backtrack: usize) -> Vec<&str> {
    if text.is_empty() {
        return vec![];
    }
    let size = size.max(1);

    // Byte offset of every grapheme start, plus the end of text.
    let bounds: Vec<usize> = text
        .grapheme_indices(true)
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let graphemes = bounds.len() - 1;

    let mut pieces = Vec::with_capacity(graphemes / size + 1);
    let mut start = 0;
    while start < graphemes {
        let mut end = (start + size).min(graphemes);
        if end < graphemes {
            let floor = end.saturating_sub(backtrack).max(start + 1);
            if let Some(cut) = (floor..=end)
                .rev()
                .find(|&i| ends_with_boundary(&text[bounds[i - 1]..bounds[i]]))
            {
                end = cut;
            }
        }
        pieces.push(&text[bounds[start]..bounds[end]]);
        start = end;
    }
    pieces
}

fn ends_with_boundary(grapheme: &str) -> bool {
    grapheme.chars().next_back().is_some_and(is_boundary)
}
