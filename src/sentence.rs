//! Sentence splitting for transcripts.
//!
//! ## The Hard Part: Transcripts Barely Punctuate
//!
//! Speech recognisers emit long runs of text with few or no sentence marks:
//!
//! ```text
//! "好的那我们先看一下预算然后再讨论人员安排的问题，大家有什么意见"
//! ```
//!
//! A splitter that only knows `。` returns the whole transcript as one
//! "sentence", which is useless for packing. So splitting escalates:
//!
//! | Level | Cut after | Yields |
//! |-------|-----------|--------|
//! | 1 | `。！？.!?` and newline runs | sentences |
//! | 2 | `，、；` | clauses |
//! | 3 | fixed windows, walked back to punctuation | windows |
//! | 4 | nothing | the whole text |
//!
//! Each level runs only when the previous one produced fewer than two
//! pieces. Every level is total: the pieces concatenate back to the input
//! byte for byte, so nothing is ever dropped or duplicated.
//!
//! Punctuation stays with the sentence it ends, and so does the whitespace
//! that follows it, so each piece starts at real content.

use crate::chunk::{Unit, UnitKind};
use crate::window::{split_windows, SECONDARY, TERMINATORS};

/// Total sentence splitter with an escalating fallback chain.
///
/// ## Example
///
/// ```rust
/// use seams::SentenceSplitter;
///
/// let splitter = SentenceSplitter::default();
/// let pieces = splitter.split("大家好。今天讨论预算！Any questions?");
///
/// assert_eq!(pieces, vec!["大家好。", "今天讨论预算！", "Any questions?"]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentenceSplitter {
    window: usize,
    backtrack: usize,
}

impl SentenceSplitter {
    /// Create a splitter whose window fallback uses `window`-grapheme
    /// windows walked back up to `backtrack` graphemes.
    #[must_use]
    pub const fn new(window: usize, backtrack: usize) -> Self {
        Self { window, backtrack }
    }

    /// Split `text` into sentence-like pieces that concatenate to `text`.
    #[must_use]
    pub fn split<'a>(&self, text: &'a str) -> Vec<&'a str> {
        self.split_tagged(text).1
    }

    /// Split `text` into units whose offsets start at `offset`, each carrying
    /// `speaker`.
    #[must_use]
    pub fn split_units<'a>(
        &self,
        text: &'a str,
        offset: usize,
        speaker: Option<&str>,
    ) -> Vec<Unit<'a>> {
        let (kind, pieces) = self.split_tagged(text);
        pieces
            .into_iter()
            .scan(offset, |start, piece| {
                let unit = Unit::new(piece, *start, speaker.map(str::to_string), kind);
                *start += piece.len();
                Some(unit)
            })
            .collect()
    }

    fn split_tagged<'a>(&self, text: &'a str) -> (UnitKind, Vec<&'a str>) {
        if text.is_empty() {
            return (UnitKind::Sentence, vec![]);
        }

        let sentences = split_after(text, |c| TERMINATORS.contains(&c) || c == '\n');
        if sentences.len() >= 2 {
            return (UnitKind::Sentence, sentences);
        }

        let clauses = split_after(text, |c| SECONDARY.contains(&c));
        if clauses.len() >= 2 {
            return (UnitKind::Sentence, clauses);
        }

        let windows = split_windows(text, self.window, self.backtrack);
        if windows.len() >= 2 {
            return (UnitKind::Window, windows);
        }

        (UnitKind::Window, vec![text])
    }
}

impl Default for SentenceSplitter {
    fn default() -> Self {
        Self::new(200, 50)
    }
}

/// Cut `text` after every run of terminal chars, keeping the run and any
/// whitespace after it with the preceding piece. Blank pieces are folded into
/// a neighbour.
fn split_after(text: &str, is_terminal: impl Fn(char) -> bool) -> Vec<&str> {
    let mut cuts = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !is_terminal(c) {
            continue;
        }
        let mut end = i + c.len_utf8();
        while let Some(&(j, next)) = chars.peek() {
            if !(is_terminal(next) || next.is_whitespace()) {
                break;
            }
            end = j + next.len_utf8();
            chars.next();
        }
        if !text[start..end].trim().is_empty() {
            cuts.push(end);
            start = end;
        }
    }

    // A blank tail belongs to the last piece.
    if text[start..].trim().is_empty() {
        cuts.pop();
    }

    std::iter::once(0)
        .chain(cuts.iter().copied())
        .zip(cuts.iter().copied().chain(std::iter::once(text.len())))
        .map(|(from, to)| &text[from..to])
        .collect()
}
