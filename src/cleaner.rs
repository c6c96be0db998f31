//! Transcript cleanup.
//!
//! Recognisers leave debris that costs tokens and confuses segmentation.
//! [`TextCleaner::clean`] strips it before a transcript is chunked:
//!
//! | Rule | Before | After |
//! |------|--------|-------|
//! | byte-order marks | `\u{feff}大家好` | `大家好` |
//! | reasoning blocks | `<think>…</think>好的` | `好的` |
//! | punctuation runs | `好的。。。` / `真的！！` | `好的。` / `真的！` |
//! | timestamps | `[00:01:23]大家好` | `大家好` |
//! | confidence marks | `预算(0.95)` | `预算` |
//! | whitespace | `a   b  \n\n\n\nc` | `a b\n\nc` |
//!
//! Cleaning only deletes debris; it never rewrites words. Filler removal
//! and the like are left to the rewrite model, which sees the context.
//!
//! Model output gets a lighter pass, [`TextCleaner::strip_reasoning`], that
//! drops reasoning blocks some models emit around their answer.

use regex::Regex;

use crate::error::{Error, Result};

/// Tags some models wrap their private reasoning in.
const REASONING_TAGS: &[&str] = &[
    "think",
    "reasoning",
    "thought",
    "internal",
    "scratchpad",
    "analysis",
    "reflection",
];

/// Recogniser artifacts and their replacements, applied in order.
const ARTIFACTS: &[(&str, &str)] = &[
    ("[。，、]{3,}", "。"),
    ("！{2,}", "！"),
    ("？{2,}", "？"),
    ("，{2,}", "，"),
    (r"\[[0-9]{2}:[0-9]{2}:[0-9]{2}\]", ""),
    (r"\([0-9]{2}:[0-9]{2}:[0-9]{2}\)", ""),
    (r"\(0\.[0-9]+\)", ""),
];

/// Regex-driven transcript and model-output cleanup.
///
/// ## Example
///
/// ```rust
/// use seams::TextCleaner;
///
/// let cleaner = TextCleaner::new().unwrap();
/// let raw = "[00:00:05]【主持人】大家好(0.93)。。。\n\n\n\n  今天讨论预算！！  ";
/// assert_eq!(cleaner.clean(raw), "【主持人】大家好。\n\n今天讨论预算！");
/// ```
#[derive(Debug, Clone)]
pub struct TextCleaner {
    artifacts: Vec<(Regex, &'static str)>,
    reasoning: Regex,
    spaces: Regex,
    blank_runs: Regex,
}

impl TextCleaner {
    /// Compile the cleanup rules.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPattern`] if a rule fails to compile.
    pub fn new() -> Result<Self> {
        let artifacts = ARTIFACTS
            .iter()
            .map(|&(pattern, replacement)| Ok((compile(pattern)?, replacement)))
            .collect::<Result<Vec<_>>>()?;
        let alternatives: Vec<String> = REASONING_TAGS
            .iter()
            .map(|tag| format!("<{tag}>.*?</{tag}>"))
            .collect();
        Ok(Self {
            artifacts,
            reasoning: compile(&format!("(?is){}", alternatives.join("|")))?,
            spaces: compile(r"[ \t]+")?,
            blank_runs: compile(r"\n{3,}")?,
        })
    }

    /// Clean a raw transcript before chunking.
    ///
    /// Line endings are normalised to `\n`, every line is trimmed, and at
    /// most one blank line separates paragraphs.
    #[must_use]
    pub fn clean(&self, text: &str) -> String {
        let mut text = text.replace('\u{feff}', "");
        text = self.reasoning.replace_all(&text, "").into_owned();
        for (pattern, replacement) in &self.artifacts {
            text = pattern.replace_all(&text, *replacement).into_owned();
        }
        let text = self.spaces.replace_all(&text, " ");
        let lines: Vec<&str> = text.lines().map(str::trim).collect();
        self.blank_runs
            .replace_all(&lines.join("\n"), "\n\n")
            .trim()
            .to_string()
    }

    /// Drop reasoning blocks from model output and collapse the blank runs
    /// they leave behind.
    #[must_use]
    pub fn strip_reasoning(&self, output: &str) -> String {
        let without_reasoning = self.reasoning.replace_all(output, "");
        self.blank_runs
            .replace_all(&without_reasoning, "\n\n")
            .trim()
            .to_string()
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|source| Error::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}
