//! Speaker-label detection.
//!
//! Transcripts mark turns with surface labels:
//!
//! ```text
//! 【主持人】大家好。          bracketed label
//! Alice: thanks for coming.   label followed by a colon
//! 嘉宾：好的。                label followed by a full-width colon
//! ```
//!
//! Labels are recognised by an ordered list of regex patterns. A line is a
//! speaker line when one of the patterns matches at its very start and the
//! decoded name is short enough to be a name rather than a sentence that
//! happens to end in a colon.

use std::collections::BTreeSet;

use regex::Regex;

use crate::config::ChunkConfig;
use crate::error::{Error, Result};

const DECORATION: &[char] = &['【', '】', '[', ']', ':', '：'];

/// Recognises speaker-label lines.
///
/// ## Example
///
/// ```rust
/// use seams::SpeakerDetector;
///
/// let detector = SpeakerDetector::default();
/// assert_eq!(detector.detect("【主持人】大家好。").as_deref(), Some("主持人"));
/// assert_eq!(detector.detect("Alice: hi").as_deref(), Some("Alice"));
/// assert_eq!(detector.detect("no label here"), None);
/// ```
#[derive(Debug, Clone)]
pub struct SpeakerDetector {
    patterns: Vec<Regex>,
    max_len: usize,
}

impl SpeakerDetector {
    /// Compile a detector from regex patterns, tried in order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPattern`] for the first pattern that fails to
    /// compile.
    pub fn new<I, S>(patterns: I, max_len: usize) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| {
                let p = p.as_ref();
                Regex::new(p).map_err(|source| Error::InvalidPattern {
                    pattern: p.to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns, max_len })
    }

    /// Build the detector described by `config`; a disabled detector when
    /// `preserve_speakers` is off.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPattern`] for a pattern that fails to compile.
    pub fn from_config(config: &ChunkConfig) -> Result<Self> {
        if config.preserve_speakers {
            Self::new(&config.speaker_patterns, config.max_speaker_len)
        } else {
            Ok(Self::disabled())
        }
    }

    /// A detector that never matches.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            patterns: Vec::new(),
            max_len: 0,
        }
    }

    /// Whether any pattern is configured.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        !self.patterns.is_empty()
    }

    /// Detect the speaker named on the first line of `text`.
    #[must_use]
    pub fn detect(&self, text: &str) -> Option<String> {
        let line = text.lines().next()?.trim();
        if line.is_empty() {
            return None;
        }
        self.patterns.iter().find_map(|pattern| {
            pattern
                .find(line)
                .filter(|m| m.start() == 0)
                .and_then(|m| self.decode(m.as_str()))
        })
    }

    /// Byte offsets of every speaker label anywhere in `text`, sorted and
    /// deduplicated.
    #[must_use]
    pub fn markers(&self, text: &str) -> Vec<usize> {
        let mut offsets: Vec<usize> = self
            .patterns
            .iter()
            .flat_map(|pattern| pattern.find_iter(text))
            .filter(|m| self.decode(m.as_str()).is_some())
            .map(|m| m.start())
            .collect();
        offsets.sort_unstable();
        offsets.dedup();
        offsets
    }

    /// Every distinct speaker named at the start of a line.
    #[must_use]
    pub fn speakers(&self, text: &str) -> BTreeSet<String> {
        text.lines().filter_map(|line| self.detect(line)).collect()
    }

    fn decode(&self, label: &str) -> Option<String> {
        let name = label.trim().trim_matches(DECORATION).trim();
        if name.is_empty() || name.chars().count() > self.max_len {
            None
        } else {
            Some(name.to_string())
        }
    }
}

impl Default for SpeakerDetector {
    fn default() -> Self {
        let config = ChunkConfig::default();
        // The built-in patterns are known to compile.
        Self::from_config(&config).unwrap_or_else(|_| Self::disabled())
    }
}

/// Render a speaker name as a bracketed tag, leaving existing tags alone.
///
/// ```rust
/// use seams::format_speaker;
///
/// assert_eq!(format_speaker("主持人"), "【主持人】");
/// assert_eq!(format_speaker("【主持人】"), "【主持人】");
/// assert_eq!(format_speaker(""), "");
/// ```
#[must_use]
pub fn format_speaker(name: &str) -> String {
    if name.is_empty() {
        String::new()
    } else if name.starts_with('【') && name.ends_with('】') {
        name.to_string()
    } else {
        format!("【{name}】")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bracketed_label() {
        let detector = SpeakerDetector::default();
        assert_eq!(detector.detect("【嘉宾】好的").as_deref(), Some("嘉宾"));
    }

    #[test]
    fn test_colon_labels() {
        let detector = SpeakerDetector::default();
        assert_eq!(detector.detect("主持人：欢迎").as_deref(), Some("主持人"));
        assert_eq!(detector.detect("  Bob: ok").as_deref(), Some("Bob"));
    }

    #[test]
    fn test_first_line_only() {
        let detector = SpeakerDetector::default();
        assert_eq!(detector.detect("plain opening\n【嘉宾】later"), None);
    }

    #[test]
    fn test_label_must_lead_the_line() {
        let detector = SpeakerDetector::default();
        assert_eq!(detector.detect("我们请【嘉宾】发言"), None);
    }

    #[test]
    fn test_long_label_rejected() {
        let detector = SpeakerDetector::default();
        let sentence = format!("【{}】", "很".repeat(51));
        assert_eq!(detector.detect(&sentence), None);
        let name = format!("【{}】", "很".repeat(50));
        assert!(detector.detect(&name).is_some());
    }

    #[test]
    fn test_max_len_governs_colon_labels() {
        let name = "a".repeat(60);
        let line = format!("{name}: hi");
        let bracketed = format!("【{name}】hi");

        let wide = SpeakerDetector::new(crate::config::default_speaker_patterns(), 80).unwrap();
        assert_eq!(wide.detect(&line), Some(name.clone()));
        assert_eq!(wide.detect(&bracketed), Some(name.clone()));

        let narrow = SpeakerDetector::default();
        assert_eq!(narrow.detect(&line), None);
        assert_eq!(narrow.detect(&bracketed), None);
    }

    #[test]
    fn test_empty_label_rejected() {
        let detector = SpeakerDetector::default();
        assert_eq!(detector.detect("：开头就是冒号"), None);
        assert_eq!(detector.detect(""), None);
    }

    #[test]
    fn test_disabled_never_matches() {
        let detector = SpeakerDetector::disabled();
        assert!(!detector.is_enabled());
        assert_eq!(detector.detect("【主持人】大家好"), None);
        assert!(detector.markers("【主持人】大家好").is_empty());
    }

    #[test]
    fn test_invalid_pattern() {
        let err = SpeakerDetector::new(["(unclosed"], 50).unwrap_err();
        assert!(matches!(err, Error::InvalidPattern { .. }));
    }

    #[test]
    fn test_markers_anywhere() {
        let detector = SpeakerDetector::default();
        let text = "【主持人】大家好。【嘉宾】你好。";
        let second = text.find("【嘉宾】").unwrap();
        assert_eq!(detector.markers(text), vec![0, second]);
    }

    #[test]
    fn test_speakers_listing() {
        let detector = SpeakerDetector::default();
        let text = "【主持人】开场\n内容\n【嘉宾】回答\n【主持人】追问";
        let speakers: Vec<_> = detector.speakers(text).into_iter().collect();
        assert_eq!(speakers, vec!["主持人".to_string(), "嘉宾".to_string()]);
    }

    #[test]
    fn test_pattern_order() {
        let detector = SpeakerDetector::new([r"^\[[^\]]+\]", r"^[A-Za-z]+:"], 50).unwrap();
        assert_eq!(detector.detect("[Host] Alice: hi").as_deref(), Some("Host"));
    }
}
