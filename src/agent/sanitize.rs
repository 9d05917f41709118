// Reasoning-span removal
//
// Some models (deepseek-r1, qwen3, ...) emit their deliberation inline,
// wrapped in a pair of markers. It must never reach a translation or a
// critique, so every answer goes through a `ReasoningFilter`.

use anyhow::{bail, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::constants::{DEFAULT_REASONING_CLOSE, DEFAULT_REASONING_OPEN};

static DEFAULT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    build_pattern(DEFAULT_REASONING_OPEN, DEFAULT_REASONING_CLOSE).expect("reasoning regex")
});

/// Opening and closing marker of a reasoning span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReasoningMarkers {
    pub open_marker: String,
    pub close_marker: String,
}

impl Default for ReasoningMarkers {
    fn default() -> Self {
        Self {
            open_marker: DEFAULT_REASONING_OPEN.to_string(),
            close_marker: DEFAULT_REASONING_CLOSE.to_string(),
        }
    }
}

impl ReasoningMarkers {
    pub fn new(open_marker: impl Into<String>, close_marker: impl Into<String>) -> Self {
        Self {
            open_marker: open_marker.into(),
            close_marker: close_marker.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.open_marker.is_empty() || self.close_marker.is_empty() {
            bail!("reasoning markers must not be empty");
        }
        if self.open_marker == self.close_marker {
            bail!("reasoning open and close markers must differ");
        }
        Ok(())
    }
}

/// Strips every non-overlapping `open … close` span from model output.
#[derive(Debug, Clone)]
pub struct ReasoningFilter {
    pattern: Regex,
}

impl ReasoningFilter {
    pub fn new(markers: &ReasoningMarkers) -> Result<Self> {
        markers.validate()?;
        let pattern = build_pattern(&markers.open_marker, &markers.close_marker)?;
        Ok(Self { pattern })
    }

    /// Remove reasoning spans and trim the surrounding whitespace.
    ///
    /// Spans may cross newlines. The shortest span wins, so text between two
    /// separate spans survives. An opening marker with no closing marker is
    /// left untouched.
    pub fn strip(&self, text: &str) -> String {
        self.pattern.replace_all(text, "").trim().to_string()
    }
}

impl Default for ReasoningFilter {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_PATTERN.clone(),
        }
    }
}

/// [`ReasoningFilter::strip`] with the default `<think>…</think>` markers.
pub fn strip_reasoning(text: &str) -> String {
    DEFAULT_PATTERN.replace_all(text, "").trim().to_string()
}

fn build_pattern(open: &str, close: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(
        "(?s){}.*?{}",
        regex::escape(open),
        regex::escape(close)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_single_span() {
        let raw = "<think>\nThe user wants Dutch.\n</think>\n\nHallo wereld";
        assert_eq!(strip_reasoning(raw), "Hallo wereld");
    }

    #[test]
    fn test_strip_multiple_spans_keeps_text_between() {
        let raw = "<think>a</think>Hallo <think>b</think>wereld";
        assert_eq!(strip_reasoning(raw), "Hallo wereld");
    }

    #[test]
    fn test_no_markers_is_identity_modulo_trim() {
        assert_eq!(strip_reasoning("  plain text \n"), "plain text");
    }

    #[test]
    fn test_unclosed_marker_left_in_place() {
        assert_eq!(strip_reasoning("<think>never closed"), "<think>never closed");
    }

    #[test]
    fn test_custom_markers_are_escaped() {
        let filter = ReasoningFilter::new(&ReasoningMarkers::new("[[reason]]", "[[/reason]]"))
            .unwrap();
        assert_eq!(filter.strip("[[reason]]x.*y[[/reason]]Bonjour"), "Bonjour");
        // Default markers are not special for a custom filter
        assert_eq!(filter.strip("<think>a</think>b"), "<think>a</think>b");
    }

    #[test]
    fn test_default_filter_matches_free_function() {
        let raw = "<think>x</think> ok";
        assert_eq!(ReasoningFilter::default().strip(raw), strip_reasoning(raw));
    }

    #[test]
    fn test_invalid_markers_rejected() {
        assert!(ReasoningFilter::new(&ReasoningMarkers::new("", "</x>")).is_err());
        assert!(ReasoningFilter::new(&ReasoningMarkers::new("|", "|")).is_err());
    }
}
