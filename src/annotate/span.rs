//! ErrorSpan: flagged character ranges over a surface's text
//!
//! Offsets are byte offsets into the most recently read surface text.
//! Remote detectors speak in character (Unicode scalar) offsets;
//! `char_to_byte` at the bottom of this file maps them onto the text.

use serde::{Deserialize, Serialize};
use std::ops::Range;

// =============================================================================
// Types
// =============================================================================

/// Severity of a flagged span
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SpanKind {
    Error,
    Improve,
}

impl SpanKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpanKind::Error => "error",
            SpanKind::Improve => "improve",
        }
    }

    /// Lenient parse for detector payloads: anything that is not "improve" is an error
    pub fn from_label(label: &str) -> Self {
        if label.eq_ignore_ascii_case("improve") {
            SpanKind::Improve
        } else {
            SpanKind::Error
        }
    }
}

/// Which detector produced a span
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SpanOrigin {
    Local,
    Remote,
}

/// A flagged half-open range `[start, end)` of the surface text
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ErrorSpan {
    pub start: usize,
    pub end: usize,
    pub kind: SpanKind,
    /// Exact substring covered by the span
    pub source_text: String,
    pub suggestion: Option<String>,
    pub origin: SpanOrigin,
}

impl ErrorSpan {
    /// Build a local span over `text[range]`
    pub fn local(text: &str, range: Range<usize>, kind: SpanKind, suggestion: Option<&str>) -> Self {
        Self::from_range(text, range, kind, suggestion.map(str::to_string), SpanOrigin::Local)
    }

    /// Build a remote span over `text[range]`
    pub fn remote(text: &str, range: Range<usize>, kind: SpanKind, suggestion: Option<String>) -> Self {
        Self::from_range(text, range, kind, suggestion, SpanOrigin::Remote)
    }

    fn from_range(
        text: &str,
        range: Range<usize>,
        kind: SpanKind,
        suggestion: Option<String>,
        origin: SpanOrigin,
    ) -> Self {
        Self {
            start: range.start,
            end: range.end,
            kind,
            source_text: text[range].to_string(),
            suggestion,
            origin,
        }
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Half-open intersection test
    pub fn overlaps(&self, other: &ErrorSpan) -> bool {
        self.start < other.end && self.end > other.start
    }

    /// True if the span still describes `text` exactly: in bounds, on char
    /// boundaries, and covering the same substring it was computed for.
    pub fn is_valid_for(&self, text: &str) -> bool {
        !self.is_empty() && text.get(self.range()).is_some_and(|s| s == self.source_text)
    }

    /// Suggestion usable as a direct splice: a single non-empty token
    pub fn splice_replacement(&self) -> Option<&str> {
        self.suggestion
            .as_deref()
            .filter(|s| !s.is_empty() && !s.chars().any(char::is_whitespace))
    }

    /// `text` with this span replaced by `replacement`
    pub fn apply_to(&self, text: &str, replacement: &str) -> String {
        let mut out = String::with_capacity(text.len() + replacement.len());
        out.push_str(&text[..self.start]);
        out.push_str(replacement);
        out.push_str(&text[self.end..]);
        out
    }
}

// =============================================================================
// Offset conversion
// =============================================================================

/// Byte offset of the `char_idx`-th character. `char_idx == char count` maps to `text.len()`.
pub fn char_to_byte(text: &str, char_idx: usize) -> Option<usize> {
    if char_idx == 0 {
        return Some(0);
    }
    let mut indices = text.char_indices().map(|(i, _)| i).chain(std::iter::once(text.len()));
    indices.nth(char_idx)
}

// =============================================================================
// Tests
// =============================================================================
