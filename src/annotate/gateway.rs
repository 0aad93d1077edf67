//! Remote Detector Gateway (client half)
//!
//! Debounces remote grammar checks against a fast-changing surface and
//! decides which results are still worth applying.
//!
//! # Protocol
//! 1. `schedule(now)` on every local analysis pass. Re-arming cancels the
//!    previous deadline: last-scheduled-wins.
//! 2. When the deadline passes the engine calls `fire()` with the text read
//!    at that moment. Guards: minimum length, and not identical to the last
//!    text already sent. Passing both issues a `DebounceToken`.
//! 3. On resolution, `accepts()` checks the token is the most recently issued
//!    one, for the same surface activation, and that the surface still holds
//!    exactly the token's text. Anything else is a stale result.
//!
//! Accepted spans are stored with the text they describe and only take part
//! in merges while the surface text is unchanged.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::span::{char_to_byte, ErrorSpan, SpanKind};

// =============================================================================
// Wire types
// =============================================================================

fn default_kind() -> String {
    "error".to_string()
}

/// One span as reported by the remote detector (character offsets)
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RemoteSpan {
    pub start: usize,
    pub end: usize,
    #[serde(rename = "type", default = "default_kind")]
    pub kind: String,
    /// Echo of the flagged substring
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub suggestion: Option<String>,
}

/// `checkGrammar` payload
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct GrammarReport {
    #[serde(default)]
    pub errors: Vec<RemoteSpan>,
}

/// `rewriteText` payload: mode name -> rewritten text
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct RewriteReport {
    #[serde(default)]
    pub versions: HashMap<String, String>,
}

/// Convert remote spans to byte-offset `ErrorSpan`s over `text`.
///
/// Drops spans that are empty, out of bounds, or whose echoed text does not
/// match what `text` holds at that range.
pub fn resolve_remote_spans(text: &str, spans: &[RemoteSpan]) -> Vec<ErrorSpan> {
    spans
        .iter()
        .filter_map(|wire| {
            let start = char_to_byte(text, wire.start)?;
            let end = char_to_byte(text, wire.end)?;
            if end <= start {
                return None;
            }
            let covered = &text[start..end];
            if let Some(echo) = wire.text.as_deref().filter(|e| !e.is_empty()) {
                if echo != covered {
                    return None;
                }
            }
            let suggestion = wire.suggestion.clone().filter(|s| !s.trim().is_empty());
            Some(ErrorSpan::remote(text, start..end, SpanKind::from_label(&wire.kind), suggestion))
        })
        .collect()
}

// =============================================================================
// DebounceToken
// =============================================================================

/// Ties an issued remote check to the exact text it was computed against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebounceToken {
    generation: u64,
    epoch: u64,
    text: String,
}

impl DebounceToken {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

// =============================================================================
// RemoteGateway
// =============================================================================

#[derive(Debug, Clone)]
struct RemoteSnapshot {
    text: String,
    spans: Vec<ErrorSpan>,
}

/// Debounce + staleness bookkeeping for one engine
#[derive(Debug, Clone)]
pub struct RemoteGateway {
    debounce_ms: f64,
    min_chars: usize,
    due_at: Option<f64>,
    generation: u64,
    last_sent: Option<String>,
    snapshot: Option<RemoteSnapshot>,
}

impl RemoteGateway {
    pub fn new(debounce_ms: f64, min_chars: usize) -> Self {
        Self {
            debounce_ms,
            min_chars,
            due_at: None,
            generation: 0,
            last_sent: None,
            snapshot: None,
        }
    }

    /// (Re)start the debounce window
    pub fn schedule(&mut self, now: f64) {
        self.due_at = Some(now + self.debounce_ms);
    }

    pub fn cancel(&mut self) {
        self.due_at = None;
    }

    pub fn is_pending(&self) -> bool {
        self.due_at.is_some()
    }

    pub fn is_due(&self, now: f64) -> bool {
        self.due_at.is_some_and(|at| now >= at)
    }

    pub fn next_deadline(&self) -> Option<f64> {
        self.due_at
    }

    /// Deadline reached: apply the send guards and issue a token
    pub fn fire(&mut self, epoch: u64, text: String) -> Option<DebounceToken> {
        self.due_at = None;

        if text.chars().count() < self.min_chars {
            return None;
        }
        if self.last_sent.as_deref() == Some(text.as_str()) {
            log::debug!("[Gateway] skipping duplicate check ({} chars)", text.len());
            return None;
        }

        self.generation += 1;
        self.last_sent = Some(text.clone());
        Some(DebounceToken {
            generation: self.generation,
            epoch,
            text,
        })
    }

    /// Stale-result rule
    pub fn accepts(&self, token: &DebounceToken, epoch: u64, current_text: &str) -> bool {
        token.generation == self.generation && token.epoch == epoch && token.text == current_text
    }

    /// Keep accepted spans together with the text they describe
    pub fn store(&mut self, text: String, spans: Vec<ErrorSpan>) {
        self.snapshot = Some(RemoteSnapshot { text, spans });
    }

    /// Remote spans valid for `text`, or nothing if they were computed for other text
    pub fn spans_for(&self, text: &str) -> &[ErrorSpan] {
        match &self.snapshot {
            Some(snapshot) if snapshot.text == text => &snapshot.spans,
            _ => &[],
        }
    }

    /// Forget timers, sent text and remote spans. Tokens issued before the
    /// reset can never be accepted afterwards.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.due_at = None;
        self.last_sent = None;
        self.snapshot = None;
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway() -> RemoteGateway {
        RemoteGateway::new(1000.0, 5)
    }

    #[test]
    fn test_debounce_collapses_bursts() {
        let mut gw = gateway();
        let mut issued = Vec::new();

        for (t, typed) in [(0.0, "hello"), (200.0, "hello wo"), (250.0, "hello world")] {
            gw.schedule(t);
            // host polls every 10ms until the next keystroke
            let mut now = t;
            while now < t + 50.0 {
                if gw.is_due(now) {
                    issued.extend(gw.fire(1, typed.to_string()));
                }
                now += 10.0;
            }
        }
        assert!(issued.is_empty());
        assert!(!gw.is_due(1249.0));
        assert!(gw.is_due(1250.0));
        issued.extend(gw.fire(1, "hello world".to_string()));

        assert_eq!(issued.len(), 1);
        assert_eq!(issued[0].text(), "hello world");
        assert!(!gw.is_pending());
    }

    #[test]
    fn test_guards_short_and_duplicate_text() {
        let mut gw = gateway();
        assert!(gw.fire(1, "abcd".to_string()).is_none());
        assert!(gw.fire(1, "abcde".to_string()).is_some());
        assert!(gw.fire(1, "abcde".to_string()).is_none(), "same text is not re-sent");
        assert!(gw.fire(1, "abcdef".to_string()).is_some());
    }

    #[test]
    fn test_stale_by_text_change() {
        let mut gw = gateway();
        let token = gw.fire(1, "teh cat".to_string()).unwrap();
        assert!(gw.accepts(&token, 1, "teh cat"));
        assert!(!gw.accepts(&token, 1, "the cat sat"));
    }

    #[test]
    fn test_stale_by_newer_token() {
        let mut gw = gateway();
        let first = gw.fire(1, "first text".to_string()).unwrap();
        let second = gw.fire(1, "second text".to_string()).unwrap();
        assert!(!gw.accepts(&first, 1, "first text"));
        assert!(gw.accepts(&second, 1, "second text"));
    }

    #[test]
    fn test_stale_by_surface_change() {
        let mut gw = gateway();
        let token = gw.fire(1, "some text".to_string()).unwrap();
        assert!(!gw.accepts(&token, 2, "some text"));
        gw.reset();
        assert!(!gw.accepts(&token, 1, "some text"));
    }

    #[test]
    fn test_spans_scoped_to_their_text() {
        let mut gw = gateway();
        let span = ErrorSpan::remote("a teh b", 2..5, SpanKind::Error, None);
        gw.store("a teh b".to_string(), vec![span.clone()]);

        assert_eq!(gw.spans_for("a teh b"), &[span][..]);
        assert!(gw.spans_for("a teh bc").is_empty());
        gw.reset();
        assert!(gw.spans_for("a teh b").is_empty());
    }

    #[test]
    fn test_resolve_remote_spans_converts_char_offsets() {
        let text = "café is gud";
        let wire = vec![RemoteSpan {
            start: 8,
            end: 11,
            kind: "error".to_string(),
            text: Some("gud".to_string()),
            suggestion: Some("good".to_string()),
        }];
        let spans = resolve_remote_spans(text, &wire);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].source_text, "gud");
        assert_eq!(&text[spans[0].range()], "gud");
        assert_eq!(spans[0].suggestion.as_deref(), Some("good"));
    }

    #[test]
    fn test_resolve_remote_spans_drops_malformed() {
        let text = "short text";
        let json = r#"{"errors": [
            {"start": 3, "end": 3, "type": "error"},
            {"start": 6, "end": 99, "type": "error"},
            {"start": 0, "end": 5, "type": "improve", "text": "wrong"},
            {"start": 6, "end": 10, "type": "improve", "text": "text", "suggestion": "  "}
        ]}"#;
        let report: GrammarReport = serde_json::from_str(json).unwrap();
        let spans = resolve_remote_spans(text, &report.errors);

        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].source_text, "text");
        assert_eq!(spans[0].kind, SpanKind::Improve);
        assert_eq!(spans[0].suggestion, None);
    }

    #[test]
    fn test_rewrite_report_parsing() {
        let report: RewriteReport =
            serde_json::from_str(r#"{"versions": {"professional": "Good day."}}"#).unwrap();
        assert_eq!(report.versions.get("professional").map(String::as_str), Some("Good day."));

        let empty: RewriteReport = serde_json::from_str("{}").unwrap();
        assert!(empty.versions.is_empty());
    }
}
