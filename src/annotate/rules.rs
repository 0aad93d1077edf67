//! RuleCortex - Local writing-issue detection
//!
//! An ordered list of independent rules, each a pure `text -> spans` scan:
//! - Misspellings: dictionary lookup via Aho-Corasick on word boundaries
//! - Broken tenses / pronoun agreement / "there is many": Regex phrases
//! - Repeated words: word-boundary walk (the regex crate has no backreferences)
//! - "too" before a determiner
//! - Filler words (improve, not error)
//!
//! Rules never see each other's output. Overlaps between rules are kept;
//! the reconciler and renderer decide what to do with them.

use aho_corasick::{AhoCorasick, AhoCorasickBuilder, MatchKind};
use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

use super::span::{ErrorSpan, SpanKind};

// =============================================================================
// Rule trait
// =============================================================================

/// A single local detector
pub trait Rule {
    fn name(&self) -> &str;
    fn scan(&self, text: &str) -> Vec<ErrorSpan>;
}

// =============================================================================
// PatternRule
// =============================================================================

/// Regex rule. Flags the whole match, or one capture group when `group` is set.
pub struct PatternRule {
    name: String,
    regex: Regex,
    kind: SpanKind,
    suggestion: Option<String>,
    group: usize,
    preserve_case: bool,
}

impl PatternRule {
    pub fn new(name: &str, pattern: &str, kind: SpanKind, suggestion: Option<&str>) -> Result<Self, regex::Error> {
        Ok(Self {
            name: name.to_string(),
            regex: Regex::new(pattern)?,
            kind,
            suggestion: suggestion.map(str::to_string),
            group: 0,
            preserve_case: false,
        })
    }

    /// Flag only capture group `group` instead of the full match
    pub fn with_group(mut self, group: usize) -> Self {
        self.group = group;
        self
    }

    /// Capitalize the suggestion like the flagged text ("Too" -> "To")
    pub fn preserve_case(mut self) -> Self {
        self.preserve_case = true;
        self
    }
}

impl Rule for PatternRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn scan(&self, text: &str) -> Vec<ErrorSpan> {
        self.regex
            .captures_iter(text)
            .filter_map(|cap| cap.get(self.group))
            .filter(|m| !m.is_empty())
            .map(|m| {
                let suggestion = match (&self.suggestion, self.preserve_case) {
                    (Some(s), true) => Some(match_case(m.as_str(), s)),
                    (s, _) => s.clone(),
                };
                ErrorSpan::local(text, m.range(), self.kind, suggestion.as_deref())
            })
            .collect()
    }
}

// =============================================================================
// DictionaryRule
// =============================================================================

/// Whole-word dictionary of known misspellings with their corrections
pub struct DictionaryRule {
    name: String,
    automaton: AhoCorasick,
    corrections: Vec<String>,
    kind: SpanKind,
}

impl DictionaryRule {
    pub fn new(name: &str, entries: &[(&str, &str)], kind: SpanKind) -> Result<Self, String> {
        let patterns: Vec<String> = entries.iter().map(|(wrong, _)| wrong.to_lowercase()).collect();
        let automaton = AhoCorasickBuilder::new()
            .match_kind(MatchKind::LeftmostLongest)
            .ascii_case_insensitive(true)
            .build(&patterns)
            .map_err(|e| format!("Failed to build automaton: {}", e))?;

        Ok(Self {
            name: name.to_string(),
            automaton,
            corrections: entries.iter().map(|(_, right)| right.to_string()).collect(),
            kind,
        })
    }
}

impl Rule for DictionaryRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn scan(&self, text: &str) -> Vec<ErrorSpan> {
        self.automaton
            .find_iter(text)
            .filter(|mat| is_word_bounded(text, mat.start(), mat.end()))
            .filter_map(|mat| {
                let correction = self.corrections.get(mat.pattern().as_usize())?;
                let found = &text[mat.start()..mat.end()];
                let suggestion = match_case(found, correction);
                Some(ErrorSpan::local(text, mat.start()..mat.end(), self.kind, Some(&suggestion)))
            })
            .collect()
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_word_bounded(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back().map_or(true, |c| !is_word_char(c));
    let after = text[end..].chars().next().map_or(true, |c| !is_word_char(c));
    before && after
}

/// "Teh" -> "The", "TEH" -> "THE"
fn match_case(found: &str, correction: &str) -> String {
    let letters: Vec<char> = found.chars().filter(|c| c.is_alphabetic()).collect();
    if letters.len() > 1 && letters.iter().all(|c| c.is_uppercase()) {
        return correction.to_uppercase();
    }
    if letters.first().is_some_and(|c| c.is_uppercase()) {
        let mut chars = correction.chars();
        if let Some(first) = chars.next() {
            return first.to_uppercase().chain(chars).collect();
        }
    }
    correction.to_string()
}

// =============================================================================
// RepeatedWordRule
// =============================================================================

/// Flags "the the": the same word twice, separated only by whitespace
pub struct RepeatedWordRule {
    kind: SpanKind,
}

impl RepeatedWordRule {
    pub fn new(kind: SpanKind) -> Self {
        Self { kind }
    }
}

impl Rule for RepeatedWordRule {
    fn name(&self) -> &str {
        "repeated-word"
    }

    fn scan(&self, text: &str) -> Vec<ErrorSpan> {
        let mut spans = Vec::new();
        // (start, word) of the last word seen, cleared by anything but whitespace
        let mut previous: Option<(usize, &str)> = None;
        let mut gap_seen = false;

        for (idx, segment) in text.split_word_bound_indices() {
            if segment.chars().any(is_word_char) {
                match previous {
                    Some((start, word)) if gap_seen && word.to_lowercase() == segment.to_lowercase() => {
                        spans.push(ErrorSpan::local(text, start..idx + segment.len(), self.kind, Some(word)));
                        previous = None;
                    }
                    _ => previous = Some((idx, segment)),
                }
                gap_seen = false;
            } else if segment.chars().all(char::is_whitespace) {
                gap_seen = true;
            } else {
                previous = None;
                gap_seen = false;
            }
        }

        spans
    }
}

// =============================================================================
// RuleCortex
// =============================================================================

/// Misspellings the dictionary rule knows about
pub const MISSPELLINGS: &[(&str, &str)] = &[
    ("recieve", "receive"),
    ("teh", "the"),
    ("tady", "today"),
    ("tesing", "testing"),
    ("definately", "definitely"),
    ("accross", "across"),
    ("alot", "a lot"),
    ("occured", "occurred"),
    ("seperate", "separate"),
    ("comming", "coming"),
];

/// Ordered rule list with a minimum-length gate
pub struct RuleCortex {
    rules: Vec<Box<dyn Rule>>,
    min_chars: usize,
}

impl RuleCortex {
    /// Empty cortex; texts shorter than `min_chars` characters never produce spans
    pub fn new(min_chars: usize) -> Self {
        Self {
            rules: Vec::new(),
            min_chars,
        }
    }

    /// The built-in rule set
    pub fn standard(min_chars: usize) -> Self {
        let mut cortex = Self::new(min_chars);

        cortex.push(
            DictionaryRule::new("misspelling", MISSPELLINGS, SpanKind::Error)
                .expect("static misspelling dictionary"),
        );
        cortex.push(
            PatternRule::new(
                "broken-tense",
                r"(?i)\b(?:i\s+am\s+was|was\s+eated|did\s+went)\b",
                SpanKind::Error,
                None,
            )
            .expect("static broken-tense pattern"),
        );
        cortex.push(
            PatternRule::new(
                "pronoun-agreement",
                r"(?i)\b(?:how\s+is\s+you|how\s+are\s+he|she\s+are|they\s+is|we\s+is|i\s+is|you\s+is)\b",
                SpanKind::Error,
                Some("Grammar error"),
            )
            .expect("static pronoun-agreement pattern"),
        );
        cortex.push(
            PatternRule::new(
                "existential-agreement",
                r"(?i)\bthere\s+is\s+(?:many|some|few)\b",
                SpanKind::Error,
                Some("Subject-verb disagreement"),
            )
            .expect("static existential-agreement pattern"),
        );
        cortex.push(RepeatedWordRule::new(SpanKind::Error));
        cortex.push(
            PatternRule::new(
                "too-to",
                r"(?i)\b(too)\s+(?:the|a|an|my|your|his|her|its|our|their|this|that)\b",
                SpanKind::Error,
                Some("to"),
            )
            .expect("static too-to pattern")
            .with_group(1)
            .preserve_case(),
        );
        cortex.push(
            PatternRule::new(
                "filler-word",
                r"(?i)\b(?:very|basically|actually|literally|simply|just)\b",
                SpanKind::Improve,
                Some("Omit filler word"),
            )
            .expect("static filler-word pattern"),
        );

        cortex
    }

    pub fn push(&mut self, rule: impl Rule + 'static) -> &mut Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Run every rule over `text`, concatenating results in rule order
    pub fn match_local(&self, text: &str) -> Vec<ErrorSpan> {
        if text.chars().count() < self.min_chars {
            return Vec::new();
        }
        self.rules.iter().flat_map(|rule| rule.scan(text)).collect()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn cortex() -> RuleCortex {
        RuleCortex::standard(3)
    }

    fn texts(spans: &[ErrorSpan]) -> Vec<&str> {
        spans.iter().map(|s| s.source_text.as_str()).collect()
    }

    #[test]
    fn test_short_text_yields_nothing() {
        let cortex = cortex();
        assert!(cortex.match_local("").is_empty());
        assert!(cortex.match_local("so").is_empty());
    }

    #[test]
    fn test_misspelling_with_case() {
        let spans = cortex().match_local("Teh answer is recieve");
        assert_eq!(texts(&spans), vec!["Teh", "recieve"]);
        assert_eq!(spans[0].suggestion.as_deref(), Some("The"));
        assert_eq!(spans[1].suggestion.as_deref(), Some("receive"));
        assert_eq!(spans[0].kind, SpanKind::Error);
    }

    #[test]
    fn test_misspelling_needs_word_boundary() {
        let spans = cortex().match_local("steh and tehx are fine");
        assert!(spans.is_empty(), "got {:?}", texts(&spans));
    }

    #[test]
    fn test_pronoun_agreement() {
        let spans = cortex().match_local("I is going home");
        assert_eq!(spans.len(), 1);
        assert_eq!((spans[0].start, spans[0].end), (0, 4));
        assert_eq!(spans[0].suggestion.as_deref(), Some("Grammar error"));
    }

    #[test]
    fn test_existential_agreement() {
        let spans = cortex().match_local("there is many cats");
        assert_eq!(texts(&spans), vec!["there is many"]);
    }

    #[test]
    fn test_repeated_word() {
        let spans = cortex().match_local("we saw the The cat");
        assert_eq!(texts(&spans), vec!["the The"]);
        assert_eq!(spans[0].suggestion.as_deref(), Some("the"));
    }

    #[test]
    fn test_repeated_word_needs_whitespace_gap() {
        let rule = RepeatedWordRule::new(SpanKind::Error);
        assert!(rule.scan("stop, stop it").is_empty());
        assert!(rule.scan("bye-bye").is_empty());
        assert_eq!(rule.scan("go go go").len(), 1);
    }

    #[test]
    fn test_too_flags_only_the_word() {
        let spans = cortex().match_local("going too the store");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].source_text, "too");
        assert_eq!(spans[0].splice_replacement(), Some("to"));
    }

    #[test]
    fn test_too_fix_keeps_sentence_case() {
        let text = "Too the store we go";
        let spans = cortex().match_local(text);
        assert_eq!(texts(&spans), vec!["Too"]);
        let fix = spans[0].splice_replacement().unwrap();
        assert_eq!(spans[0].apply_to(text, fix), "To the store we go");
    }

    #[test]
    fn test_filler_is_improve() {
        let spans = cortex().match_local("it is very good");
        assert_eq!(texts(&spans), vec!["very"]);
        assert_eq!(spans[0].kind, SpanKind::Improve);
    }

    #[test]
    fn test_overlaps_between_rules_are_kept() {
        // filler-word and repeated-word both claim "just just"
        let spans = cortex().match_local("it was just just fine");
        let names: Vec<_> = spans.iter().map(|s| s.source_text.as_str()).collect();
        assert!(names.contains(&"just just"));
        assert_eq!(names.iter().filter(|t| **t == "just").count(), 2);
    }

    #[test]
    fn test_deterministic() {
        let cortex = cortex();
        let text = "Teh they is very very late";
        assert_eq!(cortex.match_local(text), cortex.match_local(text));
    }

    #[test]
    fn test_custom_rule_push() {
        let mut cortex = RuleCortex::new(1);
        cortex.push(PatternRule::new("shout", r"!!+", SpanKind::Improve, Some("!")).unwrap());
        let spans = cortex.match_local("wow!!!");
        assert_eq!(cortex.rule_names(), vec!["shout"]);
        assert_eq!(texts(&spans), vec!["!!!"]);
    }

    #[test]
    fn test_standard_rule_order() {
        assert_eq!(
            cortex().rule_names(),
            vec![
                "misspelling",
                "broken-tense",
                "pronoun-agreement",
                "existential-agreement",
                "repeated-word",
                "too-to",
                "filler-word",
            ]
        );
    }
}
