//! Visual state machine for the status indicator
//!
//! `neutral | error | improve` are derived from the error set on every
//! analysis pass. `loading | success` are temporary overrides owned by
//! user-triggered rewrites; `success` expires after a display interval.

use serde::{Deserialize, Serialize};

use super::span::{ErrorSpan, SpanKind};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum VisualState {
    #[default]
    Neutral,
    Error,
    Improve,
    Loading,
    Success,
}

impl VisualState {
    pub fn as_str(&self) -> &'static str {
        match self {
            VisualState::Neutral => "neutral",
            VisualState::Error => "error",
            VisualState::Improve => "improve",
            VisualState::Loading => "loading",
            VisualState::Success => "success",
        }
    }

    /// `error` beats `improve` beats `neutral`
    pub fn derive(errors: &[ErrorSpan]) -> Self {
        if errors.iter().any(|e| e.kind == SpanKind::Error) {
            VisualState::Error
        } else if errors.iter().any(|e| e.kind == SpanKind::Improve) {
            VisualState::Improve
        } else {
            VisualState::Neutral
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Override {
    state: VisualState,
    /// `None` = until replaced
    expires_at: Option<f64>,
}

/// Derived state plus an optional loading/success override
#[derive(Debug, Clone, Default)]
pub struct StatusMachine {
    derived: VisualState,
    pinned: Option<Override>,
}

impl StatusMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> VisualState {
        self.pinned.map_or(self.derived, |o| o.state)
    }

    /// New analysis completed: recompute and drop any stale override
    pub fn on_analysis(&mut self, errors: &[ErrorSpan]) {
        self.derived = VisualState::derive(errors);
        self.pinned = None;
    }

    pub fn begin_loading(&mut self) {
        self.pinned = Some(Override {
            state: VisualState::Loading,
            expires_at: None,
        });
    }

    pub fn show_success(&mut self, now: f64, display_ms: f64) {
        self.pinned = Some(Override {
            state: VisualState::Success,
            expires_at: Some(now + display_ms),
        });
    }

    /// Fall back to the derived state
    pub fn clear_override(&mut self) {
        self.pinned = None;
    }

    /// Surface changed
    pub fn reset(&mut self) {
        self.derived = VisualState::Neutral;
        self.pinned = None;
    }

    /// Expire a timed override. Returns true if the visible state changed.
    pub fn tick(&mut self, now: f64) -> bool {
        match self.pinned {
            Some(Override { expires_at: Some(at), state }) if now >= at => {
                self.pinned = None;
                state != self.derived
            }
            _ => false,
        }
    }

    pub fn next_deadline(&self) -> Option<f64> {
        self.pinned.and_then(|o| o.expires_at)
    }
}
