//! Interaction menu: contextual fix and rewrite actions
//!
//! Menus are rebuilt on every open from the live text and current error set.
//! Fix actions carry a copy of the span they were built from, so a click
//! that arrives after the text changed can be recognized and ignored.

use serde::{Deserialize, Serialize};

use super::span::{ErrorSpan, SpanKind};

/// Whole-text rewrite variants understood by the remote service
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RewriteMode {
    Corrected,
    Improved,
    Professional,
    Concise,
    Explained,
}

impl RewriteMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RewriteMode::Corrected => "corrected",
            RewriteMode::Improved => "improved",
            RewriteMode::Professional => "professional",
            RewriteMode::Concise => "concise",
            RewriteMode::Explained => "explained",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RewriteMode::Corrected => "Correct All Errors",
            RewriteMode::Improved => "Improve Clarity",
            RewriteMode::Professional => "Make Professional",
            RewriteMode::Concise => "Make Concise",
            RewriteMode::Explained => "Explain this",
        }
    }

    /// Whole-text request used when a single fix can't be spliced
    pub fn fallback_for(kind: SpanKind) -> Self {
        match kind {
            SpanKind::Error => RewriteMode::Corrected,
            SpanKind::Improve => RewriteMode::Improved,
        }
    }
}

/// What a summary hand-off covers
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SummaryTarget {
    #[default]
    Page,
    /// The page is a video watch page
    Video,
}

impl SummaryTarget {
    /// Video for watch pages, page for everything else
    pub fn for_url(url: &str) -> Self {
        if url.contains("youtube.com/watch") {
            SummaryTarget::Video
        } else {
            SummaryTarget::Page
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SummaryTarget::Page => "Summarize Page",
            SummaryTarget::Video => "Summarize Video",
        }
    }
}

/// What a menu entry does when activated
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum MenuAction {
    /// Hand off to the host's chat panel
    OpenChat,
    CorrectAll,
    ApplyFix { span: ErrorSpan },
    Rewrite { mode: RewriteMode },
    /// Hand the page off to the host's chat panel for a summary
    Summarize { target: SummaryTarget },
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MenuItem {
    pub label: String,
    pub action: MenuAction,
    #[serde(default)]
    pub emphasized: bool,
}

impl MenuItem {
    fn new(label: impl Into<String>, action: MenuAction) -> Self {
        Self {
            label: label.into(),
            action,
            emphasized: false,
        }
    }
}

/// Menu shaping knobs
#[derive(Debug, Clone)]
pub struct MenuSpec<'a> {
    pub max_quick_fixes: usize,
    pub min_chars: usize,
    pub rewrite_modes: &'a [RewriteMode],
    pub summary_target: SummaryTarget,
}

/// Label for a single-fix entry
pub fn fix_label(span: &ErrorSpan) -> String {
    match &span.suggestion {
        Some(suggestion) => format!("Fix: {}", suggestion),
        None => format!("Fix \"{}\"", span.source_text),
    }
}

/// Build the action list for the active surface.
///
/// `surface` is `(text, focused)` for the active surface, `None` without one.
/// The summary entry always comes last.
pub fn build_menu(surface: Option<(&str, bool)>, errors: &[ErrorSpan], spec: &MenuSpec<'_>) -> Vec<MenuItem> {
    let mut items = vec![MenuItem::new("Open AI Chat", MenuAction::OpenChat)];

    let typing = surface.is_some_and(|(text, focused)| focused && text.chars().count() >= spec.min_chars);
    if typing {
        push_typing_items(&mut items, errors, spec);
    }

    let target = spec.summary_target;
    items.push(MenuItem::new(target.label(), MenuAction::Summarize { target }));
    items
}

fn push_typing_items(items: &mut Vec<MenuItem>, errors: &[ErrorSpan], spec: &MenuSpec<'_>) {
    if !errors.is_empty() {
        items.push(MenuItem {
            emphasized: true,
            ..MenuItem::new(RewriteMode::Corrected.label(), MenuAction::CorrectAll)
        });
        items.extend(
            errors
                .iter()
                .take(spec.max_quick_fixes)
                .map(|span| MenuItem::new(fix_label(span), MenuAction::ApplyFix { span: span.clone() })),
        );
    }

    items.extend(
        spec.rewrite_modes
            .iter()
            .map(|mode| MenuItem::new(mode.label(), MenuAction::Rewrite { mode: *mode })),
    );
}
