//! AnnotationEngine: the context object that ties the pipeline together
//!
//! # Design Principles
//! 1. Sans-io: the engine never reads a clock, arms a timer or performs I/O.
//!    Callers pass `now` (ms) and poll `tick()` at `next_deadline()`; remote
//!    work comes back out as `RemoteRequest`s and goes in again through
//!    `resolve_check()` / `resolve_rewrite()`.
//! 2. One active surface per engine. Activating another one starts a new
//!    epoch: timers, remote spans and pending rewrites of the old one die.
//! 3. Every mutation of the surface goes through `write_text()`, which
//!    re-analyzes synchronously before anything else can run.
//!
//! # Usage
//! ```rust,ignore
//! let mut engine = AnnotationEngine::new(EngineConfig::default(), presenter)?;
//! engine.focus_in(surface, now);
//! engine.on_input(surface, now);
//! for request in engine.tick(now) { /* hand to a RemoteDetector */ }
//! ```

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::{ConfigError, RemoteError};

use super::gateway::{resolve_remote_spans, DebounceToken, GrammarReport, RemoteGateway, RewriteReport};
use super::menu::{build_menu, MenuAction, MenuItem, MenuSpec, RewriteMode, SummaryTarget};
use super::overlay::{OverlayFrame, OverlayRenderer};
use super::reconcile::{merge, shadowed_count};
use super::rules::RuleCortex;
use super::span::ErrorSpan;
use super::state::{StatusMachine, VisualState};
use super::surface::TextSurface;

// =============================================================================
// Presenter
// =============================================================================

/// Receives the abstract overlay and status indicator output
pub trait Presenter {
    /// Replace the overlay with `frame`
    fn paint(&mut self, frame: &OverlayFrame);
    /// Remove all overlay content
    fn clear(&mut self);
    /// The visible status changed
    fn show_status(&mut self, state: VisualState);
}

// =============================================================================
// Requests & outcomes
// =============================================================================

/// Identifies one in-flight rewrite
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteToken {
    generation: u64,
    epoch: u64,
    text: String,
    mode: RewriteMode,
}

impl RewriteToken {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn mode(&self) -> RewriteMode {
        self.mode
    }
}

/// Work the caller must hand to the remote detector
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteRequest {
    Check(DebounceToken),
    Rewrite(RewriteToken),
}

impl RemoteRequest {
    pub fn text(&self) -> &str {
        match self {
            RemoteRequest::Check(token) => token.text(),
            RemoteRequest::Rewrite(token) => token.text(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    Applied { spans: usize },
    Stale,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteOutcome {
    Applied,
    Stale,
    /// Service answered without the requested mode
    Missing,
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    /// Surface text was edited in place
    Applied,
    Requested(RemoteRequest),
    /// Host should open its chat panel
    OpenChat,
    /// Host should ask its chat panel for a summary
    Summarize(SummaryTarget),
    /// Nothing to do (no surface, text too short, fix target gone)
    Ignored,
}

/// Answer to the host's "what is being typed" query
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CurrentInput {
    pub text: String,
    pub element_type: String,
    pub placeholder: String,
}

/// Read-only view for hosts and tests
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AnnotationSnapshot {
    pub active: bool,
    pub errors: Vec<ErrorSpan>,
    pub visual_state: VisualState,
}

// =============================================================================
// AnnotationEngine
// =============================================================================

pub struct AnnotationEngine<S, P> {
    config: EngineConfig,
    rules: RuleCortex,
    renderer: OverlayRenderer,
    presenter: P,
    gateway: RemoteGateway,
    status: StatusMachine,
    shown_status: VisualState,

    active: Option<S>,
    /// Bumped on every activation/deactivation
    epoch: u64,
    errors: Vec<ErrorSpan>,
    typing_due: Option<f64>,
    pending_rewrite: Option<RewriteToken>,
    rewrite_generation: u64,
    summary_target: SummaryTarget,
}

impl<S: TextSurface + PartialEq, P: Presenter> AnnotationEngine<S, P> {
    /// Engine with the built-in rule set
    pub fn new(config: EngineConfig, presenter: P) -> Result<Self, ConfigError> {
        let rules = RuleCortex::standard(config.min_local_chars);
        Self::with_rules(config, rules, presenter)
    }

    pub fn with_rules(config: EngineConfig, rules: RuleCortex, presenter: P) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            renderer: OverlayRenderer::new(config.theme.clone()),
            gateway: RemoteGateway::new(config.remote_debounce_ms, config.min_remote_chars),
            rules,
            presenter,
            status: StatusMachine::new(),
            shown_status: VisualState::Neutral,
            active: None,
            epoch: 0,
            errors: Vec::new(),
            typing_due: None,
            pending_rewrite: None,
            rewrite_generation: 0,
            summary_target: SummaryTarget::Page,
            config,
        })
    }

    /// What the menu's summary entry offers, set by the host from the page
    pub fn set_summary_target(&mut self, target: SummaryTarget) {
        self.summary_target = target;
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    pub fn active_surface(&self) -> Option<&S> {
        self.active.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Current ordered error set
    pub fn errors(&self) -> &[ErrorSpan] {
        &self.errors
    }

    pub fn visual_state(&self) -> VisualState {
        self.status.current()
    }

    pub fn snapshot(&self) -> AnnotationSnapshot {
        AnnotationSnapshot {
            active: self.active.is_some(),
            errors: self.errors.clone(),
            visual_state: self.status.current(),
        }
    }

    fn current_text(&self) -> Option<String> {
        self.active.as_ref().map(|s| s.read_text())
    }

    // -------------------------------------------------------------------------
    // Surface lifecycle
    // -------------------------------------------------------------------------

    /// A writable element gained focus
    pub fn focus_in(&mut self, surface: S, now: f64) {
        if self.active.as_ref() != Some(&surface) {
            self.activate(surface);
        }
        self.analyze(now);
    }

    /// The user typed into `surface`. Local analysis runs after the typing delay.
    pub fn on_input(&mut self, surface: S, now: f64) {
        if self.active.as_ref() != Some(&surface) {
            // A new surface is resynced before its input is accepted
            self.activate(surface);
            self.analyze(now);
            return;
        }
        if self.config.typing_delay_ms <= 0.0 {
            self.analyze(now);
        } else {
            self.typing_due = Some(now + self.config.typing_delay_ms);
        }
    }

    /// Focus moved to something that is not a writable surface
    pub fn focus_out(&mut self) {
        if self.active.take().is_none() {
            return;
        }
        self.clear_session();
        self.presenter.clear();
        self.publish_status();
    }

    fn activate(&mut self, surface: S) {
        debug!("[Engine] activating {} surface", surface.element_type());
        self.active = Some(surface);
        self.clear_session();
    }

    fn clear_session(&mut self) {
        self.epoch += 1;
        self.gateway.reset();
        self.typing_due = None;
        self.pending_rewrite = None;
        self.errors.clear();
        self.status.reset();
    }

    // -------------------------------------------------------------------------
    // Analysis
    // -------------------------------------------------------------------------

    /// Full local pass, then (re)start the remote debounce window
    pub fn analyze(&mut self, now: f64) {
        self.run_analysis();
        self.schedule_remote_check(now);
    }

    /// Restart the remote debounce window for the active surface
    pub fn schedule_remote_check(&mut self, now: f64) {
        if self.active.is_some() {
            self.gateway.schedule(now);
        }
    }

    /// Local match + merge with still-valid remote spans + redraw
    fn run_analysis(&mut self) {
        let Some(surface) = self.active.as_ref() else {
            return;
        };
        let text = surface.read_text();

        let local = self.rules.match_local(&text);
        let remote = self.gateway.spans_for(&text);
        let shadowed = shadowed_count(&local, remote);
        if shadowed > 0 {
            debug!("[Engine] {} remote span(s) shadowed by local matches", shadowed);
        }
        self.errors = merge(&local, remote);
        self.typing_due = None;

        self.status.on_analysis(&self.errors);
        self.sync_overlay();
        self.publish_status();
    }

    /// Rebuild the overlay from the live text. Called on every state update,
    /// and by the host on resize/scroll.
    pub fn sync_overlay(&mut self) {
        let Some(surface) = self.active.as_ref() else {
            return;
        };
        let text = surface.read_text();
        let frame = self.renderer.render(&surface.metrics(), &text, &self.errors);
        self.presenter.paint(&frame);
    }

    fn publish_status(&mut self) {
        let current = self.status.current();
        if current != self.shown_status {
            self.shown_status = current;
            self.presenter.show_status(current);
        }
    }

    // -------------------------------------------------------------------------
    // Timers
    // -------------------------------------------------------------------------

    /// Earliest time `tick()` has work to do
    pub fn next_deadline(&self) -> Option<f64> {
        [self.typing_due, self.gateway.next_deadline(), self.status.next_deadline()]
            .into_iter()
            .flatten()
            .reduce(f64::min)
    }

    /// Run everything due at `now`; returns remote checks to issue
    pub fn tick(&mut self, now: f64) -> Vec<RemoteRequest> {
        let mut requests = Vec::new();

        if self.typing_due.is_some_and(|at| now >= at) {
            self.analyze(now);
        }

        if self.status.tick(now) {
            self.publish_status();
        }

        if self.gateway.is_due(now) {
            match self.current_text() {
                Some(text) => {
                    if let Some(token) = self.gateway.fire(self.epoch, text) {
                        debug!("[Engine] issuing remote check #{}", token.generation());
                        requests.push(RemoteRequest::Check(token));
                    }
                }
                None => self.gateway.cancel(),
            }
        }

        requests
    }

    // -------------------------------------------------------------------------
    // Remote results
    // -------------------------------------------------------------------------

    /// Apply a grammar check result if it is still relevant
    pub fn resolve_check(&mut self, token: &DebounceToken, result: Result<GrammarReport, RemoteError>) -> CheckOutcome {
        let report = match result {
            Ok(report) => report,
            Err(e) => {
                debug!("[Engine] remote check failed, staying local-only: {}", e);
                return CheckOutcome::Failed;
            }
        };

        let Some(text) = self.current_text() else {
            return CheckOutcome::Stale;
        };
        if !self.gateway.accepts(token, self.epoch, &text) {
            debug!("[Engine] discarding stale check #{}", token.generation());
            return CheckOutcome::Stale;
        }

        let spans = resolve_remote_spans(&text, &report.errors);
        let count = spans.len();
        self.gateway.store(text, spans);
        self.run_analysis();

        CheckOutcome::Applied { spans: count }
    }

    /// Apply a rewrite result if the surface still holds the text it was made from
    pub fn resolve_rewrite(
        &mut self,
        token: &RewriteToken,
        result: Result<RewriteReport, RemoteError>,
        now: f64,
    ) -> RewriteOutcome {
        if self.pending_rewrite.as_ref() != Some(token) {
            return RewriteOutcome::Stale;
        }
        self.pending_rewrite = None;

        let outcome = match result {
            Err(e) => {
                debug!("[Engine] rewrite failed: {}", e);
                RewriteOutcome::Failed
            }
            Ok(_) if self.current_text().as_deref() != Some(token.text()) => RewriteOutcome::Stale,
            Ok(mut report) => match report.versions.remove(token.mode.as_str()).filter(|v| !v.is_empty()) {
                Some(version) => {
                    self.write_text(&version, now);
                    self.status.show_success(now, self.config.success_display_ms);
                    self.publish_status();
                    return RewriteOutcome::Applied;
                }
                None => RewriteOutcome::Missing,
            },
        };

        self.status.clear_override();
        self.publish_status();
        outcome
    }

    // -------------------------------------------------------------------------
    // Menu
    // -------------------------------------------------------------------------

    /// Fresh menu for the current surface and error set
    pub fn build_menu(&self) -> Vec<MenuItem> {
        let spec = MenuSpec {
            max_quick_fixes: self.config.max_quick_fixes,
            min_chars: self.config.min_local_chars,
            rewrite_modes: &self.config.rewrite_modes,
            summary_target: self.summary_target,
        };

        match self.active.as_ref() {
            Some(surface) => {
                let text = surface.read_text();
                let live: Vec<ErrorSpan> = self.errors.iter().filter(|s| s.is_valid_for(&text)).cloned().collect();
                build_menu(Some((text.as_str(), surface.is_focused())), &live, &spec)
            }
            None => build_menu(None, &[], &spec),
        }
    }

    pub fn apply_action(&mut self, action: &MenuAction, now: f64) -> ActionOutcome {
        match action {
            MenuAction::OpenChat => ActionOutcome::OpenChat,
            MenuAction::Summarize { target } => ActionOutcome::Summarize(*target),
            MenuAction::CorrectAll => self.request_rewrite(RewriteMode::Corrected),
            MenuAction::Rewrite { mode } => self.request_rewrite(*mode),
            MenuAction::ApplyFix { span } => self.apply_fix(span, now),
        }
    }

    fn apply_fix(&mut self, span: &ErrorSpan, now: f64) -> ActionOutcome {
        let Some(text) = self.current_text() else {
            return ActionOutcome::Ignored;
        };
        if !self.errors.contains(span) || !span.is_valid_for(&text) {
            debug!("[Engine] fix target \"{}\" is gone", span.source_text);
            return ActionOutcome::Ignored;
        }

        match span.splice_replacement() {
            Some(replacement) => {
                let updated = span.apply_to(&text, replacement);
                self.write_text(&updated, now);
                ActionOutcome::Applied
            }
            None => self.request_rewrite(RewriteMode::fallback_for(span.kind)),
        }
    }

    fn request_rewrite(&mut self, mode: RewriteMode) -> ActionOutcome {
        let Some(text) = self.current_text() else {
            return ActionOutcome::Ignored;
        };
        if text.chars().count() < self.config.min_rewrite_chars {
            return ActionOutcome::Ignored;
        }

        self.rewrite_generation += 1;
        let token = RewriteToken {
            generation: self.rewrite_generation,
            epoch: self.epoch,
            text,
            mode,
        };
        self.pending_rewrite = Some(token.clone());
        self.status.begin_loading();
        self.publish_status();

        ActionOutcome::Requested(RemoteRequest::Rewrite(token))
    }

    // -------------------------------------------------------------------------
    // Writes
    // -------------------------------------------------------------------------

    /// Replace the surface text and re-analyze immediately
    pub fn write_text(&mut self, text: &str, now: f64) -> bool {
        let Some(surface) = self.active.as_mut() else {
            return false;
        };
        surface.write_text(text);
        self.analyze(now);
        true
    }

    /// External "replace current text" command
    pub fn replace_text(&mut self, text: &str, now: f64) -> bool {
        let replaced = self.write_text(text, now);
        if replaced {
            info!("[Engine] replaced surface text ({} chars)", text.chars().count());
        }
        replaced
    }

    pub fn current_input(&self) -> Option<CurrentInput> {
        self.active.as_ref().map(|surface| CurrentInput {
            text: surface.read_text(),
            element_type: surface.element_type(),
            placeholder: surface.placeholder(),
        })
    }
}
