//! Async seam between the engine and the remote detector
//!
//! The engine hands out `RemoteRequest`s; `dispatch()` awaits the detector
//! and feeds the result back. The engine is only borrowed after the await,
//! so surface writes triggered by a resolution can't overlap with another
//! in-flight borrow.

use std::cell::RefCell;

use futures::future::LocalBoxFuture;

use crate::error::RemoteError;

use super::engine::{AnnotationEngine, CheckOutcome, Presenter, RemoteRequest, RewriteOutcome};
use super::gateway::{GrammarReport, RewriteReport};
use super::menu::RewriteMode;
use super::surface::TextSurface;

/// External grammar/rewrite service
pub trait RemoteDetector {
    fn check_grammar(&self, text: &str) -> LocalBoxFuture<'static, Result<GrammarReport, RemoteError>>;

    fn rewrite_text(&self, text: &str, modes: &[RewriteMode]) -> LocalBoxFuture<'static, Result<RewriteReport, RemoteError>>;
}

/// Millisecond time source
pub trait Clock {
    fn now(&self) -> f64;
}

/// `performance.now()` in the browser, a monotonic clock elsewhere
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        instant::now()
    }
}

/// What happened to a dispatched request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Check(CheckOutcome),
    Rewrite(RewriteOutcome),
}

/// Run one request against `detector` and resolve it on `engine`
pub async fn dispatch<S, P, D, C>(
    engine: &RefCell<AnnotationEngine<S, P>>,
    detector: &D,
    clock: &C,
    request: RemoteRequest,
) -> Resolution
where
    S: TextSurface + PartialEq,
    P: Presenter,
    D: RemoteDetector + ?Sized,
    C: Clock + ?Sized,
{
    match request {
        RemoteRequest::Check(token) => {
            let result = detector.check_grammar(token.text()).await;
            Resolution::Check(engine.borrow_mut().resolve_check(&token, result))
        }
        RemoteRequest::Rewrite(token) => {
            let result = detector.rewrite_text(token.text(), &[token.mode()]).await;
            let now = clock.now();
            Resolution::Rewrite(engine.borrow_mut().resolve_rewrite(&token, result, now))
        }
    }
}
