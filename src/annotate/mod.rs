//! Annotate - live text annotation pipeline
//!
//! ```text
//! TextSurface ──read──▶ RuleCortex ──local──┐
//!      │                                    ├─▶ merge ─▶ OverlayRenderer ─▶ Presenter
//!      └──debounce──▶ RemoteGateway ─remote─┘     │
//!                                                 └─▶ StatusMachine ─▶ Presenter
//! ```
//!
//! Everything here is platform-free. `AnnotationEngine` is driven with
//! explicit timestamps; `driver` connects it to an async remote detector.

pub mod driver;
pub mod engine;
pub mod gateway;
pub mod menu;
pub mod overlay;
pub mod reconcile;
pub mod rules;
pub mod span;
pub mod state;
pub mod surface;


pub use driver::{dispatch, Clock, RemoteDetector, Resolution, SystemClock};
pub use engine::{
    ActionOutcome, AnnotationEngine, AnnotationSnapshot, CheckOutcome, CurrentInput, Presenter, RemoteRequest,
    RewriteOutcome, RewriteToken,
};
pub use gateway::{resolve_remote_spans, DebounceToken, GrammarReport, RemoteGateway, RemoteSpan, RewriteReport};
pub use menu::{build_menu, MenuAction, MenuItem, MenuSpec, RewriteMode, SummaryTarget};
pub use overlay::{escape_html, OverlayFrame, OverlayRenderer, OverlayTheme};
pub use reconcile::merge;
pub use rules::{DictionaryRule, PatternRule, RepeatedWordRule, Rule, RuleCortex};
pub use span::{ErrorSpan, SpanKind, SpanOrigin};
pub use state::{StatusMachine, VisualState};
pub use surface::{classify, is_writable, ElementDescriptor, MirroredStyle, Rect, SurfaceKind, SurfaceMetrics, TextSurface};
