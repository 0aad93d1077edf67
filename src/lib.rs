//! InkCore: Live Text Annotation + Highlight Overlay
//!
//! A Rust/WASM engine that watches whatever text field the user is typing
//! in, flags writing issues, and draws wavy underlines on a transparent
//! overlay mirrored over the field.
//!
//! # Architecture
//!
//! ## Annotate Components (platform-free)
//! - `span.rs` - ErrorSpan: flagged byte ranges + char/byte offset conversion
//! - `rules.rs` - RuleCortex: Local rules (Aho-Corasick misspellings, regex phrases, repeated words)
//! - `gateway.rs` - RemoteGateway: Debounced remote checks + stale-result rule
//! - `reconcile.rs` - merge(): Local wins on overlap, stable sort by start
//! - `overlay.rs` - OverlayRenderer: Style mirroring + escaped highlight markup
//! - `state.rs` - StatusMachine: neutral/error/improve + loading/success overrides
//! - `menu.rs` - Menu builder: quick fixes, correct-all, rewrite modes
//! - `engine.rs` - AnnotationEngine: Ties everything together, sans-io
//! - `driver.rs` - dispatch(): Async bridge to a RemoteDetector
//!
//! ## DOM Host
//! - `dom/surface.rs` - DomSurface: inputs, textareas, contenteditable
//! - `dom/overlay.rs` - DomOverlay: positioned div presenter
//! - `dom/detector.rs` - JsRemoteDetector: host JS functions as the remote service
//! - `dom/mod.rs` - ContentScript: page listeners + timers
//!
//! # Usage (WASM)
//! ```javascript,ignore
//! import init, { ContentScript } from 'inkcore';
//!
//! await init();
//!
//! const script = new ContentScript({}, checkGrammar, rewriteText, onStatus);
//! script.attach();
//!
//! // User types "I is going too the store" into a textarea:
//! console.log(script.errors());      // [{ start: 0, end: 4, ... }, { start: 11, end: 14, suggestion: "to", ... }]
//! console.log(script.visualState()); // "error"
//! ```

pub mod annotate;
pub mod config;
pub mod dom;
pub mod error;
pub mod logging;

// Public exports - Engine
pub use annotate::*;

// Public exports - Host
pub use config::EngineConfig;
pub use dom::ContentScript;
pub use error::{ConfigError, RemoteError};

use wasm_bindgen::prelude::*;

// When the `wee_alloc` feature is enabled, use `wee_alloc` as the global
// allocator for smaller WASM bundle size.
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

/// Install panic hook and console logging
#[wasm_bindgen(start)]
pub fn main() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    logging::init(log::LevelFilter::Info);
}

/// Get version information
#[wasm_bindgen]
pub fn version() -> String {
    format!("inkcore v{}", env!("CARGO_PKG_VERSION"))
}
