//! DOM host: wires the AnnotationEngine into a live page
//!
//! # Usage (WASM)
//! ```javascript,ignore
//! import init, { ContentScript } from 'inkcore';
//!
//! await init();
//!
//! const script = new ContentScript(
//!   { remote_debounce_ms: 1000 },
//!   (text) => chrome.runtime.sendMessage({ action: 'checkGrammar', text }),
//!   (text, modes) => chrome.runtime.sendMessage({ action: 'rewriteText', text, modes }),
//!   (state) => statusButton.dataset.state = state,
//! );
//! script.attach();
//!
//! // Menu opened on the status button
//! const items = script.buildMenu();
//! const result = script.applyAction(items[1].action);  // "applied" | "requested" | "open_chat" | "ignored"
//! ```

pub mod detector;
pub mod overlay;
pub mod surface;

pub use detector::JsRemoteDetector;
pub use overlay::DomOverlay;
pub use surface::DomSurface;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use js_sys::Function;
use log::{debug, info};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, Element, Event, EventTarget, Window};

use crate::annotate::{
    dispatch, ActionOutcome, AnnotationEngine, Clock, MenuAction, RemoteRequest, SummaryTarget, SystemClock,
};
use crate::config::EngineConfig;

type DomEngine = AnnotationEngine<DomSurface, DomOverlay>;

// =============================================================================
// Host
// =============================================================================

struct Listener {
    target: EventTarget,
    kind: &'static str,
    capture: bool,
    callback: Closure<dyn FnMut(Event)>,
}

/// Shared state behind a ContentScript. Listener closures hold `Weak` refs.
struct Host {
    engine: RefCell<DomEngine>,
    detector: JsRemoteDetector,
    clock: SystemClock,
    window: Window,
    document: Document,
    blur_check_delay_ms: f64,
    ui_root_selector: String,
    timer: Cell<Option<i32>>,
    listeners: RefCell<Vec<Listener>>,
}

impl Host {
    /// Run `f` on the engine unless it is already borrowed further up the
    /// stack (a surface write re-entering through its own input event).
    fn with_engine<R>(&self, f: impl FnOnce(&mut DomEngine) -> R) -> Option<R> {
        match self.engine.try_borrow_mut() {
            Ok(mut engine) => Some(f(&mut engine)),
            Err(_) => {
                debug!("[ContentScript] engine busy, skipping re-entrant event");
                None
            }
        }
    }

    fn listen(
        self: &Rc<Self>,
        target: &EventTarget,
        kind: &'static str,
        capture: bool,
        handler: fn(&Rc<Host>, Event),
    ) -> Result<(), JsValue> {
        let weak = Rc::downgrade(self);
        let callback = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            if let Some(host) = weak.upgrade() {
                handler(&host, event);
            }
        });
        target.add_event_listener_with_callback_and_bool(kind, callback.as_ref().unchecked_ref(), capture)?;
        self.listeners.borrow_mut().push(Listener {
            target: target.clone(),
            kind,
            capture,
            callback,
        });
        Ok(())
    }

    fn unlisten_all(&self) {
        for listener in self.listeners.borrow_mut().drain(..) {
            let _ = listener.target.remove_event_listener_with_callback_and_bool(
                listener.kind,
                listener.callback.as_ref().unchecked_ref(),
                listener.capture,
            );
        }
    }

    // -------------------------------------------------------------------------
    // Timers & remote work
    // -------------------------------------------------------------------------

    /// Arm one timeout for the engine's next deadline
    fn rearm(self: &Rc<Self>) {
        if let Some(handle) = self.timer.take() {
            self.window.clear_timeout_with_handle(handle);
        }
        let Some(at) = self.engine.try_borrow().ok().and_then(|e| e.next_deadline()) else {
            return;
        };

        let delay = (at - self.clock.now()).max(0.0).ceil() as i32;
        let weak = Rc::downgrade(self);
        let callback = Closure::once_into_js(move || {
            if let Some(host) = weak.upgrade() {
                host.on_timer();
            }
        });
        match self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(callback.unchecked_ref(), delay)
        {
            Ok(handle) => self.timer.set(Some(handle)),
            Err(e) => log::warn!("[ContentScript] could not arm timer: {:?}", e),
        }
    }

    fn on_timer(self: &Rc<Self>) {
        self.timer.set(None);
        let now = self.clock.now();
        let requests = self.with_engine(|engine| engine.tick(now)).unwrap_or_default();
        self.run(requests);
    }

    fn run(self: &Rc<Self>, requests: Vec<RemoteRequest>) {
        for request in requests {
            let host = Rc::clone(self);
            spawn_local(async move {
                let resolution = dispatch(&host.engine, &host.detector, &host.clock, request).await;
                debug!("[ContentScript] remote request resolved: {:?}", resolution);
                host.rearm();
            });
        }
        self.rearm();
    }

    // -------------------------------------------------------------------------
    // Event handlers
    // -------------------------------------------------------------------------

    fn on_focus_in(self: &Rc<Self>, event: Event) {
        let Some(surface) = event.target().and_then(|t| DomSurface::from_target(&t)) else {
            return;
        };
        let now = self.clock.now();
        self.with_engine(|engine| engine.focus_in(surface, now));
        self.rearm();
    }

    fn on_input(self: &Rc<Self>, event: Event) {
        let Some(surface) = event.target().and_then(|t| DomSurface::from_target(&t)) else {
            return;
        };
        let now = self.clock.now();
        self.with_engine(|engine| engine.on_input(surface, now));
        self.rearm();
    }

    fn on_mouse_down(self: &Rc<Self>, event: Event) {
        let Some(target) = event.target() else {
            return;
        };
        if DomSurface::from_target(&target).is_some() {
            return;
        }
        let inside_ui = target
            .dyn_ref::<Element>()
            .and_then(|el| el.closest(&self.ui_root_selector).ok().flatten())
            .is_some();
        if inside_ui {
            return;
        }

        let weak = Rc::downgrade(self);
        let check = Closure::once_into_js(move || {
            if let Some(host) = weak.upgrade() {
                host.check_blur();
            }
        });
        if let Err(e) = self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(check.unchecked_ref(), self.blur_check_delay_ms as i32)
        {
            log::warn!("[ContentScript] could not arm blur check: {:?}", e);
        }
    }

    /// Deactivate if focus fell back to the page body
    fn check_blur(self: &Rc<Self>) {
        let body: Option<Element> = self.document.body().map(Into::into);
        let on_body = match self.document.active_element() {
            None => true,
            Some(active) => Some(&active) == body.as_ref(),
        };
        if on_body {
            self.with_engine(|engine| engine.focus_out());
            self.rearm();
        }
    }

    fn on_viewport_change(self: &Rc<Self>, _event: Event) {
        self.with_engine(|engine| engine.sync_overlay());
    }
}

// =============================================================================
// ContentScript (wasm-bindgen surface)
// =============================================================================

/// Live annotation for every writable element on the page
#[wasm_bindgen]
pub struct ContentScript {
    host: Rc<Host>,
}

#[wasm_bindgen]
impl ContentScript {
    /// `checkGrammar(text)` and `rewriteText(text, modes)` may return values
    /// or Promises. `onStatus(state)` is optional.
    #[wasm_bindgen(constructor)]
    pub fn new(
        config: JsValue,
        check_grammar: Function,
        rewrite_text: Function,
        on_status: Option<Function>,
    ) -> Result<ContentScript, JsValue> {
        let config = EngineConfig::from_js(config)?;
        log::set_max_level(config.log_level());

        let window = web_sys::window().ok_or_else(|| JsValue::from_str("No window available"))?;
        let document = window.document().ok_or_else(|| JsValue::from_str("No document available"))?;

        let overlay = DomOverlay::new(document.clone(), &config.overlay_id, on_status);
        let blur_check_delay_ms = config.blur_check_delay_ms;
        let ui_root_selector = config.ui_root_selector.clone();
        let mut engine = AnnotationEngine::new(config, overlay)?;
        if let Ok(href) = window.location().href() {
            engine.set_summary_target(SummaryTarget::for_url(&href));
        }

        Ok(ContentScript {
            host: Rc::new(Host {
                engine: RefCell::new(engine),
                detector: JsRemoteDetector::new(check_grammar, rewrite_text),
                clock: SystemClock,
                window,
                document,
                blur_check_delay_ms,
                ui_root_selector,
                timer: Cell::new(None),
                listeners: RefCell::new(Vec::new()),
            }),
        })
    }

    /// Start listening to page events
    pub fn attach(&self) -> Result<(), JsValue> {
        let host = &self.host;
        if !host.listeners.borrow().is_empty() {
            return Ok(());
        }
        let document: &EventTarget = host.document.as_ref();
        let window: &EventTarget = host.window.as_ref();

        host.listen(document, "focusin", true, Host::on_focus_in)?;
        host.listen(document, "input", true, Host::on_input)?;
        host.listen(document, "mousedown", false, Host::on_mouse_down)?;
        host.listen(document, "scroll", true, Host::on_viewport_change)?;
        host.listen(window, "resize", false, Host::on_viewport_change)?;

        // Pick up a surface that already has focus
        if let Some(surface) = host.document.active_element().and_then(|el| DomSurface::from_element(&el)) {
            let now = host.clock.now();
            host.with_engine(|engine| engine.focus_in(surface, now));
            host.rearm();
        }

        info!("[ContentScript] attached");
        Ok(())
    }

    /// Stop listening and remove the overlay
    pub fn detach(&self) {
        let host = &self.host;
        host.unlisten_all();
        if let Some(handle) = host.timer.take() {
            host.window.clear_timeout_with_handle(handle);
        }
        host.with_engine(|engine| {
            engine.focus_out();
            engine.presenter_mut().remove();
        });
        info!("[ContentScript] detached");
    }

    /// Current menu entries as `[{ label, action, emphasized }]`
    #[wasm_bindgen(js_name = buildMenu)]
    pub fn build_menu(&self) -> Result<JsValue, JsValue> {
        let items = self.host.engine.try_borrow().map(|e| e.build_menu()).unwrap_or_default();
        serde_wasm_bindgen::to_value(&items).map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    /// Run a menu action; returns `applied`, `requested`, `open_chat`,
    /// `summarize_page`, `summarize_video` or `ignored`
    #[wasm_bindgen(js_name = applyAction)]
    pub fn apply_action(&self, action: JsValue) -> Result<String, JsValue> {
        let action: MenuAction =
            serde_wasm_bindgen::from_value(action).map_err(|e| JsValue::from_str(&format!("Invalid action: {}", e)))?;
        let host = &self.host;
        let now = host.clock.now();
        let outcome = host
            .with_engine(|engine| engine.apply_action(&action, now))
            .unwrap_or(ActionOutcome::Ignored);

        let label = match outcome {
            ActionOutcome::Applied => {
                host.rearm();
                "applied"
            }
            ActionOutcome::Requested(request) => {
                host.run(vec![request]);
                "requested"
            }
            ActionOutcome::OpenChat => "open_chat",
            ActionOutcome::Summarize(SummaryTarget::Page) => "summarize_page",
            ActionOutcome::Summarize(SummaryTarget::Video) => "summarize_video",
            ActionOutcome::Ignored => "ignored",
        };
        Ok(label.to_string())
    }

    /// Replace the active surface's text; false without an active surface
    #[wasm_bindgen(js_name = replaceText)]
    pub fn replace_text(&self, text: &str) -> bool {
        let host = &self.host;
        let now = host.clock.now();
        let replaced = host.with_engine(|engine| engine.replace_text(text, now)).unwrap_or(false);
        host.rearm();
        replaced
    }

    #[wasm_bindgen(js_name = insertText)]
    pub fn insert_text(&self, text: &str) -> bool {
        self.replace_text(text)
    }

    /// `{ text, element_type, placeholder }` of the active surface, or null
    #[wasm_bindgen(js_name = currentInput)]
    pub fn current_input(&self) -> Result<JsValue, JsValue> {
        match self.host.engine.try_borrow().ok().and_then(|e| e.current_input()) {
            Some(input) => serde_wasm_bindgen::to_value(&input)
                .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e))),
            None => Ok(JsValue::NULL),
        }
    }

    #[wasm_bindgen(js_name = visualState)]
    pub fn visual_state(&self) -> String {
        self.host
            .engine
            .try_borrow()
            .map(|e| e.visual_state().as_str().to_string())
            .unwrap_or_default()
    }

    /// Current error spans (byte offsets)
    pub fn errors(&self) -> Result<JsValue, JsValue> {
        let errors = self.host.engine.try_borrow().map(|e| e.errors().to_vec()).unwrap_or_default();
        serde_wasm_bindgen::to_value(&errors).map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }
}

impl Drop for ContentScript {
    fn drop(&mut self) {
        self.host.unlisten_all();
        if let Some(handle) = self.host.timer.take() {
            self.host.window.clear_timeout_with_handle(handle);
        }
    }
}
