//! Browser tests: DOM adapters against a real document
#![cfg(target_arch = "wasm32")]

use inkcore::dom::{DomOverlay, DomSurface};
use inkcore::{AnnotationEngine, ContentScript, EngineConfig, SurfaceKind, TextSurface, VisualState};
use js_sys::{Array, Function, Promise, JSON};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use wasm_bindgen_test::*;
use web_sys::{Document, Event, HtmlElement, HtmlTextAreaElement};

wasm_bindgen_test_configure!(run_in_browser);

fn document() -> Document {
    web_sys::window().unwrap().document().unwrap()
}

fn textarea(text: &str) -> HtmlTextAreaElement {
    let area: HtmlTextAreaElement = document().create_element("textarea").unwrap().dyn_into().unwrap();
    area.set_value(text);
    document().body().unwrap().append_child(&area).unwrap();
    area
}

#[wasm_bindgen_test]
fn test_textarea_surface_round_trip() {
    let area = textarea("teh cat");
    let mut surface = DomSurface::from_target(area.as_ref()).unwrap();

    assert_eq!(surface.kind(), SurfaceKind::PlainInput);
    assert_eq!(surface.element_type(), "TEXTAREA");
    assert_eq!(surface.read_text(), "teh cat");

    surface.write_text("the cat");
    assert_eq!(area.value(), "the cat");
    area.remove();
}

#[wasm_bindgen_test]
fn test_non_writable_element_rejected() {
    let button = document().create_element("button").unwrap();
    assert!(DomSurface::from_element(&button).is_none());

    let editable: HtmlElement = document().create_element("div").unwrap().dyn_into().unwrap();
    editable.set_content_editable("true");
    document().body().unwrap().append_child(&editable).unwrap();
    let surface = DomSurface::from_element(&editable).unwrap();
    assert_eq!(surface.kind(), SurfaceKind::EditableRegion);
    editable.remove();
}

#[wasm_bindgen_test]
fn test_overlay_painted_for_errors() {
    let area = textarea("teh cat");
    let surface = DomSurface::from_target(area.as_ref()).unwrap();
    let overlay = DomOverlay::new(document(), "test-overlay", None);
    let mut engine = AnnotationEngine::new(EngineConfig::default(), overlay).unwrap();

    engine.focus_in(surface, 0.0);
    assert_eq!(engine.visual_state(), VisualState::Error);

    let painted: HtmlElement = document().get_element_by_id("test-overlay").unwrap().dyn_into().unwrap();
    assert!(painted.inner_html().contains("<span"));
    assert_eq!(painted.style().get_property_value("position").unwrap(), "absolute");

    engine.focus_out();
    assert_eq!(painted.inner_html(), "");
    area.remove();
    painted.remove();
}

// =============================================================================
// ContentScript
// =============================================================================

const NO_ERRORS: &str = "return { errors: [] };";
const NO_VERSIONS: &str = "return { versions: {} };";

fn content_script(config: &str, check: &str) -> ContentScript {
    let config = JSON::parse(config).unwrap();
    let check = Function::new_with_args("text", check);
    let rewrite = Function::new_with_args("text, modes", NO_VERSIONS);
    ContentScript::new(config, check, rewrite, None).unwrap()
}

fn dispatch(target: &web_sys::EventTarget, kind: &str) {
    target.dispatch_event(&Event::new(kind).unwrap()).unwrap();
}

async fn sleep(ms: i32) {
    let promise = Promise::new(&mut |resolve, _| {
        web_sys::window()
            .unwrap()
            .set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms)
            .unwrap();
    });
    JsFuture::from(promise).await.unwrap();
}

#[wasm_bindgen_test]
fn test_content_script_tracks_focused_field() {
    let script = content_script(r#"{"overlay_id": "cs-focus", "typing_delay_ms": 0}"#, NO_ERRORS);
    script.attach().unwrap();
    assert!(script.current_input().unwrap().is_null());

    let area = textarea("teh cat sat");
    dispatch(area.as_ref(), "focusin");
    assert_eq!(script.visual_state(), "error");
    assert_eq!(Array::from(&script.errors().unwrap()).length(), 1);

    let painted: HtmlElement = document().get_element_by_id("cs-focus").unwrap().dyn_into().unwrap();
    assert!(painted.inner_html().contains("teh"));

    // The write re-enters through the field's own input event
    assert!(script.replace_text("the cat sat"));
    assert_eq!(area.value(), "the cat sat");
    assert_eq!(script.visual_state(), "neutral");
    assert_eq!(Array::from(&script.errors().unwrap()).length(), 0);

    script.detach();
    assert!(document().get_element_by_id("cs-focus").is_none());
    area.remove();
}

#[wasm_bindgen_test]
fn test_content_script_input_and_scroll_keep_overlay() {
    let script = content_script(r#"{"overlay_id": "cs-input", "typing_delay_ms": 0}"#, NO_ERRORS);
    script.attach().unwrap();

    let area = textarea("the cat sat");
    dispatch(area.as_ref(), "focusin");
    assert_eq!(script.visual_state(), "neutral");

    area.set_value("teh cat sat");
    dispatch(area.as_ref(), "input");
    assert_eq!(script.visual_state(), "error");

    dispatch(document().as_ref(), "scroll");
    let painted: HtmlElement = document().get_element_by_id("cs-input").unwrap().dyn_into().unwrap();
    assert!(painted.inner_html().contains("<span"));

    script.detach();
    area.remove();
}

#[wasm_bindgen_test]
fn test_content_script_menu_actions() {
    let script = content_script(r#"{"overlay_id": "cs-menu", "typing_delay_ms": 0}"#, NO_ERRORS);
    script.attach().unwrap();

    let area = textarea("I is going too the store");
    dispatch(area.as_ref(), "focusin");

    let chat = JSON::parse(r#"{"action": "open_chat"}"#).unwrap();
    assert_eq!(script.apply_action(chat).unwrap(), "open_chat");
    let summary = JSON::parse(r#"{"action": "summarize", "target": "page"}"#).unwrap();
    assert_eq!(script.apply_action(summary).unwrap(), "summarize_page");
    assert!(script.apply_action(JsValue::from_str("nonsense")).is_err());

    let menu = Array::from(&script.build_menu().unwrap());
    assert!(menu.length() > 2);

    script.detach();
    area.remove();
}

#[wasm_bindgen_test]
async fn test_content_script_clears_on_blur() {
    let script = content_script(
        r#"{"overlay_id": "cs-blur", "typing_delay_ms": 0, "blur_check_delay_ms": 10}"#,
        NO_ERRORS,
    );
    script.attach().unwrap();

    let area = textarea("teh cat sat");
    dispatch(area.as_ref(), "focusin");
    assert!(!script.current_input().unwrap().is_null());

    // Focus never left the page body, so the delayed check deactivates
    dispatch(document().body().unwrap().as_ref(), "mousedown");
    sleep(100).await;

    assert!(script.current_input().unwrap().is_null());
    assert_eq!(script.visual_state(), "neutral");

    script.detach();
    area.remove();
}

#[wasm_bindgen_test]
async fn test_content_script_merges_remote_spans() {
    let check = r#"return { errors: [{ start: 4, end: 7, type: "improve", text: "cat", suggestion: "dog" }] };"#;
    let script = content_script(
        r#"{"overlay_id": "cs-remote", "typing_delay_ms": 0, "remote_debounce_ms": 10}"#,
        check,
    );
    script.attach().unwrap();

    let area = textarea("teh cat sat");
    dispatch(area.as_ref(), "focusin");
    assert_eq!(Array::from(&script.errors().unwrap()).length(), 1);

    sleep(150).await;
    assert_eq!(Array::from(&script.errors().unwrap()).length(), 2);

    script.detach();
    area.remove();
}
