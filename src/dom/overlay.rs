//! DomOverlay: paints OverlayFrames into a positioned div

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, HtmlElement};

use crate::annotate::{OverlayFrame, Presenter, VisualState};

pub struct DomOverlay {
    document: Document,
    overlay_id: String,
    element: Option<HtmlElement>,
    /// Called with the visual state name on every change
    on_status: Option<js_sys::Function>,
}

impl DomOverlay {
    pub fn new(document: Document, overlay_id: &str, on_status: Option<js_sys::Function>) -> Self {
        Self {
            document,
            overlay_id: overlay_id.to_string(),
            element: None,
            on_status,
        }
    }

    /// The overlay div, created or re-attached if the page dropped it
    fn ensure(&mut self) -> Option<HtmlElement> {
        if let Some(element) = &self.element {
            if element.is_connected() {
                return Some(element.clone());
            }
        }

        let element = match self.document.get_element_by_id(&self.overlay_id) {
            Some(existing) => existing,
            None => {
                let created = self.document.create_element("div").ok()?;
                created.set_id(&self.overlay_id);
                created
            }
        };
        let element: HtmlElement = element.dyn_into().ok()?;
        if !element.is_connected() {
            let body = self.document.body()?;
            if let Err(e) = body.append_child(&element) {
                log::warn!("[DomOverlay] could not attach overlay: {:?}", e);
                return None;
            }
        }

        self.element = Some(element.clone());
        Some(element)
    }

    pub fn remove(&mut self) {
        if let Some(element) = self.element.take() {
            element.remove();
        }
    }
}

impl Presenter for DomOverlay {
    fn paint(&mut self, frame: &OverlayFrame) {
        let Some(element) = self.ensure() else {
            return;
        };
        let style = element.style();
        for (property, value) in &frame.styles {
            let _ = style.set_property(property, value);
        }
        element.set_inner_html(&frame.html);
    }

    fn clear(&mut self) {
        if let Some(element) = &self.element {
            element.set_inner_html("");
        }
    }

    fn show_status(&mut self, state: VisualState) {
        let Some(callback) = &self.on_status else {
            return;
        };
        if let Err(e) = callback.call1(&JsValue::NULL, &JsValue::from_str(state.as_str())) {
            log::warn!("[DomOverlay] status callback threw: {:?}", e);
        }
    }
}
