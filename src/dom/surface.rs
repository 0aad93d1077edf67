//! DomSurface: TextSurface over a live DOM element

use wasm_bindgen::JsCast;
use web_sys::{Element, Event, EventInit, EventTarget, HtmlElement, HtmlInputElement, HtmlTextAreaElement};

use crate::annotate::{classify, ElementDescriptor, MirroredStyle, Rect, SurfaceKind, SurfaceMetrics, TextSurface};

/// A writable input, textarea or contenteditable element
#[derive(Debug, Clone, PartialEq)]
pub struct DomSurface {
    element: HtmlElement,
    kind: SurfaceKind,
}

impl DomSurface {
    /// Wrap `target` if it is a writable element
    pub fn from_target(target: &EventTarget) -> Option<Self> {
        let element = target.dyn_ref::<HtmlElement>()?;
        let kind = classify(&describe(element))?;
        Some(Self {
            element: element.clone(),
            kind,
        })
    }

    pub fn from_element(element: &Element) -> Option<Self> {
        Self::from_target(element.as_ref())
    }

    pub fn element(&self) -> &HtmlElement {
        &self.element
    }
}

/// Writability facts for classification
pub fn describe(element: &HtmlElement) -> ElementDescriptor {
    ElementDescriptor {
        tag_name: element.tag_name(),
        input_type: element.dyn_ref::<HtmlInputElement>().map(|input| input.type_()),
        content_editable: element.is_content_editable(),
    }
}

impl TextSurface for DomSurface {
    fn kind(&self) -> SurfaceKind {
        self.kind
    }

    fn read_text(&self) -> String {
        if let Some(input) = self.element.dyn_ref::<HtmlInputElement>() {
            input.value()
        } else if let Some(area) = self.element.dyn_ref::<HtmlTextAreaElement>() {
            area.value()
        } else {
            self.element.inner_text()
        }
    }

    fn write_text(&mut self, text: &str) {
        if let Some(input) = self.element.dyn_ref::<HtmlInputElement>() {
            input.set_value(text);
        } else if let Some(area) = self.element.dyn_ref::<HtmlTextAreaElement>() {
            area.set_value(text);
        } else {
            self.element.set_inner_text(text);
        }

        // Frameworks bound to the element only see the change through an input event
        let init = EventInit::new();
        init.set_bubbles(true);
        match Event::new_with_event_init_dict("input", &init) {
            Ok(event) => {
                let _ = self.element.dispatch_event(&event);
            }
            Err(e) => log::warn!("[DomSurface] could not create input event: {:?}", e),
        }
    }

    fn metrics(&self) -> SurfaceMetrics {
        let bounds = self.element.get_bounding_client_rect();
        let rect = Rect {
            top: bounds.top(),
            left: bounds.left(),
            width: bounds.width(),
            height: bounds.height(),
        };

        let Some(window) = web_sys::window() else {
            return SurfaceMetrics {
                rect,
                ..SurfaceMetrics::default()
            };
        };
        let computed = window.get_computed_style(&self.element).ok().flatten();
        let style = MirroredStyle::from_lookup(|property| {
            computed
                .as_ref()
                .and_then(|css| css.get_property_value(property).ok())
                .unwrap_or_default()
        });

        SurfaceMetrics {
            rect,
            scroll_x: window.scroll_x().unwrap_or(0.0),
            scroll_y: window.scroll_y().unwrap_or(0.0),
            style,
        }
    }

    fn is_focused(&self) -> bool {
        let own: &Element = self.element.as_ref();
        web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.active_element())
            .is_some_and(|active| active == *own)
    }

    fn element_type(&self) -> String {
        self.element.tag_name()
    }

    fn placeholder(&self) -> String {
        if let Some(input) = self.element.dyn_ref::<HtmlInputElement>() {
            input.placeholder()
        } else if let Some(area) = self.element.dyn_ref::<HtmlTextAreaElement>() {
            area.placeholder()
        } else {
            self.element.get_attribute("placeholder").unwrap_or_default()
        }
    }
}
