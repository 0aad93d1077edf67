//! TextSurface adapter contract
//!
//! One read/write text interface over text inputs, textareas and
//! contenteditable regions, plus the `SurfaceMetrics` value object the
//! overlay renderer mirrors. Platform adapters (see `crate::dom`) fill it
//! in; tests use in-memory fakes.

use serde::{Deserialize, Serialize};

// =============================================================================
// Element classification
// =============================================================================

/// How a surface stores its text
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum SurfaceKind {
    /// `<input>` / `<textarea>`: text lives in `value`
    PlainInput,
    /// contenteditable: text lives in `innerText`
    EditableRegion,
}

/// The bits of an element needed to decide writability
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct ElementDescriptor {
    pub tag_name: String,
    /// `type` attribute, inputs only
    pub input_type: Option<String>,
    pub content_editable: bool,
}

const WRITABLE_INPUT_TYPES: &[&str] = &["text", "search", "email"];

/// Writable: text/search/email input, textarea, or contenteditable
pub fn is_writable(element: &ElementDescriptor) -> bool {
    if element.content_editable {
        return true;
    }
    match element.tag_name.to_ascii_lowercase().as_str() {
        "textarea" => true,
        "input" => element
            .input_type
            .as_deref()
            .map(|t| WRITABLE_INPUT_TYPES.iter().any(|w| t.eq_ignore_ascii_case(w)))
            .unwrap_or(false),
        _ => false,
    }
}

/// Storage kind for a writable element, `None` if not writable
pub fn classify(element: &ElementDescriptor) -> Option<SurfaceKind> {
    if !is_writable(element) {
        return None;
    }
    Some(if element.content_editable {
        SurfaceKind::EditableRegion
    } else {
        SurfaceKind::PlainInput
    })
}

// =============================================================================
// Metrics
// =============================================================================

/// Viewport-relative box of the surface
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

/// Computed-style subset that must match for character offsets to line up
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct MirroredStyle {
    pub font_family: String,
    pub font_size: String,
    pub font_weight: String,
    pub line_height: String,
    pub padding: String,
    pub margin: String,
    pub box_sizing: String,
    pub text_align: String,
    pub letter_spacing: String,
}

impl MirroredStyle {
    /// CSS property names, in mirroring order
    pub const PROPERTIES: [&'static str; 9] = [
        "font-family",
        "font-size",
        "font-weight",
        "line-height",
        "padding",
        "margin",
        "box-sizing",
        "text-align",
        "letter-spacing",
    ];

    /// Fill from a computed-style lookup (`getPropertyValue`)
    pub fn from_lookup(mut lookup: impl FnMut(&str) -> String) -> Self {
        Self {
            font_family: lookup("font-family"),
            font_size: lookup("font-size"),
            font_weight: lookup("font-weight"),
            line_height: lookup("line-height"),
            padding: lookup("padding"),
            margin: lookup("margin"),
            box_sizing: lookup("box-sizing"),
            text_align: lookup("text-align"),
            letter_spacing: lookup("letter-spacing"),
        }
    }

    /// `(property, value)` pairs, in `PROPERTIES` order
    pub fn entries(&self) -> [(&'static str, &str); 9] {
        [
            ("font-family", self.font_family.as_str()),
            ("font-size", self.font_size.as_str()),
            ("font-weight", self.font_weight.as_str()),
            ("line-height", self.line_height.as_str()),
            ("padding", self.padding.as_str()),
            ("margin", self.margin.as_str()),
            ("box-sizing", self.box_sizing.as_str()),
            ("text-align", self.text_align.as_str()),
            ("letter-spacing", self.letter_spacing.as_str()),
        ]
    }
}

/// Everything the overlay needs to sit exactly on top of a surface
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct SurfaceMetrics {
    pub rect: Rect,
    pub scroll_x: f64,
    pub scroll_y: f64,
    pub style: MirroredStyle,
}

// =============================================================================
// TextSurface
// =============================================================================

/// One editable element. Text is always re-read, never cached.
pub trait TextSurface {
    fn kind(&self) -> SurfaceKind;

    /// `innerText` for editable regions, `value` for inputs
    fn read_text(&self) -> String;

    /// Assign the kind-appropriate property, then notify host listeners
    /// with a bubbling `input` event.
    fn write_text(&mut self, text: &str);

    fn metrics(&self) -> SurfaceMetrics;

    /// True while the element holds document focus
    fn is_focused(&self) -> bool;

    /// Upper-case tag name, e.g. `TEXTAREA`
    fn element_type(&self) -> String;

    fn placeholder(&self) -> String {
        String::new()
    }
}
