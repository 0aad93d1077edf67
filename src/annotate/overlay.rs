//! Overlay rendering: a transparent copy of the surface text with underlined spans
//!
//! The overlay renders a *copy* of the text, so every metric that affects
//! glyph placement is mirrored from the surface's computed style. Frames are
//! always rebuilt from scratch.

use serde::{Deserialize, Serialize};

use super::span::{ErrorSpan, SpanKind};
use super::surface::SurfaceMetrics;

/// Colors and stacking for the highlight layer
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct OverlayTheme {
    pub error_color: String,
    pub improve_color: String,
    pub z_index: String,
}

impl Default for OverlayTheme {
    fn default() -> Self {
        Self {
            error_color: "#ff4d4d".to_string(),
            improve_color: "#ffcc00".to_string(),
            z_index: "2147483646".to_string(),
        }
    }
}

/// Abstract overlay: inline style declarations plus inner HTML
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct OverlayFrame {
    pub styles: Vec<(String, String)>,
    pub html: String,
}

impl OverlayFrame {
    /// Value of one style property
    pub fn style(&self, property: &str) -> Option<&str> {
        self.styles
            .iter()
            .find(|(name, _)| name == property)
            .map(|(_, value)| value.as_str())
    }

    fn set(&mut self, property: &str, value: impl Into<String>) {
        self.styles.push((property.to_string(), value.into()));
    }
}

pub struct OverlayRenderer {
    theme: OverlayTheme,
}

impl OverlayRenderer {
    pub fn new(theme: OverlayTheme) -> Self {
        Self { theme }
    }

    /// Build the frame for `text` with `errors` (sorted by start)
    pub fn render(&self, metrics: &SurfaceMetrics, text: &str, errors: &[ErrorSpan]) -> OverlayFrame {
        let mut frame = OverlayFrame::default();
        let rect = &metrics.rect;

        frame.set("top", px(rect.top + metrics.scroll_y));
        frame.set("left", px(rect.left + metrics.scroll_x));
        frame.set("width", px(rect.width));
        frame.set("height", px(rect.height));
        for (property, value) in metrics.style.entries() {
            frame.set(property, value);
        }
        frame.set("position", "absolute");
        frame.set("pointer-events", "none");
        frame.set("z-index", self.theme.z_index.as_str());
        frame.set("color", "transparent");
        frame.set("white-space", "pre-wrap");
        frame.set("word-wrap", "break-word");
        frame.set("overflow", "hidden");

        if !errors.is_empty() {
            frame.html = self.render_text(text, errors);
        }
        frame
    }

    fn render_text(&self, text: &str, errors: &[ErrorSpan]) -> String {
        let mut html = String::with_capacity(text.len() * 2);
        let mut cursor = 0;

        for span in errors {
            // Overlapping or out-of-range spans can't be nested in flat markup
            if span.start < cursor || !span.is_valid_for(text) {
                continue;
            }
            html.push_str(&escape_html(&text[cursor..span.start]));
            html.push_str(&format!(
                "<span style=\"border-bottom: 2px wavy {};\">{}</span>",
                self.color(span.kind),
                escape_html(&text[span.range()])
            ));
            cursor = span.end;
        }
        html.push_str(&escape_html(&text[cursor..]));

        html.replace('\n', "<br/>")
    }

    fn color(&self, kind: SpanKind) -> &str {
        match kind {
            SpanKind::Error => &self.theme.error_color,
            SpanKind::Improve => &self.theme.improve_color,
        }
    }
}

impl Default for OverlayRenderer {
    fn default() -> Self {
        Self::new(OverlayTheme::default())
    }
}

fn px(value: f64) -> String {
    format!("{}px", value)
}

/// Escape `& < > " '` for safe insertion as HTML text
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotate::surface::{MirroredStyle, Rect};

    fn metrics() -> SurfaceMetrics {
        SurfaceMetrics {
            rect: Rect { top: 100.0, left: 20.5, width: 300.0, height: 48.0 },
            scroll_x: 0.0,
            scroll_y: 250.0,
            style: MirroredStyle {
                font_family: "Georgia, serif".to_string(),
                font_size: "16px".to_string(),
                font_weight: "400".to_string(),
                line_height: "24px".to_string(),
                padding: "4px 8px".to_string(),
                margin: "0px".to_string(),
                box_sizing: "border-box".to_string(),
                text_align: "start".to_string(),
                letter_spacing: "normal".to_string(),
            },
        }
    }

    fn span(text: &str, start: usize, end: usize, kind: SpanKind) -> ErrorSpan {
        ErrorSpan::local(text, start..end, kind, None)
    }

    #[test]
    fn test_position_includes_scroll() {
        let frame = OverlayRenderer::default().render(&metrics(), "", &[]);
        assert_eq!(frame.style("top"), Some("350px"));
        assert_eq!(frame.style("left"), Some("20.5px"));
        assert_eq!(frame.style("width"), Some("300px"));
        assert_eq!(frame.style("height"), Some("48px"));
        assert_eq!(frame.style("pointer-events"), Some("none"));
    }

    #[test]
    fn test_font_metrics_mirrored_exactly_across_recreation() {
        let metrics = metrics();
        let text = "teh cat";
        let errors = vec![span(text, 0, 3, SpanKind::Error)];

        let first = OverlayRenderer::default().render(&metrics, text, &errors);
        let second = OverlayRenderer::default().render(&metrics, text, &errors);

        for frame in [&first, &second] {
            assert_eq!(frame.style("font-size"), Some(metrics.style.font_size.as_str()));
            assert_eq!(frame.style("line-height"), Some(metrics.style.line_height.as_str()));
            assert_eq!(frame.style("font-family"), Some("Georgia, serif"));
        }
        assert_eq!(first, second);
    }

    #[test]
    fn test_spans_wrapped_and_colored() {
        let text = "teh very cat";
        let errors = vec![span(text, 0, 3, SpanKind::Error), span(text, 4, 8, SpanKind::Improve)];
        let frame = OverlayRenderer::default().render(&metrics(), text, &errors);

        assert_eq!(
            frame.html,
            "<span style=\"border-bottom: 2px wavy #ff4d4d;\">teh</span> \
             <span style=\"border-bottom: 2px wavy #ffcc00;\">very</span> cat"
        );
    }

    #[test]
    fn test_literal_text_is_escaped() {
        let text = "<b>x</b> teh & 'q'";
        let start = text.find("teh").unwrap();
        let errors = vec![span(text, start, start + 3, SpanKind::Error)];
        let frame = OverlayRenderer::default().render(&metrics(), text, &errors);

        assert!(frame.html.starts_with("&lt;b&gt;x&lt;/b&gt; <span"));
        assert!(frame.html.ends_with(" &amp; &#39;q&#39;"));
        assert!(!frame.html.contains("<b>"));
    }

    #[test]
    fn test_newlines_become_breaks() {
        let text = "line one\nteh end";
        let errors = vec![span(text, 9, 12, SpanKind::Error)];
        let frame = OverlayRenderer::default().render(&metrics(), text, &errors);
        assert!(frame.html.starts_with("line one<br/><span"));
    }

    #[test]
    fn test_no_errors_means_empty_content() {
        let frame = OverlayRenderer::default().render(&metrics(), "all good here", &[]);
        assert!(frame.html.is_empty());
    }

    #[test]
    fn test_overlapping_span_skipped() {
        let text = "just just fine";
        let errors = vec![
            span(text, 0, 9, SpanKind::Error),
            span(text, 5, 9, SpanKind::Improve),
        ];
        let frame = OverlayRenderer::default().render(&metrics(), text, &errors);
        assert_eq!(frame.html.matches("<span").count(), 1);
        assert!(frame.html.ends_with("</span> fine"));
    }

    #[test]
    fn test_stale_span_not_rendered() {
        let stale = span("teh cat", 0, 3, SpanKind::Error);
        let frame = OverlayRenderer::default().render(&metrics(), "the cat sat", &[stale]);
        assert_eq!(frame.html, "the cat sat");
    }
}
