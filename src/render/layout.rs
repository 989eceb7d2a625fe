//! # Receipt Layout
//!
//! Turns wrapped lines into a canvas sized to fit them exactly:
//!
//! ```text
//! height = (line_height + spacing) × line_count + 2 × padding
//!
//! ┌──────────────────────────────┐  ─┬─ padding
//! │ 2024-05-01T14:00:00+02:00    │   │ line_height
//! │                              │   │ spacing
//! │ alice                        │
//! │ ...                          │
//! └──────────────────────────────┘  ─┴─ padding
//! ```
//!
//! Lines are left-aligned at `x = padding`.

use std::sync::Arc;

use chrono_tz::Tz;

use super::canvas::Canvas;
use super::font::Typeface;
use super::wrap::{WrappedDocument, wrap_text};

/// Receipt width of the reference deployment (58mm paper).
pub const DEFAULT_WIDTH: u32 = 384;
pub const DEFAULT_PADDING: u32 = 8;
pub const DEFAULT_SPACING: u32 = 8;

/// Rendering and output settings, fixed at startup.
#[derive(Debug, Clone)]
pub struct RenderSpec {
    /// Canvas width in pixels
    pub width: u32,
    /// Blank border on every side in pixels
    pub padding: u32,
    /// Extra space below every line in pixels
    pub spacing: u32,
    pub font: Arc<dyn Typeface>,
    /// Zone the header timestamp is shown in
    pub timezone: Tz,
    /// Leave rendered images on disk after dispatch
    pub keep_temp_files: bool,
}

impl RenderSpec {
    /// Reference geometry with the given font, UTC timestamps and temp files deleted.
    pub fn new(font: Arc<dyn Typeface>) -> Self {
        Self {
            width: DEFAULT_WIDTH,
            padding: DEFAULT_PADDING,
            spacing: DEFAULT_SPACING,
            font,
            timezone: Tz::UTC,
            keep_temp_files: false,
        }
    }

    /// Pixel width available to a line of text.
    pub fn text_budget(&self) -> f32 {
        self.width.saturating_sub(self.padding.saturating_mul(2)) as f32
    }

    /// Vertical distance between the tops of consecutive lines.
    pub fn line_pitch(&self) -> u32 {
        self.font.line_height().saturating_add(self.spacing)
    }

    /// Canvas height needed for `line_count` lines.
    pub fn canvas_height(&self, line_count: usize) -> u32 {
        let lines = u32::try_from(line_count).unwrap_or(u32::MAX);
        self.line_pitch()
            .saturating_mul(lines)
            .saturating_add(self.padding.saturating_mul(2))
    }

    /// Wrap `text` to the text budget using this spec's font.
    pub fn wrap(&self, text: &str) -> WrappedDocument {
        let font = &self.font;
        wrap_text(text, self.text_budget(), |candidate| font.text_width(candidate))
    }
}

/// Draws wrapped documents onto canvases.
#[derive(Debug, Clone)]
pub struct ImageRenderer {
    spec: RenderSpec,
}

impl ImageRenderer {
    pub fn new(spec: RenderSpec) -> Self {
        Self { spec }
    }

    pub fn spec(&self) -> &RenderSpec {
        &self.spec
    }

    /// Render already wrapped lines.
    pub fn render(&self, document: &WrappedDocument) -> Canvas {
        let spec = &self.spec;
        let height = spec.canvas_height(document.len());
        let mut canvas = Canvas::new(spec.width, height);

        let x = spec.padding as i32;
        let mut y = spec.padding as i32;
        for line in document.iter() {
            if !line.is_empty() {
                spec.font.draw_text(&mut canvas, x, y, line);
            }
            y += spec.line_pitch() as i32;
        }

        tracing::debug!(
            width = spec.width,
            height,
            lines = document.len(),
            "Rendered canvas"
        );
        canvas
    }

    /// Wrap and render `text`.
    pub fn render_text(&self, text: &str) -> Canvas {
        let document = self.spec.wrap(text);
        self.render(&document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::font::BlockTypeface;
    use pretty_assertions::assert_eq;

    fn spec() -> RenderSpec {
        RenderSpec::new(Arc::new(BlockTypeface::new(10, 20)))
    }

    #[test]
    fn test_text_budget() {
        assert_eq!(spec().text_budget(), 368.0);

        let mut narrow = spec();
        narrow.width = 10;
        assert_eq!(narrow.text_budget(), 0.0);
    }

    #[test]
    fn test_oversized_geometry_saturates() {
        let mut spec = spec();
        spec.padding = u32::MAX;
        spec.spacing = u32::MAX;
        assert_eq!(spec.text_budget(), 0.0);
        assert_eq!(spec.line_pitch(), u32::MAX);
        assert_eq!(spec.canvas_height(3), u32::MAX);
    }

    #[test]
    fn test_canvas_height_law() {
        let spec = spec();
        for count in 1..20 {
            assert_eq!(spec.canvas_height(count), (20 + 8) * count as u32 + 2 * 8);
        }
    }

    #[test]
    fn test_render_dimensions_follow_line_count() {
        let renderer = ImageRenderer::new(spec());
        let doc = WrappedDocument {
            lines: vec!["one".into(), "".into(), "three".into()],
        };
        let canvas = renderer.render(&doc);
        assert_eq!(canvas.width(), 384);
        assert_eq!(canvas.height(), 28 * 3 + 16);
    }

    #[test]
    fn test_lines_are_placed_at_padding_and_pitch() {
        let renderer = ImageRenderer::new(spec());
        let doc = WrappedDocument {
            lines: vec!["a".into(), "".into(), "b".into()],
        };
        let canvas = renderer.render(&doc);

        // Top and left padding stay white
        for y in 0..8 {
            assert!(!canvas.row_has_ink(y), "row {y}");
        }
        assert!(!canvas.is_black(7, 8));
        assert!(canvas.is_black(8, 8));

        // First line occupies rows 8..28, spacing 28..36 is blank
        assert!(canvas.row_has_ink(27));
        assert!(!canvas.row_has_ink(28));
        assert!(!canvas.row_has_ink(35));

        // Second line is empty
        for y in 36..64 {
            assert!(!canvas.row_has_ink(y), "row {y}");
        }

        // Third line starts at 8 + 2 × 28
        assert!(canvas.row_has_ink(64));
        assert!(canvas.row_has_ink(83));
        assert!(!canvas.row_has_ink(84));
        assert_eq!(canvas.height(), 100);
    }

    #[test]
    fn test_render_text_wraps_first() {
        let renderer = ImageRenderer::new(spec());
        let canvas = renderer.render_text(&"word ".repeat(40));
        let lines = renderer.spec().wrap(&"word ".repeat(40)).len();
        assert_eq!(lines, 6);
        assert_eq!(canvas.height(), renderer.spec().canvas_height(lines));
    }

    #[test]
    fn test_overflowing_line_is_clipped() {
        let renderer = ImageRenderer::new(spec());
        let doc = WrappedDocument {
            lines: vec!["x".repeat(50)],
        };
        let canvas = renderer.render(&doc);
        assert_eq!(canvas.width(), 384);
        assert!(canvas.is_black(383, 10));
    }
}
