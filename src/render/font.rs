//! # Typefaces
//!
//! Glyph metrics and glyph drawing behind one trait, so layout code can be
//! exercised with a synthetic font and production code can use a TrueType
//! file loaded through `ab_glyph`.
//!
//! ## Drawing Model
//!
//! `draw_text(canvas, x, y, text)` places the top of the font's ascent at `y`;
//! the baseline sits at `y + ascent`. Anti-aliased coverage is thresholded at
//! 50% because the output is strictly 1-bit.

use std::fmt;
use std::path::Path;

use ab_glyph::{Font, FontArc, GlyphId, PxScale, ScaleFont, point};

use super::canvas::Canvas;
use crate::error::ScrewieError;

/// Coverage at or above this value becomes a black pixel.
const COVERAGE_THRESHOLD: f32 = 0.5;

/// Glyph used to derive the line height.
const REFERENCE_GLYPH: char = 'A';

/// Font metrics and rasterization used by the layout engine.
pub trait Typeface: Send + Sync + fmt::Debug {
    /// Rendered pixel length of `text` on a single line.
    fn text_width(&self, text: &str) -> f32;

    /// Height of one line of text in pixels, excluding inter-line spacing.
    fn line_height(&self) -> u32;

    /// Draw `text` in black with its top-left corner at (`x`, `y`).
    fn draw_text(&self, canvas: &mut Canvas, x: i32, y: i32, text: &str);
}

/// A TrueType/OpenType font at a fixed pixel size.
#[derive(Clone)]
pub struct TtfTypeface {
    font: FontArc,
    scale: PxScale,
    line_height: u32,
}

impl fmt::Debug for TtfTypeface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtfTypeface")
            .field("size", &self.scale.y)
            .field("line_height", &self.line_height)
            .finish()
    }
}

impl TtfTypeface {
    /// Load a font file from disk.
    ///
    /// ## Errors
    ///
    /// Returns [`ScrewieError::Font`] if the file cannot be read or is not a
    /// font `ab_glyph` understands. Without a font nothing can ever be printed,
    /// so callers treat this as fatal at startup.
    pub fn load<P: AsRef<Path>>(path: P, size: f32) -> Result<Self, ScrewieError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| {
            ScrewieError::Font(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_bytes(bytes, size).map_err(|e| match e {
            ScrewieError::Font(reason) => {
                ScrewieError::Font(format!("{}: {}", path.display(), reason))
            }
            other => other,
        })
    }

    /// Parse a font from raw file contents.
    pub fn from_bytes(bytes: Vec<u8>, size: f32) -> Result<Self, ScrewieError> {
        if !(size.is_finite() && size > 0.0) {
            return Err(ScrewieError::Font(format!("Invalid font size {}", size)));
        }
        let font = FontArc::try_from_vec(bytes)
            .map_err(|e| ScrewieError::Font(format!("Invalid font data: {}", e)))?;
        let scale = PxScale::from(size);
        let line_height = reference_height(&font, scale);

        Ok(Self {
            font,
            scale,
            line_height,
        })
    }

    /// Pixel size the font is rendered at.
    pub fn size(&self) -> f32 {
        self.scale.y
    }
}

/// Ink height of the reference glyph, or ascent minus descent if it has no outline.
fn reference_height(font: &FontArc, scale: PxScale) -> u32 {
    let scaled = font.as_scaled(scale);
    let glyph = font
        .glyph_id(REFERENCE_GLYPH)
        .with_scale_and_position(scale, point(0.0, scaled.ascent()));

    let height = match font.outline_glyph(glyph) {
        Some(outlined) => outlined.px_bounds().height(),
        None => scaled.ascent() - scaled.descent(),
    };

    (height.ceil() as u32).max(1)
}

impl Typeface for TtfTypeface {
    fn text_width(&self, text: &str) -> f32 {
        let scaled = self.font.as_scaled(self.scale);
        let mut caret = 0.0f32;
        let mut previous: Option<GlyphId> = None;

        for ch in text.chars() {
            let id = self.font.glyph_id(ch);
            if let Some(prev) = previous {
                caret += scaled.kern(prev, id);
            }
            caret += scaled.h_advance(id);
            previous = Some(id);
        }

        caret
    }

    fn line_height(&self) -> u32 {
        self.line_height
    }

    fn draw_text(&self, canvas: &mut Canvas, x: i32, y: i32, text: &str) {
        let scaled = self.font.as_scaled(self.scale);
        let baseline = y as f32 + scaled.ascent();
        let mut caret = x as f32;
        let mut previous: Option<GlyphId> = None;

        for ch in text.chars() {
            let id = self.font.glyph_id(ch);
            if let Some(prev) = previous {
                caret += scaled.kern(prev, id);
            }

            let glyph = id.with_scale_and_position(self.scale, point(caret, baseline));
            if let Some(outlined) = self.font.outline_glyph(glyph) {
                let bounds = outlined.px_bounds();
                outlined.draw(|px, py, coverage| {
                    if coverage >= COVERAGE_THRESHOLD {
                        let gx = bounds.min.x as i32 + px as i32;
                        let gy = bounds.min.y as i32 + py as i32;
                        canvas.set_black(gx, gy);
                    }
                });
            }

            caret += scaled.h_advance(id);
            previous = Some(id);
        }
    }
}

/// Fixed-advance block font.
///
/// Every character is `advance` pixels wide; non-whitespace characters draw a
/// solid `advance - 1` by `height` box. Makes layout arithmetic exact without
/// a font file on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockTypeface {
    pub advance: u32,
    pub height: u32,
}

impl BlockTypeface {
    pub fn new(advance: u32, height: u32) -> Self {
        Self { advance, height }
    }
}

impl Typeface for BlockTypeface {
    fn text_width(&self, text: &str) -> f32 {
        (text.chars().count() as u32 * self.advance) as f32
    }

    fn line_height(&self) -> u32 {
        self.height
    }

    fn draw_text(&self, canvas: &mut Canvas, x: i32, y: i32, text: &str) {
        let box_width = self.advance.saturating_sub(1) as i32;
        for (i, ch) in text.chars().enumerate() {
            if ch.is_whitespace() {
                continue;
            }
            let left = x + (i as u32 * self.advance) as i32;
            for dy in 0..self.height as i32 {
                for dx in 0..box_width {
                    canvas.set_black(left + dx, y + dy);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_width_counts_chars() {
        let face = BlockTypeface::new(10, 20);
        assert_eq!(face.text_width("Hello world"), 110.0);
        assert_eq!(face.text_width(""), 0.0);
        // Width is per character, not per byte
        assert_eq!(face.text_width("héllo"), 50.0);
    }

    #[test]
    fn test_block_draw_skips_spaces() {
        let face = BlockTypeface::new(4, 3);
        let mut canvas = Canvas::new(20, 5);
        face.draw_text(&mut canvas, 0, 1, "a b");

        // "a" box: x 0..3, y 1..4
        assert!(canvas.is_black(0, 1));
        assert!(canvas.is_black(2, 3));
        assert!(!canvas.is_black(3, 1));
        // space leaves x 4..8 white
        assert!(!canvas.is_black(5, 2));
        // "b" box starts at x 8
        assert!(canvas.is_black(8, 2));
        assert_eq!(canvas.black_pixels(), 2 * 3 * 3);
    }

    #[test]
    fn test_block_draw_clips_at_edges() {
        let face = BlockTypeface::new(10, 10);
        let mut canvas = Canvas::new(15, 5);
        face.draw_text(&mut canvas, -5, -5, "xx");
        // Visible region only; nothing panics
        assert!(canvas.is_black(0, 0));
        assert!(canvas.black_pixels() > 0);
    }

    #[test]
    fn test_load_missing_font_fails() {
        let err = TtfTypeface::load("/nonexistent/screwie-font.ttf", 24.0).unwrap_err();
        assert!(matches!(err, ScrewieError::Font(_)));
        assert!(err.to_string().contains("screwie-font.ttf"));
    }

    #[test]
    fn test_garbage_font_data_fails() {
        let err = TtfTypeface::from_bytes(b"not a font".to_vec(), 24.0).unwrap_err();
        assert!(matches!(err, ScrewieError::Font(_)));
    }

    /// The default system font, or `None` (test skipped) where it is not installed.
    fn system_font() -> Option<TtfTypeface> {
        let path = crate::config::DEFAULT_FONT_PATH;
        if !Path::new(path).is_file() {
            eprintln!("skipping: {} not installed", path);
            return None;
        }
        Some(TtfTypeface::load(path, 24.0).unwrap())
    }

    fn ink_rows(canvas: &Canvas) -> Vec<u32> {
        (0..canvas.height())
            .filter(|&y| canvas.row_has_ink(y))
            .collect()
    }

    #[test]
    fn test_ttf_line_height_from_reference_glyph() {
        let Some(face) = system_font() else { return };
        let scaled = face.font.as_scaled(face.scale);
        let full = (scaled.ascent() - scaled.descent()).ceil() as u32;

        assert!(face.line_height() > 0);
        assert!(
            face.line_height() <= full,
            "line height {} exceeds ascent - descent {}",
            face.line_height(),
            full
        );
        assert_eq!(face.size(), 24.0);
    }

    #[test]
    fn test_ttf_width_grows_with_text() {
        let Some(face) = system_font() else { return };

        assert_eq!(face.text_width(""), 0.0);
        let a = face.text_width("a");
        let ab = face.text_width("ab");
        assert!(a > 0.0);
        assert!(ab >= a, "'ab' is {ab}px, 'a' is {a}px");
        assert!(face.text_width("word word") > face.text_width("word"));
        // Kerning only ever pulls a pair together
        assert!(face.text_width("AV") <= face.text_width("A") + face.text_width("V") + 0.01);
    }

    #[test]
    fn test_ttf_draws_below_top_edge() {
        let Some(face) = system_font() else { return };
        let scaled = face.font.as_scaled(face.scale);
        let mut canvas = Canvas::new(200, 80);
        let top = 10;
        face.draw_text(&mut canvas, 4, top, "Ag");

        let rows = ink_rows(&canvas);
        let first = *rows.first().unwrap();
        let last = *rows.last().unwrap();
        assert!(first >= top as u32, "ink starts at row {first}, above {top}");
        assert!(last as f32 <= top as f32 + scaled.ascent() - scaled.descent());
        assert!(canvas.black_pixels() > 0);
    }

    #[test]
    fn test_ttf_reference_glyph_fills_line_height() {
        let Some(face) = system_font() else { return };
        let mut canvas = Canvas::new(100, 80);
        face.draw_text(&mut canvas, 0, 0, "A");

        let rows = ink_rows(&canvas);
        let span = rows.last().unwrap() - rows.first().unwrap() + 1;
        // Thresholding can drop the faint edge row on either side
        assert!(span + 2 >= face.line_height() && span <= face.line_height() + 1, "{span}");
    }

    #[test]
    fn test_invalid_size_fails() {
        assert!(TtfTypeface::from_bytes(Vec::new(), 0.0).is_err());
        assert!(TtfTypeface::from_bytes(Vec::new(), f32::NAN).is_err());
    }
}
