//! # Rendering Module
//!
//! This module turns receipt text into a monochrome bitmap.
//!
//! ## Modules
//!
//! - [`font`]: Glyph metrics and drawing (`Typeface`), TrueType via `ab_glyph`
//! - [`wrap`]: Greedy word wrap against a pixel budget
//! - [`layout`]: Canvas sizing and line placement
//! - [`canvas`]: 1-bit pixel buffer and PNG encoding
//!
//! ## Usage Example
//!
//! ```
//! use std::sync::Arc;
//! use screwie::render::{ImageRenderer, RenderSpec, font::BlockTypeface};
//!
//! let spec = RenderSpec::new(Arc::new(BlockTypeface::new(10, 20)));
//! let renderer = ImageRenderer::new(spec);
//!
//! let canvas = renderer.render_text("Hello world");
//! assert_eq!(canvas.width(), 384);
//! assert_eq!(canvas.height(), (20 + 8) + 2 * 8);
//! ```

pub mod canvas;
pub mod font;
pub mod layout;
pub mod wrap;

pub use canvas::Canvas;
pub use font::{Typeface, TtfTypeface};
pub use layout::{ImageRenderer, RenderSpec};
pub use wrap::{WrappedDocument, wrap_text};
