//! # Monochrome Canvas
//!
//! A 1-bit image stored one byte per pixel (0 = white, 1 = black), the same
//! layout the receipt preview buffer uses before it is packed or encoded.
//!
//! Canvases are encoded to 8-bit grayscale PNG (black = 0, white = 255) for
//! the printer command.

use std::io::Write;

use image::{GrayImage, ImageEncoder, Luma};

use crate::error::ScrewieError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Canvas {
    /// Create an all-white canvas.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0u8; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    /// Paint a pixel black. Coordinates outside the canvas are ignored.
    pub fn set_black(&mut self, x: i32, y: i32) {
        if let Some(idx) = self.index(x, y) {
            self.pixels[idx] = 1;
        }
    }

    pub fn is_black(&self, x: u32, y: u32) -> bool {
        self.index(x as i32, y as i32)
            .map(|idx| self.pixels[idx] != 0)
            .unwrap_or(false)
    }

    /// Number of black pixels.
    pub fn black_pixels(&self) -> usize {
        self.pixels.iter().filter(|&&p| p != 0).count()
    }

    /// Whether row `y` contains any black pixel.
    pub fn row_has_ink(&self, y: u32) -> bool {
        if y >= self.height {
            return false;
        }
        let start = y as usize * self.width as usize;
        self.pixels[start..start + self.width as usize]
            .iter()
            .any(|&p| p != 0)
    }

    /// Convert to an 8-bit grayscale image.
    pub fn to_gray_image(&self) -> GrayImage {
        let mut img = GrayImage::new(self.width, self.height);
        for (i, &pixel) in self.pixels.iter().enumerate() {
            let x = (i % self.width as usize) as u32;
            let y = (i / self.width as usize) as u32;
            let color = if pixel != 0 { 0u8 } else { 255u8 };
            img.put_pixel(x, y, Luma([color]));
        }
        img
    }

    /// Encode the canvas as PNG bytes.
    pub fn encode_png(&self) -> Result<Vec<u8>, ScrewieError> {
        if self.width == 0 || self.height == 0 {
            return Err(ScrewieError::Image(format!(
                "Cannot encode empty {}x{} canvas",
                self.width, self.height
            )));
        }

        let img = self.to_gray_image();
        let mut png_bytes = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
        encoder
            .write_image(
                img.as_raw(),
                self.width,
                self.height,
                image::ExtendedColorType::L8,
            )
            .map_err(|e: image::ImageError| ScrewieError::Image(e.to_string()))?;

        Ok(png_bytes)
    }

    /// Encode as PNG and write it to `out`.
    pub fn write_png<W: Write>(&self, out: &mut W) -> Result<(), ScrewieError> {
        let bytes = self.encode_png()?;
        out.write_all(&bytes)?;
        out.flush()?;
        Ok(())
    }
}
