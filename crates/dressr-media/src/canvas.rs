//! Decoded image snapshots.

use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder, RgbaImage};

use crate::error::DownloadResult;

/// A fully decoded image as currently presented.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedImage {
    /// URL the pixels were loaded from
    pub src: String,
    /// Pixels at natural size
    pub pixels: RgbaImage,
}

impl LoadedImage {
    pub fn new(src: impl Into<String>, pixels: RgbaImage) -> Self {
        Self {
            src: src.into(),
            pixels,
        }
    }

    /// Decode an encoded image (PNG, JPEG, ...).
    pub fn decode(src: impl Into<String>, bytes: &[u8]) -> DownloadResult<Self> {
        let pixels = image::load_from_memory(bytes)?.to_rgba8();
        Ok(Self::new(src, pixels))
    }

    pub fn natural_width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn natural_height(&self) -> u32 {
        self.pixels.height()
    }

    /// A zero-sized image never finished decoding.
    pub fn is_complete(&self) -> bool {
        self.natural_width() > 0 && self.natural_height() > 0
    }

    /// Re-encode at natural size as PNG.
    pub fn to_png(&self) -> DownloadResult<Vec<u8>> {
        let mut bytes = Vec::new();
        PngEncoder::new(&mut bytes).write_image(
            self.pixels.as_raw(),
            self.natural_width(),
            self.natural_height(),
            ColorType::Rgba8,
        )?;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_png_reencode_keeps_dimensions() {
        let pixels = RgbaImage::from_pixel(3, 2, Rgba([10, 20, 30, 255]));
        let loaded = LoadedImage::new("https://cdn/out.jpg", pixels);
        assert!(loaded.is_complete());

        let png = loaded.to_png().unwrap();
        let decoded = LoadedImage::decode("copy", &png).unwrap();
        assert_eq!(decoded.natural_width(), 3);
        assert_eq!(decoded.natural_height(), 2);
        assert_eq!(decoded.pixels.get_pixel(2, 1), &Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn test_empty_image_is_incomplete() {
        let loaded = LoadedImage::new("x", RgbaImage::new(0, 0));
        assert!(!loaded.is_complete());
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(LoadedImage::decode("x", b"not an image").is_err());
    }
}
