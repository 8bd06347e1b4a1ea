//! Company logo decoding and sizing

use crate::Result;
use crate::constants::{LOGO_MAX_HEIGHT, LOGO_MAX_WIDTH};
use crate::error::ActError;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use tracing::{debug, warn};

/// A decoded logo, flattened to 8-bit RGB, with its display size in points
#[derive(Clone, PartialEq)]
pub struct Logo {
    pub pixels: Vec<u8>,
    pub pixel_width: u32,
    pub pixel_height: u32,
    /// Display size after fitting into the logo box
    pub width: f32,
    pub height: f32,
}

impl Logo {
    /// Decode PNG or JPEG bytes and fit them into the default logo box
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(bytes)
            .map_err(|e| ActError::ImageError(format!("Failed to decode logo: {e}")))?;
        let rgb = img.to_rgb8();
        let (pixel_width, pixel_height) = rgb.dimensions();
        if pixel_width == 0 || pixel_height == 0 {
            return Err(ActError::ImageError("Logo has no pixels".to_string()));
        }

        let (width, height) = fit_box(
            pixel_width as f32,
            pixel_height as f32,
            LOGO_MAX_WIDTH,
            LOGO_MAX_HEIGHT,
        );
        debug!(
            "Decoded {}x{} logo, placed at {:.1}x{:.1} pt",
            pixel_width, pixel_height, width, height
        );

        Ok(Self {
            pixels: rgb.into_raw(),
            pixel_width,
            pixel_height,
            width,
            height,
        })
    }

    /// Decode a `data:` URL or a bare base64 string
    pub fn from_data_url(source: &str) -> Result<Self> {
        let payload = match source.split_once(',') {
            Some((prefix, data)) if prefix.starts_with("data:") => data,
            _ => source,
        };
        let bytes = STANDARD.decode(payload.trim())?;
        Self::decode(&bytes)
    }

    /// Display size scaled by `factor`
    pub fn scaled(&self, factor: f32) -> (f32, f32) {
        (self.width * factor, self.height * factor)
    }
}

impl std::fmt::Debug for Logo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logo")
            .field("pixel_width", &self.pixel_width)
            .field("pixel_height", &self.pixel_height)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

/// Load an optional logo; a broken image is logged and dropped
pub fn load_logo(source: Option<&str>) -> Option<Logo> {
    let source = source.map(str::trim).filter(|s| !s.is_empty())?;
    match Logo::from_data_url(source) {
        Ok(logo) => Some(logo),
        Err(e) => {
            warn!("Skipping company logo: {}", e);
            None
        }
    }
}

/// Largest size with the same aspect ratio that fits `max_width × max_height`
pub fn fit_box(width: f32, height: f32, max_width: f32, max_height: f32) -> (f32, f32) {
    let ratio = (max_width / width).min(max_height / height);
    (width * ratio, height * ratio)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, ImageFormat, Rgb};
    use std::io::Cursor;

    fn png_bytes(w: u32, h: u32) -> Vec<u8> {
        let img = ImageBuffer::from_pixel(w, h, Rgb([0u8, 51, 102]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_fit_box_keeps_aspect_ratio() {
        let (w, h) = fit_box(200.0, 100.0, 50.0, 30.0);
        assert!((w - 50.0).abs() < 1e-4);
        assert!((h - 25.0).abs() < 1e-4);

        let (w, h) = fit_box(100.0, 200.0, 50.0, 30.0);
        assert!((h - 30.0).abs() < 1e-4);
        assert!((w - 15.0).abs() < 1e-4);
    }

    #[test]
    fn test_decode_png() {
        let logo = Logo::decode(&png_bytes(40, 20)).unwrap();
        assert_eq!(logo.pixels.len(), 40 * 20 * 3);
        assert!((logo.width - LOGO_MAX_WIDTH).abs() < 1e-3);
        assert!(logo.height <= LOGO_MAX_HEIGHT);
    }

    #[test]
    fn test_data_url() {
        let url = format!("data:image/png;base64,{}", STANDARD.encode(png_bytes(4, 4)));
        let logo = Logo::from_data_url(&url).unwrap();
        assert_eq!((logo.pixel_width, logo.pixel_height), (4, 4));
        assert!((logo.height - LOGO_MAX_HEIGHT).abs() < 1e-3);
    }

    #[test]
    fn test_broken_logo_degrades_to_none() {
        assert!(load_logo(Some("data:image/png;base64,bm90IGFuIGltYWdl")).is_none());
        assert!(load_logo(Some("%%%")).is_none());
        assert!(load_logo(Some("  ")).is_none());
        assert!(load_logo(None).is_none());
    }
}
