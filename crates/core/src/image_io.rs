//! Image decode helpers
//!
//! All pipeline stages operate on `RgbImage`; the alpha channel of RGBA
//! sources is dropped here, at decode time, so later stages never see it.

use image::RgbImage;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while decoding input images
#[derive(Error, Debug)]
pub enum ImageIoError {
    #[error("Failed to read image file: {0}")]
    Read(String),

    #[error("Failed to decode image: {0}")]
    Decode(String),
}

/// Load an image from a file path, converting to RGB
///
/// # Errors
/// Returns an error if the file cannot be read or decoded.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<RgbImage, ImageIoError> {
    let path = path.as_ref();
    let img = image::open(path)
        .map_err(|e| ImageIoError::Read(format!("{}: {e}", path.display())))?;
    Ok(img.to_rgb8())
}

/// Decode an in-memory encoded image (JPEG, PNG, ...), converting to RGB
///
/// # Errors
/// Returns an error if the bytes are not a decodable image.
pub fn decode_image(bytes: &[u8]) -> Result<RgbImage, ImageIoError> {
    let img = image::load_from_memory(bytes).map_err(|e| ImageIoError::Decode(e.to_string()))?;
    Ok(img.to_rgb8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use std::io::Cursor;

    #[test]
    fn test_decode_drops_alpha() {
        // Encode a small RGBA PNG, decode it back, expect 3-channel RGB
        let rgba = RgbaImage::from_pixel(4, 4, Rgba([10, 20, 30, 128]));
        let mut bytes = Vec::new();
        rgba.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();

        let rgb = decode_image(&bytes).unwrap();
        assert_eq!(rgb.dimensions(), (4, 4));
        assert_eq!(rgb.get_pixel(0, 0).0, [10, 20, 30]);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let result = decode_image(b"definitely not an image");
        assert!(matches!(result, Err(ImageIoError::Decode(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_image("does/not/exist.png");
        assert!(result.is_err());
    }
}
