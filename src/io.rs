// io.rs — Load and save PixelFields through the `image` crate.
//
// Only 3- and 4-channel sources are accepted. 3-channel sources get
// alpha = 1.0. The output encoding follows the file extension:
//
//   .exr          RGBA f32 (HDR values kept)
//   .hdr          RGB  f32 (HDR values kept, alpha dropped)
//   anything else RGBA 8-bit, clamped to [0, 1] first

use std::path::Path;

use image::DynamicImage;
use tracing::info;

use crate::convert::{from_rgba32f, to_rgba32f};
use crate::error::{Error, Result};
use crate::image::PixelField;

/// Decode an image file into a PixelField.
pub fn load_pixel_field(path: impl AsRef<Path>) -> Result<PixelField> {
    let path = path.as_ref();
    let decoded = image::open(path)?;
    let pixels = pixel_field_from_dynamic(&decoded)?;
    info!(
        path = %path.display(),
        width = pixels.width(),
        height = pixels.height(),
        color = ?decoded.color(),
        "image loaded"
    );
    Ok(pixels)
}

/// Convert an already-decoded image, rejecting unsupported channel counts.
pub fn pixel_field_from_dynamic(decoded: &DynamicImage) -> Result<PixelField> {
    let channels = decoded.color().channel_count();
    if channels != 3 && channels != 4 {
        return Err(Error::UnsupportedChannels(channels));
    }
    Ok(from_rgba32f(&decoded.to_rgba32f()))
}

/// Encode a PixelField to `path`, choosing depth from the extension.
pub fn save_pixel_field(path: impl AsRef<Path>, pixels: &PixelField) -> Result<()> {
    let path = path.as_ref();
    let float = DynamicImage::ImageRgba32F(to_rgba32f(pixels));

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "exr" => float.save(path)?,
        "hdr" => DynamicImage::ImageRgb32F(float.to_rgb32f()).save(path)?,
        _ => DynamicImage::ImageRgba8(float.to_rgba8()).save(path)?,
    }

    info!(path = %path.display(), "image written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::Rgba;
    use image::{GrayImage, RgbImage};

    #[test]
    fn test_rgb8_normalized_with_opaque_alpha() {
        let mut src = RgbImage::new(2, 1);
        src.put_pixel(0, 0, image::Rgb([255, 0, 51]));
        let px = pixel_field_from_dynamic(&DynamicImage::ImageRgb8(src)).unwrap();
        let p = px.get(0, 0);
        assert!((p.r - 1.0).abs() < 1e-6);
        assert!(p.g.abs() < 1e-6);
        assert!((p.b - 0.2).abs() < 1e-6);
        assert_eq!(p.a, 1.0);
        assert_eq!(px.get(1, 0), Rgba::opaque(0.0, 0.0, 0.0));
    }

    #[test]
    fn test_gray_rejected() {
        let src = DynamicImage::ImageLuma8(GrayImage::new(2, 2));
        let err = pixel_field_from_dynamic(&src).unwrap_err();
        assert!(matches!(err, Error::UnsupportedChannels(1)));
    }

    #[test]
    fn test_missing_file() {
        let err = load_pixel_field("/nonexistent/definitely/not/here.png").unwrap_err();
        assert!(matches!(err, Error::Image(_) | Error::Io(_)));
    }
}
