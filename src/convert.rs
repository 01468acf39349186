// convert.rs — Conversions between PixelField and outside representations.
//
//   image::Rgba32FImage  → PixelField       (decode side, any source depth)
//   PixelField           → image::Rgba32FImage
//   PixelField           → Vec<u32> 0x00RRGGBB (minifb framebuffer)
//   f32 [0, 1]           → u8 [0, 255]
//
// The `image` crate already normalizes 8/16-bit sources to [0, 1] when
// converting to Rgba32F and leaves HDR/EXR floats as they are, so loading
// only needs to copy channels across.

use image::Rgba32FImage;
use rayon::prelude::*;

use crate::image::{PixelField, Rgba};

/// Copy an `image` crate RGBA f32 buffer into a PixelField.
pub fn from_rgba32f(src: &Rgba32FImage) -> PixelField {
    let (w, h) = src.dimensions();
    let data = src
        .pixels()
        .map(|p| Rgba::new(p[0], p[1], p[2], p[3]))
        .collect();
    PixelField::from_vec(w as usize, h as usize, data)
}

/// Copy a PixelField into an `image` crate RGBA f32 buffer.
pub fn to_rgba32f(src: &PixelField) -> Rgba32FImage {
    let raw: Vec<f32> = src
        .as_slice()
        .iter()
        .flat_map(|p| [p.r, p.g, p.b, p.a])
        .collect();
    // Length is exactly width * height * 4, so construction cannot fail.
    Rgba32FImage::from_raw(src.width() as u32, src.height() as u32, raw)
        .unwrap_or_else(|| Rgba32FImage::new(src.width() as u32, src.height() as u32))
}

/// Normalized float to 8-bit: clamp to [0, 1], scale, round.
#[inline]
pub fn f32_normalized_to_u8(v: f32) -> u8 {
    (v * 255.0).clamp(0.0, 255.0).round() as u8
}

/// Pack one pixel as 0x00RRGGBB. Alpha is dropped: the window has no
/// background to blend against, so pixels are shown as if opaque.
#[inline]
pub fn pack_rgb(p: Rgba) -> u32 {
    let r = f32_normalized_to_u8(p.r) as u32;
    let g = f32_normalized_to_u8(p.g) as u32;
    let b = f32_normalized_to_u8(p.b) as u32;
    (r << 16) | (g << 8) | b
}

/// Render a PixelField into a minifb framebuffer of the same size.
///
/// # Panics
/// Panics if `fb.len() != width * height`.
pub fn render_framebuffer(src: &PixelField, fb: &mut [u32]) {
    assert_eq!(
        fb.len(),
        src.width() * src.height(),
        "framebuffer length ({}) must equal width * height ({})",
        fb.len(),
        src.width() * src.height(),
    );
    fb.par_iter_mut()
        .zip(src.as_slice().par_iter())
        .for_each(|(dst, &p)| *dst = pack_rgb(p));
}
