// luminance.rs — World luminance from linear RGB.
//
//   LW = (20·r + 40·g + 1·b) / 61
//
// This is a fixed weighting, not Rec.709 / CIE luma. Output values must
// match it exactly, so don't swap in a "better" formula. No clipping: HDR
// values above 1.0 and negative values pass straight through.

use rayon::prelude::*;

use crate::image::{PixelField, Rgba, ScalarField};

pub const RED_WEIGHT: f32 = 20.0;
pub const GREEN_WEIGHT: f32 = 40.0;
pub const BLUE_WEIGHT: f32 = 1.0;
pub const WEIGHT_SUM: f32 = RED_WEIGHT + GREEN_WEIGHT + BLUE_WEIGHT;

/// Luminance of one pixel. Alpha is ignored.
#[inline]
pub fn luminance(p: Rgba) -> f32 {
    (RED_WEIGHT * p.r + GREEN_WEIGHT * p.g + BLUE_WEIGHT * p.b) / WEIGHT_SUM
}

/// World-luminance field for a colour image.
pub fn world_luminance(pixels: &PixelField) -> ScalarField {
    let (w, h) = pixels.dimensions();
    let mut lw = ScalarField::new(w, h);
    lw.as_mut_slice()
        .par_iter_mut()
        .zip(pixels.as_slice().par_iter())
        .for_each(|(dst, &p)| *dst = luminance(p));
    lw
}
