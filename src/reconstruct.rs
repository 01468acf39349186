// reconstruct.rs — Put remapped luminance back into colour.
//
//   c' = c · LD / safe_div(LW)        for c in {r, g, b}; alpha untouched
//
// Every colour channel of a pixel is scaled by the same factor, so channel
// ratios (hue and saturation) are preserved and only brightness moves.

use rayon::prelude::*;

use crate::image::{PixelField, ScalarField};
use crate::tone::safe_div;

/// Per-pixel scale factor `LD / LW`, guarded and saturated to `f32::MAX`.
///
/// Saturation keeps the factor finite, so a black pixel (all channels 0)
/// stays exactly black instead of becoming `0 · inf = NaN`.
#[inline]
pub fn luminance_ratio(lw: f32, ld: f32) -> f32 {
    (ld / safe_div(lw)).min(f32::MAX)
}

/// Rescale the colour channels of `pixels` in place by `LD / LW`.
///
/// # Panics
/// Panics if the three fields do not share the same dimensions.
pub fn apply_tone_mapping(pixels: &mut PixelField, lw: &ScalarField, ld: &ScalarField) {
    assert_eq!(
        pixels.dimensions(),
        lw.dimensions(),
        "world luminance must match the pixel field dimensions"
    );
    assert_eq!(
        pixels.dimensions(),
        ld.dimensions(),
        "display luminance must match the pixel field dimensions"
    );

    pixels
        .as_mut_slice()
        .par_iter_mut()
        .zip(lw.as_slice().par_iter().zip(ld.as_slice().par_iter()))
        .for_each(|(p, (&w, &d))| {
            let k = luminance_ratio(w, d);
            let mapped = p.scale_rgb(k);
            *p = mapped.clamp_finite();
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::Rgba;

    #[test]
    fn test_ratio_scales_channels() {
        let mut px = PixelField::filled(1, 1, Rgba::new(0.2, 0.4, 0.6, 0.7));
        let lw = ScalarField::filled(1, 1, 0.5);
        let ld = ScalarField::filled(1, 1, 1.0);
        apply_tone_mapping(&mut px, &lw, &ld);
        let p = px.get(0, 0);
        assert!((p.r - 0.4).abs() < 1e-6);
        assert!((p.g - 0.8).abs() < 1e-6);
        assert!((p.b - 1.2).abs() < 1e-6);
        assert_eq!(p.a, 0.7);
    }

    #[test]
    fn test_hue_preserved() {
        let src = Rgba::opaque(0.3, 0.9, 0.1);
        let mut px = PixelField::filled(1, 1, src);
        let lw = ScalarField::filled(1, 1, 0.7);
        let ld = ScalarField::filled(1, 1, 0.2);
        apply_tone_mapping(&mut px, &lw, &ld);
        let p = px.get(0, 0);
        assert!((p.r / p.g - src.r / src.g).abs() < 1e-5);
        assert!((p.b / p.g - src.b / src.g).abs() < 1e-5);
    }

    #[test]
    fn test_black_stays_black() {
        let mut px = PixelField::filled(2, 1, Rgba::gray(0.0));
        let lw = ScalarField::filled(2, 1, 0.0);
        let ld = ScalarField::filled(2, 1, f32::MAX);
        apply_tone_mapping(&mut px, &lw, &ld);
        for (_, _, p) in px.pixels() {
            assert_eq!((p.r, p.g, p.b), (0.0, 0.0, 0.0));
        }
    }

    #[test]
    fn test_ratio_finite_at_zero() {
        assert!(luminance_ratio(0.0, 1.0).is_finite());
        assert!(luminance_ratio(-1.0, 1e30).is_finite());
        assert_eq!(luminance_ratio(2.0, 1.0), 0.5);
    }

    #[test]
    #[should_panic(expected = "must match")]
    fn test_dimension_mismatch_panics() {
        let mut px = PixelField::new(2, 2);
        let lw = ScalarField::new(2, 1);
        let ld = ScalarField::new(2, 2);
        apply_tone_mapping(&mut px, &lw, &ld);
    }
}
