// tests/test_tone.rs — Luminance extraction, tone curves, colour reconstruction.

use hdr_tonemap::luminance::{luminance, world_luminance};
use hdr_tonemap::reconstruct::apply_tone_mapping;
use hdr_tonemap::tone::{decompose, display_luminance, safe_div, safe_log};
use hdr_tonemap::{Kernel, PixelField, Rgba, ScalarField, ToneMode};

fn hdr_ramp(w: usize, h: usize) -> ScalarField {
    // Spans several orders of magnitude, like a real HDR luminance map.
    ScalarField::from_fn(w, h, |x, y| 10f32.powf((x as f32 - 3.0) * 0.5 + y as f32 * 0.1))
}

// ===== Luminance =====

#[test]
fn luminance_weights_are_20_40_1() {
    let p = Rgba::opaque(0.61, 0.61, 0.61);
    assert!((luminance(p) - 0.61).abs() < 1e-6);

    let p = Rgba::opaque(3.0, 0.0, 0.0);
    assert!((luminance(p) - 60.0 / 61.0).abs() < 1e-6);
}

#[test]
fn world_luminance_matches_per_pixel() {
    let img = PixelField::from_fn(4, 3, |x, y| Rgba::opaque(x as f32, y as f32, 0.5));
    let lw = world_luminance(&img);
    for (x, y, p) in img.pixels() {
        assert_eq!(lw.get(x, y), luminance(p));
    }
}

// ===== Numeric guards =====

#[test]
fn guards_never_produce_nan_or_inf() {
    for v in [0.0f32, f32::MIN_POSITIVE, 1e-20, 0.5, 1.0, 7.0, 1e20, f32::MAX] {
        assert!(safe_log(v).is_finite(), "safe_log({v})");
        assert!(safe_div(v).is_finite() && safe_div(v) > 0.0, "safe_div({v})");
    }
}

// ===== Direct mode =====

#[test]
fn direct_gamma_one_is_identity() {
    let lw = hdr_ramp(8, 3);
    let ld = display_luminance(&lw, 1.0, ToneMode::Direct, &Kernel::default());
    for (a, b) in lw.as_slice().iter().zip(ld.as_slice()) {
        assert!((a - b).abs() <= 1e-5 * a, "{a} vs {b}");
    }
}

#[test]
fn direct_compresses_range() {
    let lw = hdr_ramp(8, 1);
    let ld = display_luminance(&lw, 0.5, ToneMode::Direct, &Kernel::default());
    let ratio_in = lw.get(7, 0) / lw.get(0, 0);
    let ratio_out = ld.get(7, 0) / ld.get(0, 0);
    assert!((ratio_out - ratio_in.sqrt()).abs() < 1e-2 * ratio_out);
}

// ===== Decomposition mode =====

#[test]
fn decomposition_is_exact() {
    let lw = hdr_ramp(12, 10);
    let d = decompose(&lw, &Kernel::box_filter(5).unwrap());
    for y in 0..10 {
        for x in 0..12 {
            let sum = d.low_pass.get(x, y) + d.high_pass.get(x, y);
            assert!((sum - safe_log(lw.get(x, y))).abs() < 1e-5, "({x},{y})");
        }
    }
}

#[test]
fn decomposition_gamma_one_is_identity() {
    let lw = hdr_ramp(12, 10);
    let ld = display_luminance(&lw, 1.0, ToneMode::Decomposition, &Kernel::box_filter(5).unwrap());
    for (a, b) in lw.as_slice().iter().zip(ld.as_slice()) {
        assert!((a - b).abs() <= 1e-4 * a, "{a} vs {b}");
    }
}

#[test]
fn decomposition_keeps_local_contrast() {
    // Flat background with one bright dot. Direct γ = 0.25 shrinks the
    // dot/background ratio to its fourth root; decomposition keeps most of
    // the ratio because the dot lives in the high-pass band.
    let mut lw = ScalarField::filled(21, 21, 1.0);
    lw.set(10, 10, 16.0);
    let k = Kernel::box_filter(7).unwrap();

    let direct = display_luminance(&lw, 0.25, ToneMode::Direct, &k);
    let local = display_luminance(&lw, 0.25, ToneMode::Decomposition, &k);

    let c_direct = direct.get(10, 10) / direct.get(10, 3);
    let c_local = local.get(10, 10) / local.get(10, 3);
    assert!((c_direct - 2.0).abs() < 1e-4);
    assert!(c_local > 10.0, "local contrast {c_local} should stay near 16");
}

// ===== Colour reconstruction =====

#[test]
fn reconstruction_preserves_channel_ratios() {
    let img = PixelField::from_fn(6, 6, |x, y| {
        Rgba::opaque(0.1 + x as f32, 0.2 + y as f32 * 2.0, 0.05 + (x * y) as f32)
    });
    let lw = world_luminance(&img);
    let ld = display_luminance(&lw, 0.4, ToneMode::Decomposition, &Kernel::box_filter(3).unwrap());

    let mut out = img.clone();
    apply_tone_mapping(&mut out, &lw, &ld);

    for (x, y, p) in out.pixels() {
        let q = img.get(x, y);
        assert!(((p.r / p.g) - (q.r / q.g)).abs() < 1e-4 * (q.r / q.g), "r/g at ({x},{y})");
        assert!(((p.b / p.g) - (q.b / q.g)).abs() < 1e-4 * (q.b / q.g).max(1e-3), "b/g at ({x},{y})");
        assert_eq!(p.a, q.a);
    }
}

#[test]
fn reconstruction_output_luminance_equals_ld() {
    let img = PixelField::from_fn(5, 4, |x, y| Rgba::opaque(0.3 + x as f32, 0.7, 0.2 + y as f32));
    let lw = world_luminance(&img);
    let ld = display_luminance(&lw, 0.6, ToneMode::Direct, &Kernel::identity());

    let mut out = img.clone();
    apply_tone_mapping(&mut out, &lw, &ld);
    let lw_out = world_luminance(&out);
    for (a, b) in lw_out.as_slice().iter().zip(ld.as_slice()) {
        assert!((a - b).abs() < 1e-5 * b.max(1.0));
    }
}
