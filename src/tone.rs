// tone.rs — Luminance tone curves.
//
// Two modes, chosen once per run:
//
//   Direct          LD = exp(γ · log LW)                 (= LW^γ)
//
//   Decomposition   log  = log LW
//                   low  = log ⊛ kernel                  (large-scale)
//                   high = log - low                     (local detail)
//                   LD   = exp(γ · low + high)
//
// Decomposition compresses only the low-frequency part of the log image,
// so local contrast survives a strong global γ. Direct mode goes through
// log/exp as well so both modes share the same numeric path.
//
// The low pass sees zero padding, i.e. log-luminance 0 (LW = 1), beyond
// the border. A uniform field therefore maps uniformly only outside the
// K/2 border band, unless its luminance is 1 or K = 1.
//
// NUMERIC GUARDS:
// - safe_log: values <= 0 are replaced by f32::MIN_POSITIVE before ln(),
//   so a black pixel maps to ln(MIN_POSITIVE) ≈ -87.3 instead of -inf.
// - exp() results are saturated at f32::MAX: extreme γ never yields inf.

use std::time::Instant;

use rayon::prelude::*;
use tracing::debug;

use crate::convolution::convolve;
use crate::image::ScalarField;
use crate::kernel::Kernel;

/// Which tone curve to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToneMode {
    /// Global power law on the whole luminance.
    Direct,
    /// Power law on the low-pass log-luminance, detail added back.
    #[default]
    Decomposition,
}

/// `ln(v)`, with non-positive inputs clamped to the smallest positive f32.
#[inline]
pub fn safe_log(v: f32) -> f32 {
    if v <= 0.0 {
        f32::MIN_POSITIVE.ln()
    } else {
        v.ln()
    }
}

/// Denominator guard: `v` if positive, else the smallest positive f32.
#[inline]
pub fn safe_div(v: f32) -> f32 {
    if v <= 0.0 {
        f32::MIN_POSITIVE
    } else {
        v
    }
}

/// `exp(v)` saturated to `f32::MAX`.
#[inline]
pub(crate) fn saturating_exp(v: f32) -> f32 {
    v.exp().min(f32::MAX)
}

/// Low/high frequency split of a log-luminance field.
#[derive(Debug, Clone)]
pub struct Decomposition {
    /// `safe_log(LW)` convolved with the kernel.
    pub low_pass: ScalarField,
    /// `safe_log(LW) - low_pass`.
    pub high_pass: ScalarField,
}

/// Pointwise `safe_log` of a luminance field.
pub fn log_luminance(lw: &ScalarField) -> ScalarField {
    let (w, h) = lw.dimensions();
    let mut out = ScalarField::new(w, h);
    out.as_mut_slice()
        .par_iter_mut()
        .zip(lw.as_slice().par_iter())
        .for_each(|(dst, &v)| *dst = safe_log(v));
    out
}

/// Split `safe_log(lw)` into low-pass and high-pass components.
///
/// `low_pass + high_pass` reproduces `safe_log(lw)` up to one rounding.
pub fn decompose(lw: &ScalarField, kernel: &Kernel) -> Decomposition {
    let log = log_luminance(lw);
    let low_pass = convolve(&log, kernel);

    let mut high_pass = log;
    high_pass
        .as_mut_slice()
        .par_iter_mut()
        .zip(low_pass.as_slice().par_iter())
        .for_each(|(h, &l)| *h -= l);

    Decomposition { low_pass, high_pass }
}

/// Compute display luminance LD from world luminance LW.
///
/// `kernel` is only consulted in `ToneMode::Decomposition`.
pub fn display_luminance(lw: &ScalarField, gamma: f32, mode: ToneMode, kernel: &Kernel) -> ScalarField {
    let start = Instant::now();
    let (w, h) = lw.dimensions();

    let ld = match mode {
        ToneMode::Direct => {
            let mut ld = ScalarField::new(w, h);
            ld.as_mut_slice()
                .par_iter_mut()
                .zip(lw.as_slice().par_iter())
                .for_each(|(dst, &v)| *dst = saturating_exp(gamma * safe_log(v)));
            ld
        }
        ToneMode::Decomposition => {
            let Decomposition { low_pass, mut high_pass } = decompose(lw, kernel);
            // Reuse the high-pass buffer for the result.
            high_pass
                .as_mut_slice()
                .par_iter_mut()
                .zip(low_pass.as_slice().par_iter())
                .for_each(|(hp, &lp)| *hp = saturating_exp(gamma * lp + *hp));
            high_pass
        }
    };

    debug!(
        ?mode,
        gamma,
        width = w,
        height = h,
        elapsed_ms = start.elapsed().as_secs_f64() * 1e3,
        "display luminance computed"
    );
    ld
}
