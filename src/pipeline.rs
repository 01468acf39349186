// pipeline.rs — Tone-mapping pipeline and interactive session state.
//
// One call runs every stage to completion:
//
//   1. LW = world_luminance(pixels)
//   2. LD = display_luminance(LW, γ, mode, kernel)
//        Direct:         exp(γ · log LW)
//        Decomposition:  exp(γ · low + high), low = log LW ⊛ kernel
//   3. pixels.rgb *= LD / LW
//
// No state survives a call: everything that influences the result is in
// the arguments. The viewer keeps its state in a Session instead of
// process-wide globals: the original image for restore, the image being
// shown, and the config. Each key press becomes a Request that is answered
// synchronously with the updated image.

use std::time::Instant;

use tracing::{debug, info};

use crate::convolution::convolve_pixels;
use crate::image::PixelField;
use crate::kernel::Kernel;
use crate::luminance::world_luminance;
use crate::reconstruct::apply_tone_mapping;
use crate::tone::{display_luminance, ToneMode};

/// Everything the tone-mapping pipeline needs besides the pixels.
#[derive(Debug, Clone)]
pub struct ToneMapConfig {
    /// Power-law exponent. Not range-checked: γ <= 0 is accepted.
    pub gamma: f32,
    /// Direct gamma or log-domain decomposition.
    pub mode: ToneMode,
    /// Low-pass kernel for decomposition mode and for blur requests.
    pub kernel: Kernel,
}

impl Default for ToneMapConfig {
    fn default() -> Self {
        ToneMapConfig {
            gamma: 0.5,
            mode: ToneMode::Decomposition,
            kernel: Kernel::default(),
        }
    }
}

/// Tone-map `pixels` and return the mapped copy.
pub fn run_tone_mapping(pixels: &PixelField, config: &ToneMapConfig) -> PixelField {
    let mut out = pixels.clone();
    run_tone_mapping_in_place(&mut out, config);
    out
}

/// Tone-map a caller-owned pixel field in place.
pub fn run_tone_mapping_in_place(pixels: &mut PixelField, config: &ToneMapConfig) {
    let t0 = Instant::now();

    let lw = world_luminance(pixels);
    let t_lum = t0.elapsed();

    let ld = display_luminance(&lw, config.gamma, config.mode, &config.kernel);
    let t_curve = t0.elapsed();

    apply_tone_mapping(pixels, &lw, &ld);
    let t_total = t0.elapsed();

    debug!(
        mode = ?config.mode,
        gamma = config.gamma,
        kernel = config.kernel.size(),
        luminance_ms = t_lum.as_secs_f64() * 1e3,
        curve_ms = (t_curve - t_lum).as_secs_f64() * 1e3,
        reconstruct_ms = (t_total - t_curve).as_secs_f64() * 1e3,
        "tone mapping done"
    );
}

/// A discrete request from the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    /// Re-run tone mapping from the original image.
    ToneMap,
    /// Blur the image currently shown with the configured kernel.
    Convolve,
    /// Show the original image again.
    Restore,
}

/// Viewer state: original image, current image, and config.
///
/// Replaces the process-wide globals of a classic GLUT viewer with an
/// object owned by the caller.
pub struct Session {
    config: ToneMapConfig,
    original: PixelField,
    current: PixelField,
}

impl Session {
    /// Start a session showing the unmodified image.
    pub fn new(original: PixelField, config: ToneMapConfig) -> Self {
        let current = original.clone();
        Session {
            config,
            original,
            current,
        }
    }

    /// Answer one request and return the image to display.
    ///
    /// `Convolve` accumulates: each press blurs whatever is currently shown.
    pub fn handle(&mut self, request: Request) -> &PixelField {
        let start = Instant::now();
        match request {
            Request::ToneMap => {
                self.current = run_tone_mapping(&self.original, &self.config);
            }
            Request::Convolve => {
                self.current = convolve_pixels(&self.current, &self.config.kernel);
            }
            Request::Restore => {
                self.current = self.original.clone();
            }
        }
        info!(
            ?request,
            elapsed_ms = start.elapsed().as_secs_f64() * 1e3,
            "request handled"
        );
        &self.current
    }

    /// The image currently shown.
    pub fn current(&self) -> &PixelField {
        &self.current
    }

    /// The image as loaded.
    pub fn original(&self) -> &PixelField {
        &self.original
    }

    pub fn config(&self) -> &ToneMapConfig {
        &self.config
    }
}
