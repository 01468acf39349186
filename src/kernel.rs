// kernel.rs — Square convolution kernels.
//
// A Kernel is built in two steps and is immutable afterwards:
//
//   1. normalize: scale = 1 / max(sum of positive weights,
//                                 sum of |negative weights|)
//      (scale = 1 when both sums are zero). A box filter becomes a mean,
//      a sharpening kernel keeps unit gain on its dominant lobe.
//   2. flip: rotate 180°, so applying the kernel with a plain
//      multiply-accumulate is convolution rather than correlation.
//
// Kernels come either from a size (box filter of ones) or from a text file:
//
//   3
//   0 -1 0
//   -1 5 -1
//   0 -1 0
//
// i.e. one integer N followed by N*N whitespace-separated floats, row-major.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};
use crate::image::ScalarField;

/// Side length used when no size or file is given.
pub const DEFAULT_KERNEL_SIZE: usize = 15;

/// A normalized, flipped, odd-sized square kernel.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    weights: ScalarField,
}

impl Kernel {
    /// Build a kernel from raw row-major weights: validate, normalize, flip.
    pub fn new(size: usize, mut weights: Vec<f32>) -> Result<Self> {
        let count = weight_count(size)?;
        if weights.len() != count {
            return Err(Error::InvalidKernel(format!(
                "expected {count} weights for a {size}x{size} kernel, got {}",
                weights.len()
            )));
        }
        if let Some(i) = weights.iter().position(|w| !w.is_finite()) {
            return Err(Error::InvalidKernel(format!(
                "weight {i} is not finite ({})",
                weights[i]
            )));
        }

        let scale = normalize_weights(&mut weights);
        debug!(size, scale, "kernel normalized");

        let raw = ScalarField::from_vec(size, size, weights);
        Ok(Kernel { weights: flip(&raw) })
    }

    /// All-ones kernel of the given size, i.e. a box blur after normalization.
    pub fn box_filter(size: usize) -> Result<Self> {
        Kernel::new(size, vec![1.0; weight_count(size)?])
    }

    /// The 1×1 unit kernel. Convolving with it is the identity.
    pub fn identity() -> Self {
        Kernel {
            weights: ScalarField::from_vec(1, 1, vec![1.0]),
        }
    }

    /// Parse the text kernel format (`N` then `N*N` floats).
    ///
    /// Tokens after the first `N*N` weights are ignored.
    pub fn parse(text: &str) -> Result<Self> {
        let mut tokens = text.split_whitespace();

        let size_token = tokens
            .next()
            .ok_or_else(|| Error::KernelParse("empty kernel description".into()))?;
        let size: usize = size_token.parse().map_err(|_| {
            Error::KernelParse(format!("kernel size '{size_token}' is not a positive integer"))
        })?;
        let count = weight_count(size)?;

        // N is untrusted input; grow past 64K weights only as tokens arrive.
        let mut weights = Vec::with_capacity(count.min(1 << 16));
        for i in 0..count {
            let tok = tokens.next().ok_or_else(|| {
                Error::KernelParse(format!("expected {count} weights, found only {i}"))
            })?;
            let w: f32 = tok
                .parse()
                .ok()
                .filter(|w: &f32| w.is_finite())
                .ok_or_else(|| {
                    Error::KernelParse(format!("weight {i} ('{tok}') is not a finite number"))
                })?;
            weights.push(w);
        }

        Kernel::new(size, weights)
    }

    /// Read and parse a kernel file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let kernel = Kernel::parse(&text)?;
        debug!(path = %path.display(), size = kernel.size(), "kernel loaded");
        Ok(kernel)
    }

    /// Side length K.
    #[inline]
    pub fn size(&self) -> usize {
        self.weights.width()
    }

    /// K / 2: how far the window reaches from its centre.
    #[inline]
    pub fn radius(&self) -> usize {
        self.size() / 2
    }

    /// Weight at kernel row `r`, column `c` (already flipped).
    #[inline]
    pub fn weight(&self, r: usize, c: usize) -> f32 {
        self.weights.get(c, r)
    }

    /// Weights as a field, row-major, already normalized and flipped.
    pub fn weights(&self) -> &ScalarField {
        &self.weights
    }
}

impl Default for Kernel {
    fn default() -> Self {
        let n = DEFAULT_KERNEL_SIZE;
        let weights = vec![1.0 / (n * n) as f32; n * n];
        Kernel {
            weights: ScalarField::from_vec(n, n, weights),
        }
    }
}

/// Number of weights in a `size`×`size` kernel, rejecting even, zero and
/// overflowing sizes.
fn weight_count(size: usize) -> Result<usize> {
    if size == 0 || size % 2 == 0 {
        return Err(Error::InvalidKernel(format!(
            "size must be odd and >= 1 (got {size})"
        )));
    }
    size.checked_mul(size)
        .ok_or_else(|| Error::InvalidKernel(format!("size {size} is too large")))
}

/// Scale `weights` in place so `max(sum_pos, sum_neg) == 1`.
///
/// Returns the scale factor that was applied. When every weight is zero the
/// factor is 1 and the weights stay zero.
pub fn normalize_weights(weights: &mut [f32]) -> f32 {
    let mut sum_pos = 0.0f32;
    let mut sum_neg = 0.0f32;
    for &w in weights.iter() {
        if w > 0.0 {
            sum_pos += w;
        } else if w < 0.0 {
            sum_neg += -w;
        }
    }

    let max = sum_pos.max(sum_neg);
    let scale = if max != 0.0 { 1.0 / max } else { 1.0 };
    for w in weights.iter_mut() {
        *w *= scale;
    }
    scale
}

/// Rotate a square field by 180°: `out[r][c] = in[n-1-r][n-1-c]`.
///
/// # Panics
/// Panics if the field is not square.
pub fn flip(field: &ScalarField) -> ScalarField {
    let n = field.width();
    assert_eq!(
        n,
        field.height(),
        "kernel must be square (got {}×{})",
        field.width(),
        field.height()
    );
    ScalarField::from_fn(n, n, |c, r| field.get(n - 1 - c, n - 1 - r))
}
