// convolution.rs — Dense 2D convolution with zero padding.
//
// For every output cell (row, col) and every tap (fr, fc) of a K×K kernel:
//
//   src = (row + fr - K/2, col + fc - K/2)
//   out[row][col] += field[src] * kernel[fr][fc]      if src is inside
//                                                     else contributes 0
//
// The kernel arrives pre-flipped (kernel.rs), so this multiply-accumulate
// is true convolution. Cost is O(H·W·K²); K is small (15 by default) so no
// separable or FFT path is needed. Arbitrary kernels (sharpening, loaded
// from file) are not separable in general anyway.
//
// BORDER HANDLING: zero padding. Taps outside the field are skipped, not
// wrapped and not clamped to the edge.
//
// PARALLELISM: output rows are independent. Each rayon task owns one
// output row (par_chunks_mut over the destination buffer) and reads the
// shared, immutable source field and kernel.

use rayon::prelude::*;

use crate::image::{Image, PixelField, Pixel, Rgba, ScalarField};
use crate::kernel::Kernel;

/// Convolve a scalar field with `kernel`, zero-padding outside the field.
///
/// The output has the same dimensions as `field`.
pub fn convolve(field: &ScalarField, kernel: &Kernel) -> ScalarField {
    convolve_with(field, kernel, |v| v)
}

/// Convolve the R, G and B planes of a colour image independently.
///
/// Alpha is copied from the source pixel. This is the "blur" request of the
/// interactive viewer.
pub fn convolve_pixels(pixels: &PixelField, kernel: &Kernel) -> PixelField {
    let r = convolve_with(pixels, kernel, |p| p.r);
    let g = convolve_with(pixels, kernel, |p| p.g);
    let b = convolve_with(pixels, kernel, |p| p.b);

    let (w, h) = pixels.dimensions();
    let mut out = PixelField::new(w, h);
    if w == 0 {
        return out;
    }
    out.as_mut_slice()
        .par_iter_mut()
        .enumerate()
        .for_each(|(i, dst)| {
            *dst = Rgba::new(
                r.as_slice()[i],
                g.as_slice()[i],
                b.as_slice()[i],
                pixels.as_slice()[i].a,
            );
        });
    out
}

/// Shared kernel loop: convolve the channel selected by `sample`.
fn convolve_with<T, F>(src: &Image<T>, kernel: &Kernel, sample: F) -> ScalarField
where
    T: Pixel,
    F: Fn(T) -> f32 + Sync,
{
    let (w, h) = src.dimensions();
    let mut dst = ScalarField::new(w, h);
    if w == 0 || h == 0 {
        return dst;
    }

    dst.as_mut_slice()
        .par_chunks_mut(w)
        .enumerate()
        .for_each(|(y, out_row)| convolve_row(src, kernel, &sample, y, out_row));
    dst
}

/// Fill one output row.
///
/// Interior cells (window fully inside the field) take the unchecked path.
/// Cells near any border go through `accumulate_clipped`, which skips
/// out-of-bounds taps.
fn convolve_row<T, F>(src: &Image<T>, kernel: &Kernel, sample: &F, y: usize, out_row: &mut [f32])
where
    T: Pixel,
    F: Fn(T) -> f32,
{
    let (w, h) = src.dimensions();
    let k = kernel.size();
    let half = kernel.radius();

    let row_inside = y >= half && y + half < h;
    let (x_lo, x_hi) = if w > 2 * half { (half, w - half) } else { (0, 0) };

    for (x, out) in out_row.iter_mut().enumerate() {
        if row_inside && x >= x_lo && x < x_hi {
            let mut acc = 0.0f32;
            // SAFETY: y - half >= 0, y + half < h, x - half >= 0 and
            // x + half < w, so every tap (x + fc - half, y + fr - half)
            // is within bounds.
            unsafe {
                for fr in 0..k {
                    let sy = y + fr - half;
                    for fc in 0..k {
                        let sx = x + fc - half;
                        acc += sample(src.get_unchecked(sx, sy)) * kernel.weight(fr, fc);
                    }
                }
            }
            *out = acc;
        } else {
            *out = accumulate_clipped(src, kernel, sample, x, y);
        }
    }
}

/// Border path: taps falling outside the field contribute zero.
fn accumulate_clipped<T, F>(src: &Image<T>, kernel: &Kernel, sample: &F, x: usize, y: usize) -> f32
where
    T: Pixel,
    F: Fn(T) -> f32,
{
    let (w, h) = src.dimensions();
    let k = kernel.size();
    let half = kernel.radius() as isize;

    let mut acc = 0.0f32;
    for fr in 0..k {
        let sy = y as isize + fr as isize - half;
        if sy < 0 || sy >= h as isize {
            continue;
        }
        for fc in 0..k {
            let sx = x as isize + fc as isize - half;
            if sx < 0 || sx >= w as isize {
                continue;
            }
            acc += sample(src.get(sx as usize, sy as usize)) * kernel.weight(fr, fc);
        }
    }
    acc
}
