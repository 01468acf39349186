// image.rs — Runtime-sized image container, generic over cell type.
//
// Two concrete instantiations carry the whole pipeline:
//
// ┌──────────────────────────┬───────────────────────────────────────┐
// │  PixelField              │  ScalarField                          │
// ├──────────────────────────┼───────────────────────────────────────┤
// │  Image<Rgba>             │  Image<f32>                           │
// │  decoded colour image    │  LW, LD, log-luminance, low/high pass │
// │  owned by the session    │  and kernel weights                   │
// ├──────────────────────────┼───────────────────────────────────────┤
// │  lives across requests   │  lives inside one pipeline call       │
// └──────────────────────────┴───────────────────────────────────────┘
//
// Layout is a single contiguous row-major buffer: cell (x, y) lives at
// data[y * width + x]. No per-row pointers, no padding.
//
// Invariant: data.len() == width * height for every field, including the
// empty 0×0 one. Stages that combine fields (reconstruct) assert equal
// dimensions instead of resampling.

use std::fmt;

// ---------------------------------------------------------------------------
// Pixel Trait
// ---------------------------------------------------------------------------
// Any type that implements Pixel can be stored in an Image.
//
//   Copy    — cells are trivially copyable
//   Default — zero value used by Image::new()
//   Send    — whole rows move into worker threads
//   Sync    — the source image is shared by reference across workers

/// Trait for types that can serve as cell values in an Image.
pub trait Pixel: Copy + Default + Send + Sync + 'static {}

impl Pixel for f32 {}

impl Pixel for Rgba {}

// ---------------------------------------------------------------------------
// Rgba
// ---------------------------------------------------------------------------

/// One colour pixel with floating-point channels.
///
/// 8-bit sources are normalized to [0, 1]; HDR sources keep their native
/// values, so channels above 1.0 (or below 0.0) are legal.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    #[inline]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Rgba { r, g, b, a }
    }

    /// Opaque pixel (alpha = 1.0), the default for 3-channel sources.
    #[inline]
    pub const fn opaque(r: f32, g: f32, b: f32) -> Self {
        Rgba { r, g, b, a: 1.0 }
    }

    /// Uniform gray, opaque.
    #[inline]
    pub const fn gray(v: f32) -> Self {
        Rgba::opaque(v, v, v)
    }

    /// Multiply the colour channels by `k`, leaving alpha alone.
    #[inline]
    pub fn scale_rgb(self, k: f32) -> Self {
        Rgba {
            r: self.r * k,
            g: self.g * k,
            b: self.b * k,
            a: self.a,
        }
    }

    /// Saturate ±inf colour channels to ±f32::MAX.
    #[inline]
    pub fn clamp_finite(self) -> Self {
        Rgba {
            r: self.r.clamp(-f32::MAX, f32::MAX),
            g: self.g.clamp(-f32::MAX, f32::MAX),
            b: self.b.clamp(-f32::MAX, f32::MAX),
            a: self.a,
        }
    }
}

/// A colour image: the decoded input and the mapped output.
pub type PixelField = Image<Rgba>;

/// A single-channel f32 field: luminance, log-luminance, kernel weights.
pub type ScalarField = Image<f32>;

// ---------------------------------------------------------------------------
// Image<T>
// ---------------------------------------------------------------------------

/// A 2D image with runtime dimensions, generic over cell type `T`.
pub struct Image<T: Pixel> {
    /// Cell data in row-major order. Length = width * height.
    data: Vec<T>,
    width: usize,
    height: usize,
}

// Manual impl to make the deep copy of the heap buffer explicit at the
// definition site. Sessions clone the original field on every restore.
impl<T: Pixel> Clone for Image<T> {
    fn clone(&self) -> Self {
        Image {
            data: self.data.clone(),
            width: self.width,
            height: self.height,
        }
    }
}

impl<T: Pixel + PartialEq> PartialEq for Image<T> {
    fn eq(&self, other: &Self) -> bool {
        self.width == other.width && self.height == other.height && self.data == other.data
    }
}

impl<T: Pixel> Image<T> {
    // --- Constructors ---

    /// Create a zero-initialized image with the given dimensions.
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, T::default())
    }

    /// Create an image with every cell set to `value`.
    pub fn filled(width: usize, height: usize, value: T) -> Self {
        Image {
            data: vec![value; width * height],
            width,
            height,
        }
    }

    /// Create an image from an existing row-major vector.
    ///
    /// # Panics
    /// Panics if `data.len() != width * height`.
    pub fn from_vec(width: usize, height: usize, data: Vec<T>) -> Self {
        assert_eq!(
            data.len(),
            width * height,
            "data length ({}) must equal width * height ({})",
            data.len(),
            width * height,
        );
        Image { data, width, height }
    }

    /// Build an image by evaluating `f(x, y)` for every cell.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Image { data, width, height }
    }

    // --- Accessors ---

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// `(width, height)` — handy for dimension-equality asserts.
    #[inline]
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get the cell value at (x, y). x is column, y is row.
    ///
    /// # Panics
    /// Panics if (x, y) is out of bounds.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> T {
        self.bounds_check(x, y);
        self.data[y * self.width + x]
    }

    /// Get a cell without bounds checking.
    ///
    /// # Safety
    /// Caller must guarantee x < width and y < height.
    /// Used in the convolution interior where the window is known to fit.
    #[inline(always)]
    pub unsafe fn get_unchecked(&self, x: usize, y: usize) -> T {
        debug_assert!(x < self.width && y < self.height,
            "get_unchecked({x},{y}) out of bounds for {}x{}", self.width, self.height);
        *self.data.get_unchecked(y * self.width + x)
    }

    /// Mutable reference to the cell at (x, y).
    #[inline]
    pub fn get_mut(&mut self, x: usize, y: usize) -> &mut T {
        self.bounds_check(x, y);
        let idx = y * self.width + x;
        &mut self.data[idx]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: T) {
        *self.get_mut(x, y) = value;
    }

    /// Borrow a single row as a slice.
    #[inline]
    pub fn row(&self, y: usize) -> &[T] {
        assert!(y < self.height, "row {y} out of bounds (height {})", self.height);
        let start = y * self.width;
        &self.data[start..start + self.width]
    }

    #[inline]
    pub fn row_mut(&mut self, y: usize) -> &mut [T] {
        assert!(y < self.height, "row {y} out of bounds (height {})", self.height);
        let start = y * self.width;
        &mut self.data[start..start + self.width]
    }

    /// Iterate over all cells as `(x, y, value)` tuples.
    pub fn pixels(&self) -> impl Iterator<Item = (usize, usize, T)> + '_ {
        (0..self.height).flat_map(move |y| {
            (0..self.width).map(move |x| (x, y, self.data[y * self.width + x]))
        })
    }

    /// The underlying buffer, row-major.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Mutable access to the underlying buffer. Row `y` occupies
    /// `[y * width, (y + 1) * width)`, which is what `par_chunks_mut(width)`
    /// relies on.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    // --- Internal helpers ---

    #[inline]
    fn bounds_check(&self, x: usize, y: usize) {
        assert!(
            x < self.width && y < self.height,
            "pixel ({x},{y}) out of bounds for image {}×{}",
            self.width,
            self.height,
        );
    }
}

impl<T: Pixel + fmt::Debug> fmt::Debug for Image<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Image<{}> {{ {}×{} }}",
            std::any::type_name::<T>(),
            self.width,
            self.height,
        )?;
        for y in 0..self.height.min(8) {
            write!(f, "  row {y}: [")?;
            for x in 0..self.width.min(16) {
                if x > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{:?}", self.get(x, y))?;
            }
            if self.width > 16 {
                write!(f, ", ...")?;
            }
            writeln!(f, "]")?;
        }
        if self.height > 8 {
            writeln!(f, "  ...")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Index / IndexMut — img[(x, y)] syntax
// ---------------------------------------------------------------------------

impl<T: Pixel> std::ops::Index<(usize, usize)> for Image<T> {
    type Output = T;

    #[inline]
    fn index(&self, (x, y): (usize, usize)) -> &T {
        self.bounds_check(x, y);
        &self.data[y * self.width + x]
    }
}

impl<T: Pixel> std::ops::IndexMut<(usize, usize)> for Image<T> {
    #[inline]
    fn index_mut(&mut self, (x, y): (usize, usize)) -> &mut T {
        self.bounds_check(x, y);
        let idx = y * self.width + x;
        &mut self.data[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_scalar_zeroed() {
        let img: ScalarField = Image::new(10, 5);
        assert_eq!(img.width(), 10);
        assert_eq!(img.height(), 5);
        for (_, _, v) in img.pixels() {
            assert_eq!(v, 0.0);
        }
    }

    #[test]
    fn test_roundtrip() {
        let mut img: ScalarField = Image::new(4, 3);
        img.set(0, 0, 1.5);
        img.set(3, 2, -2.0);
        assert_eq!(img.get(0, 0), 1.5);
        assert_eq!(img.get(3, 2), -2.0);
        assert_eq!(img.get(2, 2), 0.0);
    }

    #[test]
    fn test_from_vec_row_major() {
        let data: Vec<f32> = (0..12).map(|v| v as f32).collect();
        let img = Image::from_vec(4, 3, data);
        // Row 0: [0, 1, 2, 3], Row 1: [4, 5, 6, 7], Row 2: [8, 9, 10, 11]
        assert_eq!(img.get(3, 0), 3.0);
        assert_eq!(img.get(0, 1), 4.0);
        assert_eq!(img.get(3, 2), 11.0);
        assert_eq!(img.row(1), &[4.0, 5.0, 6.0, 7.0]);
    }

    #[test]
    fn test_from_fn() {
        let img = Image::from_fn(3, 2, |x, y| (x + 10 * y) as f32);
        assert_eq!(img.get(2, 0), 2.0);
        assert_eq!(img.get(1, 1), 11.0);
    }

    #[test]
    fn test_rgba_scale_keeps_alpha() {
        let p = Rgba::new(0.2, 0.4, 0.8, 0.5).scale_rgb(2.0);
        assert_eq!(p, Rgba::new(0.4, 0.8, 1.6, 0.5));
    }

    #[test]
    fn test_pixel_field_default_alpha() {
        let img = PixelField::filled(2, 2, Rgba::gray(0.5));
        assert!(img.pixels().all(|(_, _, p)| p.a == 1.0));
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_get_out_of_bounds() {
        let img: ScalarField = Image::new(4, 4);
        img.get(4, 0);
    }

    #[test]
    #[should_panic(expected = "data length")]
    fn test_from_vec_wrong_len() {
        let _ = Image::from_vec(2, 2, vec![0.0f32; 3]);
    }

    #[test]
    fn test_index_mut_write() {
        let mut img: ScalarField = Image::new(4, 3);
        img[(1, 2)] = 42.0;
        assert_eq!(img[(1, 2)], 42.0);
        assert_eq!(img.get(1, 2), 42.0);
    }
}
