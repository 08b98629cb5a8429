//! Separable Gaussian smoothing used to build the scale space.
//!
//! Kernels are truncated at `4σ` (rounded to the nearest pixel, at least one
//! tap on each side) and normalised to unit sum. Borders replicate the edge
//! sample, matching the clamped indexing used everywhere else in the crate.
use crate::image::{ImageF32, ImageView, ImageViewMut};

/// Kernel support in units of sigma.
const TRUNCATE: f32 = 4.0;

/// Trait implemented by separable 1D filters.
pub trait SeparableFilter {
    /// Return the 1D taps (in left-to-right order), odd length, centred.
    fn taps(&self) -> &[f32];
}

/// Sampled, normalised 1D Gaussian.
#[derive(Clone, Debug)]
pub struct GaussianKernel {
    pub sigma: f32,
    pub radius: usize,
    taps: Vec<f32>,
}

impl GaussianKernel {
    pub fn new(sigma: f32) -> Self {
        assert!(
            sigma.is_finite() && sigma > 0.0,
            "sigma must be > 0 and finite"
        );
        let radius = ((TRUNCATE * sigma + 0.5) as usize).max(1);
        let inv_two_var = 1.0 / (2.0 * sigma * sigma);
        let mut taps: Vec<f32> = (0..2 * radius + 1)
            .map(|i| {
                let x = i as f32 - radius as f32;
                (-x * x * inv_two_var).exp()
            })
            .collect();
        let sum: f32 = taps.iter().sum();
        for t in &mut taps {
            *t /= sum;
        }
        Self {
            sigma,
            radius,
            taps,
        }
    }
}

impl SeparableFilter for GaussianKernel {
    #[inline]
    fn taps(&self) -> &[f32] {
        &self.taps
    }
}

/// Blur stage driven by the octave builder.
///
/// `sigma` is the extra blur to apply on top of whatever the input already
/// carries. Implementations must leave the input untouched.
pub trait BlurStage: Send + Sync {
    fn blur(&self, image: &ImageF32, sigma: f32) -> ImageF32;
}

/// Reference blur: separable Gaussian convolution with replicated borders.
#[derive(Clone, Copy, Debug, Default)]
pub struct GaussianBlur;

impl BlurStage for GaussianBlur {
    fn blur(&self, image: &ImageF32, sigma: f32) -> ImageF32 {
        gaussian_blur(image, sigma)
    }
}

/// Blur `image` by a Gaussian of standard deviation `sigma` (pixels).
///
/// A non-positive sigma returns an unmodified copy.
pub fn gaussian_blur(image: &ImageF32, sigma: f32) -> ImageF32 {
    if sigma.is_nan() || sigma <= 0.0 || image.w == 0 || image.h == 0 {
        return image.clone();
    }
    apply(&GaussianKernel::new(sigma), image)
}

/// Apply a separable filter: horizontal pass followed by a vertical pass.
pub fn apply(filter: &dyn SeparableFilter, src: &ImageF32) -> ImageF32 {
    let taps = filter.taps();
    let radius = taps.len() / 2;
    let (w, h) = (src.w, src.h);

    let mut tmp = ImageF32::new(w, h);
    for y in 0..h {
        filter_row(src.row(y), tmp.row_mut(y), taps, radius);
    }

    let mut out = ImageF32::new(w, h);
    let mut acc = vec![0.0f32; w];
    for y in 0..h {
        acc.fill(0.0);
        for (k, &tap) in taps.iter().enumerate() {
            let sy = clamp_index(y as isize + k as isize - radius as isize, h);
            for (a, &v) in acc.iter_mut().zip(tmp.row(sy)) {
                *a += tap * v;
            }
        }
        out.row_mut(y).copy_from_slice(&acc);
    }
    out
}

fn filter_row(row: &[f32], out: &mut [f32], taps: &[f32], radius: usize) {
    let w = row.len();
    for (x, dst) in out.iter_mut().enumerate() {
        let mut acc = 0.0f32;
        for (k, &tap) in taps.iter().enumerate() {
            let sx = clamp_index(x as isize + k as isize - radius as isize, w);
            acc += tap * row[sx];
        }
        *dst = acc;
    }
}

#[inline]
fn clamp_index(idx: isize, upper: usize) -> usize {
    idx.clamp(0, upper as isize - 1) as usize
}
