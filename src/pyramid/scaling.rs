//! Cross-octave resampling and coordinate mapping.
//!
//! Octaves are linked by a plain 2×2 binning: the next octave sees every
//! block of four pixels as one. Coordinates map back to the input frame by
//! the running reduction factor (`x_full = x_octave · reduction`).
use crate::image::{ImageF32, ImageView, ImageViewMut};

/// Sum each 2×2 block and divide by four (area-preserving mean).
///
/// A trailing odd row/column is dropped so that the reduction factor stays an
/// exact power of two.
pub fn bin2x2(src: &ImageF32) -> ImageF32 {
    let (nw, nh) = (src.w / 2, src.h / 2);
    let mut out = ImageF32::new(nw, nh);
    for y in 0..nh {
        let top = src.row(2 * y);
        let bottom = src.row(2 * y + 1);
        for (x, dst) in out.row_mut(y).iter_mut().enumerate() {
            let sum = top[2 * x] + top[2 * x + 1] + bottom[2 * x] + bottom[2 * x + 1];
            *dst = sum / 4.0;
        }
    }
    out
}

/// Running coordinate scale between an octave and the input frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OctaveScaling {
    pub octave: usize,
    pub reduction: f32,
}

impl Default for OctaveScaling {
    fn default() -> Self {
        Self {
            octave: 0,
            reduction: 1.0,
        }
    }
}

impl OctaveScaling {
    /// Scaling of the next (half-resolution) octave.
    pub fn next(self) -> Self {
        Self {
            octave: self.octave + 1,
            reduction: self.reduction * 2.0,
        }
    }

    /// Lift an octave-local position to input-frame coordinates.
    #[inline]
    pub fn to_full(&self, p: [f32; 2]) -> [f32; 2] {
        [p[0] * self.reduction, p[1] * self.reduction]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binning_averages_blocks() {
        let img = ImageF32::from_fn(5, 4, |x, y| (x + 10 * y) as f32);
        let out = bin2x2(&img);
        assert_eq!((out.w, out.h), (2, 2));
        // Block (0,0): 0, 1, 10, 11.
        assert!((out.get(0, 0) - 5.5).abs() < 1e-6);
        // Block (1,1): 22, 23, 32, 33.
        assert!((out.get(1, 1) - 27.5).abs() < 1e-6);
    }

    #[test]
    fn binning_keeps_constant_level() {
        let img = ImageF32::from_fn(8, 8, |_, _| 2.25);
        assert!(bin2x2(&img).data.iter().all(|&v| v == 2.25));
    }

    #[test]
    fn reduction_doubles_per_octave() {
        let mut s = OctaveScaling::default();
        for n in 0..4 {
            assert_eq!(s.octave, n);
            assert_eq!(s.to_full([3.5, 7.0]), [3.5 * (1 << n) as f32, 7.0 * (1 << n) as f32]);
            s = s.next();
        }
    }
}
