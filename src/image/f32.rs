//! Owned single-channel f32 image in row-major layout (stride == width).
//!
//! Every stage of the blob pipeline (log image, blurred layers, DoG layers)
//! is stored in this type.
use crate::error::BlobError;
use crate::image::traits::{ImageView, ImageViewMut};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ImageF32 {
    /// Image width in pixels
    pub w: usize,
    /// Image height in pixels
    pub h: usize,
    /// Number of f32 elements between consecutive rows (equals `w`)
    pub stride: usize,
    /// Backing storage in row-major order
    pub data: Vec<f32>,
}

impl ImageF32 {
    /// Construct a zero-initialized buffer of size `w × h`.
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            w,
            h,
            stride: w,
            data: vec![0.0; w * h],
        }
    }

    /// Wrap an existing row-major buffer. Fails when `data.len() != w * h`.
    pub fn from_vec(w: usize, h: usize, data: Vec<f32>) -> Result<Self, BlobError> {
        if data.len() != w * h {
            return Err(BlobError::InvalidParams(format!(
                "buffer of {} samples cannot back a {w}x{h} image",
                data.len()
            )));
        }
        Ok(Self {
            w,
            h,
            stride: w,
            data,
        })
    }

    /// Build an image by evaluating `f(x, y)` at every pixel.
    pub fn from_fn(w: usize, h: usize, mut f: impl FnMut(usize, usize) -> f32) -> Self {
        let mut out = Self::new(w, h);
        for y in 0..h {
            for (x, px) in out.row_mut(y).iter_mut().enumerate() {
                *px = f(x, y);
            }
        }
        out
    }

    #[inline]
    /// Convert (x, y) to a linear index into `data`.
    pub fn idx(&self, x: usize, y: usize) -> usize {
        y * self.stride + x
    }
    #[inline]
    /// Get the pixel value at (x, y).
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[self.idx(x, y)]
    }
    #[inline]
    /// Set the pixel value at (x, y).
    pub fn set(&mut self, x: usize, y: usize, v: f32) {
        let i = self.idx(x, y);
        self.data[i] = v;
    }

    /// Pixel-wise `self - other`. Both images must share their dimensions.
    pub fn difference(&self, other: &ImageF32) -> ImageF32 {
        debug_assert_eq!((self.w, self.h), (other.w, other.h));
        let mut out = ImageF32::new(self.w, self.h);
        for y in 0..self.h {
            let a = self.row(y);
            let b = other.row(y);
            for ((dst, &pa), &pb) in out.row_mut(y).iter_mut().zip(a).zip(b) {
                *dst = pa - pb;
            }
        }
        out
    }

    /// Mean over all pixels; zero for an empty image.
    pub fn mean(&self) -> f32 {
        let sum: f32 = self.rows().map(|r| r.iter().copied().sum::<f32>()).sum();
        sum / (self.w * self.h).max(1) as f32
    }
}

impl ImageView for ImageF32 {
    type Pixel = f32;

    #[inline]
    fn width(&self) -> usize {
        self.w
    }
    #[inline]
    fn height(&self) -> usize {
        self.h
    }
    #[inline]
    fn stride(&self) -> usize {
        self.stride
    }
    #[inline]
    fn row(&self, y: usize) -> &[f32] {
        let start = y * self.stride;
        &self.data[start..start + self.w]
    }
    #[inline]
    fn as_slice(&self) -> Option<&[f32]> {
        (self.stride == self.w).then_some(&self.data[..self.w * self.h])
    }
}

impl ImageViewMut for ImageF32 {
    #[inline]
    fn row_mut(&mut self, y: usize) -> &mut [f32] {
        let start = y * self.stride;
        let end = start + self.w;
        &mut self.data[start..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_vec_rejects_wrong_length() {
        assert!(ImageF32::from_vec(3, 3, vec![0.0; 8]).is_err());
        let img = ImageF32::from_vec(3, 2, (0..6).map(|v| v as f32).collect()).unwrap();
        assert_eq!(img.get(2, 1), 5.0);
    }

    #[test]
    fn difference_is_pixel_wise() {
        let a = ImageF32::from_fn(4, 3, |x, y| (x + y) as f32);
        let b = ImageF32::from_fn(4, 3, |x, _| x as f32);
        let d = a.difference(&b);
        for y in 0..3 {
            assert!(d.row(y).iter().all(|&v| v == y as f32));
        }
    }
}
