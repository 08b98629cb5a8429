//! Validity mask (`true` = invalid pixel) and its propagation across octaves.
//!
//! The detector keeps one mask per octave. It always covers the image border,
//! is grown by a disk-shaped dilation so that blobs touching invalid regions
//! are not reported, and is OR-reduced by 2×2 when the image shrinks.
use crate::error::BlobError;
use crate::image::traits::ImageView;
use crate::image::ImageF32;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mask {
    pub w: usize,
    pub h: usize,
    pub data: Vec<bool>,
}

impl Mask {
    /// All-valid mask of size `w × h`.
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            w,
            h,
            data: vec![false; w * h],
        }
    }

    /// Wrap a caller-supplied row-major buffer.
    pub fn from_raw(w: usize, h: usize, data: Vec<bool>) -> Result<Self, BlobError> {
        if data.len() != w * h {
            return Err(BlobError::InvalidParams(format!(
                "mask buffer of {} samples cannot cover {w}x{h} pixels",
                data.len()
            )));
        }
        Ok(Self { w, h, data })
    }

    /// Marks every pixel that is non-positive (or not finite) as invalid.
    pub fn from_nonpositive(image: &ImageF32) -> Self {
        let mut mask = Self::new(image.w, image.h);
        for (y, row) in image.rows().enumerate() {
            let start = y * mask.w;
            for (dst, &v) in mask.data[start..start + mask.w].iter_mut().zip(row) {
                *dst = v <= 0.0 || !v.is_finite();
            }
        }
        mask
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> bool {
        self.data[y * self.w + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, v: bool) {
        self.data[y * self.w + x] = v;
    }

    /// Number of invalid pixels.
    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&m| m).count()
    }

    /// Combine with another mask of identical shape (logical OR).
    pub fn union(&mut self, other: &Mask) -> Result<(), BlobError> {
        if (self.w, self.h) != (other.w, other.h) {
            return Err(BlobError::ShapeMismatch {
                image: (self.w, self.h),
                mask: (other.w, other.h),
            });
        }
        for (dst, &src) in self.data.iter_mut().zip(&other.data) {
            *dst |= src;
        }
        Ok(())
    }

    /// Flags the outermost one-pixel frame.
    pub fn mark_border(&mut self) {
        if self.w == 0 || self.h == 0 {
            return;
        }
        let (w, h) = (self.w, self.h);
        self.data[..w].fill(true);
        self.data[(h - 1) * w..].fill(true);
        for y in 0..h {
            self.data[y * w] = true;
            self.data[y * w + w - 1] = true;
        }
    }

    /// Binary dilation with a disk of the given radius (`dx² + dy² <= r²`).
    pub fn dilate(&self, radius: usize) -> Mask {
        if radius == 0 {
            return self.clone();
        }
        let r = radius as isize;
        let offsets: Vec<(isize, isize)> = (-r..=r)
            .flat_map(|dy| (-r..=r).map(move |dx| (dx, dy)))
            .filter(|(dx, dy)| dx * dx + dy * dy <= r * r)
            .collect();

        let mut out = self.clone();
        let (w, h) = (self.w as isize, self.h as isize);
        for y in 0..h {
            for x in 0..w {
                if !self.data[(y * w + x) as usize] {
                    continue;
                }
                for &(dx, dy) in &offsets {
                    let (nx, ny) = (x + dx, y + dy);
                    if nx >= 0 && nx < w && ny >= 0 && ny < h {
                        out.data[(ny * w + nx) as usize] = true;
                    }
                }
            }
        }
        out
    }

    /// 2×2 OR-reduction; a trailing odd row/column is dropped.
    pub fn bin2x2(&self) -> Mask {
        let (nw, nh) = (self.w / 2, self.h / 2);
        let mut out = Mask::new(nw, nh);
        for y in 0..nh {
            let top = &self.data[(2 * y) * self.w..(2 * y + 1) * self.w];
            let bottom = &self.data[(2 * y + 1) * self.w..(2 * y + 2) * self.w];
            for x in 0..nw {
                out.data[y * nw + x] =
                    top[2 * x] || top[2 * x + 1] || bottom[2 * x] || bottom[2 * x + 1];
            }
        }
        out
    }
}

impl ImageView for Mask {
    type Pixel = bool;

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
        self.w
    }
    #[inline]
    fn row(&self, y: usize) -> &[bool] {
        &self.data[y * self.w..(y + 1) * self.w]
    }
    #[inline]
    fn as_slice(&self) -> Option<&[bool]> {
        Some(&self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn border_is_marked() {
        let mut m = Mask::new(5, 4);
        m.mark_border();
        assert_eq!(m.count(), 5 * 4 - 3 * 2);
        assert!(!m.get(2, 2));
        assert!(m.get(0, 2) && m.get(4, 1) && m.get(3, 0) && m.get(1, 3));
    }

    #[test]
    fn dilation_uses_a_disk() {
        let mut m = Mask::new(11, 11);
        m.set(5, 5, true);
        let d = m.dilate(2);
        // 13 pixels lie within distance 2 of the centre.
        assert_eq!(d.count(), 13);
        assert!(d.get(7, 5) && d.get(5, 3) && d.get(6, 6));
        assert!(!d.get(7, 7));
        assert_eq!(m.dilate(0), m);
    }

    #[test]
    fn binning_is_an_or_reduction() {
        let mut m = Mask::new(5, 5);
        m.set(3, 0, true);
        m.set(4, 4, true); // dropped with the odd trailing row/column
        let b = m.bin2x2();
        assert_eq!((b.w, b.h), (2, 2));
        assert_eq!(b.data, vec![false, true, false, false]);
    }

    #[test]
    fn nonpositive_pixels_are_invalid() {
        let img = ImageF32::from_fn(3, 1, |x, _| x as f32 - 1.0);
        let m = Mask::from_nonpositive(&img);
        assert_eq!(m.data, vec![true, true, false]);
    }

    #[test]
    fn union_checks_shape() {
        let mut a = Mask::new(2, 2);
        assert!(a.union(&Mask::new(3, 2)).is_err());
        let mut b = Mask::new(2, 2);
        b.set(1, 1, true);
        a.union(&b).unwrap();
        assert!(a.get(1, 1));
    }
}
