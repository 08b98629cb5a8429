//! Scale-space local maxima of a DoG stack.
//!
//! Overview
//! - Every pixel of an interior layer (one layer above and one below exist)
//!   accumulates a *condition count*: one point for each pair of opposite
//!   neighbours it strictly exceeds, in its own layer and in both adjacent
//!   layers, plus one point for each adjacent-layer centre it equals or
//!   exceeds.
//! - `Neighborhood::Basic` uses the four opposite pairs of the 3×3 ring
//!   (4 + 4 + 4 + 2 = 14 conditions). `Neighborhood::Extended` adds eight
//!   pairs at radius 2 in each layer (another 24, so 38).
//! - A point is an extremum iff its count equals the target exactly. Invalid
//!   (masked) pixels get a bias that pushes them past any reachable target.
//!
//! The test against adjacent-layer centres is `>=` while every same-layer
//! test is strict: when two scale-adjacent responses tie exactly, both
//! layers may claim the point.
//!
//! Two interchangeable backends implement [`ExtremaDetector`]:
//! [`ReferenceExtrema`] (sequential) and, with the `parallel` feature,
//! [`ParallelExtrema`] (rows spread over rayon). Both run the same row
//! kernel and return identical counts.

mod reference;
#[cfg(feature = "parallel")]
mod parallel;

use crate::image::{ImageF32, ImageView, Mask};
use crate::pyramid::DogStack;
use crate::types::Candidate;
use serde::{Deserialize, Serialize};

pub use reference::ReferenceExtrema;
#[cfg(feature = "parallel")]
pub use parallel::ParallelExtrema;

/// Count added to masked pixels; larger than any reachable condition count.
pub const MASK_BIAS: u8 = 64;

/// Opposite-neighbour pairs `(dy, dx)` of the 3×3 ring.
const RING1_PAIRS: [[(isize, isize); 2]; 4] = [
    [(-1, 0), (1, 0)],
    [(0, -1), (0, 1)],
    [(-1, -1), (1, 1)],
    [(1, -1), (-1, 1)],
];

/// Neighbour pairs `(dy, dx)` at radius 2 used by the extended neighbourhood.
const RING2_PAIRS: [[(isize, isize); 2]; 8] = [
    [(-2, 0), (2, 0)],
    [(0, -2), (0, 2)],
    [(-2, -2), (2, 2)],
    [(2, -2), (-2, 2)],
    [(2, -1), (-2, -1)],
    [(-1, -2), (-1, 2)],
    [(1, -2), (1, 2)],
    [(2, 1), (-2, 1)],
];

/// Spatial neighbourhood of the extremum predicate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Neighborhood {
    /// 3×3×3 neighbourhood, 14 conditions.
    #[default]
    Basic,
    /// 5×5×3 neighbourhood, 38 conditions.
    Extended,
}

impl Neighborhood {
    pub fn from_extended(extended: bool) -> Self {
        if extended {
            Self::Extended
        } else {
            Self::Basic
        }
    }

    /// Width of the frame that can never host an extremum.
    pub fn border(self) -> usize {
        match self {
            Self::Basic => 1,
            Self::Extended => 2,
        }
    }

    /// Condition count an extremum must reach.
    pub fn target(self) -> u8 {
        match self {
            Self::Basic => 14,
            Self::Extended => 38,
        }
    }
}

/// Per-voxel condition counts, same shape as the DoG stack.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConditionCounts {
    pub layers: usize,
    pub w: usize,
    pub h: usize,
    pub data: Vec<u8>,
}

impl ConditionCounts {
    pub fn zeros(layers: usize, w: usize, h: usize) -> Self {
        Self {
            layers,
            w,
            h,
            data: vec![0; layers * w * h],
        }
    }

    #[inline]
    pub fn get(&self, layer: usize, y: usize, x: usize) -> u8 {
        self.data[(layer * self.h + y) * self.w + x]
    }

    /// Flags voxels whose count equals `target`.
    pub fn to_extrema(&self, target: u8) -> ExtremaMap {
        ExtremaMap {
            layers: self.layers,
            w: self.w,
            h: self.h,
            flags: self.data.iter().map(|&c| c == target).collect(),
        }
    }
}

/// Boolean extremum flags, same shape as the DoG stack.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtremaMap {
    pub layers: usize,
    pub w: usize,
    pub h: usize,
    pub flags: Vec<bool>,
}

impl ExtremaMap {
    #[inline]
    pub fn get(&self, layer: usize, y: usize, x: usize) -> bool {
        self.flags[(layer * self.h + y) * self.w + x]
    }

    pub fn count(&self) -> usize {
        self.flags.iter().filter(|&&f| f).count()
    }

    /// Flagged voxels in `(layer, y, x)` row-major order.
    pub fn candidates(&self) -> Vec<Candidate> {
        let plane = self.w * self.h;
        self.flags
            .iter()
            .enumerate()
            .filter(|&(_, &f)| f)
            .map(|(i, _)| Candidate {
                layer: i / plane,
                y: (i % plane) / self.w,
                x: i % self.w,
            })
            .collect()
    }
}

/// Strategy interface for the local-extrema search.
///
/// Implementations must produce identical counts for identical input; they
/// differ only in how the work is scheduled. Inputs are never modified.
pub trait ExtremaDetector: Send + Sync {
    fn name(&self) -> &'static str;

    /// Condition counts for every voxel of `dogs`. When present, `mask` must
    /// have the spatial shape of the stack.
    fn condition_counts(
        &self,
        dogs: &DogStack,
        mask: Option<&Mask>,
        neighborhood: Neighborhood,
    ) -> ConditionCounts;

    fn detect(
        &self,
        dogs: &DogStack,
        mask: Option<&Mask>,
        neighborhood: Neighborhood,
    ) -> ExtremaMap {
        self.condition_counts(dogs, mask, neighborhood)
            .to_extrema(neighborhood.target())
    }
}

/// Fastest backend compiled into this build.
pub fn default_detector() -> Box<dyn ExtremaDetector> {
    #[cfg(feature = "parallel")]
    {
        Box::new(ParallelExtrema)
    }
    #[cfg(not(feature = "parallel"))]
    {
        Box::new(ReferenceExtrema)
    }
}

fn check_mask(dogs: &DogStack, mask: Option<&Mask>) {
    if let Some(m) = mask {
        assert_eq!(
            (m.w, m.h),
            (dogs.width(), dogs.height()),
            "mask shape must match the DoG stack"
        );
    }
}

/// Accumulate the condition counts of row `y` of interior layer `layer`.
///
/// `counts` is the output row. Each comparison is evaluated on whole shifted
/// row slices so the inner loops stay branch-free.
fn accumulate_row(
    counts: &mut [u8],
    dogs: &DogStack,
    layer: usize,
    y: usize,
    mask: Option<&Mask>,
    neighborhood: Neighborhood,
) {
    let (w, h) = (dogs.width(), dogs.height());
    let cur = dogs.layer(layer);
    let prev = dogs.layer(layer - 1);
    let next = dogs.layer(layer + 1);

    if y >= 1 && y + 1 < h && w >= 3 {
        let (lo, hi) = (1, w - 1);
        let centre = &cur.row(y)[lo..hi];
        let out = &mut counts[lo..hi];
        for img in [cur, next, prev] {
            for pair in &RING1_PAIRS {
                add_pair(out, centre, img, y, lo, hi, pair);
            }
        }
        for img in [next, prev] {
            let other = &img.row(y)[lo..hi];
            for ((c, &v), &o) in out.iter_mut().zip(centre).zip(other) {
                *c += u8::from(v >= o);
            }
        }
    }

    if neighborhood == Neighborhood::Extended && y >= 2 && y + 2 < h && w >= 5 {
        let (lo, hi) = (2, w - 2);
        let centre = &cur.row(y)[lo..hi];
        let out = &mut counts[lo..hi];
        for img in [cur, next, prev] {
            for pair in &RING2_PAIRS {
                add_pair(out, centre, img, y, lo, hi, pair);
            }
        }
    }

    if let Some(m) = mask {
        let row = &m.data[y * w..(y + 1) * w];
        for (c, &invalid) in counts.iter_mut().zip(row) {
            if invalid {
                *c = c.saturating_add(MASK_BIAS);
            }
        }
    }
}

/// `out[x] += centre[x] > img[y+dy_a][x+dx_a] && centre[x] > img[y+dy_b][x+dx_b]`
/// over the column range `lo..hi`.
fn add_pair(
    out: &mut [u8],
    centre: &[f32],
    img: &ImageF32,
    y: usize,
    lo: usize,
    hi: usize,
    pair: &[(isize, isize); 2],
) {
    let a = shifted(img, y, lo, hi, pair[0]);
    let b = shifted(img, y, lo, hi, pair[1]);
    for (((c, &v), &va), &vb) in out.iter_mut().zip(centre).zip(a).zip(b) {
        *c += u8::from(v > va && v > vb);
    }
}

#[inline]
fn shifted(img: &ImageF32, y: usize, lo: usize, hi: usize, (dy, dx): (isize, isize)) -> &[f32] {
    let row = img.row((y as isize + dy) as usize);
    &row[(lo as isize + dx) as usize..(hi as isize + dx) as usize]
}
