//! Sub-pixel / sub-scale refinement of DoG extrema.
//!
//! Each candidate `(layer, y, x)` is refined by one Newton step on a local
//! quadratic model of the DoG response:
//!
//! 1) The candidate sigma is resolved to an octave-local scale index `j`
//!    through the schedule. Only interior indices (`0 < j < S + 1`) survive,
//!    as do positions at least 2 px away from the layer border.
//! 2) Spatial derivatives `dx, dy, d2x, d2y, dxy` come from fixed 3×3
//!    least-squares kernels dotted with the current-layer patch. Scale
//!    derivatives are central differences of the quadratic-fit centre value
//!    across the previous/next layers, and the mixed terms `dxs, dys` are
//!    central differences of the first-order kernels.
//! 3) The symmetric 3×3 Hessian in `(y, x, s)` is solved against the gradient
//!    with an LU factorisation. A singular system drops the candidate.
//! 4) The step `delta` is accepted iff `|delta_xy| < √2`, `|delta_x| ≤ 1`,
//!    `|delta_y| ≤ 1` and the corrected blob sigma stays below
//!    [`MAX_REFINED_SIGMA`].
//!
//! Rejections are a filtering step: callers get `None` (or the reason through
//! [`Refiner::refine_checked`]), never an error.
use crate::pyramid::{DogStack, ScaleSchedule};
use crate::types::Candidate;
use log::trace;
use nalgebra::{Matrix3, Vector3};
use serde::Serialize;

/// Upper bound on the corrected octave-local blob sigma.
pub const MAX_REFINED_SIGMA: f32 = 8.0;

const SIXTH: f32 = 1.0 / 6.0;
const THIRD: f32 = 1.0 / 3.0;
const NINTH: f32 = 1.0 / 9.0;

/// Centre value of the least-squares quadratic through a 3×3 patch.
#[rustfmt::skip]
pub const SMOOTH: [f32; 9] = [
    -NINTH, 2.0 * NINTH, -NINTH,
    2.0 * NINTH, 5.0 * NINTH, 2.0 * NINTH,
    -NINTH, 2.0 * NINTH, -NINTH,
];
#[rustfmt::skip]
pub const D_X: [f32; 9] = [
    -SIXTH, 0.0, SIXTH,
    -SIXTH, 0.0, SIXTH,
    -SIXTH, 0.0, SIXTH,
];
#[rustfmt::skip]
pub const D_Y: [f32; 9] = [
    -SIXTH, -SIXTH, -SIXTH,
    0.0, 0.0, 0.0,
    SIXTH, SIXTH, SIXTH,
];
#[rustfmt::skip]
pub const D_XX: [f32; 9] = [
    THIRD, -2.0 * THIRD, THIRD,
    THIRD, -2.0 * THIRD, THIRD,
    THIRD, -2.0 * THIRD, THIRD,
];
#[rustfmt::skip]
pub const D_YY: [f32; 9] = [
    THIRD, THIRD, THIRD,
    -2.0 * THIRD, -2.0 * THIRD, -2.0 * THIRD,
    THIRD, THIRD, THIRD,
];
#[rustfmt::skip]
pub const D_XY: [f32; 9] = [
    0.25, 0.0, -0.25,
    0.0, 0.0, 0.0,
    -0.25, 0.0, 0.25,
];

/// Refined extremum in octave-local units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Refined {
    pub x: f32,
    pub y: f32,
    /// Fractional scale index `j - delta_s`.
    pub scale_index: f32,
    /// Blob sigma at the refined scale, octave-local pixels.
    pub sigma: f32,
}

/// Why a candidate was dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Rejection {
    /// Resolved scale index has no layer above or below.
    ScaleIndex,
    /// Too close to the layer border for a 3×3 patch with margin.
    Border,
    /// Hessian could not be inverted (flat or degenerate response).
    Singular,
    /// Newton step leaves the pixel neighbourhood.
    Correction,
    /// Corrected sigma above the cap (or not finite).
    Sigma,
}

/// Rejection tally of one refinement pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectionCounts {
    pub scale_index: usize,
    pub border: usize,
    pub singular: usize,
    pub correction: usize,
    pub sigma: usize,
}

impl RejectionCounts {
    pub fn record(&mut self, reason: Rejection) {
        match reason {
            Rejection::ScaleIndex => self.scale_index += 1,
            Rejection::Border => self.border += 1,
            Rejection::Singular => self.singular += 1,
            Rejection::Correction => self.correction += 1,
            Rejection::Sigma => self.sigma += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.scale_index + self.border + self.singular + self.correction + self.sigma
    }
}

/// Newton refiner with its acceptance thresholds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Refiner {
    pub max_sigma: f32,
}

impl Default for Refiner {
    fn default() -> Self {
        Self {
            max_sigma: MAX_REFINED_SIGMA,
        }
    }
}

impl Refiner {
    pub fn refine(
        &self,
        candidate: Candidate,
        dogs: &DogStack,
        schedule: &ScaleSchedule,
    ) -> Option<Refined> {
        self.refine_checked(candidate, dogs, schedule).ok()
    }

    pub fn refine_checked(
        &self,
        candidate: Candidate,
        dogs: &DogStack,
        schedule: &ScaleSchedule,
    ) -> Result<Refined, Rejection> {
        let Candidate { layer, y, x } = candidate;
        let (w, h) = (dogs.width(), dogs.height());

        let j = if layer < schedule.len() {
            schedule.resolve_index(schedule.sigma_abs(layer))
        } else {
            -1
        };
        if j <= 0 || j > schedule.scale_per_octave() as i64 || j as usize + 1 >= dogs.len() {
            trace!("refine: drop {candidate:?}, scale index {j}");
            return Err(Rejection::ScaleIndex);
        }
        let j = j as usize;
        if x < 2 || y < 2 || x + 2 >= w || y + 2 >= h {
            trace!("refine: drop {candidate:?}, border");
            return Err(Rejection::Border);
        }

        let prev = patch(dogs, j - 1, y, x);
        let cur = patch(dogs, j, y, x);
        let next = patch(dogs, j + 1, y, x);

        let dx = dot(&D_X, &cur);
        let dy = dot(&D_Y, &cur);
        let d2x = dot(&D_XX, &cur);
        let d2y = dot(&D_YY, &cur);
        let dxy = dot(&D_XY, &cur);

        let s_prev = dot(&SMOOTH, &prev);
        let s_cur = dot(&SMOOTH, &cur);
        let s_next = dot(&SMOOTH, &next);
        let ds = 0.5 * (s_next - s_prev);
        let d2s = s_next + s_prev - 2.0 * s_cur;

        let dxs = 0.5 * (dot(&D_X, &next) - dot(&D_X, &prev));
        let dys = 0.5 * (dot(&D_Y, &next) - dot(&D_Y, &prev));

        #[rustfmt::skip]
        let hessian = Matrix3::new(
            d2y, dxy, dys,
            dxy, d2x, dxs,
            dys, dxs, d2s,
        );
        let gradient = Vector3::new(dy, dx, ds);
        let delta = match hessian.lu().solve(&gradient) {
            Some(d) if d.iter().all(|v| v.is_finite()) => d,
            _ => {
                trace!("refine: drop {candidate:?}, singular hessian");
                return Err(Rejection::Singular);
            }
        };
        let (delta_y, delta_x, delta_s) = (delta[0], delta[1], delta[2]);

        if delta_y.hypot(delta_x) >= std::f32::consts::SQRT_2
            || delta_x.abs() > 1.0
            || delta_y.abs() > 1.0
        {
            trace!("refine: drop {candidate:?}, step ({delta_x:.3}, {delta_y:.3})");
            return Err(Rejection::Correction);
        }

        let scale_index = j as f32 - delta_s;
        let sigma = blob_sigma(schedule, scale_index);
        if !sigma.is_finite() || sigma > self.max_sigma {
            trace!("refine: drop {candidate:?}, sigma {sigma}");
            return Err(Rejection::Sigma);
        }

        Ok(Refined {
            x: x as f32 - delta_x,
            y: y as f32 - delta_y,
            scale_index,
            sigma,
        })
    }
}

/// Blob sigma seen by DoG layer `scale_index`.
///
/// A DoG layer spans blurs `i` and `i + 1`; its response peaks for blobs at
/// the geometric midpoint of the two.
pub fn blob_sigma(schedule: &ScaleSchedule, scale_index: f32) -> f32 {
    schedule.sigma_at(scale_index + 0.5)
}

fn patch(dogs: &DogStack, layer: usize, y: usize, x: usize) -> [f32; 9] {
    let img = dogs.layer(layer);
    let mut out = [0.0f32; 9];
    for (k, v) in out.iter_mut().enumerate() {
        *v = img.get(x + k % 3 - 1, y + k / 3 - 1);
    }
    out
}

#[inline]
fn dot(kernel: &[f32; 9], patch: &[f32; 9]) -> f32 {
    kernel.iter().zip(patch).map(|(k, p)| k * p).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::ImageF32;

    /// DoG stack holding an exact quadratic peak centred at `(l0, y0, x0)`.
    fn quadratic_stack(schedule: &ScaleSchedule, w: usize, centre: [f32; 3]) -> DogStack {
        let [l0, y0, x0] = centre;
        DogStack::new(
            (0..schedule.dog_layers())
                .map(|l| {
                    ImageF32::from_fn(w, w, |x, y| {
                        let (dl, dy, dx) = (l as f32 - l0, y as f32 - y0, x as f32 - x0);
                        1.0 - 0.05 * dx * dx - 0.08 * dy * dy - 0.1 * dl * dl + 0.01 * dx * dy
                    })
                })
                .collect(),
        )
    }

    fn default_schedule() -> ScaleSchedule {
        ScaleSchedule::new(0.5, 1.0, 2).unwrap()
    }

    #[test]
    fn kernels_are_exact_on_quadratics() {
        // f = 3 + 2x - y + x² + 0.5 xy - 2 y², patch rows are y = -1..1.
        let f = |x: f32, y: f32| 3.0 + 2.0 * x - y + x * x + 0.5 * x * y - 2.0 * y * y;
        let mut p = [0.0f32; 9];
        for (k, v) in p.iter_mut().enumerate() {
            *v = f((k % 3) as f32 - 1.0, (k / 3) as f32 - 1.0);
        }
        assert!((dot(&SMOOTH, &p) - 3.0).abs() < 1e-5);
        assert!((dot(&D_X, &p) - 2.0).abs() < 1e-5);
        assert!((dot(&D_Y, &p) + 1.0).abs() < 1e-5);
        assert!((dot(&D_XX, &p) - 2.0).abs() < 1e-5);
        assert!((dot(&D_YY, &p) + 4.0).abs() < 1e-5);
        assert!((dot(&D_XY, &p) - 0.5).abs() < 1e-5);
    }

    #[test]
    fn recovers_subpixel_offset() {
        let schedule = default_schedule();
        let dogs = quadratic_stack(&schedule, 21, [1.3, 9.7, 10.4]);
        let r = Refiner::default()
            .refine(Candidate { layer: 1, y: 10, x: 10 }, &dogs, &schedule)
            .expect("accepted");
        assert!((r.x - 10.4).abs() < 1e-3, "x = {}", r.x);
        assert!((r.y - 9.7).abs() < 1e-3, "y = {}", r.y);
        assert!((r.scale_index - 1.3).abs() < 1e-3, "s = {}", r.scale_index);
        assert!((r.sigma - blob_sigma(&schedule, 1.3)).abs() < 1e-3);
    }

    #[test]
    fn large_step_is_rejected() {
        let schedule = default_schedule();
        let dogs = quadratic_stack(&schedule, 21, [1.0, 10.0, 11.6]);
        let c = Candidate { layer: 1, y: 10, x: 10 };
        assert_eq!(
            Refiner::default().refine_checked(c, &dogs, &schedule),
            Err(Rejection::Correction)
        );
    }

    #[test]
    fn border_and_outer_layers_are_rejected() {
        let schedule = default_schedule();
        let dogs = quadratic_stack(&schedule, 21, [1.0, 10.0, 10.0]);
        let refiner = Refiner::default();
        for (y, x) in [(1, 10), (10, 1), (19, 10), (10, 19)] {
            let c = Candidate { layer: 1, y, x };
            assert_eq!(refiner.refine_checked(c, &dogs, &schedule), Err(Rejection::Border));
        }
        for layer in [0, 3] {
            let c = Candidate { layer, y: 10, x: 10 };
            assert_eq!(
                refiner.refine_checked(c, &dogs, &schedule),
                Err(Rejection::ScaleIndex)
            );
        }
    }

    #[test]
    fn flat_response_is_singular() {
        let schedule = default_schedule();
        let dogs = DogStack::new(
            (0..schedule.dog_layers())
                .map(|_| ImageF32::from_fn(9, 9, |_, _| 0.5))
                .collect(),
        );
        let c = Candidate { layer: 1, y: 4, x: 4 };
        assert_eq!(
            Refiner::default().refine_checked(c, &dogs, &schedule),
            Err(Rejection::Singular)
        );
    }

    #[test]
    fn sigma_cap_applies_to_corrected_scale() {
        let schedule = ScaleSchedule::new(4.0, 8.0, 2).unwrap();
        let refiner = Refiner::default();
        // sigma_at(1.5) = 4·2^0.75 ≈ 6.7 is kept, sigma_at(2.5) ≈ 9.5 is not.
        let low = quadratic_stack(&schedule, 21, [1.0, 10.0, 10.0]);
        assert!(refiner
            .refine(Candidate { layer: 1, y: 10, x: 10 }, &low, &schedule)
            .is_some());
        let high = quadratic_stack(&schedule, 21, [2.0, 10.0, 10.0]);
        assert_eq!(
            refiner.refine_checked(Candidate { layer: 2, y: 10, x: 10 }, &high, &schedule),
            Err(Rejection::Sigma)
        );
    }

    #[test]
    fn rejection_counts_tally() {
        let mut counts = RejectionCounts::default();
        counts.record(Rejection::Border);
        counts.record(Rejection::Border);
        counts.record(Rejection::Sigma);
        assert_eq!(counts.border, 2);
        assert_eq!(counts.total(), 3);
    }
}
