//! Octave driver running the blob detector end-to-end.
//!
//! [`BlobDetector`] owns the working image (log intensities), the validity
//! mask, the running reduction factor and the growing keypoint list. Each call
//! to [`BlobDetector::one_octave`] builds the DoG stack of the current octave,
//! extracts and refines its extrema, appends the keypoints in input-frame
//! coordinates and, when asked to, halves image and mask for the next call.
//!
//! Typical usage:
//! ```no_run
//! use blob_detector::{BlobDetector, BlobParams};
//! use blob_detector::image::ImageF32;
//!
//! # fn example(frame: ImageF32) -> Result<(), blob_detector::BlobError> {
//! let mut detector = BlobDetector::new(&frame, None, BlobParams::default())?;
//! let report = detector.process(4)?;
//! println!("{} keypoints in {:.1} ms", report.total_keypoints, report.total_ms);
//! for kp in detector.keypoints() {
//!     println!("({:.2}, {:.2}) sigma={:.2}", kp.x, kp.y, kp.sigma());
//! }
//! # Ok(())
//! # }
//! ```
use super::params::BlobParams;
use super::state::OctaveState;
use crate::diagnostics::{
    elapsed_ms, DetectionReport, DogStackReport, InputDescriptor, OctaveReport, TimingBreakdown,
};
use crate::error::BlobError;
use crate::extrema::{default_detector, ExtremaDetector, Neighborhood};
use crate::image::{ImageF32, ImageView, ImageViewMut, Mask};
use crate::pyramid::{
    bin2x2, BlurStage, DogStack, GaussianBlur, OctaveScaling, OctaveStack, ScaleSchedule,
};
use crate::refine::{blob_sigma, RejectionCounts, Refiner};
use crate::types::{Candidate, Keypoint};
use log::{debug, trace, warn};
use std::time::Instant;

/// Smallest octave side that leaves room for refinement patches.
pub const MIN_OCTAVE_SIZE: usize = 5;
const MIN_INPUT_SIZE: usize = 3;

/// Multi-scale Difference-of-Gaussians blob detector.
pub struct BlobDetector {
    params: BlobParams,
    schedule: ScaleSchedule,
    neighborhood: Neighborhood,
    extrema: Box<dyn ExtremaDetector>,
    blur: Box<dyn BlurStage>,
    refiner: Refiner,
    state: OctaveState,
    input: InputDescriptor,
    data: ImageF32,
    mask: Mask,
    scaling: OctaveScaling,
    keypoints: Vec<Keypoint>,
    initial_dogs: Option<DogStack>,
    reports: Vec<OctaveReport>,
}

impl BlobDetector {
    /// Ingest a frame of raw intensities.
    ///
    /// The detector works on `ln(image)`. Pixels that are non-positive, flagged
    /// by `mask`, or on the outer frame are invalid: their log value is set to
    /// zero and the mask is grown by `4 · dest_sigma` before the first octave.
    pub fn new(image: &ImageF32, mask: Option<&Mask>, params: BlobParams) -> Result<Self, BlobError> {
        params.validate()?;
        let schedule =
            ScaleSchedule::new(params.init_sigma, params.dest_sigma, params.scale_per_octave)?;
        if image.w < MIN_INPUT_SIZE || image.h < MIN_INPUT_SIZE {
            return Err(BlobError::EmptyImage {
                width: image.w,
                height: image.h,
            });
        }

        let mut invalid = Mask::from_nonpositive(image);
        if let Some(m) = mask {
            if (m.w, m.h) != (image.w, image.h) {
                return Err(BlobError::ShapeMismatch {
                    image: (image.w, image.h),
                    mask: (m.w, m.h),
                });
            }
            invalid.union(m)?;
        }
        invalid.mark_border();

        let mut data = ImageF32::new(image.w, image.h);
        for y in 0..image.h {
            let src = image.row(y);
            for (x, dst) in data.row_mut(y).iter_mut().enumerate() {
                *dst = if invalid.get(x, y) { 0.0 } else { src[x].ln() };
            }
        }
        let mask = invalid.dilate(params.initial_grow_radius());
        debug!(
            "BlobDetector::new {}x{} invalid={} grown={} schedule={:?}",
            image.w,
            image.h,
            invalid.count(),
            mask.count(),
            schedule.steps().iter().map(|s| s.sigma_abs).collect::<Vec<_>>()
        );

        Ok(Self {
            neighborhood: params.neighborhood(),
            params,
            schedule,
            extrema: default_detector(),
            blur: Box::new(GaussianBlur),
            refiner: Refiner::default(),
            state: OctaveState::Uninitialized,
            input: InputDescriptor {
                width: image.w,
                height: image.h,
            },
            data,
            mask,
            scaling: OctaveScaling::default(),
            keypoints: Vec::new(),
            initial_dogs: None,
            reports: Vec::new(),
        })
    }

    /// Swap the local-extrema backend.
    pub fn with_extrema_detector(mut self, extrema: Box<dyn ExtremaDetector>) -> Self {
        self.extrema = extrema;
        self
    }

    pub fn with_blur_stage(mut self, blur: Box<dyn BlurStage>) -> Self {
        self.blur = blur;
        self
    }

    pub fn with_refiner(mut self, refiner: Refiner) -> Self {
        self.refiner = refiner;
        self
    }

    /// Run up to `octaves` octaves, shrinking between them.
    ///
    /// Stops early (with a warning) once the shrunk image can no longer host
    /// an octave. Keypoints accumulate across calls.
    pub fn process(&mut self, octaves: usize) -> Result<DetectionReport, BlobError> {
        let start = Instant::now();
        for i in 0..octaves {
            if i > 0 && (self.data.w < MIN_OCTAVE_SIZE || self.data.h < MIN_OCTAVE_SIZE) {
                warn!(
                    "BlobDetector stopping at octave {}: {}x{} image is too small",
                    self.scaling.octave, self.data.w, self.data.h
                );
                break;
            }
            self.one_octave(i + 1 < octaves)?;
        }
        Ok(self.report(elapsed_ms(start)))
    }

    /// Process the current octave and optionally prepare the next one.
    pub fn one_octave(&mut self, shrink: bool) -> Result<OctaveReport, BlobError> {
        if !self.state.can_start_octave() {
            return Err(BlobError::InvalidState(
                "the previous octave did not shrink the image",
            ));
        }
        let octave = self.scaling.octave;
        let (width, height) = (self.data.w, self.data.h);
        if width < MIN_OCTAVE_SIZE || height < MIN_OCTAVE_SIZE {
            return Err(BlobError::ImageTooSmall {
                octave,
                width,
                height,
            });
        }
        let start = Instant::now();
        let mut timings = TimingBreakdown::default();

        if self.state == OctaveState::Uninitialized {
            let t = Instant::now();
            self.initial_blur();
            timings.push_since("initialBlur", t);
        }
        self.transition(OctaveState::Scheduled);

        let t = Instant::now();
        let base = std::mem::take(&mut self.data);
        let (mut blurs, dogs) =
            OctaveStack::build(base, &self.schedule, self.blur.as_ref()).into_parts();
        timings.push_since("dog", t);
        self.transition(OctaveState::Stacked);

        let t = Instant::now();
        let candidates = self
            .extrema
            .detect(&dogs, Some(&self.mask), self.neighborhood)
            .candidates();
        timings.push_since("extrema", t);
        self.transition(OctaveState::Extracted);

        let t = Instant::now();
        let before = self.keypoints.len();
        let rejections = self.append_keypoints(&candidates, &dogs);
        let accepted = self.keypoints.len() - before;
        timings.push_since("refine", t);
        self.transition(OctaveState::Refined);
        debug!(
            "BlobDetector octave {} {}x{} reduction={} candidates={} accepted={} rejected={}",
            octave,
            width,
            height,
            self.scaling.reduction,
            candidates.len(),
            accepted,
            rejections.total()
        );

        let dog_layers = dogs.len();
        let masked_pixels = self.mask.count();
        let reduction = self.scaling.reduction;
        if octave == 0 && self.initial_dogs.is_none() {
            self.initial_dogs = Some(dogs);
        }

        if shrink {
            let t = Instant::now();
            let next = blurs.swap_remove(self.schedule.scale_per_octave());
            self.data = bin2x2(&next);
            self.mask = self
                .mask
                .bin2x2()
                .dilate(self.params.octave_grow_radius());
            self.scaling = self.scaling.next();
            timings.push_since("shrink", t);
            self.transition(OctaveState::Shrunk);
        } else {
            self.data = blurs.swap_remove(0);
        }
        timings.total_ms = elapsed_ms(start);

        let report = OctaveReport {
            octave,
            width,
            height,
            reduction,
            dog_layers,
            masked_pixels,
            candidates: candidates.len(),
            accepted,
            rejections,
            extrema_backend: self.extrema.name().to_string(),
            shrunk: shrink,
            timings,
        };
        self.reports.push(report.clone());
        Ok(report)
    }

    /// Summary of everything processed so far.
    pub fn report(&self, total_ms: f64) -> DetectionReport {
        DetectionReport {
            input: self.input,
            params: self.params.clone(),
            octaves: self.reports.clone(),
            total_keypoints: self.keypoints.len(),
            initial_dogs: self
                .initial_dogs
                .as_ref()
                .map(|d| DogStackReport::from_stack(d, &self.schedule)),
            total_ms,
        }
    }

    pub fn keypoints(&self) -> &[Keypoint] {
        &self.keypoints
    }

    pub fn into_keypoints(self) -> Vec<Keypoint> {
        self.keypoints
    }

    /// DoG stack of the first octave, kept for inspection.
    pub fn initial_dogs(&self) -> Option<&DogStack> {
        self.initial_dogs.as_ref()
    }

    pub fn state(&self) -> OctaveState {
        self.state
    }

    /// Index of the octave the next call to `one_octave` will process.
    pub fn octave(&self) -> usize {
        self.scaling.octave
    }

    pub fn reduction(&self) -> f32 {
        self.scaling.reduction
    }

    /// Working image of the current octave (log intensities).
    pub fn image(&self) -> &ImageF32 {
        &self.data
    }

    pub fn mask(&self) -> &Mask {
        &self.mask
    }

    pub fn params(&self) -> &BlobParams {
        &self.params
    }

    pub fn schedule(&self) -> &ScaleSchedule {
        &self.schedule
    }

    pub fn reports(&self) -> &[OctaveReport] {
        &self.reports
    }

    fn initial_blur(&mut self) {
        let (init, cur) = (self.params.init_sigma, self.params.cur_sigma);
        if init > cur {
            let sigma = (init * init - cur * cur).sqrt();
            self.data = self.blur.blur(&self.data, sigma);
        }
        self.transition(OctaveState::Blurred);
    }

    fn append_keypoints(
        &mut self,
        candidates: &[Candidate],
        dogs: &DogStack,
    ) -> RejectionCounts {
        let mut rejections = RejectionCounts::default();
        let reduction = self.scaling.reduction;
        for &c in candidates {
            let (x, y, sigma) = if self.params.do_refine {
                match self.refiner.refine_checked(c, dogs, &self.schedule) {
                    Ok(r) => (r.x, r.y, r.sigma),
                    Err(reason) => {
                        rejections.record(reason);
                        continue;
                    }
                }
            } else {
                (c.x as f32, c.y as f32, blob_sigma(&self.schedule, c.layer as f32))
            };
            let [fx, fy] = self.scaling.to_full([x, y]);
            let full_sigma = sigma * reduction;
            self.keypoints.push(Keypoint {
                x: fx,
                y: fy,
                scale: full_sigma * full_sigma,
                intensity: dogs.get(c.layer, c.y, c.x),
            });
        }
        rejections
    }

    fn transition(&mut self, next: OctaveState) {
        trace!(
            "BlobDetector octave {}: {:?} -> {:?}",
            self.scaling.octave,
            self.state,
            next
        );
        self.state = next;
    }
}
