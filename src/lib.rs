#![doc = include_str!("../README.md")]

// Public modules (stable-ish surface)
pub mod detector;
pub mod diagnostics;
pub mod error;
pub mod image;
pub mod types;

// Stage-level building blocks, public for tools and tests.
pub mod config;
pub mod extrema;
pub mod pyramid;
pub mod refine;

// --- High-level re-exports -------------------------------------------------

pub use crate::detector::{BlobDetector, BlobParams, OctaveState};
pub use crate::error::BlobError;
pub use crate::types::{Candidate, Keypoint};

pub use crate::diagnostics::{DetectionReport, OctaveReport};

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use blob_detector::prelude::*;
///
/// # fn main() -> Result<(), BlobError> {
/// let (w, h) = (256usize, 256usize);
/// let frame = ImageF32::from_fn(w, h, |x, y| 1.0 + ((x ^ y) & 1) as f32);
///
/// let mut det = BlobDetector::new(&frame, None, BlobParams::default())?;
/// let report = det.process(3)?;
/// println!("keypoints={} total_ms={:.3}", report.total_keypoints, report.total_ms);
/// # Ok(())
/// # }
/// ```
pub mod prelude {
    pub use crate::image::{ImageF32, Mask};
    pub use crate::{BlobDetector, BlobError, BlobParams, Keypoint};
}

// --- Stage-level API (for tools & advanced users) --------------------------

pub mod stages {
    pub use crate::extrema::{
        default_detector, ConditionCounts, ExtremaDetector, ExtremaMap, Neighborhood,
        ReferenceExtrema,
    };
    #[cfg(feature = "parallel")]
    pub use crate::extrema::ParallelExtrema;
    pub use crate::pyramid::{
        bin2x2, gaussian_blur, BlurStage, DogStack, GaussianBlur, OctaveStack, ScaleSchedule,
    };
    pub use crate::refine::{Refined, Refiner, Rejection, RejectionCounts};

    pub use crate::diagnostics::{
        DogLayerReport, DogStackReport, InputDescriptor, StageTiming, TimingBreakdown,
    };
}
