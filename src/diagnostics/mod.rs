//! Diagnostics data model exposed by the detector and the demo binary.
//!
//! `DetectionReport` is the entry point returned by the detector. It bundles
//! one `OctaveReport` per octave run (sizes, candidate/keypoint counts,
//! refinement rejections and stage timings) and a summary of the retained
//! first-octave DoG stack.

pub mod octave;
pub mod pyramid;
pub mod timing;

pub use octave::{DetectionReport, InputDescriptor, OctaveReport};
pub use pyramid::{DogLayerReport, DogStackReport};
pub use timing::{elapsed_ms, StageTiming, TimingBreakdown};
