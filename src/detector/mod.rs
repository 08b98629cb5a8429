//! Blob detector orchestrating the octave loop.
//!
//! Overview
//! - Ingests a frame as `ln(intensity)` with a validity mask (border,
//!   non-positive pixels, optional caller mask) grown by a disk dilation.
//! - Per octave: Gaussian blur cascade following the [`ScaleSchedule`], DoG
//!   stack, local extrema over `(scale, y, x)`, Newton refinement, keypoints
//!   lifted to input-frame coordinates.
//! - Between octaves the blur layer at `dest_sigma` is binned 2×2, the mask
//!   OR-binned and re-grown, and the reduction factor doubles.
//!
//! Modules
//! - [`params`] – the flat parameter set.
//! - `pipeline` – the [`BlobDetector`] octave driver.
//! - `state` – [`OctaveState`], the stage the driver has reached.
//!
//! [`ScaleSchedule`]: crate::pyramid::ScaleSchedule

pub mod params;
mod pipeline;
mod state;

pub use params::BlobParams;
pub use pipeline::{BlobDetector, MIN_OCTAVE_SIZE};
pub use state::OctaveState;
