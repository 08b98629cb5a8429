use super::pyramid::DogStackReport;
use super::timing::TimingBreakdown;
use crate::detector::BlobParams;
use crate::refine::RejectionCounts;
use serde::Serialize;

/// Outcome of one pass of the octave loop.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OctaveReport {
    pub octave: usize,
    pub width: usize,
    pub height: usize,
    /// Octave-local to input-frame coordinate factor.
    pub reduction: f32,
    pub dog_layers: usize,
    /// Invalid pixels of the (dilated) octave mask.
    pub masked_pixels: usize,
    /// Extrema flagged before refinement.
    pub candidates: usize,
    /// Keypoints appended by this octave.
    pub accepted: usize,
    pub rejections: RejectionCounts,
    /// Name of the extrema backend that ran.
    pub extrema_backend: String,
    pub shrunk: bool,
    pub timings: TimingBreakdown,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputDescriptor {
    pub width: usize,
    pub height: usize,
}

/// Full run summary returned by [`BlobDetector::process`](crate::BlobDetector::process).
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionReport {
    pub input: InputDescriptor,
    pub params: BlobParams,
    pub octaves: Vec<OctaveReport>,
    pub total_keypoints: usize,
    /// Statistics of the retained first-octave DoG stack.
    pub initial_dogs: Option<DogStackReport>,
    pub total_ms: f64,
}
