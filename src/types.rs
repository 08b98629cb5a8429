use serde::{Deserialize, Serialize};

/// Integer scale-space location flagged by the extrema detector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Candidate {
    /// DoG layer index within the octave.
    pub layer: usize,
    pub y: usize,
    pub x: usize,
}

/// Detected blob in input-frame pixel coordinates.
///
/// `scale` is the squared blob sigma (pixels²); `intensity` is the DoG
/// response at the integer location the blob was detected at.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    pub scale: f32,
    pub intensity: f32,
}

impl Keypoint {
    /// Blob sigma in input-frame pixels.
    pub fn sigma(&self) -> f32 {
        self.scale.max(0.0).sqrt()
    }

    pub fn distance_to(&self, x: f32, y: f32) -> f32 {
        ((self.x - x).powi(2) + (self.y - y).powi(2)).sqrt()
    }
}
