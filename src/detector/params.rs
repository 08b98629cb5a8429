//! Parameters configuring the blob detector.
//!
//! Every knob maps to one stage of the octave loop. Defaults suit
//! photon-counting detector frames where the input is essentially unblurred
//! (`cur_sigma = 0.25`).

use crate::error::BlobError;
use crate::extrema::Neighborhood;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlobParams {
    /// Estimated blur already present in the input.
    pub cur_sigma: f32,
    /// Blur at which each octave starts.
    pub init_sigma: f32,
    /// Blur at which the image is halved for the next octave.
    pub dest_sigma: f32,
    /// Scale steps between `init_sigma` and `dest_sigma` (>= 1).
    pub scale_per_octave: usize,
    /// Sub-pixel / sub-scale Newton refinement of every candidate.
    pub do_refine: bool,
    /// Use the 5×5×3 neighbourhood (38 conditions) instead of 3×3×3 (14).
    pub extended_neighborhood: bool,
}

impl Default for BlobParams {
    fn default() -> Self {
        Self {
            cur_sigma: 0.25,
            init_sigma: 0.5,
            dest_sigma: 1.0,
            scale_per_octave: 2,
            do_refine: true,
            extended_neighborhood: false,
        }
    }
}

impl BlobParams {
    pub fn validate(&self) -> Result<(), BlobError> {
        if !self.cur_sigma.is_finite() || self.cur_sigma < 0.0 {
            return Err(BlobError::InvalidParams(format!(
                "cur_sigma must be finite and non-negative, got {}",
                self.cur_sigma
            )));
        }
        if !self.init_sigma.is_finite() || self.init_sigma <= 0.0 {
            return Err(BlobError::InvalidParams(format!(
                "init_sigma must be positive, got {}",
                self.init_sigma
            )));
        }
        if !self.dest_sigma.is_finite() || self.dest_sigma <= self.init_sigma {
            return Err(BlobError::InvalidParams(format!(
                "dest_sigma ({}) must exceed init_sigma ({})",
                self.dest_sigma, self.init_sigma
            )));
        }
        if self.scale_per_octave == 0 {
            return Err(BlobError::InvalidParams(
                "scale_per_octave must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn neighborhood(&self) -> Neighborhood {
        Neighborhood::from_extended(self.extended_neighborhood)
    }

    /// Mask dilation radius applied once before the first octave.
    pub fn initial_grow_radius(&self) -> usize {
        (4.0 * self.dest_sigma) as usize
    }

    /// Mask dilation radius applied after every shrink.
    pub fn octave_grow_radius(&self) -> usize {
        (2.0 * self.dest_sigma) as usize
    }
}
