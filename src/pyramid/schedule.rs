//! Geometric sigma schedule used inside every octave.
//!
//! Entry `i` carries the absolute blur `σ_i = σ_0 · r^(i/S)` with
//! `r = dest_sigma / init_sigma` and `S = scale_per_octave`, together with the
//! incremental blur that takes `σ_{i-1}` to `σ_i` (Gaussians compose by adding
//! variances). The schedule depends only on configuration, so it is computed
//! once per run and shared by all octaves.
use crate::error::BlobError;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleStep {
    /// Absolute blur reached after this step.
    pub sigma_abs: f32,
    /// Additional blur applied to the previous step (0 for the first entry).
    pub sigma_incr: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleSchedule {
    init_sigma: f32,
    dest_sigma: f32,
    scale_per_octave: usize,
    steps: Vec<ScaleStep>,
}

impl ScaleSchedule {
    pub fn new(
        init_sigma: f32,
        dest_sigma: f32,
        scale_per_octave: usize,
    ) -> Result<Self, BlobError> {
        if !(init_sigma.is_finite() && init_sigma > 0.0) {
            return Err(BlobError::InvalidParams(format!(
                "init_sigma must be positive, got {init_sigma}"
            )));
        }
        if !dest_sigma.is_finite() || dest_sigma <= init_sigma {
            return Err(BlobError::InvalidParams(format!(
                "dest_sigma ({dest_sigma}) must exceed init_sigma ({init_sigma})"
            )));
        }
        if scale_per_octave == 0 {
            return Err(BlobError::InvalidParams(
                "scale_per_octave must be at least 1".to_string(),
            ));
        }

        let ratio = dest_sigma / init_sigma;
        let spo = scale_per_octave as f32;
        let incr_factor = (ratio.powf(2.0 / spo) - 1.0).sqrt();

        let mut steps = Vec::with_capacity(scale_per_octave + 3);
        steps.push(ScaleStep {
            sigma_abs: init_sigma,
            sigma_incr: 0.0,
        });
        let mut previous = init_sigma;
        for i in 1..scale_per_octave + 3 {
            let sigma_abs = init_sigma * ratio.powf(i as f32 / spo);
            steps.push(ScaleStep {
                sigma_abs,
                sigma_incr: previous * incr_factor,
            });
            previous = sigma_abs;
        }

        Ok(Self {
            init_sigma,
            dest_sigma,
            scale_per_octave,
            steps,
        })
    }

    pub fn steps(&self) -> &[ScaleStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Number of DoG layers produced per octave.
    pub fn dog_layers(&self) -> usize {
        self.steps.len() - 1
    }

    pub fn scale_per_octave(&self) -> usize {
        self.scale_per_octave
    }

    pub fn init_sigma(&self) -> f32 {
        self.init_sigma
    }

    pub fn dest_sigma(&self) -> f32 {
        self.dest_sigma
    }

    /// `dest_sigma / init_sigma`, the blur growth over one octave.
    pub fn ratio(&self) -> f32 {
        self.dest_sigma / self.init_sigma
    }

    /// Absolute sigma of schedule entry `index`.
    pub fn sigma_abs(&self, index: usize) -> f32 {
        self.steps[index].sigma_abs
    }

    /// Absolute sigma at a fractional schedule position (geometric interpolation).
    pub fn sigma_at(&self, index: f32) -> f32 {
        self.init_sigma * self.ratio().powf(index / self.scale_per_octave as f32)
    }

    /// Octave-local scale index of an absolute sigma:
    /// `round(log2(sigma / σ_0) · scale_per_octave)`.
    pub fn resolve_index(&self, sigma: f32) -> i64 {
        ((sigma / self.init_sigma).log2() * self.scale_per_octave as f32).round() as i64
    }
}
