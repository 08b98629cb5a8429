use crate::image::traits::ImageView;
use crate::pyramid::{DogStack, ScaleSchedule};
use serde::{Deserialize, Serialize};

/// Response statistics of one DoG layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DogLayerReport {
    pub layer: usize,
    /// Blur of the two images the layer was subtracted from.
    pub sigma_lo: f32,
    pub sigma_hi: f32,
    pub min: f32,
    pub max: f32,
    pub mean: f32,
}

/// Summary of a DoG stack, used for the retained first-octave stack.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DogStackReport {
    pub width: usize,
    pub height: usize,
    pub layers: Vec<DogLayerReport>,
}

impl DogStackReport {
    pub fn from_stack(dogs: &DogStack, schedule: &ScaleSchedule) -> Self {
        let layers = dogs
            .layers
            .iter()
            .enumerate()
            .map(|(index, layer)| {
                let (lo, hi) = layer
                    .rows()
                    .flat_map(|r| r.iter().copied())
                    .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| {
                        (lo.min(v), hi.max(v))
                    });
                DogLayerReport {
                    layer: index,
                    sigma_lo: schedule.sigma_abs(index),
                    sigma_hi: schedule.sigma_abs(index + 1),
                    min: lo,
                    max: hi,
                    mean: layer.mean(),
                }
            })
            .collect();
        Self {
            width: dogs.width(),
            height: dogs.height(),
            layers,
        }
    }
}
