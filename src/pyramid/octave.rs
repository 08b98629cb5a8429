//! Blur cascade and Difference-of-Gaussians stack for one octave.
use super::filters::BlurStage;
use super::schedule::ScaleSchedule;
use crate::image::{ImageF32, ImageView};

/// DoG layers of one octave, indexed `(layer, y, x)`.
///
/// Layer `i` is `blur(i) - blur(i + 1)`, so bright blobs show up as maxima.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DogStack {
    pub layers: Vec<ImageF32>,
}

impl DogStack {
    pub fn new(layers: Vec<ImageF32>) -> Self {
        debug_assert!(layers
            .windows(2)
            .all(|p| p[0].dimensions() == p[1].dimensions()));
        Self { layers }
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn width(&self) -> usize {
        self.layers.first().map_or(0, |l| l.w)
    }

    pub fn height(&self) -> usize {
        self.layers.first().map_or(0, |l| l.h)
    }

    pub fn layer(&self, index: usize) -> &ImageF32 {
        &self.layers[index]
    }

    #[inline]
    pub fn get(&self, layer: usize, y: usize, x: usize) -> f32 {
        self.layers[layer].get(x, y)
    }
}

/// Blurred images and DoG stack produced by one pass over the schedule.
#[derive(Clone, Debug)]
pub struct OctaveStack {
    pub blurs: Vec<ImageF32>,
    pub dogs: DogStack,
}

impl OctaveStack {
    /// Run the blur cascade over `schedule`, starting from `base`.
    ///
    /// The first entry keeps `base` as is (it already sits at `init_sigma`);
    /// every later entry blurs the previous layer by its incremental sigma.
    pub fn build(base: ImageF32, schedule: &ScaleSchedule, blur: &dyn BlurStage) -> Self {
        let mut blurs = Vec::with_capacity(schedule.len());
        let mut dogs = Vec::with_capacity(schedule.dog_layers());
        blurs.push(base);
        for step in &schedule.steps()[1..] {
            let previous = blurs.last().expect("blur list starts with the base image");
            let next = blur.blur(previous, step.sigma_incr);
            dogs.push(previous.difference(&next));
            blurs.push(next);
        }
        Self {
            blurs,
            dogs: DogStack::new(dogs),
        }
    }

    pub fn into_parts(self) -> (Vec<ImageF32>, DogStack) {
        (self.blurs, self.dogs)
    }
}
