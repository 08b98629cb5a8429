//! Scale-space construction: Gaussian blur stage, sigma schedule, per-octave
//! blur/DoG stacks and the 2× reduction linking consecutive octaves.
//!
//! Within an octave the image is blurred progressively following the
//! [`ScaleSchedule`]; consecutive blurs are subtracted into a [`DogStack`].
//! Between octaves the blur layer that reached `dest_sigma` is binned 2×2,
//! so the next octave starts again at `init_sigma` in its own pixel units.

pub mod filters;
pub mod octave;
pub mod scaling;
pub mod schedule;

pub use filters::{gaussian_blur, BlurStage, GaussianBlur, GaussianKernel, SeparableFilter};
pub use octave::{DogStack, OctaveStack};
pub use scaling::{bin2x2, OctaveScaling};
pub use schedule::{ScaleSchedule, ScaleStep};
