use blob_detector::image::ImageF32;

/// Circular Gaussian bump in log-intensity space.
#[derive(Clone, Copy, Debug)]
pub struct Bump {
    pub x: f32,
    pub y: f32,
    pub sigma: f32,
    pub amplitude: f32,
}

impl Bump {
    pub fn new(x: f32, y: f32, sigma: f32) -> Self {
        Self {
            x,
            y,
            sigma,
            amplitude: 1.0,
        }
    }
}

/// Frame whose natural log is the sum of `bumps` over a zero background.
///
/// The detector works on `ln(intensity)`, so a unit pedestal times
/// `exp(bump)` is the intensity counterpart of a plain Gaussian bump.
pub fn gaussian_bump_frame(width: usize, height: usize, bumps: &[Bump]) -> ImageF32 {
    assert!(width > 0 && height > 0, "image dimensions must be positive");
    ImageF32::from_fn(width, height, |x, y| {
        let log_value: f32 = bumps
            .iter()
            .map(|b| {
                let dx = x as f32 - b.x;
                let dy = y as f32 - b.y;
                b.amplitude * (-(dx * dx + dy * dy) / (2.0 * b.sigma * b.sigma)).exp()
            })
            .sum();
        log_value.exp()
    })
}

/// Four bumps of sigma 1..4 on a 256×256 frame, one per quadrant.
pub fn quadrant_pattern() -> (ImageF32, Vec<Bump>) {
    let bumps = vec![
        Bump::new(64.0, 64.0, 1.0),
        Bump::new(192.0, 64.0, 2.0),
        Bump::new(64.0, 192.0, 3.0),
        Bump::new(192.0, 192.0, 4.0),
    ];
    (gaussian_bump_frame(256, 256, &bumps), bumps)
}
