mod common;

use blob_detector::extrema::ExtremaDetector;
use blob_detector::image::{ImageF32, Mask};
use blob_detector::stages::{
    bin2x2, default_detector, gaussian_blur, GaussianBlur, Neighborhood, OctaveStack,
    ReferenceExtrema, Refiner, ScaleSchedule,
};
use common::synthetic_image::{gaussian_bump_frame, Bump};

/// Log image of a single bump, as the detector sees it after ingestion.
fn log_bump(size: usize, centre: f32, sigma: f32) -> ImageF32 {
    let frame = gaussian_bump_frame(size, size, &[Bump::new(centre, centre, sigma)]);
    ImageF32::from_fn(size, size, |x, y| frame.get(x, y).ln())
}

#[test]
fn dog_stack_peaks_at_blob_centre() {
    let schedule = ScaleSchedule::new(0.5, 1.0, 2).unwrap();
    let base = gaussian_blur(&log_bump(64, 32.0, 1.0), (0.5f32 * 0.5 - 0.25 * 0.25).sqrt());
    let (_, dogs) = OctaveStack::build(base, &schedule, &GaussianBlur).into_parts();
    assert_eq!(dogs.len(), schedule.dog_layers());

    let mut mask = Mask::new(64, 64);
    mask.mark_border();
    let map = default_detector().detect(&dogs, Some(&mask), Neighborhood::Basic);
    let candidates = map.candidates();
    assert!(!candidates.is_empty());
    assert!(candidates
        .iter()
        .all(|c| c.x.abs_diff(32) <= 1 && c.y.abs_diff(32) <= 1));
    assert!(candidates.iter().all(|c| c.layer > 0 && c.layer < dogs.len() - 1));

    let refiner = Refiner::default();
    for c in candidates {
        if let Some(r) = refiner.refine(c, &dogs, &schedule) {
            assert!((r.x - 32.0).abs() < 1.0 && (r.y - 32.0).abs() < 1.0, "{r:?}");
            assert!(r.sigma > 0.5 && r.sigma < 2.0, "{r:?}");
        }
    }
}

#[test]
fn extended_neighborhood_is_a_subset_of_basic() {
    let schedule = ScaleSchedule::new(0.5, 1.0, 2).unwrap();
    let frame = gaussian_bump_frame(
        96,
        96,
        &[
            Bump::new(30.0, 30.0, 1.0),
            Bump::new(66.0, 30.0, 1.5),
            Bump::new(48.0, 66.0, 2.0),
        ],
    );
    let base = ImageF32::from_fn(96, 96, |x, y| frame.get(x, y).ln());
    let (_, dogs) = OctaveStack::build(base, &schedule, &GaussianBlur).into_parts();
    let basic = ReferenceExtrema.detect(&dogs, None, Neighborhood::Basic);
    let extended = ReferenceExtrema.detect(&dogs, None, Neighborhood::Extended);
    for c in extended.candidates() {
        assert!(basic.get(c.layer, c.y, c.x), "{c:?} only in extended set");
        assert!(c.x >= 2 && c.y >= 2 && c.x < 94 && c.y < 94);
    }
}

#[test]
fn binned_blur_keeps_bump_position() {
    let img = log_bump(64, 32.0, 3.0);
    let half = bin2x2(&img);
    assert_eq!((half.w, half.h), (32, 32));
    // Pixel (16, 16) of the half-size image covers full-size 32..=33.
    let centre = half.get(16, 16);
    assert!(centre > half.get(12, 16) && centre > half.get(16, 12));
}
