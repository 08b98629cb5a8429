mod common;

use blob_detector::extrema::ReferenceExtrema;
use blob_detector::image::{ImageF32, Mask};
use blob_detector::{BlobDetector, BlobParams, Keypoint};
use common::synthetic_image::{gaussian_bump_frame, quadrant_pattern, Bump};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn run(frame: &ImageF32, mask: Option<&Mask>, params: BlobParams, octaves: usize) -> BlobDetector {
    let mut detector = BlobDetector::new(frame, mask, params).expect("valid input");
    detector.process(octaves).expect("octaves run");
    detector
}

fn nearest(keypoints: &[Keypoint], x: f32, y: f32) -> Option<(Keypoint, f32)> {
    keypoints
        .iter()
        .map(|kp| (*kp, kp.distance_to(x, y)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
}

#[test]
fn single_bump_yields_one_centred_keypoint() {
    init_logger();
    let frame = gaussian_bump_frame(512, 512, &[Bump::new(256.0, 256.0, 2.0)]);
    let detector = run(&frame, None, BlobParams::default(), 3);

    let close: Vec<&Keypoint> = detector
        .keypoints()
        .iter()
        .filter(|kp| kp.distance_to(256.0, 256.0) <= 1.0)
        .collect();
    assert_eq!(close.len(), 1, "keypoints: {:?}", detector.keypoints());
    let kp = close[0];
    assert!(
        (kp.scale - 4.0).abs() <= 0.2 * 4.0,
        "scale {} not within 20% of 4.0",
        kp.scale
    );
    assert!(kp.intensity > 0.0);
    assert!(detector.initial_dogs().is_some());
}

#[test]
fn every_quadrant_blob_is_found_with_growing_scale() {
    init_logger();
    let (frame, bumps) = quadrant_pattern();
    let detector = run(&frame, None, BlobParams::default(), 4);
    let keypoints = detector.keypoints();

    let mut scales = Vec::new();
    for b in &bumps {
        let (kp, dist) = nearest(keypoints, b.x, b.y).expect("at least one keypoint");
        assert!(
            dist < 3.0,
            "blob sigma={} at ({}, {}) missed, nearest {:?} at {dist:.2}px",
            b.sigma,
            b.x,
            b.y,
            kp
        );
        scales.push(kp.scale);
    }
    assert!(
        scales[0] < scales[3],
        "sigma 1 blob scale {} should be below sigma 4 blob scale {}",
        scales[0],
        scales[3]
    );
}

#[test]
fn unrefined_keypoints_sit_on_the_octave_grid() {
    init_logger();
    let (frame, _) = quadrant_pattern();
    let params = BlobParams {
        do_refine: false,
        ..BlobParams::default()
    };
    let detector = run(&frame, None, params, 4);
    assert!(!detector.keypoints().is_empty());

    let mut offset = 0;
    for report in detector.reports() {
        let factor = (1usize << report.octave) as f32;
        assert_eq!(report.reduction, factor);
        for kp in &detector.keypoints()[offset..offset + report.accepted] {
            assert_eq!((kp.x / factor).fract(), 0.0, "x={} at octave {}", kp.x, report.octave);
            assert_eq!((kp.y / factor).fract(), 0.0, "y={} at octave {}", kp.y, report.octave);
        }
        offset += report.accepted;
    }
    assert_eq!(offset, detector.keypoints().len());
}

#[test]
fn masked_blob_is_not_reported() {
    init_logger();
    let frame = gaussian_bump_frame(128, 128, &[Bump::new(64.0, 64.0, 2.0)]);
    let unmasked = run(&frame, None, BlobParams::default(), 3);
    assert!(unmasked
        .keypoints()
        .iter()
        .any(|kp| kp.distance_to(64.0, 64.0) < 2.0));

    let mut mask = Mask::new(128, 128);
    for y in 61..=67 {
        for x in 61..=67 {
            if (x as i32 - 64).pow(2) + (y as i32 - 64).pow(2) <= 9 {
                mask.set(x, y, true);
            }
        }
    }
    let masked = run(&frame, Some(&mask), BlobParams::default(), 3);
    assert!(
        masked
            .keypoints()
            .iter()
            .all(|kp| kp.distance_to(64.0, 64.0) > 5.0),
        "keypoints: {:?}",
        masked.keypoints()
    );
}

#[test]
fn repeated_runs_are_identical() {
    let (frame, _) = quadrant_pattern();
    let a = run(&frame, None, BlobParams::default(), 3).into_keypoints();
    let b = run(&frame, None, BlobParams::default(), 3).into_keypoints();
    assert!(!a.is_empty());
    assert_eq!(a, b);
}

#[test]
fn extrema_backends_agree_end_to_end() {
    let (frame, _) = quadrant_pattern();
    let default_run = run(&frame, None, BlobParams::default(), 3);
    let mut reference = BlobDetector::new(&frame, None, BlobParams::default())
        .expect("valid input")
        .with_extrema_detector(Box::new(ReferenceExtrema));
    let report = reference.process(3).expect("octaves run");
    assert!(report
        .octaves
        .iter()
        .all(|o| o.extrema_backend == "reference"));
    assert_eq!(default_run.keypoints(), reference.keypoints());
}

#[test]
fn octaves_can_be_driven_one_at_a_time() {
    let frame = gaussian_bump_frame(128, 128, &[Bump::new(64.0, 64.0, 2.0)]);
    let batch = run(&frame, None, BlobParams::default(), 3);

    let mut stepwise = BlobDetector::new(&frame, None, BlobParams::default()).expect("valid input");
    stepwise.one_octave(true).expect("octave 0");
    stepwise.one_octave(true).expect("octave 1");
    stepwise.one_octave(false).expect("octave 2");
    assert_eq!(batch.keypoints(), stepwise.keypoints());
}

#[test]
fn report_serializes_to_json() {
    let frame = gaussian_bump_frame(64, 64, &[Bump::new(32.0, 32.0, 1.5)]);
    let mut detector = BlobDetector::new(&frame, None, BlobParams::default()).expect("valid input");
    let report = detector.process(2).expect("octaves run");
    let json = serde_json::to_value(&report).expect("serializable");
    assert_eq!(json["input"]["width"], 64);
    assert_eq!(json["octaves"].as_array().map(Vec::len), Some(2));
    assert!(json["octaves"][0]["timings"]["totalMs"].is_number());
    assert_eq!(json["initialDogs"]["layers"].as_array().map(Vec::len), Some(4));
}
