use blob_detector::config::blob_demo::{self, RuntimeConfig};
use blob_detector::diagnostics::DetectionReport;
use blob_detector::image::io::{
    load_intensity_image, load_mask_image, save_normalized_f32, write_json_file,
};
use blob_detector::{BlobDetector, BlobError, Keypoint};
use serde::Serialize;
use std::env;
use std::path::Path;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let config_path = env::args().nth(1).ok_or_else(usage)?;
    let config = blob_demo::load_config(Path::new(&config_path)).map_err(|e| e.to_string())?;
    detect(&config).map_err(|e| e.to_string())
}

fn detect(config: &RuntimeConfig) -> Result<(), BlobError> {
    let frame = load_intensity_image(&config.input_path)?;
    let mask = config
        .mask_path
        .as_deref()
        .map(load_mask_image)
        .transpose()?;

    let mut detector = BlobDetector::new(&frame, mask.as_ref(), config.params.clone())?;
    let report = detector.process(config.octaves.max(1))?;
    print_summary(&report);

    if let Some(dir) = &config.output.dog_dir {
        if let Some(dogs) = detector.initial_dogs() {
            for (i, layer) in dogs.layers.iter().enumerate() {
                save_normalized_f32(layer, &dir.join(format!("dog_{i:02}.png")))?;
            }
            println!("First-octave DoG layers written to {}", dir.display());
        }
    }

    let output = BlobDemoOutput {
        report,
        keypoints: detector.keypoints(),
    };
    match &config.output.json_out {
        Some(path) => {
            write_json_file(path, &output)?;
            println!("JSON report written to {}", path.display());
        }
        None => {
            let json = serde_json::to_string_pretty(&output).map_err(|e| BlobError::Io {
                path: "<stdout>".into(),
                message: e.to_string(),
            })?;
            println!("{json}");
        }
    }
    Ok(())
}

fn print_summary(report: &DetectionReport) {
    println!("Blob detection summary");
    println!("  input: {}x{}", report.input.width, report.input.height);
    for o in &report.octaves {
        println!(
            "  octave {}: {}x{} x{} candidates={} keypoints={} ({:.2} ms, {})",
            o.octave,
            o.width,
            o.height,
            o.reduction,
            o.candidates,
            o.accepted,
            o.timings.total_ms,
            o.extrema_backend
        );
    }
    println!("  keypoints: {}", report.total_keypoints);
    println!("  total_ms: {:.3}", report.total_ms);
}

fn usage() -> String {
    "Usage: blob_demo <config.json>".to_string()
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BlobDemoOutput<'a> {
    report: DetectionReport,
    keypoints: &'a [Keypoint],
}
