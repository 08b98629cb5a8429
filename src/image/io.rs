//! I/O helpers for detector frames, masks and JSON.
//!
//! - `load_intensity_image`: read a PNG/TIFF frame into an `ImageF32` holding
//!   raw 16-bit counts (no normalisation, the detector works on `ln(counts)`).
//! - `load_mask_image`: read a mask frame, any non-zero pixel is invalid.
//! - `save_normalized_f32`: write an `ImageF32` (e.g. a DoG layer) as an
//!   8-bit PNG stretched to its min/max range.
//! - `write_json_file`: pretty-print a serializable value to disk.
use super::{ImageF32, ImageView, Mask};
use crate::error::BlobError;
use image::{GrayImage, Luma};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Load a frame from disk and keep its luminance counts as floats.
pub fn load_intensity_image(path: &Path) -> Result<ImageF32, BlobError> {
    let img = image::open(path)
        .map_err(|e| BlobError::io(path, e))?
        .into_luma16();
    let (w, h) = (img.width() as usize, img.height() as usize);
    let data = img.into_raw().into_iter().map(f32::from).collect();
    ImageF32::from_vec(w, h, data)
}

/// Load a mask frame; non-zero pixels are flagged invalid.
pub fn load_mask_image(path: &Path) -> Result<Mask, BlobError> {
    let img = image::open(path)
        .map_err(|e| BlobError::io(path, e))?
        .into_luma8();
    let (w, h) = (img.width() as usize, img.height() as usize);
    let data = img.into_raw().into_iter().map(|v| v != 0).collect();
    Mask::from_raw(w, h, data)
}

/// Save a float image to a grayscale PNG, stretching `[min, max]` to `[0, 255]`.
pub fn save_normalized_f32(image: &ImageF32, path: &Path) -> Result<(), BlobError> {
    ensure_parent_dir(path)?;
    let (lo, hi) = image
        .rows()
        .flat_map(|r| r.iter().copied())
        .filter(|v| v.is_finite())
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    let span = if hi > lo { hi - lo } else { 1.0 };
    let mut out = GrayImage::new(image.w as u32, image.h as u32);
    for y in 0..image.h {
        for (x, &px) in image.row(y).iter().enumerate() {
            let v = ((px - lo) / span * 255.0).clamp(0.0, 255.0);
            out.put_pixel(x as u32, y as u32, Luma([v as u8]));
        }
    }
    out.save(path).map_err(|e| BlobError::io(path, e))
}

/// Serialize a value as pretty JSON to `path`, creating parent directories.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<(), BlobError> {
    ensure_parent_dir(path)?;
    let json = serde_json::to_string_pretty(value).map_err(|e| BlobError::io(path, e))?;
    fs::write(path, json).map_err(|e| BlobError::io(path, e))
}

fn ensure_parent_dir(path: &Path) -> Result<(), BlobError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| BlobError::io(parent, e))?;
        }
    }
    Ok(())
}
