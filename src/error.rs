use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the blob detector.
///
/// Only malformed input or configuration is reported here. Candidates that
/// fail refinement are filtered out silently and never surface as errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BlobError {
    #[error("invalid parameters: {0}")]
    InvalidParams(String),
    #[error("mask shape {mask:?} does not match image shape {image:?}")]
    ShapeMismatch {
        image: (usize, usize),
        mask: (usize, usize),
    },
    #[error("image of {width}x{height} pixels is too small for blob detection")]
    EmptyImage { width: usize, height: usize },
    #[error("octave {octave} image of {width}x{height} pixels is too small to process")]
    ImageTooSmall {
        octave: usize,
        width: usize,
        height: usize,
    },
    #[error("detector cannot run another octave: {0}")]
    InvalidState(&'static str),
    #[error("failed to access {}: {message}", path.display())]
    Io { path: PathBuf, message: String },
    #[error("failed to parse config {}: {message}", path.display())]
    Config { path: PathBuf, message: String },
}

impl BlobError {
    pub(crate) fn io(path: &std::path::Path, err: impl std::fmt::Display) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }
}
