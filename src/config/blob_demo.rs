use crate::detector::BlobParams;
use crate::error::BlobError;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Default, Deserialize)]
pub struct OutputConfig {
    /// Report and keypoints as JSON. Printed to stdout when absent.
    pub json_out: Option<PathBuf>,
    /// Directory receiving the first-octave DoG layers as PNGs.
    pub dog_dir: Option<PathBuf>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RuntimeConfig {
    pub input_path: PathBuf,
    /// Optional mask frame, non-zero pixels are invalid.
    #[serde(default)]
    pub mask_path: Option<PathBuf>,
    #[serde(default = "default_octaves")]
    pub octaves: usize,
    #[serde(default)]
    pub params: BlobParams,
    #[serde(default)]
    pub output: OutputConfig,
}

fn default_octaves() -> usize {
    4
}

pub fn load_config(path: &Path) -> Result<RuntimeConfig, BlobError> {
    let contents = fs::read_to_string(path).map_err(|e| BlobError::io(path, e))?;
    parse_config(path, &contents)
}

fn parse_config(path: &Path, contents: &str) -> Result<RuntimeConfig, BlobError> {
    let config: RuntimeConfig = serde_json::from_str(contents).map_err(|e| BlobError::Config {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    config.params.validate()?;
    Ok(config)
}
