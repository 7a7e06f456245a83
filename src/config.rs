use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::row::RowParams;

/// What to do with a frame that cannot be read or processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FramePolicy {
    /// Log it and leave its row out.
    #[default]
    Skip,
    /// Stop the batch.
    Abort,
}

/// Run settings, read from a TOML file.
///
/// ```toml
/// video = "data/ExperimentVideo.mp4"
/// out_dir = "out/video"
/// tank_settings = "out/video_tank_settings.json"
/// markers = "out/video_markers.json"
/// slice_count = 7          # optional
/// scale_percent = 50.0     # optional, working resolution in % of the video
/// tank_height = 16.192     # optional, cm
/// workers = 0              # optional, 0 = one per core, 1 = no worker pool
/// row_zero_is_empty = true # optional
/// on_frame_error = "skip"  # optional, skip / abort
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    pub video: PathBuf,
    pub out_dir: PathBuf,
    pub tank_settings: PathBuf,
    pub markers: PathBuf,
    #[serde(default = "default_slice_count")]
    pub slice_count: usize,
    #[serde(default = "default_scale_percent")]
    pub scale_percent: f64,
    #[serde(default = "default_tank_height")]
    pub tank_height: f64,
    #[serde(default)]
    pub workers: usize,
    #[serde(default = "default_row_zero_is_empty")]
    pub row_zero_is_empty: bool,
    #[serde(default)]
    pub on_frame_error: FramePolicy,
}

fn default_slice_count() -> usize {
    7
}

fn default_scale_percent() -> f64 {
    50.0
}

fn default_tank_height() -> f64 {
    16.192
}

fn default_row_zero_is_empty() -> bool {
    true
}

impl RunConfig {
    pub fn parse(content: &str) -> Result<Self> {
        let config: RunConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content).map_err(|e| e.in_file(path))
    }

    pub fn validate(&self) -> Result<()> {
        if self.slice_count == 0 {
            return Err(Error::config("slice_count must be at least 1"));
        }
        if !(self.scale_percent > 0.0 && self.scale_percent <= 100.0) {
            return Err(Error::config(format!(
                "scale_percent must be in (0, 100], got {}",
                self.scale_percent
            )));
        }
        if !(self.tank_height > 0.0) {
            return Err(Error::config(format!(
                "tank_height must be positive, got {}",
                self.tank_height
            )));
        }
        Ok(())
    }

    pub fn row_params(&self, fps: f64) -> RowParams {
        RowParams {
            slice_count: self.slice_count,
            fps,
            tank_height: self.tank_height,
            scale_percent: self.scale_percent,
            row_zero_is_empty: self.row_zero_is_empty,
        }
    }
}
