use std::path::Path;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the height extraction pipeline.
///
/// Empty slices are not errors, they come back as `None` extents.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read frame {index}: {reason}")]
    FrameRead { index: usize, reason: String },

    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    #[error("Video source error: {0}")]
    Video(String),

    #[error("Malformed table: {0}")]
    Table(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("OpenCV error: {0}")]
    OpenCv(#[from] opencv::Error),
}

impl Error {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    pub fn table<S: Into<String>>(msg: S) -> Self {
        Self::Table(msg.into())
    }

    /// Names the file a config or parse error came from. Other errors pass through.
    pub fn in_file(self, path: &Path) -> Self {
        match self {
            Self::Config(msg) => Self::Config(format!("{}: {msg}", path.display())),
            Self::Toml(e) => Self::Config(format!("{}: {e}", path.display())),
            Self::Json(e) => Self::Config(format!("{}: {e}", path.display())),
            other => other,
        }
    }
}
