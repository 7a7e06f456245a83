use std::path::Path;

use opencv::core::Mat;
use opencv::prelude::*;
use opencv::videoio::{VideoCapture, CAP_ANY, CAP_PROP_FPS, CAP_PROP_FRAME_COUNT, CAP_PROP_POS_FRAMES};

use crate::error::{Error, Result};

/// Random access source of BGR frames.
pub trait FrameSource {
    fn frame_count(&self) -> usize;
    fn fps(&self) -> f64;
    /// Reads frame `index`. Fails rather than handing back some other frame.
    fn read_frame(&mut self, index: usize) -> Result<Mat>;
}

/// Video file decoded by OpenCV.
pub struct VideoFile {
    cap: VideoCapture,
    frame_count: usize,
    fps: f64,
    /// Index the next plain read returns, if known.
    position: Option<usize>,
}

impl VideoFile {
    pub fn open(path: &Path) -> Result<Self> {
        let name = path
            .to_str()
            .ok_or_else(|| Error::Video(format!("{} is not valid UTF-8", path.display())))?;
        let cap = VideoCapture::from_file(name, CAP_ANY)?;
        if !cap.is_opened()? {
            return Err(Error::Video(format!("failed to open {name}")));
        }
        let frame_count = cap.get(CAP_PROP_FRAME_COUNT)?.max(0.0) as usize;
        let fps = cap.get(CAP_PROP_FPS)?;
        log::info!("Opened {name}: {frame_count} frames at {fps} fps");
        Ok(VideoFile {
            cap,
            frame_count,
            fps,
            position: Some(0),
        })
    }
}

impl FrameSource for VideoFile {
    fn frame_count(&self) -> usize {
        self.frame_count
    }

    fn fps(&self) -> f64 {
        self.fps
    }

    fn read_frame(&mut self, index: usize) -> Result<Mat> {
        if index >= self.frame_count {
            return Err(Error::FrameRead {
                index,
                reason: format!("video has {} frames", self.frame_count),
            });
        }
        // Seeking is slow, sequential reads skip it.
        if self.position != Some(index) {
            self.cap.set(CAP_PROP_POS_FRAMES, index as f64)?;
        }

        let mut frame = Mat::default();
        match self.cap.read(&mut frame) {
            Ok(true) if frame.rows() > 0 && frame.cols() > 0 => {
                self.position = Some(index + 1);
                Ok(frame)
            }
            Ok(_) => {
                self.position = None;
                Err(Error::FrameRead {
                    index,
                    reason: "decoder returned no image".to_owned(),
                })
            }
            Err(e) => {
                self.position = None;
                Err(Error::FrameRead {
                    index,
                    reason: e.to_string(),
                })
            }
        }
    }
}
