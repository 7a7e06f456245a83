use itertools::Itertools;
use opencv::core::{Mat, Size};
use opencv::imgproc::{cvt_color, resize, COLOR_BGR2HSV, INTER_LINEAR};
use opencv::prelude::*;

use crate::error::{Error, Result};
use crate::height::HeightScale;
use crate::region::PixelBounds;
use crate::slice::SliceBounds;
use crate::tank::TankRegion;

/// Fixed parameters of a run, shared by every frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowParams {
    pub slice_count: usize,
    pub fps: f64,
    /// Physical tank height, cm.
    pub tank_height: f64,
    /// Working resolution as a percentage of the source.
    pub scale_percent: f64,
    pub row_zero_is_empty: bool,
}

/// Heights measured in one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputRow {
    pub frame: usize,
    /// Seconds since the start of the section.
    pub time: f64,
    /// (bottom, top) per slice and tank, slice-major.
    pub heights: Vec<(f64, f64)>,
}

impl OutputRow {
    pub fn to_csv_line(&self) -> String {
        let heights = self
            .heights
            .iter()
            .flat_map(|(bottom, top)| [bottom, top])
            .map(|h| format!("{h:?}"))
            .join(",");
        format!("{},{:?},{}", self.frame, self.time, heights)
    }
}

/// Table header for `tank_count` tanks split into `slice_count` slices.
/// "Min" is the bottom of the liquid and "Max" its top.
pub fn column_names(tank_count: usize, slice_count: usize) -> Vec<String> {
    let mut columns = vec!["Frame".to_owned(), "Time".to_owned()];
    for slice in 1..=slice_count {
        for tank in 1..=tank_count {
            columns.push(format!("Tank {tank} Slice {slice} Min"));
            columns.push(format!("Tank {tank} Slice {slice} Max"));
        }
    }
    columns
}

/// Turns raw frames into rows of liquid heights.
pub struct FrameRowCalculator {
    tanks: Vec<TankRegion>,
    params: RowParams,
}

impl FrameRowCalculator {
    pub fn new(tanks: Vec<TankRegion>, params: RowParams) -> Result<Self> {
        if tanks.is_empty() {
            return Err(Error::config("at least one tank is required"));
        }
        if params.slice_count == 0 {
            return Err(Error::config("slice count must be at least 1"));
        }
        if !(params.fps.is_finite() && params.fps > 0.0) {
            return Err(Error::config(format!("invalid frame rate {}", params.fps)));
        }
        if !(params.scale_percent > 0.0 && params.scale_percent <= 100.0) {
            return Err(Error::config(format!(
                "scale must be in (0, 100], got {}",
                params.scale_percent
            )));
        }
        Ok(FrameRowCalculator { tanks, params })
    }

    pub fn params(&self) -> &RowParams {
        &self.params
    }

    pub fn columns(&self) -> Vec<String> {
        column_names(self.tanks.len(), self.params.slice_count)
    }

    /// Resizes a BGR frame to the working resolution and converts it to HSV.
    pub fn working_frame(&self, raw: &Mat) -> Result<Mat> {
        let width = (raw.cols() as f64 * self.params.scale_percent / 100.0) as i32;
        let height = (raw.rows() as f64 * self.params.scale_percent / 100.0) as i32;
        if width <= 0 || height <= 0 {
            return Err(Error::config(format!(
                "{}% of a {}x{} frame leaves nothing to process",
                self.params.scale_percent,
                raw.cols(),
                raw.rows()
            )));
        }

        let mut hsv = Mat::default();
        if width == raw.cols() && height == raw.rows() {
            cvt_color(raw, &mut hsv, COLOR_BGR2HSV, 0)?;
        } else {
            let mut resized = Mat::default();
            resize(raw, &mut resized, Size::new(width, height), 0.0, 0.0, INTER_LINEAR)?;
            cvt_color(&resized, &mut hsv, COLOR_BGR2HSV, 0)?;
        }
        Ok(hsv)
    }

    /// Computes the row for frame `frame` of a section starting at `start_frame`.
    pub fn calculate(&self, raw: &Mat, frame: usize, start_frame: usize) -> Result<OutputRow> {
        let hsv = self.working_frame(raw)?;
        let (width, height) = (hsv.cols(), hsv.rows());

        let mut tanks: Vec<(PixelBounds, HeightScale, Mat)> = Vec::with_capacity(self.tanks.len());
        for tank in &self.tanks {
            let bounds = tank.pixel_bounds(width, height);
            let mut mask = Mat::default();
            tank.mask(&hsv, &mut mask)?;
            tanks.push((bounds, HeightScale::new(&bounds, self.params.tank_height), mask));
        }

        let slice_count = self.params.slice_count;
        let mut heights = Vec::with_capacity(slice_count * tanks.len());
        for slice_i in 0..slice_count {
            for (bounds, scale, mask) in &tanks {
                let slice = SliceBounds::extract(mask, bounds, slice_i, slice_count)?;
                heights.push(scale.extent_heights(slice.extent, self.params.row_zero_is_empty));
            }
        }

        Ok(OutputRow {
            frame,
            time: (frame as f64 - start_frame as f64) / self.params.fps,
            heights,
        })
    }
}
