use opencv::core::{find_non_zero, Mat, Point, Vector};
use opencv::imgproc::bounding_rect;
use opencv::prelude::*;

use crate::error::Result;
use crate::region::PixelBounds;

/// Liquid found in one slice of one tank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceBounds {
    pub x_min: i32,
    pub x_max: i32,
    /// Top row and one past the bottom row of liquid, `None` when the slice is empty.
    pub extent: Option<(i32, i32)>,
}

impl SliceBounds {
    /// Finds the vertical extent of set pixels of `mask` within slice `slice_i` of `tank`.
    pub fn extract(
        mask: &Mat,
        tank: &PixelBounds,
        slice_i: usize,
        slice_count: usize,
    ) -> Result<Self> {
        let slice = tank.slice(slice_i, slice_count)?;
        // x stays half-open so slices tile, the tank's bottom row is part of every slice.
        let rows = PixelBounds {
            max_y: slice.max_y.saturating_add(1),
            ..slice
        };
        let extent = match rows.clamped_rect(mask.cols(), mask.rows()) {
            Some(rect) => {
                let slice_mask = Mat::roi(mask, rect)?;
                let mut points = Vector::<Point>::new();
                find_non_zero(&slice_mask, &mut points)?;
                if points.is_empty() {
                    None
                } else {
                    let bbox = bounding_rect(&points)?;
                    let top = rect.y + bbox.y;
                    Some((top, top + bbox.height))
                }
            }
            None => None,
        };

        Ok(SliceBounds {
            x_min: slice.min_x,
            x_max: slice.max_x,
            extent,
        })
    }

    /// Corner points as the CSV tooling has always seen them,
    /// `(x_min, 0), (x_max, 0)` standing in for an empty slice.
    pub fn corners(&self) -> ((i32, i32), (i32, i32)) {
        match self.extent {
            Some((top, bottom)) => ((self.x_min, top), (self.x_max, bottom)),
            None => ((self.x_min, 0), (self.x_max, 0)),
        }
    }
}
