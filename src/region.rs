use opencv::core::Rect;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Point in normalised frame coordinates, (0, 0) top left and (1, 1) bottom right.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormPoint(pub f64, pub f64);

/// Rectangle in pixel coordinates. Slicing treats max as exclusive along x,
/// a tank mask covers max as well (see [`PixelBounds::filled_rect`]).
/// Nothing stops max from being below min, such a rectangle is just empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelBounds {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl PixelBounds {
    /// Scales normalised corners to a raster of the given size, truncating toward zero.
    pub fn from_normalized(min: &NormPoint, max: &NormPoint, width: i32, height: i32) -> Self {
        PixelBounds {
            min_x: (min.0 * width as f64) as i32,
            min_y: (min.1 * height as f64) as i32,
            max_x: (max.0 * width as f64) as i32,
            max_y: (max.1 * height as f64) as i32,
        }
    }

    pub fn width(&self) -> i32 {
        self.max_x - self.min_x
    }

    /// Returns the bounds of vertical slice `slice_i` out of `slice_count`.
    ///
    /// Slices share the tank's vertical extent and split its x-range into equal
    /// widths, each endpoint truncated on its own. Neighbouring slices share the
    /// same computed endpoint so together they tile `[min_x, max_x)`.
    pub fn slice(&self, slice_i: usize, slice_count: usize) -> Result<PixelBounds> {
        if slice_count == 0 {
            return Err(Error::config("slice count must be at least 1"));
        }
        if slice_i >= slice_count {
            return Err(Error::config(format!(
                "slice {slice_i} out of range for {slice_count} slices"
            )));
        }

        let step = self.width() as f64 / slice_count as f64;
        let edge = |i: usize| (self.min_x as f64 + step * i as f64) as i32;
        let min_x = edge(slice_i);
        // step * n can land a hair under the width, which would leave a gap
        let max_x = if slice_i + 1 == slice_count {
            self.max_x
        } else {
            edge(slice_i + 1)
        };

        Ok(PixelBounds {
            min_x,
            min_y: self.min_y,
            max_x,
            max_y: self.max_y,
        })
    }

    /// Pixels a filled rectangle drawn from min to max covers, both corners included,
    /// clipped to a `width` x `height` raster.
    pub fn filled_rect(&self, width: i32, height: i32) -> Option<Rect> {
        PixelBounds {
            max_x: self.max_x.saturating_add(1),
            max_y: self.max_y.saturating_add(1),
            ..*self
        }
        .clamped_rect(width, height)
    }

    /// Intersection with a `width` x `height` raster, or `None` when nothing is left.
    pub fn clamped_rect(&self, width: i32, height: i32) -> Option<Rect> {
        let (x0, x1) = (self.min_x.clamp(0, width), self.max_x.clamp(0, width));
        let (y0, y1) = (self.min_y.clamp(0, height), self.max_y.clamp(0, height));
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(Rect::new(x0, y0, x1 - x0, y1 - y0))
    }
}
