mod mask_test;
mod region_test;

use opencv::core::{count_non_zero, Mat, Rect, Scalar, CV_8UC3};
use opencv::imgproc::{rectangle, FILLED, LINE_8};

use crate::region::NormPoint;
use crate::tank::{HsvRange, TankRegion};

/// Green in BGR, (60, 255, 255) once converted to HSV.
pub const GREEN: (f64, f64, f64) = (0.0, 255.0, 0.0);
pub const BLACK: (f64, f64, f64) = (0.0, 0.0, 0.0);
pub const WHITE: (f64, f64, f64) = (255.0, 255.0, 255.0);

/// Matches `GREEN` after HSV conversion.
pub fn green_range() -> HsvRange {
    HsvRange::new([50, 100, 100], [70, 255, 255])
}

/// 3 channel 8-bit image filled with one colour.
pub fn solid(rows: i32, cols: i32, color: (f64, f64, f64)) -> Mat {
    Mat::new_rows_cols_with_default(
        rows,
        cols,
        CV_8UC3,
        Scalar::new(color.0, color.1, color.2, 0.0),
    )
    .unwrap()
}

pub fn paint(img: &mut Mat, rect: Rect, color: (f64, f64, f64)) {
    rectangle(
        img,
        rect,
        Scalar::new(color.0, color.1, color.2, 0.0),
        FILLED,
        LINE_8,
        0,
    )
    .unwrap();
}

pub fn tank(min: (f64, f64), max: (f64, f64), hsv_ranges: Vec<HsvRange>) -> TankRegion {
    TankRegion {
        min: NormPoint(min.0, min.1),
        max: NormPoint(max.0, max.1),
        hsv_ranges,
        erosion_size: 0,
        dilation_size: 0,
        min_contour_area: 0.0,
    }
}

pub fn set_pixels(mask: &Mat) -> i32 {
    count_non_zero(mask).unwrap()
}
