use opencv::core::{
    bitwise_or, in_range, Mat, Point, Rect, Scalar, Size, Vector, BORDER_CONSTANT, BORDER_DEFAULT,
    CV_8U, CV_8UC1, CV_8UC3,
};
use opencv::imgproc::{
    contour_area, dilate, draw_contours, erode, find_contours, gaussian_blur,
    morphology_default_border_value, CHAIN_APPROX_SIMPLE, FILLED, LINE_8, RETR_EXTERNAL,
};
use opencv::prelude::*;

use crate::error::{Error, Result};
use crate::tank::{HsvRange, TankRegion};

const BLUR_KERNEL: i32 = 5;
const BLUR_SIGMA: f64 = 3.0;

impl HsvRange {
    /// Sets dst to 255 wherever src lies inside this range.
    pub fn mask(&self, src: &Mat, dst: &mut Mat) -> Result<()> {
        in_range(
            src,
            &Vector::<u8>::from(self.min_hsv.to_vec()),
            &Vector::<u8>::from(self.max_hsv.to_vec()),
            dst,
        )?;
        Ok(())
    }
}

impl TankRegion {
    /// Writes the liquid mask of this tank for an HSV frame into dst.
    ///
    /// Only the largest blob of liquid coloured pixels inside the tank survives,
    /// and only if its contour area beats `min_contour_area`. Otherwise dst is all zero.
    pub fn mask(&self, hsv: &Mat, dst: &mut Mat) -> Result<()> {
        if hsv.typ() != CV_8UC3 {
            return Err(Error::InvalidFrame(format!(
                "expected an 8-bit 3 channel HSV frame, got type {}",
                hsv.typ()
            )));
        }
        let (rows, cols) = (hsv.rows(), hsv.cols());
        *dst = Mat::zeros(rows, cols, CV_8UC1)?.to_mat()?;
        let roi = match self.pixel_bounds(cols, rows).filled_rect(cols, rows) {
            Some(roi) => roi,
            None => return Ok(()),
        };

        let mut raw = Mat::zeros(rows, cols, CV_8UC1)?.to_mat()?;
        if !self.color_mask(hsv, roi, &mut raw)? {
            return Ok(());
        }
        let smoothed = self.smooth(&raw)?;

        let mut contours = Vector::<Vector<Point>>::new();
        find_contours(
            &smoothed,
            &mut contours,
            RETR_EXTERNAL,
            CHAIN_APPROX_SIMPLE,
            Point::new(0, 0),
        )?;
        let (largest, area) = match largest_contour(&contours)? {
            Some(found) => found,
            None => return Ok(()),
        };
        if area <= self.min_contour_area {
            log::trace!(
                "Largest contour area {area} at or below {}",
                self.min_contour_area
            );
            return Ok(());
        }

        // Blur can push the blob past the tank edge, drawing through the ROI clips it.
        let mut dst_roi = Mat::roi(dst, roi)?;
        draw_contours(
            &mut dst_roi,
            &contours,
            largest as i32,
            Scalar::all(255.0),
            FILLED,
            LINE_8,
            &Mat::default(),
            i32::MAX,
            Point::new(-roi.x, -roi.y),
        )?;
        Ok(())
    }

    /// ORs every range over the tank ROI of hsv into the same ROI of dst.
    /// Returns false when no range is configured and dst stays empty.
    fn color_mask(&self, hsv: &Mat, roi: Rect, dst: &mut Mat) -> Result<bool> {
        let mut ranges = self.hsv_ranges.iter();
        let first = match ranges.next() {
            Some(range) => range,
            None => return Ok(false),
        };

        let hsv_roi = Mat::roi(hsv, roi)?;
        let mut combined = Mat::default();
        first.mask(&hsv_roi, &mut combined)?;
        let mut range_mask = Mat::default();
        for range in ranges {
            range.mask(&hsv_roi, &mut range_mask)?;
            let mut merged = Mat::default();
            bitwise_or(&combined, &range_mask, &mut merged, &Mat::default())?;
            combined = merged;
        }

        let mut dst_roi = Mat::roi(dst, roi)?;
        combined.copy_to(&mut dst_roi)?;
        Ok(true)
    }

    /// Gaussian blur, then erosion, then dilation.
    fn smooth(&self, raw: &Mat) -> Result<Mat> {
        let mut blurred = Mat::default();
        gaussian_blur(
            raw,
            &mut blurred,
            Size::new(BLUR_KERNEL, BLUR_KERNEL),
            BLUR_SIGMA,
            0.0,
            BORDER_DEFAULT,
        )?;

        let border = morphology_default_border_value()?;
        let mut eroded = Mat::default();
        erode(
            &blurred,
            &mut eroded,
            &square_kernel(self.erosion_size)?,
            Point::new(-1, -1),
            1,
            BORDER_CONSTANT,
            border,
        )?;
        let mut dilated = Mat::default();
        dilate(
            &eroded,
            &mut dilated,
            &square_kernel(self.dilation_size)?,
            Point::new(-1, -1),
            1,
            BORDER_CONSTANT,
            border,
        )?;
        Ok(dilated)
    }
}

/// Square kernel of ones with side `2 * size`.
/// Size 0 gives an empty kernel, which OpenCV swaps for its 3x3 default.
fn square_kernel(size: u32) -> Result<Mat> {
    if size == 0 {
        return Ok(Mat::default());
    }
    let side = i32::try_from(size)
        .ok()
        .and_then(|size| size.checked_mul(2))
        .ok_or_else(|| Error::config(format!("kernel size {size} is too large")))?;
    Ok(Mat::ones(side, side, CV_8U)?.to_mat()?)
}

/// Index and area of the contour enclosing the most area. The first one wins ties.
fn largest_contour(contours: &Vector<Vector<Point>>) -> Result<Option<(usize, f64)>> {
    let mut largest: Option<(usize, f64)> = None;
    for (i, contour) in contours.iter().enumerate() {
        let area = contour_area(&contour, false)?;
        if largest.map_or(true, |(_, best)| area > best) {
            largest = Some((i, area));
        }
    }
    Ok(largest)
}
