use opencv::core::{absdiff, find_non_zero, Mat, Point, Rect, Scalar, Vector, CV_8UC1};
use opencv::imgproc::{bounding_rect, cvt_color, COLOR_GRAY2BGR};
use opencv::prelude::*;

use super::{green_range, paint, set_pixels, solid, tank};
use crate::error::Error;
use crate::slice::SliceBounds;
use crate::tank::{HsvRange, TankRegion};

/// Liquid colour as it sits in an HSV frame.
const LIQUID_HSV: (f64, f64, f64) = (60.0, 200.0, 200.0);

fn mask_of(hsv: &Mat, tank: &TankRegion) -> Mat {
    let mut mask = Mat::default();
    tank.mask(hsv, &mut mask).unwrap();
    mask
}

fn set_rect(mask: &Mat) -> Rect {
    let mut points = Vector::<Point>::new();
    find_non_zero(mask, &mut points).unwrap();
    bounding_rect(&points).unwrap()
}

#[test]
fn test_full_spectrum_full_frame() {
    let hsv = solid(60, 80, (0.0, 0.0, 255.0));
    let mask = mask_of(&hsv, &tank((0.0, 0.0), (1.0, 1.0), vec![HsvRange::full()]));
    assert_eq!((mask.rows(), mask.cols()), (60, 80));
    assert_eq!(mask.typ(), CV_8UC1);
    assert_eq!(set_pixels(&mask), 60 * 80);
}

#[test]
fn test_full_spectrum_mask_is_tank_rect() {
    let hsv = solid(100, 100, (10.0, 20.0, 30.0));
    let tank = tank((0.2, 0.3), (0.6, 0.7), vec![HsvRange::full()]);
    let mask = mask_of(&hsv, &tank);
    // Both corners of the tank are covered.
    assert_eq!(set_pixels(&mask), 41 * 41);
    assert_eq!(set_rect(&mask), Rect::new(20, 30, 41, 41));

    // Segmenting the mask itself again changes nothing.
    let mut again_hsv = Mat::default();
    cvt_color(&mask, &mut again_hsv, COLOR_GRAY2BGR, 0).unwrap();
    let again = mask_of(&again_hsv, &tank);
    let mut diff = Mat::default();
    absdiff(&mask, &again, &mut diff).unwrap();
    assert_eq!(set_pixels(&diff), 0);
}

#[test]
fn test_no_ranges_no_mask() {
    let hsv = solid(50, 50, LIQUID_HSV);
    let mask = mask_of(&hsv, &tank((0.0, 0.0), (1.0, 1.0), vec![]));
    assert_eq!(set_pixels(&mask), 0);
}

#[test]
fn test_inverted_tank_no_mask() {
    let hsv = solid(50, 50, LIQUID_HSV);
    let mask = mask_of(&hsv, &tank((0.6, 0.6), (0.2, 0.2), vec![HsvRange::full()]));
    assert_eq!(set_pixels(&mask), 0);
}

#[test]
fn test_min_contour_area_rejects_everything() {
    let hsv = solid(60, 80, (0.0, 0.0, 255.0));
    let mut tank = tank((0.0, 0.0), (1.0, 1.0), vec![HsvRange::full()]);
    tank.min_contour_area = 1e9;
    let mask = mask_of(&hsv, &tank);
    assert_eq!(set_pixels(&mask), 0);

    let bounds = tank.pixel_bounds(80, 60);
    for i in 0..4 {
        let slice = SliceBounds::extract(&mask, &bounds, i, 4).unwrap();
        assert_eq!(slice.extent, None);
        assert_eq!(slice.corners(), ((slice.x_min, 0), (slice.x_max, 0)));
    }
}

#[test]
fn test_largest_blob_wins() {
    let mut hsv = solid(100, 100, (0.0, 0.0, 0.0));
    paint(&mut hsv, Rect::new(10, 10, 30, 30), LIQUID_HSV);
    paint(&mut hsv, Rect::new(70, 70, 10, 10), LIQUID_HSV);
    let mask = mask_of(&hsv, &tank((0.0, 0.0), (1.0, 1.0), vec![green_range()]));
    assert_eq!(*mask.at_2d::<u8>(25, 25).unwrap(), 255);
    assert_eq!(*mask.at_2d::<u8>(75, 75).unwrap(), 0);
}

#[test]
fn test_ranges_are_combined() {
    let mut hsv = solid(60, 60, (0.0, 0.0, 0.0));
    paint(&mut hsv, Rect::new(10, 10, 20, 40), (20.0, 200.0, 200.0));
    paint(&mut hsv, Rect::new(30, 10, 20, 40), (110.0, 200.0, 200.0));
    let orange = HsvRange::new([15, 100, 100], [25, 255, 255]);
    let blue = HsvRange::new([105, 100, 100], [115, 255, 255]);

    let both = mask_of(&hsv, &tank((0.0, 0.0), (1.0, 1.0), vec![orange, blue]));
    assert_eq!(*both.at_2d::<u8>(30, 15).unwrap(), 255);
    assert_eq!(*both.at_2d::<u8>(30, 45).unwrap(), 255);

    let one = mask_of(&hsv, &tank((0.0, 0.0), (1.0, 1.0), vec![orange]));
    assert_eq!(*one.at_2d::<u8>(30, 15).unwrap(), 255);
    assert_eq!(*one.at_2d::<u8>(30, 45).unwrap(), 0);
}

#[test]
fn test_rejects_single_channel_frame() {
    let gray = Mat::new_rows_cols_with_default(10, 10, CV_8UC1, Scalar::all(0.0)).unwrap();
    let mut mask = Mat::default();
    let result = tank((0.0, 0.0), (1.0, 1.0), vec![HsvRange::full()]).mask(&gray, &mut mask);
    assert!(matches!(result, Err(Error::InvalidFrame(_))));
}

#[test]
fn test_slice_extents() {
    let mut hsv = solid(100, 100, (0.0, 0.0, 0.0));
    paint(&mut hsv, Rect::new(10, 50, 30, 40), LIQUID_HSV);
    let tank = tank((0.1, 0.1), (0.9, 0.9), vec![green_range()]);
    let mask = mask_of(&hsv, &tank);
    let bounds = tank.pixel_bounds(100, 100);

    let left = SliceBounds::extract(&mask, &bounds, 0, 2).unwrap();
    assert_eq!((left.x_min, left.x_max), (10, 50));
    // The blur reaches two rows past the liquid, the bottom is cut after the tank's last row.
    assert_eq!(left.extent, Some((48, 91)));
    assert_eq!(left.corners(), ((10, 48), (50, 91)));

    let right = SliceBounds::extract(&mask, &bounds, 1, 2).unwrap();
    assert_eq!((right.x_min, right.x_max), (50, 90));
    assert_eq!(right.extent, None);
    assert_eq!(right.corners(), ((50, 0), (90, 0)));
}

#[test]
fn test_oversized_kernel_is_an_error() {
    let hsv = solid(20, 20, LIQUID_HSV);
    let mut huge = tank((0.0, 0.0), (1.0, 1.0), vec![HsvRange::full()]);
    huge.erosion_size = u32::MAX;
    let mut mask = Mat::default();
    assert!(matches!(huge.mask(&hsv, &mut mask), Err(Error::Config(_))));

    huge.erosion_size = 0;
    huge.dilation_size = i32::MAX as u32 / 2 + 1;
    assert!(matches!(huge.mask(&hsv, &mut mask), Err(Error::Config(_))));
}
