use opencv::core::Rect;

use crate::error::Error;
use crate::region::{NormPoint, PixelBounds};

fn bounds(min_x: i32, max_x: i32) -> PixelBounds {
    PixelBounds {
        min_x,
        min_y: 10,
        max_x,
        max_y: 90,
    }
}

#[test]
fn test_pixel_bounds_truncate() {
    let b = PixelBounds::from_normalized(&NormPoint(0.25, 0.5), &NormPoint(0.755, 0.999), 640, 480);
    assert_eq!(
        b,
        PixelBounds {
            min_x: 160,
            min_y: 240,
            max_x: 483,
            max_y: 479,
        }
    );
}

#[test]
fn test_slices_tile_tank_width() {
    for min_x in [0, 3, 17] {
        for width in 0..150 {
            let tank = bounds(min_x, min_x + width);
            for count in 1..=40 {
                let slices: Vec<PixelBounds> =
                    (0..count).map(|i| tank.slice(i, count).unwrap()).collect();
                assert_eq!(slices[0].min_x, tank.min_x);
                assert_eq!(slices[count - 1].max_x, tank.max_x);
                for pair in slices.windows(2) {
                    assert_eq!(pair[0].max_x, pair[1].min_x);
                }
                for slice in &slices {
                    assert!(slice.min_x <= slice.max_x);
                    assert_eq!((slice.min_y, slice.max_y), (tank.min_y, tank.max_y));
                }
            }
        }
    }
}

#[test]
fn test_slice_edges_truncate_individually() {
    let tank = bounds(0, 100);
    let edges: Vec<(i32, i32)> = (0..7)
        .map(|i| tank.slice(i, 7).unwrap())
        .map(|s| (s.min_x, s.max_x))
        .collect();
    assert_eq!(
        edges,
        vec![(0, 14), (14, 28), (28, 42), (42, 57), (57, 71), (71, 85), (85, 100)]
    );
}

#[test]
fn test_slice_rejects_bad_counts() {
    let tank = bounds(0, 100);
    assert!(matches!(tank.slice(0, 0), Err(Error::Config(_))));
    assert!(matches!(tank.slice(3, 3), Err(Error::Config(_))));
}

#[test]
fn test_clamped_rect() {
    let inside = PixelBounds {
        min_x: 10,
        min_y: 20,
        max_x: 30,
        max_y: 60,
    };
    assert_eq!(inside.clamped_rect(100, 100), Some(Rect::new(10, 20, 20, 40)));

    let overhanging = PixelBounds {
        min_x: -5,
        min_y: 90,
        max_x: 50,
        max_y: 130,
    };
    assert_eq!(overhanging.clamped_rect(100, 100), Some(Rect::new(0, 90, 50, 10)));

    let inverted = PixelBounds {
        min_x: 60,
        min_y: 60,
        max_x: 20,
        max_y: 20,
    };
    assert_eq!(inverted.clamped_rect(100, 100), None);
    assert_eq!(bounds(40, 40).clamped_rect(100, 100), None);
}

#[test]
fn test_filled_rect_includes_max_corner() {
    let tank = PixelBounds {
        min_x: 10,
        min_y: 20,
        max_x: 30,
        max_y: 60,
    };
    assert_eq!(tank.filled_rect(100, 100), Some(Rect::new(10, 20, 21, 41)));
    // The extra row and column are dropped at the frame edge.
    assert_eq!(tank.filled_rect(30, 60), Some(Rect::new(10, 20, 20, 40)));

    let point = PixelBounds {
        min_x: 5,
        min_y: 5,
        max_x: 5,
        max_y: 5,
    };
    assert_eq!(point.filled_rect(10, 10), Some(Rect::new(5, 5, 1, 1)));

    let inverted = PixelBounds {
        min_x: 60,
        min_y: 60,
        max_x: 20,
        max_y: 20,
    };
    assert_eq!(inverted.filled_rect(100, 100), None);
}
