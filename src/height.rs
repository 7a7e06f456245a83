use crate::region::PixelBounds;

/// Linear pixel row to physical height mapping for one tank.
/// The tank's top row is `length` high and its bottom row is 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeightScale {
    pub min_y: i32,
    pub max_y: i32,
    pub length: f64,
}

impl HeightScale {
    pub fn new(tank: &PixelBounds, length: f64) -> Self {
        HeightScale {
            min_y: tank.min_y,
            max_y: tank.max_y,
            length,
        }
    }

    /// Height of pixel row `y`. Row 0 always maps to 0, it doubles as "no liquid"
    /// in tables written before empty slices were tracked separately.
    pub fn px_to_height(&self, y: i32) -> f64 {
        if y == 0 {
            return 0.0;
        }
        self.linear(y)
    }

    fn linear(&self, y: i32) -> f64 {
        let span = self.max_y - self.min_y;
        if span == 0 {
            return 0.0;
        }
        self.length * (1.0 - (y - self.min_y) as f64 / span as f64)
    }

    /// (bottom, top) heights of a slice extent. An empty slice is (0, 0).
    ///
    /// With `row_zero_is_empty` a detection starting at row 0 reads as 0 too,
    /// which keeps the numbers identical to older tables.
    pub fn extent_heights(&self, extent: Option<(i32, i32)>, row_zero_is_empty: bool) -> (f64, f64) {
        match extent {
            None => (0.0, 0.0),
            Some((top, bottom)) if row_zero_is_empty => {
                (self.px_to_height(bottom), self.px_to_height(top))
            }
            Some((top, bottom)) => (self.linear(bottom), self.linear(top)),
        }
    }
}
