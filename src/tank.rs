use std::fmt;
use std::fs;
use std::path::Path;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::region::{NormPoint, PixelBounds};

/// Largest erosion or dilation size, the kernel side `2 * size` has to fit an `i32`.
pub const MAX_MORPH_SIZE: u32 = i32::MAX as u32 / 2;

/// Inclusive HSV bounds for one liquid colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HsvRange {
    #[serde(rename = "minHSV")]
    pub min_hsv: [u8; 3],
    #[serde(rename = "maxHSV")]
    pub max_hsv: [u8; 3],
}

impl HsvRange {
    pub fn new(min_hsv: [u8; 3], max_hsv: [u8; 3]) -> Self {
        HsvRange { min_hsv, max_hsv }
    }

    /// Range matching every pixel.
    pub fn full() -> Self {
        HsvRange::new([0, 0, 0], [255, 255, 255])
    }
}

impl fmt::Display for HsvRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (lo, hi) = (self.min_hsv, self.max_hsv);
        write!(
            f,
            "({}, {}, {} to {}, {}, {})",
            lo[0], lo[1], lo[2], hi[0], hi[1], hi[2]
        )
    }
}

/// Detection settings for one tank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TankRegion {
    /// Top left corner, normalised.
    pub min: NormPoint,
    /// Bottom right corner, normalised.
    pub max: NormPoint,
    /// Liquid colours, OR-combined.
    #[serde(rename = "hsvRanges")]
    pub hsv_ranges: Vec<HsvRange>,
    /// Erosion kernel is `2 * erosion_size` square.
    pub erosion_size: u32,
    /// Dilation kernel is `2 * dilation_size` square.
    pub dilation_size: u32,
    /// Contours with an area at or below this are noise.
    pub min_contour_area: f64,
}

impl TankRegion {
    /// Tank bounds in pixels for a `width` x `height` frame.
    pub fn pixel_bounds(&self, width: i32, height: i32) -> PixelBounds {
        PixelBounds::from_normalized(&self.min, &self.max, width, height)
    }
}

/// Ordered tank configurations, persisted together as one JSON array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TankSettings {
    pub tanks: Vec<TankRegion>,
}

impl TankSettings {
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: TankSettings = serde_json::from_str(json)
            .map_err(|e| Error::config(format!("malformed tank settings: {e}")))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let settings = Self::from_json(&content).map_err(|e| e.in_file(path))?;
        log::info!(
            "Loaded {} tank(s) from {}",
            settings.tanks.len(),
            path.display()
        );
        for (i, tank) in settings.tanks.iter().enumerate() {
            log::debug!(
                "Tank {}: {:?} to {:?}, ranges [{}]",
                i + 1,
                tank.min,
                tank.max,
                tank.hsv_ranges.iter().join(", ")
            );
        }
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.tanks.is_empty() {
            return Err(Error::config("tank settings contain no tanks"));
        }
        for (i, tank) in self.tanks.iter().enumerate() {
            if tank.erosion_size > MAX_MORPH_SIZE || tank.dilation_size > MAX_MORPH_SIZE {
                return Err(Error::config(format!(
                    "tank {} erosion/dilation size is above {MAX_MORPH_SIZE}",
                    i + 1
                )));
            }
            if tank.min_contour_area < 0.0 {
                return Err(Error::config(format!(
                    "tank {} has a negative min_contour_area",
                    i + 1
                )));
            }
        }
        Ok(())
    }
}
