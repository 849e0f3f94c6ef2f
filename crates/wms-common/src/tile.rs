//! XYZ tile addressing on the spherical-mercator grid.

use crate::bbox::{BoundingBox, WEB_MERCATOR_HALF_EXTENT};
use serde::{Deserialize, Serialize};

/// Deepest zoom level accepted for tile addressing.
pub const MAX_ZOOM: u32 = 24;

/// A tile coordinate (z/x/y), y counted from the top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    /// Zoom level
    pub z: u32,
    /// Column (x)
    pub x: u32,
    /// Row (y)
    pub y: u32,
}

impl TileCoord {
    pub fn new(z: u32, x: u32, y: u32) -> Self {
        Self { z, x, y }
    }

    /// Whether the coordinate addresses a tile that exists at its zoom level.
    pub fn is_valid(&self) -> bool {
        if self.z > MAX_ZOOM {
            return false;
        }
        let n = 1u64 << self.z;
        (self.x as u64) < n && (self.y as u64) < n
    }

    /// Bounds of this tile in EPSG:3857 meters.
    pub fn web_mercator_bbox(&self) -> BoundingBox {
        let n = (1u64 << self.z) as f64;
        let size = 2.0 * WEB_MERCATOR_HALF_EXTENT / n;

        let min_x = -WEB_MERCATOR_HALF_EXTENT + self.x as f64 * size;
        let max_y = WEB_MERCATOR_HALF_EXTENT - self.y as f64 * size;

        BoundingBox::new(min_x, max_y - size, min_x + size, max_y)
    }
}

impl std::fmt::Display for TileCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}
