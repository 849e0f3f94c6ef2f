//! Bounding box types and the canonical literal formatting used in GetMap URLs.

use serde::{Deserialize, Serialize};

/// Spherical-mercator SRS used for every map request.
pub const WEB_MERCATOR_SRS: &str = "EPSG:3857";

/// Half the circumference of the EPSG:3857 world, in meters.
pub const WEB_MERCATOR_HALF_EXTENT: f64 = 20037508.342789244;

/// A projected bounding box in EPSG:3857 meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// The fixed extent every template request is issued for.
    pub const GLOBAL_REQUEST: BoundingBox = BoundingBox {
        min_x: -20037507.5394,
        min_y: 1638517.4448,
        max_x: 20037260.9187,
        max_y: 7714669.3946,
    };

    /// Create a new bounding box from corner coordinates.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Canonical decimal literals in BBOX order (minx, miny, maxx, maxy).
    ///
    /// The request builder and the URL templater must both go through this
    /// so the literal searched for is byte-identical to the one sent.
    pub fn literals(&self) -> [String; 4] {
        [
            format_coordinate(self.min_x),
            format_coordinate(self.min_y),
            format_coordinate(self.max_x),
            format_coordinate(self.max_y),
        ]
    }

    /// The WMS BBOX parameter value.
    pub fn to_wms_string(&self) -> String {
        self.literals().join(",")
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// Shortest round-trip representation of a coordinate.
pub fn format_coordinate(value: f64) -> String {
    format!("{}", value)
}
