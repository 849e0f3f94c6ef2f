//! Common types and utilities shared across the layer explorer crates.

pub mod bbox;
pub mod error;
pub mod layer;
pub mod tile;
pub mod time;

pub use bbox::{BoundingBox, WEB_MERCATOR_SRS};
pub use error::{WmsError, WmsResult};
pub use layer::{LayerId, LayerInfo, LayerStyle};
pub use tile::TileCoord;
pub use time::{Period, TimeEntry, TimeExtent, TimeParseError, TimeValue};
