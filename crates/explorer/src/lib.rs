//! Interactive explorer over a remote WMS.
//!
//! Builds a product / sub-layer catalog from a capabilities document,
//! expands layer time dimensions into selectable instants, derives tile URL
//! templates from a single GetMap request and ties them together in a
//! per-session reactive controller.

pub mod catalog;
pub mod config;
pub mod controller;
pub mod resolver;
pub mod surface;
pub mod template;

pub use catalog::{CatalogEntry, CatalogIndex, MISCELLANEOUS};
pub use config::ExplorerConfig;
pub use controller::{
    ControllerState, PassReport, ReactiveController, SessionContext, Stage, UiEvent,
};
pub use resolver::TimeDimensionResolver;
pub use surface::{RenderSurface, RenderUpdate, SurfaceSnapshot, TileOverlay};
pub use template::{TileUrlTemplater, UrlTemplate};
