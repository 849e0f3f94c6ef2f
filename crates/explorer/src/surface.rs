//! Where controller output goes: widget options, legend, overlay and status.

use serde::{Deserialize, Serialize};

use wms_common::{LayerId, TimeValue};

use crate::template::UrlTemplate;

/// The map overlay for the current selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileOverlay {
    /// Layer title from the capabilities document
    pub title: String,
    pub layer: LayerId,
    pub time: TimeValue,
    pub url_template: UrlTemplate,
}

/// One change pushed to the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderUpdate {
    ProductOptions { options: Vec<String>, selected: String },
    LayerOptions { options: Vec<String>, selected: String },
    TimeOptions { options: Vec<TimeValue>, selected: TimeValue },
    /// Time widget moved without changing its options
    TimeSelected(TimeValue),
    Loading(bool),
    Legend(Option<String>),
    Overlay(TileOverlay),
    /// User-facing status line; `None` clears it
    Status(Option<String>),
}

/// Receives [`RenderUpdate`]s in the order the controller emits them.
pub trait RenderSurface: Send {
    fn apply(&mut self, update: RenderUpdate);
}

/// Records updates verbatim.
impl RenderSurface for Vec<RenderUpdate> {
    fn apply(&mut self, update: RenderUpdate) {
        self.push(update);
    }
}

/// Latest state of every widget, for hosts that poll rather than stream.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SurfaceSnapshot {
    pub product_options: Vec<String>,
    pub product: Option<String>,
    pub layer_options: Vec<String>,
    pub layer: Option<String>,
    pub time_options: Vec<TimeValue>,
    pub time: Option<TimeValue>,
    pub loading: bool,
    pub legend_url: Option<String>,
    pub overlay: Option<TileOverlay>,
    pub status: Option<String>,
    /// Number of updates applied
    pub revision: u64,
}

impl RenderSurface for SurfaceSnapshot {
    fn apply(&mut self, update: RenderUpdate) {
        self.revision += 1;
        match update {
            RenderUpdate::ProductOptions { options, selected } => {
                self.product_options = options;
                self.product = Some(selected);
            }
            RenderUpdate::LayerOptions { options, selected } => {
                self.layer_options = options;
                self.layer = Some(selected);
            }
            RenderUpdate::TimeOptions { options, selected } => {
                self.time_options = options;
                self.time = Some(selected);
            }
            RenderUpdate::TimeSelected(value) => self.time = Some(value),
            RenderUpdate::Loading(loading) => self.loading = loading,
            RenderUpdate::Legend(url) => self.legend_url = url,
            RenderUpdate::Overlay(overlay) => self.overlay = Some(overlay),
            RenderUpdate::Status(status) => self.status = status,
        }
    }
}
