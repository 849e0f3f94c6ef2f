//! Layer identifiers and the per-layer metadata advertised by a WMS.

use serde::{Deserialize, Serialize};

/// Unique identifier for a layer in the remote catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(pub String);

impl LayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split a compound layer ID like "MODIS_Terra_CorrectedReflectance" on
    /// its first separator: `("MODIS", "Terra_CorrectedReflectance")`.
    /// `None` when there is no separator or either side would be empty.
    pub fn split_product(&self) -> Option<(&str, &str)> {
        self.0
            .split_once('_')
            .filter(|(product, sublayer)| !product.is_empty() && !sublayer.is_empty())
    }
}

impl std::fmt::Display for LayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for LayerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A named layer as advertised in GetCapabilities.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayerInfo {
    /// Layer name (used in GetMap requests)
    pub name: LayerId,

    /// Human-readable title
    pub title: String,

    /// Optional description/abstract
    pub description: Option<String>,

    /// Raw time dimension entries, one per comma-separated item of the
    /// declared extent (e.g. `2000-02-24/2024-01-01/P1D`).
    pub time_positions: Vec<String>,

    /// Advertised styles
    pub styles: Vec<LayerStyle>,
}

/// Style advertised for a layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayerStyle {
    pub name: String,
    pub title: Option<String>,
    /// Legend graphic URL from `LegendURL/OnlineResource`
    pub legend_url: Option<String>,
}

impl LayerInfo {
    /// Find a style by name.
    pub fn get_style(&self, name: &str) -> Option<&LayerStyle> {
        self.styles.iter().find(|s| s.name == name)
    }

    /// Legend of the `default` style, if the service advertises one.
    pub fn default_legend(&self) -> Option<&str> {
        self.get_style("default")
            .and_then(|s| s.legend_url.as_deref())
    }
}
