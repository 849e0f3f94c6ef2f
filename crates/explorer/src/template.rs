//! Tile URL templates derived from one resolved GetMap request.
//!
//! A GetMap request for a fixed extent is issued once; the URL the service
//! resolves it to has its four BBOX literals swapped for placeholders. Tiles
//! are then requested by substituting their own extent back in.

use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, histogram};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use wms_common::bbox::format_coordinate;
use wms_common::{BoundingBox, LayerId, TileCoord, WmsError, WmsResult};
use wms_protocol::WmsService;

use crate::config::ExplorerConfig;

pub const XMIN: &str = "{XMIN}";
pub const YMIN: &str = "{YMIN}";
pub const XMAX: &str = "{XMAX}";
pub const YMAX: &str = "{YMAX}";

const PLACEHOLDERS: [&str; 4] = [XMIN, YMIN, XMAX, YMAX];

/// A GetMap URL with `{XMIN}`, `{YMIN}`, `{XMAX}` and `{YMAX}` in place of
/// its bounding box coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UrlTemplate(String);

impl UrlTemplate {
    /// Replace the literals of `bbox` in a resolved URL with placeholders.
    ///
    /// Literals are matched in XMIN, YMIN, XMAX, YMAX order, each after the
    /// previous one and starting at the `BBOX` parameter when present. A
    /// literal that cannot be found is an error rather than a silently
    /// fixed-extent template.
    pub fn from_resolved_url(url: &str, bbox: &BoundingBox) -> WmsResult<Self> {
        let mut template = url.to_string();
        let mut cursor = bbox_param_offset(url).unwrap_or(0);

        for (placeholder, literal) in PLACEHOLDERS.into_iter().zip(bbox.literals()) {
            let found = template[cursor..]
                .find(&literal)
                .ok_or_else(|| WmsError::UnplacedBboxLiteral {
                    placeholder,
                    literal: literal.clone(),
                })?;
            let start = cursor + found;
            template.replace_range(start..start + literal.len(), placeholder);
            cursor = start + placeholder.len();
        }

        Ok(Self(template))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Substitute `bbox` into the placeholders.
    pub fn expand(&self, bbox: &BoundingBox) -> String {
        let values = [bbox.min_x, bbox.min_y, bbox.max_x, bbox.max_y];
        PLACEHOLDERS
            .into_iter()
            .zip(values)
            .fold(self.0.clone(), |url, (placeholder, value)| {
                url.replace(placeholder, &format_coordinate(value))
            })
    }

    /// URL for one XYZ tile.
    pub fn tile_url(&self, coord: TileCoord) -> String {
        self.expand(&coord.web_mercator_bbox())
    }
}

impl std::fmt::Display for UrlTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

fn bbox_param_offset(url: &str) -> Option<usize> {
    let lower = url.to_ascii_lowercase();
    ["?bbox=", "&bbox="]
        .iter()
        .filter_map(|key| lower.find(key).map(|i| i + key.len()))
        .min()
}

/// Produces [`UrlTemplate`]s by issuing a GetMap request for the configured
/// extent.
pub struct TileUrlTemplater {
    service: Arc<dyn WmsService>,
    config: Arc<ExplorerConfig>,
}

impl TileUrlTemplater {
    pub fn new(service: Arc<dyn WmsService>, config: Arc<ExplorerConfig>) -> Self {
        Self { service, config }
    }

    /// Template for `layer` at `time`.
    ///
    /// When the service rejects a request that carried a time, the request is
    /// retried once without it. Transport failures and 5xx answers are
    /// returned as-is.
    #[instrument(skip(self), fields(layer = %layer))]
    pub async fn template(&self, layer: &LayerId, time: Option<&str>) -> WmsResult<UrlTemplate> {
        let request = self.config.template_request(layer, time);
        let started = Instant::now();

        counter!("explorer_getmap_requests_total").increment(1);
        let resolved = match self.service.get_map(&request).await {
            Ok(url) => url,
            Err(err) if request.time.is_some() && err.is_request_rejection() => {
                warn!(error = %err, "GetMap rejected with TIME, retrying without it");
                counter!("explorer_getmap_retries_total").increment(1);
                counter!("explorer_getmap_requests_total").increment(1);
                self.service.get_map(&request.without_time()).await?
            }
            Err(err) => return Err(err),
        };
        histogram!("explorer_getmap_duration_seconds").record(started.elapsed().as_secs_f64());

        let template = UrlTemplate::from_resolved_url(&resolved, &request.bbox)?;
        info!(template = %template, "Built tile URL template");
        Ok(template)
    }
}
