//! WMS GetMap / GetCapabilities request construction (KVP binding).

use reqwest::Url;
use serde::{Deserialize, Serialize};

use wms_common::{BoundingBox, LayerId, WmsError, WmsResult, WEB_MERCATOR_SRS};

/// Protocol version used for outgoing requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WmsVersion {
    #[default]
    #[serde(rename = "1.1.1")]
    V1_1_1,
    #[serde(rename = "1.3.0")]
    V1_3_0,
}

impl WmsVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            WmsVersion::V1_1_1 => "1.1.1",
            WmsVersion::V1_3_0 => "1.3.0",
        }
    }

    /// Name of the reference system parameter (`SRS` before 1.3.0, `CRS` after).
    pub fn srs_param(&self) -> &'static str {
        match self {
            WmsVersion::V1_1_1 => "SRS",
            WmsVersion::V1_3_0 => "CRS",
        }
    }
}

/// Parameters of a single GetMap request.
#[derive(Debug, Clone, PartialEq)]
pub struct GetMapRequest {
    pub layer: LayerId,
    pub styles: String,
    pub srs: String,
    pub bbox: BoundingBox,
    pub width: u32,
    pub height: u32,
    pub format: String,
    pub transparent: bool,
    pub time: Option<String>,
}

impl GetMapRequest {
    /// A 256x256 transparent PNG request in EPSG:3857.
    pub fn new(layer: LayerId, bbox: BoundingBox) -> Self {
        Self {
            layer,
            styles: String::new(),
            srs: WEB_MERCATOR_SRS.to_string(),
            bbox,
            width: 256,
            height: 256,
            format: "image/png".to_string(),
            transparent: true,
            time: None,
        }
    }

    pub fn with_time(mut self, time: Option<&str>) -> Self {
        self.time = time.map(str::to_string);
        self
    }

    /// Same request with the `TIME` parameter dropped.
    pub fn without_time(&self) -> Self {
        Self {
            time: None,
            ..self.clone()
        }
    }

    /// Build the full request URL against `base_url`.
    ///
    /// Query parameters already present on the base URL are kept unless this
    /// request sets them. BBOX literals come from [`BoundingBox::literals`].
    pub fn to_url(&self, base_url: &str, version: WmsVersion) -> WmsResult<String> {
        let mut params: Vec<(&str, String)> = vec![
            ("SERVICE", "WMS".to_string()),
            ("VERSION", version.as_str().to_string()),
            ("REQUEST", "GetMap".to_string()),
            ("LAYERS", self.layer.to_string()),
            ("STYLES", self.styles.clone()),
            (version.srs_param(), self.srs.clone()),
            ("BBOX", self.bbox.to_wms_string()),
            ("WIDTH", self.width.to_string()),
            ("HEIGHT", self.height.to_string()),
            ("FORMAT", self.format.clone()),
            (
                "TRANSPARENT",
                if self.transparent { "TRUE" } else { "FALSE" }.to_string(),
            ),
        ];
        if let Some(time) = &self.time {
            params.push(("TIME", time.clone()));
        }

        with_query(base_url, &params)
    }
}

/// GetCapabilities URL for `base_url`.
pub fn capabilities_url(base_url: &str, version: WmsVersion) -> WmsResult<String> {
    with_query(
        base_url,
        &[
            ("SERVICE", "WMS".to_string()),
            ("REQUEST", "GetCapabilities".to_string()),
            ("VERSION", version.as_str().to_string()),
        ],
    )
}

fn with_query(base_url: &str, params: &[(&str, String)]) -> WmsResult<String> {
    let mut url = Url::parse(base_url)
        .map_err(|e| WmsError::InvalidUrl(format!("{}: {}", base_url, e)))?;

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !params.iter().any(|(p, _)| p.eq_ignore_ascii_case(key)))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    {
        let mut query = url.query_pairs_mut();
        query.clear();
        query.extend_pairs(kept);
        for (key, value) in params {
            query.append_pair(key, value);
        }
    }

    Ok(url.to_string())
}
