//! Explorer configuration.
//!
//! Loaded from an optional YAML file; every field has a default pointing at
//! the NASA GIBS EPSG:3857 "best" endpoint.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use wms_common::{BoundingBox, LayerId};
use wms_protocol::{GetMapRequest, WmsVersion};

pub const DEFAULT_BASE_URL: &str =
    "https://gibs.earthdata.nasa.gov/wms/epsg3857/best/wms.cgi?SERVICE=WMS";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    /// WMS endpoint, optionally carrying fixed query parameters
    pub base_url: String,
    pub version: WmsVersion,
    /// Extent of the one GetMap request each template is derived from
    pub bbox: BoundingBox,
    /// Tile width and height in pixels
    pub tile_size: u32,
    pub format: String,
    pub transparent: bool,
    /// Upper bound on instants offered per layer (latest kept)
    pub max_time_steps: usize,
    /// Remote request timeout; none by default
    pub request_timeout_secs: Option<u64>,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            version: WmsVersion::V1_1_1,
            bbox: BoundingBox::GLOBAL_REQUEST,
            tile_size: 256,
            format: "image/png".to_string(),
            transparent: true,
            max_time_steps: 50_000,
            request_timeout_secs: None,
        }
    }
}

impl ExplorerConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: ExplorerConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        debug!(path = %path.display(), base_url = %config.base_url, "Loaded explorer config");
        Ok(config)
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            anyhow::bail!("base_url must be set");
        }
        if self.tile_size == 0 {
            anyhow::bail!("tile_size must be > 0");
        }
        if self.max_time_steps == 0 {
            anyhow::bail!("max_time_steps must be > 0");
        }
        if self.bbox.width() <= 0.0 || self.bbox.height() <= 0.0 {
            anyhow::bail!("bbox must have positive width and height");
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// The GetMap request a URL template is derived from.
    pub fn template_request(&self, layer: &LayerId, time: Option<&str>) -> GetMapRequest {
        GetMapRequest {
            width: self.tile_size,
            height: self.tile_size,
            format: self.format.clone(),
            transparent: self.transparent,
            ..GetMapRequest::new(layer.clone(), self.bbox)
        }
        .with_time(time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ExplorerConfig::default();
        config.validate().unwrap();
        assert_eq!(config.bbox, BoundingBox::GLOBAL_REQUEST);
        assert!(config.request_timeout().is_none());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
base_url: "http://localhost:9000/wms"
version: "1.3.0"
max_time_steps: 500
"#;
        let config: ExplorerConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.base_url, "http://localhost:9000/wms");
        assert_eq!(config.version, WmsVersion::V1_3_0);
        assert_eq!(config.max_time_steps, 500);
        assert_eq!(config.tile_size, 256);
        assert!(config.transparent);
    }

    #[test]
    fn test_validate_rejects_zero_steps() {
        let config = ExplorerConfig {
            max_time_steps: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_template_request_uses_config() {
        let config = ExplorerConfig {
            tile_size: 512,
            ..Default::default()
        };
        let request = config.template_request(&LayerId::new("Coastlines"), Some("2020-01-01T00:00:00Z"));
        assert_eq!(request.width, 512);
        assert_eq!(request.height, 512);
        assert_eq!(request.bbox, BoundingBox::GLOBAL_REQUEST);
        assert_eq!(request.time.as_deref(), Some("2020-01-01T00:00:00Z"));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("explorer.yaml");
        std::fs::write(&path, "tile_size: 128\n").unwrap();

        let config = ExplorerConfig::from_file(&path).unwrap();
        assert_eq!(config.tile_size, 128);

        assert!(ExplorerConfig::from_file(&dir.path().join("missing.yaml")).is_err());
    }
}
