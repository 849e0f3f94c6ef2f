//! Client side of the WMS: the `WmsService` seam and its HTTP implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, Response};
use tracing::{debug, info, instrument, warn};

use wms_common::{WmsError, WmsResult};

use crate::capabilities::{parse_capabilities, Capabilities};
use crate::exceptions::parse_exception_report;
use crate::getmap::{capabilities_url, GetMapRequest, WmsVersion};

/// Operations the explorer needs from a remote map service.
#[async_trait]
pub trait WmsService: Send + Sync {
    /// Fetch and parse the capabilities document.
    async fn get_capabilities(&self) -> WmsResult<Capabilities>;

    /// Issue a GetMap request and return the fully resolved request URL.
    ///
    /// Fails if the service rejects the request or does not answer with an image.
    async fn get_map(&self, request: &GetMapRequest) -> WmsResult<String>;
}

/// `reqwest`-backed WMS client.
pub struct HttpWmsClient {
    client: Client,
    base_url: String,
    version: WmsVersion,
}

impl HttpWmsClient {
    /// Create a client for `base_url`. No request timeout is applied unless given.
    pub fn new(
        base_url: impl Into<String>,
        version: WmsVersion,
        timeout: Option<Duration>,
    ) -> WmsResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| WmsError::InternalError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            version,
        })
    }

    async fn send(&self, url: &str) -> WmsResult<Response> {
        self.client
            .get(url)
            .send()
            .await
            .map_err(|e| WmsError::Transport(e.to_string()))
    }
}

#[async_trait]
impl WmsService for HttpWmsClient {
    #[instrument(skip(self), fields(base_url = %self.base_url, version = self.version.as_str()))]
    async fn get_capabilities(&self) -> WmsResult<Capabilities> {
        let url = capabilities_url(&self.base_url, self.version)?;
        debug!(url = %url, "Requesting capabilities");

        let response = self.send(&url).await?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| WmsError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(parse_exception_report(&body).unwrap_or(WmsError::HttpStatus(status.as_u16())));
        }

        let capabilities = parse_capabilities(&body)?;
        info!(layers = capabilities.len(), "Loaded capabilities");
        Ok(capabilities)
    }

    #[instrument(skip(self, request), fields(layer = %request.layer, time = ?request.time))]
    async fn get_map(&self, request: &GetMapRequest) -> WmsResult<String> {
        let url = request.to_url(&self.base_url, self.version)?;
        debug!(url = %url, "Requesting map");

        let response = self.send(&url).await?;
        let status = response.status();
        let resolved = response.url().to_string();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        // Exception reports come back as XML, sometimes with a 200 status.
        if !status.is_success() || content_type.contains("xml") {
            let body = response.text().await.unwrap_or_default();
            let error = parse_exception_report(&body).unwrap_or_else(|| {
                if status.is_success() {
                    WmsError::ServiceException {
                        code: None,
                        message: format!("unexpected response content type '{}'", content_type),
                    }
                } else {
                    WmsError::HttpStatus(status.as_u16())
                }
            });
            warn!(status = status.as_u16(), error = %error, "GetMap failed");
            return Err(error);
        }

        Ok(resolved)
    }
}
