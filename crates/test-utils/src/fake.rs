//! Scripted in-memory `WmsService`.

use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use wms_common::{LayerId, WmsError, WmsResult};
use wms_protocol::{Capabilities, GetMapRequest, WmsService, WmsVersion};

use crate::fixtures;

/// A `WmsService` that answers from memory and records every GetMap request.
///
/// GetMap resolution order:
/// 1. queued failures from [`FakeWmsService::fail_next`],
/// 2. a `ServiceException` when the request carries a time for a layer
///    registered with [`FakeWmsService::reject_time_for`],
/// 3. otherwise the URL the HTTP client would have requested.
pub struct FakeWmsService {
    capabilities: Capabilities,
    base_url: String,
    queued_failures: Mutex<VecDeque<WmsError>>,
    time_rejecting: Mutex<HashSet<LayerId>>,
    requests: Mutex<Vec<GetMapRequest>>,
}

impl FakeWmsService {
    pub fn new(capabilities: Capabilities) -> Self {
        Self {
            capabilities,
            base_url: fixtures::BASE_URL.to_string(),
            queued_failures: Mutex::new(VecDeque::new()),
            time_rejecting: Mutex::new(HashSet::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Fake serving the fixture capabilities document.
    pub fn with_fixture() -> Self {
        Self::new(fixtures::capabilities())
    }

    /// Make the next GetMap call fail with `error`.
    pub fn fail_next(&self, error: WmsError) {
        self.queued_failures.lock().unwrap().push_back(error);
    }

    /// Reject GetMap requests for `layer` whenever they carry a time.
    pub fn reject_time_for(&self, layer: &str) {
        self.time_rejecting.lock().unwrap().insert(LayerId::new(layer));
    }

    /// GetMap requests received so far.
    pub fn requests(&self) -> Vec<GetMapRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn clear_requests(&self) {
        self.requests.lock().unwrap().clear();
    }
}

#[async_trait]
impl WmsService for FakeWmsService {
    async fn get_capabilities(&self) -> WmsResult<Capabilities> {
        Ok(self.capabilities.clone())
    }

    async fn get_map(&self, request: &GetMapRequest) -> WmsResult<String> {
        self.requests.lock().unwrap().push(request.clone());

        if let Some(error) = self.queued_failures.lock().unwrap().pop_front() {
            return Err(error);
        }

        let rejects_time = self.time_rejecting.lock().unwrap().contains(&request.layer);
        if rejects_time && request.time.is_some() {
            return Err(WmsError::ServiceException {
                code: Some("InvalidDimensionValue".to_string()),
                message: format!("Layer {} has no time dimension", request.layer),
            });
        }

        request.to_url(&self.base_url, WmsVersion::V1_1_1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wms_common::BoundingBox;

    #[tokio::test]
    async fn test_scripted_outcomes() {
        let fake = FakeWmsService::with_fixture();
        fake.reject_time_for(fixtures::layers::COASTLINES);
        fake.fail_next(WmsError::Transport("boom".to_string()));

        let request = GetMapRequest::new(
            LayerId::new(fixtures::layers::COASTLINES),
            BoundingBox::GLOBAL_REQUEST,
        );

        assert!(matches!(
            fake.get_map(&request).await,
            Err(WmsError::Transport(_))
        ));
        assert!(fake.get_map(&request).await.is_ok());
        assert!(matches!(
            fake.get_map(&request.clone().with_time(Some("2020-01-01T00:00:00Z"))).await,
            Err(WmsError::ServiceException { .. })
        ));
        assert_eq!(fake.request_count(), 3);
    }

    #[tokio::test]
    async fn test_fixture_capabilities() {
        let fake = FakeWmsService::with_fixture();
        let caps = fake.get_capabilities().await.unwrap();
        assert_eq!(caps.len(), 8);
    }
}
