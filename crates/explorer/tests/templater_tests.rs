//! TileUrlTemplater retry rules against the scripted fake service.

use std::sync::Arc;

use explorer::{ExplorerConfig, TileUrlTemplater};
use test_utils::{fixtures, fixtures::layers, FakeWmsService};
use wms_common::{BoundingBox, LayerId, TileCoord, WmsError};
use wms_protocol::WmsVersion;

fn templater(fake: &Arc<FakeWmsService>) -> TileUrlTemplater {
    TileUrlTemplater::new(fake.clone(), Arc::new(ExplorerConfig::default()))
}

#[tokio::test]
async fn test_template_substitutes_tile_extent() {
    let fake = Arc::new(FakeWmsService::with_fixture());
    let template = templater(&fake)
        .template(&LayerId::new(layers::COASTLINES), None)
        .await
        .unwrap();

    let tile = TileCoord::new(2, 1, 1);
    let bbox = tile.web_mercator_bbox();
    let [min_x, min_y, max_x, max_y] = bbox.literals();
    let url = template.tile_url(tile);
    assert!(url.contains(&format!("BBOX={min_x}%2C{min_y}%2C{max_x}%2C{max_y}&")));

    let resolved = fake.requests()[0]
        .to_url(fixtures::BASE_URL, WmsVersion::V1_1_1)
        .unwrap();
    assert_eq!(template.expand(&BoundingBox::GLOBAL_REQUEST), resolved);
}

#[tokio::test]
async fn test_service_exception_with_time_retries_once() {
    let fake = Arc::new(FakeWmsService::with_fixture());
    fake.fail_next(WmsError::ServiceException {
        code: Some("InvalidDimensionValue".to_string()),
        message: "bad time".to_string(),
    });

    let template = templater(&fake)
        .template(&LayerId::new(layers::MODIS_TERRA_TRUE_COLOR), Some("2020-01-01T00:00:00Z"))
        .await
        .unwrap();

    let requests = fake.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests[1].time.is_none());
    assert!(!template.as_str().contains("TIME="));
}

#[tokio::test]
async fn test_client_error_status_with_time_retries() {
    let fake = Arc::new(FakeWmsService::with_fixture());
    fake.fail_next(WmsError::HttpStatus(400));

    let result = templater(&fake)
        .template(&LayerId::new(layers::AMSR2_SNOW), Some("2015-01-01T00:00:00Z"))
        .await;

    assert!(result.is_ok());
    assert_eq!(fake.request_count(), 2);
}

#[tokio::test]
async fn test_server_error_is_not_retried() {
    let fake = Arc::new(FakeWmsService::with_fixture());
    fake.fail_next(WmsError::HttpStatus(503));

    let result = templater(&fake)
        .template(&LayerId::new(layers::AMSR2_SNOW), Some("2015-01-01T00:00:00Z"))
        .await;

    assert!(matches!(result, Err(WmsError::HttpStatus(503))));
    assert_eq!(fake.request_count(), 1);
}

#[tokio::test]
async fn test_rejection_without_time_is_not_retried() {
    let fake = Arc::new(FakeWmsService::with_fixture());
    fake.fail_next(WmsError::ServiceException {
        code: Some("LayerNotDefined".to_string()),
        message: "no such layer".to_string(),
    });

    let result = templater(&fake)
        .template(&LayerId::new(layers::COASTLINES), None)
        .await;

    assert!(matches!(result, Err(WmsError::ServiceException { .. })));
    assert_eq!(fake.request_count(), 1);
}

#[tokio::test]
async fn test_retry_failure_is_returned() {
    let fake = Arc::new(FakeWmsService::with_fixture());
    fake.fail_next(WmsError::HttpStatus(404));
    fake.fail_next(WmsError::Transport("reset".to_string()));

    let result = templater(&fake)
        .template(&LayerId::new(layers::VIIRS_MONTHLY), Some("2021-02-01T00:00:00Z"))
        .await;

    assert!(matches!(result, Err(WmsError::Transport(_))));
    assert_eq!(fake.request_count(), 2);
}
