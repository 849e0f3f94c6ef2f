//! HttpWmsClient against an in-process WMS stand-in.

use std::collections::HashMap;

use axum::{
    extract::Query,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use wms_common::{BoundingBox, LayerId, WmsError};
use wms_protocol::{GetMapRequest, HttpWmsClient, WmsService, WmsVersion};

const CAPABILITIES: &str = r#"<WMT_MS_Capabilities version="1.1.1">
  <Service><Title>Stand-in WMS</Title></Service>
  <Capability>
    <Layer>
      <Layer>
        <Name>MODIS_Terra_CorrectedReflectance_TrueColor</Name>
        <Title>Corrected Reflectance (True Color, MODIS, Terra)</Title>
        <Extent name="time">2020-01-01/2020-01-03/P1D</Extent>
      </Layer>
      <Layer>
        <Name>Coastlines</Name>
        <Title>Coastlines</Title>
      </Layer>
    </Layer>
  </Capability>
</WMT_MS_Capabilities>"#;

const TIME_REJECTED: &str = r#"<ServiceExceptionReport version="1.1.1">
  <ServiceException code="InvalidDimensionValue">Layer has no time dimension</ServiceException>
</ServiceExceptionReport>"#;

// ============================================================================
// Stand-in server
// ============================================================================

async fn wms_handler(Query(params): Query<HashMap<String, String>>) -> Response {
    match params.get("REQUEST").map(String::as_str) {
        Some("GetCapabilities") => (
            [(header::CONTENT_TYPE, "application/vnd.ogc.wms_xml")],
            CAPABILITIES,
        )
            .into_response(),
        Some("GetMap") => {
            let layer = params.get("LAYERS").map(String::as_str).unwrap_or_default();
            match layer {
                "Coastlines" if params.contains_key("TIME") => (
                    [(header::CONTENT_TYPE, "application/vnd.ogc.se_xml")],
                    TIME_REJECTED,
                )
                    .into_response(),
                "Broken" => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
                "Missing" => StatusCode::NOT_FOUND.into_response(),
                _ => (
                    [(header::CONTENT_TYPE, "image/png")],
                    vec![0x89u8, b'P', b'N', b'G'],
                )
                    .into_response(),
            }
        }
        _ => StatusCode::BAD_REQUEST.into_response(),
    }
}

async fn spawn_server() -> String {
    let app = Router::new().route("/wms", get(wms_handler));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/wms?SERVICE=WMS", addr)
}

fn request(layer: &str, time: Option<&str>) -> GetMapRequest {
    GetMapRequest::new(LayerId::new(layer), BoundingBox::GLOBAL_REQUEST).with_time(time)
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_get_capabilities() {
    let base = spawn_server().await;
    let client = HttpWmsClient::new(base, WmsVersion::V1_1_1, None).unwrap();

    let caps = client.get_capabilities().await.unwrap();
    assert_eq!(caps.len(), 2);
    assert_eq!(caps.title.as_deref(), Some("Stand-in WMS"));
}

#[tokio::test]
async fn test_get_map_returns_resolved_url() {
    let base = spawn_server().await;
    let client = HttpWmsClient::new(base.clone(), WmsVersion::V1_1_1, None).unwrap();

    let url = client
        .get_map(&request("MODIS_Terra_CorrectedReflectance_TrueColor", Some("2020-01-02T00:00:00Z")))
        .await
        .unwrap();

    assert!(url.starts_with(base.split('?').next().unwrap()));
    for literal in BoundingBox::GLOBAL_REQUEST.literals() {
        assert!(url.contains(&literal));
    }
    assert!(url.contains("TIME=2020-01-02T00%3A00%3A00Z"));
}

#[tokio::test]
async fn test_get_map_service_exception_is_rejection() {
    let base = spawn_server().await;
    let client = HttpWmsClient::new(base, WmsVersion::V1_1_1, None).unwrap();

    let err = client
        .get_map(&request("Coastlines", Some("2020-01-01T00:00:00Z")))
        .await
        .unwrap_err();

    match &err {
        WmsError::ServiceException { code, .. } => {
            assert_eq!(code.as_deref(), Some("InvalidDimensionValue"));
        }
        other => panic!("Expected service exception, got {:?}", other),
    }
    assert!(err.is_request_rejection());

    // Same layer without time renders fine
    assert!(client.get_map(&request("Coastlines", None)).await.is_ok());
}

#[tokio::test]
async fn test_get_map_http_errors() {
    let base = spawn_server().await;
    let client = HttpWmsClient::new(base, WmsVersion::V1_1_1, None).unwrap();

    let err = client.get_map(&request("Broken", None)).await.unwrap_err();
    assert!(matches!(err, WmsError::HttpStatus(500)));
    assert!(!err.is_request_rejection());

    let err = client.get_map(&request("Missing", None)).await.unwrap_err();
    assert!(matches!(err, WmsError::HttpStatus(404)));
    assert!(err.is_request_rejection());
}

#[tokio::test]
async fn test_transport_error() {
    // Bind then drop to get a port nothing listens on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = HttpWmsClient::new(format!("http://{}/wms", addr), WmsVersion::V1_1_1, None).unwrap();
    let err = client.get_map(&request("Coastlines", None)).await.unwrap_err();
    assert!(matches!(err, WmsError::Transport(_)));
    assert!(!err.is_request_rejection());
}
